use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::{debug, info};

use crate::games::{Game, GameKind};
use crate::input::KeyReporting;
use crate::scores::HighScores;

/// Tiles per row on the home screen.
pub const TILE_COLS: usize = 4;

/// Host-level actions decoded from a key press.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Quit,
    Open(GameKind),
    Close,
    Select(Nav),
    OpenSelected,
    ToggleHighScores,
    /// Hand the key to the mounted game.
    Forward(KeyEvent),
    /// Left click at an absolute terminal cell.
    Click { column: u16, row: u16 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Nav {
    Left,
    Right,
    Up,
    Down,
}

/// The game currently shown in the modal.
pub struct Mounted {
    pub kind: GameKind,
    pub game: Box<dyn Game>,
}

pub struct App {
    pub should_quit: bool,
    pub selected: usize,
    pub show_high_scores: bool,
    pub high_scores: HighScores,
    pub mounted: Option<Mounted>,
    /// Set when the last finished session beat the stored best.
    pub new_record: bool,
    /// Passed to each game on mount.
    pub key_reporting: KeyReporting,
}

impl App {
    pub fn new(high_scores: HighScores) -> Self {
        Self {
            should_quit: false,
            selected: 0,
            show_high_scores: false,
            high_scores,
            mounted: None,
            new_record: false,
            key_reporting: KeyReporting::default(),
        }
    }

    pub fn selected_kind(&self) -> GameKind {
        GameKind::all()[self.selected]
    }

    pub fn on_tick(&mut self, dt: Duration) {
        let Some(mounted) = self.mounted.as_mut() else { return };
        mounted.game.update(dt);
        self.check_session_end();
    }

    /// Submits the score once per finished session; the latch re-arms when
    /// the game leaves its game-over state (restart).
    fn check_session_end(&mut self) {
        let Some(mounted) = self.mounted.as_ref() else { return };
        let kind = mounted.kind;
        let over = mounted.game.is_game_over();
        let score = mounted.game.get_score();
        if over && !self.high_scores.was_submitted(kind) {
            info!("{} session over, score {}", kind.title(), score);
            self.new_record = self.high_scores.submit(kind, score);
            self.high_scores.mark_submitted(kind);
        } else if !over && self.high_scores.was_submitted(kind) {
            self.high_scores.clear_submitted(kind);
            self.new_record = false;
        }
    }

    pub fn command_for(&self, key: KeyEvent) -> Option<Command> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Some(Command::Quit);
        }
        if self.mounted.is_some() {
            return Some(match key.code {
                KeyCode::Esc => Command::Close,
                _ => Command::Forward(key),
            });
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => Some(Command::Quit),
            KeyCode::Char('h') | KeyCode::Char('H') => Some(Command::ToggleHighScores),
            KeyCode::Esc if self.show_high_scores => Some(Command::ToggleHighScores),
            KeyCode::Left => Some(Command::Select(Nav::Left)),
            KeyCode::Right => Some(Command::Select(Nav::Right)),
            KeyCode::Up => Some(Command::Select(Nav::Up)),
            KeyCode::Down => Some(Command::Select(Nav::Down)),
            KeyCode::Enter => Some(Command::OpenSelected),
            KeyCode::Char(c @ '1'..='8') => {
                let idx = c as usize - '1' as usize;
                GameKind::all().get(idx).map(|k| Command::Open(*k))
            }
            _ => None,
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if let Some(cmd) = self.command_for(key) {
            self.apply(cmd);
        }
    }

    pub fn on_click(&mut self, column: u16, row: u16) {
        if self.mounted.is_some() {
            self.apply(Command::Click { column, row });
        }
    }

    pub fn on_release(&mut self, key: KeyEvent) {
        if let Some(mounted) = self.mounted.as_mut() {
            mounted.game.handle_release(key);
        }
    }

    pub fn apply(&mut self, cmd: Command) {
        match cmd {
            Command::Quit => {
                self.close();
                self.should_quit = true;
            }
            Command::Open(kind) => {
                self.selected = kind.index();
                self.open(kind, kind.create());
            }
            Command::OpenSelected => {
                let kind = self.selected_kind();
                self.open(kind, kind.create());
            }
            Command::Close => self.close(),
            Command::Select(nav) => self.navigate(nav),
            Command::ToggleHighScores => self.show_high_scores = !self.show_high_scores,
            Command::Forward(key) => {
                if let Some(mounted) = self.mounted.as_mut() {
                    mounted.game.handle_input(key);
                }
                self.check_session_end();
            }
            Command::Click { column, row } => {
                if let Some(mounted) = self.mounted.as_mut() {
                    mounted.game.handle_click(column, row);
                }
                self.check_session_end();
            }
        }
    }

    /// Mounts `game`, replacing (and tearing down) any current one.
    pub fn open(&mut self, kind: GameKind, mut game: Box<dyn Game>) {
        self.close();
        game.set_high_score(self.high_scores.best(kind));
        game.set_key_reporting(self.key_reporting);
        self.high_scores.clear_submitted(kind);
        self.show_high_scores = false;
        self.new_record = false;
        info!("opened {}", kind.title());
        self.mounted = Some(Mounted { kind, game });
    }

    pub fn close(&mut self) {
        if let Some(mut mounted) = self.mounted.take() {
            mounted.game.teardown();
            debug!("closed {}", mounted.kind.title());
        }
    }

    fn navigate(&mut self, nav: Nav) {
        let count = GameKind::COUNT;
        let rows = count / TILE_COLS;
        let (row, col) = (self.selected / TILE_COLS, self.selected % TILE_COLS);
        self.selected = match nav {
            Nav::Right => (self.selected + 1) % count,
            Nav::Left => (self.selected + count - 1) % count,
            Nav::Down => ((row + 1) % rows) * TILE_COLS + col,
            Nav::Up => ((row + rows - 1) % rows) * TILE_COLS + col,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    use ratatui::prelude::{Frame, Rect};

    #[derive(Default)]
    struct Probe {
        over: Cell<bool>,
        score: Cell<u32>,
        seeded: Cell<u32>,
        teardowns: Cell<u32>,
        keys: Cell<u32>,
        clicks: Cell<Option<(u16, u16)>>,
        reporting: Cell<Option<KeyReporting>>,
    }

    struct FakeGame(Rc<Probe>);

    impl Game for FakeGame {
        fn update(&mut self, _dt: Duration) {}
        fn handle_input(&mut self, _key: KeyEvent) {
            self.0.keys.set(self.0.keys.get() + 1);
        }
        fn render(&mut self, _frame: &mut Frame, _area: Rect) {}
        fn reset(&mut self) {
            self.0.over.set(false);
        }
        fn get_score(&self) -> u32 {
            self.0.score.get()
        }
        fn is_game_over(&self) -> bool {
            self.0.over.get()
        }
        fn set_high_score(&mut self, best: u32) {
            self.0.seeded.set(best);
        }
        fn teardown(&mut self) {
            self.0.teardowns.set(self.0.teardowns.get() + 1);
        }
        fn handle_click(&mut self, column: u16, row: u16) {
            self.0.clicks.set(Some((column, row)));
            self.0.over.set(true);
        }
        fn set_key_reporting(&mut self, reporting: KeyReporting) {
            self.0.reporting.set(Some(reporting));
        }
    }

    fn mounted_probe(app: &mut App, kind: GameKind) -> Rc<Probe> {
        let probe = Rc::new(Probe::default());
        app.open(kind, Box::new(FakeGame(probe.clone())));
        probe
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::from(code)
    }

    #[test]
    fn digit_opens_matching_game() {
        let mut app = App::new(HighScores::in_memory());
        app.on_key(key(KeyCode::Char('3')));
        let mounted = app.mounted.as_ref().map(|m| m.kind);
        assert_eq!(mounted, Some(GameKind::Game2048));
        assert_eq!(app.selected, 2);
    }

    #[test]
    fn esc_tears_down_before_dropping() {
        let mut app = App::new(HighScores::in_memory());
        let probe = mounted_probe(&mut app, GameKind::Snake);
        app.on_key(key(KeyCode::Esc));
        assert!(app.mounted.is_none());
        assert_eq!(probe.teardowns.get(), 1);
        assert_eq!(Rc::strong_count(&probe), 1);
    }

    #[test]
    fn session_end_submits_once() {
        let mut app = App::new(HighScores::in_memory());
        let probe = mounted_probe(&mut app, GameKind::Snake);
        probe.score.set(7);
        probe.over.set(true);
        app.on_tick(Duration::from_millis(16));
        assert!(app.new_record);
        assert_eq!(app.high_scores.best(GameKind::Snake), 7);

        // Later ticks in the same game-over state do not resubmit.
        probe.score.set(9);
        app.on_tick(Duration::from_millis(16));
        assert_eq!(app.high_scores.best(GameKind::Snake), 7);

        // Restarting re-arms the latch.
        probe.over.set(false);
        app.on_tick(Duration::from_millis(16));
        probe.over.set(true);
        app.on_tick(Duration::from_millis(16));
        assert_eq!(app.high_scores.best(GameKind::Snake), 9);
    }

    #[test]
    fn reopening_seeds_best_score() {
        let mut app = App::new(HighScores::in_memory());
        let probe = mounted_probe(&mut app, GameKind::WhackAMole);
        probe.score.set(40);
        probe.over.set(true);
        app.on_tick(Duration::ZERO);
        app.apply(Command::Close);
        let again = mounted_probe(&mut app, GameKind::WhackAMole);
        assert_eq!(again.seeded.get(), 40);
    }

    #[test]
    fn q_quits_only_from_home() {
        let mut app = App::new(HighScores::in_memory());
        let probe = mounted_probe(&mut app, GameKind::TypingTest);
        app.on_key(key(KeyCode::Char('q')));
        assert!(!app.should_quit);
        assert_eq!(probe.keys.get(), 1);
        app.on_key(key(KeyCode::Esc));
        app.on_key(key(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[test]
    fn ctrl_c_quits_and_tears_down() {
        let mut app = App::new(HighScores::in_memory());
        let probe = mounted_probe(&mut app, GameKind::TicTacToe);
        app.on_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
        assert_eq!(probe.teardowns.get(), 1);
    }

    #[test]
    fn tile_navigation_wraps() {
        let mut app = App::new(HighScores::in_memory());
        app.on_key(key(KeyCode::Left));
        assert_eq!(app.selected, GameKind::COUNT - 1);
        app.on_key(key(KeyCode::Down));
        assert_eq!(app.selected, 3);
        app.on_key(key(KeyCode::Up));
        assert_eq!(app.selected, 7);
        app.on_key(key(KeyCode::Right));
        assert_eq!(app.selected, 0);
        app.on_key(key(KeyCode::Enter));
        assert_eq!(app.mounted.as_ref().map(|m| m.kind), Some(GameKind::FlappyBird));
    }

    #[test]
    fn h_toggles_high_score_panel() {
        let mut app = App::new(HighScores::in_memory());
        assert_eq!(app.command_for(key(KeyCode::Char('h'))), Some(Command::ToggleHighScores));
        app.on_key(key(KeyCode::Char('h')));
        assert!(app.show_high_scores);
        app.on_key(key(KeyCode::Esc));
        assert!(!app.show_high_scores);
    }

    #[test]
    fn clicks_reach_mounted_game_and_can_end_session() {
        let mut app = App::new(HighScores::in_memory());
        app.on_click(3, 4);
        assert!(app.mounted.is_none());
        let probe = mounted_probe(&mut app, GameKind::Snake);
        probe.score.set(5);
        app.on_click(10, 12);
        assert_eq!(probe.clicks.get(), Some((10, 12)));
        assert_eq!(app.high_scores.best(GameKind::Snake), 5);
    }

    #[test]
    fn key_reporting_is_passed_on_mount() {
        let mut app = App::new(HighScores::in_memory());
        app.key_reporting = KeyReporting::Releases;
        let probe = mounted_probe(&mut app, GameKind::MiniPlatformer);
        assert_eq!(probe.reporting.get(), Some(KeyReporting::Releases));
    }
}
