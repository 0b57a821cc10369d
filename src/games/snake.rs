use std::collections::VecDeque;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent};
use rand::seq::SliceRandom;
use rand::Rng;
use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::clock::FixedStep;
use crate::games::{banner, frame_block, grid_lines, help_line, split_screen, Game};

pub const GRID: i32 = 20;
pub const STEP: Duration = Duration::from_millis(150);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dir {
    Up,
    Down,
    Left,
    Right,
}

impl Dir {
    fn delta(self) -> (i32, i32) {
        match self {
            Dir::Up => (0, -1),
            Dir::Down => (0, 1),
            Dir::Left => (-1, 0),
            Dir::Right => (1, 0),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct State {
    /// Head first.
    pub body: VecDeque<Cell>,
    pub food: Cell,
    pub dx: i32,
    pub dy: i32,
    pub score: u32,
    pub started: bool,
    pub over: bool,
    /// Set once the heading changed since the last step.
    pub turned: bool,
    /// A further turn pressed before the pending one was taken.
    pub queued: Option<Dir>,
}

impl State {
    pub fn new() -> Self {
        Self {
            body: VecDeque::from([Cell { x: 10, y: 10 }]),
            food: Cell { x: 15, y: 15 },
            dx: 0,
            dy: 0,
            score: 0,
            started: false,
            over: false,
            turned: false,
            queued: None,
        }
    }

    pub fn head(&self) -> Cell {
        self.body[0]
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies a movement key. The first one starts the game; a key pointing
/// straight back along the heading is rejected. Only one turn is taken per
/// step: a second press before the next step waits in a one-slot queue, so
/// two quick turns cannot fold the head back onto the neck.
pub fn steer(state: &State, dir: Dir) -> State {
    if state.over {
        return state.clone();
    }
    let mut next = state.clone();
    next.started = true;
    if next.turned {
        let heading = (next.dx, next.dy);
        if dir.delta() != heading && !reverses(heading, dir) {
            next.queued = Some(dir);
        }
        return next;
    }
    turn(&mut next, dir);
    next
}

fn reverses((dx, dy): (i32, i32), dir: Dir) -> bool {
    let (nx, ny) = dir.delta();
    (nx != 0 && dx == -nx) || (ny != 0 && dy == -ny)
}

fn turn(state: &mut State, dir: Dir) {
    let heading = (state.dx, state.dy);
    if reverses(heading, dir) || dir.delta() == heading {
        return;
    }
    (state.dx, state.dy) = dir.delta();
    state.turned = true;
}

/// Picks a food cell uniformly among the cells the snake does not cover.
pub fn place_food(body: &VecDeque<Cell>, rng: &mut impl Rng) -> Option<Cell> {
    let free: Vec<Cell> = (0..GRID)
        .flat_map(|y| (0..GRID).map(move |x| Cell { x, y }))
        .filter(|c| !body.contains(c))
        .collect();
    free.choose(rng).copied()
}

/// One movement step. Hitting a wall or the body ends the game without moving.
pub fn step(state: &State, rng: &mut impl Rng) -> State {
    if !state.started || state.over || (state.dx == 0 && state.dy == 0) {
        return state.clone();
    }
    let mut next = state.clone();
    let head = Cell {
        x: state.head().x + state.dx,
        y: state.head().y + state.dy,
    };
    let outside = head.x < 0 || head.x >= GRID || head.y < 0 || head.y >= GRID;
    if outside || state.body.contains(&head) {
        next.over = true;
        return next;
    }
    next.body.push_front(head);
    if head == state.food {
        next.score += 1;
        match place_food(&next.body, rng) {
            Some(food) => next.food = food,
            None => next.over = true,
        }
    } else {
        next.body.pop_back();
    }
    next.turned = false;
    if let Some(dir) = next.queued.take() {
        turn(&mut next, dir);
    }
    next
}

pub struct SnakeGame {
    state: State,
    clock: FixedStep,
    high_score: u32,
}

impl SnakeGame {
    pub fn new() -> Self {
        Self {
            state: State::new(),
            clock: FixedStep::new(STEP),
            high_score: 0,
        }
    }

    fn render_field(&self, width: usize, height: usize) -> Vec<Line<'static>> {
        // Two columns per cell keeps the board roughly square.
        let cell_w = 2;
        let cols = (GRID as usize) * cell_w;
        let rows = GRID as usize;
        let w = width.min(cols + 2);
        let h = height.min(rows + 2);
        // No room for the walls.
        if w < 2 || h < 2 {
            return Vec::new();
        }
        let wall = Style::default().fg(Color::Rgb(60, 80, 140));
        let mut grid = vec![vec![(' ', Style::default().bg(Color::Rgb(22, 33, 62))); w]; h];
        for x in 0..w {
            grid[0][x] = ('─', wall);
            grid[h - 1][x] = ('─', wall);
        }
        for row in grid.iter_mut() {
            row[0] = ('│', wall);
            row[w - 1] = ('│', wall);
        }
        let mut put = |c: Cell, chars: [char; 2], style: Style| {
            let gx = 1 + c.x as usize * cell_w;
            let gy = 1 + c.y as usize;
            for (i, ch) in chars.iter().enumerate() {
                if gy < h - 1 && gx + i < w - 1 {
                    grid[gy][gx + i] = (*ch, style);
                }
            }
        };
        put(self.state.food, ['◆', '◆'], Style::default().fg(Color::Rgb(255, 87, 34)).add_modifier(Modifier::BOLD));
        for (i, seg) in self.state.body.iter().enumerate().rev() {
            let (chars, shade) = if i == 0 {
                (['▐', '▌'], 255)
            } else {
                (['█', '█'], (200u32.saturating_sub(i as u32 * 10)).max(90) as u8)
            };
            put(*seg, chars, Style::default().fg(Color::Rgb(60, shade, 80)));
        }
        grid_lines(grid)
    }
}

impl Game for SnakeGame {
    fn update(&mut self, dt: Duration) {
        if !self.state.started || self.state.over {
            return;
        }
        let steps = self.clock.advance(dt);
        let mut rng = rand::thread_rng();
        for _ in 0..steps {
            self.state = step(&self.state, &mut rng);
        }
        if self.state.over && self.state.score > self.high_score {
            self.high_score = self.state.score;
        }
    }

    fn handle_input(&mut self, key: KeyEvent) {
        let dir = match key.code {
            KeyCode::Char('r') | KeyCode::Char('R') => {
                if self.state.over {
                    self.reset();
                }
                return;
            }
            KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Dir::Up,
            KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Dir::Down,
            KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Dir::Left,
            KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Dir::Right,
            _ => return,
        };
        self.state = steer(&self.state, dir);
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let inner = frame_block(frame, area, "🐍 Snake", Color::Rgb(76, 175, 80));
        let (status_area, field, help_area) = split_screen(inner);

        let status = Line::from(vec![
            Span::styled(
                format!(" Score: {} ", self.state.score),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::styled(" │ ", Style::default().fg(Color::DarkGray)),
            Span::styled(format!("🏆 High: {} ", self.high_score), Style::default().fg(Color::Cyan)),
            Span::styled(" │ ", Style::default().fg(Color::DarkGray)),
            Span::styled(format!("Length: {} ", self.state.body.len()), Style::default().fg(Color::Green)),
        ]);
        frame.render_widget(Paragraph::new(status), status_area);
        frame.render_widget(
            Paragraph::new(self.render_field(field.width as usize, field.height as usize)),
            field,
        );

        let help = if self.state.over {
            banner("💀", &format!("GAME OVER! Final score: {}", self.state.score), Color::Red, "R to restart, Esc for menu")
        } else if !self.state.started {
            banner("▶", "Press any arrow key to start!", Color::Yellow, "Arrows / WASD move")
        } else {
            help_line(&[("↑↓←→/WASD", "Move"), ("Esc", "Menu")])
        };
        frame.render_widget(Paragraph::new(help), help_area);
    }

    fn reset(&mut self) {
        let hs = self.high_score;
        *self = SnakeGame::new();
        self.high_score = hs;
    }

    fn get_score(&self) -> u32 {
        self.state.score
    }

    fn is_game_over(&self) -> bool {
        self.state.over
    }

    fn set_high_score(&mut self, best: u32) {
        self.high_score = best;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn first_key_sets_one_axis_and_reverse_is_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        let s = steer(&State::new(), Dir::Left);
        assert!(s.started);
        assert_eq!((s.dx, s.dy), (-1, 0));
        let s = steer(&s, Dir::Right);
        assert_eq!((s.dx, s.dy), (-1, 0));
        assert_eq!(s.queued, None);
        let s = steer(&step(&s, &mut rng), Dir::Up);
        assert_eq!((s.dx, s.dy), (0, -1));
        let s = steer(&step(&s, &mut rng), Dir::Down);
        assert_eq!((s.dx, s.dy), (0, -1));
    }

    fn heading_right() -> State {
        State {
            body: VecDeque::from([Cell { x: 5, y: 5 }, Cell { x: 4, y: 5 }, Cell { x: 3, y: 5 }]),
            dx: 1,
            started: true,
            ..State::new()
        }
    }

    #[test]
    fn two_turns_within_one_step_are_taken_in_order() {
        let mut rng = StdRng::seed_from_u64(0);
        let s = steer(&steer(&heading_right(), Dir::Up), Dir::Left);
        assert_eq!((s.dx, s.dy), (0, -1));
        assert_eq!(s.queued, Some(Dir::Left));
        let s = step(&s, &mut rng);
        assert!(!s.over);
        assert_eq!(s.head(), Cell { x: 5, y: 4 });
        assert_eq!((s.dx, s.dy), (-1, 0));
        let s = step(&s, &mut rng);
        assert!(!s.over);
        assert_eq!(s.head(), Cell { x: 4, y: 4 });
    }

    #[test]
    fn eating_grows_and_respawns_food_off_body() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut s = State::new();
        s.food = Cell { x: 11, y: 10 };
        let s = step(&steer(&s, Dir::Right), &mut rng);
        assert_eq!(s.score, 1);
        assert_eq!(s.body.len(), 2);
        assert!(!s.body.contains(&s.food));
    }

    #[test]
    fn wall_ends_game_without_moving() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut s = steer(&State::new(), Dir::Left);
        for _ in 0..10 {
            s = step(&s, &mut rng);
        }
        assert_eq!(s.head(), Cell { x: 0, y: 10 });
        let dead = step(&s, &mut rng);
        assert!(dead.over);
        assert_eq!(dead.body, s.body);
        assert_eq!(step(&dead, &mut rng), dead);
    }

    #[test]
    fn running_into_own_body_ends_game() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut s = State::new();
        s.body = VecDeque::from([
            Cell { x: 5, y: 5 },
            Cell { x: 6, y: 5 },
            Cell { x: 6, y: 6 },
            Cell { x: 5, y: 6 },
            Cell { x: 4, y: 6 },
        ]);
        s.started = true;
        s.dx = 0;
        s.dy = 1;
        assert!(step(&s, &mut rng).over);
    }

    #[test]
    fn ticks_follow_step_interval() {
        let mut g = SnakeGame::new();
        g.state = steer(&g.state, Dir::Up);
        g.update(STEP - Duration::from_millis(1));
        assert_eq!(g.state.head(), Cell { x: 10, y: 10 });
        g.update(Duration::from_millis(1));
        assert_eq!(g.state.head(), Cell { x: 10, y: 9 });
    }

    #[test]
    fn tiny_fields_render_without_walls() {
        let g = SnakeGame::new();
        for (w, h) in [(40, 2), (2, 10), (1, 1), (0, 0), (40, 1)] {
            let lines = g.render_field(w, h);
            assert!(lines.len() <= h);
        }
        assert_eq!(g.render_field(2, 2).len(), 2);
    }

    #[test]
    fn short_terminal_renders_mounted_snake() {
        use ratatui::backend::TestBackend;
        use ratatui::Terminal;

        let mut game = SnakeGame::new();
        for (w, h) in [(80, 5), (80, 8), (12, 30), (3, 3)] {
            let mut terminal = Terminal::new(TestBackend::new(w, h)).unwrap();
            terminal
                .draw(|frame| {
                    let area = frame.area();
                    game.render(frame, area);
                })
                .unwrap();
        }
    }

    fn arb_dir() -> impl Strategy<Value = Dir> {
        prop_oneof![Just(Dir::Up), Just(Dir::Down), Just(Dir::Left), Just(Dir::Right)]
    }

    proptest! {
        #[test]
        fn prop_velocity_is_unit_on_one_axis(dirs in prop::collection::vec(arb_dir(), 1..20)) {
            let mut s = State::new();
            for d in dirs {
                let before = (s.dx, s.dy);
                s = steer(&s, d);
                prop_assert_eq!(s.dx.abs() + s.dy.abs(), 1);
                if before != (0, 0) {
                    prop_assert_ne!((s.dx, s.dy), (-before.0, -before.1));
                }
            }
        }

        #[test]
        fn prop_head_never_folds_onto_neck(
            moves in prop::collection::vec(prop::option::of(arb_dir()), 1..120),
            seed in any::<u64>(),
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut s = heading_right();
            for m in moves {
                match m {
                    Some(d) => s = steer(&s, d),
                    None => {
                        let head = s.head();
                        let target = Cell { x: head.x + s.dx, y: head.y + s.dy };
                        prop_assert_ne!(Some(&target), s.body.get(1));
                        s = step(&s, &mut rng);
                    }
                }
            }
        }

        #[test]
        fn prop_dead_snake_never_moves(dirs in prop::collection::vec(arb_dir(), 1..200), seed in any::<u64>()) {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut s = State::new();
            let mut dead: Option<State> = None;
            for d in dirs {
                s = step(&steer(&s, d), &mut rng);
                match &dead {
                    Some(d) => prop_assert_eq!(&s.body, &d.body),
                    None if s.over => dead = Some(s.clone()),
                    None => {}
                }
            }
        }
    }
}
