use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent};
use rand::Rng;
use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::games::{banner, frame_block, help_line, split_screen, Game};

pub const SIZE: usize = 4;
pub const WIN_TILE: u32 = 2048;

pub type Board = [[u32; SIZE]; SIZE];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    #[cfg(test)]
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    /// Clockwise quarter turns that make this move a left move.
    fn rotations(self) -> usize {
        match self {
            Direction::Left => 0,
            Direction::Down => 1,
            Direction::Right => 2,
            Direction::Up => 3,
        }
    }
}

fn rotate_cw(board: &Board) -> Board {
    let mut out = [[0; SIZE]; SIZE];
    for (i, row) in board.iter().enumerate() {
        for (j, &v) in row.iter().enumerate() {
            out[j][SIZE - 1 - i] = v;
        }
    }
    out
}

fn rotate_n(board: &Board, n: usize) -> Board {
    (0..n % 4).fold(*board, |b, _| rotate_cw(&b))
}

/// Compacts one row to the left. Each tile merges at most once.
/// Returns the new row and the sum of merged values.
pub fn compact_row(row: [u32; SIZE]) -> ([u32; SIZE], u32) {
    let tiles: Vec<u32> = row.iter().copied().filter(|&v| v != 0).collect();
    let mut out = [0; SIZE];
    let mut gained = 0;
    let mut k = 0;
    let mut i = 0;
    while i < tiles.len() {
        if i + 1 < tiles.len() && tiles[i] == tiles[i + 1] {
            out[k] = tiles[i] * 2;
            gained += out[k];
            i += 2;
        } else {
            out[k] = tiles[i];
            i += 1;
        }
        k += 1;
    }
    (out, gained)
}

/// Slides every tile in `dir` without spawning. Returns the board and points gained.
pub fn slide(board: &Board, dir: Direction) -> (Board, u32) {
    let r = dir.rotations();
    let mut rotated = rotate_n(board, r);
    let mut gained = 0;
    for row in rotated.iter_mut() {
        let (next, g) = compact_row(*row);
        *row = next;
        gained += g;
    }
    (rotate_n(&rotated, 4 - r), gained)
}

pub fn empty_cells(board: &Board) -> Vec<(usize, usize)> {
    let mut cells = Vec::new();
    for (r, row) in board.iter().enumerate() {
        for (c, &v) in row.iter().enumerate() {
            if v == 0 {
                cells.push((r, c));
            }
        }
    }
    cells
}

/// Places a 2 (90%) or 4 on a uniformly random empty cell.
pub fn spawn_tile(board: &mut Board, rng: &mut impl Rng) -> Option<(usize, usize, u32)> {
    let cells = empty_cells(board);
    if cells.is_empty() {
        return None;
    }
    let (r, c) = cells[rng.gen_range(0..cells.len())];
    let value = if rng.gen_bool(0.9) { 2 } else { 4 };
    board[r][c] = value;
    Some((r, c, value))
}

/// True while an empty cell or an adjacent equal pair exists.
pub fn has_moves(board: &Board) -> bool {
    for r in 0..SIZE {
        for c in 0..SIZE {
            let v = board[r][c];
            if v == 0 {
                return true;
            }
            if (r + 1 < SIZE && board[r + 1][c] == v) || (c + 1 < SIZE && board[r][c + 1] == v) {
                return true;
            }
        }
    }
    false
}

#[derive(Clone, Debug, PartialEq)]
pub struct State {
    pub board: Board,
    pub score: u32,
    pub won: bool,
    /// Set when the player chose to continue past 2048.
    pub keep_going: bool,
    pub over: bool,
    pub last_spawn: Option<(usize, usize, u32)>,
}

impl State {
    pub fn new(rng: &mut impl Rng) -> Self {
        let mut board = [[0; SIZE]; SIZE];
        spawn_tile(&mut board, rng);
        let last_spawn = spawn_tile(&mut board, rng);
        Self {
            board,
            score: 0,
            won: false,
            keep_going: false,
            over: false,
            last_spawn,
        }
    }

    /// Moves are blocked after a lock-up, and on the win screen until the
    /// player opts to keep going.
    pub fn accepts_moves(&self) -> bool {
        !self.over && (!self.won || self.keep_going)
    }
}

/// Applies one player move. A move that changes nothing returns the state
/// unchanged (no spawn, no score).
pub fn apply_move(state: &State, dir: Direction, rng: &mut impl Rng) -> State {
    if !state.accepts_moves() {
        return state.clone();
    }
    let (mut board, gained) = slide(&state.board, dir);
    if board == state.board {
        return state.clone();
    }
    let last_spawn = spawn_tile(&mut board, rng);
    let reached = board.iter().flatten().any(|&v| v >= WIN_TILE);
    State {
        board,
        score: state.score + gained,
        won: state.won || reached,
        keep_going: state.keep_going,
        over: !has_moves(&board),
        last_spawn,
    }
}

pub struct Game2048 {
    state: State,
    high_score: u32,
}

impl Game2048 {
    pub fn new() -> Self {
        Self {
            state: State::new(&mut rand::thread_rng()),
            high_score: 0,
        }
    }

    fn tile_style(value: u32) -> Style {
        let (bg, fg) = match value {
            0 => (Color::Rgb(50, 50, 60), Color::Rgb(80, 80, 90)),
            2 => (Color::Rgb(238, 228, 218), Color::Rgb(60, 60, 60)),
            4 => (Color::Rgb(237, 224, 200), Color::Rgb(60, 60, 60)),
            8 => (Color::Rgb(242, 177, 121), Color::White),
            16 => (Color::Rgb(245, 149, 99), Color::White),
            32 => (Color::Rgb(246, 124, 95), Color::White),
            64 => (Color::Rgb(246, 94, 59), Color::White),
            128 => (Color::Rgb(237, 207, 114), Color::White),
            256 => (Color::Rgb(237, 204, 97), Color::White),
            512 => (Color::Rgb(237, 200, 80), Color::White),
            1024 => (Color::Rgb(237, 197, 63), Color::White),
            2048 => (Color::Rgb(237, 194, 46), Color::White),
            _ => (Color::Rgb(150, 60, 200), Color::White),
        };
        Style::default().bg(bg).fg(fg).add_modifier(Modifier::BOLD)
    }

    fn render_board(&self, width: usize) -> Vec<Line<'static>> {
        const CELL_W: usize = 8;
        let pad = width.saturating_sub(CELL_W * SIZE + SIZE + 1) / 2;
        let mut lines = Vec::new();
        for (r, row) in self.state.board.iter().enumerate() {
            for sub in 0..3 {
                let mut spans = vec![Span::raw(" ".repeat(pad))];
                for (c, &v) in row.iter().enumerate() {
                    spans.push(Span::raw(" "));
                    let fresh = self.state.last_spawn.is_some_and(|(sr, sc, _)| sr == r && sc == c);
                    let text = if sub == 1 && v != 0 {
                        format!("{:^w$}", v, w = CELL_W)
                    } else if sub == 2 && fresh {
                        format!("{:^w$}", "·", w = CELL_W)
                    } else {
                        " ".repeat(CELL_W)
                    };
                    spans.push(Span::styled(text, Self::tile_style(v)));
                }
                lines.push(Line::from(spans));
            }
            lines.push(Line::from(""));
        }
        lines
    }
}

impl Game for Game2048 {
    fn update(&mut self, _dt: Duration) {}

    fn handle_input(&mut self, key: KeyEvent) {
        let dir = match key.code {
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.reset();
                return;
            }
            KeyCode::Char('c') | KeyCode::Char('C') => {
                if self.state.won && !self.state.over {
                    self.state.keep_going = true;
                }
                return;
            }
            KeyCode::Up | KeyCode::Char('w') => Direction::Up,
            KeyCode::Down | KeyCode::Char('s') => Direction::Down,
            KeyCode::Left | KeyCode::Char('a') => Direction::Left,
            KeyCode::Right | KeyCode::Char('d') => Direction::Right,
            _ => return,
        };
        self.state = apply_move(&self.state, dir, &mut rand::thread_rng());
        if self.is_game_over() && self.state.score > self.high_score {
            self.high_score = self.state.score;
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let inner = frame_block(frame, area, "🔢 2048", Color::Rgb(237, 194, 46));
        let (status_area, field, help_area) = split_screen(inner);

        let status = Line::from(vec![
            Span::styled(
                format!(" Score: {} ", self.state.score),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::styled(" │ ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!("🏆 Best: {} ", self.high_score.max(self.state.score)),
                Style::default().fg(Color::Cyan),
            ),
        ]);
        frame.render_widget(Paragraph::new(status), status_area);
        frame.render_widget(Paragraph::new(self.render_board(field.width as usize)), field);

        let help = if self.state.over {
            banner("💀", "GAME OVER!", Color::Red, "No moves left. R to restart, Esc for menu")
        } else if self.state.won && !self.state.keep_going {
            banner("🎉", "YOU WIN!", Color::Green, "C keep going │ R restart")
        } else {
            help_line(&[("↑↓←→", "Slide"), ("R", "Restart"), ("Esc", "Menu")])
        };
        frame.render_widget(Paragraph::new(help), help_area);
    }

    fn reset(&mut self) {
        let hs = self.high_score.max(self.state.score);
        *self = Game2048::new();
        self.high_score = hs;
    }

    fn get_score(&self) -> u32 {
        self.state.score
    }

    /// The win screen counts as a finished session until the player keeps
    /// going, so a win followed by Esc still records its score.
    fn is_game_over(&self) -> bool {
        !self.state.accepts_moves()
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

    fn sum(b: &Board) -> u32 {
        b.iter().flatten().sum()
    }

    fn state_with(board: Board) -> State {
        State {
            board,
            score: 0,
            won: false,
            keep_going: false,
            over: false,
            last_spawn: None,
        }
    }

    #[test]
    fn pairs_merge_left_to_right_once() {
        assert_eq!(compact_row([2, 2, 2, 2]), ([4, 4, 0, 0], 8));
        assert_eq!(compact_row([2, 2, 4, 0]), ([4, 4, 0, 0], 4));
        assert_eq!(compact_row([4, 0, 4, 8]), ([8, 8, 0, 0], 8));
        assert_eq!(compact_row([2, 0, 0, 2]), ([4, 0, 0, 0], 4));
        assert_eq!(compact_row([2, 4, 8, 16]), ([2, 4, 8, 16], 0));
    }

    #[test]
    fn directions_move_tiles_the_right_way() {
        let b = [[2, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]];
        assert_eq!(slide(&b, Direction::Right).0[0], [0, 0, 0, 2]);
        assert_eq!(slide(&b, Direction::Down).0[3], [2, 0, 0, 0]);
        assert_eq!(slide(&b, Direction::Up).0, b);
        let col = [[2, 0, 0, 0], [2, 0, 0, 0], [4, 0, 0, 0], [0, 0, 0, 0]];
        let (up, g) = slide(&col, Direction::Up);
        assert_eq!([up[0][0], up[1][0], up[2][0]], [4, 4, 0]);
        assert_eq!(g, 4);
    }

    #[test]
    fn no_op_move_does_not_spawn() {
        let mut rng = StdRng::seed_from_u64(1);
        let s = state_with([[2, 4, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]]);
        let next = apply_move(&s, Direction::Left, &mut rng);
        assert_eq!(next, s);
    }

    #[test]
    fn reaching_2048_blocks_until_keep_going() {
        let mut rng = StdRng::seed_from_u64(2);
        let s = state_with([[1024, 1024, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]]);
        let won = apply_move(&s, Direction::Left, &mut rng);
        assert!(won.won);
        assert_eq!(won.score, 2048);
        assert!(!won.accepts_moves());
        assert_eq!(apply_move(&won, Direction::Right, &mut rng), won);

        let cont = State { keep_going: true, ..won };
        let next = apply_move(&cont, Direction::Right, &mut rng);
        assert_ne!(next.board, cont.board);
        assert!(next.won);
    }

    #[test]
    fn locked_board_is_game_over() {
        let mut rng = StdRng::seed_from_u64(3);
        // One empty cell; any spawn there leaves no merges.
        let s = state_with([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 8, 0]]);
        let next = apply_move(&s, Direction::Right, &mut rng);
        assert!(next.board.iter().flatten().all(|&v| v != 0));
        assert_eq!(next.over, !has_moves(&next.board));
    }

    #[test]
    fn win_screen_submits_score_through_host() {
        use crate::app::App;
        use crate::games::GameKind;
        use crate::scores::HighScores;

        let mut app = App::new(HighScores::in_memory());
        let mut game = Game2048::new();
        game.state = State {
            score: 5000,
            ..state_with([[1024, 1024, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]])
        };
        app.open(GameKind::Game2048, Box::new(game));
        app.on_key(KeyEvent::from(KeyCode::Left));
        app.on_tick(Duration::from_millis(16));
        app.on_key(KeyEvent::from(KeyCode::Esc));
        assert!(app.mounted.is_none());
        assert_eq!(app.high_scores.best(GameKind::Game2048), 7048);
    }

    #[test]
    fn keep_going_reopens_the_session() {
        let mut game = Game2048::new();
        game.state = state_with([[1024, 1024, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]]);
        game.handle_input(KeyEvent::from(KeyCode::Left));
        assert!(game.is_game_over());
        assert_eq!(game.high_score, 2048);
        game.handle_input(KeyEvent::from(KeyCode::Char('c')));
        assert!(!game.is_game_over());
    }

    fn arb_board() -> impl Strategy<Value = Board> {
        let cell = prop_oneof![Just(0u32), (1u32..11).prop_map(|e| 1u32 << e)];
        prop::array::uniform4(prop::array::uniform4(cell))
    }

    proptest! {
        #[test]
        fn prop_move_conserves_sum_plus_spawn(board in arb_board(), d in 0usize..4, seed in any::<u64>()) {
            let mut rng = StdRng::seed_from_u64(seed);
            let dir = Direction::ALL[d];
            let s = state_with(board);
            let next = apply_move(&s, dir, &mut rng);
            let (slid, gained) = slide(&board, dir);
            if slid == board {
                prop_assert_eq!(&next, &s);
            } else {
                let spawned = next.last_spawn.map(|(_, _, v)| v).unwrap_or(0);
                prop_assert!(spawned == 2 || spawned == 4);
                prop_assert_eq!(sum(&next.board), sum(&board) + spawned);
                prop_assert_eq!(next.score, gained);
            }
        }

        #[test]
        fn prop_each_tile_merges_at_most_once(board in arb_board(), d in 0usize..4) {
            let max_before = board.iter().flatten().copied().max().unwrap_or(0);
            let (slid, _) = slide(&board, Direction::ALL[d]);
            let max_after = slid.iter().flatten().copied().max().unwrap_or(0);
            prop_assert!(max_after <= max_before * 2);
            prop_assert_eq!(sum(&slid), sum(&board));
        }

        #[test]
        fn prop_lock_up_iff_no_move_changes_board(board in arb_board()) {
            let stuck = Direction::ALL.iter().all(|&d| slide(&board, d).0 == board);
            prop_assert_eq!(!has_moves(&board), stuck);
        }
    }
}
