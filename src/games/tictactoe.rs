use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent};
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::games::{banner, frame_block, help_line, local_cell, split_screen, Game};
use crate::schedule::Schedule;

const AI_DELAY: Duration = Duration::from_millis(500);

pub const LINES: [[usize; 3]; 8] = [
    [0, 1, 2], [3, 4, 5], [6, 7, 8], // rows
    [0, 3, 6], [1, 4, 7], [2, 5, 8], // columns
    [0, 4, 8], [2, 4, 6],            // diagonals
];
const CORNERS: [usize; 4] = [0, 2, 6, 8];
const CENTER: usize = 4;
// Board placement inside the field: the turn line and a blank line sit above
// it, and each cell is 5 wide plus a divider.
const BOARD_TOP: u16 = 2;
const BOARD_LEFT: u16 = 3;
const CELL_W: u16 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn other(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Mark::X => "X",
            Mark::O => "O",
        }
    }
}

pub type Board = [Option<Mark>; 9];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Win(Mark, [usize; 3]),
    Draw,
}

/// Winner (with its line), draw on a full board, or `None` while play continues.
pub fn evaluate(board: &Board) -> Option<Outcome> {
    for line in LINES {
        let [a, b, c] = line;
        if let Some(m) = board[a] {
            if board[b] == Some(m) && board[c] == Some(m) {
                return Some(Outcome::Win(m, line));
            }
        }
    }
    if board.iter().all(Option::is_some) {
        Some(Outcome::Draw)
    } else {
        None
    }
}

fn free_cells(board: &Board) -> Vec<usize> {
    (0..9).filter(|&i| board[i].is_none()).collect()
}

fn winning_cell(board: &Board, mark: Mark) -> Option<usize> {
    free_cells(board).into_iter().find(|&i| {
        let mut test = *board;
        test[i] = Some(mark);
        matches!(evaluate(&test), Some(Outcome::Win(m, _)) if m == mark)
    })
}

/// Greedy reply: win, else block, else centre, else a random corner,
/// else any random free cell. Beatable on purpose.
pub fn ai_move(board: &Board, ai: Mark, rng: &mut impl Rng) -> Option<usize> {
    if let Some(i) = winning_cell(board, ai) {
        return Some(i);
    }
    if let Some(i) = winning_cell(board, ai.other()) {
        return Some(i);
    }
    if board[CENTER].is_none() {
        return Some(CENTER);
    }
    let corners: Vec<usize> = CORNERS.into_iter().filter(|&i| board[i].is_none()).collect();
    if let Some(&i) = corners.choose(rng) {
        return Some(i);
    }
    free_cells(board).choose(rng).copied()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    VsAi,
    TwoPlayers,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub x: u32,
    pub o: u32,
    pub draws: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct State {
    pub board: Board,
    pub to_move: Mark,
    pub outcome: Option<Outcome>,
    pub mode: Mode,
    pub tally: Tally,
}

impl State {
    pub fn new(mode: Mode) -> Self {
        Self {
            board: [None; 9],
            to_move: Mark::X,
            outcome: None,
            mode,
            tally: Tally::default(),
        }
    }

    /// Fresh round keeping mode and tallies.
    pub fn new_round(&self) -> Self {
        Self {
            tally: self.tally,
            ..Self::new(self.mode)
        }
    }

    pub fn ai_to_move(&self) -> bool {
        self.mode == Mode::VsAi && self.to_move == Mark::O && self.outcome.is_none()
    }
}

/// Places the side-to-move's mark on `cell`. Occupied cells and finished
/// rounds leave the state unchanged.
pub fn place(state: &State, cell: usize) -> State {
    if cell >= 9 || state.board[cell].is_some() || state.outcome.is_some() {
        return state.clone();
    }
    let mut next = state.clone();
    next.board[cell] = Some(state.to_move);
    next.outcome = evaluate(&next.board);
    match next.outcome {
        Some(Outcome::Win(Mark::X, _)) => next.tally.x += 1,
        Some(Outcome::Win(Mark::O, _)) => next.tally.o += 1,
        Some(Outcome::Draw) => next.tally.draws += 1,
        None => next.to_move = state.to_move.other(),
    }
    next
}

/// Board cell under a field-relative position, if any. Divider lines and
/// columns are not part of any cell.
pub fn cell_at(x: u16, y: u16) -> Option<usize> {
    if y < BOARD_TOP || x < BOARD_LEFT {
        return None;
    }
    let (dy, dx) = (y - BOARD_TOP, x - BOARD_LEFT);
    if dy % 2 != 0 || dx % (CELL_W + 1) == CELL_W {
        return None;
    }
    let (row, col) = ((dy / 2) as usize, (dx / (CELL_W + 1)) as usize);
    (row < 3 && col < 3).then_some(row * 3 + col)
}

#[derive(Clone, Copy, Debug)]
enum Pending {
    AiReply,
}

pub struct TicTacToe {
    state: State,
    cursor: usize,
    schedule: Schedule<Pending>,
    field: Rect,
}

impl TicTacToe {
    pub fn new() -> Self {
        Self {
            state: State::new(Mode::VsAi),
            cursor: CENTER,
            schedule: Schedule::new(),
            field: Rect::default(),
        }
    }

    fn human_place(&mut self, cell: usize) {
        if self.state.ai_to_move() {
            return;
        }
        self.state = place(&self.state, cell);
        if self.state.ai_to_move() {
            self.schedule.after(AI_DELAY, Pending::AiReply);
        }
    }

    fn new_round(&mut self) {
        self.schedule.cancel_all();
        self.state = self.state.new_round();
    }

    fn render_board(&self) -> Vec<Line<'static>> {
        let win_line = match self.state.outcome {
            Some(Outcome::Win(_, line)) => Some(line),
            _ => None,
        };
        let mut lines = Vec::new();
        for row in 0..3 {
            let mut spans = vec![Span::raw("   ")];
            for col in 0..3 {
                let i = row * 3 + col;
                let (text, fg) = match self.state.board[i] {
                    Some(Mark::X) => ("X", Color::Rgb(80, 160, 255)),
                    Some(Mark::O) => ("O", Color::Rgb(255, 90, 90)),
                    None => ("·", Color::Rgb(90, 90, 110)),
                };
                let mut style = Style::default().fg(fg).add_modifier(Modifier::BOLD);
                if win_line.is_some_and(|l| l.contains(&i)) {
                    style = style.bg(Color::Rgb(30, 110, 50));
                } else if i == self.cursor && self.state.outcome.is_none() {
                    style = style.bg(Color::Rgb(70, 70, 100));
                }
                spans.push(Span::styled(format!("  {text}  "), style));
                if col < 2 {
                    spans.push(Span::styled("│", Style::default().fg(Color::Rgb(100, 100, 130))));
                }
            }
            lines.push(Line::from(spans));
            if row < 2 {
                lines.push(Line::from(Span::styled(
                    "   ─────┼─────┼─────",
                    Style::default().fg(Color::Rgb(100, 100, 130)),
                )));
            }
        }
        lines
    }
}

impl Game for TicTacToe {
    fn update(&mut self, dt: Duration) {
        self.schedule.advance(dt);
        while let Some(Pending::AiReply) = self.schedule.pop_due() {
            if !self.state.ai_to_move() {
                continue;
            }
            if let Some(cell) = ai_move(&self.state.board, Mark::O, &mut rand::thread_rng()) {
                debug!("tic-tac-toe AI plays {cell}");
                self.state = place(&self.state, cell);
            }
        }
    }

    fn handle_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Char('r') | KeyCode::Char('R') => self.new_round(),
            KeyCode::Char('c') | KeyCode::Char('C') => self.state.tally = Tally::default(),
            KeyCode::Char('m') | KeyCode::Char('M') => {
                self.state.mode = match self.state.mode {
                    Mode::VsAi => Mode::TwoPlayers,
                    Mode::TwoPlayers => Mode::VsAi,
                };
                self.new_round();
            }
            KeyCode::Up => self.cursor = (self.cursor + 6) % 9,
            KeyCode::Down => self.cursor = (self.cursor + 3) % 9,
            KeyCode::Left => self.cursor = self.cursor / 3 * 3 + (self.cursor % 3 + 2) % 3,
            KeyCode::Right => self.cursor = self.cursor / 3 * 3 + (self.cursor % 3 + 1) % 3,
            KeyCode::Enter | KeyCode::Char(' ') => {
                if self.state.outcome.is_some() {
                    self.new_round();
                } else {
                    self.human_place(self.cursor);
                }
            }
            KeyCode::Char(c @ '1'..='9') => {
                let cell = c as usize - '1' as usize;
                self.cursor = cell;
                self.human_place(cell);
            }
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let inner = frame_block(frame, area, "⭕ Tic-Tac-Toe", Color::Rgb(200, 100, 220));
        let (status_area, field, help_area) = split_screen(inner);

        let t = self.state.tally;
        let mode = match self.state.mode {
            Mode::VsAi => "vs AI",
            Mode::TwoPlayers => "2 Players",
        };
        let status = Line::from(vec![
            Span::styled(format!(" {mode} "), Style::default().fg(Color::Rgb(200, 120, 255)).add_modifier(Modifier::BOLD)),
            Span::styled(" │ ", Style::default().fg(Color::DarkGray)),
            Span::styled(format!("X: {} ", t.x), Style::default().fg(Color::Rgb(80, 160, 255))),
            Span::styled(format!("Draws: {} ", t.draws), Style::default().fg(Color::Gray)),
            Span::styled(format!("O: {} ", t.o), Style::default().fg(Color::Rgb(255, 90, 90))),
        ]);
        frame.render_widget(Paragraph::new(status), status_area);

        let turn = match self.state.outcome {
            Some(Outcome::Win(m, _)) => format!("{} wins!", m.symbol()),
            Some(Outcome::Draw) => "It's a draw!".to_string(),
            None if self.state.ai_to_move() => "AI is thinking...".to_string(),
            None => format!("{}'s turn", self.state.to_move.symbol()),
        };
        let mut lines = vec![
            Line::from(Span::styled(format!("   {turn}"), Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))),
            Line::from(""),
        ];
        lines.extend(self.render_board());
        self.field = field;
        frame.render_widget(Paragraph::new(lines), field);

        let help = if self.state.outcome.is_some() {
            banner("🏁", "ROUND OVER", Color::Green, "Enter/N next round │ C clear scores │ Esc menu")
        } else {
            help_line(&[("↑↓←→", "Cursor"), ("Enter/1-9/Click", "Place"), ("M", "Mode"), ("N", "New"), ("Esc", "Menu")])
        };
        frame.render_widget(Paragraph::new(help), help_area);
    }

    fn handle_click(&mut self, column: u16, row: u16) {
        let Some((x, y)) = local_cell(self.field, column, row) else { return };
        if self.state.outcome.is_some() {
            self.new_round();
        } else if let Some(cell) = cell_at(x, y) {
            self.cursor = cell;
            self.human_place(cell);
        }
    }

    fn reset(&mut self) {
        self.new_round();
    }

    fn get_score(&self) -> u32 {
        self.state.tally.x
    }

    fn is_game_over(&self) -> bool {
        self.state.outcome.is_some()
    }

    fn teardown(&mut self) {
        self.schedule.cancel_all();
    }
}
