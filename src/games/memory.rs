use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent};
use rand::seq::SliceRandom;
use rand::Rng;
use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::games::{banner, frame_block, help_line, local_cell, split_screen, Game};
use crate::schedule::Schedule;

pub const SYMBOLS: [&str; 8] = ["🎮", "🎯", "🎲", "🎪", "🎨", "🎭", "🎸", "🎺"];
pub const COLS: usize = 4;
pub const REVEAL_DELAY: Duration = Duration::from_millis(1000);
// Hit boxes follow the layout of `render_cards`.
const CARD_W: u16 = 4;
const CARD_STRIDE: u16 = 6;
const MARGIN: u16 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Face {
    Down,
    Up,
    Matched,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Card {
    pub symbol: usize,
    pub face: Face,
}

#[derive(Clone, Debug, PartialEq)]
pub struct State {
    pub cards: Vec<Card>,
    pub moves: u32,
    /// The two face-up cards awaiting resolution.
    pub pending: Option<(usize, usize)>,
}

impl State {
    /// Two of each symbol, shuffled.
    pub fn new(rng: &mut impl Rng) -> Self {
        let mut cards: Vec<Card> = (0..SYMBOLS.len())
            .chain(0..SYMBOLS.len())
            .map(|symbol| Card { symbol, face: Face::Down })
            .collect();
        cards.shuffle(rng);
        Self { cards, moves: 0, pending: None }
    }

    pub fn face_up(&self) -> Vec<usize> {
        (0..self.cards.len()).filter(|&i| self.cards[i].face == Face::Up).collect()
    }

    pub fn matched_pairs(&self) -> usize {
        self.cards.iter().filter(|c| c.face == Face::Matched).count() / 2
    }

    pub fn won(&self) -> bool {
        !self.cards.is_empty() && self.cards.iter().all(|c| c.face == Face::Matched)
    }
}

/// Turns card `idx` face up. Ignored while a pair is awaiting resolution or
/// when the card is not face down. The second card of a pair counts a move
/// and sets `pending`.
pub fn flip(state: &State, idx: usize) -> State {
    if state.pending.is_some() || state.cards.get(idx).map(|c| c.face) != Some(Face::Down) {
        return state.clone();
    }
    let mut next = state.clone();
    next.cards[idx].face = Face::Up;
    let up = next.face_up();
    if let [a, b] = up[..] {
        next.moves += 1;
        next.pending = Some((a, b));
    }
    next
}

/// Settles the pending pair: matched cards stay up for good, others go back down.
pub fn resolve(state: &State) -> State {
    let Some((a, b)) = state.pending else {
        return state.clone();
    };
    let mut next = state.clone();
    let face = if next.cards[a].symbol == next.cards[b].symbol {
        Face::Matched
    } else {
        Face::Down
    };
    next.cards[a].face = face;
    next.cards[b].face = face;
    next.pending = None;
    next
}

/// Card index under a field-relative cell, if any.
pub fn card_at(x: u16, y: u16, count: usize) -> Option<usize> {
    if y % 2 != 0 || x < MARGIN || (x - MARGIN) % CARD_STRIDE >= CARD_W {
        return None;
    }
    let col = ((x - MARGIN) / CARD_STRIDE) as usize;
    let idx = (y / 2) as usize * COLS + col;
    (col < COLS && idx < count).then_some(idx)
}

#[derive(Clone, Copy, Debug)]
enum Pending {
    Resolve,
}

pub struct MemoryMatch {
    state: State,
    cursor: usize,
    schedule: Schedule<Pending>,
    field: Rect,
}

impl MemoryMatch {
    pub fn new() -> Self {
        Self {
            state: State::new(&mut rand::thread_rng()),
            cursor: 0,
            schedule: Schedule::new(),
            field: Rect::default(),
        }
    }

    fn pick(&mut self, idx: usize) {
        let was_pending = self.state.pending.is_some();
        self.state = flip(&self.state, idx);
        if !was_pending && self.state.pending.is_some() {
            self.schedule.after(REVEAL_DELAY, Pending::Resolve);
        }
    }

    fn move_cursor(&mut self, dx: isize, dy: isize) {
        let rows = self.state.cards.len() / COLS;
        let col = (self.cursor % COLS) as isize;
        let row = (self.cursor / COLS) as isize;
        let col = (col + dx).rem_euclid(COLS as isize) as usize;
        let row = (row + dy).rem_euclid(rows as isize) as usize;
        self.cursor = row * COLS + col;
    }

    fn render_cards(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for (r, row) in self.state.cards.chunks(COLS).enumerate() {
            let mut spans = vec![Span::raw("  ")];
            for (c, card) in row.iter().enumerate() {
                let i = r * COLS + c;
                let (text, mut style) = match card.face {
                    Face::Down => (" ?? ".to_string(), Style::default().fg(Color::White).bg(Color::Rgb(30, 150, 160))),
                    Face::Up => (format!(" {} ", SYMBOLS[card.symbol]), Style::default().bg(Color::Rgb(230, 230, 240))),
                    Face::Matched => (format!(" {} ", SYMBOLS[card.symbol]), Style::default().bg(Color::Rgb(40, 120, 60))),
                };
                if i == self.cursor {
                    style = style.add_modifier(Modifier::REVERSED | Modifier::BOLD);
                }
                spans.push(Span::styled(text, style));
                spans.push(Span::raw("  "));
            }
            lines.push(Line::from(spans));
            lines.push(Line::from(""));
        }
        lines
    }
}

impl Game for MemoryMatch {
    fn update(&mut self, dt: Duration) {
        self.schedule.advance(dt);
        while let Some(Pending::Resolve) = self.schedule.pop_due() {
            self.state = resolve(&self.state);
        }
    }

    fn handle_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Char('r') | KeyCode::Char('R') => self.reset(),
            KeyCode::Up => self.move_cursor(0, -1),
            KeyCode::Down => self.move_cursor(0, 1),
            KeyCode::Left => self.move_cursor(-1, 0),
            KeyCode::Right => self.move_cursor(1, 0),
            KeyCode::Enter | KeyCode::Char(' ') => {
                if self.state.won() {
                    self.reset();
                } else {
                    self.pick(self.cursor);
                }
            }
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let inner = frame_block(frame, area, "🧠 Memory Match", Color::Rgb(40, 190, 200));
        let (status_area, field, help_area) = split_screen(inner);

        let status = Line::from(vec![
            Span::styled(
                format!(" Moves: {} ", self.state.moves),
                Style::default().fg(Color::Rgb(80, 160, 255)).add_modifier(Modifier::BOLD),
            ),
            Span::styled(" │ ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!("Pairs: {}/{} ", self.state.matched_pairs(), SYMBOLS.len()),
                Style::default().fg(Color::Green),
            ),
        ]);
        frame.render_widget(Paragraph::new(status), status_area);
        self.field = field;
        frame.render_widget(Paragraph::new(self.render_cards()), field);

        let help = if self.state.won() {
            banner("🎉", &format!("You won in {} moves!", self.state.moves), Color::Green, "Enter to play again, Esc for menu")
        } else if !self.schedule.is_empty() {
            banner("👀", "Checking pair...", Color::Rgb(40, 190, 200), "")
        } else {
            help_line(&[("↑↓←→", "Cursor"), ("Enter/Click", "Flip"), ("N", "New game"), ("Esc", "Menu")])
        };
        frame.render_widget(Paragraph::new(help), help_area);
    }

    fn handle_click(&mut self, column: u16, row: u16) {
        let Some((x, y)) = local_cell(self.field, column, row) else { return };
        if let Some(idx) = card_at(x, y, self.state.cards.len()) {
            self.cursor = idx;
            self.pick(idx);
        }
    }

    fn reset(&mut self) {
        self.schedule.cancel_all();
        *self = MemoryMatch::new();
    }

    fn get_score(&self) -> u32 {
        self.state.moves
    }

    fn is_game_over(&self) -> bool {
        self.state.won()
    }

    fn teardown(&mut self) {
        self.schedule.cancel_all();
    }
}
