pub mod flappy;
pub mod g2048;
pub mod memory;
pub mod platformer;
pub mod snake;
pub mod tictactoe;
pub mod typing;
pub mod whack;

use std::time::Duration;

use crossterm::event::KeyEvent;
use ratatui::prelude::*;

use crate::input::KeyReporting;

/// A mounted mini-game. The host owns exactly one at a time.
pub trait Game {
    /// Advances the game by the wall-clock time since the previous call.
    fn update(&mut self, dt: Duration);
    fn handle_input(&mut self, key: KeyEvent);
    /// Key releases, for terminals that report them.
    fn handle_release(&mut self, _key: KeyEvent) {}
    /// Left click at a terminal cell (absolute column/row).
    fn handle_click(&mut self, _column: u16, _row: u16) {}
    /// Told once on mount whether the terminal reports key releases.
    fn set_key_reporting(&mut self, _reporting: KeyReporting) {}
    fn render(&mut self, frame: &mut Frame, area: Rect);
    fn reset(&mut self);
    fn get_score(&self) -> u32;
    /// True once the session reached a terminal state (loss, win or time-up).
    fn is_game_over(&self) -> bool;
    /// Best score read from the store when the game is mounted.
    fn set_high_score(&mut self, _best: u32) {}
    /// Called by the host before the instance is dropped.
    fn teardown(&mut self) {}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameKind {
    FlappyBird,
    Snake,
    Game2048,
    TicTacToe,
    MemoryMatch,
    WhackAMole,
    TypingTest,
    MiniPlatformer,
}

impl GameKind {
    pub const COUNT: usize = 8;

    pub fn all() -> &'static [GameKind; GameKind::COUNT] {
        &[
            GameKind::FlappyBird,
            GameKind::Snake,
            GameKind::Game2048,
            GameKind::TicTacToe,
            GameKind::MemoryMatch,
            GameKind::WhackAMole,
            GameKind::TypingTest,
            GameKind::MiniPlatformer,
        ]
    }

    pub fn index(self) -> usize {
        match self {
            GameKind::FlappyBird => 0,
            GameKind::Snake => 1,
            GameKind::Game2048 => 2,
            GameKind::TicTacToe => 3,
            GameKind::MemoryMatch => 4,
            GameKind::WhackAMole => 5,
            GameKind::TypingTest => 6,
            GameKind::MiniPlatformer => 7,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            GameKind::FlappyBird => "Flappy Bird",
            GameKind::Snake => "Snake",
            GameKind::Game2048 => "2048",
            GameKind::TicTacToe => "Tic-Tac-Toe",
            GameKind::MemoryMatch => "Memory Match",
            GameKind::WhackAMole => "Whack-a-Mole",
            GameKind::TypingTest => "Typing Test",
            GameKind::MiniPlatformer => "Platformer",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            GameKind::FlappyBird => "🐤",
            GameKind::Snake => "🐍",
            GameKind::Game2048 => "🔢",
            GameKind::TicTacToe => "⭕",
            GameKind::MemoryMatch => "🧠",
            GameKind::WhackAMole => "🔨",
            GameKind::TypingTest => "⌨",
            GameKind::MiniPlatformer => "🏃",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            GameKind::FlappyBird => "Flap through\nthe pipes!",
            GameKind::Snake => "Eat and grow\nwithout crashing!",
            GameKind::Game2048 => "Slide tiles\nto reach 2048!",
            GameKind::TicTacToe => "Three in a row\nvs AI or a friend",
            GameKind::MemoryMatch => "Flip cards and\nfind the pairs!",
            GameKind::WhackAMole => "Hit the moles\nfor 60 seconds!",
            GameKind::TypingTest => "How fast can\nyou type?",
            GameKind::MiniPlatformer => "Jump, grab coins,\nreach the flag!",
        }
    }

    pub fn instructions(self) -> &'static [&'static str] {
        match self {
            GameKind::FlappyBird => &[
                "SPACE / ↑ / click to flap",
                "Avoid the pipes and the ground",
                "One point per pipe passed",
            ],
            GameKind::Snake => &[
                "Arrow keys or WASD to move",
                "Eat the food to grow longer",
                "Avoid walls and yourself",
            ],
            GameKind::Game2048 => &[
                "Arrow keys slide every tile",
                "Equal tiles merge into one",
                "Reach 2048, then C to keep going",
            ],
            GameKind::TicTacToe => &[
                "Arrows + Enter, 1-9 or click to place",
                "M switches vs AI / 2 players",
                "X always moves first",
            ],
            GameKind::MemoryMatch => &[
                "Arrows + Enter or click to flip",
                "Two cards up at a time",
                "Match every pair in few moves",
            ],
            GameKind::WhackAMole => &[
                "SPACE to start",
                "1-9 or click hits a hole",
                "10 points per mole in 60 seconds",
            ],
            GameKind::TypingTest => &[
                "Type the highlighted word",
                "SPACE finishes each word",
                "20 words, WPM and accuracy",
            ],
            GameKind::MiniPlatformer => &[
                "←/→ or A/D to run",
                "SPACE / ↑ to jump",
                "Collect coins, reach the flag",
            ],
        }
    }

    /// Store key for games where a higher score is better.
    pub fn score_key(self) -> Option<&'static str> {
        match self {
            GameKind::FlappyBird => Some("flappy_bird"),
            GameKind::Snake => Some("snake"),
            GameKind::Game2048 => Some("2048"),
            GameKind::WhackAMole => Some("whack_a_mole"),
            GameKind::TypingTest => Some("typing_test"),
            GameKind::MiniPlatformer => Some("mini_platformer"),
            GameKind::TicTacToe | GameKind::MemoryMatch => None,
        }
    }

    pub fn create(self) -> Box<dyn Game> {
        match self {
            GameKind::FlappyBird => Box::new(flappy::FlappyBird::new()),
            GameKind::Snake => Box::new(snake::SnakeGame::new()),
            GameKind::Game2048 => Box::new(g2048::Game2048::new()),
            GameKind::TicTacToe => Box::new(tictactoe::TicTacToe::new()),
            GameKind::MemoryMatch => Box::new(memory::MemoryMatch::new()),
            GameKind::WhackAMole => Box::new(whack::WhackAMole::new()),
            GameKind::TypingTest => Box::new(typing::TypingTest::new()),
            GameKind::MiniPlatformer => Box::new(platformer::MiniPlatformer::new()),
        }
    }
}

/// Shared footer: " key label │ key label ..." in the arcade's muted palette.
pub(crate) fn help_line(items: &[(&'static str, &'static str)]) -> Line<'static> {
    let mut spans = Vec::new();
    for (i, (key, label)) in items.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled("│ ", Style::default().fg(Color::Rgb(60, 60, 60))));
        }
        spans.push(Span::styled(
            format!(" {key} "),
            Style::default().fg(Color::Rgb(80, 200, 255)),
        ));
        spans.push(Span::styled(format!("{label} "), Style::default().fg(Color::DarkGray)));
    }
    Line::from(spans)
}

/// Status banner used for game over / win lines.
pub(crate) fn banner(icon: &'static str, text: &str, color: Color, hint: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!(" {icon} {text} "),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(hint, Style::default().fg(Color::Gray)),
    ])
}

/// Rounded game frame; returns the inner area.
pub(crate) fn frame_block(frame: &mut Frame, area: Rect, title: &str, accent: Color) -> Rect {
    let block = ratatui::widgets::Block::default()
        .borders(ratatui::widgets::Borders::ALL)
        .border_type(ratatui::widgets::BorderType::Rounded)
        .border_style(Style::default().fg(accent))
        .title(format!(" {title} "))
        .title_style(Style::default().fg(accent).add_modifier(Modifier::BOLD));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    inner
}

/// Status / field / help split used by every game screen.
pub(crate) fn split_screen(inner: Rect) -> (Rect, Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Status bar
            Constraint::Min(3),    // Game field
            Constraint::Length(1), // Help
        ])
        .split(inner);
    (chunks[0], chunks[1], chunks[2])
}

/// Maps an absolute terminal cell into `area`, relative to its top-left corner.
pub(crate) fn local_cell(area: Rect, column: u16, row: u16) -> Option<(u16, u16)> {
    let inside = column >= area.x && column < area.right() && row >= area.y && row < area.bottom();
    inside.then(|| (column - area.x, row - area.y))
}

/// Converts a styled character grid into paragraph lines.
pub(crate) fn grid_lines(grid: Vec<Vec<(char, Style)>>) -> Vec<Line<'static>> {
    grid.into_iter()
        .map(|row| {
            let spans: Vec<Span<'static>> = row
                .into_iter()
                .map(|(ch, style)| Span::styled(String::from(ch), style))
                .collect();
            Line::from(spans)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_indices_match_order() {
        for (i, kind) in GameKind::all().iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn clicks_map_into_area() {
        let area = Rect::new(10, 5, 4, 3);
        assert_eq!(local_cell(area, 10, 5), Some((0, 0)));
        assert_eq!(local_cell(area, 13, 7), Some((3, 2)));
        assert_eq!(local_cell(area, 14, 7), None);
        assert_eq!(local_cell(area, 9, 6), None);
        assert_eq!(local_cell(Rect::default(), 0, 0), None);
    }

    #[test]
    fn score_keys_are_unique() {
        let keys: Vec<_> = GameKind::all().iter().filter_map(|k| k.score_key()).collect();
        let mut dedup = keys.clone();
        dedup.sort();
        dedup.dedup();
        assert_eq!(keys.len(), dedup.len());
    }
}
