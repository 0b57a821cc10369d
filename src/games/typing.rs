use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use rand::seq::SliceRandom;
use rand::Rng;
use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::games::{banner, frame_block, help_line, split_screen, Game};

pub const TEST_LENGTH: usize = 20;

pub const WORDS: [&str; 66] = [
    "the", "quick", "brown", "fox", "jumps", "over", "lazy", "dog", "and", "runs",
    "through", "forest", "with", "great", "speed", "while", "birds", "sing", "in", "trees",
    "javascript", "react", "component", "function", "variable", "array", "object", "string",
    "number", "boolean", "promise", "async", "await", "callback", "closure", "prototype",
    "class", "method", "property", "event", "listener", "handler", "element", "document",
    "window", "console", "error", "debug", "test", "code", "developer", "programming",
    "software", "computer", "algorithm", "data", "structure", "loop", "condition",
    "statement", "expression", "syntax", "semantic", "logic", "beautiful", "amazing",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mistake {
    pub expected: &'static str,
    pub typed: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct State {
    pub words: Vec<&'static str>,
    pub index: usize,
    pub input: String,
    pub elapsed: Duration,
    pub started: bool,
    pub complete: bool,
    pub correct_chars: usize,
    pub total_chars: usize,
    pub mistakes: Vec<Mistake>,
}

impl State {
    pub fn new(rng: &mut impl Rng) -> Self {
        let words = WORDS.choose_multiple(rng, TEST_LENGTH).copied().collect();
        Self::with_words(words)
    }

    pub fn with_words(words: Vec<&'static str>) -> Self {
        Self {
            words,
            index: 0,
            input: String::new(),
            elapsed: Duration::ZERO,
            started: false,
            complete: false,
            correct_chars: 0,
            total_chars: 0,
            mistakes: Vec::new(),
        }
    }

    pub fn current_word(&self) -> Option<&'static str> {
        self.words.get(self.index).copied()
    }

    fn minutes(&self) -> f64 {
        self.elapsed.as_secs_f64() / 60.0
    }

    /// Words per minute, counting five typed characters of the current word
    /// as one word.
    pub fn live_wpm(&self) -> u32 {
        let minutes = self.minutes();
        if minutes <= 0.0 {
            return 0;
        }
        let words = self.index as f64 + self.input.chars().count() as f64 / 5.0;
        (words / minutes).round() as u32
    }

    pub fn final_wpm(&self) -> u32 {
        let minutes = self.minutes();
        if minutes <= 0.0 {
            return 0;
        }
        (self.words.len() as f64 / minutes).round() as u32
    }

    pub fn wpm(&self) -> u32 {
        if self.complete {
            self.final_wpm()
        } else {
            self.live_wpm()
        }
    }

    pub fn accuracy(&self) -> u32 {
        if self.total_chars == 0 {
            return 100;
        }
        (self.correct_chars as f64 / self.total_chars as f64 * 100.0).round() as u32
    }
}

/// Handles a typed character. Space completes the current word.
pub fn type_char(state: &State, ch: char) -> State {
    if state.complete {
        return state.clone();
    }
    let mut next = state.clone();
    next.started = true;
    if ch != ' ' {
        next.input.push(ch);
        return next;
    }
    let Some(expected) = state.current_word() else {
        return next;
    };
    let typed = next.input.trim().to_string();
    next.total_chars += expected.len();
    if typed == expected {
        next.correct_chars += expected.len();
    } else {
        next.mistakes.push(Mistake { expected, typed });
    }
    next.input.clear();
    if next.index + 1 >= next.words.len() {
        next.complete = true;
    } else {
        next.index += 1;
    }
    next
}

pub fn backspace(state: &State) -> State {
    let mut next = state.clone();
    if !state.complete {
        next.input.pop();
    }
    next
}

/// The clock only runs between the first keystroke and the last word.
pub fn tick(state: &State, dt: Duration) -> State {
    let mut next = state.clone();
    if state.started && !state.complete {
        next.elapsed += dt;
    }
    next
}

pub struct TypingTest {
    state: State,
    high_score: u32,
}

impl TypingTest {
    pub fn new() -> Self {
        Self {
            state: State::new(&mut rand::thread_rng()),
            high_score: 0,
        }
    }

    fn render_words(&self) -> Vec<Line<'static>> {
        let mut spans = Vec::new();
        for (i, word) in self.state.words.iter().enumerate() {
            if i < self.state.index || (self.state.complete && i == self.state.index) {
                let missed = self.state.mistakes.iter().any(|m| m.expected == *word);
                let color = if missed { Color::Rgb(220, 80, 80) } else { Color::Rgb(80, 200, 120) };
                spans.push(Span::styled(word.to_string(), Style::default().fg(color)));
            } else if i == self.state.index {
                let typed: Vec<char> = self.state.input.chars().collect();
                for (j, expected) in word.chars().enumerate() {
                    let style = match typed.get(j) {
                        Some(t) if *t == expected => Style::default().fg(Color::Rgb(80, 200, 120)),
                        Some(_) => Style::default().fg(Color::White).bg(Color::Rgb(150, 40, 40)),
                        None if j == typed.len() => Style::default().fg(Color::White).bg(Color::Rgb(40, 70, 150)),
                        None => Style::default().fg(Color::Gray).add_modifier(Modifier::UNDERLINED),
                    };
                    spans.push(Span::styled(expected.to_string(), style));
                }
                if typed.len() > word.chars().count() {
                    let extra: String = typed[word.chars().count()..].iter().collect();
                    spans.push(Span::styled(extra, Style::default().fg(Color::White).bg(Color::Rgb(150, 40, 40))));
                }
            } else {
                spans.push(Span::styled(word.to_string(), Style::default().fg(Color::DarkGray)));
            }
            spans.push(Span::raw(" "));
        }
        vec![Line::from(spans)]
    }

    fn new_test(&mut self) {
        let hs = self.high_score;
        *self = TypingTest::new();
        self.high_score = hs;
    }
}

impl Game for TypingTest {
    fn update(&mut self, dt: Duration) {
        self.state = tick(&self.state, dt);
    }

    fn handle_input(&mut self, key: KeyEvent) {
        if self.state.complete {
            if matches!(key.code, KeyCode::Enter | KeyCode::Char('n') | KeyCode::Char('N')) {
                if self.state.final_wpm() > self.high_score {
                    self.high_score = self.state.final_wpm();
                }
                self.new_test();
            }
            return;
        }
        match key.code {
            KeyCode::Backspace => self.state = backspace(&self.state),
            KeyCode::Char(c) if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
                self.state = type_char(&self.state, c);
            }
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let inner = frame_block(frame, area, "⌨ Typing Test", Color::Rgb(156, 39, 176));
        let (status_area, field, help_area) = split_screen(inner);

        let status = Line::from(vec![
            Span::styled(
                format!(" WPM: {} ", self.state.wpm()),
                Style::default().fg(Color::Rgb(80, 160, 255)).add_modifier(Modifier::BOLD),
            ),
            Span::styled(" │ ", Style::default().fg(Color::DarkGray)),
            Span::styled(format!("Accuracy: {}% ", self.state.accuracy()), Style::default().fg(Color::Green)),
            Span::styled(" │ ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!("Word {}/{} ", (self.state.index + 1).min(self.state.words.len()), self.state.words.len()),
                Style::default().fg(Color::Rgb(180, 120, 255)),
            ),
            Span::styled(" │ ", Style::default().fg(Color::DarkGray)),
            Span::styled(format!("🏆 Best: {} WPM ", self.high_score), Style::default().fg(Color::Cyan)),
        ]);
        frame.render_widget(Paragraph::new(status), status_area);

        let [words_area, input_area, mistakes_area] = Layout::vertical([
            Constraint::Min(4),
            Constraint::Length(3),
            Constraint::Length(4),
        ])
        .areas(field);
        frame.render_widget(
            Paragraph::new(self.render_words()).wrap(Wrap { trim: true }).block(Block::default().padding(Padding::horizontal(1))),
            words_area,
        );
        frame.render_widget(
            Paragraph::new(format!("{}▏", self.state.input)).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(Color::Rgb(156, 39, 176)))
                    .title(" Type here "),
            ),
            input_area,
        );
        if self.state.complete && !self.state.mistakes.is_empty() {
            let list: Vec<Span> = self
                .state
                .mistakes
                .iter()
                .take(5)
                .map(|m| Span::styled(format!("{} → {}  ", m.expected, m.typed), Style::default().fg(Color::Rgb(220, 80, 80))))
                .collect();
            frame.render_widget(
                Paragraph::new(vec![Line::from(" Mistakes:"), Line::from(list)]).wrap(Wrap { trim: true }),
                mistakes_area,
            );
        }

        let help = if self.state.complete {
            banner(
                "🏁",
                &format!("Done! {} WPM at {}% accuracy", self.state.final_wpm(), self.state.accuracy()),
                Color::Green,
                "Enter for a new test, Esc for menu",
            )
        } else if !self.state.started {
            banner("▶", "Start typing to begin the timer", Color::Yellow, "Space submits each word")
        } else {
            help_line(&[("Space", "Next word"), ("Backspace", "Delete"), ("Esc", "Menu")])
        };
        frame.render_widget(Paragraph::new(help), help_area);
    }

    fn reset(&mut self) {
        self.new_test();
    }

    fn get_score(&self) -> u32 {
        self.state.wpm()
    }

    fn is_game_over(&self) -> bool {
        self.state.complete
    }

    fn set_high_score(&mut self, best: u32) {
        self.high_score = best;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn type_str(mut s: State, text: &str) -> State {
        for c in text.chars() {
            s = type_char(&s, c);
        }
        s
    }

    #[test]
    fn sample_is_distinct_words() {
        let s = State::new(&mut StdRng::seed_from_u64(11));
        assert_eq!(s.words.len(), TEST_LENGTH);
        let mut sorted = s.words.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), TEST_LENGTH);
    }

    #[test]
    fn clock_waits_for_first_keystroke() {
        let s = tick(&State::with_words(vec!["a"]), Duration::from_secs(5));
        assert_eq!(s.elapsed, Duration::ZERO);
        let s = tick(&type_char(&s, 'a'), Duration::from_secs(5));
        assert_eq!(s.elapsed, Duration::from_secs(5));
    }

    #[test]
    fn perfect_run_over_a_minute() {
        let mut s = State::new(&mut StdRng::seed_from_u64(2));
        let words = s.words.clone();
        for word in words {
            s = type_str(s, word);
            s = tick(&s, Duration::from_secs(3));
            s = type_char(&s, ' ');
        }
        assert!(s.complete);
        assert_eq!(s.final_wpm(), TEST_LENGTH as u32);
        assert_eq!(s.accuracy(), 100);
        assert!(s.mistakes.is_empty());
        // Clock stopped with the last word.
        assert_eq!(tick(&s, Duration::from_secs(9)).elapsed, Duration::from_secs(60));
    }

    #[test]
    fn wrong_word_is_recorded() {
        let s = State::with_words(vec!["loop", "data"]);
        let s = type_str(s, "lop ");
        assert_eq!(s.index, 1);
        assert_eq!(s.total_chars, 4);
        assert_eq!(s.correct_chars, 0);
        assert_eq!(s.mistakes, vec![Mistake { expected: "loop", typed: "lop".into() }]);
        let s = type_str(s, "data ");
        assert!(s.complete);
        assert_eq!(s.accuracy(), 50);
    }

    #[test]
    fn backspace_fixes_typo() {
        let s = type_str(State::with_words(vec!["fox"]), "fob");
        let s = backspace(&s);
        let s = type_str(s, "x ");
        assert_eq!(s.accuracy(), 100);
    }

    #[test]
    fn live_wpm_counts_partial_word() {
        let s = type_str(State::with_words(vec!["the", "quick", "brown"]), "the quick ");
        let s = type_str(s, "brown");
        let s = tick(&s, Duration::from_secs(30));
        // 2 words + 5/5 chars over half a minute.
        assert_eq!(s.live_wpm(), 6);
        assert_eq!(State::with_words(vec!["x"]).accuracy(), 100);
    }

    #[test]
    fn enter_after_completion_starts_new_test() {
        let mut g = TypingTest::new();
        g.state = State::with_words(vec!["in"]);
        g.handle_input(KeyEvent::from(KeyCode::Char('i')));
        g.update(Duration::from_secs(6));
        g.handle_input(KeyEvent::from(KeyCode::Char('n')));
        g.handle_input(KeyEvent::from(KeyCode::Char(' ')));
        assert!(g.is_game_over());
        assert_eq!(g.get_score(), 10);
        g.handle_input(KeyEvent::from(KeyCode::Enter));
        assert!(!g.is_game_over());
        assert_eq!(g.state.words.len(), TEST_LENGTH);
        assert_eq!(g.high_score, 10);
    }
}
