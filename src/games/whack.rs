use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent};
use log::info;
use rand::Rng;
use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::games::{banner, frame_block, help_line, local_cell, split_screen, Game};
use crate::schedule::{Schedule, TimerId};

pub const HOLES: usize = 9;
pub const SESSION_SECS: u32 = 60;
pub const HIT_POINTS: u32 = 10;
const SECOND: Duration = Duration::from_secs(1);
const RESPAWN_AFTER_HIT: Duration = Duration::from_millis(300);
// Hit boxes follow the layout of `render_holes`: label and body lines per row.
const HOLE_W: u16 = 5;
const HOLE_STRIDE: u16 = 7;
const MARGIN: u16 = 2;

fn visible_for(rng: &mut impl Rng) -> Duration {
    Duration::from_millis(rng.gen_range(800..2000))
}

fn respawn_gap(rng: &mut impl Rng) -> Duration {
    Duration::from_millis(rng.gen_range(200..700))
}

/// Hole under a field-relative cell, if any.
pub fn hole_at(x: u16, y: u16) -> Option<usize> {
    if y % 3 == 2 || x < MARGIN || (x - MARGIN) % HOLE_STRIDE >= HOLE_W {
        return None;
    }
    let (row, col) = ((y / 3) as usize, ((x - MARGIN) / HOLE_STRIDE) as usize);
    (row < 3 && col < 3).then_some(row * 3 + col)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Over,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Timer {
    Countdown,
    Hide,
    Spawn,
}

#[derive(Clone, Debug)]
pub struct Session {
    pub phase: Phase,
    pub mole: Option<usize>,
    pub score: u32,
    pub hits: u32,
    pub time_left: u32,
    /// Wall-clock time fed to the session while it was running.
    pub elapsed: Duration,
    schedule: Schedule<Timer>,
    hide_timer: Option<TimerId>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            mole: None,
            score: 0,
            hits: 0,
            time_left: SESSION_SECS,
            elapsed: Duration::ZERO,
            schedule: Schedule::new(),
            hide_timer: None,
        }
    }

    pub fn start(&self, rng: &mut impl Rng) -> Self {
        let mut next = Session::new();
        next.phase = Phase::Running;
        next.schedule.after(SECOND, Timer::Countdown);
        next.spawn(rng);
        next
    }

    fn spawn(&mut self, rng: &mut impl Rng) {
        self.mole = Some(rng.gen_range(0..HOLES));
        self.hide_timer = Some(self.schedule.after(visible_for(rng), Timer::Hide));
    }

    fn fire(&mut self, timer: Timer, rng: &mut impl Rng) {
        match timer {
            Timer::Countdown => {
                self.time_left = self.time_left.saturating_sub(1);
                if self.time_left == 0 {
                    self.phase = Phase::Over;
                    self.mole = None;
                    self.hide_timer = None;
                    self.schedule.cancel_all();
                } else {
                    self.schedule.after(SECOND, Timer::Countdown);
                }
            }
            Timer::Hide => {
                self.mole = None;
                self.hide_timer = None;
                self.schedule.after(respawn_gap(rng), Timer::Spawn);
            }
            Timer::Spawn => self.spawn(rng),
        }
    }

    /// Advances timers by `dt`; no-op unless running.
    pub fn update(&self, dt: Duration, rng: &mut impl Rng) -> Self {
        let mut next = self.clone();
        if next.phase != Phase::Running {
            return next;
        }
        next.elapsed += dt;
        next.schedule.advance(dt);
        while let Some(timer) = next.schedule.pop_due() {
            next.fire(timer, rng);
        }
        next
    }

    /// Whacks `hole`. Only the visible mole scores; anything else is ignored.
    pub fn hit(&self, hole: usize) -> Self {
        if self.phase != Phase::Running || self.mole != Some(hole) {
            return self.clone();
        }
        let mut next = self.clone();
        next.score += HIT_POINTS;
        next.hits += 1;
        next.mole = None;
        if let Some(id) = next.hide_timer.take() {
            next.schedule.cancel(id);
        }
        next.schedule.after(RESPAWN_AFTER_HIT, Timer::Spawn);
        next
    }

    pub fn cancel(&mut self) {
        self.schedule.cancel_all();
        self.hide_timer = None;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

pub struct WhackAMole {
    session: Session,
    cursor: usize,
    high_score: u32,
    new_record: bool,
    field: Rect,
}

impl WhackAMole {
    pub fn new() -> Self {
        Self {
            session: Session::new(),
            cursor: 4,
            high_score: 0,
            new_record: false,
            field: Rect::default(),
        }
    }

    fn start(&mut self) {
        self.new_record = false;
        self.session = self.session.start(&mut rand::thread_rng());
    }

    fn whack(&mut self, hole: usize) {
        self.cursor = hole;
        self.session = self.session.hit(hole);
    }

    fn render_holes(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for row in 0..3 {
            let mut top = vec![Span::raw("  ")];
            let mut mid = vec![Span::raw("  ")];
            for col in 0..3 {
                let i = row * 3 + col;
                let border = if i == self.cursor { Color::Rgb(255, 220, 80) } else { Color::Rgb(40, 110, 40) };
                let up = self.session.mole == Some(i);
                top.push(Span::styled(format!(" [{}] ", i + 1), Style::default().fg(border)));
                top.push(Span::raw("  "));
                let body = if up { " 🐹  " } else { " ◯   " };
                let style = if up {
                    Style::default().bg(Color::Rgb(90, 60, 30)).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::Rgb(20, 20, 20)).bg(Color::Rgb(30, 80, 30))
                };
                mid.push(Span::styled(body, style));
                mid.push(Span::raw("  "));
            }
            lines.push(Line::from(top));
            lines.push(Line::from(mid));
            lines.push(Line::from(""));
        }
        lines
    }
}

impl Game for WhackAMole {
    fn update(&mut self, dt: Duration) {
        let was_running = self.session.phase == Phase::Running;
        self.session = self.session.update(dt, &mut rand::thread_rng());
        if was_running && self.session.phase == Phase::Over {
            info!("whack-a-mole session over: {} points in {:?}", self.session.score, self.session.elapsed);
            if self.session.score > self.high_score {
                self.high_score = self.session.score;
                self.new_record = true;
            }
        }
    }

    fn handle_input(&mut self, key: KeyEvent) {
        if self.session.phase != Phase::Running {
            if matches!(key.code, KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('r') | KeyCode::Char('R')) {
                self.start();
            }
            return;
        }
        match key.code {
            KeyCode::Char(c @ '1'..='9') => self.whack(c as usize - '1' as usize),
            KeyCode::Up => self.cursor = (self.cursor + 6) % HOLES,
            KeyCode::Down => self.cursor = (self.cursor + 3) % HOLES,
            KeyCode::Left => self.cursor = self.cursor / 3 * 3 + (self.cursor % 3 + 2) % 3,
            KeyCode::Right => self.cursor = self.cursor / 3 * 3 + (self.cursor % 3 + 1) % 3,
            KeyCode::Enter | KeyCode::Char(' ') => self.whack(self.cursor),
            KeyCode::Char('r') | KeyCode::Char('R') => self.reset(),
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let inner = frame_block(frame, area, "🔨 Whack-a-Mole", Color::Rgb(230, 90, 100));
        let (status_area, field, help_area) = split_screen(inner);

        let status = Line::from(vec![
            Span::styled(
                format!(" Score: {} ", self.session.score),
                Style::default().fg(Color::Rgb(255, 100, 100)).add_modifier(Modifier::BOLD),
            ),
            Span::styled(" │ ", Style::default().fg(Color::DarkGray)),
            Span::styled(format!("⏱ Time: {}s ", self.session.time_left), Style::default().fg(Color::Rgb(80, 160, 255))),
            Span::styled(" │ ", Style::default().fg(Color::DarkGray)),
            Span::styled(format!("🏆 Best: {} ", self.high_score), Style::default().fg(Color::Yellow)),
        ]);
        frame.render_widget(Paragraph::new(status), status_area);
        self.field = field;
        frame.render_widget(Paragraph::new(self.render_holes()), field);

        let help = match self.session.phase {
            Phase::Idle => banner("▶", "Hit the moles as they pop up!", Color::Yellow, "SPACE to start, Esc for menu"),
            Phase::Over if self.new_record => banner(
                "🎉",
                &format!("New high score: {}!", self.session.score),
                Color::Yellow,
                "SPACE to play again",
            ),
            Phase::Over => banner(
                "⏰",
                &format!("Time's up! Final score: {}", self.session.score),
                Color::Red,
                "SPACE to play again",
            ),
            Phase::Running => help_line(&[("1-9/Click", "Whack"), ("↑↓←→", "Aim"), ("SPACE", "Whack aimed"), ("R", "Restart")]),
        };
        frame.render_widget(Paragraph::new(help), help_area);
    }

    fn handle_click(&mut self, column: u16, row: u16) {
        let Some((x, y)) = local_cell(self.field, column, row) else { return };
        if self.session.phase != Phase::Running {
            self.start();
        } else if let Some(hole) = hole_at(x, y) {
            self.whack(hole);
        }
    }

    fn reset(&mut self) {
        self.session.cancel();
        self.session = Session::new();
        self.new_record = false;
    }

    fn get_score(&self) -> u32 {
        self.session.score
    }

    fn is_game_over(&self) -> bool {
        self.session.phase == Phase::Over
    }

    fn set_high_score(&mut self, best: u32) {
        self.high_score = best;
    }

    fn teardown(&mut self) {
        self.session.cancel();
    }
}
