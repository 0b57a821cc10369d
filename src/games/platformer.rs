use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::clock::{FixedStep, SIXTIETH};
use crate::games::{banner, frame_block, grid_lines, help_line, split_screen, Game};
use crate::geom::{self, Viewport};
use crate::input::{HeldKeys, KeyReporting};

pub const WIDTH: f32 = 800.0;
pub const HEIGHT: f32 = 400.0;
pub const SPEED: f32 = 5.0;
pub const JUMP_POWER: f32 = 12.0;
pub const GRAVITY: f32 = 0.5;
pub const FRICTION: f32 = 0.8;
const PLAYER_W: f32 = 20.0;
const PLAYER_H: f32 = 30.0;

pub const PLATFORMS: [geom::Rect; 6] = [
    geom::Rect::new(0.0, 350.0, 200.0, 50.0),
    geom::Rect::new(250.0, 300.0, 100.0, 20.0),
    geom::Rect::new(400.0, 250.0, 100.0, 20.0),
    geom::Rect::new(550.0, 200.0, 100.0, 20.0),
    geom::Rect::new(700.0, 150.0, 100.0, 20.0),
    geom::Rect::new(0.0, 400.0, 800.0, 50.0),
];

pub const COINS: [geom::Rect; 4] = [
    geom::Rect::new(280.0, 270.0, 15.0, 15.0),
    geom::Rect::new(430.0, 220.0, 15.0, 15.0),
    geom::Rect::new(580.0, 170.0, 15.0, 15.0),
    geom::Rect::new(730.0, 120.0, 15.0, 15.0),
];

pub const FLAG: geom::Rect = geom::Rect::new(750.0, 100.0, 20.0, 50.0);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    Left,
    Right,
    Jump,
}

/// Which controls are held during a step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Controls {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub body: geom::Rect,
    pub vx: f32,
    pub vy: f32,
    pub on_ground: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct State {
    pub player: Player,
    pub collected: [bool; COINS.len()],
    pub score: u32,
    pub started: bool,
    pub won: bool,
    pub over: bool,
}

impl State {
    pub fn new() -> Self {
        Self {
            player: Player {
                body: geom::Rect::new(50.0, 300.0, PLAYER_W, PLAYER_H),
                vx: 0.0,
                vy: 0.0,
                on_ground: false,
            },
            collected: [false; COINS.len()],
            score: 0,
            started: false,
            won: false,
            over: false,
        }
    }

    pub fn finished(&self) -> bool {
        self.won || self.over
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

/// Pushes the player out of every platform it overlaps. Vertical resolution
/// wins over horizontal.
fn resolve_platforms(p: &mut Player) {
    p.on_ground = false;
    for platform in &PLATFORMS {
        if !p.body.overlaps(platform) {
            continue;
        }
        if p.vy > 0.0 && p.body.y < platform.y {
            p.body.y = platform.y - p.body.h;
            p.vy = 0.0;
            p.on_ground = true;
        } else if p.vy < 0.0 && p.body.y > platform.y {
            p.body.y = platform.bottom();
            p.vy = 0.0;
        } else if p.vx > 0.0 {
            p.body.x = platform.x - p.body.w;
        } else if p.vx < 0.0 {
            p.body.x = platform.right();
        }
    }
}

/// One 1/60 s physics step.
pub fn step(state: &State, controls: Controls) -> State {
    if !state.started || state.finished() {
        return state.clone();
    }
    let mut next = state.clone();
    let p = &mut next.player;

    if controls.left {
        p.vx = -SPEED;
    } else if controls.right {
        p.vx = SPEED;
    } else {
        p.vx *= FRICTION;
    }
    if controls.jump && p.on_ground {
        p.vy = -JUMP_POWER;
        p.on_ground = false;
    }
    p.vy += GRAVITY;
    p.body.x += p.vx;
    p.body.y += p.vy;

    resolve_platforms(p);

    for (coin, taken) in COINS.iter().zip(next.collected.iter_mut()) {
        if !*taken && next.player.body.overlaps(coin) {
            *taken = true;
            next.score += 1;
        }
    }
    if next.player.body.overlaps(&FLAG) {
        next.won = true;
    }
    if next.player.body.y > HEIGHT {
        next.over = true;
    }
    let body = &mut next.player.body;
    body.x = body.x.clamp(0.0, WIDTH - body.w);
    next
}

pub struct MiniPlatformer {
    state: State,
    keys: HeldKeys<Control>,
    reporting: KeyReporting,
    clock: FixedStep,
    high_score: u32,
}

impl MiniPlatformer {
    pub fn new() -> Self {
        Self {
            state: State::new(),
            keys: HeldKeys::default(),
            reporting: KeyReporting::default(),
            clock: FixedStep::new(SIXTIETH),
            high_score: 0,
        }
    }

    fn control_for(code: KeyCode) -> Option<Control> {
        match code {
            KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Some(Control::Left),
            KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Some(Control::Right),
            KeyCode::Up | KeyCode::Char(' ') | KeyCode::Char('w') | KeyCode::Char('W') => Some(Control::Jump),
            _ => None,
        }
    }

    fn controls(&self) -> Controls {
        Controls {
            left: self.keys.is_held(Control::Left),
            right: self.keys.is_held(Control::Right),
            jump: self.keys.is_held(Control::Jump),
        }
    }

    fn render_field(&self, width: usize, height: usize) -> Vec<Line<'static>> {
        let cols = width.max(1);
        let rows = height.max(1);
        let vp = Viewport { world_w: WIDTH, world_h: HEIGHT, cols, rows };
        let mut grid = Vec::with_capacity(rows);
        for y in 0..rows {
            // Sky fades from blue to green towards the ground.
            let t = y as f32 / rows as f32;
            let bg = Color::Rgb(
                (135.0 + (152.0 - 135.0) * t) as u8,
                (206.0 + (251.0 - 206.0) * t) as u8,
                (235.0 + (152.0 - 235.0) * t) as u8,
            );
            grid.push(vec![(' ', Style::default().bg(bg)); cols]);
        }

        let mut paint = |r: &geom::Rect, ch: char, style: Style| {
            let (xs, ys) = vp.cells(r);
            for y in ys {
                for x in xs.clone() {
                    grid[y][x] = (ch, style);
                }
            }
        };

        let dirt = Style::default().fg(Color::Rgb(160, 82, 45)).bg(Color::Rgb(139, 69, 19));
        for platform in &PLATFORMS {
            paint(platform, '▓', dirt);
        }
        for (coin, taken) in COINS.iter().zip(self.state.collected.iter()) {
            if !taken {
                paint(coin, '●', Style::default().fg(Color::Rgb(255, 215, 0)).add_modifier(Modifier::BOLD));
            }
        }
        paint(&FLAG, '⚑', Style::default().fg(Color::Rgb(255, 0, 0)).bg(Color::Rgb(255, 255, 255)));
        paint(&self.state.player.body, '█', Style::default().fg(Color::Rgb(76, 175, 80)));
        grid_lines(grid)
    }
}

impl Game for MiniPlatformer {
    fn update(&mut self, dt: Duration) {
        self.keys.advance(dt);
        if !self.state.started || self.state.finished() {
            return;
        }
        let steps = self.clock.advance(dt);
        let controls = self.controls();
        for _ in 0..steps {
            self.state = step(&self.state, controls);
        }
        if self.state.finished() {
            self.keys.clear();
            self.high_score = self.high_score.max(self.state.score);
        }
    }

    fn handle_input(&mut self, key: KeyEvent) {
        if self.state.finished() {
            if matches!(key.code, KeyCode::Char('r') | KeyCode::Char('R')) {
                self.reset();
            }
            return;
        }
        self.state.started = true;
        if let Some(control) = Self::control_for(key.code) {
            self.keys.press(control);
        }
    }

    fn handle_release(&mut self, key: KeyEvent) {
        if let Some(control) = Self::control_for(key.code) {
            self.keys.release(control);
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let inner = frame_block(frame, area, "🏃 Mini Platformer", Color::Rgb(76, 175, 80));
        let (status_area, field, help_area) = split_screen(inner);

        let status = Line::from(vec![
            Span::styled(
                format!(" Coins: {}/{} ", self.state.score, COINS.len()),
                Style::default().fg(Color::Rgb(255, 215, 0)).add_modifier(Modifier::BOLD),
            ),
            Span::styled(" │ ", Style::default().fg(Color::DarkGray)),
            Span::styled(format!("🏆 Best: {} ", self.high_score), Style::default().fg(Color::Cyan)),
        ]);
        frame.render_widget(Paragraph::new(status), status_area);
        frame.render_widget(
            Paragraph::new(self.render_field(field.width as usize, field.height as usize)),
            field,
        );

        let help = if self.state.won {
            banner(
                "🏁",
                &format!("Level Complete! Coins: {}/{}", self.state.score, COINS.len()),
                Color::Green,
                "R to play again, Esc for menu",
            )
        } else if self.state.over {
            banner("💀", "Game Over!", Color::Red, "R to restart, Esc for menu")
        } else if !self.state.started {
            banner("▶", "Press any key to start", Color::Yellow, "Collect coins and reach the flag!")
        } else {
            help_line(&[("←→/AD", "Move"), ("↑/Space/W", "Jump"), ("Esc", "Menu")])
        };
        frame.render_widget(Paragraph::new(help), help_area);
    }

    fn reset(&mut self) {
        let (hs, reporting) = (self.high_score, self.reporting);
        *self = MiniPlatformer::new();
        self.high_score = hs;
        self.set_key_reporting(reporting);
    }

    fn get_score(&self) -> u32 {
        self.state.score
    }

    fn is_game_over(&self) -> bool {
        self.state.finished()
    }

    fn set_high_score(&mut self, best: u32) {
        self.high_score = best;
    }

    fn set_key_reporting(&mut self, reporting: KeyReporting) {
        self.reporting = reporting;
        self.keys = HeldKeys::new(reporting);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn started() -> State {
        State { started: true, ..State::new() }
    }

    fn run(mut s: State, controls: Controls, steps: usize) -> State {
        for _ in 0..steps {
            s = step(&s, controls);
        }
        s
    }

    #[test]
    fn player_settles_on_first_platform() {
        let s = run(started(), Controls::default(), 60);
        assert!(s.player.on_ground);
        assert_eq!(s.player.body.bottom(), 350.0);
        assert_eq!(s.player.vy, 0.0);
    }

    #[test]
    fn jump_only_from_ground() {
        let s = run(started(), Controls::default(), 60);
        let jump = Controls { jump: true, ..Controls::default() };
        let s = step(&s, jump);
        assert_eq!(s.player.vy, -JUMP_POWER + GRAVITY);
        // Mid-air jump presses are ignored.
        let s2 = step(&s, jump);
        assert_eq!(s2.player.vy, s.player.vy + GRAVITY);
    }

    #[test]
    fn friction_decays_horizontal_speed() {
        let right = Controls { right: true, ..Controls::default() };
        let s = run(started(), right, 2);
        assert_eq!(s.player.vx, SPEED);
        let s = step(&s, Controls::default());
        assert_eq!(s.player.vx, SPEED * FRICTION);
    }

    #[test]
    fn walking_left_is_clamped_at_edge() {
        let left = Controls { left: true, ..Controls::default() };
        let s = run(started(), left, 60);
        assert_eq!(s.player.body.x, 0.0);
    }

    #[test]
    fn coin_counts_once() {
        let mut s = started();
        s.player.body.x = 275.0;
        s.player.body.y = 265.0;
        let s = step(&s, Controls::default());
        assert_eq!(s.score, 1);
        assert!(s.collected[0]);
        let s = step(&s, Controls::default());
        assert_eq!(s.score, 1);
    }

    #[test]
    fn touching_flag_wins_and_freezes() {
        let mut s = started();
        s.player.body.x = 745.0;
        s.player.body.y = 110.0;
        let s = step(&s, Controls::default());
        assert!(s.won);
        assert_eq!(step(&s, Controls { right: true, ..Controls::default() }), s);
    }

    #[test]
    fn falling_below_world_ends_game() {
        let mut s = started();
        s.player.body.y = HEIGHT + 10.0;
        s.player.body.x = 300.0;
        assert!(step(&s, Controls::default()).over);
    }

    #[test]
    fn any_key_starts_and_release_stops_walking() {
        let mut g = MiniPlatformer::new();
        g.handle_input(KeyEvent::from(KeyCode::Right));
        assert!(g.state.started);
        g.update(SIXTIETH);
        assert_eq!(g.state.player.vx, SPEED);
        g.handle_release(KeyEvent::from(KeyCode::Right));
        g.update(SIXTIETH);
        assert_eq!(g.state.player.vx, SPEED * FRICTION);
    }

    #[test]
    fn held_run_survives_repeat_delay_without_releases() {
        let mut g = MiniPlatformer::new();
        g.set_key_reporting(KeyReporting::PressOnly);
        g.handle_input(KeyEvent::from(KeyCode::Right));
        // No repeat yet: a 660 ms desktop repeat delay at 60 Hz.
        for _ in 0..40 {
            g.update(SIXTIETH);
        }
        assert_eq!(g.state.player.vx, SPEED);
    }

    #[test]
    fn reported_release_mode_survives_restart() {
        let mut g = MiniPlatformer::new();
        g.set_key_reporting(KeyReporting::Releases);
        g.state.won = true;
        g.handle_input(KeyEvent::from(KeyCode::Char('r')));
        assert_eq!(g.reporting, KeyReporting::Releases);
        g.handle_input(KeyEvent::from(KeyCode::Right));
        g.keys.advance(Duration::from_secs(2));
        assert!(g.keys.is_held(Control::Right));
        g.handle_release(KeyEvent::from(KeyCode::Right));
        assert!(!g.keys.is_held(Control::Right));
    }

    #[test]
    fn restart_only_after_finish() {
        let mut g = MiniPlatformer::new();
        g.handle_input(KeyEvent::from(KeyCode::Char('x')));
        g.state.score = 2;
        g.handle_input(KeyEvent::from(KeyCode::Char('r')));
        assert_eq!(g.state.score, 2);
        g.state.won = true;
        g.handle_input(KeyEvent::from(KeyCode::Char('r')));
        assert_eq!(g.state.score, 0);
        assert!(!g.state.started);
    }

    proptest! {
        #[test]
        fn prop_player_stays_in_bounds(moves in prop::collection::vec((any::<bool>(), any::<bool>(), any::<bool>()), 1..600)) {
            let mut s = started();
            for (left, right, jump) in moves {
                s = step(&s, Controls { left, right, jump });
                prop_assert!(s.player.body.x >= 0.0);
                prop_assert!(s.player.body.right() <= WIDTH);
                prop_assert!(s.score as usize <= COINS.len());
            }
        }
    }
}
