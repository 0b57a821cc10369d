use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent};
use rand::Rng;
use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::clock::{FixedStep, SIXTIETH};
use crate::games::{banner, frame_block, grid_lines, help_line, local_cell, split_screen, Game};
use crate::geom::{self, Viewport};

pub const WIDTH: f32 = 320.0;
pub const HEIGHT: f32 = 480.0;
pub const BIRD_X: f32 = 50.0;
pub const BIRD_SIZE: f32 = 20.0;
pub const GRAVITY: f32 = 0.5;
pub const FLAP: f32 = -8.0;
pub const PIPE_WIDTH: f32 = 50.0;
pub const PIPE_GAP: f32 = 150.0;
pub const PIPE_SPEED: f32 = 2.0;
/// A new pipe is spawned once the last one has scrolled left of this x.
pub const PIPE_SPACING: f32 = WIDTH - 200.0;
const PIPE_MARGIN: f32 = 50.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pipe {
    pub x: f32,
    /// Height of the top pipe; the opening spans `top..top + PIPE_GAP`.
    pub top: f32,
    pub passed: bool,
}

impl Pipe {
    pub fn spawn(rng: &mut impl Rng) -> Self {
        let top = rng.gen::<f32>() * (HEIGHT - PIPE_GAP - 2.0 * PIPE_MARGIN) + PIPE_MARGIN;
        Self { x: WIDTH, top, passed: false }
    }

    pub fn upper(&self) -> geom::Rect {
        geom::Rect::new(self.x, 0.0, PIPE_WIDTH, self.top)
    }

    pub fn lower(&self) -> geom::Rect {
        let y = self.top + PIPE_GAP;
        geom::Rect::new(self.x, y, PIPE_WIDTH, HEIGHT - y)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct State {
    pub bird_y: f32,
    pub velocity: f32,
    pub pipes: Vec<Pipe>,
    pub score: u32,
    pub started: bool,
    pub over: bool,
}

impl State {
    pub fn new() -> Self {
        Self {
            bird_y: 300.0,
            velocity: 0.0,
            pipes: Vec::new(),
            score: 0,
            started: false,
            over: false,
        }
    }

    pub fn bird(&self) -> geom::Rect {
        geom::Rect::new(BIRD_X, self.bird_y, BIRD_SIZE, BIRD_SIZE)
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

/// Starts the run on the first flap, then kicks the bird upwards.
pub fn flap(state: &State) -> State {
    let mut next = state.clone();
    if state.over {
        return next;
    }
    next.started = true;
    next.velocity = FLAP;
    next
}

/// One 1/60 s physics step.
pub fn step(state: &State, rng: &mut impl Rng) -> State {
    if !state.started || state.over {
        return state.clone();
    }
    let mut next = state.clone();
    next.velocity += GRAVITY;
    next.bird_y += next.velocity;

    match next.pipes.last() {
        Some(last) if last.x >= PIPE_SPACING => {}
        _ => next.pipes.push(Pipe::spawn(rng)),
    }

    let bird = next.bird();
    for pipe in next.pipes.iter_mut() {
        pipe.x -= PIPE_SPEED;
        if bird.overlaps(&pipe.upper()) || bird.overlaps(&pipe.lower()) {
            next.over = true;
        }
        if !pipe.passed && pipe.x + PIPE_WIDTH < BIRD_X {
            pipe.passed = true;
            next.score += 1;
        }
    }
    next.pipes.retain(|p| p.x + PIPE_WIDTH >= 0.0);

    if bird.y < 0.0 || bird.bottom() > HEIGHT {
        next.over = true;
    }
    next
}

pub struct FlappyBird {
    state: State,
    clock: FixedStep,
    high_score: u32,
    field: Rect,
}

impl FlappyBird {
    pub fn new() -> Self {
        Self {
            state: State::new(),
            clock: FixedStep::new(SIXTIETH),
            high_score: 0,
            field: Rect::default(),
        }
    }

    fn render_field(&self, width: usize, height: usize) -> Vec<Line<'static>> {
        // Portrait playfield: roughly 4 columns per 3 rows.
        let rows = height.max(1);
        let cols = (rows * 4 / 3).clamp(1, width.max(1));
        let vp = Viewport { world_w: WIDTH, world_h: HEIGHT, cols, rows };

        let sky = Style::default().bg(Color::Rgb(78, 192, 202));
        let mut grid = vec![vec![(' ', sky); cols]; rows];

        let pipe_style = Style::default().fg(Color::Rgb(60, 160, 40)).bg(Color::Rgb(40, 120, 30));
        for pipe in &self.state.pipes {
            for r in [pipe.upper(), pipe.lower()] {
                let (xs, ys) = vp.cells(&r);
                for y in ys {
                    for x in xs.clone() {
                        grid[y][x] = ('▒', pipe_style);
                    }
                }
            }
        }

        let bird_color = if self.state.over { Color::Rgb(200, 60, 60) } else { Color::Rgb(255, 215, 0) };
        let (xs, ys) = vp.cells(&self.state.bird());
        for y in ys {
            for x in xs.clone() {
                grid[y][x] = ('█', Style::default().fg(bird_color).bg(Color::Rgb(78, 192, 202)));
            }
        }

        let mut lines = grid_lines(grid);
        let pad = (width.saturating_sub(cols)) / 2;
        if pad > 0 {
            for line in lines.iter_mut() {
                line.spans.insert(0, Span::raw(" ".repeat(pad)));
            }
        }
        lines
    }
}

impl Game for FlappyBird {
    fn update(&mut self, dt: Duration) {
        if !self.state.started || self.state.over {
            return;
        }
        let steps = self.clock.advance(dt);
        let mut rng = rand::thread_rng();
        for _ in 0..steps {
            self.state = step(&self.state, &mut rng);
            if self.state.over {
                break;
            }
        }
        if self.state.over && self.state.score > self.high_score {
            self.high_score = self.state.score;
        }
    }

    fn handle_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(' ') | KeyCode::Up | KeyCode::Enter => self.state = flap(&self.state),
            KeyCode::Char('r') | KeyCode::Char('R') => {
                if self.state.over {
                    self.reset();
                }
            }
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let inner = frame_block(frame, area, "🐦 Flappy Bird", Color::Rgb(255, 215, 0));
        let (status_area, field, help_area) = split_screen(inner);

        let status = Line::from(vec![
            Span::styled(
                format!(" Score: {} ", self.state.score),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::styled(" │ ", Style::default().fg(Color::DarkGray)),
            Span::styled(format!("🏆 High: {} ", self.high_score), Style::default().fg(Color::Cyan)),
        ]);
        frame.render_widget(Paragraph::new(status), status_area);
        self.field = field;
        frame.render_widget(
            Paragraph::new(self.render_field(field.width as usize, field.height as usize)),
            field,
        );

        let help = if self.state.over {
            banner("💥", &format!("GAME OVER! Score: {}", self.state.score), Color::Red, "R to restart, Esc for menu")
        } else if !self.state.started {
            banner("▶", "Press Space to start!", Color::Yellow, "Space / ↑ / Enter flaps")
        } else {
            help_line(&[("Space/↑/Click", "Flap"), ("Esc", "Menu")])
        };
        frame.render_widget(Paragraph::new(help), help_area);
    }

    fn handle_click(&mut self, column: u16, row: u16) {
        if local_cell(self.field, column, row).is_some() {
            self.state = flap(&self.state);
        }
    }

    fn reset(&mut self) {
        let (hs, field) = (self.high_score, self.field);
        *self = FlappyBird::new();
        self.high_score = hs;
        self.field = field;
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
