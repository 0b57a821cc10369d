mod app;
mod cli;
mod clock;
mod config;
mod error;
mod event;
mod games;
mod geom;
mod input;
mod schedule;
mod scores;
mod ui;

use std::fs::OpenOptions;
use std::io;
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::{
    event::{
        DisableMouseCapture, EnableMouseCapture, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use env_logger::{Builder, Target};
use log::{info, warn};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::Terminal;

use app::App;
use cli::Cli;
use config::ArcadeConfig;
use error::ArcadeError;
use event::{Event, EventHandler};
use input::KeyReporting;
use scores::HighScores;

fn init_logging(config: &ArcadeConfig) -> Result<(), ArcadeError> {
    // The TUI owns stdout, so log lines go to a file.
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.log_path())?;
    Builder::new()
        .filter_level(config.level_filter())
        .parse_default_env()
        .target(Target::Pipe(Box::new(file)))
        .try_init()?;
    Ok(())
}

fn run<B: Backend>(terminal: &mut Terminal<B>, app: &mut App, tick_rate: Duration) -> Result<(), ArcadeError> {
    let events = EventHandler::new(tick_rate);
    let mut last = Instant::now();

    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        match events.next()? {
            Event::Tick => {}
            Event::Key(key) => app.on_key(key),
            Event::Release(key) => app.on_release(key),
            Event::Click { column, row } => app.on_click(column, row),
        }

        // Games see wall-clock time, however often events arrive.
        let now = Instant::now();
        app.on_tick(now - last);
        last = now;

        if app.should_quit {
            return Ok(());
        }
    }
}

fn main() -> Result<(), ArcadeError> {
    let cli = Cli::parse();
    let config = ArcadeConfig::load(&cli)?;
    init_logging(&config)?;
    for note in config.fallbacks() {
        warn!("config: {note}");
    }
    info!("starting with tick rate {} ms", config.tick_rate_ms);

    let high_scores = if config.persist_scores {
        HighScores::open(&config.scores_path)
    } else {
        HighScores::in_memory()
    };
    let mut app = App::new(high_scores);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let enhanced = supports_keyboard_enhancement().unwrap_or(false);
    if enhanced {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
        app.key_reporting = KeyReporting::Releases;
    } else {
        warn!("terminal does not report key releases; using held-key timeout");
        app.key_reporting = KeyReporting::PressOnly;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run(&mut terminal, &mut app, Duration::from_millis(config.tick_rate_ms));
    app.close();

    // Restore terminal
    if enhanced {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        log::error!("{e}");
    }
    result
}
