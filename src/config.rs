use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::LevelFilter;
use serde::Deserialize;

use crate::cli::Cli;
use crate::error::ArcadeError;

const CONFIG_FILE: &str = "rustcade.toml";
const SCORES_FILE: &str = "rustcade.scores.json";
const LOG_FILE: &str = "rustcade.log";

/// Top-level arcade configuration, loaded from `rustcade.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArcadeConfig {
    /// Host tick interval; games receive the measured elapsed time, not this value.
    pub tick_rate_ms: u64,
    pub scores_path: PathBuf,
    /// Defaults to `rustcade.log` beside the score file.
    pub log_path: Option<PathBuf>,
    pub log_level: String,
    pub persist_scores: bool,
    /// Settings replaced while loading, reported once logging is up.
    #[serde(skip)]
    notes: Vec<String>,
}

impl Default for ArcadeConfig {
    fn default() -> Self {
        let dir = exe_dir();
        Self {
            tick_rate_ms: 16, // ~60 FPS
            scores_path: dir.join(SCORES_FILE),
            log_path: None,
            log_level: "info".to_string(),
            persist_scores: true,
            notes: Vec::new(),
        }
    }
}

impl ArcadeConfig {
    /// Reads the config file (if any) and applies command-line overrides.
    /// A missing file is not an error; a malformed one is.
    pub fn load(cli: &Cli) -> Result<Self, ArcadeError> {
        let path = cli
            .config
            .clone()
            .unwrap_or_else(|| exe_dir().join(CONFIG_FILE));
        let mut config = match fs::read_to_string(&path) {
            Ok(text) => Self::from_toml(&text, &path)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound && cli.config.is_none() => Self::default(),
            Err(e) => return Err(e.into()),
        };
        config.apply_cli(cli);
        Ok(config)
    }

    fn from_toml(text: &str, path: &Path) -> Result<Self, ArcadeError> {
        toml::from_str(text).map_err(|source| ArcadeError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(scores) = &cli.scores {
            self.scores_path = scores.clone();
        }
        if let Some(ms) = cli.tick_rate {
            self.tick_rate_ms = ms;
        }
        if cli.no_persist {
            self.persist_scores = false;
        }
        // A zero tick rate would spin the input thread.
        if self.tick_rate_ms == 0 {
            self.notes.push("tick_rate_ms 0 raised to 1".to_string());
            self.tick_rate_ms = 1;
        }
    }

    pub fn log_path(&self) -> PathBuf {
        match &self.log_path {
            Some(path) => path.clone(),
            None => self
                .scores_path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(LOG_FILE),
        }
    }

    pub fn level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }

    /// Settings that fell back to a default.
    pub fn fallbacks(&self) -> Vec<String> {
        let mut notes = self.notes.clone();
        if self.log_level.parse::<LevelFilter>().is_err() {
            notes.push(format!("unknown log_level {:?}, using info", self.log_level));
        }
        notes
    }
}

fn exe_dir() -> PathBuf {
    // Store next to the executable
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            return dir.to_path_buf();
        }
    }
    PathBuf::from(".")
}
