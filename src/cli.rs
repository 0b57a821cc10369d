use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Default)]
#[command(name = "rustcade-folio", version, about = "Eight mini-games in your terminal")]
pub struct Cli {
    /// Path to a TOML config file (defaults to rustcade.toml next to the binary)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Where high scores are kept
    #[arg(short, long)]
    pub scores: Option<PathBuf>,

    /// Host tick interval in milliseconds
    #[arg(short, long)]
    pub tick_rate: Option<u64>,

    /// Keep high scores in memory only
    #[arg(long)]
    pub no_persist: bool,
}
