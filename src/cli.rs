// cli.rs - Command-line interface configuration
use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "chess-clock")]
#[command(about = "Terminal chess clock", long_about = None)]
pub struct Cli {
    /// White's time control, minutes+increment (e.g. 10+5)
    #[arg(short, long)]
    pub white: Option<String>,

    /// Black's time control; defaults to White's
    #[arg(short, long)]
    pub black: Option<String>,

    /// Override White's increment in seconds
    #[arg(long)]
    pub white_increment: Option<String>,

    /// Override Black's increment in seconds
    #[arg(long)]
    pub black_increment: Option<String>,

    /// none, bronstein or fischer
    #[arg(short, long)]
    pub delay_type: Option<String>,

    /// Bronstein delay in seconds
    #[arg(long = "delay")]
    pub delay_seconds: Option<String>,

    /// Tick period in milliseconds
    #[arg(long)]
    pub tick_ms: Option<u64>,

    /// Directory clock.pgn is written to
    #[arg(long)]
    pub export_dir: Option<PathBuf>,

    /// JSON file with default settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
