// Commands are namespaced where an area has more than one action
// (`limits show`, `limits set`); single-purpose commands stay flat.

mod commands;
mod enums;

pub use commands::*;
pub use enums::*;

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "modelgate")]
#[command(
    about = "Serve quota-guarded summarize, translate and classify operations from local models",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// Data directory (default: $MODELGATE_PATH, then the platform data dir)
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    /// Config file (default: <data-dir>/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, default_value = "plain", global = true)]
    pub format: OutputFormat,

    #[arg(long, default_value = "info", global = true)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
