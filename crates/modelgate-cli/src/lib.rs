mod args;
mod commands;
pub mod context;
mod handlers;
pub mod server;
mod views;

pub use args::{Cli, Commands, LimitsCommand, LogLevel, OutputFormat};
pub use commands::run;
