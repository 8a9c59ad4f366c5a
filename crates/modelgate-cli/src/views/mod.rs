mod init;
mod limits;
mod models;
mod usage;

pub use init::print_init;
pub use limits::{format_limits, print_limit_updated};
pub use models::format_models;
pub use usage::{format_history, format_usage};

use anyhow::Result;
use is_terminal::IsTerminal;
use once_cell::sync::Lazy;
use owo_colors::{OwoColorize, Style};
use serde::Serialize;
use std::fmt::Display;

static COLOR: Lazy<bool> =
    Lazy::new(|| std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none());

/// Apply `style` only when stdout is a color-capable terminal.
pub(crate) fn paint(text: impl Display, style: Style) -> String {
    if *COLOR {
        text.style(style).to_string()
    } else {
        text.to_string()
    }
}

pub(crate) fn header(text: impl Display) -> String {
    paint(text, Style::new().bold())
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn limit_label(limit: u64) -> String {
    if limit == 0 {
        "unlimited".to_string()
    } else {
        limit.to_string()
    }
}
