use modelgate_types::{LimitsResponse, Operation};
use owo_colors::Style;

use super::{header, limit_label, paint};

pub fn format_limits(response: &LimitsResponse) -> String {
    let mut out = header(format!(
        "{:<11} {:>11} {:>10} {:>10}",
        "OPERATION", "DAILY LIMIT", "MAX CHARS", "MAX TOKENS"
    ));
    out.push('\n');

    for limit in &response.limits {
        out.push_str(&format!(
            "{:<11} {:>11} {:>10} {:>10}\n",
            limit.operation.as_str(),
            limit_label(limit.daily_limit),
            limit.max_input_chars,
            limit.max_output_tokens
        ));
    }
    out
}

pub fn print_limit_updated(operation: Operation, limit: u64) {
    println!(
        "{} {} daily limit set to {}",
        paint("✓", Style::new().green()),
        operation,
        limit_label(limit)
    );
}
