use modelgate_ledger::QuotaRecord;
use modelgate_types::UsageResponse;
use owo_colors::Style;

use super::{header, limit_label, paint};

pub fn format_usage(response: &UsageResponse) -> String {
    let mut out = header(format!(
        "{:<11} {:<10} {:>8} {:>10} {:>10} {:>8}",
        "OPERATION", "DATE", "REQUESTS", "LIMIT", "REMAINING", "TOKENS"
    ));
    out.push('\n');

    for usage in &response.usage {
        let remaining = match usage.remaining {
            Some(0) => paint(format!("{:>10}", 0), Style::new().red()),
            Some(n) => format!("{:>10}", n),
            None => format!("{:>10}", "-"),
        };
        out.push_str(&format!(
            "{:<11} {:<10} {:>8} {:>10} {} {:>8}\n",
            usage.operation.as_str(),
            usage.date,
            usage.request_count,
            limit_label(usage.daily_limit),
            remaining,
            usage.total_tokens
        ));
    }
    out
}

pub fn format_history(records: &[QuotaRecord]) -> String {
    if records.is_empty() {
        return "No usage recorded yet.\n".to_string();
    }

    let mut out = header(format!(
        "{:<10} {:<11} {:>8} {:>8}",
        "DATE", "OPERATION", "REQUESTS", "TOKENS"
    ));
    out.push('\n');

    for record in records {
        out.push_str(&format!(
            "{:<10} {:<11} {:>8} {:>8}\n",
            record.day.format("%Y-%m-%d"),
            record.operation,
            record.request_count,
            record.total_tokens
        ));
    }
    out
}
