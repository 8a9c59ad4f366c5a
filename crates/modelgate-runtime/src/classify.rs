use serde_json::Value;
use std::collections::BTreeMap;

pub const FALLBACK_CONFIDENCE: f64 = 0.5;

/// Outcome of interpreting a classifier's raw output.
#[derive(Debug, Clone, PartialEq)]
pub enum LabelOutcome {
    /// The output named one of the caller's categories.
    Parsed { label: String, confidence: f64 },
    /// The output was unusable; the first category stands in.
    Fallback { label: String, reason: String },
}

impl LabelOutcome {
    pub fn label(&self) -> &str {
        match self {
            LabelOutcome::Parsed { label, .. } | LabelOutcome::Fallback { label, .. } => label,
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            LabelOutcome::Parsed { confidence, .. } => *confidence,
            LabelOutcome::Fallback { .. } => FALLBACK_CONFIDENCE,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, LabelOutcome::Fallback { .. })
    }
}

/// Interpret `raw` as `{"label": ..., "confidence": ...}` against `categories`.
///
/// `categories` must be non-empty. The returned label is always spelled as
/// in `categories`.
pub fn parse_label(raw: &str, categories: &[String]) -> LabelOutcome {
    let fallback = |reason: String| LabelOutcome::Fallback {
        label: categories.first().cloned().unwrap_or_default(),
        reason,
    };

    let payload = strip_code_fence(raw);
    let value: Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(err) => return fallback(format!("not valid JSON: {}", err)),
    };

    let Some(label) = value.get("label").and_then(Value::as_str) else {
        return fallback("missing string field 'label'".to_string());
    };

    let confidence = match value.get("confidence") {
        None | Some(Value::Null) => FALLBACK_CONFIDENCE,
        Some(v) => match v.as_f64().or_else(|| v.as_str().and_then(|s| s.trim().parse().ok())) {
            Some(c) if c.is_finite() => c.clamp(0.0, 1.0),
            _ => return fallback(format!("confidence is not a number: {}", v)),
        },
    };

    let wanted = label.trim().to_lowercase();
    match categories.iter().find(|c| c.to_lowercase() == wanted) {
        Some(canonical) => LabelOutcome::Parsed {
            label: canonical.clone(),
            confidence,
        },
        None => fallback(format!("label '{}' is not one of the categories", label)),
    }
}

/// Winner gets `confidence`; the others share the remainder uniformly.
pub fn score_distribution(
    categories: &[String],
    label: &str,
    confidence: f64,
) -> BTreeMap<String, f64> {
    let others = categories.len().saturating_sub(1);
    let remainder = if others == 0 {
        0.0
    } else {
        (1.0 - confidence) / others as f64
    };

    categories
        .iter()
        .map(|c| {
            let score = if c == label { confidence } else { remainder };
            (c.clone(), score)
        })
        .collect()
}

fn strip_code_fence(raw: &str) -> &str {
    let mut s = raw.trim();
    if let Some(rest) = s.strip_prefix("```") {
        // Drop an info string such as `json` up to the first newline.
        s = match rest.find('\n') {
            Some(idx) => &rest[idx + 1..],
            None => rest.trim_start_matches("json"),
        };
        s = s.trim_end();
        s = s.strip_suffix("```").unwrap_or(s);
    }
    s.trim()
}
