use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::Operation;

/// Metadata attached to every operation response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationMeta {
    pub operation: Operation,
    /// Model identifier that served the request.
    pub model_used: String,
    pub input_chars: usize,
    pub output_tokens: u64,
    pub execution_time_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarizeResponse {
    pub summary: String,
    pub sentence_count: usize,
    pub meta: OperationMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslateResponse {
    pub translated_text: String,
    pub source_language: String,
    pub target_language: String,
    pub meta: OperationMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifyResponse {
    pub label: String,
    pub confidence: f64,
    /// Score per caller-supplied category; sums to 1.0.
    pub scores: BTreeMap<String, f64>,
    pub meta: OperationMeta,
}

/// Daily limit plus the static hard caps of one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationLimit {
    pub operation: Operation,
    /// 0 means unlimited.
    pub daily_limit: u64,
    pub max_input_chars: usize,
    pub max_output_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitsResponse {
    pub limits: Vec<OperationLimit>,
}

/// Today's counters for one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationUsage {
    pub operation: Operation,
    /// Calendar day in `YYYY-MM-DD` form.
    pub date: String,
    pub request_count: u64,
    pub total_tokens: u64,
    pub daily_limit: u64,
    /// `None` when the operation is unlimited.
    pub remaining: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageResponse {
    pub usage: Vec<OperationUsage>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelStatus {
    pub operation: Operation,
    pub model: String,
    pub loaded: bool,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loaded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub uptime_seconds: f64,
    pub memory_used_mb: f64,
    pub memory_total_mb: f64,
    pub cpu_percent: f32,
    pub models: Vec<ModelStatus>,
    pub timestamp: DateTime<Utc>,
}

/// Static settings of one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationSettings {
    pub operation: Operation,
    pub model: String,
    pub max_input_chars: usize,
    pub max_output_tokens: u32,
}

/// Non-sensitive view of the running configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsResponse {
    pub app_name: String,
    pub version: String,
    pub default_daily_limit: u64,
    pub max_daily_limit: u64,
    pub temperature: f32,
    pub top_p: f32,
    pub operations: Vec<OperationSettings>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable machine-readable error kind, e.g. `quota_exceeded`.
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            detail: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = Some(detail);
        self
    }
}
