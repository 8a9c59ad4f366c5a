use crate::{Error, Result};
use modelgate_types::Operation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Resolve the data directory path based on priority:
/// 1. Explicit path (with tilde expansion)
/// 2. MODELGATE_PATH environment variable (with tilde expansion)
/// 3. XDG data directory (recommended default)
/// 4. ~/.modelgate (fallback for systems without XDG)
pub fn resolve_data_dir(explicit_path: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit_path {
        return Ok(expand_tilde(path));
    }

    if let Ok(env_path) = std::env::var("MODELGATE_PATH") {
        return Ok(expand_tilde(&env_path));
    }

    if let Some(data_dir) = dirs::data_dir() {
        return Ok(data_dir.join("modelgate"));
    }

    if let Some(home) = std::env::var_os("HOME") {
        return Ok(PathBuf::from(home).join(".modelgate"));
    }

    Err(Error::Config(
        "Could not determine data directory: no HOME directory or XDG data directory found"
            .to_string(),
    ))
}

/// Expand tilde (~) in paths to the user's home directory
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME")
    {
        return PathBuf::from(home).join(stripped);
    }
    PathBuf::from(path)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub api_key_header: String,
    pub api_keys: Vec<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            api_key_header: "X-API-Key".to_string(),
            api_keys: vec!["local-dev-key-001".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding one sub-directory per model identifier.
    pub models_dir: PathBuf,
    /// SQLite quota ledger file.
    pub ledger: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from("models"),
            ledger: PathBuf::from("ledger.db"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub timeout_secs: u64,
    pub provision_timeout_secs: u64,
    /// Generations allowed to run at once.
    pub max_concurrent: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            top_p: 0.9,
            timeout_secs: 120,
            provision_timeout_secs: 600,
            max_concurrent: 2,
        }
    }
}

impl InferenceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn provision_timeout(&self) -> Duration {
        Duration::from_secs(self.provision_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    /// Seeded into the ledger for operations without a stored limit.
    pub default_daily_limit: u64,
    /// Upper bound accepted by the management interface.
    pub max_daily_limit: u64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            default_daily_limit: 1000,
            max_daily_limit: 100_000,
        }
    }
}

/// Static, operator-defined settings for one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationSpec {
    /// Model identifier (directory name under `models_dir`).
    pub model: String,
    pub max_input_chars: usize,
    pub max_output_tokens: u32,
}

impl OperationSpec {
    pub fn new(model: impl Into<String>, max_input_chars: usize, max_output_tokens: u32) -> Self {
        Self {
            model: model.into(),
            max_input_chars,
            max_output_tokens,
        }
    }
}

fn default_operations() -> BTreeMap<Operation, OperationSpec> {
    BTreeMap::from([
        (
            Operation::Summarize,
            OperationSpec::new("qwen-summarize", 8000, 512),
        ),
        (
            Operation::Translate,
            OperationSpec::new("qwen-translate", 4000, 512),
        ),
        (
            Operation::Classify,
            OperationSpec::new("qwen-classify", 2000, 64),
        ),
    ])
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub inference: InferenceConfig,
    #[serde(default)]
    pub quota: QuotaConfig,
    #[serde(default = "default_operations")]
    pub operations: BTreeMap<Operation, OperationSpec>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            security: SecurityConfig::default(),
            paths: PathsConfig::default(),
            inference: InferenceConfig::default(),
            quota: QuotaConfig::default(),
            operations: default_operations(),
        }
    }
}

impl Config {
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn default_path(data_dir: &Path) -> PathBuf {
        data_dir.join("config.toml")
    }

    pub fn validate(&self) -> Result<()> {
        if self.security.api_keys.iter().all(|k| k.trim().is_empty()) {
            return Err(Error::Config(
                "security.api_keys must contain at least one key".to_string(),
            ));
        }
        if self.security.api_key_header.trim().is_empty() {
            return Err(Error::Config("security.api_key_header is empty".to_string()));
        }
        if self.inference.max_concurrent == 0 {
            return Err(Error::Config(
                "inference.max_concurrent must be at least 1".to_string(),
            ));
        }
        if self.inference.temperature < 0.0 {
            return Err(Error::Config(format!(
                "inference.temperature must be >= 0, got {}",
                self.inference.temperature
            )));
        }
        if !(self.inference.top_p > 0.0 && self.inference.top_p <= 1.0) {
            return Err(Error::Config(format!(
                "inference.top_p must be in (0, 1], got {}",
                self.inference.top_p
            )));
        }
        for (operation, spec) in &self.operations {
            if spec.model.trim().is_empty() {
                return Err(Error::Config(format!(
                    "operations.{}.model is empty",
                    operation
                )));
            }
            if spec.max_input_chars == 0 || spec.max_output_tokens == 0 {
                return Err(Error::Config(format!(
                    "operations.{} caps must be greater than zero",
                    operation
                )));
            }
        }
        Ok(())
    }

    /// Resolve relative paths against the data directory.
    pub fn resolved(mut self, data_dir: &Path) -> Self {
        if self.paths.models_dir.is_relative() {
            self.paths.models_dir = data_dir.join(&self.paths.models_dir);
        }
        if self.paths.ledger.is_relative() {
            self.paths.ledger = data_dir.join(&self.paths.ledger);
        }
        self
    }

    pub fn operation(&self, operation: Operation) -> Option<&OperationSpec> {
        self.operations.get(&operation)
    }

    pub fn model_dir(&self, model: &str) -> PathBuf {
        self.paths.models_dir.join(model)
    }
}
