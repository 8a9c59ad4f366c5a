use crate::args::OutputFormat;
use anyhow::Result;
use modelgate_ledger::Database;
use modelgate_runtime::{Config, QuotaService, SystemClock};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Per-invocation state shared by command handlers.
///
/// The config and the quota service are opened on first use, so commands
/// that never touch the ledger never create it.
pub struct ExecutionContext {
    data_dir: PathBuf,
    config_path: PathBuf,
    pub format: OutputFormat,
    config: OnceCell<Config>,
    quota: OnceCell<QuotaService>,
}

impl ExecutionContext {
    pub fn new(data_dir: PathBuf, config_path: Option<PathBuf>, format: OutputFormat) -> Self {
        let config_path = config_path.unwrap_or_else(|| Config::default_path(&data_dir));
        Self {
            data_dir,
            config_path,
            format,
            config: OnceCell::new(),
            quota: OnceCell::new(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Config with relative paths resolved against the data directory.
    pub fn config(&self) -> Result<&Config> {
        self.config.get_or_try_init(|| {
            let config = Config::load_from(&self.config_path)?.resolved(&self.data_dir);
            config.validate()?;
            Ok(config)
        })
    }

    /// Quota service over the on-disk ledger. Seeding is left to `init` and
    /// `serve`; reads fall back to the configured default limit.
    pub fn quota(&self) -> Result<&QuotaService> {
        self.quota.get_or_try_init(|| {
            let config = self.config()?;
            let ledger = Database::open(&config.paths.ledger)?;
            Ok(QuotaService::new(
                ledger,
                Arc::new(SystemClock),
                config.operations.clone(),
                &config.quota,
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_defaults_resolve_against_data_dir() {
        let temp = TempDir::new().unwrap();
        let ctx = ExecutionContext::new(temp.path().to_path_buf(), None, OutputFormat::Plain);

        assert_eq!(ctx.config_path(), temp.path().join("config.toml"));
        let config = ctx.config().unwrap();
        assert_eq!(config.paths.ledger, temp.path().join("ledger.db"));
        assert_eq!(config.paths.models_dir, temp.path().join("models"));
    }

    #[test]
    fn test_invalid_config_is_reported() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("custom.toml");
        std::fs::write(&path, "[inference]\nmax_concurrent = 0\n").unwrap();

        let ctx = ExecutionContext::new(temp.path().to_path_buf(), Some(path), OutputFormat::Plain);
        let err = ctx.config().unwrap_err();
        assert!(err.to_string().contains("max_concurrent"));
    }
}
