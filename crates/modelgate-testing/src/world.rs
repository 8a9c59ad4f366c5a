//! TestWorld pattern for declarative integration test setup.
//!
//! Provides a fluent interface for:
//! - Creating an isolated data directory with its own config and ledger
//! - Building a `Gateway` against stub collaborators
//! - Executing CLI commands with the right `--data-dir`

use anyhow::Result;
use assert_cmd::Command;
use modelgate_ledger::Database;
use modelgate_runtime::{Clock, Config, Gateway, ModelProvisioner};
use modelgate_types::Operation;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use crate::fixtures;

/// Declarative test environment builder.
///
/// # Example
/// ```no_run
/// use modelgate_testing::TestWorld;
///
/// let world = TestWorld::new().with_default_limit(5);
/// world.write_config().unwrap();
///
/// let result = world.run(&["limits", "show"]).unwrap();
/// assert!(result.success());
/// ```
pub struct TestWorld {
    temp_dir: TempDir,
    data_dir: PathBuf,
    config: Config,
    env_vars: HashMap<String, String>,
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorld {
    /// Create a new isolated test environment.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let data_dir = temp_dir.path().join(".modelgate");
        std::fs::create_dir_all(&data_dir).expect("Failed to create data dir");

        let config = Config::default().resolved(&data_dir);

        Self {
            temp_dir,
            data_dir,
            config,
            env_vars: HashMap::new(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn config_path(&self) -> PathBuf {
        Config::default_path(&self.data_dir)
    }

    pub fn models_dir(&self) -> &Path {
        &self.config.paths.models_dir
    }

    pub fn ledger_path(&self) -> &Path {
        &self.config.paths.ledger
    }

    pub fn with_default_limit(mut self, limit: u64) -> Self {
        self.config.quota.default_daily_limit = limit;
        self
    }

    pub fn with_input_cap(mut self, operation: Operation, max_input_chars: usize) -> Self {
        if let Some(spec) = self.config.operations.get_mut(&operation) {
            spec.max_input_chars = max_input_chars;
        }
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.config.inference.max_concurrent = max_concurrent;
        self
    }

    /// Drop an operation from the configuration.
    pub fn without_operation(mut self, operation: Operation) -> Self {
        self.config.operations.remove(&operation);
        self
    }

    /// Set an environment variable for CLI execution.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(key.into(), value.into());
        self
    }

    /// Create a model directory whose manifest names `backend`.
    pub fn with_model_dir(self, key: &str, backend: &str) -> Self {
        fixtures::write_model_dir(&self.config.paths.models_dir, key, backend)
            .expect("Failed to write model dir");
        self
    }

    /// Persist the current config as `config.toml` in the data directory.
    pub fn write_config(&self) -> Result<()> {
        self.config.save_to(&self.config_path())?;
        Ok(())
    }

    pub fn open_ledger(&self) -> Result<Database> {
        Ok(Database::open(self.ledger_path())?)
    }

    /// Build a gateway on the on-disk ledger with the given collaborators.
    pub async fn gateway(
        &self,
        provisioner: Arc<dyn ModelProvisioner>,
        clock: Arc<dyn Clock>,
    ) -> Result<Gateway> {
        let gateway = Gateway::builder(self.config.clone())
            .provisioner(provisioner)
            .clock(clock)
            .build()
            .await?;
        Ok(gateway)
    }

    /// Configure a CLI command with this test environment's settings.
    pub fn configure_command<'a>(&self, cmd: &'a mut Command) -> &'a mut Command {
        cmd.arg("--data-dir")
            .arg(self.data_dir())
            .arg("--format")
            .arg("plain");

        cmd.current_dir(self.temp_dir.path());
        cmd.env_remove("MODELGATE_PATH");
        cmd.env_remove("RUST_LOG");

        for (key, value) in &self.env_vars {
            cmd.env(key, value);
        }

        cmd
    }

    /// Execute a command using the project's binary and return the result.
    ///
    /// # Note
    /// This method uses `Command::cargo_bin()` which requires the binary to be
    /// built and the `CARGO_BIN_EXE_` environment variable to be set (which
    /// cargo test does automatically).
    #[allow(deprecated)]
    pub fn run(&self, args: &[&str]) -> Result<CliResult> {
        let mut cmd = Command::cargo_bin("modelgate")
            .map_err(|e| anyhow::anyhow!("Failed to find modelgate binary: {}", e))?;

        self.configure_command(&mut cmd);
        cmd.args(args);

        let output = cmd.output()?;

        Ok(CliResult {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Result of a CLI command execution.
#[derive(Debug)]
pub struct CliResult {
    pub status: std::process::ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CliResult {
    /// Check if the command succeeded.
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Parse stdout as JSON.
    pub fn json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::from_str(&self.stdout)?)
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }
}
