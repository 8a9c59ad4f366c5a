use crate::args::OutputFormat;
use crate::context::ExecutionContext;
use crate::views;
use anyhow::Result;
use modelgate_runtime::Config;
use modelgate_types::Operation;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
pub struct InitReport {
    pub config_path: PathBuf,
    pub config_created: bool,
    pub models_dir: PathBuf,
    pub ledger: PathBuf,
    pub seeded_limits: usize,
    pub operations: Vec<(Operation, String)>,
}

/// Idempotent: an existing config and existing limit rows are left alone.
pub async fn handle(ctx: &ExecutionContext) -> Result<()> {
    std::fs::create_dir_all(ctx.data_dir())?;

    let config_path = ctx.config_path().to_path_buf();
    let config_created = !config_path.exists();
    if config_created {
        Config::default().save_to(&config_path)?;
        tracing::info!(path = %config_path.display(), "wrote default config");
    }

    let config = ctx.config()?;
    std::fs::create_dir_all(&config.paths.models_dir)?;
    let seeded_limits = ctx.quota()?.seed_limits().await?;

    let report = InitReport {
        config_path,
        config_created,
        models_dir: config.paths.models_dir.clone(),
        ledger: config.paths.ledger.clone(),
        seeded_limits,
        operations: config
            .operations
            .iter()
            .map(|(operation, spec)| (*operation, spec.model.clone()))
            .collect(),
    };

    match ctx.format {
        OutputFormat::Json => views::print_json(&report)?,
        OutputFormat::Plain => views::print_init(&report),
    }
    Ok(())
}
