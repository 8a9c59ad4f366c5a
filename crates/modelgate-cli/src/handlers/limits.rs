use crate::args::OutputFormat;
use crate::context::ExecutionContext;
use crate::views;
use anyhow::Result;
use modelgate_types::Operation;

pub async fn show(ctx: &ExecutionContext) -> Result<()> {
    let limits = ctx.quota()?.snapshot_limits().await?;

    match ctx.format {
        OutputFormat::Json => views::print_json(&limits)?,
        OutputFormat::Plain => print!("{}", views::format_limits(&limits)),
    }
    Ok(())
}

pub async fn set(ctx: &ExecutionContext, operation: Operation, limit: u64) -> Result<()> {
    let quota = ctx.quota()?;
    quota.set_limit(operation, limit).await?;

    match ctx.format {
        OutputFormat::Json => views::print_json(&quota.snapshot_limits().await?)?,
        OutputFormat::Plain => views::print_limit_updated(operation, limit),
    }
    Ok(())
}
