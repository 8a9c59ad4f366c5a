use crate::args::OutputFormat;
use crate::context::ExecutionContext;
use crate::views;
use anyhow::Result;
use modelgate_types::Operation;

pub async fn handle(
    ctx: &ExecutionContext,
    history: Option<usize>,
    operation: Option<Operation>,
) -> Result<()> {
    let quota = ctx.quota()?;

    match history {
        Some(days) => {
            let records = quota.history(operation, days).await?;
            match ctx.format {
                OutputFormat::Json => views::print_json(&records)?,
                OutputFormat::Plain => print!("{}", views::format_history(&records)),
            }
        }
        None => {
            let mut usage = quota.snapshot_usage().await?;
            if let Some(operation) = operation {
                usage.usage.retain(|u| u.operation == operation);
            }
            match ctx.format {
                OutputFormat::Json => views::print_json(&usage)?,
                OutputFormat::Plain => print!("{}", views::format_usage(&usage)),
            }
        }
    }
    Ok(())
}
