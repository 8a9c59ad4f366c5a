use super::args::{Cli, Commands, LimitsCommand};
use super::handlers;
use crate::context::ExecutionContext;
use anyhow::Result;
use modelgate_runtime::{Config, resolve_data_dir};
use std::path::Path;

pub async fn run(cli: Cli) -> Result<()> {
    let data_dir = resolve_data_dir(cli.data_dir.as_deref())?;

    let Some(command) = cli.command else {
        show_guidance(&data_dir, cli.config.as_deref());
        return Ok(());
    };

    let ctx = ExecutionContext::new(data_dir, cli.config, cli.format);

    match command {
        Commands::Init => handlers::init::handle(&ctx).await,

        Commands::Serve {
            host,
            port,
            preload,
        } => handlers::serve::handle(&ctx, host, port, preload).await,

        Commands::Limits { command } => match command {
            LimitsCommand::Show => handlers::limits::show(&ctx).await,
            LimitsCommand::Set { operation, limit } => {
                handlers::limits::set(&ctx, operation, limit).await
            }
        },

        Commands::Usage { history, operation } => {
            handlers::usage::handle(&ctx, history, operation).await
        }

        Commands::Models => handlers::models::handle(&ctx),
    }
}

fn show_guidance(data_dir: &Path, config: Option<&Path>) {
    let config_path = config
        .map(Path::to_path_buf)
        .unwrap_or_else(|| Config::default_path(data_dir));

    println!("modelgate - quota-guarded text operations on local models\n");

    if !config_path.exists() {
        println!("Get started:");
        println!("  modelgate init\n");
        println!("The init command will:");
        println!("  1. Write a default config to {}", config_path.display());
        println!("  2. Create the models directory");
        println!("  3. Create the quota ledger and seed daily limits\n");
    } else {
        println!("Quick commands:");
        println!("  modelgate serve                   # Start the HTTP gateway");
        println!("  modelgate models                  # Check model artifacts");
        println!("  modelgate usage                   # Today's usage per operation");
        println!("  modelgate limits set classify 50  # Change a daily limit\n");
    }

    println!("For more commands:");
    println!("  modelgate --help");
}
