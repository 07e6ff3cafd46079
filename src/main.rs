use anyhow::Result;
use clap::Parser;
use lease_quote::{config, init_tracing};
use std::path::Path;

mod cli;
mod commands;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let command = args.get_command();

    // The server initializes tracing itself once its config is loaded
    if !matches!(command, cli::Commands::Start) {
        init_cli_tracing(&args.config);
    }

    match command {
        cli::Commands::Start => {
            commands::start::execute(&args.config).await?;
        }
        cli::Commands::Test => {
            commands::test::execute(&args.config)?;
        }
        cli::Commands::Calc {
            quote,
            rates,
            tco_settings,
            commission,
        } => {
            commands::calc::execute(
                &args.config,
                &quote,
                rates.as_deref(),
                tco_settings.as_deref(),
                commission,
            )
            .await?;
        }
        cli::Commands::Rates { action } => match action {
            cli::RatesCommands::Import { file, actor } => {
                commands::rates::import(&args.config, &file, &actor).await?
            }
            cli::RatesCommands::Show => commands::rates::show(&args.config).await?,
        },
    }

    Ok(())
}

/// Log at the configured level when the config file loads, else at "info"
fn init_cli_tracing(config_path: &Path) {
    match config::load_config(config_path) {
        Ok(cfg) => init_tracing(&cfg.server.log_level, &cfg.server.log_format),
        Err(_) => init_tracing("info", "text"),
    }
}
