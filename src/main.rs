//! # Backoffice API Main Entry Point

use anyhow::Context;
use backoffice::{config::ConfigLoader, db, server::run_server, telemetry};
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "backoffice", version, about = "Back-office API service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply migrations and serve the API (default)
    Serve,
    /// Apply pending migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::new().load().context("loading configuration")?;
    config.validate().context("validating configuration")?;
    telemetry::init_tracing(&config).context("initializing tracing")?;

    tracing::info!(profile = %config.profile, "loaded configuration");
    if let Ok(redacted) = config.redacted_json() {
        tracing::debug!(config = %redacted, "effective configuration");
    }

    let pool = db::init_pool(&config).await?;
    db::run_migrations(&pool).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Migrate => {
            tracing::info!("migrations applied");
            Ok(())
        }
        Command::Serve => run_server(config, pool).await,
    }
}
