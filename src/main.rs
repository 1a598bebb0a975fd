use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tonrally::app::{App, Config};
use tracing::info;

#[derive(Parser)]
#[command(name = "tonrally", version, about = "Telegram buy-competition bot for TON jettons")]
struct Args {
    /// Path to the TOML config file. Falls back to defaults plus
    /// environment secrets when the file does not exist.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let config = if args.config.exists() {
        Config::load(&args.config).with_context(|| format!("loading {}", args.config.display()))?
    } else {
        Config::from_env().context("building config from environment")?
    };

    config.init_logging();
    info!("tonrally starting");

    let app = App::build(config).await.context("starting services")?;

    tokio::select! {
        () = app.run() => {}
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    app.shutdown().await;
    info!("tonrally stopped");
    Ok(())
}
