use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use appstore_metadata_sync::{app_store::AppStoreClient, config, sync};

/// Push localized App Store metadata from per-locale JSON files
#[derive(Parser, Debug)]
#[command(name = "appstore-metadata-sync", version)]
struct Cli {
    /// The path to the folder where the '.json' files are.
    localizations_path: PathBuf,

    /// The bundle id of the app to update the metadata for.
    #[arg(long)]
    bundle_id: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load .env file (ignored when variables come from the environment)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("appstore_metadata_sync=info".parse()?),
        )
        .init();

    info!("Starting metadata sync for {}", cli.bundle_id);

    let config = config::Config::from_env()?;
    let client = AppStoreClient::new(&config);

    let reports = sync::run(&client, &cli.bundle_id, &cli.localizations_path)
        .await
        .with_context(|| format!("Metadata sync for {} failed", cli.bundle_id))?;

    for report in &reports {
        info!("{}: {}", report.locale, report.outcome);
    }

    Ok(())
}
