// Karma Extract - Web Server
// Serves the extracted tables and re-runs the pipeline on demand

use karma_extract::api::run_server;
use karma_extract::{Config, Pipeline};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "karma_extract=info,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    tracing::info!(
        data_dir = %config.data_dir.display(),
        raw_dir = %config.raw_dir.display(),
        "Karma Extract API"
    );
    if !config.raw_dir.exists() {
        tracing::warn!(
            "raw directory {} not found; refreshes will fail until it exists",
            config.raw_dir.display()
        );
    }

    run_server(Pipeline::from_config(config)).await
}
