use std::process::ExitCode;

use pixabay_downloader::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(error) => {
            tracing::error!(error = %error, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    tracing::debug!(?config, "Loaded configuration");

    match pixabay_downloader::run(&config).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(error = %error, "Run failed");
            ExitCode::FAILURE
        }
    }
}
