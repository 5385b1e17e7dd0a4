use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use feedstash::config::Config;
use feedstash::feed::{Coordinator, HttpFetcher, UpdateError};

/// Get the default config file path (~/.config/feedstash/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("feedstash")
        .join("config.toml"))
}

#[derive(Parser, Debug)]
#[command(
    name = "feedstash",
    about = "Fetch feeds into per-feed article records and link new articles"
)]
struct Args {
    /// Config file (defaults to ~/.config/feedstash/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Update only this feed instead of all configured feeds
    #[arg(long, value_name = "NAME")]
    feed: Option<String>,

    /// Delete stored articles before downloading (full re-download)
    #[arg(long)]
    reset: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    if config.feeds.is_empty() {
        tracing::warn!(path = %config_path.display(), "No feeds configured");
    }

    let client = reqwest::Client::builder()
        .user_agent(concat!("feedstash/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(std::time::Duration::from_secs(30))
        .build()
        .context("Failed to build HTTP client")?;
    let coordinator = Coordinator::from_config(&config, Arc::new(HttpFetcher::new(client)));

    match args.feed {
        Some(name) => match coordinator.update_one(&name, args.reset).await {
            Ok(_) => {}
            Err(e @ (UpdateError::FeedNotFound(_) | UpdateError::Storage { .. })) => {
                return Err(e.into())
            }
            // Already logged by the updater
            Err(_) => {}
        },
        None => {
            coordinator
                .update_all(args.reset)
                .await
                .context("Failed to prepare the new-article directory")?;
        }
    }

    Ok(())
}
