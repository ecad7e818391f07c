use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use asset_cache::{
    AssetCache, AssetClass,
    config::AppConfig,
    registry::ServiceRegistry,
    services::AssetUrls,
};

const ASSET_CACHE_SERVICE: &str = "AssetCache";
const ASSET_URLS_SERVICE: &str = "AssetUrls";

#[derive(Parser)]
#[command(name = "asset-cache")]
#[command(version)]
#[command(about = "Fetch, cache and upload learning platform assets")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    /// Serve assets from the local dev handler (overrides config file)
    #[arg(long)]
    dev_mode: bool,

    /// Storage bucket name (overrides config file, disables dev mode)
    #[arg(short, long, value_name = "NAME")]
    bucket: Option<String>,

    /// Origin for relative handler URLs (overrides config file)
    #[arg(long, value_name = "URL")]
    origin: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the download URL of an asset
    Url {
        #[arg(long, default_value = "audio")]
        class: AssetClass,
        #[arg(long, default_value = "exploration")]
        entity_type: String,
        entity_id: String,
        filename: String,
    },
    /// Download an asset
    Fetch {
        #[arg(long, default_value = "audio")]
        class: AssetClass,
        #[arg(long, default_value = "exploration")]
        entity_type: String,
        entity_id: String,
        filename: String,
        /// Write the asset to this file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Upload an audio file to an exploration
    Upload {
        exploration_id: String,
        file: PathBuf,
        /// Name to upload as (defaults to the file's name)
        #[arg(long)]
        filename: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = format!("asset_cache={}", cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting asset-cache v{}", env!("CARGO_PKG_VERSION"));

    let mut config = AppConfig::load_from_file(&cli.config)?;
    info!("Configuration loaded from: {}", cli.config);

    if cli.dev_mode {
        config.assets.dev_mode = true;
    }
    if let Some(bucket) = cli.bucket {
        config.assets.dev_mode = false;
        config.assets.gcs_resource_bucket_name = bucket;
    }
    if let Some(origin) = cli.origin {
        config.assets.origin = origin;
    }

    let cache = AssetCache::from_config(&config)?;
    let mut registry = ServiceRegistry::new();
    registry.register(ASSET_URLS_SERVICE, Arc::new(cache.urls().clone()))?;
    registry.register(ASSET_CACHE_SERVICE, Arc::new(cache))?;
    info!("Registered services: {}", registry.names().join(", "));

    let cache = registry.get::<AssetCache>(ASSET_CACHE_SERVICE)?;

    match cli.command {
        Command::Url {
            class,
            entity_type,
            entity_id,
            filename,
        } => {
            let urls = registry.get::<AssetUrls>(ASSET_URLS_SERVICE)?;
            let url = urls.download_url(class, &entity_type, &entity_id, &filename)?;
            println!("{}", url);
        }
        Command::Fetch {
            class,
            entity_type,
            entity_id,
            filename,
            output,
        } => {
            let asset = cache
                .fetch(class, &entity_type, &entity_id, &filename)
                .await?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, asset.data())
                        .await
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!("Wrote {} ({} bytes)", path.display(), asset.len());
                }
                None => println!(
                    "{}: {} bytes ({})",
                    asset.filename(),
                    asset.len(),
                    asset.content_type().unwrap_or("unknown type")
                ),
            }
        }
        Command::Upload {
            exploration_id,
            file,
            filename,
        } => {
            let data = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let filename = match filename {
                Some(name) => name,
                None => file
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .context("Upload path has no file name")?,
            };
            let message = cache.save(&exploration_id, &filename, data).await?;
            println!("{}", message);
        }
    }

    Ok(())
}
