mod cli;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use boxart::cache::CacheStore;
use boxart::config::{self, Config};
use boxart::provenance;
use boxart::providers::{
    ProviderRegistry, ScreenscraperProvider, TgdbProvider, WikimediaProvider,
};
use boxart::reference::Source;
use boxart::resolver::{CoverRequest, Resolution, Resolver};

use cli::{CacheCommands, Cli, Commands};

/// First-level static fallback shown when a cover is unavailable: a
/// 1x1 transparent GIF, small enough to inline anywhere.
const PLACEHOLDER_DATA_URI: &str =
    "data:image/gif;base64,R0lGODlhAQABAIAAAAAAAP///yH5BAEAAAAALAAAAAABAAEAAAIBRAA7";

/// Second-level fallback, a bundled default cover shipped with the app.
const DEFAULT_COVER_ASSET: &str = "assets/default-cover.png";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("boxart=debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("boxart=info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = config::load_config_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Resolve {
            title,
            platform,
            reference,
            source,
            json,
        } => {
            let resolver = build_resolver(&config);
            let mut request = CoverRequest::new(title, platform);
            if let Some(reference) = reference {
                request = request.with_reference(reference);
            }
            if let Some(source) = source {
                request = request.with_source(source);
            }

            match resolver.resolve(&request).await {
                Resolution::Resolved(result) => {
                    if json {
                        println!(
                            "{}",
                            serde_json::json!({
                                "url": result.url,
                                "source": result.source.to_string(),
                                "from_cache": result.from_cache,
                            })
                        );
                    } else {
                        tracing::info!(
                            source = %result.source,
                            from_cache = result.from_cache,
                            "Resolved cover"
                        );
                        println!("{}", result.url);
                    }
                }
                Resolution::Unavailable => {
                    // The engine never substitutes images itself; the
                    // caller picks the fallback. Prefer the bundled
                    // default cover, then the inline placeholder.
                    tracing::warn!("Cover unavailable; using fallback image");
                    let fallback = if std::path::Path::new(DEFAULT_COVER_ASSET).exists() {
                        DEFAULT_COVER_ASSET
                    } else {
                        PLACEHOLDER_DATA_URI
                    };
                    if json {
                        println!(
                            "{}",
                            serde_json::json!({
                                "url": fallback,
                                "source": "default",
                                "from_cache": false,
                            })
                        );
                    } else {
                        println!("{fallback}");
                    }
                }
            }
        }

        Commands::Classify { reference } => {
            let badge = provenance::classify(Some(&reference));
            let cacheable = provenance::looks_network_sourced(Some(&reference));
            println!("{badge}");
            println!("network-sourced: {cacheable}");
        }

        Commands::Cache { command } => {
            let store = build_store(&config);
            match command {
                CacheCommands::Stats => {
                    let stats = store.stats();
                    println!("durable entries: {}", stats.durable_entries);
                    println!("session entries: {}", stats.session_entries);
                    println!("hits: {}  misses: {}", stats.hits, stats.misses);
                }
                CacheCommands::Clear => {
                    store.clear();
                    tracing::info!("Cover cache cleared");
                }
            }
        }

        Commands::Version => {
            println!("boxart {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

fn build_store(config: &Config) -> CacheStore {
    let store = match &config.cache.path {
        Some(path) => CacheStore::open(path.clone()),
        None => CacheStore::in_memory(),
    };
    match config.cache.ttl_days {
        Some(days) => store.with_ttl(chrono::Duration::days(days as i64)),
        None => store,
    }
}

fn build_resolver(config: &Config) -> Resolver {
    let wikimedia = Arc::new(WikimediaProvider::with_options(
        config.wikimedia.endpoint.clone(),
        std::time::Duration::from_secs(config.wikimedia.timeout_secs),
        config.wikimedia.thumb_size,
        &config.wikimedia.skip_titles,
    ));

    let mut registry = ProviderRegistry::new(config.resolver.default_source);
    registry.register(Source::Wikimedia, wikimedia.clone());
    registry.register(Source::Tgdb, Arc::new(TgdbProvider::new(wikimedia.clone())));
    registry.register(
        Source::Screenscraper,
        Arc::new(ScreenscraperProvider::new(wikimedia)),
    );

    Resolver::new(Arc::new(build_store(config)), registry)
}
