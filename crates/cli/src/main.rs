mod commands;
mod metrics;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use marquee_core::{
    load_config, validate_config, CatalogClient, FavoritesManager, ResultAggregator, ResultCache,
    SearchOrchestrator, SqliteResultCache, TmdbClient,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Parser)]
#[command(name = "marquee", version, about = "Search the movie catalog with a local cache")]
struct Cli {
    /// Configuration file (default: $MARQUEE_CONFIG or ./config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print collected metrics after the command
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Search movies, fetching up to N pages
    Search {
        query: String,
        #[arg(long, default_value_t = 1)]
        pages: u32,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage favorites
    #[command(subcommand)]
    Favorites(FavoritesCommand),
    /// Inspect or clear the result cache
    #[command(subcommand)]
    Cache(CacheCommand),
    /// Show the effective configuration (secrets redacted)
    Config,
}

#[derive(Debug, Subcommand)]
enum FavoritesCommand {
    /// List favorites, most recent first
    List,
    /// Toggle a movie found by searching for QUERY
    Toggle {
        query: String,
        id: u64,
        /// Pages to search through when looking for the movie
        #[arg(long, default_value_t = 3)]
        pages: u32,
    },
    /// Remove a favorite by ID (no search needed)
    Remove { id: u64 },
}

#[derive(Debug, Subcommand)]
enum CacheCommand {
    /// Show cache statistics
    Stats,
    /// Drop cached pages (favorites are kept)
    Clear,
}

/// Fully wired core components.
pub struct App {
    pub aggregator: Arc<ResultAggregator>,
    pub cache: Arc<dyn ResultCache>,
    pub catalog: Arc<TmdbClient>,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,marquee_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Determine config path
    let config_path = cli
        .config
        .clone()
        .or_else(|| std::env::var("MARQUEE_CONFIG").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("marquee v{}", VERSION);
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;
    info!("Cache path: {:?}", config.cache.path);

    if let Command::Config = cli.command {
        return commands::show_config(&config);
    }

    let cache: Arc<SqliteResultCache> = Arc::new(
        SqliteResultCache::new(&config.cache.path).context("Failed to open result cache")?,
    );
    let catalog = Arc::new(
        TmdbClient::new(config.catalog.clone()).context("Failed to create catalog client")?,
    );

    let orchestrator = Arc::new(SearchOrchestrator::new(
        catalog.clone() as Arc<dyn CatalogClient>,
        cache.clone() as Arc<dyn ResultCache>,
    ));
    let favorites = Arc::new(FavoritesManager::new(cache.clone()));
    let aggregator = Arc::new(ResultAggregator::new(
        orchestrator,
        favorites,
        config.search.clone(),
    ));

    let app = App {
        aggregator,
        cache,
        catalog,
    };

    let (name, result) = match cli.command {
        Command::Search { query, pages, json } => {
            ("search", commands::search(&app, &query, pages, json).await)
        }
        Command::Favorites(FavoritesCommand::List) => {
            ("favorites_list", commands::list_favorites(&app))
        }
        Command::Favorites(FavoritesCommand::Toggle { query, id, pages }) => (
            "favorites_toggle",
            commands::toggle_favorite(&app, &query, id, pages).await,
        ),
        Command::Favorites(FavoritesCommand::Remove { id }) => {
            ("favorites_remove", commands::remove_favorite(&app, id))
        }
        Command::Cache(CacheCommand::Stats) => ("cache_stats", commands::cache_stats(&app)),
        Command::Cache(CacheCommand::Clear) => ("cache_clear", commands::clear_cache(&app)),
        // Answered before the components were built
        Command::Config => ("config", Ok(())),
    };
    metrics::finish_command(name, result, cli.metrics, &mut std::io::stdout())
}
