pub mod aggregator;
pub mod cache;
pub mod catalog_client;
pub mod config;
pub mod favorites;
pub mod metrics;
pub mod movie;
pub mod search;
pub mod testing;

pub use aggregator::{AggregatorConfig, PageOutcome, ResultAggregator, SessionPhase, SessionState};
pub use cache::{CacheError, CacheStats, ResultCache, SqliteResultCache};
pub use catalog_client::{CatalogClient, CatalogError, TmdbClient, TmdbConfig};
pub use config::{
    load_config, load_config_from_str, validate_config, CacheConfig, Config, ConfigError,
    SanitizedConfig,
};
pub use favorites::{FavoritesError, FavoritesManager};
pub use movie::{normalize_query, Movie, MovieId, SearchResultPage};
pub use search::{SearchError, SearchOrchestrator};
