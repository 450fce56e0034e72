//! Result cache - durable storage for fetched search pages and favorites.
//!
//! Pages are keyed by (normalized query, page number). Favorites are a set
//! keyed by movie ID. The two key spaces are independent.

mod sqlite;

pub use sqlite::SqliteResultCache;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::movie::{Movie, MovieId};

/// Errors for cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Persistence failure: {0}")]
    Persistence(String),
}

impl From<rusqlite::Error> for CacheError {
    fn from(e: rusqlite::Error) -> Self {
        CacheError::Persistence(e.to_string())
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of distinct (query, page) keys stored.
    pub cached_pages: u64,
    /// Number of distinct movies stored.
    pub cached_movies: u64,
    /// Number of favorites.
    pub favorites: u64,
}

/// Trait for result cache storage.
pub trait ResultCache: Send + Sync {
    /// Get the movies stored for a page key.
    ///
    /// A missing key yields an empty list.
    fn get_page(&self, normalized_query: &str, page: u32) -> Result<Vec<Movie>, CacheError>;

    /// Get the total page count recorded alongside a page key.
    fn get_total_pages(&self, normalized_query: &str, page: u32)
        -> Result<Option<u32>, CacheError>;

    /// Store a page of movies.
    ///
    /// Upserts by movie ID: movies already stored under the key are
    /// overwritten, new ones are added. `total_pages` replaces any previous
    /// value for the key.
    fn put_page(
        &self,
        movies: &[Movie],
        normalized_query: &str,
        page: u32,
        total_pages: u32,
    ) -> Result<(), CacheError>;

    /// Add a favorite. Adding an existing favorite is a no-op.
    fn add_favorite(&self, movie: &Movie) -> Result<(), CacheError>;

    /// Remove a favorite. Removing an absent ID is a no-op.
    fn remove_favorite(&self, id: MovieId) -> Result<(), CacheError>;

    /// Check whether a movie is a favorite.
    fn is_favorite(&self, id: MovieId) -> Result<bool, CacheError>;

    /// List favorites, most recently added first.
    fn list_favorites(&self) -> Result<Vec<Movie>, CacheError>;

    /// Drop all cached pages. Favorites are kept.
    fn clear_pages(&self) -> Result<(), CacheError>;

    /// Get cache statistics.
    fn stats(&self) -> Result<CacheStats, CacheError>;
}
