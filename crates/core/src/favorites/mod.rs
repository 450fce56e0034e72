//! Favorites management.
//!
//! Favorites live entirely in the result cache; nothing here touches the
//! network. Unlike a plain boolean lookup, the read operations report
//! storage failures so callers can tell "not a favorite" apart from
//! "could not check".

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::cache::{CacheError, ResultCache};
use crate::metrics;
use crate::movie::{Movie, MovieId};

/// Errors for favorites operations.
#[derive(Debug, Error)]
pub enum FavoritesError {
    #[error(transparent)]
    Persistence(#[from] CacheError),
}

/// Adds, removes and lists favorite movies through the result cache.
pub struct FavoritesManager {
    cache: Arc<dyn ResultCache>,
}

impl FavoritesManager {
    pub fn new(cache: Arc<dyn ResultCache>) -> Self {
        Self { cache }
    }

    /// Check whether a movie is a favorite.
    pub fn is_favorite(&self, id: MovieId) -> Result<bool, FavoritesError> {
        self.cache.is_favorite(id).map_err(|e| {
            warn!("Failed to check favorite status of {}: {}", id, e);
            e.into()
        })
    }

    /// Add a movie to favorites. Idempotent.
    pub fn add_favorite(&self, movie: &Movie) -> Result<(), FavoritesError> {
        self.cache.add_favorite(movie)?;
        debug!("Added favorite {} ('{}')", movie.id, movie.title);
        Ok(())
    }

    /// Remove a movie from favorites. Removing an absent ID is a no-op.
    pub fn remove_favorite(&self, id: MovieId) -> Result<(), FavoritesError> {
        self.cache.remove_favorite(id)?;
        debug!("Removed favorite {}", id);
        Ok(())
    }

    /// Flip the favorite status of a movie and return the new status.
    ///
    /// The check and the write are two separate cache operations.
    pub fn toggle_favorite(&self, movie: &Movie) -> Result<bool, FavoritesError> {
        let result = if self.is_favorite(movie.id)? {
            self.remove_favorite(movie.id).map(|()| false)
        } else {
            self.add_favorite(movie).map(|()| true)
        };

        let action = match result {
            Ok(true) => "added",
            Ok(false) => "removed",
            Err(_) => "failed",
        };
        metrics::FAVORITE_TOGGLES.with_label_values(&[action]).inc();
        result
    }

    /// List favorites, most recently added first.
    pub fn list_favorites(&self) -> Result<Vec<Movie>, FavoritesError> {
        self.cache.list_favorites().map_err(|e| {
            warn!("Failed to list favorites: {}", e);
            e.into()
        })
    }
}
