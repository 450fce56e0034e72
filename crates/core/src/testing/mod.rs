//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the catalog client and the
//! result cache, allowing the search components to be tested without a
//! network or a database.
//!
//! # Example
//!
//! ```rust,ignore
//! use marquee_core::testing::{fixtures, MockCatalogClient, MockResultCache};
//!
//! let catalog = Arc::new(MockCatalogClient::new());
//! let cache = Arc::new(MockResultCache::new());
//!
//! // Configure mock responses
//! catalog.set_page("dune", fixtures::page(1, vec![fixtures::movie(438631, "Dune")], 1, 1)).await;
//! cache.set_fail_writes(true);
//!
//! let orchestrator = SearchOrchestrator::new(catalog, cache);
//! ```

mod mock_catalog_client;
mod mock_result_cache;

pub use mock_catalog_client::MockCatalogClient;
pub use mock_result_cache::MockResultCache;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::movie::{Movie, MovieId, SearchResultPage};

    /// Create a test movie with reasonable defaults.
    pub fn movie(id: MovieId, title: &str) -> Movie {
        Movie {
            id,
            title: title.to_string(),
            overview: format!("A movie about {}.", title.to_lowercase()),
            poster_path: Some(format!("/poster-{}.jpg", id)),
            backdrop_path: Some(format!("/backdrop-{}.jpg", id)),
            release_date: Some("2010-07-15".to_string()),
            vote_average: 7.5,
            vote_count: 1200,
            popularity: 25.0,
        }
    }

    /// Create a test movie with a specific popularity score.
    pub fn movie_with_popularity(id: MovieId, title: &str, popularity: f64) -> Movie {
        Movie {
            popularity,
            ..movie(id, title)
        }
    }

    /// Create a result page with a known total page count.
    pub fn page(
        page: u32,
        results: Vec<Movie>,
        total_pages: u32,
        total_results: u32,
    ) -> SearchResultPage {
        SearchResultPage {
            page,
            results,
            total_pages: Some(total_pages),
            total_results,
        }
    }
}
