//! Remote movie catalog client.
//!
//! The catalog is queried one (search string, page) at a time. The search
//! orchestrator only sees the [`CatalogClient`] trait, so the TMDB client
//! can be swapped for a mock in tests.

mod tmdb;

pub use tmdb::{TmdbClient, TmdbConfig};

use async_trait::async_trait;
use thiserror::Error;

use crate::movie::SearchResultPage;

/// Errors that can occur when querying the remote catalog.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// Connection, DNS, TLS or timeout failure.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("Server failure: HTTP {status}")]
    Server { status: u16 },

    /// The credential was rejected (401).
    #[error("Unauthorized: the catalog rejected the API key")]
    Unauthorized,

    /// 2xx response whose body could not be decoded.
    #[error("Failed to decode response: {0}")]
    Decoding(String),

    /// The request could not be constructed.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl CatalogError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            CatalogError::Transport(_) => "transport",
            CatalogError::Server { .. } => "server",
            CatalogError::Unauthorized => "unauthorized",
            CatalogError::Decoding(_) => "decoding",
            CatalogError::InvalidRequest(_) => "invalid_request",
        }
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_builder() {
            CatalogError::InvalidRequest(e.to_string())
        } else if e.is_decode() {
            CatalogError::Decoding(e.to_string())
        } else {
            CatalogError::Transport(e.to_string())
        }
    }
}

/// Trait for remote catalog clients.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Run a single search for one page (1-based) of results.
    async fn search_movies(
        &self,
        query: &str,
        page: u32,
    ) -> Result<SearchResultPage, CatalogError>;
}
