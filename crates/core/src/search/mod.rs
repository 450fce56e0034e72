//! Cache-first search orchestration.
//!
//! The orchestrator answers a (query, page) request from the result cache
//! when it can, otherwise from the remote catalog, and falls back to the
//! cache once more when the catalog fails.

mod orchestrator;

pub use orchestrator::SearchOrchestrator;

use thiserror::Error;

use crate::catalog_client::CatalogError;

/// Errors returned by [`SearchOrchestrator::fetch_page`].
#[derive(Debug, Error)]
pub enum SearchError {
    /// The query was empty.
    #[error("Nothing to search for: the query is empty")]
    NotFound,

    /// The catalog failed and the cache had nothing to fall back on.
    #[error(transparent)]
    Network(#[from] CatalogError),
}
