//! Mock catalog client for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::catalog_client::{CatalogClient, CatalogError};
use crate::movie::SearchResultPage;

/// Mock implementation of the CatalogClient trait.
///
/// Provides controllable behavior for testing:
/// - Return scripted pages per (query, page)
/// - Track queries for assertions
/// - Simulate failures and per-query latency
///
/// Queries are matched exactly as sent, without normalization. A page that
/// was never scripted comes back empty with zero total pages.
///
/// # Example
///
/// ```rust,ignore
/// use marquee_core::testing::{MockCatalogClient, fixtures};
///
/// let catalog = MockCatalogClient::new();
/// catalog
///     .set_page("Inception", fixtures::page(1, vec![fixtures::movie(1, "Inception")], 1, 1))
///     .await;
///
/// let page = catalog.search_movies("Inception", 1).await?;
/// assert_eq!(page.results.len(), 1);
/// assert_eq!(catalog.query_count().await, 1);
/// ```
#[derive(Debug, Default)]
pub struct MockCatalogClient {
    /// Scripted pages by (query, page number).
    pages: Arc<RwLock<HashMap<(String, u32), SearchResultPage>>>,
    /// Artificial latency per query.
    delays: Arc<RwLock<HashMap<String, Duration>>>,
    /// Recorded (query, page) requests.
    queries: Arc<RwLock<Vec<(String, u32)>>>,
    /// If set, the next request will fail with this error.
    next_error: Arc<RwLock<Option<CatalogError>>>,
}

impl MockCatalogClient {
    /// Create a new mock with no scripted pages.
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Script the response for `query` at `page.page`.
    pub async fn set_page(&self, query: &str, page: SearchResultPage) {
        self.pages
            .write()
            .await
            .insert((query.to_string(), page.page), page);
    }

    /// Delay every response for `query` by `delay`.
    pub async fn set_delay(&self, query: &str, delay: Duration) {
        self.delays.write().await.insert(query.to_string(), delay);
    }

    /// Clear all scripted pages and delays.
    pub async fn clear(&self) {
        self.pages.write().await.clear();
        self.delays.write().await.clear();
    }

    // =========================================================================
    // Query Recording
    // =========================================================================

    /// Get all recorded (query, page) requests.
    pub async fn recorded_queries(&self) -> Vec<(String, u32)> {
        self.queries.read().await.clone()
    }

    /// Get the number of requests performed.
    pub async fn query_count(&self) -> usize {
        self.queries.read().await.len()
    }

    // =========================================================================
    // Error Injection
    // =========================================================================

    /// Configure the next request to fail with the given error.
    pub async fn set_next_error(&self, error: CatalogError) {
        *self.next_error.write().await = Some(error);
    }

    /// Clear any pending error.
    pub async fn clear_next_error(&self) {
        *self.next_error.write().await = None;
    }
}

#[async_trait]
impl CatalogClient for MockCatalogClient {
    async fn search_movies(
        &self,
        query: &str,
        page: u32,
    ) -> Result<SearchResultPage, CatalogError> {
        self.queries.write().await.push((query.to_string(), page));

        let delay = self.delays.read().await.get(query).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        let scripted = self
            .pages
            .read()
            .await
            .get(&(query.to_string(), page))
            .cloned();

        Ok(scripted.unwrap_or(SearchResultPage {
            page,
            results: Vec::new(),
            total_pages: Some(0),
            total_results: 0,
        }))
    }
}
