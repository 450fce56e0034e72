//! Search orchestrator: cache lookup, catalog fetch, write-through and
//! fallback.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::SearchError;
use crate::cache::ResultCache;
use crate::catalog_client::CatalogClient;
use crate::metrics;
use crate::movie::{normalize_query, SearchResultPage};

/// Resolves search pages from the result cache and the remote catalog.
pub struct SearchOrchestrator {
    catalog: Arc<dyn CatalogClient>,
    cache: Arc<dyn ResultCache>,
}

impl SearchOrchestrator {
    pub fn new(catalog: Arc<dyn CatalogClient>, cache: Arc<dyn ResultCache>) -> Self {
        Self { catalog, cache }
    }

    /// Fetch one page of results for `query`.
    ///
    /// 1. A non-empty cached page for (normalized query, page) is returned
    ///    without contacting the catalog. An empty cached page is a miss.
    /// 2. On a miss the catalog is queried; a successful page is written
    ///    through to the cache before being returned.
    /// 3. If the catalog fails, the cache is checked once more and a
    ///    non-empty page is returned in place of the error. Otherwise the
    ///    original catalog error is returned unchanged.
    pub async fn fetch_page(&self, query: &str, page: u32) -> Result<SearchResultPage, SearchError> {
        if query.is_empty() {
            return Err(SearchError::NotFound);
        }

        let key = normalize_query(query);

        if let Some(cached) = self.cached_page(&key, page) {
            metrics::CACHE_LOOKUPS.with_label_values(&["hit"]).inc();
            debug!(
                "Cache hit for '{}' page {} ({} movies)",
                key,
                page,
                cached.results.len()
            );
            return Ok(cached);
        }
        metrics::CACHE_LOOKUPS.with_label_values(&["miss"]).inc();
        debug!("Cache miss for '{}' page {}, querying catalog", key, page);

        let started = Instant::now();
        match self.catalog.search_movies(query, page).await {
            Ok(fetched) => {
                metrics::CATALOG_REQUESTS.with_label_values(&["success"]).inc();
                metrics::CATALOG_REQUEST_DURATION
                    .with_label_values(&["success"])
                    .observe(started.elapsed().as_secs_f64());

                self.write_through(&key, page, &fetched);
                Ok(fetched)
            }
            Err(e) => {
                metrics::CATALOG_REQUESTS.with_label_values(&[e.kind()]).inc();
                metrics::CATALOG_REQUEST_DURATION
                    .with_label_values(&["error"])
                    .observe(started.elapsed().as_secs_f64());

                if let Some(cached) = self.cached_page(&key, page) {
                    metrics::CACHE_FALLBACKS.with_label_values(&["served"]).inc();
                    warn!(
                        "Catalog search failed for '{}' page {} ({}), serving cached page",
                        key, page, e
                    );
                    return Ok(cached);
                }

                metrics::CACHE_FALLBACKS.with_label_values(&["missed"]).inc();
                warn!(
                    "Catalog search failed for '{}' page {} with no cached fallback: {}",
                    key, page, e
                );
                Err(SearchError::Network(e))
            }
        }
    }

    /// Look up a page in the cache. Empty pages and read failures are misses.
    fn cached_page(&self, key: &str, page: u32) -> Option<SearchResultPage> {
        let movies = match self.cache.get_page(key, page) {
            Ok(movies) => movies,
            Err(e) => {
                metrics::CACHE_LOOKUPS.with_label_values(&["error"]).inc();
                warn!("Cache read failed for '{}' page {}: {}", key, page, e);
                return None;
            }
        };

        if movies.is_empty() {
            return None;
        }

        let total_pages = self.cache.get_total_pages(key, page).unwrap_or_else(|e| {
            warn!("Failed to read total pages for '{}' page {}: {}", key, page, e);
            None
        });

        Some(SearchResultPage {
            page,
            total_results: movies.len() as u32,
            results: movies,
            total_pages,
        })
    }

    fn write_through(&self, key: &str, page: u32, fetched: &SearchResultPage) {
        // A page without a known total only ever comes from the cache itself
        let Some(total_pages) = fetched.total_pages else {
            return;
        };

        match self.cache.put_page(&fetched.results, key, page, total_pages) {
            Ok(()) => info!(
                "Cached {} movies for '{}' page {}/{}",
                fetched.results.len(),
                key,
                page,
                total_pages
            ),
            Err(e) => {
                metrics::CACHE_WRITE_FAILURES.inc();
                warn!("Failed to cache '{}' page {}: {}", key, page, e);
            }
        }
    }
}
