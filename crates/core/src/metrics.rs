//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Search orchestration (cache hits/misses, fallbacks)
//! - Catalog requests
//! - Favorites

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Search Orchestration
// =============================================================================

/// Cache lookups by result.
pub static CACHE_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("marquee_cache_lookups_total", "Total search page cache lookups"),
        &["result"], // "hit", "miss", "error"
    )
    .unwrap()
});

/// Cache fallbacks after a catalog failure.
pub static CACHE_FALLBACKS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "marquee_cache_fallbacks_total",
            "Cache fallbacks attempted after a catalog failure",
        ),
        &["result"], // "served", "missed"
    )
    .unwrap()
});

/// Write-through failures after a successful catalog fetch.
pub static CACHE_WRITE_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "marquee_cache_write_failures_total",
        "Failed write-through of fetched pages",
    )
    .unwrap()
});

// =============================================================================
// Catalog
// =============================================================================

/// Catalog requests by status.
pub static CATALOG_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("marquee_catalog_requests_total", "Total catalog search requests"),
        &["status"], // "success" or a CatalogError kind
    )
    .unwrap()
});

/// Catalog request duration in seconds.
pub static CATALOG_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "marquee_catalog_request_duration_seconds",
            "Duration of catalog search requests",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["status"], // "success", "error"
    )
    .unwrap()
});

// =============================================================================
// Favorites
// =============================================================================

/// Favorite toggles by resulting action.
pub static FAVORITE_TOGGLES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("marquee_favorite_toggles_total", "Total favorite toggles"),
        &["action"], // "added", "removed", "failed"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(CACHE_LOOKUPS.clone()),
        Box::new(CACHE_FALLBACKS.clone()),
        Box::new(CACHE_WRITE_FAILURES.clone()),
        Box::new(CATALOG_REQUESTS.clone()),
        Box::new(CATALOG_REQUEST_DURATION.clone()),
        Box::new(FAVORITE_TOGGLES.clone()),
    ]
}
