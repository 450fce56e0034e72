//! Search session integration tests.
//!
//! These tests drive the aggregator against the SQLite result cache and the
//! mock catalog client: search -> load more -> restart -> offline fallback.

use std::sync::Arc;

use tempfile::TempDir;

use marquee_core::{
    testing::{fixtures, MockCatalogClient},
    AggregatorConfig, CatalogError, FavoritesManager, PageOutcome, ResultAggregator, ResultCache,
    SearchOrchestrator, SqliteResultCache,
};

/// Test helper wiring an aggregator to an on-disk cache.
struct TestHarness {
    catalog: Arc<MockCatalogClient>,
    cache: Arc<SqliteResultCache>,
    aggregator: Arc<ResultAggregator>,
}

impl TestHarness {
    fn open(temp_dir: &TempDir, catalog: Arc<MockCatalogClient>) -> Self {
        let db_path = temp_dir.path().join("cache.db");
        let cache = Arc::new(SqliteResultCache::new(&db_path).expect("Failed to open cache"));
        let orchestrator = Arc::new(SearchOrchestrator::new(catalog.clone(), cache.clone()));
        let favorites = Arc::new(FavoritesManager::new(cache.clone()));
        let aggregator = Arc::new(ResultAggregator::new(
            orchestrator,
            favorites,
            AggregatorConfig { debounce_ms: 10 },
        ));

        Self {
            catalog,
            cache,
            aggregator,
        }
    }
}

async fn scripted_catalog() -> Arc<MockCatalogClient> {
    let catalog = Arc::new(MockCatalogClient::new());
    catalog
        .set_page(
            "Star Wars",
            fixtures::page(
                1,
                vec![
                    fixtures::movie_with_popularity(11, "Star Wars", 90.0),
                    fixtures::movie_with_popularity(181808, "Star Wars: The Last Jedi", 70.0),
                ],
                2,
                3,
            ),
        )
        .await;
    catalog
        .set_page(
            "Star Wars",
            fixtures::page(
                2,
                vec![
                    fixtures::movie_with_popularity(181808, "Star Wars: The Last Jedi", 70.0),
                    fixtures::movie_with_popularity(140607, "Star Wars: The Force Awakens", 60.0),
                ],
                2,
                3,
            ),
        )
        .await;
    catalog
}

#[tokio::test]
async fn test_full_session_then_offline_restart() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    {
        let h = TestHarness::open(&temp_dir, scripted_catalog().await);

        assert_eq!(
            h.aggregator.search("Star Wars").await,
            PageOutcome::Applied { added: 2 }
        );
        assert_eq!(
            h.aggregator.load_more().await,
            PageOutcome::Applied { added: 1 }
        );

        let ids: Vec<u64> = h.aggregator.results().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![11, 181808, 140607]);
        assert!(!h.aggregator.has_more_pages());
        assert_eq!(h.catalog.query_count().await, 2);

        // Write-through populated both pages under the normalized key
        assert_eq!(h.cache.get_page("star wars", 1).unwrap().len(), 2);
        assert_eq!(h.cache.get_total_pages("star wars", 2).unwrap(), Some(2));
    }

    // Restart with a failing catalog: both pages must come from the cache
    let offline = Arc::new(MockCatalogClient::new());
    offline
        .set_next_error(CatalogError::Transport("network unreachable".to_string()))
        .await;
    let h = TestHarness::open(&temp_dir, offline);

    assert_eq!(
        h.aggregator.search("STAR WARS").await,
        PageOutcome::Applied { added: 2 }
    );
    assert!(h.aggregator.has_more_pages());
    assert_eq!(
        h.aggregator.load_more().await,
        PageOutcome::Applied { added: 1 }
    );
    assert_eq!(h.aggregator.results().len(), 3);
    assert_eq!(h.catalog.query_count().await, 0);
}

#[tokio::test]
async fn test_uncached_page_fails_while_offline() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let h = TestHarness::open(&temp_dir, Arc::new(MockCatalogClient::new()));
    h.catalog
        .set_next_error(CatalogError::Transport("network unreachable".to_string()))
        .await;

    assert_eq!(h.aggregator.search("Dune").await, PageOutcome::Failed);

    let snapshot = h.aggregator.snapshot();
    assert!(snapshot.results.is_empty());
    assert_eq!(
        snapshot.last_error.as_deref(),
        Some("Transport failure: network unreachable")
    );
}

#[tokio::test]
async fn test_favorites_survive_restart() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    {
        let h = TestHarness::open(&temp_dir, scripted_catalog().await);
        h.aggregator.search("Star Wars").await;
        let results = h.aggregator.results();

        assert_eq!(h.aggregator.toggle_favorite(&results[0]), Some(true));
        assert_eq!(h.aggregator.toggle_favorite(&results[1]), Some(true));
        assert_eq!(h.aggregator.results().len(), 2);
    }

    let h = TestHarness::open(&temp_dir, Arc::new(MockCatalogClient::new()));
    let favorites = h.aggregator.list_favorites().expect("favorites readable");
    let ids: Vec<u64> = favorites.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![181808, 11]);
    assert_eq!(h.aggregator.is_favorite(11), Some(true));
    assert_eq!(h.aggregator.is_favorite(140607), Some(false));
}

#[tokio::test]
async fn test_remove_favorite_after_cache_clear_while_offline() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    {
        let h = TestHarness::open(&temp_dir, scripted_catalog().await);
        h.aggregator.search("Star Wars").await;
        let results = h.aggregator.results();
        assert_eq!(h.aggregator.toggle_favorite(&results[0]), Some(true));
        assert_eq!(h.aggregator.toggle_favorite(&results[1]), Some(true));
    }

    let offline = Arc::new(MockCatalogClient::new());
    offline
        .set_next_error(CatalogError::Transport("network unreachable".to_string()))
        .await;
    let h = TestHarness::open(&temp_dir, offline);
    h.cache.clear_pages().expect("Failed to clear pages");

    // The movie cannot be found again by searching
    assert_eq!(h.aggregator.search("Star Wars").await, PageOutcome::Failed);
    assert!(h.aggregator.results().is_empty());

    assert_eq!(h.aggregator.remove_favorite(11), Some(()));

    let favorites = h.aggregator.list_favorites().expect("favorites readable");
    let ids: Vec<u64> = favorites.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![181808]);
    assert_eq!(h.cache.stats().unwrap().favorites, 1);
}
