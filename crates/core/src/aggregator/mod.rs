//! Incremental result aggregation for one search session.
//!
//! The aggregator drives the search orchestrator page by page, merges the
//! pages in request order with ID-based deduplication, and publishes the
//! session state through a `watch` channel for a consumer (usually a UI)
//! to observe.
//!
//! Starting a new search supersedes any fetch still in flight. Superseded
//! fetches are not aborted; each fetch carries the generation it was issued
//! under and its result is dropped if the generation has moved on.

mod state;

pub use state::{SessionPhase, SessionState};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::favorites::FavoritesManager;
use crate::movie::{Movie, MovieId, SearchResultPage};
use crate::search::{SearchError, SearchOrchestrator};

/// Aggregator tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Quiet period before a `set_query` value triggers a search.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    500
}

impl AggregatorConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// What happened to a `search` or `load_more` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// The page was merged; `added` new movies were appended.
    Applied { added: usize },
    /// Nothing was requested (already loading, no more pages, no query).
    Skipped,
    /// A newer search started before the page arrived; it was discarded.
    Superseded,
    /// The fetch failed; see `last_error`.
    Failed,
}

/// Accumulates paginated search results for one session at a time.
pub struct ResultAggregator {
    orchestrator: Arc<SearchOrchestrator>,
    favorites: Arc<FavoritesManager>,
    config: AggregatorConfig,
    state: watch::Sender<SessionState>,
    generation: AtomicU64,
    debounce_token: AtomicU64,
}

impl ResultAggregator {
    pub fn new(
        orchestrator: Arc<SearchOrchestrator>,
        favorites: Arc<FavoritesManager>,
        config: AggregatorConfig,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            orchestrator,
            favorites,
            config,
            state,
            generation: AtomicU64::new(0),
            debounce_token: AtomicU64::new(0),
        }
    }

    // =========================================================================
    // Observation
    // =========================================================================

    /// Subscribe to session state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Copy of the current session state.
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn results(&self) -> Vec<Movie> {
        self.state.borrow().results.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    pub fn has_more_pages(&self) -> bool {
        self.state.borrow().has_more_pages
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.borrow().last_error.clone()
    }

    // =========================================================================
    // Searching
    // =========================================================================

    /// Debounced query input.
    ///
    /// The search runs once the input has been quiet for the configured
    /// interval, and only if the value differs from the current session's
    /// query. An empty string clears the session immediately.
    pub fn set_query(self: &Arc<Self>, text: impl Into<String>) {
        let text = text.into();
        let token = self.debounce_token.fetch_add(1, Ordering::SeqCst) + 1;

        if text.is_empty() {
            self.clear();
            return;
        }

        let this = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(this.config.debounce()).await;

            if this.debounce_token.load(Ordering::SeqCst) != token {
                return;
            }
            let unchanged = this.state.borrow().query.as_deref() == Some(text.as_str());
            if unchanged {
                debug!("Query '{}' unchanged, not searching again", text);
                return;
            }
            this.search(&text).await;
        });
    }

    /// Start a new session for `query` and fetch its first page.
    ///
    /// Any fetch still in flight for the previous session is superseded.
    pub async fn search(&self, query: &str) -> PageOutcome {
        if query.is_empty() {
            self.clear();
            return PageOutcome::Skipped;
        }

        let mut generation = 0;
        self.state.send_modify(|s| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            s.begin(query.to_string());
        });
        info!("Starting search for '{}' (generation {})", query, generation);

        let result = self.orchestrator.fetch_page(query, 1).await;
        self.apply(generation, 1, result)
    }

    /// Fetch and merge the next page of the current session.
    ///
    /// Skipped while a fetch is outstanding, when there are no more pages,
    /// or when there is no active query.
    pub async fn load_more(&self) -> PageOutcome {
        let mut request = None;
        self.state.send_if_modified(|s| {
            if s.is_loading || !s.has_more_pages {
                return false;
            }
            let Some(query) = s.query.clone() else {
                return false;
            };
            s.begin_page();
            request = Some((
                query,
                s.current_page + 1,
                self.generation.load(Ordering::SeqCst),
            ));
            true
        });

        let Some((query, page, generation)) = request else {
            return PageOutcome::Skipped;
        };
        debug!("Loading page {} of '{}'", page, query);

        let result = self.orchestrator.fetch_page(&query, page).await;
        self.apply(generation, page, result)
    }

    /// End the session and supersede any fetch in flight.
    pub fn clear(&self) {
        self.state.send_modify(|s| {
            self.generation.fetch_add(1, Ordering::SeqCst);
            s.clear();
        });
        debug!("Search session cleared");
    }

    fn apply(
        &self,
        generation: u64,
        requested_page: u32,
        result: Result<SearchResultPage, SearchError>,
    ) -> PageOutcome {
        let mut outcome = PageOutcome::Superseded;

        self.state.send_if_modified(|s| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            match result {
                Ok(page) => {
                    let added = s.merge(requested_page, page);
                    debug!(
                        "Merged page {} ({} new, {} total)",
                        requested_page,
                        added,
                        s.results.len()
                    );
                    outcome = PageOutcome::Applied { added };
                }
                Err(e) => {
                    warn!("Search page {} failed: {}", requested_page, e);
                    s.fail(e.to_string());
                    outcome = PageOutcome::Failed;
                }
            }
            true
        });

        if outcome == PageOutcome::Superseded {
            debug!(
                "Discarding page {} from superseded generation {}",
                requested_page, generation
            );
        }
        outcome
    }

    // =========================================================================
    // Favorites
    // =========================================================================

    /// Favorite status of a movie, `None` if it could not be determined.
    pub fn is_favorite(&self, id: MovieId) -> Option<bool> {
        match self.favorites.is_favorite(id) {
            Ok(favorite) => Some(favorite),
            Err(e) => {
                self.set_favorites_error(Some(e.to_string()));
                None
            }
        }
    }

    /// Favorites, most recently added first; `None` if they could not be read.
    pub fn list_favorites(&self) -> Option<Vec<Movie>> {
        match self.favorites.list_favorites() {
            Ok(movies) => Some(movies),
            Err(e) => {
                self.set_favorites_error(Some(e.to_string()));
                None
            }
        }
    }

    /// Toggle a movie's favorite status and return the new status.
    ///
    /// The movie stays in the accumulated results either way.
    pub fn toggle_favorite(&self, movie: &Movie) -> Option<bool> {
        match self.favorites.toggle_favorite(movie) {
            Ok(favorite) => {
                self.set_favorites_error(None);
                Some(favorite)
            }
            Err(e) => {
                warn!("Failed to toggle favorite {}: {}", movie.id, e);
                self.set_favorites_error(Some(e.to_string()));
                None
            }
        }
    }

    /// Remove a favorite by ID without needing the movie itself.
    ///
    /// Returns `None` if the removal could not be stored.
    pub fn remove_favorite(&self, id: MovieId) -> Option<()> {
        match self.favorites.remove_favorite(id) {
            Ok(()) => {
                self.set_favorites_error(None);
                Some(())
            }
            Err(e) => {
                warn!("Failed to remove favorite {}: {}", id, e);
                self.set_favorites_error(Some(e.to_string()));
                None
            }
        }
    }

    fn set_favorites_error(&self, error: Option<String>) {
        self.state.send_if_modified(|s| {
            if s.favorites_error == error {
                return false;
            }
            s.favorites_error = error;
            true
        });
    }
}
