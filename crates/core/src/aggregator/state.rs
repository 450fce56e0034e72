//! Session state for one logical search.

use std::collections::HashSet;

use crate::movie::{Movie, MovieId, SearchResultPage};

/// Lifecycle phase of a search session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// No query, or the query was cleared.
    #[default]
    Idle,
    /// A page fetch is outstanding.
    Loading,
    /// The last fetch succeeded.
    Loaded,
    /// The last fetch failed; earlier results are kept.
    Failed,
}

/// Observable state of the current search session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Query the session is for, `None` when idle.
    pub query: Option<String>,
    /// Last page successfully applied (0 before the first page lands).
    pub current_page: u32,
    /// Total pages reported by the last applied page, if known.
    pub total_pages: Option<u32>,
    /// Whether `load_more` may fetch another page.
    pub has_more_pages: bool,
    /// Accumulated movies in arrival order, unique by ID.
    pub results: Vec<Movie>,
    pub is_loading: bool,
    /// Message of the last search failure, cleared by the next success.
    pub last_error: Option<String>,
    /// Message of the last favorites failure.
    pub favorites_error: Option<String>,
    pub phase: SessionPhase,
    seen_ids: HashSet<MovieId>,
}

impl SessionState {
    /// Whether a movie is already part of the accumulated results.
    pub fn contains(&self, id: MovieId) -> bool {
        self.seen_ids.contains(&id)
    }

    /// Reset for a new query and mark the first page as loading.
    pub(crate) fn begin(&mut self, query: String) {
        let favorites_error = self.favorites_error.take();
        *self = SessionState {
            query: Some(query),
            is_loading: true,
            phase: SessionPhase::Loading,
            favorites_error,
            ..Default::default()
        };
    }

    /// Drop all session data and return to idle.
    pub(crate) fn clear(&mut self) {
        let favorites_error = self.favorites_error.take();
        *self = SessionState {
            favorites_error,
            ..Default::default()
        };
    }

    /// Mark the next page as loading.
    pub(crate) fn begin_page(&mut self) {
        self.is_loading = true;
        self.phase = SessionPhase::Loading;
    }

    /// Merge a fetched page, skipping movies already seen.
    ///
    /// Returns the number of movies appended.
    pub(crate) fn merge(&mut self, requested_page: u32, page: SearchResultPage) -> usize {
        let has_more = page.has_more();
        let before = self.results.len();

        for movie in page.results {
            if self.seen_ids.insert(movie.id) {
                self.results.push(movie);
            }
        }

        self.current_page = requested_page;
        self.total_pages = page.total_pages;
        self.has_more_pages = has_more;
        self.is_loading = false;
        self.last_error = None;
        self.phase = SessionPhase::Loaded;

        self.results.len() - before
    }

    /// Record a failed fetch. Results and pagination are left as they were.
    pub(crate) fn fail(&mut self, message: String) {
        self.is_loading = false;
        self.last_error = Some(message);
        self.phase = SessionPhase::Failed;
    }
}
