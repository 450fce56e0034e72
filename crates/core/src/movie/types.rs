//! Movie and result page types.

use std::hash::{Hash, Hasher};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Catalog-wide movie identifier.
pub type MovieId = u64;

/// A movie as returned by the catalog.
///
/// Identity is the `id` alone: two movies with the same id compare equal
/// and hash identically no matter what the other fields contain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    /// Catalog movie ID.
    pub id: MovieId,
    /// Movie title.
    pub title: String,
    /// Synopsis, possibly empty.
    #[serde(default)]
    pub overview: String,
    /// Poster path (relative to the image base URL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    /// Backdrop path (relative to the image base URL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop_path: Option<String>,
    /// Release date as sent by the catalog (normally YYYY-MM-DD).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    /// Average vote (0-10).
    #[serde(default)]
    pub vote_average: f64,
    /// Number of votes.
    #[serde(default)]
    pub vote_count: u32,
    /// Catalog popularity score.
    #[serde(default)]
    pub popularity: f64,
}

impl Movie {
    /// Parse the release date, if it is a well-formed YYYY-MM-DD string.
    pub fn parsed_release_date(&self) -> Option<NaiveDate> {
        self.release_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
    }

    /// Get the release year from the release date.
    pub fn release_year(&self) -> Option<i32> {
        self.parsed_release_date().map(|d| d.year())
    }
}

impl PartialEq for Movie {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Movie {}

impl Hash for Movie {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// One page of search results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResultPage {
    /// 1-based page number.
    pub page: u32,
    /// Movies in server order.
    pub results: Vec<Movie>,
    /// Total number of pages, `None` when unknown (e.g. a cache hit
    /// without a recorded total).
    pub total_pages: Option<u32>,
    /// Total number of results across all pages.
    pub total_results: u32,
}

impl SearchResultPage {
    /// Whether pages after this one are expected to exist.
    ///
    /// With an unknown total this stays `true` until an empty page is seen.
    pub fn has_more(&self) -> bool {
        match self.total_pages {
            Some(total) => self.page < total,
            None => !self.results.is_empty(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Normalize a search string for use as a cache key.
///
/// Only case is folded; whitespace is preserved as typed.
pub fn normalize_query(query: &str) -> String {
    query.to_lowercase()
}
