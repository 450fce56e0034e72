//! TMDB (The Movie Database) search client.
//!
//! TMDB requires an API key, passed as the `api_key` query parameter.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{CatalogClient, CatalogError};
use crate::movie::{Movie, SearchResultPage};

const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
const DEFAULT_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// TMDB API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbConfig {
    /// TMDB API key (required).
    pub api_key: String,
    /// Base URL (default: https://api.themoviedb.org/3).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Image base URL for posters/backdrops.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base_url: Option<String>,
    /// Request timeout in seconds (default: 30).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// TMDB API client.
pub struct TmdbClient {
    client: Client,
    search_url: Url,
    api_key: String,
    image_base_url: String,
}

impl TmdbClient {
    /// Create a new TMDB client.
    pub fn new(config: TmdbConfig) -> Result<Self, CatalogError> {
        if config.api_key.is_empty() {
            return Err(CatalogError::InvalidRequest(
                "TMDB API key is required".to_string(),
            ));
        }

        let timeout = Duration::from_secs(config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
        let client = Client::builder().timeout(timeout).build()?;

        let base_url = config
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let search_url = Url::parse(&format!("{}/search/movie", base_url.trim_end_matches('/')))
            .map_err(|e| {
                CatalogError::InvalidRequest(format!("Invalid base URL '{}': {}", base_url, e))
            })?;

        let image_base_url = config
            .image_base_url
            .unwrap_or_else(|| DEFAULT_IMAGE_BASE_URL.to_string());

        Ok(Self {
            client,
            search_url,
            api_key: config.api_key,
            image_base_url: image_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build a full image URL from a relative poster/backdrop path.
    ///
    /// `size` is a TMDB size bucket such as `w342` or `original`.
    pub fn image_url(&self, path: &str, size: &str) -> String {
        if path.starts_with('/') {
            format!("{}/{}{}", self.image_base_url, size, path)
        } else {
            format!("{}/{}/{}", self.image_base_url, size, path)
        }
    }
}

#[async_trait]
impl CatalogClient for TmdbClient {
    async fn search_movies(
        &self,
        query: &str,
        page: u32,
    ) -> Result<SearchResultPage, CatalogError> {
        debug!("TMDB movie search: query='{}', page={}", query, page);

        let page_param = page.to_string();
        let response = self
            .client
            .get(self.search_url.clone())
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("query", query),
                ("page", page_param.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == 401 {
            return Err(CatalogError::Unauthorized);
        }
        if !status.is_success() {
            return Err(CatalogError::Server {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        parse_search_response(&body)
    }
}

/// Decode a `/search/movie` response body.
fn parse_search_response(body: &[u8]) -> Result<SearchResultPage, CatalogError> {
    let response: TmdbSearchResponse = serde_json::from_slice(body).map_err(|e| {
        CatalogError::Decoding(format!("Failed to parse movie search response: {}", e))
    })?;

    Ok(response.into())
}

// ============================================================================
// TMDB API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse {
    page: u32,
    #[serde(default)]
    results: Vec<TmdbMovieResult>,
    total_pages: u32,
    total_results: u32,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieResult {
    id: u64,
    title: String,
    overview: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    release_date: Option<String>,
    vote_average: Option<f64>,
    vote_count: Option<u32>,
    popularity: Option<f64>,
}

impl From<TmdbMovieResult> for Movie {
    fn from(r: TmdbMovieResult) -> Self {
        Self {
            id: r.id,
            title: r.title,
            overview: r.overview.unwrap_or_default(),
            poster_path: r.poster_path,
            backdrop_path: r.backdrop_path,
            // TMDB sends "" for unknown dates
            release_date: r.release_date.filter(|d| !d.is_empty()),
            vote_average: r.vote_average.unwrap_or_default(),
            vote_count: r.vote_count.unwrap_or_default(),
            popularity: r.popularity.unwrap_or_default(),
        }
    }
}

impl From<TmdbSearchResponse> for SearchResultPage {
    fn from(r: TmdbSearchResponse) -> Self {
        Self {
            page: r.page,
            results: r.results.into_iter().map(Movie::from).collect(),
            total_pages: Some(r.total_pages),
            total_results: r.total_results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TmdbConfig {
        TmdbConfig {
            api_key: "key".to_string(),
            base_url: None,
            image_base_url: None,
            timeout_secs: Some(5),
        }
    }

    #[test]
    fn test_parse_search_response() {
        let body = br#"{
            "page": 1,
            "results": [
                {
                    "id": 27205,
                    "title": "Inception",
                    "overview": "Cobb, a skilled thief...",
                    "poster_path": "/oYuLEt3zVCKq57qu2F8dT7NIa6f.jpg",
                    "backdrop_path": null,
                    "release_date": "2010-07-15",
                    "vote_average": 8.369,
                    "vote_count": 36000,
                    "popularity": 110.5
                },
                {
                    "id": 64956,
                    "title": "Inception: The Cobol Job",
                    "overview": "",
                    "poster_path": null,
                    "release_date": "",
                    "vote_average": 7.2,
                    "vote_count": 300,
                    "popularity": 8.1
                }
            ],
            "total_pages": 3,
            "total_results": 45
        }"#;

        let page = parse_search_response(body).unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, Some(3));
        assert_eq!(page.total_results, 45);
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.results[0].title, "Inception");
        assert_eq!(page.results[0].release_year(), Some(2010));
        assert!(page.results[1].release_date.is_none());
        assert!(page.results[1].poster_path.is_none());
    }

    #[test]
    fn test_parse_undecodable_body() {
        let result = parse_search_response(b"<html>Bad Gateway</html>");
        assert!(matches!(result, Err(CatalogError::Decoding(_))));

        let result = parse_search_response(br#"{"results": []}"#);
        assert!(matches!(result, Err(CatalogError::Decoding(_))));
    }

    #[test]
    fn test_new_requires_api_key() {
        let mut cfg = config();
        cfg.api_key = String::new();
        assert!(matches!(
            TmdbClient::new(cfg),
            Err(CatalogError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_new_rejects_bad_base_url() {
        let mut cfg = config();
        cfg.base_url = Some("not a url".to_string());
        assert!(matches!(
            TmdbClient::new(cfg),
            Err(CatalogError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_image_url() {
        let client = TmdbClient::new(config()).unwrap();
        assert_eq!(
            client.image_url("/poster.jpg", "w342"),
            "https://image.tmdb.org/t/p/w342/poster.jpg"
        );
        assert_eq!(
            client.image_url("poster.jpg", "original"),
            "https://image.tmdb.org/t/p/original/poster.jpg"
        );
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_failure() {
        let mut cfg = config();
        // Port 9 (discard) on localhost is not expected to accept HTTP
        cfg.base_url = Some("http://127.0.0.1:9".to_string());
        cfg.timeout_secs = Some(2);
        let client = TmdbClient::new(cfg).unwrap();

        let result = client.search_movies("inception", 1).await;
        assert!(matches!(result, Err(CatalogError::Transport(_))));
    }
}
