//! Subcommand handlers.

use anyhow::{anyhow, bail, Context, Result};
use tracing::info;

use marquee_core::{Config, Movie, MovieId, PageOutcome, SanitizedConfig};

use crate::App;

/// Poster size used in text output.
const POSTER_SIZE: &str = "w185";

/// Run a search session and fetch up to `pages` pages.
pub async fn search(app: &App, query: &str, pages: u32, json: bool) -> Result<()> {
    let aggregator = &app.aggregator;

    let mut outcome = aggregator.search(query).await;
    let mut fetched = 1;
    while fetched < pages && outcome_ok(&outcome) && aggregator.has_more_pages() {
        outcome = aggregator.load_more().await;
        fetched += 1;
    }

    if outcome == PageOutcome::Failed {
        let message = aggregator
            .last_error()
            .unwrap_or_else(|| "unknown error".to_string());
        // Keep what earlier pages produced
        if aggregator.results().is_empty() {
            bail!("Search for {:?} failed: {}", query, message);
        }
        eprintln!("warning: stopped early: {}", message);
    }

    let state = aggregator.snapshot();
    info!(
        "Search {:?}: {} results over {} page(s)",
        query,
        state.results.len(),
        state.current_page
    );

    if json {
        let out = serde_json::to_string_pretty(&state.results)
            .context("Failed to serialize results")?;
        println!("{}", out);
        return Ok(());
    }

    if state.results.is_empty() {
        println!("No results for {:?}", query);
        return Ok(());
    }

    for movie in &state.results {
        let favorite = aggregator.is_favorite(movie.id).unwrap_or(false);
        println!("{}", format_movie(app, movie, favorite));
    }
    if state.has_more_pages {
        println!("(more results available, use --pages {})", state.current_page + 1);
    }
    Ok(())
}

fn outcome_ok(outcome: &PageOutcome) -> bool {
    matches!(outcome, PageOutcome::Applied { .. })
}

/// Search for `query` until `id` shows up, then toggle it.
pub async fn toggle_favorite(app: &App, query: &str, id: MovieId, pages: u32) -> Result<()> {
    let aggregator = &app.aggregator;

    let mut outcome = aggregator.search(query).await;
    let mut fetched = 1;
    while !aggregator.snapshot().contains(id)
        && fetched < pages
        && outcome_ok(&outcome)
        && aggregator.has_more_pages()
    {
        outcome = aggregator.load_more().await;
        fetched += 1;
    }

    let movie = aggregator
        .results()
        .into_iter()
        .find(|m| m.id == id)
        .ok_or_else(|| match aggregator.last_error() {
            Some(e) => anyhow!("Movie {} not found for {:?}: {}", id, query, e),
            None => anyhow!("Movie {} not found in {} page(s) of {:?}", id, fetched, query),
        })?;

    let favorite = aggregator.toggle_favorite(&movie).ok_or_else(|| {
        anyhow!(
            "Failed to update favorites: {}",
            aggregator
                .snapshot()
                .favorites_error
                .unwrap_or_else(|| "unknown error".to_string())
        )
    })?;

    if favorite {
        println!("Added {} to favorites", movie.title);
    } else {
        println!("Removed {} from favorites", movie.title);
    }
    Ok(())
}

/// Remove a favorite by ID. Works offline and with an empty page cache.
pub fn remove_favorite(app: &App, id: MovieId) -> Result<()> {
    let aggregator = &app.aggregator;
    let was_favorite = aggregator.is_favorite(id).unwrap_or(true);

    aggregator.remove_favorite(id).ok_or_else(|| {
        anyhow!(
            "Failed to update favorites: {}",
            aggregator
                .snapshot()
                .favorites_error
                .unwrap_or_else(|| "unknown error".to_string())
        )
    })?;

    if was_favorite {
        println!("Removed {} from favorites", id);
    } else {
        println!("{} is not a favorite", id);
    }
    Ok(())
}

/// Print favorites, most recent first.
pub fn list_favorites(app: &App) -> Result<()> {
    let favorites = app.aggregator.list_favorites().ok_or_else(|| {
        anyhow!(
            "Failed to read favorites: {}",
            app.aggregator
                .snapshot()
                .favorites_error
                .unwrap_or_else(|| "unknown error".to_string())
        )
    })?;

    if favorites.is_empty() {
        println!("No favorites yet");
        return Ok(());
    }
    for movie in &favorites {
        println!("{}", format_movie(app, movie, true));
    }
    Ok(())
}

pub fn cache_stats(app: &App) -> Result<()> {
    let stats = app.cache.stats().context("Failed to read cache stats")?;
    println!("cached pages:  {}", stats.cached_pages);
    println!("cached movies: {}", stats.cached_movies);
    println!("favorites:     {}", stats.favorites);
    Ok(())
}

pub fn clear_cache(app: &App) -> Result<()> {
    app.cache.clear_pages().context("Failed to clear cache")?;
    println!("Cached pages cleared");
    Ok(())
}

pub fn show_config(config: &Config) -> Result<()> {
    let sanitized = SanitizedConfig::from(config);
    let out = serde_json::to_string_pretty(&sanitized).context("Failed to serialize config")?;
    println!("{}", out);
    Ok(())
}

fn format_movie(app: &App, movie: &Movie, favorite: bool) -> String {
    let marker = if favorite { '*' } else { ' ' };
    let year = movie
        .release_year()
        .map(|y| format!(" ({})", y))
        .unwrap_or_default();
    let poster = movie
        .poster_path
        .as_deref()
        .map(|p| format!("  {}", app.catalog.image_url(p, POSTER_SIZE)))
        .unwrap_or_default();

    format!(
        "{} {:>8}  {}{}  [{:.1}/10, {} votes]{}",
        marker, movie.id, movie.title, year, movie.vote_average, movie.vote_count, poster
    )
}
