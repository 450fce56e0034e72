//! In-memory result cache for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::cache::{CacheError, CacheStats, ResultCache};
use crate::movie::{Movie, MovieId};

#[derive(Debug, Default)]
struct Inner {
    pages: HashMap<(String, u32), Vec<Movie>>,
    totals: HashMap<(String, u32), u32>,
    /// Most recently added first.
    favorites: Vec<Movie>,
}

/// In-memory implementation of the ResultCache trait.
///
/// Follows the same contract as the SQLite cache, except that pages keep
/// insertion order instead of being sorted by popularity. Supports failure
/// injection for reads and writes, and hiding the next N page reads to
/// simulate a page appearing between two lookups.
#[derive(Debug, Default)]
pub struct MockResultCache {
    inner: Mutex<Inner>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    hidden_reads: AtomicUsize,
}

impl MockResultCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every read fail with a persistence error.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every write fail with a persistence error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make the next `count` page reads come back empty.
    pub fn set_hidden_reads(&self, count: usize) {
        self.hidden_reads.store(count, Ordering::SeqCst);
    }

    /// Store a page without recording a total page count.
    pub fn put_page_without_total(&self, movies: &[Movie], normalized_query: &str, page: u32) {
        let mut inner = self.lock();
        let entry = inner
            .pages
            .entry((normalized_query.to_string(), page))
            .or_default();
        upsert(entry, movies);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_read(&self) -> Result<(), CacheError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(CacheError::Persistence("injected read failure".to_string()));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), CacheError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::Persistence("injected write failure".to_string()));
        }
        Ok(())
    }
}

fn upsert(entry: &mut Vec<Movie>, movies: &[Movie]) {
    for movie in movies {
        match entry.iter_mut().find(|m| m.id == movie.id) {
            Some(existing) => *existing = movie.clone(),
            None => entry.push(movie.clone()),
        }
    }
}

impl ResultCache for MockResultCache {
    fn get_page(&self, normalized_query: &str, page: u32) -> Result<Vec<Movie>, CacheError> {
        self.check_read()?;

        let hidden = self
            .hidden_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if hidden {
            return Ok(Vec::new());
        }

        Ok(self
            .lock()
            .pages
            .get(&(normalized_query.to_string(), page))
            .cloned()
            .unwrap_or_default())
    }

    fn get_total_pages(
        &self,
        normalized_query: &str,
        page: u32,
    ) -> Result<Option<u32>, CacheError> {
        self.check_read()?;
        Ok(self
            .lock()
            .totals
            .get(&(normalized_query.to_string(), page))
            .copied())
    }

    fn put_page(
        &self,
        movies: &[Movie],
        normalized_query: &str,
        page: u32,
        total_pages: u32,
    ) -> Result<(), CacheError> {
        self.check_write()?;
        let key = (normalized_query.to_string(), page);
        let mut inner = self.lock();
        upsert(inner.pages.entry(key.clone()).or_default(), movies);
        inner.totals.insert(key, total_pages);
        Ok(())
    }

    fn add_favorite(&self, movie: &Movie) -> Result<(), CacheError> {
        self.check_write()?;
        let mut inner = self.lock();
        if !inner.favorites.contains(movie) {
            inner.favorites.insert(0, movie.clone());
        }
        Ok(())
    }

    fn remove_favorite(&self, id: MovieId) -> Result<(), CacheError> {
        self.check_write()?;
        self.lock().favorites.retain(|m| m.id != id);
        Ok(())
    }

    fn is_favorite(&self, id: MovieId) -> Result<bool, CacheError> {
        self.check_read()?;
        Ok(self.lock().favorites.iter().any(|m| m.id == id))
    }

    fn list_favorites(&self) -> Result<Vec<Movie>, CacheError> {
        self.check_read()?;
        Ok(self.lock().favorites.clone())
    }

    fn clear_pages(&self) -> Result<(), CacheError> {
        self.check_write()?;
        let mut inner = self.lock();
        inner.pages.clear();
        inner.totals.clear();
        Ok(())
    }

    fn stats(&self) -> Result<CacheStats, CacheError> {
        self.check_read()?;
        let inner = self.lock();
        let mut movie_ids: Vec<MovieId> = inner
            .pages
            .values()
            .flatten()
            .chain(inner.favorites.iter())
            .map(|m| m.id)
            .collect();
        movie_ids.sort_unstable();
        movie_ids.dedup();

        Ok(CacheStats {
            cached_pages: inner.pages.len() as u64,
            cached_movies: movie_ids.len() as u64,
            favorites: inner.favorites.len() as u64,
        })
    }
}
