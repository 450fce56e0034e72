//! SQLite-backed result cache implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::{CacheError, CacheStats, ResultCache};
use crate::movie::{Movie, MovieId};

/// Columns selected by every movie query, in `row_to_movie` order.
const MOVIE_COLUMNS: &str = "m.id, m.title, m.overview, m.poster_path, m.backdrop_path,
     m.release_date, m.vote_average, m.vote_count, m.popularity";

/// SQLite-backed result cache.
pub struct SqliteResultCache {
    conn: Mutex<Connection>,
}

impl SqliteResultCache {
    /// Open (or create) the cache database at `path`.
    pub fn new(path: &Path) -> Result<Self, CacheError> {
        let conn = Connection::open(path)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory cache (useful for testing).
    pub fn in_memory() -> Result<Self, CacheError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), CacheError> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            -- One row per movie, shared by pages and favorites
            CREATE TABLE IF NOT EXISTS movies (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                overview TEXT NOT NULL DEFAULT '',
                poster_path TEXT,
                backdrop_path TEXT,
                release_date TEXT,
                vote_average REAL NOT NULL DEFAULT 0,
                vote_count INTEGER NOT NULL DEFAULT 0,
                popularity REAL NOT NULL DEFAULT 0,
                updated_at TEXT NOT NULL
            );

            -- Membership of movies in a (query, page) key
            CREATE TABLE IF NOT EXISTS page_entries (
                normalized_query TEXT NOT NULL,
                page INTEGER NOT NULL,
                movie_id INTEGER NOT NULL REFERENCES movies(id) ON DELETE CASCADE,
                position INTEGER NOT NULL,
                cached_at TEXT NOT NULL,
                PRIMARY KEY (normalized_query, page, movie_id)
            );

            -- Pagination metadata per (query, page) key
            CREATE TABLE IF NOT EXISTS page_totals (
                normalized_query TEXT NOT NULL,
                page INTEGER NOT NULL,
                total_pages INTEGER NOT NULL,
                cached_at TEXT NOT NULL,
                PRIMARY KEY (normalized_query, page)
            );

            CREATE TABLE IF NOT EXISTS favorites (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                movie_id INTEGER NOT NULL UNIQUE REFERENCES movies(id),
                added_at TEXT NOT NULL
            );
            "#,
        )?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, CacheError> {
        self.conn
            .lock()
            .map_err(|_| CacheError::Persistence("cache connection lock poisoned".to_string()))
    }

    fn upsert_movie(conn: &Connection, movie: &Movie, now: &str) -> Result<(), CacheError> {
        conn.execute(
            "INSERT INTO movies (id, title, overview, poster_path, backdrop_path, release_date,
                                 vote_average, vote_count, popularity, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                overview = excluded.overview,
                poster_path = excluded.poster_path,
                backdrop_path = excluded.backdrop_path,
                release_date = excluded.release_date,
                vote_average = excluded.vote_average,
                vote_count = excluded.vote_count,
                popularity = excluded.popularity,
                updated_at = excluded.updated_at",
            params![
                movie.id as i64,
                &movie.title,
                &movie.overview,
                &movie.poster_path,
                &movie.backdrop_path,
                &movie.release_date,
                movie.vote_average,
                movie.vote_count as i64,
                movie.popularity,
                now,
            ],
        )?;
        Ok(())
    }

    fn row_to_movie(row: &rusqlite::Row) -> rusqlite::Result<Movie> {
        let id: i64 = row.get(0)?;
        let vote_count: i64 = row.get(7)?;
        Ok(Movie {
            id: id as MovieId,
            title: row.get(1)?,
            overview: row.get(2)?,
            poster_path: row.get(3)?,
            backdrop_path: row.get(4)?,
            release_date: row.get(5)?,
            vote_average: row.get(6)?,
            vote_count: vote_count.max(0) as u32,
            popularity: row.get(8)?,
        })
    }
}

impl ResultCache for SqliteResultCache {
    fn get_page(&self, normalized_query: &str, page: u32) -> Result<Vec<Movie>, CacheError> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {}
             FROM page_entries pe
             JOIN movies m ON m.id = pe.movie_id
             WHERE pe.normalized_query = ? AND pe.page = ?
             ORDER BY m.popularity DESC, pe.position ASC",
            MOVIE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![normalized_query, page], Self::row_to_movie)?;

        let mut movies = Vec::new();
        for row in rows {
            movies.push(row?);
        }
        Ok(movies)
    }

    fn get_total_pages(
        &self,
        normalized_query: &str,
        page: u32,
    ) -> Result<Option<u32>, CacheError> {
        let conn = self.conn()?;
        let total: Option<u32> = conn
            .query_row(
                "SELECT total_pages FROM page_totals WHERE normalized_query = ? AND page = ?",
                params![normalized_query, page],
                |row| row.get(0),
            )
            .optional()?;
        Ok(total)
    }

    fn put_page(
        &self,
        movies: &[Movie],
        normalized_query: &str,
        page: u32,
        total_pages: u32,
    ) -> Result<(), CacheError> {
        let mut conn = self.conn()?;
        let now = Utc::now().to_rfc3339();
        let tx = conn.transaction()?;

        for (position, movie) in movies.iter().enumerate() {
            Self::upsert_movie(&tx, movie, &now)?;
            tx.execute(
                "INSERT INTO page_entries (normalized_query, page, movie_id, position, cached_at)
                 VALUES (?, ?, ?, ?, ?)
                 ON CONFLICT(normalized_query, page, movie_id) DO UPDATE SET
                    position = excluded.position,
                    cached_at = excluded.cached_at",
                params![
                    normalized_query,
                    page,
                    movie.id as i64,
                    position as i64,
                    &now
                ],
            )?;
        }

        tx.execute(
            "INSERT INTO page_totals (normalized_query, page, total_pages, cached_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(normalized_query, page) DO UPDATE SET
                total_pages = excluded.total_pages,
                cached_at = excluded.cached_at",
            params![normalized_query, page, total_pages, &now],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn add_favorite(&self, movie: &Movie) -> Result<(), CacheError> {
        let mut conn = self.conn()?;
        let now = Utc::now().to_rfc3339();
        let tx = conn.transaction()?;

        Self::upsert_movie(&tx, movie, &now)?;
        // OR IGNORE keeps the original added_at for repeated adds
        tx.execute(
            "INSERT OR IGNORE INTO favorites (movie_id, added_at) VALUES (?, ?)",
            params![movie.id as i64, &now],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn remove_favorite(&self, id: MovieId) -> Result<(), CacheError> {
        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM favorites WHERE movie_id = ?",
            params![id as i64],
        )?;
        Ok(())
    }

    fn is_favorite(&self, id: MovieId) -> Result<bool, CacheError> {
        let conn = self.conn()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM favorites WHERE movie_id = ?",
                params![id as i64],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn list_favorites(&self) -> Result<Vec<Movie>, CacheError> {
        let conn = self.conn()?;
        // seq grows with every insert, so it orders by time of addition
        let sql = format!(
            "SELECT {}
             FROM favorites f
             JOIN movies m ON m.id = f.movie_id
             ORDER BY f.seq DESC",
            MOVIE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], Self::row_to_movie)?;

        let mut movies = Vec::new();
        for row in rows {
            movies.push(row?);
        }
        Ok(movies)
    }

    fn clear_pages(&self) -> Result<(), CacheError> {
        let conn = self.conn()?;
        conn.execute_batch(
            "DELETE FROM page_entries;
             DELETE FROM page_totals;
             DELETE FROM movies WHERE id NOT IN (SELECT movie_id FROM favorites);",
        )?;
        Ok(())
    }

    fn stats(&self) -> Result<CacheStats, CacheError> {
        let conn = self.conn()?;

        let cached_pages: i64 = conn.query_row(
            "SELECT COUNT(*) FROM (SELECT DISTINCT normalized_query, page FROM page_totals)",
            [],
            |row| row.get(0),
        )?;
        let cached_movies: i64 =
            conn.query_row("SELECT COUNT(*) FROM movies", [], |row| row.get(0))?;
        let favorites: i64 =
            conn.query_row("SELECT COUNT(*) FROM favorites", [], |row| row.get(0))?;

        Ok(CacheStats {
            cached_pages: cached_pages as u64,
            cached_movies: cached_movies as u64,
            favorites: favorites as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    fn create_test_cache() -> SqliteResultCache {
        SqliteResultCache::in_memory().unwrap()
    }

    #[test]
    fn test_missing_page_is_empty() {
        let cache = create_test_cache();
        assert!(cache.get_page("inception", 1).unwrap().is_empty());
        assert_eq!(cache.get_total_pages("inception", 1).unwrap(), None);
    }

    #[test]
    fn test_put_and_get_page() {
        let cache = create_test_cache();
        let movies = vec![
            fixtures::movie_with_popularity(1, "Inception", 50.0),
            fixtures::movie_with_popularity(2, "Inception 2", 80.0),
        ];

        cache.put_page(&movies, "inception", 1, 4).unwrap();

        let stored = cache.get_page("inception", 1).unwrap();
        assert_eq!(stored.len(), 2);
        // Ordered by descending popularity
        assert_eq!(stored[0].id, 2);
        assert_eq!(stored[1].id, 1);
        assert_eq!(stored[1].title, "Inception");
        assert_eq!(cache.get_total_pages("inception", 1).unwrap(), Some(4));

        // Other keys are untouched
        assert!(cache.get_page("inception", 2).unwrap().is_empty());
        assert!(cache.get_page("Inception", 1).unwrap().is_empty());
    }

    #[test]
    fn test_put_page_upserts_by_id() {
        let cache = create_test_cache();
        cache
            .put_page(
                &[
                    fixtures::movie_with_popularity(1, "Old title", 10.0),
                    fixtures::movie_with_popularity(2, "B", 5.0),
                ],
                "q",
                1,
                3,
            )
            .unwrap();
        cache
            .put_page(
                &[
                    fixtures::movie_with_popularity(1, "New title", 10.0),
                    fixtures::movie_with_popularity(3, "C", 1.0),
                ],
                "q",
                1,
                5,
            )
            .unwrap();

        let stored = cache.get_page("q", 1).unwrap();
        let ids: Vec<MovieId> = stored.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(stored[0].title, "New title");
        assert_eq!(cache.get_total_pages("q", 1).unwrap(), Some(5));
    }

    #[test]
    fn test_movie_fields_round_trip() {
        let cache = create_test_cache();
        let mut movie = fixtures::movie(42, "Answer");
        movie.poster_path = None;
        movie.release_date = Some("not a date".to_string());
        cache.put_page(&[movie.clone()], "answer", 1, 1).unwrap();

        let stored = &cache.get_page("answer", 1).unwrap()[0];
        assert_eq!(stored.poster_path, None);
        assert_eq!(stored.backdrop_path, movie.backdrop_path);
        assert_eq!(stored.release_date.as_deref(), Some("not a date"));
        assert_eq!(stored.vote_count, movie.vote_count);
        assert_eq!(stored.overview, movie.overview);
    }

    #[test]
    fn test_favorites_add_is_idempotent() {
        let cache = create_test_cache();
        let movie = fixtures::movie(7, "Se7en");

        cache.add_favorite(&movie).unwrap();
        cache.add_favorite(&movie).unwrap();

        assert!(cache.is_favorite(7).unwrap());
        assert_eq!(cache.list_favorites().unwrap().len(), 1);
    }

    #[test]
    fn test_favorites_remove_absent_is_noop() {
        let cache = create_test_cache();
        cache.remove_favorite(999).unwrap();
        assert!(!cache.is_favorite(999).unwrap());
    }

    #[test]
    fn test_list_favorites_most_recent_first() {
        let cache = create_test_cache();
        cache.add_favorite(&fixtures::movie(1, "First")).unwrap();
        cache.add_favorite(&fixtures::movie(2, "Second")).unwrap();
        cache.add_favorite(&fixtures::movie(3, "Third")).unwrap();
        cache.remove_favorite(2).unwrap();
        cache.add_favorite(&fixtures::movie(2, "Second again")).unwrap();

        let ids: Vec<MovieId> = cache.list_favorites().unwrap().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_clear_pages_keeps_favorites() {
        let cache = create_test_cache();
        cache
            .put_page(
                &[fixtures::movie(1, "A"), fixtures::movie(2, "B")],
                "q",
                1,
                1,
            )
            .unwrap();
        cache.add_favorite(&fixtures::movie(1, "A")).unwrap();

        cache.clear_pages().unwrap();

        assert!(cache.get_page("q", 1).unwrap().is_empty());
        assert_eq!(cache.get_total_pages("q", 1).unwrap(), None);
        let favorites = cache.list_favorites().unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].id, 1);

        let stats = cache.stats().unwrap();
        assert_eq!(stats.cached_pages, 0);
        assert_eq!(stats.cached_movies, 1);
        assert_eq!(stats.favorites, 1);
    }

    #[test]
    fn test_stats() {
        let cache = create_test_cache();
        cache
            .put_page(&[fixtures::movie(1, "A"), fixtures::movie(2, "B")], "q", 1, 2)
            .unwrap();
        cache
            .put_page(&[fixtures::movie(2, "B"), fixtures::movie(3, "C")], "q", 2, 2)
            .unwrap();

        let stats = cache.stats().unwrap();
        assert_eq!(stats.cached_pages, 2);
        assert_eq!(stats.cached_movies, 3);
        assert_eq!(stats.favorites, 0);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cache.db");

        {
            let cache = SqliteResultCache::new(&path).unwrap();
            cache
                .put_page(&[fixtures::movie(1, "A")], "q", 1, 9)
                .unwrap();
            cache.add_favorite(&fixtures::movie(5, "E")).unwrap();
        }

        let cache = SqliteResultCache::new(&path).unwrap();
        assert_eq!(cache.get_page("q", 1).unwrap().len(), 1);
        assert_eq!(cache.get_total_pages("q", 1).unwrap(), Some(9));
        assert!(cache.is_favorite(5).unwrap());
    }
}
