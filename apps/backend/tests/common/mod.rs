//! Common test utilities and fixtures for integration tests.
//!
//! # Requirements
//! Integration tests require a PostgreSQL database (set DATABASE_URL env var).

pub mod fixtures;

use std::sync::Arc;

use axum::Router;
use serde_json::Value;

use ebook_backend::db::Database;
use ebook_backend::AppState;
use toc_core::DEFAULT_RENUMBER_OFFSET;

/// Test context containing database connection and the application router.
pub struct TestContext {
    pub db: Arc<Database>,
    app: Router,
}

impl TestContext {
    /// Create a new test context.
    ///
    /// # Panics
    /// Panics if DATABASE_URL is not set or database connection fails.
    pub async fn new() -> Self {
        dotenvy::dotenv().ok();

        let database_url =
            std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");

        let db = Database::connect(&database_url, 5, DEFAULT_RENUMBER_OFFSET)
            .await
            .expect("Failed to connect to test database");

        db.run_migrations()
            .await
            .expect("Failed to run migrations");

        let db = Arc::new(db);
        let app = ebook_backend::app(AppState { db: db.clone() });

        Self { db, app }
    }

    /// Get the router for use with axum-test.
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    /// Create a book with a unique title and an optional stored TOC.
    pub async fn create_test_book(&self, toc: Option<&Value>) -> i64 {
        self.db
            .create_book(&fixtures::unique_title("book"), toc)
            .await
            .expect("Failed to create test book")
    }

    /// Overwrite `toc_json` with arbitrary text, bypassing validation.
    pub async fn set_raw_toc(&self, book_id: i64, raw: Option<&str>) {
        sqlx::query("UPDATE books SET toc_json = $1 WHERE id = $2")
            .bind(raw)
            .bind(book_id)
            .execute(self.db.pool())
            .await
            .expect("Failed to set raw toc");
    }

    /// Insert a chapter row directly, without allocation or TOC rebuild.
    pub async fn insert_chapter(&self, book_id: i64, chapter_number: i32, content: &Value) -> i64 {
        sqlx::query_scalar(
            r#"
            INSERT INTO chapters (book_id, chapter_number, title, content)
            VALUES ($1, $2, '', $3)
            RETURNING id
            "#,
        )
        .bind(book_id)
        .bind(chapter_number)
        .bind(content.to_string())
        .fetch_one(self.db.pool())
        .await
        .expect("Failed to insert test chapter")
    }

    /// Insert chapters numbered 1..=count, returning their ids in number order.
    pub async fn insert_chapters(&self, book_id: i64, count: i32) -> Vec<i64> {
        let mut ids = Vec::new();
        for number in 1..=count {
            let content = fixtures::chapter_content(&format!("Chapter {}", number));
            ids.push(self.insert_chapter(book_id, number, &content).await);
        }
        ids
    }

    /// Remove a chapter row directly.
    pub async fn remove_chapter(&self, chapter_id: i64) {
        sqlx::query("DELETE FROM chapters WHERE id = $1")
            .bind(chapter_id)
            .execute(self.db.pool())
            .await
            .expect("Failed to delete test chapter");
    }

    /// Current `(id, chapter_number, content)` rows of a book.
    pub async fn chapter_rows(&self, book_id: i64) -> Vec<(i64, i32, Value)> {
        let rows: Vec<(i64, i32, String)> = sqlx::query_as(
            "SELECT id, chapter_number, content FROM chapters WHERE book_id = $1 ORDER BY chapter_number",
        )
        .bind(book_id)
        .fetch_all(self.db.pool())
        .await
        .expect("Failed to load chapters");

        rows.into_iter()
            .map(|(id, number, content)| {
                (id, number, serde_json::from_str(&content).expect("content is JSON"))
            })
            .collect()
    }

    /// Stored TOC parsed as JSON.
    pub async fn stored_toc(&self, book_id: i64) -> Option<Value> {
        let raw: Option<String> = sqlx::query_scalar("SELECT toc_json FROM books WHERE id = $1")
            .bind(book_id)
            .fetch_optional(self.db.pool())
            .await
            .expect("Failed to load toc")
            .flatten();
        raw.map(|text| serde_json::from_str(&text).expect("stored toc is JSON"))
    }

    /// Make every chapter update of a book that lands below `threshold` fail.
    ///
    /// Bumped numbers stay above the threshold, so a reorder gets through its
    /// bump phase and then fails on the first final write.
    pub async fn reject_chapter_writes_below(&self, book_id: i64, threshold: i32) {
        let sql = format!(
            r#"
            CREATE OR REPLACE FUNCTION reject_chapter_write() RETURNS trigger
            LANGUAGE plpgsql AS $$
            BEGIN
                RAISE EXCEPTION 'chapter write rejected for book %', NEW.book_id;
            END;
            $$;

            CREATE TRIGGER reject_chapter_write_{book_id}
            BEFORE UPDATE ON chapters
            FOR EACH ROW
            WHEN (NEW.book_id = {book_id} AND NEW.chapter_number < {threshold})
            EXECUTE FUNCTION reject_chapter_write();
            "#,
            book_id = book_id,
            threshold = threshold,
        );

        sqlx::raw_sql(&sql)
            .execute(self.db.pool())
            .await
            .expect("Failed to install chapter write trigger");
    }

    /// Remove the trigger installed by `reject_chapter_writes_below`.
    pub async fn allow_chapter_writes(&self, book_id: i64) {
        let sql = format!("DROP TRIGGER IF EXISTS reject_chapter_write_{} ON chapters", book_id);
        sqlx::raw_sql(&sql)
            .execute(self.db.pool())
            .await
            .expect("Failed to drop chapter write trigger");
    }

    /// Clean up test data for a book. Chapters cascade.
    pub async fn cleanup_book(&self, book_id: i64) {
        let _ = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(book_id)
            .execute(self.db.pool())
            .await;
    }
}
