//! PostgreSQL database operations

mod chapters;
mod reorder;
mod toc;

use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::error::{ApiError, Result};
use crate::models::*;

pub use toc::{lock_book, rebuild_toc_in};

/// Database wrapper with connection pool
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
    reorder_offset: i32,
}

impl Database {
    /// Connect to PostgreSQL and create connection pool
    pub async fn connect(database_url: &str, max_connections: u32, reorder_offset: i32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self {
            pool,
            reorder_offset,
        })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ApiError::Migration(e.to_string()))?;
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // === Book Repository ===

    /// List books with their chapter counts
    pub async fn list_books(&self) -> Result<Vec<BookSummary>> {
        let books = sqlx::query_as::<_, BookSummary>(
            r#"
            SELECT b.id, b.title, COUNT(c.id) AS chapter_count, b.updated_at
            FROM books b
            LEFT JOIN chapters c ON c.book_id = b.id
            GROUP BY b.id
            ORDER BY b.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    /// Get book by ID
    pub async fn get_book(&self, book_id: i64) -> Result<Option<DbBook>> {
        let book = sqlx::query_as::<_, DbBook>(
            r#"
            SELECT id, title, toc_json, created_at, updated_at
            FROM books
            WHERE id = $1
            "#,
        )
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(book)
    }

    /// Create a book, optionally with an initial TOC document
    pub async fn create_book(&self, title: &str, toc: Option<&Value>) -> Result<i64> {
        let toc_json = toc.map(Value::to_string);
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO books (title, toc_json)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(title)
        .bind(toc_json)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    /// Change a book's title. The stored TOC keeps its own `ebookTitle`.
    pub async fn rename_book(&self, book_id: i64, title: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET title = $1, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(title)
        .bind(book_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a book; its chapters go with it
    pub async fn delete_book(&self, book_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(book_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Stored TOC text. `None` if the book does not exist.
    pub async fn get_toc(&self, book_id: i64) -> Result<Option<Option<String>>> {
        let toc = sqlx::query_scalar::<_, Option<String>>("SELECT toc_json FROM books WHERE id = $1")
            .bind(book_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(toc)
    }

    /// Replace the stored TOC verbatim, without reconciliation
    pub async fn replace_toc(&self, book_id: i64, toc: &Value) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET toc_json = $1, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(toc.to_string())
        .bind(book_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // === Chapter Repository (reads) ===

    /// List chapters of a book in chapter-number order
    pub async fn list_chapters(&self, book_id: i64) -> Result<Vec<ChapterSummary>> {
        let chapters = sqlx::query_as::<_, ChapterSummary>(
            r#"
            SELECT id, chapter_number, title
            FROM chapters
            WHERE book_id = $1
            ORDER BY chapter_number ASC
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(chapters)
    }

    /// Get chapter by ID
    pub async fn get_chapter(&self, chapter_id: i64) -> Result<Option<DbChapter>> {
        let chapter = sqlx::query_as::<_, DbChapter>(
            r#"
            SELECT id, book_id, chapter_number, title, content, created_at, updated_at
            FROM chapters
            WHERE id = $1
            "#,
        )
        .bind(chapter_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(chapter)
    }
}
