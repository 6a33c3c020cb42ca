//! TOC reconciliation and chapter number allocation against PostgreSQL.
//!
//! The `*_in` functions take an open connection so they run inside the
//! caller's transaction; the `Database` methods open their own.

use std::collections::BTreeSet;

use sqlx::PgConnection;
use toc_core::{
    allocate_chapter_number, reconcile, Allocation, ChapterContent, ChapterSnapshot, TocDocument,
    TocSource,
};

use super::Database;
use crate::error::{ApiError, Result};

/// Lock a book row for the rest of the transaction. Returns `false` if the
/// book does not exist.
pub async fn lock_book(conn: &mut PgConnection, book_id: i64) -> Result<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM books WHERE id = $1 FOR UPDATE")
        .bind(book_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(found.is_some())
}

/// Regenerate and persist a book's TOC from its chapters.
///
/// A missing book is a no-op and yields `None`. Database errors propagate
/// so the enclosing transaction rolls back.
pub async fn rebuild_toc_in(conn: &mut PgConnection, book_id: i64) -> Result<Option<TocDocument>> {
    let book = sqlx::query_as::<_, (String, Option<String>)>(
        "SELECT title, toc_json FROM books WHERE id = $1 FOR UPDATE",
    )
    .bind(book_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some((title, toc_json)) = book else {
        tracing::debug!(book_id, "TOC rebuild skipped, book not found");
        return Ok(None);
    };

    let (document, source) = TocDocument::load(toc_json.as_deref(), Some(&title));
    if source == TocSource::Synthesized {
        tracing::warn!(book_id, "Stored TOC unusable, rebuilding from a single phase");
    }

    let rows = sqlx::query_as::<_, (i64, i32, String)>(
        r#"
        SELECT id, chapter_number, content
        FROM chapters
        WHERE book_id = $1
        ORDER BY chapter_number ASC
        "#,
    )
    .bind(book_id)
    .fetch_all(&mut *conn)
    .await?;

    let chapters: Vec<ChapterSnapshot> = rows
        .into_iter()
        .map(|(id, chapter_number, content)| ChapterSnapshot {
            id,
            chapter_number,
            content: ChapterContent::parse(&content),
        })
        .collect();

    let document = reconcile(document, &chapters);

    sqlx::query(
        r#"
        UPDATE books
        SET toc_json = $1, updated_at = NOW()
        WHERE id = $2
        "#,
    )
    .bind(document.to_json()?)
    .bind(book_id)
    .execute(&mut *conn)
    .await?;

    tracing::debug!(
        book_id,
        total_chapters = document.total_chapters,
        phases = document.phases.len(),
        "TOC rebuilt"
    );

    Ok(Some(document))
}

/// Chapter numbers currently used by a book, optionally ignoring one chapter.
pub async fn occupied_numbers(
    conn: &mut PgConnection,
    book_id: i64,
    except_chapter: Option<i64>,
) -> Result<BTreeSet<i32>> {
    let numbers: Vec<i32> = sqlx::query_scalar(
        r#"
        SELECT chapter_number
        FROM chapters
        WHERE book_id = $1 AND ($2::BIGINT IS NULL OR id <> $2)
        "#,
    )
    .bind(book_id)
    .bind(except_chapter)
    .fetch_all(&mut *conn)
    .await?;

    Ok(numbers.into_iter().collect())
}

/// Allocate a free chapter number inside the caller's transaction.
pub async fn allocate_in(
    conn: &mut PgConnection,
    book_id: i64,
    desired: Option<i32>,
    except_chapter: Option<i64>,
) -> Result<Allocation> {
    let occupied = occupied_numbers(conn, book_id, except_chapter).await?;
    let allocation = allocate_chapter_number(desired, &occupied)?;

    for warning in &allocation.warnings {
        tracing::info!(book_id, "{}", warning);
    }

    Ok(allocation)
}

impl Database {
    /// Rebuild a book's TOC in its own transaction.
    pub async fn rebuild_toc(&self, book_id: i64) -> Result<Option<TocDocument>> {
        let mut tx = self.pool.begin().await?;
        let document = rebuild_toc_in(&mut tx, book_id).await?;
        tx.commit().await?;

        Ok(document)
    }

    /// Preview the number a new chapter would receive.
    pub async fn allocate_chapter_number(&self, book_id: i64, desired: Option<i32>) -> Result<Allocation> {
        let mut conn = self.pool.acquire().await?;
        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM books WHERE id = $1")
            .bind(book_id)
            .fetch_optional(&mut *conn)
            .await?;
        if exists.is_none() {
            return Err(ApiError::NotFound(format!("Book {}", book_id)));
        }

        allocate_in(&mut conn, book_id, desired, None).await
    }
}
