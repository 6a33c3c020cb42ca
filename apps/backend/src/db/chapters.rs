//! Chapter mutations. Each one ends with a TOC rebuild in the same transaction.

use std::collections::BTreeSet;

use serde_json::Value;
use sqlx::PgConnection;
use toc_core::{allocate_chapter_number, ChapterContent, ChapterImport, BundlePlan};

use super::toc::{allocate_in, lock_book, occupied_numbers, rebuild_toc_in};
use super::Database;
use crate::error::{ApiError, Result};
use crate::models::*;

/// Insert a chapter, stamping its id and number into the content first.
async fn insert_chapter(
    conn: &mut PgConnection,
    book_id: i64,
    chapter_number: i32,
    title: &str,
    mut content: ChapterContent,
) -> Result<i64> {
    let id: i64 = sqlx::query_scalar("SELECT nextval(pg_get_serial_sequence('chapters', 'id'))")
        .fetch_one(&mut *conn)
        .await?;

    content.stamp_numbering(id, chapter_number);

    sqlx::query(
        r#"
        INSERT INTO chapters (id, book_id, chapter_number, title, content)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(id)
    .bind(book_id)
    .bind(chapter_number)
    .bind(title)
    .bind(content.to_json()?)
    .execute(&mut *conn)
    .await?;

    Ok(id)
}

/// Allocate and insert a batch, keeping the occupied set current between inserts.
async fn insert_imports(
    conn: &mut PgConnection,
    book_id: i64,
    imports: Vec<ChapterImport>,
) -> Result<(usize, Vec<String>)> {
    let mut occupied: BTreeSet<i32> = occupied_numbers(conn, book_id, None).await?;
    let mut warnings = Vec::new();
    let mut imported = 0;

    for chapter in imports {
        let allocation = allocate_chapter_number(chapter.desired_number, &occupied)?;
        insert_chapter(conn, book_id, allocation.number, &chapter.title, chapter.content).await?;
        occupied.insert(allocation.number);
        warnings.extend(allocation.warnings);
        imported += 1;
    }

    Ok((imported, warnings))
}

impl Database {
    /// Create a chapter at the first free number at or after the requested one
    pub async fn create_chapter(
        &self,
        book_id: i64,
        request: CreateChapterRequest,
    ) -> Result<CreateChapterResponse> {
        let mut tx = self.pool.begin().await?;

        if !lock_book(&mut tx, book_id).await? {
            return Err(ApiError::NotFound(format!("Book {}", book_id)));
        }

        let allocation = allocate_in(&mut tx, book_id, request.chapter_number, None).await?;
        let title = request.title.as_deref().map(str::trim).unwrap_or_default();
        let content = ChapterContent::from_value(request.content.unwrap_or(Value::Null));

        let chapter_id = insert_chapter(&mut tx, book_id, allocation.number, title, content).await?;

        rebuild_toc_in(&mut tx, book_id).await?;
        tx.commit().await?;

        tracing::info!(book_id, chapter_id, "Created chapter {}", allocation.number);

        Ok(CreateChapterResponse {
            chapter_id,
            chapter_number: allocation.number,
            warnings: allocation.warnings,
        })
    }

    /// Update title, content and/or number of a chapter
    pub async fn update_chapter(
        &self,
        chapter_id: i64,
        request: UpdateChapterRequest,
    ) -> Result<UpdateChapterResponse> {
        if request.is_empty() {
            return Err(ApiError::BadRequest("Nothing to update".to_string()));
        }

        let mut tx = self.pool.begin().await?;

        let book_id: i64 = sqlx::query_scalar("SELECT book_id FROM chapters WHERE id = $1")
            .bind(chapter_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Chapter {}", chapter_id)))?;

        lock_book(&mut tx, book_id).await?;

        let current = sqlx::query_as::<_, DbChapter>(
            r#"
            SELECT id, book_id, chapter_number, title, content, created_at, updated_at
            FROM chapters
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(chapter_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Chapter {}", chapter_id)))?;

        let (chapter_number, warnings) = match request.chapter_number {
            Some(desired) if desired != current.chapter_number => {
                let allocation = allocate_in(&mut tx, book_id, Some(desired), Some(chapter_id)).await?;
                (allocation.number, allocation.warnings)
            }
            _ => (current.chapter_number, Vec::new()),
        };

        let title = match request.title {
            Some(title) => title.trim().to_string(),
            None => current.title.clone(),
        };
        let mut content = match request.content {
            Some(value) => ChapterContent::from_value(value),
            None => ChapterContent::parse(&current.content),
        };
        content.stamp_numbering(chapter_id, chapter_number);

        let updated = sqlx::query_as::<_, DbChapter>(
            r#"
            UPDATE chapters
            SET title = $1, chapter_number = $2, content = $3, updated_at = NOW()
            WHERE id = $4
            RETURNING id, book_id, chapter_number, title, content, created_at, updated_at
            "#,
        )
        .bind(&title)
        .bind(chapter_number)
        .bind(content.to_json()?)
        .bind(chapter_id)
        .fetch_one(&mut *tx)
        .await?;

        rebuild_toc_in(&mut tx, book_id).await?;
        tx.commit().await?;

        Ok(UpdateChapterResponse {
            chapter: updated.to_api_chapter(),
            warnings,
        })
    }

    /// Delete a chapter and rebuild its book's TOC
    pub async fn delete_chapter(&self, chapter_id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let book_id: i64 = sqlx::query_scalar("SELECT book_id FROM chapters WHERE id = $1")
            .bind(chapter_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Chapter {}", chapter_id)))?;

        lock_book(&mut tx, book_id).await?;

        sqlx::query("DELETE FROM chapters WHERE id = $1")
            .bind(chapter_id)
            .execute(&mut *tx)
            .await?;

        rebuild_toc_in(&mut tx, book_id).await?;
        tx.commit().await?;

        tracing::info!(book_id, chapter_id, "Deleted chapter");

        Ok(())
    }

    /// Import prepared chapter documents into an existing book
    pub async fn import_chapters(
        &self,
        book_id: i64,
        imports: Vec<ChapterImport>,
    ) -> Result<ImportChaptersResponse> {
        let mut tx = self.pool.begin().await?;

        if !lock_book(&mut tx, book_id).await? {
            return Err(ApiError::NotFound(format!("Book {}", book_id)));
        }

        let (imported, warnings) = insert_imports(&mut tx, book_id, imports).await?;

        rebuild_toc_in(&mut tx, book_id).await?;
        tx.commit().await?;

        tracing::info!(book_id, "Imported {} chapters", imported);

        Ok(ImportChaptersResponse { imported, warnings })
    }

    /// Create a book from a bundle: its TOC is stored as given, then chapters
    /// are inserted and the TOC is reconciled against them
    pub async fn import_book(&self, toc: &Value, plan: BundlePlan) -> Result<ImportBookResponse> {
        let mut tx = self.pool.begin().await?;

        let book_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO books (title, toc_json)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(&plan.title)
        .bind(toc.to_string())
        .fetch_one(&mut *tx)
        .await?;

        let (imported, allocation_warnings) = insert_imports(&mut tx, book_id, plan.chapters).await?;

        rebuild_toc_in(&mut tx, book_id).await?;
        tx.commit().await?;

        tracing::info!(book_id, "Imported book \"{}\" with {} chapters", plan.title, imported);

        let mut warnings = plan.warnings;
        warnings.extend(allocation_warnings);

        Ok(ImportBookResponse {
            book_id,
            imported,
            warnings,
        })
    }
}
