//! Atomic chapter reordering.

use toc_core::{plan_reorder, renumber_offset, ChapterContent, ReorderItem, ReorderPlan};

use super::toc::{lock_book, rebuild_toc_in};
use super::Database;
use crate::error::{ApiError, Result};

impl Database {
    /// Renumber a book's chapters to follow `items`, then rebuild its TOC.
    ///
    /// Runs in one transaction: the book row and every chapter row are
    /// locked, all numbers are bumped out of the way, final numbers and
    /// content numbering are written, and the TOC is reconciled. Any error
    /// drops the transaction, which rolls everything back.
    pub async fn reorder_chapters(&self, book_id: i64, items: &[ReorderItem]) -> Result<ReorderPlan> {
        let mut tx = self.pool.begin().await?;

        if !lock_book(&mut tx, book_id).await? {
            return Err(ApiError::NotFound(format!("Book {}", book_id)));
        }

        let rows = sqlx::query_as::<_, (i64, i32, String)>(
            r#"
            SELECT id, chapter_number, content
            FROM chapters
            WHERE book_id = $1
            ORDER BY chapter_number
            FOR UPDATE
            "#,
        )
        .bind(book_id)
        .fetch_all(&mut *tx)
        .await?;

        if rows.is_empty() {
            return Err(ApiError::NotFound(format!("No chapters found for book {}", book_id)));
        }

        let existing_ids: Vec<i64> = rows.iter().map(|(id, _, _)| *id).collect();
        let plan = plan_reorder(items, &existing_ids)?;
        if !plan.unknown_ids.is_empty() {
            tracing::warn!(book_id, "Reorder ignored unknown chapter ids: {:?}", plan.unknown_ids);
        }

        let current_max = rows.iter().map(|(_, number, _)| *number).max().unwrap_or(0);
        let offset = renumber_offset(self.reorder_offset, current_max, plan.max_number())?;

        // Phase A: move every number above anything that will be written.
        sqlx::query(
            r#"
            UPDATE chapters
            SET chapter_number = chapter_number + $1
            WHERE book_id = $2
            "#,
        )
        .bind(offset)
        .bind(book_id)
        .execute(&mut *tx)
        .await?;

        // Phase B: final numbers plus the copies embedded in content.
        for (id, _, raw_content) in &rows {
            let number = plan.number_for(*id).ok_or_else(|| {
                ApiError::Internal(format!("Reorder plan has no number for chapter {}", id))
            })?;

            let mut content = ChapterContent::parse(raw_content);
            content.stamp_numbering(*id, number);

            sqlx::query(
                r#"
                UPDATE chapters
                SET chapter_number = $1, content = $2, updated_at = NOW()
                WHERE id = $3 AND book_id = $4
                "#,
            )
            .bind(number)
            .bind(content.to_json()?)
            .bind(*id)
            .bind(book_id)
            .execute(&mut *tx)
            .await?;
        }

        rebuild_toc_in(&mut tx, book_id).await?;
        tx.commit().await?;

        tracing::info!(
            book_id,
            chapters = plan.assignments.len(),
            offset,
            "Chapters reordered"
        );

        Ok(plan)
    }
}
