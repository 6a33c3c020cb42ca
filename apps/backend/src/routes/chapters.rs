//! Chapter endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::AppState;

/// GET /api/admin/books/:id/chapters
pub async fn list(
    State(state): State<AppState>,
    Path(book_id): Path<i64>,
) -> Result<Json<Vec<ChapterSummary>>> {
    let chapters = state.db.list_chapters(book_id).await?;
    Ok(Json(chapters))
}

/// POST /api/admin/books/:id/chapters
pub async fn create(
    State(state): State<AppState>,
    Path(book_id): Path<i64>,
    Json(payload): Json<CreateChapterRequest>,
) -> Result<(StatusCode, Json<CreateChapterResponse>)> {
    let response = state.db.create_chapter(book_id, payload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/admin/books/:id/chapters/import
/// Import a batch of chapter JSON documents
pub async fn import(
    State(state): State<AppState>,
    Path(book_id): Path<i64>,
    Json(payload): Json<ImportChaptersRequest>,
) -> Result<(StatusCode, Json<ImportChaptersResponse>)> {
    let imports = toc_core::prepare_chapters(payload.chapters)?;
    let response = state.db.import_chapters(book_id, imports).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/admin/books/:id/chapters/allocate?desired=N
pub async fn allocate(
    State(state): State<AppState>,
    Path(book_id): Path<i64>,
    Query(query): Query<AllocateQuery>,
) -> Result<Json<Allocation>> {
    let allocation = state.db.allocate_chapter_number(book_id, query.desired).await?;
    Ok(Json(allocation))
}

/// PUT /api/admin/books/:id/chapters/reorder
/// Body: `{ "items": [{ "id": 1, "chapter_number": 1 }, 2, ...] }` or a bare array
pub async fn reorder(
    State(state): State<AppState>,
    Path(book_id): Path<i64>,
    Json(payload): Json<Value>,
) -> Result<Json<ReorderResponse>> {
    let items = toc_core::parse_reorder_payload(&payload)?;
    let plan = state.db.reorder_chapters(book_id, &items).await?;

    Ok(Json(ReorderResponse {
        message: "Đã lưu thứ tự chương".to_string(),
        items: plan.assignments,
    }))
}

/// GET /api/admin/chapters/:id
pub async fn get(
    State(state): State<AppState>,
    Path(chapter_id): Path<i64>,
) -> Result<Json<ChapterDetail>> {
    let chapter = state
        .db
        .get_chapter(chapter_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Chapter {}", chapter_id)))?;

    Ok(Json(chapter.to_api_chapter()))
}

/// PUT /api/admin/chapters/:id
pub async fn update(
    State(state): State<AppState>,
    Path(chapter_id): Path<i64>,
    Json(payload): Json<UpdateChapterRequest>,
) -> Result<Json<UpdateChapterResponse>> {
    let response = state.db.update_chapter(chapter_id, payload).await?;
    Ok(Json(response))
}

/// DELETE /api/admin/chapters/:id
pub async fn delete(
    State(state): State<AppState>,
    Path(chapter_id): Path<i64>,
) -> Result<Json<Value>> {
    state.db.delete_chapter(chapter_id).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}
