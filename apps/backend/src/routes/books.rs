//! Book endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::AppState;

/// GET /api/admin/books
pub async fn list(State(state): State<AppState>) -> Result<Json<BookListResponse>> {
    let books = state.db.list_books().await?;
    Ok(Json(BookListResponse { books }))
}

/// POST /api/admin/books
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateBookRequest>,
) -> Result<(StatusCode, Json<CreateBookResponse>)> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(ApiError::BadRequest("title required".to_string()));
    }
    if let Some(toc) = &payload.toc {
        if !toc.is_object() {
            return Err(ApiError::BadRequest("toc must be a JSON object".to_string()));
        }
    }

    let book_id = state.db.create_book(title, payload.toc.as_ref()).await?;
    tracing::info!("Created book {}", book_id);

    Ok((StatusCode::CREATED, Json(CreateBookResponse { book_id })))
}

/// GET /api/admin/books/:id
pub async fn get(State(state): State<AppState>, Path(book_id): Path<i64>) -> Result<Json<DbBook>> {
    let book = state
        .db
        .get_book(book_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Book {}", book_id)))?;

    Ok(Json(book))
}

/// PUT /api/admin/books/:id
pub async fn update(
    State(state): State<AppState>,
    Path(book_id): Path<i64>,
    Json(payload): Json<UpdateBookRequest>,
) -> Result<Json<DbBook>> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(ApiError::BadRequest("title required".to_string()));
    }

    if !state.db.rename_book(book_id, title).await? {
        return Err(ApiError::NotFound(format!("Book {}", book_id)));
    }

    let book = state
        .db
        .get_book(book_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Book {}", book_id)))?;

    Ok(Json(book))
}

/// DELETE /api/admin/books/:id
pub async fn delete(
    State(state): State<AppState>,
    Path(book_id): Path<i64>,
) -> Result<Json<serde_json::Value>> {
    if !state.db.delete_book(book_id).await? {
        return Err(ApiError::NotFound(format!("Book {}", book_id)));
    }

    tracing::info!("Deleted book {}", book_id);
    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// POST /api/admin/books/import
/// Create a book from a toc.json document and its chapter files
pub async fn import(
    State(state): State<AppState>,
    Json(payload): Json<ImportBookRequest>,
) -> Result<(StatusCode, Json<ImportBookResponse>)> {
    let plan = toc_core::plan_bundle(&payload.toc, &payload.chapters, payload.title.as_deref())?;
    for warning in &plan.warnings {
        tracing::warn!("Book import: {}", warning);
    }

    let response = state.db.import_book(&payload.toc, plan).await?;
    Ok((StatusCode::CREATED, Json(response)))
}
