//! Table of contents endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::AppState;

/// GET /api/admin/books/:id/toc
/// Returns the stored document as-is
pub async fn get(State(state): State<AppState>, Path(book_id): Path<i64>) -> Result<Json<TocResponse>> {
    let raw = state
        .db
        .get_toc(book_id)
        .await?
        .flatten()
        .ok_or_else(|| ApiError::NotFound(format!("TOC for book {}", book_id)))?;

    let toc = serde_json::from_str(&raw)
        .map_err(|e| ApiError::Internal(format!("Stored TOC is not valid JSON: {}", e)))?;

    Ok(Json(TocResponse { toc }))
}

/// PUT /api/admin/books/:id/toc
/// Raw replace; chapter listings are reconciled on the next chapter mutation
pub async fn replace(
    State(state): State<AppState>,
    Path(book_id): Path<i64>,
    Json(payload): Json<UpdateTocRequest>,
) -> Result<Json<serde_json::Value>> {
    if !payload.toc.is_object() {
        return Err(ApiError::BadRequest("toc must be a JSON object".to_string()));
    }

    if !state.db.replace_toc(book_id, &payload.toc).await? {
        return Err(ApiError::NotFound(format!("Book {}", book_id)));
    }

    Ok(Json(serde_json::json!({ "message": "Đã cập nhật TOC." })))
}

/// POST /api/admin/books/:id/toc/rebuild
pub async fn rebuild(
    State(state): State<AppState>,
    Path(book_id): Path<i64>,
) -> Result<Json<TocResponse>> {
    let document = state
        .db
        .rebuild_toc(book_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Book {}", book_id)))?;

    Ok(Json(TocResponse {
        toc: serde_json::to_value(&document)?,
    }))
}
