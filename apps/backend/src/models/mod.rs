//! Database models and API types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;

// Re-export shared types from toc-core
pub use toc_core::{Allocation, ChapterAssignment, ChapterContent, TocDocument};

// === Database Entity Types ===

/// Book stored in PostgreSQL
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbBook {
    pub id: i64,
    pub title: String,
    pub toc_json: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Chapter stored in PostgreSQL
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbChapter {
    pub id: i64,
    pub book_id: i64,
    pub chapter_number: i32,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbChapter {
    /// Convert to API chapter with decoded content
    pub fn to_api_chapter(&self) -> ChapterDetail {
        ChapterDetail {
            id: self.id,
            book_id: self.book_id,
            chapter_number: self.chapter_number,
            title: self.title.clone(),
            content: ChapterContent::parse(&self.content).into_value(),
            updated_at: self.updated_at,
        }
    }
}

// === API Request/Response Types ===

/// Book row with its chapter count
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookSummary {
    pub id: i64,
    pub title: String,
    pub chapter_count: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookListResponse {
    pub books: Vec<BookSummary>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBookRequest {
    pub title: String,
    #[serde(default)]
    pub toc: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBookRequest {
    pub title: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateBookResponse {
    pub book_id: i64,
}

/// Chapter listing entry
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChapterSummary {
    pub id: i64,
    pub chapter_number: i32,
    pub title: String,
}

/// Chapter with decoded content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterDetail {
    pub id: i64,
    pub book_id: i64,
    pub chapter_number: i32,
    pub title: String,
    pub content: Value,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateChapterRequest {
    #[serde(default)]
    pub chapter_number: Option<i32>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateChapterResponse {
    pub chapter_id: i64,
    pub chapter_number: i32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateChapterRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<Value>,
    #[serde(default)]
    pub chapter_number: Option<i32>,
}

impl UpdateChapterRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.chapter_number.is_none()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateChapterResponse {
    pub chapter: ChapterDetail,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImportChaptersRequest {
    pub chapters: Vec<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImportChaptersResponse {
    pub imported: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Book bundle: a `toc.json` plus its chapter files keyed by `jsonFile`
#[derive(Debug, Deserialize)]
pub struct ImportBookRequest {
    pub toc: Value,
    #[serde(default)]
    pub chapters: Map<String, Value>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImportBookResponse {
    pub book_id: i64,
    pub imported: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AllocateQuery {
    #[serde(default)]
    pub desired: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReorderResponse {
    pub message: String,
    pub items: Vec<ChapterAssignment>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TocResponse {
    pub toc: Value,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTocRequest {
    pub toc: Value,
}
