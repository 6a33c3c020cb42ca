//! Chapter content documents.
//!
//! Content is an opaque JSON object (blocks, quiz, meta, ...) owned by the
//! reader templates. The only fields this crate reads or writes are the
//! title candidates and the redundant numbering fields that templates use.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::json;

/// A chapter's JSON content, always an object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChapterContent(Map<String, Value>);

impl ChapterContent {
    /// Parse stored content text. Anything that is not a JSON object
    /// becomes an empty document.
    pub fn parse(raw: &str) -> Self {
        serde_json::from_str::<Value>(raw)
            .map(Self::from_value)
            .unwrap_or_default()
    }

    /// Wrap a JSON value; non-objects become an empty document.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    #[cfg(test)]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Serialize for storage.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.0)
    }

    /// Title shown in the table of contents.
    ///
    /// Priority: `chapterTitle`, `title`, `meta.title`, then a synthesized
    /// "Chương {number}". Present-but-empty strings still win.
    pub fn display_title(&self, number: i32) -> String {
        self.0
            .get("chapterTitle")
            .and_then(json::text)
            .or_else(|| self.0.get("title").and_then(json::text))
            .or_else(|| {
                self.0
                    .get("meta")
                    .and_then(|meta| meta.get("title"))
                    .and_then(json::text)
            })
            .unwrap_or_else(|| format!("Chương {}", number))
    }

    /// Chapter number embedded at the top level, if any.
    #[cfg(test)]
    pub fn chapter_number(&self) -> Option<i32> {
        self.0.get("chapterNumber").and_then(json::positive_number)
    }

    /// Chapter id embedded under `meta`, if any.
    #[cfg(test)]
    pub fn meta_chapter_id(&self) -> Option<i64> {
        self.0
            .get("meta")
            .and_then(|meta| meta.get("chapter_id"))
            .and_then(json::lenient_int)
    }

    /// Write the row's identity into every redundant numbering field.
    ///
    /// A `meta` value that is not an object is replaced.
    pub fn stamp_numbering(&mut self, id: i64, number: i32) {
        self.0.insert("chapter_number".into(), Value::from(number));
        self.0.insert("chapterNumber".into(), Value::from(number));

        let meta = self
            .0
            .entry("meta")
            .or_insert_with(|| Value::Object(Map::new()));
        if !meta.is_object() {
            *meta = Value::Object(Map::new());
        }
        if let Value::Object(meta) = meta {
            meta.insert("chapter_number".into(), Value::from(number));
            meta.insert("chapterNumber".into(), Value::from(number));
            meta.insert("chapter_id".into(), Value::from(id));
        }
    }
}

impl From<Map<String, Value>> for ChapterContent {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
