//! Wire types of the catalogue API. Field names are camelCase on the wire.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub cover_image: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub genre: String,
    pub published_year: Option<i32>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub isbn: String,
}

/// Recommendation identifiers arrive as numbers or strings depending on the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(u64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(id) => write!(f, "{id}"),
            RecordId::Text(id) => f.write_str(id),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub id: RecordId,
    pub book_id: String,
    /// Confidence score in `[0, 1]`.
    pub confidence: f64,
    #[serde(default)]
    pub reason: String,
}
