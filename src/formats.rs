use serde::{Deserialize, Serialize};

/// One store file: feed-level metadata plus the curated talk records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedStore {
    pub meta: FeedMeta,
    #[serde(default)]
    pub feed: Vec<TalkRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedMeta {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Canonical talk record, merged from a schedule entry and a media-feed
/// item. Field absence is an empty string, never a missing key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TalkRecord {
    pub title: String,
    #[serde(default)]
    pub published: String,
    #[serde(default)]
    pub speakers: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub media_url: String,
    #[serde(default)]
    pub media_type: String,
    #[serde(default)]
    pub media_length: String,
    #[serde(default)]
    pub web_url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub feedback: Vec<FeedbackEntry>,
}

/// A single star rating, appended by the rating workflow and immutable
/// afterwards. Entries without a rating are rejected by store validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl FeedbackEntry {
    pub fn rated(rating: u8) -> Self {
        Self {
            rating: Some(rating),
            username: None,
            comment: None,
        }
    }
}
