use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A newsletter author whose claims and beliefs are tracked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub name: String,
    pub feed_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One published article, tied to its author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub author_id: String,
    pub url: String,
    pub title: Option<String>,
    /// Publish date as reported by the source; claims fall back to the
    /// ingestion timestamp when this is absent.
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
