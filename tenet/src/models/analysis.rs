use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The stored analysis of one post, written by the upstream ingestion
/// pipeline. Claim extraction reads these; nothing in this crate writes
/// them outside of tests and the repository upsert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostAnalysis {
    pub post_id: String,
    pub summary: Option<String>,
    pub main_claim: Option<String>,
    /// Lean of the article in [-1, 1] as judged upstream.
    pub bias_score: Option<f64>,
    /// Upstream's confidence in its own analysis, in [0, 1].
    pub confidence: Option<f64>,
    pub arguments_for: Vec<String>,
    pub arguments_against: Vec<String>,
    pub topics: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl PostAnalysis {
    pub fn new(post_id: String) -> Self {
        Self {
            post_id,
            summary: None,
            main_claim: None,
            bias_score: None,
            confidence: None,
            arguments_for: Vec::new(),
            arguments_against: Vec::new(),
            topics: Vec::new(),
            created_at: Utc::now(),
        }
    }
}
