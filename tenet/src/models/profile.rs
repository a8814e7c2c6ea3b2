use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One belief as surfaced in an author profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileBelief {
    pub text: String,
    pub support_count: i64,
    pub avg_polarity: f64,
}

/// A stored CONTRADICTS relation surfaced in a profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tension {
    pub belief_a: String,
    pub belief_b: String,
    pub confidence: f64,
}

/// Mean bias and mean analysis confidence across an author's posts.
/// Absent when no post analysis carries a bias score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiasStats {
    pub mean: f64,
    pub confidence: f64,
}

/// Materialized per-author view. Recomputed and overwritten on demand;
/// never a source of truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorProfile {
    pub author_id: String,
    pub summary: String,
    pub beliefs: Vec<ProfileBelief>,
    pub tensions: Vec<Tension>,
    pub topics: Vec<String>,
    pub bias: Option<BiasStats>,
    pub computed_at: DateTime<Utc>,
}

/// Two beliefs from different authors that look like a disagreement:
/// overlapping subject words, opposite lexical polarity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disagreement {
    pub claim_a: String,
    pub claim_b: String,
}

/// Topic overlap and candidate disagreements between two authors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorComparison {
    pub shared_topics: Vec<String>,
    pub unique_to_a: Vec<String>,
    pub unique_to_b: Vec<String>,
    pub disagreements: Vec<Disagreement>,
}
