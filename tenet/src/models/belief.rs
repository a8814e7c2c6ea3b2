use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A cluster of semantically equivalent ADVANCED claims for one author.
/// The whole set is rebuilt per consolidation run; a belief's identity is
/// its text, not its row id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalBelief {
    pub id: i64,
    pub author_id: String,
    /// Longest member claim text of the cluster.
    pub text: String,
    pub support_count: i64,
    pub avg_polarity: f64,
    pub avg_confidence: f64,
}

/// A canonical belief before it has a row id, as produced by the
/// clustering pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeliefDraft {
    pub text: String,
    pub support_count: i64,
    pub avg_polarity: f64,
    pub avg_confidence: f64,
}

/// Logical relation between two of an author's canonical beliefs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RelationKind {
    Supports,
    Contradicts,
    Unrelated,
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Supports => write!(f, "SUPPORTS"),
            Self::Contradicts => write!(f, "CONTRADICTS"),
            Self::Unrelated => write!(f, "UNRELATED"),
        }
    }
}

impl std::str::FromStr for RelationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SUPPORTS" => Ok(Self::Supports),
            "CONTRADICTS" => Ok(Self::Contradicts),
            "UNRELATED" => Ok(Self::Unrelated),
            _ => Err(format!("Unknown relation kind: {s}")),
        }
    }
}

/// One classified pair of belief texts. Pairs reference beliefs by text
/// so they survive a belief rebuild; a relation row can therefore go
/// stale until the next relation build replaces the set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeliefRelation {
    pub id: i64,
    pub author_id: String,
    pub belief_a: String,
    pub belief_b: String,
    pub relation: RelationKind,
    pub confidence: f64,
}

/// One (belief, contributing occurrence) timeline row. Only ever reduced
/// to first/last occurrence per belief text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub author_id: String,
    pub claim: String,
    pub occurred_at: DateTime<Utc>,
}

/// First/last occurrence of one belief text in an author's archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeliefSpan {
    pub claim: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// A pair of beliefs the relation stage judged contradictory, ordered by
/// when each was first seen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeliefDrift {
    pub earlier: String,
    pub later: String,
    pub confidence: f64,
}

/// Per-author evolution view: belief lifespans plus detected drift.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionReport {
    pub author_id: String,
    pub spans: Vec<BeliefSpan>,
    pub drifts: Vec<BeliefDrift>,
}
