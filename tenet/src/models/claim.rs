use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the author used a statement: asserting it themselves, describing
/// someone else's position, or commenting on the article itself. Only
/// `Advanced` claims feed belief consolidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ClaimType {
    Advanced,
    Discussed,
    Meta,
}

impl std::fmt::Display for ClaimType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Advanced => write!(f, "ADVANCED"),
            Self::Discussed => write!(f, "DISCUSSED"),
            Self::Meta => write!(f, "META"),
        }
    }
}

impl std::str::FromStr for ClaimType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ADVANCED" => Ok(Self::Advanced),
            "DISCUSSED" => Ok(Self::Discussed),
            "META" => Ok(Self::Meta),
            _ => Err(format!("Unknown claim type: {s}")),
        }
    }
}

/// An extracted (text, polarity, confidence) triple before it is stored.
/// Polarity encodes the extraction rule: the main claim at +1.0, each
/// supporting argument at +0.7, each opposing argument at -0.7.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawClaim {
    pub text: String,
    pub polarity: f64,
    pub confidence: f64,
}

/// One mention of a claim in one post. Inserted in bulk by extraction,
/// then updated exactly twice: classification sets `claim_type`, the
/// embedding stage sets `embedding`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimOccurrence {
    pub id: i64,
    pub author_id: String,
    pub post_id: String,
    pub text: String,
    pub polarity: f64,
    pub confidence: f64,
    pub occurred_at: DateTime<Utc>,
    pub claim_type: Option<ClaimType>,
    pub embedding: Option<Vec<f32>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn claim_type_display_is_uppercase() {
        assert_eq!(ClaimType::Advanced.to_string(), "ADVANCED");
        assert_eq!(ClaimType::Discussed.to_string(), "DISCUSSED");
        assert_eq!(ClaimType::Meta.to_string(), "META");
    }

    #[test]
    fn claim_type_parses_case_insensitively() {
        assert_eq!(ClaimType::from_str("advanced"), Ok(ClaimType::Advanced));
        assert_eq!(ClaimType::from_str("META"), Ok(ClaimType::Meta));
        assert!(ClaimType::from_str("opinion").is_err());
    }

    #[test]
    fn claim_type_serde_uses_uppercase() {
        let json = serde_json::to_string(&ClaimType::Advanced).unwrap();
        assert_eq!(json, "\"ADVANCED\"");
        let back: ClaimType = serde_json::from_str("\"DISCUSSED\"").unwrap();
        assert_eq!(back, ClaimType::Discussed);
    }
}
