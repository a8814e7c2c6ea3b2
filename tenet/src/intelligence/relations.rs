use std::sync::Arc;

use serde::Deserialize;

use crate::db::GraphStore;
use crate::error::Result;
use crate::llm::{prompts, CompletionOptions, LlmProvider};
use crate::models::RelationKind;

#[derive(Debug, Deserialize)]
struct RelationResponse {
    relation: Option<String>,
    confidence: Option<f64>,
}

/// Resolve a raw model reply to (relation, confidence), never failing.
/// Anything unparseable, including an unknown relation label, becomes
/// UNRELATED at 0.5. Confidence is clamped into [0, 1].
pub fn parse_relation(raw: &str) -> (RelationKind, f64) {
    let fallback = (RelationKind::Unrelated, 0.5);

    let Ok(response) = serde_json::from_str::<RelationResponse>(raw.trim()) else {
        return fallback;
    };

    let Some(label) = response.relation else {
        return fallback;
    };
    let Ok(kind) = label.parse::<RelationKind>() else {
        return fallback;
    };

    let confidence = response.confidence.unwrap_or(0.5).clamp(0.0, 1.0);
    (kind, confidence)
}

/// Classifies the logical relation for every pair of an author's
/// canonical beliefs. Quadratic in the belief count; acceptable while
/// belief sets stay in the dozens.
pub struct RelationBuilder {
    store: Arc<dyn GraphStore>,
    llm: LlmProvider,
}

impl RelationBuilder {
    pub fn new(store: Arc<dyn GraphStore>, llm: LlmProvider) -> Self {
        Self { store, llm }
    }

    /// Classify one belief pair. Call failures degrade to UNRELATED at
    /// 0.5 so one flaky call never aborts the pair sweep.
    pub async fn relate(&self, belief_a: &str, belief_b: &str) -> (RelationKind, f64) {
        let prompt = prompts::belief_relation_prompt(belief_a, belief_b);
        let options = CompletionOptions {
            temperature: Some(0.0),
            max_tokens: Some(200),
        };

        match self.llm.complete(&prompt, Some(&options)).await {
            Ok(raw) => parse_relation(&raw),
            Err(error) => {
                tracing::warn!(error = %error, "Relation classification failed, defaulting to UNRELATED");
                (RelationKind::Unrelated, 0.5)
            }
        }
    }

    /// Rebuild the author's relation set: delete the old rows, then
    /// classify and insert every unordered belief pair. Each pair commits
    /// on its own, so an interrupted sweep keeps what it classified.
    pub async fn build_for_author(&self, author_id: &str) -> Result<u64> {
        if !self.llm.is_available() {
            tracing::warn!("LLM unavailable, keeping existing relations");
            return Ok(0);
        }

        let beliefs = self.store.get_author_beliefs(author_id).await?;

        let stale = self.store.delete_author_relations(author_id).await?;
        if stale > 0 {
            tracing::debug!(author_id, stale, "Dropped stale relations before rebuild");
        }

        let mut inserted = 0u64;
        for (index, belief_a) in beliefs.iter().enumerate() {
            for belief_b in &beliefs[index + 1..] {
                let (relation, confidence) = self.relate(&belief_a.text, &belief_b.text).await;
                self.store
                    .create_relation(author_id, &belief_a.text, &belief_b.text, relation, confidence)
                    .await?;
                inserted += 1;
            }
        }

        tracing::info!(author_id, relations = inserted, "Relation build complete");
        Ok(inserted)
    }
}
