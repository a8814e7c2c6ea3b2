use std::sync::Arc;

use regex::Regex;
use serde::Deserialize;

use crate::db::GraphStore;
use crate::error::Result;
use crate::llm::{prompts, CompletionOptions, LlmProvider};
use crate::models::ClaimType;

/// Wrapper struct for parsing the strict JSON response shape
#[derive(Debug, Deserialize)]
struct ClaimTypeResponse {
    #[serde(rename = "type")]
    claim_type: String,
}

/// Resolve a raw model reply to a claim type, never failing.
///
/// Three stages: strict JSON with an exact uppercase label, then the
/// first uppercase label found anywhere in the reply, then DISCUSSED.
/// DISCUSSED is the safe default: a claim we cannot place is treated as
/// reported speech and stays out of the author's belief set.
pub fn parse_claim_type(raw: &str) -> ClaimType {
    if let Ok(response) = serde_json::from_str::<ClaimTypeResponse>(raw.trim()) {
        match response.claim_type.as_str() {
            "ADVANCED" => return ClaimType::Advanced,
            "DISCUSSED" => return ClaimType::Discussed,
            "META" => return ClaimType::Meta,
            _ => {}
        }
    }

    if let Ok(pattern) = Regex::new(r"(ADVANCED|DISCUSSED|META)") {
        if let Some(found) = pattern.find(raw) {
            match found.as_str() {
                "ADVANCED" => return ClaimType::Advanced,
                "DISCUSSED" => return ClaimType::Discussed,
                "META" => return ClaimType::Meta,
                _ => {}
            }
        }
    }

    ClaimType::Discussed
}

/// Labels claim occurrences as ADVANCED / DISCUSSED / META.
pub struct ClaimClassifier {
    store: Arc<dyn GraphStore>,
    llm: LlmProvider,
    batch_size: usize,
}

impl ClaimClassifier {
    pub fn new(store: Arc<dyn GraphStore>, llm: LlmProvider, batch_size: usize) -> Self {
        Self {
            store,
            llm,
            batch_size: batch_size.max(1),
        }
    }

    /// Classify one claim text. Call failures degrade to DISCUSSED so a
    /// flaky model never blocks the pipeline.
    pub async fn classify(&self, text: &str) -> ClaimType {
        let prompt = prompts::claim_type_prompt(text);
        let options = CompletionOptions {
            temperature: Some(0.0),
            max_tokens: Some(120),
        };

        match self.llm.complete(&prompt, Some(&options)).await {
            Ok(raw) => parse_claim_type(&raw),
            Err(error) => {
                tracing::warn!(error = %error, "Claim classification failed, defaulting to DISCUSSED");
                ClaimType::Discussed
            }
        }
    }

    /// Pull unclassified rows in small batches until none remain. Every
    /// pulled row gets a label (possibly the default), so the loop always
    /// terminates and an interrupted run resumes where it stopped.
    pub async fn classify_missing(&self) -> Result<u64> {
        if !self.llm.is_available() {
            tracing::warn!("LLM unavailable, leaving claims unclassified for a later run");
            return Ok(0);
        }

        let mut total = 0u64;
        loop {
            let batch = self.store.get_unclassified_claims(self.batch_size).await?;
            if batch.is_empty() {
                break;
            }

            for claim in &batch {
                let claim_type = self.classify(&claim.text).await;
                self.store.set_claim_type(claim.id, claim_type).await?;
                total += 1;
            }
        }

        tracing::info!(classified = total, "Claim classification complete");
        Ok(total)
    }
}
