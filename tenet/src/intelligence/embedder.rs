use std::sync::Arc;

use crate::db::GraphStore;
use crate::embeddings::EmbeddingProvider;
use crate::error::Result;

/// Fills in embeddings for claim occurrences that do not have one yet.
///
/// Runs after classification but does not depend on it: every occurrence
/// gets a vector, so a claim reclassified later never needs re-embedding.
pub struct ClaimEmbedder {
    store: Arc<dyn GraphStore>,
    embeddings: EmbeddingProvider,
    batch_size: usize,
}

impl ClaimEmbedder {
    pub fn new(store: Arc<dyn GraphStore>, embeddings: EmbeddingProvider, batch_size: usize) -> Self {
        Self {
            store,
            embeddings,
            batch_size: batch_size.max(1),
        }
    }

    /// Embed all pending rows. A failing batch is logged and skipped so the
    /// rest still lands; skipped rows stay pending for the next run.
    pub async fn embed_missing(&self) -> Result<u64> {
        let pending = self.store.get_unembedded_claims().await?;
        if pending.is_empty() {
            return Ok(0);
        }

        let mut stored = 0u64;
        for batch in pending.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|claim| claim.text.clone()).collect();
            let vectors = match self.embeddings.embed(texts).await {
                Ok(vectors) => vectors,
                Err(error) => {
                    tracing::warn!(
                        error = %error,
                        batch_len = batch.len(),
                        "Embedding batch failed, leaving rows for a later run"
                    );
                    continue;
                }
            };

            let updates: Vec<(i64, Vec<f32>)> = batch
                .iter()
                .zip(vectors)
                .map(|(claim, vector)| (claim.id, vector))
                .collect();
            stored += self.store.set_claim_embeddings_batch(&updates).await?;
        }

        tracing::info!(embedded = stored, "Claim embedding complete");
        Ok(stored)
    }
}
