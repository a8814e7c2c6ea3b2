use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::{Arc, Mutex};

use crate::config::{parse_provider_model, EmbeddingsConfig};
use crate::error::{Result, TenetError};

/// Local sentence-embedding model behind a blocking-safe handle.
///
/// Claims are always compared against other claims, so texts are embedded
/// bare: no query/passage prefixing, one model for everything.
#[derive(Clone)]
pub struct EmbeddingProvider {
    model: Arc<Mutex<TextEmbedding>>,
    batch_size: usize,
    dimensions: usize,
}

// Manual impl because fastembed's TextEmbedding is not Debug.
impl std::fmt::Debug for EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingProvider")
            .field("batch_size", &self.batch_size)
            .field("dimensions", &self.dimensions)
            .finish_non_exhaustive()
    }
}

impl EmbeddingProvider {
    /// Sync constructor for local models only.
    pub fn new(config: &EmbeddingsConfig) -> Result<Self> {
        let (provider, model_name) = parse_provider_model(&config.model);

        if provider != "local" {
            return Err(TenetError::Embedding(format!(
                "Unsupported embedding provider: {provider}. Local embeddings only.",
            )));
        }

        let model = build_model(resolve_embedding_model(model_name))?;

        Ok(Self {
            model: Arc::new(Mutex::new(model)),
            batch_size: config.batch_size.max(1),
            dimensions: config.dimensions,
        })
    }

    /// Embed a batch of claim texts, preserving input order. Long inputs
    /// are chunked so one call never pins the blocking pool for minutes.
    pub async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut all_embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            let mut embedded = self.embed_chunk(batch.to_vec()).await?;
            all_embeddings.append(&mut embedded);
            tokio::task::yield_now().await;
        }

        Ok(all_embeddings)
    }

    pub async fn embed_single(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed(vec![text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| TenetError::Embedding("No embedding generated".to_string()))
    }

    async fn embed_chunk(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let model = Arc::clone(&self.model);
        let batch_size = self.batch_size;
        tokio::task::spawn_blocking(move || {
            let mut model = model.lock().map_err(|e| {
                TenetError::Embedding(format!("Embedding model lock poisoned: {e}"))
            })?;
            model
                .embed(texts, Some(batch_size))
                .map_err(|e| TenetError::Embedding(e.to_string()))
        })
        .await
        .map_err(|e| TenetError::Embedding(format!("Embedding worker failed: {e}")))?
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

fn resolve_embedding_model(model_name: &str) -> EmbeddingModel {
    match model_name {
        "BAAI/bge-small-en-v1.5" | "bge-small-en-v1.5" => EmbeddingModel::BGESmallENV15,
        "BAAI/bge-base-en-v1.5" | "bge-base-en-v1.5" => EmbeddingModel::BGEBaseENV15,
        "BAAI/bge-large-en-v1.5" | "bge-large-en-v1.5" => EmbeddingModel::BGELargeENV15,
        "all-MiniLM-L6-v2" | "sentence-transformers/all-MiniLM-L6-v2" => {
            EmbeddingModel::AllMiniLML6V2
        }
        "all-MiniLM-L12-v2" | "sentence-transformers/all-MiniLM-L12-v2" => {
            EmbeddingModel::AllMiniLML12V2
        }
        "nomic-embed-text-v1" | "nomic-ai/nomic-embed-text-v1" => EmbeddingModel::NomicEmbedTextV1,
        "nomic-embed-text-v1.5" | "nomic-ai/nomic-embed-text-v1.5" => {
            EmbeddingModel::NomicEmbedTextV15
        }
        _ => EmbeddingModel::BGESmallENV15,
    }
}

fn build_model(embedding_model: EmbeddingModel) -> Result<TextEmbedding> {
    TextEmbedding::try_new(InitOptions::new(embedding_model).with_show_download_progress(true))
        .map_err(|e| TenetError::Embedding(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_names_resolve_with_and_without_org_prefix() {
        assert!(matches!(
            resolve_embedding_model("BAAI/bge-small-en-v1.5"),
            EmbeddingModel::BGESmallENV15
        ));
        assert!(matches!(
            resolve_embedding_model("bge-small-en-v1.5"),
            EmbeddingModel::BGESmallENV15
        ));
        assert!(matches!(
            resolve_embedding_model("all-MiniLM-L6-v2"),
            EmbeddingModel::AllMiniLML6V2
        ));
    }

    #[test]
    fn test_unknown_model_name_falls_back_to_default() {
        assert!(matches!(
            resolve_embedding_model("made-up-model"),
            EmbeddingModel::BGESmallENV15
        ));
    }

    #[test]
    fn test_hosted_embedding_providers_are_rejected() {
        let config = EmbeddingsConfig {
            model: "openai/text-embedding-3-small".to_string(),
            dimensions: 1536,
            batch_size: 16,
        };
        let err = EmbeddingProvider::new(&config).unwrap_err();
        assert!(matches!(err, TenetError::Embedding(_)));
    }
}
