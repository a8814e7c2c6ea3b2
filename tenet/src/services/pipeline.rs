use std::sync::Arc;

use crate::config::AnalysisConfig;
use crate::db::GraphStore;
use crate::embeddings::EmbeddingProvider;
use crate::error::Result;
use crate::intelligence::{
    BeliefConsolidator, ClaimClassifier, ClaimEmbedder, ClaimExtractor, ProfileBuilder,
    RelationBuilder,
};
use crate::llm::LlmProvider;

/// Per-stage counts from one pipeline sweep. Every stage reports how many
/// units it actually processed, so callers can see where a run stalled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineReport {
    pub claims_extracted: u64,
    pub claims_classified: u64,
    pub claims_embedded: u64,
    pub beliefs_written: u64,
    pub relations_written: u64,
    pub profile_written: bool,
}

/// Runs the whole belief pipeline for one author, in dependency order:
/// extract, classify, embed, consolidate, relate, profile. Relations are
/// rebuilt only after consolidation settles the belief set they classify.
///
/// Each stage persists its own progress, so an interrupted run resumes
/// from wherever the previous one stopped.
pub struct BeliefPipeline {
    extractor: ClaimExtractor,
    classifier: ClaimClassifier,
    embedder: ClaimEmbedder,
    consolidator: BeliefConsolidator,
    relations: RelationBuilder,
    profiles: ProfileBuilder,
}

impl BeliefPipeline {
    pub fn new(
        store: Arc<dyn GraphStore>,
        embeddings: EmbeddingProvider,
        llm: LlmProvider,
        config: &AnalysisConfig,
    ) -> Self {
        Self {
            extractor: ClaimExtractor::new(store.clone()),
            classifier: ClaimClassifier::new(store.clone(), llm.clone(), config.classify_batch_size),
            embedder: ClaimEmbedder::new(store.clone(), embeddings, config.classify_batch_size),
            consolidator: BeliefConsolidator::new(store.clone(), config.belief_similarity_threshold),
            relations: RelationBuilder::new(store.clone(), llm.clone()),
            profiles: ProfileBuilder::new(store, llm, config),
        }
    }

    pub async fn run_for_author(&self, author_id: &str) -> Result<PipelineReport> {
        let mut report = PipelineReport::default();

        report.claims_extracted = self.extractor.backfill_author(author_id).await?;
        report.claims_classified = self.classifier.classify_missing().await?;
        report.claims_embedded = self.embedder.embed_missing().await?;
        report.beliefs_written = self.consolidator.consolidate_author(author_id).await?;
        report.relations_written = self.relations.build_for_author(author_id).await?;
        report.profile_written = self.profiles.build_for_author(author_id).await?.is_some();

        tracing::info!(
            author_id,
            extracted = report.claims_extracted,
            classified = report.claims_classified,
            embedded = report.claims_embedded,
            beliefs = report.beliefs_written,
            relations = report.relations_written,
            "Pipeline run complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, DatabaseConfig, EmbeddingsConfig, LlmConfig};
    use crate::db::{Database, LibSqlBackend};
    use crate::models::PostAnalysis;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::NamedTempFile;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn chat_response(content: &str) -> serde_json::Value {
        json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "created": 1,
            "model": "gpt-4o-mini",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 20, "total_tokens": 30}
        })
    }

    fn test_llm(base_url: String) -> LlmProvider {
        LlmProvider::new(Some(&LlmConfig {
            model: "openai/gpt-4o-mini".to_string(),
            api_key: Some("test-key".to_string()),
            base_url: Some(base_url),
            timeout_secs: 5,
            max_retries: 0,
        }))
    }

    fn test_embeddings_provider() -> EmbeddingProvider {
        EmbeddingProvider::new(&EmbeddingsConfig {
            model: "BAAI/bge-small-en-v1.5".to_string(),
            dimensions: 384,
            batch_size: 8,
        })
        .unwrap()
    }

    async fn setup_store() -> (Arc<dyn GraphStore>, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let config = DatabaseConfig {
            url: temp_file.path().to_str().unwrap().to_string(),
            ..Default::default()
        };
        let db = Database::new(&config).await.unwrap();
        (Arc::new(LibSqlBackend::new(db)), temp_file)
    }

    #[tokio::test]
    async fn test_full_run_builds_graph_for_author() {
        let server = MockServer::start().await;
        // One mock serves every LLM stage: ADVANCED keeps claims
        // clusterable, and the relation parser treats the same payload as
        // missing fields and falls back to UNRELATED.
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(chat_response(r#"{"type": "ADVANCED"}"#)),
            )
            .mount(&server)
            .await;

        let (store, _temp) = setup_store().await;
        let author = store.upsert_author("Jane Writer", None).await.unwrap();
        let post = store
            .upsert_post(&author.id, "https://example.com/p/1", Some("On AI"), None)
            .await
            .unwrap();
        let mut analysis = PostAnalysis::new(post.id.clone());
        analysis.main_claim = Some("AI will reshape education".to_string());
        analysis.arguments_for = vec!["Tutoring scales with software".to_string()];
        analysis.confidence = Some(0.8);
        analysis.topics = vec!["ai".to_string()];
        store.upsert_post_analysis(&analysis).await.unwrap();

        let pipeline = BeliefPipeline::new(
            store.clone(),
            test_embeddings_provider(),
            test_llm(server.uri()),
            &Config::default().analysis,
        );

        let report = pipeline.run_for_author(&author.id).await.unwrap();
        assert_eq!(report.claims_extracted, 2);
        assert_eq!(report.claims_classified, 2);
        assert_eq!(report.claims_embedded, 2);
        assert!(report.beliefs_written >= 1);
        assert!(report.profile_written);

        let beliefs = store.get_author_beliefs(&author.id).await.unwrap();
        assert_eq!(
            beliefs.iter().map(|b| b.support_count).sum::<i64>() as u64,
            report.claims_extracted
        );
        assert!(store.get_profile(&author.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(chat_response(r#"{"type": "ADVANCED"}"#)),
            )
            .mount(&server)
            .await;

        let (store, _temp) = setup_store().await;
        let author = store.upsert_author("Jane Writer", None).await.unwrap();
        let post = store
            .upsert_post(&author.id, "https://example.com/p/1", None, None)
            .await
            .unwrap();
        let mut analysis = PostAnalysis::new(post.id.clone());
        analysis.main_claim = Some("AI will reshape education".to_string());
        store.upsert_post_analysis(&analysis).await.unwrap();

        let pipeline = BeliefPipeline::new(
            store.clone(),
            test_embeddings_provider(),
            test_llm(server.uri()),
            &Config::default().analysis,
        );

        let first = pipeline.run_for_author(&author.id).await.unwrap();
        assert_eq!(first.claims_extracted, 1);
        assert_eq!(first.beliefs_written, 1);

        let second = pipeline.run_for_author(&author.id).await.unwrap();
        assert_eq!(second.claims_extracted, 0);
        assert_eq!(second.claims_classified, 0);
        assert_eq!(second.claims_embedded, 0);
        assert_eq!(second.beliefs_written, 1);

        assert_eq!(store.get_author_beliefs(&author.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_run_without_llm_still_consolidates_nothing_fatally() {
        let (store, _temp) = setup_store().await;
        let author = store.upsert_author("Jane Writer", None).await.unwrap();
        let post = store
            .upsert_post(&author.id, "https://example.com/p/1", None, None)
            .await
            .unwrap();
        let mut analysis = PostAnalysis::new(post.id.clone());
        analysis.main_claim = Some("AI will reshape education".to_string());
        store.upsert_post_analysis(&analysis).await.unwrap();

        let pipeline = BeliefPipeline::new(
            store.clone(),
            test_embeddings_provider(),
            LlmProvider::unavailable("not configured"),
            &Config::default().analysis,
        );

        let report = pipeline.run_for_author(&author.id).await.unwrap();
        assert_eq!(report.claims_extracted, 1);
        assert_eq!(report.claims_classified, 0);
        // Unclassified claims embed but never cluster, so no beliefs yet.
        assert_eq!(report.claims_embedded, 1);
        assert_eq!(report.beliefs_written, 0);
        assert!(!report.profile_written);
    }
}
