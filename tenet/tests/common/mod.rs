use std::sync::Arc;

use tempfile::TempDir;
use tenet::config::{DatabaseConfig, EmbeddingsConfig, LlmConfig};
use tenet::db::{Database, GraphStore, LibSqlBackend};
use tenet::embeddings::EmbeddingProvider;
use tenet::llm::LlmProvider;

/// Open a fresh file-backed store inside its own temp directory.
pub async fn setup_store() -> (Arc<dyn GraphStore>, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("tenet_test.db");

    let config = DatabaseConfig {
        url: format!("file:{}", db_path.to_str().unwrap()),
        ..Default::default()
    };
    let db = Database::new(&config)
        .await
        .expect("Failed to create database");

    (Arc::new(LibSqlBackend::new(db)), temp_dir)
}

/// LLM provider pointed at a wiremock server.
pub fn test_llm(base_url: String) -> LlmProvider {
    LlmProvider::new(Some(&LlmConfig {
        model: "openai/gpt-4o-mini".to_string(),
        api_key: Some("test-key".to_string()),
        base_url: Some(base_url),
        timeout_secs: 5,
        max_retries: 0,
    }))
}

/// The same local embedding model the default config ships.
#[allow(dead_code)]
pub fn test_embeddings_provider() -> EmbeddingProvider {
    EmbeddingProvider::new(&EmbeddingsConfig {
        model: "BAAI/bge-small-en-v1.5".to_string(),
        dimensions: 384,
        batch_size: 8,
    })
    .expect("Failed to load embedding model")
}

/// OpenAI-shaped chat completion body with the given assistant content.
pub fn chat_response(content: &str) -> serde_json::Value {
    serde_json::json!({
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
