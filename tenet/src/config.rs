use serde::Deserialize;
use std::env;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    let Ok(raw) = env::var(var) else {
        return default;
    };

    match raw.parse() {
        Ok(parsed) => parsed,
        Err(error) => {
            tracing::warn!("Invalid value '{}' for {}: {}. Using default.", raw, var, error);
            default
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub embeddings: EmbeddingsConfig,
    pub analysis: AnalysisConfig,
    pub llm: Option<LlmConfig>,
}

const JOURNAL_MODES: &[&str] = &["DELETE", "TRUNCATE", "PERSIST", "MEMORY", "WAL", "OFF"];
const SYNCHRONOUS_LEVELS: &[&str] = &["OFF", "NORMAL", "FULL", "EXTRA"];

/// Read an env var constrained to a fixed set of uppercase keywords.
fn env_choice(var: &str, allowed: &[&str], default: &str) -> String {
    match env::var(var) {
        Ok(val) => {
            let upper = val.trim().to_uppercase();
            if allowed.contains(&upper.as_str()) {
                upper
            } else {
                tracing::warn!(
                    "Invalid value '{}' for {}: expected one of {:?}. Using {}.",
                    val,
                    var,
                    allowed,
                    default
                );
                default.to_string()
            }
        }
        Err(_) => default.to_string(),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub auth_token: Option<String>,
    pub local_path: Option<String>,
    pub busy_timeout_ms: u64,
    pub journal_mode: String,
    pub synchronous: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: ":memory:".to_string(),
            auth_token: None,
            local_path: None,
            busy_timeout_ms: 5000,
            journal_mode: "WAL".to_string(),
            synchronous: "NORMAL".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingsConfig {
    pub model: String,
    pub dimensions: usize,
    pub batch_size: usize,
}

/// Tunables for the belief pipeline. Defaults match the thresholds the
/// grouping and projection stages were calibrated against.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// Minimum cosine similarity (inclusive) for a claim to join a belief
    /// group's seed.
    pub belief_similarity_threshold: f64,
    /// Minimum cosine similarity (exclusive) for topic labels to merge.
    pub topic_similarity_threshold: f64,
    /// Minimum cosine similarity (inclusive) for a topic to project onto a
    /// domain anchor.
    pub anchor_similarity_threshold: f64,
    /// Rows pulled per classification round; bounds cost per call burst
    /// and keeps the stage resumable.
    pub classify_batch_size: usize,
    pub profile_belief_limit: usize,
    pub profile_tension_limit: usize,
    pub profile_topic_limit: usize,
}

/// LLM configuration for the classification, relation, and summary calls
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or_else(|_| "file:tenet.db".to_string()),
                auth_token: env::var("DATABASE_AUTH_TOKEN").ok(),
                local_path: env::var("DATABASE_LOCAL_PATH").ok(),
                busy_timeout_ms: parse_env_or("DATABASE_BUSY_TIMEOUT_MS", 5000),
                journal_mode: env_choice("DATABASE_JOURNAL_MODE", JOURNAL_MODES, "WAL"),
                synchronous: env_choice("DATABASE_SYNCHRONOUS", SYNCHRONOUS_LEVELS, "NORMAL"),
            },
            embeddings: EmbeddingsConfig {
                model: env::var("EMBEDDING_MODEL")
                    .unwrap_or_else(|_| "BAAI/bge-small-en-v1.5".to_string()),
                dimensions: parse_env_or("EMBEDDING_DIMENSIONS", 384),
                batch_size: parse_env_or("EMBEDDING_BATCH_SIZE", 64),
            },
            analysis: AnalysisConfig {
                belief_similarity_threshold: parse_env_or("BELIEF_SIMILARITY_THRESHOLD", 0.72),
                topic_similarity_threshold: parse_env_or("TOPIC_SIMILARITY_THRESHOLD", 0.78),
                anchor_similarity_threshold: parse_env_or("ANCHOR_SIMILARITY_THRESHOLD", 0.55),
                classify_batch_size: parse_env_or("CLASSIFY_BATCH_SIZE", 20),
                profile_belief_limit: parse_env_or("PROFILE_BELIEF_LIMIT", 12),
                profile_tension_limit: parse_env_or("PROFILE_TENSION_LIMIT", 8),
                profile_topic_limit: parse_env_or("PROFILE_TOPIC_LIMIT", 8),
            },
            llm: env::var("LLM_MODEL").ok().map(|model| LlmConfig {
                model,
                api_key: env::var("LLM_API_KEY").ok(),
                base_url: env::var("LLM_BASE_URL").ok(),
                timeout_secs: parse_env_or("LLM_TIMEOUT", 30),
                max_retries: parse_env_or("LLM_MAX_RETRIES", 3),
            }),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

const KNOWN_EMBEDDING_PROVIDERS: &[&str] = &["openai", "openrouter", "ollama", "lmstudio", "local"];
const KNOWN_LLM_PROVIDERS: &[&str] = &["openai", "openrouter", "groq", "ollama", "lmstudio"];

/// Split an embedding model name into (provider, model).
pub fn parse_provider_model(model: &str) -> (&str, &str) {
    split_known_provider(model, KNOWN_EMBEDDING_PROVIDERS)
}

/// Split an LLM model name into (provider, model).
pub fn parse_llm_provider_model(model: &str) -> (&str, &str) {
    split_known_provider(model, KNOWN_LLM_PROVIDERS)
}

/// Unrecognized prefixes stay part of the model name, under the "local"
/// provider. HuggingFace-style org prefixes pass through this way.
fn split_known_provider<'a>(model: &'a str, known: &[&str]) -> (&'a str, &'a str) {
    if let Some((prefix, rest)) = model.split_once('/') {
        if known.contains(&prefix.to_lowercase().as_str()) {
            return (prefix, rest);
        }
    }
    ("local", model)
}
