use crate::config::{parse_llm_provider_model, LlmConfig};
use crate::error::{Result, TenetError};
use crate::llm::api::LlmApiClient;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmBackend {
    OpenAI,
    OpenRouter,
    Groq,
    Ollama,
    LmStudio,
    OpenAICompatible { base_url: String },
    Unavailable { reason: String },
}

#[derive(Debug, Clone, Default)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// Facade over whatever chat-completion endpoint is configured. Built once
/// at startup; an unconfigured deployment gets an Unavailable provider and
/// every LLM-backed stage degrades to its documented fallback.
#[derive(Clone)]
pub struct LlmProvider {
    backend: LlmBackend,
    client: Option<LlmApiClient>,
}

impl LlmProvider {
    pub fn new(config: Option<&LlmConfig>) -> Self {
        let Some(config) = config else {
            return Self::unavailable("No LLM configuration provided");
        };

        let (provider, _) = parse_llm_provider_model(&config.model);

        let backend = match provider.to_lowercase().as_str() {
            "openai" => LlmBackend::OpenAI,
            "openrouter" => LlmBackend::OpenRouter,
            "groq" => LlmBackend::Groq,
            "ollama" => LlmBackend::Ollama,
            "lmstudio" => LlmBackend::LmStudio,
            _ => match &config.base_url {
                Some(base_url) => LlmBackend::OpenAICompatible {
                    base_url: base_url.clone(),
                },
                None => {
                    return Self::unavailable(&format!(
                        "Unknown provider in model: {}",
                        config.model
                    ))
                }
            },
        };

        match LlmApiClient::new(config) {
            Ok(client) => Self {
                backend,
                client: Some(client),
            },
            Err(error) => Self::unavailable(&format!("LLM configuration rejected: {error}")),
        }
    }

    pub fn unavailable(reason: &str) -> Self {
        Self {
            backend: LlmBackend::Unavailable {
                reason: reason.to_string(),
            },
            client: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.client.is_some()
    }

    pub fn backend(&self) -> &LlmBackend {
        &self.backend
    }

    pub async fn complete(
        &self,
        prompt: &str,
        options: Option<&CompletionOptions>,
    ) -> Result<String> {
        self.client()?.complete(prompt, options).await
    }

    fn client(&self) -> Result<&LlmApiClient> {
        self.client
            .as_ref()
            .ok_or_else(|| TenetError::LlmUnavailable(self.unavailable_reason()))
    }

    fn unavailable_reason(&self) -> String {
        match &self.backend {
            LlmBackend::Unavailable { reason } => reason.clone(),
            _ => "LLM client not initialized".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_yields_unavailable_provider() {
        let provider = LlmProvider::new(None);
        assert!(!provider.is_available());
        assert!(matches!(
            provider.backend(),
            LlmBackend::Unavailable { .. }
        ));
    }

    #[tokio::test]
    async fn test_unavailable_provider_refuses_completions() {
        let provider = LlmProvider::unavailable("disabled in tests");
        let err = provider.complete("hello", None).await.unwrap_err();
        assert!(matches!(err, TenetError::LlmUnavailable(_)));
    }

    #[test]
    fn test_provider_prefix_selects_backend() {
        let config = LlmConfig {
            model: "groq/llama-3.1-8b-instant".to_string(),
            api_key: Some("sk-test".to_string()),
            base_url: None,
            timeout_secs: 30,
            max_retries: 3,
        };
        let provider = LlmProvider::new(Some(&config));
        assert!(provider.is_available());
        assert_eq!(provider.backend(), &LlmBackend::Groq);
    }

    #[test]
    fn test_hosted_provider_without_key_degrades_to_unavailable() {
        let config = LlmConfig {
            model: "openai/gpt-4o-mini".to_string(),
            api_key: None,
            base_url: None,
            timeout_secs: 30,
            max_retries: 0,
        };
        let provider = LlmProvider::new(Some(&config));
        assert!(!provider.is_available());
        assert!(matches!(
            provider.backend(),
            LlmBackend::Unavailable { .. }
        ));
    }

    #[test]
    fn test_unknown_provider_with_base_url_is_openai_compatible() {
        let config = LlmConfig {
            model: "somevendor/custom-model".to_string(),
            api_key: Some("sk-test".to_string()),
            base_url: Some("https://llm.internal/v1".to_string()),
            timeout_secs: 30,
            max_retries: 3,
        };
        let provider = LlmProvider::new(Some(&config));
        assert_eq!(
            provider.backend(),
            &LlmBackend::OpenAICompatible {
                base_url: "https://llm.internal/v1".to_string()
            }
        );
    }
}
