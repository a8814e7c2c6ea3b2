use std::time::Duration;

use reqwest::StatusCode;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
    },
    Client,
};

use crate::{
    config::{parse_llm_provider_model, LlmConfig},
    error::{Result, TenetError},
    llm::provider::CompletionOptions,
};

#[derive(Clone)]
pub struct LlmApiClient {
    client: Client<OpenAIConfig>,
    model: String,
    max_retries: u32,
}

/// How a failed chat call should be handled by the retry loop.
enum CallFailure {
    RateLimited,
    AuthRejected(String),
    Retryable(TenetError),
    Fatal(TenetError),
}

impl LlmApiClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let (provider, model) = parse_llm_provider_model(&config.model);
        let provider = provider.to_lowercase();

        let hosted = !matches!(provider.as_str(), "ollama" | "local" | "lmstudio");
        if hosted && config.api_key.is_none() {
            return Err(TenetError::Llm(
                "API key required for this provider".to_string(),
            ));
        }

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| default_base_url(&provider).to_string());

        let openai_config = OpenAIConfig::new()
            .with_api_base(base_url)
            .with_api_key(config.api_key.clone().unwrap_or_default());

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| {
                TenetError::Llm(format!("Failed to create LLM HTTP client: {error}"))
            })?;

        // async-openai retries 500s internally for up to 15 minutes by
        // default; cap its backoff at our timeout so the outer retry loop
        // stays in charge.
        let backoff = backoff::ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(config.timeout_secs)),
            ..Default::default()
        };

        let client = Client::with_config(openai_config)
            .with_http_client(http_client)
            .with_backoff(backoff);

        Ok(Self {
            client,
            model: model.to_string(),
            max_retries: config.max_retries,
        })
    }

    pub async fn complete(
        &self,
        prompt: &str,
        options: Option<&CompletionOptions>,
    ) -> Result<String> {
        if prompt.trim().is_empty() {
            return Err(TenetError::Validation("Prompt cannot be empty".to_string()));
        }

        let request = self.build_request(prompt, options)?;
        let response = self.send_with_retry(request).await?;
        extract_content(response)
    }

    /// Retries transient failures with exponential delay (100ms, 200ms,
    /// 400ms...). Rate limits and auth rejections surface immediately.
    async fn send_with_retry(
        &self,
        request: CreateChatCompletionRequest,
    ) -> Result<CreateChatCompletionResponse> {
        let mut attempt: u32 = 0;

        loop {
            let error = match self.client.chat().create(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(error) => error,
            };

            match classify_failure(error) {
                CallFailure::RateLimited => {
                    return Err(TenetError::LlmRateLimit { retry_after: None })
                }
                CallFailure::AuthRejected(message) => return Err(TenetError::Llm(message)),
                CallFailure::Retryable(mapped) if attempt < self.max_retries => {
                    attempt += 1;
                    let delay = Duration::from_millis(100 * 2_u64.pow(attempt - 1));
                    tracing::debug!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %mapped,
                        "Retrying LLM call"
                    );
                    tokio::time::sleep(delay).await;
                }
                CallFailure::Retryable(mapped) | CallFailure::Fatal(mapped) => return Err(mapped),
            }
        }
    }

    fn build_request(
        &self,
        prompt: &str,
        options: Option<&CompletionOptions>,
    ) -> Result<CreateChatCompletionRequest> {
        let messages = vec![ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|error| TenetError::Validation(format!("Invalid user prompt: {error}")))?
            .into()];

        let mut request = CreateChatCompletionRequestArgs::default();
        request.model(self.model.clone()).messages(messages);

        if let Some(options) = options {
            if let Some(temperature) = options.temperature {
                request.temperature(temperature);
            }
            if let Some(max_tokens) = options.max_tokens {
                request.max_tokens(max_tokens);
            }
        }

        request.build().map_err(|error| {
            TenetError::Validation(format!("Invalid LLM completion request: {error}"))
        })
    }
}

fn extract_content(response: CreateChatCompletionResponse) -> Result<String> {
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .unwrap_or_default();

    if content.trim().is_empty() {
        return Err(TenetError::Llm(
            "LLM returned an empty completion".to_string(),
        ));
    }

    Ok(content)
}

fn classify_failure(error: OpenAIError) -> CallFailure {
    match error {
        OpenAIError::Reqwest(request_error) => {
            let status = request_error.status();
            if status == Some(StatusCode::TOO_MANY_REQUESTS) {
                CallFailure::RateLimited
            } else if status == Some(StatusCode::UNAUTHORIZED)
                || status == Some(StatusCode::FORBIDDEN)
            {
                CallFailure::AuthRejected(format!("LLM authentication failed: {request_error}"))
            } else if status.map(|s| s.is_server_error()).unwrap_or(true) {
                CallFailure::Retryable(TenetError::Llm(format!(
                    "LLM request failed: {request_error}"
                )))
            } else {
                CallFailure::Fatal(TenetError::Llm(format!(
                    "LLM request failed: {request_error}"
                )))
            }
        }
        OpenAIError::ApiError(api_error) => {
            let message = api_error.message.to_lowercase();
            let kind = api_error.r#type.clone().unwrap_or_default().to_lowercase();
            let code = api_error.code.clone().unwrap_or_default().to_lowercase();

            if message.contains("rate limit")
                || message.contains("too many requests")
                || kind.contains("rate_limit")
                || code.contains("rate_limit")
                || code == "insufficient_quota"
            {
                return CallFailure::RateLimited;
            }

            if message.contains("unauthorized")
                || message.contains("forbidden")
                || message.contains("authentication")
                || message.contains("invalid api key")
                || code.contains("invalid_api_key")
                || code.contains("authentication")
                || kind.contains("authentication")
            {
                return CallFailure::AuthRejected(format!(
                    "LLM authentication failed: {api_error}"
                ));
            }

            // Untyped API errors come from OpenAI-compatible proxies
            // relaying transport hiccups; typed ones are real rejections.
            let mapped = TenetError::Llm(format!("LLM API error: {api_error}"));
            if api_error.r#type.is_none() && api_error.code.is_none() {
                CallFailure::Retryable(mapped)
            } else {
                CallFailure::Fatal(mapped)
            }
        }
        OpenAIError::JSONDeserialize(err) => {
            CallFailure::Fatal(TenetError::Llm(format!("Failed to parse LLM response: {err}")))
        }
        OpenAIError::InvalidArgument(message) => {
            CallFailure::Fatal(TenetError::Validation(message))
        }
        other => CallFailure::Fatal(TenetError::Llm(other.to_string())),
    }
}

fn default_base_url(provider: &str) -> &'static str {
    match provider.to_lowercase().as_str() {
        "openai" => "https://api.openai.com/v1",
        "openrouter" => "https://openrouter.ai/api/v1",
        "groq" => "https://api.groq.com/openai/v1",
        "ollama" => "http://localhost:11434/v1",
        "lmstudio" => "http://localhost:1234/v1",
        _ => "https://api.openai.com/v1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmConfig;

    fn test_llm_config() -> LlmConfig {
        LlmConfig {
            model: "ollama/llama3".to_string(),
            api_key: None,
            base_url: None,
            timeout_secs: 30,
            max_retries: 0,
        }
    }

    #[test]
    fn test_groq_models_resolve_their_base_url() {
        assert_eq!(default_base_url("groq"), "https://api.groq.com/openai/v1");
        assert_eq!(default_base_url("GROQ"), "https://api.groq.com/openai/v1");
        assert_eq!(
            default_base_url("somebody-else"),
            "https://api.openai.com/v1"
        );
    }

    #[test]
    fn test_api_key_required_for_hosted_providers() {
        let config = LlmConfig {
            model: "groq/llama-3.1-8b-instant".to_string(),
            ..test_llm_config()
        };
        assert!(LlmApiClient::new(&config).is_err());

        let with_key = LlmConfig {
            api_key: Some("sk-test".to_string()),
            ..config
        };
        assert!(LlmApiClient::new(&with_key).is_ok());
    }

    #[test]
    fn test_provider_prefix_stripped_from_model() {
        let client = LlmApiClient::new(&test_llm_config()).expect("client should be created");
        assert_eq!(client.model, "llama3");

        let bare = LlmConfig {
            model: "llama3".to_string(),
            ..test_llm_config()
        };
        let client = LlmApiClient::new(&bare).expect("client should be created");
        assert_eq!(client.model, "llama3");
    }

    #[test]
    fn test_build_request_does_not_force_json_object_format() {
        let client = LlmApiClient::new(&test_llm_config()).expect("client should be created");

        let request = client
            .build_request("test prompt", None)
            .expect("request should build");

        assert!(
            request.response_format.is_none(),
            "request should NOT set response_format; fallback parsing handles prose replies"
        );
    }

    fn api_error(json: &str) -> OpenAIError {
        OpenAIError::ApiError(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_untyped_api_errors_are_retryable() {
        let untyped = api_error(r#"{"message": "upstream connect error"}"#);
        assert!(matches!(
            classify_failure(untyped),
            CallFailure::Retryable(_)
        ));

        let typed = api_error(
            r#"{"message": "context length exceeded", "type": "invalid_request_error", "code": "context_length_exceeded"}"#,
        );
        assert!(matches!(classify_failure(typed), CallFailure::Fatal(_)));
    }

    #[test]
    fn test_quota_and_auth_responses_classify_before_retry() {
        let quota = api_error(
            r#"{"message": "You exceeded your current quota", "type": "insufficient_quota", "code": "insufficient_quota"}"#,
        );
        assert!(matches!(classify_failure(quota), CallFailure::RateLimited));

        let bad_key = api_error(
            r#"{"message": "Incorrect API key provided", "type": "invalid_request_error", "code": "invalid_api_key"}"#,
        );
        assert!(matches!(
            classify_failure(bad_key),
            CallFailure::AuthRejected(_)
        ));
    }

}
