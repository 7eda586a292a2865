//! ClaudeApiGenerator - text generation through the Claude Messages REST API.
//!
//! The API key is read from the environment variable named in `[llm].api_key_env`.

use async_trait::async_trait;
use mentor_core::config::LlmConfig;
use mentor_core::llm::{CompletionRequest, GenerationError, TextGenerator};
use mentor_core::session::TurnRole;
use reqwest::{Client, StatusCode, header::HeaderValue};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Generator that talks to the Claude HTTP API.
#[derive(Clone)]
pub struct ClaudeApiGenerator {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: u32,
}

impl ClaudeApiGenerator {
    /// Creates a new generator with the provided API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let defaults = LlmConfig::default();
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: defaults.base_url,
            max_tokens: defaults.max_tokens,
        }
    }

    /// Builds a generator from configuration, reading the key from the environment.
    pub fn from_config(config: &LlmConfig) -> Result<Self, GenerationError> {
        let api_key = env::var(&config.api_key_env).map_err(|_| {
            GenerationError::ExecutionFailed(format!(
                "{} is not set; export it or switch [llm].provider to \"offline\"",
                config.api_key_env
            ))
        })?;
        Ok(Self::new(api_key, config.model.clone())
            .with_base_url(config.base_url.clone())
            .with_max_tokens(config.max_tokens))
    }

    /// Overrides the endpoint, e.g. for a proxy.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the default maximum number of tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn build_request(&self, request: CompletionRequest) -> Result<CreateMessageRequest, GenerationError> {
        if request.prompt.trim().is_empty() {
            return Err(GenerationError::ExecutionFailed(
                "Claude request must include a non-empty prompt".into(),
            ));
        }

        let mut messages: Vec<Message> = Vec::new();
        for message in request.history {
            let role = match message.role {
                TurnRole::Learner => "user",
                TurnRole::Tutor => "assistant",
            };
            push_message(&mut messages, role, message.content);
        }
        push_message(&mut messages, "user", request.prompt);

        // The API requires the conversation to open with a user message.
        while messages.first().is_some_and(|m| m.role != "user") {
            messages.remove(0);
        }

        Ok(CreateMessageRequest {
            model: self.model.clone(),
            messages,
            max_tokens: request.max_tokens.unwrap_or(self.max_tokens),
            system: request.system,
        })
    }

    async fn send_request(&self, body: &CreateMessageRequest) -> Result<String, GenerationError> {
        let response = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|err| GenerationError::ProcessError {
                status_code: None,
                message: format!("Claude API request failed: {err}"),
                is_retryable: err.is_connect() || err.is_timeout(),
                retry_after: None,
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = parse_retry_after(response.headers().get("retry-after"));
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Claude error body".to_string());
            return Err(map_http_error(status, body_text, retry_after));
        }

        let parsed: CreateMessageResponse = response.json().await.map_err(|err| {
            GenerationError::ExecutionFailed(format!("Failed to parse Claude response: {err}"))
        })?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl TextGenerator for ClaudeApiGenerator {
    fn name(&self) -> &str {
        "claude"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, GenerationError> {
        let body = self.build_request(request)?;
        tracing::debug!(
            model = %body.model,
            messages = body.messages.len(),
            "Sending Claude request"
        );
        self.send_request(&body).await
    }
}

/// Appends a message, merging consecutive messages of the same role.
fn push_message(messages: &mut Vec<Message>, role: &'static str, content: String) {
    if content.trim().is_empty() {
        return;
    }
    match messages.last_mut() {
        Some(last) if last.role == role => {
            last.content.push_str("\n\n");
            last.content.push_str(&content);
        }
        _ => messages.push(Message { role, content }),
    }
}

#[derive(Serialize)]
struct CreateMessageRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct CreateMessageResponse {
    content: Vec<ContentBlockResponse>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum ContentBlockResponse {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Unsupported,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn extract_text_response(response: CreateMessageResponse) -> Result<String, GenerationError> {
    response
        .content
        .into_iter()
        .find_map(|block| match block {
            ContentBlockResponse::Text { text } if !text.trim().is_empty() => Some(text),
            _ => None,
        })
        .ok_or_else(|| {
            GenerationError::ExecutionFailed(
                "Claude API returned no text in the response content".into(),
            )
        })
}

fn map_http_error(status: StatusCode, body: String, retry_after: Option<Duration>) -> GenerationError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or(body);

    let is_retryable = matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    );

    GenerationError::ProcessError {
        status_code: Some(status.as_u16()),
        message,
        is_retryable,
        retry_after,
    }
}

fn parse_retry_after(header: Option<&HeaderValue>) -> Option<Duration> {
    let value = header?.to_str().ok()?;
    // Only the delay-seconds form is supported.
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentor_core::session::Turn;

    #[test]
    fn test_request_starts_with_user_and_merges_roles() {
        let generator = ClaudeApiGenerator::new("key", "model");
        let history = vec![
            Turn::tutor("Welcome", None, None),
            Turn::learner("I'm designing a library"),
            Turn::learner("with a reading garden"),
            Turn::tutor("Nice", None, None),
        ];
        let request = CompletionRequest::new("Classify this")
            .with_system("You are a classifier")
            .with_history(&history);
        let body = generator.build_request(request).unwrap();
        let roles: Vec<_> = body.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec!["user", "assistant", "user"]);
        assert!(body.messages[0].content.contains("reading garden"));
        assert_eq!(body.max_tokens, 1024);
    }

    #[test]
    fn test_empty_prompt_is_rejected() {
        let generator = ClaudeApiGenerator::new("key", "model");
        assert!(generator.build_request(CompletionRequest::new("  ")).is_err());
    }

    #[test]
    fn test_map_http_error_reads_message_and_retry() {
        let body = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        let err = map_http_error(
            StatusCode::SERVICE_UNAVAILABLE,
            body.to_string(),
            Some(Duration::from_secs(3)),
        );
        match err {
            GenerationError::ProcessError {
                status_code,
                message,
                is_retryable,
                retry_after,
            } => {
                assert_eq!(status_code, Some(503));
                assert_eq!(message, "Overloaded");
                assert!(is_retryable);
                assert_eq!(retry_after, Some(Duration::from_secs(3)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_retry_after_seconds_only() {
        let value = HeaderValue::from_static("12");
        assert_eq!(parse_retry_after(Some(&value)), Some(Duration::from_secs(12)));
        let date = HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT");
        assert_eq!(parse_retry_after(Some(&date)), None);
    }
}
