//! Chat-completion client for the model endpoint.
//!
//! Blocking HTTP via `ureq`; the CLI has no async runtime. One request per
//! call: retrying, switching models or rotating proxies is left to callers.

use forge_core::config::{ApiStyle, ModelConfig};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Environment variable holding an optional bearer token for the endpoint.
pub const TOKEN_ENV: &str = "FORGE_MODEL_TOKEN";

/// Errors from model calls.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("HTTP request failed: {0}")]
    Http(String),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("response parse error: {0}")]
    Parse(String),
    #[error("empty response from model")]
    EmptyResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }
}

/// A completed model answer.
#[derive(Debug, Clone, Default)]
pub struct ModelReply {
    /// `choices[0].message.content`
    pub text: String,
    /// Model that answered, as reported by the endpoint (falls back to the requested one).
    pub model: String,
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
    /// The full response body, kept for answer transcripts.
    pub raw: Value,
}

/// Abstraction over the model endpoint.
pub trait ModelClient {
    fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<ModelReply, ModelError>;
}

/// HTTP client for either the wrapped endpoint or an OpenAI-compatible one.
pub struct HttpModelClient {
    endpoint: String,
    style: ApiStyle,
    token: Option<String>,
    agent: ureq::Agent,
}

impl HttpModelClient {
    pub fn new(endpoint: impl Into<String>, style: ApiStyle, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            style,
            token: None,
            agent: ureq::Agent::new_with_config(
                ureq::config::Config::builder()
                    .timeout_global(Some(timeout))
                    .build(),
            ),
        }
    }

    /// Build from `[model]` config; picks up a bearer token from [`TOKEN_ENV`].
    pub fn from_config(config: &ModelConfig) -> Self {
        let mut client = Self::new(
            config.endpoint.clone(),
            config.api_style,
            Duration::from_secs(config.timeout_secs),
        );
        client.token = std::env::var(TOKEN_ENV).ok().filter(|t| !t.trim().is_empty());
        client
    }

    fn url(&self) -> String {
        match self.style {
            ApiStyle::Wrapped => self.endpoint.clone(),
            ApiStyle::OpenAi => format!(
                "{}/v1/chat/completions",
                self.endpoint.trim_end_matches('/')
            ),
        }
    }
}

/// Request body for the given style.
pub fn request_body(style: ApiStyle, model: &str, messages: &[ChatMessage]) -> Value {
    match style {
        ApiStyle::Wrapped => serde_json::json!({
            "model": model,
            "request": { "messages": messages }
        }),
        ApiStyle::OpenAi => serde_json::json!({
            "model": model,
            "messages": messages
        }),
    }
}

/// Pull the reply out of a chat-completions shaped body. Both styles answer
/// with `choices[0].message.content`.
pub fn parse_reply(json: Value, requested_model: &str) -> Result<ModelReply, ModelError> {
    if let Some(err) = json.get("error") {
        let message = err
            .get("message")
            .and_then(|m| m.as_str())
            .or_else(|| err.as_str())
            .unwrap_or("unknown error")
            .to_string();
        return Err(ModelError::Api {
            status: 400,
            message,
        });
    }

    let text = json
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|msg| msg.get("content"))
        .and_then(|c| c.as_str())
        .ok_or(ModelError::EmptyResponse)?
        .to_string();
    if text.trim().is_empty() {
        return Err(ModelError::EmptyResponse);
    }

    let usage = |key: &str| {
        json.get("usage")
            .and_then(|u| u.get(key))
            .and_then(|t| t.as_u64())
    };
    let prompt_tokens = usage("prompt_tokens");
    let completion_tokens = usage("completion_tokens");
    let model = json
        .get("model")
        .and_then(|m| m.as_str())
        .unwrap_or(requested_model)
        .to_string();

    Ok(ModelReply {
        text,
        model,
        prompt_tokens,
        completion_tokens,
        raw: json,
    })
}

impl ModelClient for HttpModelClient {
    fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<ModelReply, ModelError> {
        let body = request_body(self.style, model, messages);

        let mut request = self
            .agent
            .post(&self.url())
            .header("content-type", "application/json");
        if let Some(token) = &self.token {
            request = request.header("Authorization", &format!("Bearer {token}"));
        }

        let mut response = request.send_json(&body).map_err(|e| match e {
            ureq::Error::StatusCode(status) => ModelError::Api {
                status,
                message: format!("endpoint returned HTTP {status}"),
            },
            other => ModelError::Http(other.to_string()),
        })?;

        let json: Value = response
            .body_mut()
            .read_json()
            .map_err(|e| ModelError::Parse(e.to_string()))?;

        parse_reply(json, model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wrapped_body_shape() {
        let body = request_body(ApiStyle::Wrapped, "gpt-4o-mini", &[ChatMessage::user("hi")]);
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["request"]["messages"][0]["role"], "user");
        assert_eq!(body["request"]["messages"][0]["content"], "hi");
        assert!(body.get("messages").is_none());
    }

    #[test]
    fn test_openai_body_and_url() {
        let body = request_body(ApiStyle::OpenAi, "m", &[ChatMessage::system("s")]);
        assert_eq!(body["messages"][0]["role"], "system");

        let client = HttpModelClient::new("http://localhost:8080/", ApiStyle::OpenAi, Duration::from_secs(1));
        assert_eq!(client.url(), "http://localhost:8080/v1/chat/completions");
        let wrapped = HttpModelClient::new("http://api.example/ai/v2", ApiStyle::Wrapped, Duration::from_secs(1));
        assert_eq!(wrapped.url(), "http://api.example/ai/v2");
    }

    #[test]
    fn test_parse_reply() {
        let reply = parse_reply(
            json!({
                "id": "chat_1",
                "model": "gpt-4o",
                "choices": [{"message": {"role": "assistant", "content": "hello"}, "finish_reason": "stop"}],
                "usage": {"prompt_tokens": 5, "completion_tokens": 2}
            }),
            "auto",
        )
        .unwrap();
        assert_eq!(reply.text, "hello");
        assert_eq!(reply.model, "gpt-4o");
        assert_eq!(reply.prompt_tokens, Some(5));
        assert_eq!(reply.completion_tokens, Some(2));
        assert_eq!(reply.raw["id"], "chat_1");
    }

    #[test]
    fn test_parse_reply_errors() {
        assert!(matches!(
            parse_reply(json!({"error": {"message": "rate limited"}}), "m"),
            Err(ModelError::Api { message, .. }) if message == "rate limited"
        ));
        assert!(matches!(
            parse_reply(json!({"choices": []}), "m"),
            Err(ModelError::EmptyResponse)
        ));
        assert!(matches!(
            parse_reply(json!({"choices": [{"message": {"content": "  "}}]}), "m"),
            Err(ModelError::EmptyResponse)
        ));
    }
}
