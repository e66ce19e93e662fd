use std::time::{Duration, Instant};

use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::Value;

use crate::dispatch::registry::ApiFormat;
use crate::dispatch::{Completion, CompletionRequest};
use crate::error::PromptcastError;

pub const MAX_RESPONSE_BYTES: usize = 2 * 1024 * 1024; // 2MB

/// Anthropic requires an explicit output cap on every request.
pub const DEFAULT_ANTHROPIC_MAX_TOKENS: u32 = 4096;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Where and how to send a request for one provider.
#[derive(Debug, Clone, Copy)]
pub struct Endpoint<'a> {
    pub provider: &'a str,
    pub base_url: &'a str,
    pub api_key: Option<&'a str>,
    pub api_format: &'a ApiFormat,
    pub max_tokens: Option<u32>,
}

pub struct HttpDispatch {
    client: Client,
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    #[serde(default)]
    content: Value,
}

#[derive(Deserialize)]
struct AnthropicMessage {
    content: Vec<AnthropicBlock>,
}

#[derive(Deserialize)]
struct AnthropicBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl HttpDispatch {
    /// Only a connect timeout is set; request duration is left unbounded.
    pub fn new() -> Result<Self, PromptcastError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { client })
    }

    pub async fn query_model(
        &self,
        req: &CompletionRequest<'_>,
        endpoint: Endpoint<'_>,
    ) -> Result<Completion, PromptcastError> {
        let start = Instant::now();
        let model = req.model.model_name();

        let request = match endpoint.api_format {
            ApiFormat::OpenAi => self.openai_request(req, model, &endpoint),
            ApiFormat::Anthropic => self.anthropic_request(req, model, &endpoint),
        };

        let response = request.send().await?;
        let status = response.status();
        let provider = endpoint.provider;

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(PromptcastError::RateLimited {
                provider: provider.to_string(),
            });
        }

        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(PromptcastError::AuthFailed {
                provider: provider.to_string(),
                message: format!("{status}"),
            });
        }

        // Error bodies are read chunk by chunk and stop at MAX_RESPONSE_BYTES
        if !status.is_success() {
            let error_bytes = read_capped(response, MAX_RESPONSE_BYTES).await;
            let text = String::from_utf8_lossy(&error_bytes);
            return Err(PromptcastError::Upstream {
                provider: provider.to_string(),
                message: format!("{status}: {text}"),
                status: Some(status.as_u16()),
            });
        }

        let bytes = response.bytes().await.map_err(|e| PromptcastError::Upstream {
            provider: provider.to_string(),
            message: format!("failed to read response body: {e}"),
            status: None,
        })?;

        if bytes.len() > MAX_RESPONSE_BYTES {
            return Err(PromptcastError::Upstream {
                provider: provider.to_string(),
                message: format!(
                    "response too large: {} bytes (max {})",
                    bytes.len(),
                    MAX_RESPONSE_BYTES
                ),
                status: None,
            });
        }

        let content = match endpoint.api_format {
            ApiFormat::OpenAi => parse_openai(&bytes, provider)?,
            ApiFormat::Anthropic => parse_anthropic(&bytes)?,
        };

        tracing::debug!(
            provider,
            model,
            latency_ms = start.elapsed().as_millis() as u64,
            bytes = bytes.len(),
            "completion received"
        );

        Ok(Completion { content })
    }

    fn openai_request(
        &self,
        req: &CompletionRequest<'_>,
        model: &str,
        endpoint: &Endpoint<'_>,
    ) -> RequestBuilder {
        let body = serde_json::json!({
            "model": model,
            "messages": [
                {"role": "system", "content": req.system_prompt},
                {"role": "user", "content": req.user_prompt}
            ]
        });

        let mut builder = self
            .client
            .post(endpoint.base_url)
            .header("Content-Type", "application/json");
        if let Some(key) = endpoint.api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }
        builder.json(&body)
    }

    fn anthropic_request(
        &self,
        req: &CompletionRequest<'_>,
        model: &str,
        endpoint: &Endpoint<'_>,
    ) -> RequestBuilder {
        let body = serde_json::json!({
            "model": model,
            "max_tokens": endpoint.max_tokens.unwrap_or(DEFAULT_ANTHROPIC_MAX_TOKENS),
            "system": req.system_prompt,
            "messages": [{"role": "user", "content": req.user_prompt}]
        });

        let mut builder = self
            .client
            .post(endpoint.base_url)
            .header("Content-Type", "application/json")
            .header("anthropic-version", ANTHROPIC_VERSION);
        if let Some(key) = endpoint.api_key {
            builder = builder.header("x-api-key", key);
        }
        builder.json(&body)
    }
}

/// Read at most `limit` bytes of a body. Read errors end the body early.
async fn read_capped(mut response: reqwest::Response, limit: usize) -> Vec<u8> {
    let mut buf = Vec::new();
    while buf.len() < limit {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                let take = chunk.len().min(limit - buf.len());
                buf.extend_from_slice(&chunk[..take]);
            }
            Ok(None) | Err(_) => break,
        }
    }
    buf
}

fn parse_openai(bytes: &[u8], provider: &str) -> Result<String, PromptcastError> {
    let completion: ChatCompletion = serde_json::from_slice(bytes)
        .map_err(|e| PromptcastError::SchemaParse(format!("failed to parse response: {e}")))?;

    let message = completion
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or_else(|| PromptcastError::Upstream {
            provider: provider.to_string(),
            message: "empty choices".to_string(),
            status: None,
        })?;

    Ok(message_text(message.content))
}

/// Reduce an OpenAI-style `content` value to plain text.
/// Strings pass through, content-part arrays are joined, null becomes empty.
pub fn message_text(content: Value) -> String {
    match content {
        Value::String(s) => s,
        Value::Array(parts) => parts
            .iter()
            .filter_map(|part| match part {
                Value::String(s) => Some(s.as_str()),
                other => other.get("text").and_then(Value::as_str),
            })
            .collect(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn parse_anthropic(bytes: &[u8]) -> Result<String, PromptcastError> {
    let message: AnthropicMessage = serde_json::from_slice(bytes)
        .map_err(|e| PromptcastError::SchemaParse(format!("failed to parse response: {e}")))?;

    Ok(message
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect())
}
