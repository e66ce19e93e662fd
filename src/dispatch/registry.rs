use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::Config;
use crate::dispatch::http::{Endpoint, HttpDispatch};
use crate::dispatch::{Completion, CompletionClient, CompletionRequest};
use crate::error::PromptcastError;

/// Wire format spoken by a provider endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiFormat {
    /// OpenAI-compatible chat completions (default for most providers).
    #[default]
    #[serde(alias = "openai-compatible")]
    OpenAi,
    /// Anthropic Messages API (different headers and response shape).
    Anthropic,
}

#[derive(Clone)]
pub struct ProviderEntry {
    pub base_url: String,
    pub api_format: ApiFormat,
    /// Env var the key was read from; None for keyless local servers.
    pub api_key_env: Option<String>,
    pub api_key: Option<String>,
    pub max_tokens: Option<u32>,
}

impl ProviderEntry {
    /// True if the entry names a key variable that was not set.
    pub fn missing_key(&self) -> bool {
        self.api_key_env.is_some() && self.api_key.is_none()
    }
}

impl std::fmt::Debug for ProviderEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderEntry")
            .field("base_url", &self.base_url)
            .field("api_format", &self.api_format)
            .field("api_key_env", &self.api_key_env)
            .field(
                "api_key",
                &self.api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// Routes each model identifier to its provider's HTTP endpoint.
pub struct ProviderRegistry {
    providers: BTreeMap<String, ProviderEntry>,
    http: HttpDispatch,
}

impl ProviderRegistry {
    pub fn from_config(config: Config) -> Result<Self, PromptcastError> {
        Ok(Self {
            providers: config.providers,
            http: HttpDispatch::new()?,
        })
    }

    pub fn get(&self, provider: &str) -> Option<&ProviderEntry> {
        self.providers.get(provider)
    }

    /// Configured provider names, sorted.
    pub fn provider_names(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }

    fn resolve(&self, provider: &str) -> Result<Endpoint<'_>, PromptcastError> {
        let (name, entry) = self
            .providers
            .get_key_value(provider)
            .ok_or_else(|| PromptcastError::UnknownProvider {
                provider: provider.to_string(),
                known: self.provider_names(),
            })?;

        if entry.missing_key() {
            return Err(PromptcastError::MissingApiKey {
                provider: name.clone(),
                env_var: entry.api_key_env.clone().unwrap_or_default(),
            });
        }

        Ok(Endpoint {
            provider: name,
            base_url: &entry.base_url,
            api_key: entry.api_key.as_deref(),
            api_format: &entry.api_format,
            max_tokens: entry.max_tokens,
        })
    }
}

#[async_trait]
impl CompletionClient for ProviderRegistry {
    async fn complete(&self, req: &CompletionRequest<'_>) -> Result<Completion, PromptcastError> {
        let endpoint = self.resolve(req.model.provider())?;
        self.http.query_model(req, endpoint).await
    }
}
