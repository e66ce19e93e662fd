use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::dispatch::registry::{ApiFormat, ProviderEntry};
use crate::error::PromptcastError;

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "promptcast.toml";

/// Hosted providers known out of the box: (name, endpoint, format, key variable).
const BUILTIN_PROVIDERS: &[(&str, &str, ApiFormat, &str)] = &[
    ("openai", "https://api.openai.com/v1/chat/completions", ApiFormat::OpenAi, "OPENAI_API_KEY"),
    ("anthropic", "https://api.anthropic.com/v1/messages", ApiFormat::Anthropic, "ANTHROPIC_API_KEY"),
    ("openrouter", "https://openrouter.ai/api/v1/chat/completions", ApiFormat::OpenAi, "OPENROUTER_API_KEY"),
    ("xai", "https://api.x.ai/v1/chat/completions", ApiFormat::OpenAi, "XAI_API_KEY"),
    ("groq", "https://api.groq.com/openai/v1/chat/completions", ApiFormat::OpenAi, "GROQ_API_KEY"),
    ("mistral", "https://api.mistral.ai/v1/chat/completions", ApiFormat::OpenAi, "MISTRAL_API_KEY"),
    ("deepseek", "https://api.deepseek.com/chat/completions", ApiFormat::OpenAi, "DEEPSEEK_API_KEY"),
    ("together", "https://api.together.xyz/v1/chat/completions", ApiFormat::OpenAi, "TOGETHER_API_KEY"),
];

const OLLAMA_URL: &str = "http://localhost:11434/v1/chat/completions";

pub struct Config {
    pub providers: BTreeMap<String, ProviderEntry>,
}

/// On-disk shape of `promptcast.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub providers: BTreeMap<String, FileProvider>,
}

/// A provider table entry. Fields left out keep the built-in value when the
/// name matches a built-in provider.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileProvider {
    pub base_url: Option<String>,
    pub api_format: Option<ApiFormat>,
    pub api_key_env: Option<String>,
    pub max_tokens: Option<u32>,
}

impl Config {
    /// Built-in providers with keys from the process environment.
    pub fn from_env() -> Self {
        Self::builtin(|var| env::var(var).ok())
    }

    /// Built-in providers with keys from `lookup`.
    pub fn builtin(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut providers = BTreeMap::new();

        for (name, base_url, api_format, key_var) in BUILTIN_PROVIDERS {
            let api_key = lookup(*key_var).filter(|k| !k.trim().is_empty());
            if api_key.is_none() {
                tracing::debug!("{key_var} not set, {name} models unavailable");
            }
            providers.insert(
                name.to_string(),
                ProviderEntry {
                    base_url: base_url.to_string(),
                    api_format: api_format.clone(),
                    api_key_env: Some(key_var.to_string()),
                    api_key,
                    max_tokens: None,
                },
            );
        }

        providers.insert(
            "ollama".to_string(),
            ProviderEntry {
                base_url: OLLAMA_URL.to_string(),
                api_format: ApiFormat::OpenAi,
                api_key_env: None,
                api_key: None,
                max_tokens: None,
            },
        );

        Config { providers }
    }

    /// Built-ins, then overrides from the config file.
    ///
    /// An explicit path must exist; otherwise `promptcast.toml` in the working
    /// directory is used if present.
    pub async fn load(explicit: Option<&Path>) -> Result<Self, PromptcastError> {
        let mut config = Self::from_env();

        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                tokio::fs::try_exists(&default)
                    .await
                    .unwrap_or(false)
                    .then_some(default)
            }
        };

        if let Some(path) = path {
            let text = tokio::fs::read_to_string(&path).await.map_err(|e| {
                PromptcastError::Config(format!("cannot read {}: {e}", path.display()))
            })?;
            let file = Self::parse_file(&text)
                .map_err(|e| PromptcastError::Config(format!("{}: {e}", path.display())))?;
            config.apply_file(file, |var| env::var(var).ok())?;
            tracing::info!(path = %path.display(), "loaded config file");
        }

        Ok(config)
    }

    pub fn parse_file(text: &str) -> Result<FileConfig, toml::de::Error> {
        toml::from_str(text)
    }

    /// Merge file entries into the provider table.
    pub fn apply_file(
        &mut self,
        file: FileConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), PromptcastError> {
        for (name, fp) in file.providers {
            if name.is_empty() || name.contains('/') {
                return Err(PromptcastError::Config(format!(
                    "invalid provider name {name:?}"
                )));
            }

            let entry = match self.providers.remove(&name) {
                Some(mut existing) => {
                    if let Some(url) = fp.base_url {
                        existing.base_url = url;
                    }
                    if let Some(format) = fp.api_format {
                        existing.api_format = format;
                    }
                    if let Some(var) = fp.api_key_env {
                        existing.api_key = lookup(&var).filter(|k| !k.trim().is_empty());
                        existing.api_key_env = Some(var);
                    }
                    if fp.max_tokens.is_some() {
                        existing.max_tokens = fp.max_tokens;
                    }
                    existing
                }
                None => {
                    let base_url = fp.base_url.ok_or_else(|| {
                        PromptcastError::Config(format!(
                            "provider {name} needs a base_url"
                        ))
                    })?;
                    let api_key = fp
                        .api_key_env
                        .as_deref()
                        .and_then(&lookup)
                        .filter(|k| !k.trim().is_empty());
                    ProviderEntry {
                        base_url,
                        api_format: fp.api_format.unwrap_or_default(),
                        api_key_env: fp.api_key_env,
                        api_key,
                        max_tokens: fp.max_tokens,
                    }
                }
            };

            tracing::debug!(provider = %name, ?entry, "provider configured from file");
            self.providers.insert(name, entry);
        }
        Ok(())
    }
}
