use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptcastError {
    #[error("no models provided")]
    NoModels,

    #[error("model {0} is not a valid model - format is <provider>/<model-name>")]
    InvalidModel(String),

    #[error("failed to read {}: {source}", .path.display())]
    ReadInput {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write results to {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("unknown provider: {provider}")]
    UnknownProvider {
        provider: String,
        known: Vec<String>,
    },

    #[error("missing API key for {provider}: set {env_var}")]
    MissingApiKey { provider: String, env_var: String },

    #[error("rate limited by {provider}")]
    RateLimited { provider: String },

    #[error("auth failed for {provider}: {message}")]
    AuthFailed { provider: String, message: String },

    #[error("upstream error from {provider}: {message}")]
    Upstream {
        provider: String,
        message: String,
        status: Option<u16>,
    },

    #[error("schema parse error: {0}")]
    SchemaParse(String),

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("dispatch to {model} failed: {source}")]
    Dispatch {
        model: String,
        source: Box<PromptcastError>,
    },
}

impl PromptcastError {
    /// Extract provider name from structured error variants.
    /// Unwraps `Dispatch` to reach the underlying cause.
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::UnknownProvider { provider, .. } => Some(provider),
            Self::MissingApiKey { provider, .. } => Some(provider),
            Self::RateLimited { provider } => Some(provider),
            Self::AuthFailed { provider, .. } => Some(provider),
            Self::Upstream { provider, .. } => Some(provider),
            Self::Dispatch { source, .. } => source.provider(),
            _ => None,
        }
    }

    /// True for failures detected before any dispatch was attempted.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::NoModels | Self::InvalidModel(_))
    }

    /// Message shown on the console when a run aborts.
    /// Does not echo upstream error bodies or connection details.
    pub fn user_message(&self) -> String {
        match self {
            Self::NoModels => "No LLMs provided".to_string(),
            Self::InvalidModel(model) => {
                format!("LLM {model} is not a valid LLM - format is <provider>/<model-name>")
            }
            Self::UnknownProvider { provider, known } => {
                if known.is_empty() {
                    format!("unknown provider: {provider}")
                } else {
                    format!(
                        "unknown provider: {provider}. Configured providers: {}",
                        known.join(", ")
                    )
                }
            }
            Self::RateLimited { provider } => {
                format!("rate limited by {provider}, try again shortly")
            }
            Self::Upstream {
                provider, status, ..
            } => match status {
                Some(code) => format!("upstream error from {provider} (HTTP {code})"),
                None => format!("upstream error from {provider}"),
            },
            Self::SchemaParse(_) => "failed to parse provider response".to_string(),
            Self::Request(_) => "request to provider failed".to_string(),
            Self::Dispatch { model, source } => {
                format!("{model}: {}", source.user_message())
            }
            other => other.to_string(),
        }
    }
}
