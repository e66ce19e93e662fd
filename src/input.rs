use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::PromptcastError;

/// System prompt used when neither `--system-prompt` nor `--system-prompt-file` is given.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant";

/// `<provider>/<model-name>`. The provider is everything before the first `/`;
/// the model name may contain further slashes (`openrouter/meta-llama/llama-3-70b`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ModelIdentifier(String);

impl ModelIdentifier {
    pub fn parse(raw: &str) -> Result<Self, PromptcastError> {
        if raw.contains('/') {
            Ok(Self(raw.to_string()))
        } else {
            Err(PromptcastError::InvalidModel(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn provider(&self) -> &str {
        self.split().0
    }

    pub fn model_name(&self) -> &str {
        self.split().1
    }

    fn split(&self) -> (&str, &str) {
        // Construction guarantees at least one separator.
        self.0.split_once('/').unwrap_or((&self.0, ""))
    }
}

impl fmt::Display for ModelIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where the model list comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// Comma-separated identifiers.
    List(String),
    /// One identifier per line; blank lines and `#` comments skipped.
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptSource {
    Text(String),
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SystemPromptSource {
    Text(String),
    File(PathBuf),
    #[default]
    Default,
}

/// The prompt pair shared read-only by every dispatch in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub system_prompt: String,
    pub user_prompt: String,
}

impl PromptRequest {
    pub async fn resolve(
        prompt: &PromptSource,
        system_prompt: &SystemPromptSource,
    ) -> Result<Self, PromptcastError> {
        Ok(Self {
            system_prompt: resolve_system_prompt(system_prompt).await?,
            user_prompt: resolve_prompt(prompt).await?,
        })
    }
}

/// Split a `--llm-list` value into raw entries. Whitespace around entries is
/// trimmed and empty entries (`a,,b`, trailing comma) are dropped.
pub fn parse_model_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse the contents of a `--llm-file`.
pub fn parse_model_file(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Resolve and validate the model list. All entries are checked before any
/// is returned, so a bad entry anywhere aborts the whole run.
pub async fn resolve_models(source: &ModelSource) -> Result<Vec<ModelIdentifier>, PromptcastError> {
    let raw = match source {
        ModelSource::List(list) => parse_model_list(list),
        ModelSource::File(path) => parse_model_file(&read_input(path).await?),
    };

    if raw.is_empty() {
        return Err(PromptcastError::NoModels);
    }

    let models = raw
        .iter()
        .map(String::as_str)
        .map(ModelIdentifier::parse)
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(count = models.len(), "resolved model list");
    Ok(models)
}

pub async fn resolve_prompt(source: &PromptSource) -> Result<String, PromptcastError> {
    match source {
        PromptSource::Text(text) => Ok(text.clone()),
        PromptSource::File(path) => read_input(path).await,
    }
}

pub async fn resolve_system_prompt(source: &SystemPromptSource) -> Result<String, PromptcastError> {
    match source {
        SystemPromptSource::Text(text) => Ok(text.clone()),
        SystemPromptSource::File(path) => read_input(path).await,
        SystemPromptSource::Default => Ok(DEFAULT_SYSTEM_PROMPT.to_string()),
    }
}

/// Read a user-supplied input file, expanding a leading `~/`.
/// File contents are used verbatim (no trimming).
async fn read_input(path: &Path) -> Result<String, PromptcastError> {
    let path = expand_home(path);
    tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| PromptcastError::ReadInput { path, source })
}

/// Expand `~` or a leading `~/` against the home directory. Paths without a
/// tilde, or when no home directory can be determined, are returned unchanged.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}
