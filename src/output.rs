use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::error::PromptcastError;
use crate::input::ModelIdentifier;

const SEPARATOR_WIDTH: usize = 100;

/// One model's reply. Built once per successful dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelResult {
    pub model: ModelIdentifier,
    pub response: String,
}

/// Results in dispatch order. Serializes as a bare JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResultSet(pub Vec<ModelResult>);

impl ResultSet {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ModelResult> {
        self.0.iter()
    }
}

/// Source of the timestamp embedded in the results file name.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Always returns the same instant.
pub struct FixedClock(pub DateTime<Local>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

/// `results_YYYY_MM_DD_HH_MM_SS.json`. Second resolution: two runs finishing
/// in the same second produce the same name and the later one wins.
pub fn results_file_name(at: DateTime<Local>) -> String {
    format!("results_{}.json", at.format("%Y_%m_%d_%H_%M_%S"))
}

/// Write `results` to `dir/results_<timestamp>.json` and return the path.
/// The timestamp is read from `clock` when this is called.
pub async fn persist(
    results: &ResultSet,
    dir: &Path,
    clock: &dyn Clock,
) -> Result<PathBuf, PromptcastError> {
    let path = dir.join(results_file_name(clock.now()));

    let json = serde_json::to_string(results).map_err(|e| PromptcastError::Persist {
        path: path.clone(),
        source: std::io::Error::other(e),
    })?;

    // Temp file + rename so a reader never sees a half-written file.
    let tmp_path = path.with_extension("json.tmp");
    if let Err(source) = tokio::fs::write(&tmp_path, json.as_bytes()).await {
        return Err(PromptcastError::Persist { path, source });
    }
    if let Err(source) = tokio::fs::rename(&tmp_path, &path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(PromptcastError::Persist { path, source });
    }

    tracing::info!(path = %path.display(), entries = results.len(), "results written");
    Ok(path)
}

/// Console report: each model, its response and a separator, then the file path.
pub fn render_report(results: &ResultSet, saved_to: &Path) -> String {
    let separator = "-".repeat(SEPARATOR_WIDTH);
    let mut out = String::new();
    for result in results.iter() {
        out.push_str(&format!(
            "Model: {}\nResponse: {}\n{separator}\n",
            result.model, result.response
        ));
    }
    out.push_str(&format!("Results saved to {}\n", saved_to.display()));
    out
}
