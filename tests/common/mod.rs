#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Local, TimeZone};
use promptcast::dispatch::{Completion, CompletionClient, CompletionRequest};
use promptcast::error::PromptcastError;
use promptcast::output::FixedClock;

/// One recorded call: (model, system prompt, user prompt).
pub type Call = (String, String, String);

/// Completion client that answers from a table and records every call.
#[derive(Default)]
pub struct StubClient {
    replies: HashMap<String, String>,
    fail_on: Option<String>,
    calls: Mutex<Vec<Call>>,
}

impl StubClient {
    pub fn new(replies: &[(&str, &str)]) -> Self {
        Self {
            replies: replies
                .iter()
                .map(|(m, r)| (m.to_string(), r.to_string()))
                .collect(),
            ..Self::default()
        }
    }

    pub fn failing_on(mut self, model: &str) -> Self {
        self.fail_on = Some(model.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, model: &str) -> usize {
        self.calls().iter().filter(|(m, _, _)| m == model).count()
    }
}

#[async_trait]
impl CompletionClient for StubClient {
    async fn complete(&self, req: &CompletionRequest<'_>) -> Result<Completion, PromptcastError> {
        let model = req.model.to_string();
        self.calls.lock().unwrap().push((
            model.clone(),
            req.system_prompt.to_string(),
            req.user_prompt.to_string(),
        ));

        if self.fail_on.as_deref() == Some(model.as_str()) {
            return Err(PromptcastError::Upstream {
                provider: req.model.provider().to_string(),
                message: "500 Internal Server Error: boom".to_string(),
                status: Some(500),
            });
        }

        Ok(Completion {
            content: self
                .replies
                .get(&model)
                .cloned()
                .unwrap_or_else(|| format!("reply from {model}")),
        })
    }
}

/// 2025-03-04 05:06:07 local time.
pub fn fixed_clock() -> FixedClock {
    FixedClock(Local.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap())
}

/// Fresh, empty directory under the system temp dir.
pub fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("promptcast-test-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn json_files(dir: &std::path::Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    files
}
