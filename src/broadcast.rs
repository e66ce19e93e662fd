use std::time::Instant;

use crate::dispatch::{CompletionClient, CompletionRequest};
use crate::error::PromptcastError;
use crate::input::{ModelIdentifier, PromptRequest};
use crate::output::{ModelResult, ResultSet};

/// Send `request` to every model, one at a time, in list order.
///
/// The first failing dispatch aborts the run: its error is returned and the
/// results gathered so far are dropped. Later models are never contacted.
pub async fn broadcast<C>(
    client: &C,
    request: &PromptRequest,
    models: &[ModelIdentifier],
) -> Result<ResultSet, PromptcastError>
where
    C: CompletionClient + ?Sized,
{
    let mut results = Vec::with_capacity(models.len());

    for (index, model) in models.iter().enumerate() {
        let start = Instant::now();
        tracing::info!(model = %model, index, total = models.len(), "dispatching");

        let completion = client
            .complete(&CompletionRequest {
                model,
                system_prompt: &request.system_prompt,
                user_prompt: &request.user_prompt,
            })
            .await
            .map_err(|e| {
                tracing::error!(model = %model, "dispatch failed: {e}");
                PromptcastError::Dispatch {
                    model: model.to_string(),
                    source: Box::new(e),
                }
            })?;

        tracing::info!(
            model = %model,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "response received"
        );

        results.push(ModelResult {
            model: model.clone(),
            response: completion.content,
        });
    }

    Ok(ResultSet(results))
}
