use std::path::PathBuf;

use crate::broadcast::broadcast;
use crate::dispatch::CompletionClient;
use crate::error::PromptcastError;
use crate::input::{self, ModelSource, PromptRequest, PromptSource, SystemPromptSource};
use crate::output::{self, Clock, ResultSet};

/// Everything a run needs besides the completion client and the clock.
#[derive(Debug, Clone)]
pub struct RunInputs {
    pub models: ModelSource,
    pub prompt: PromptSource,
    pub system_prompt: SystemPromptSource,
    pub output_dir: PathBuf,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub results: ResultSet,
    pub results_file: PathBuf,
}

/// Resolve inputs, dispatch to every model, then persist.
///
/// Inputs are fully resolved and validated before the first dispatch. Nothing
/// is written unless every dispatch succeeds.
pub async fn run<C>(
    client: &C,
    inputs: &RunInputs,
    clock: &dyn Clock,
) -> Result<RunOutcome, PromptcastError>
where
    C: CompletionClient + ?Sized,
{
    let request = PromptRequest::resolve(&inputs.prompt, &inputs.system_prompt).await?;
    let models = input::resolve_models(&inputs.models).await?;

    tracing::info!(models = models.len(), "starting broadcast");
    let results = broadcast(client, &request, &models).await?;

    let results_file = output::persist(&results, &inputs.output_dir, clock).await?;

    Ok(RunOutcome {
        results,
        results_file,
    })
}
