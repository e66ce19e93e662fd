use std::path::PathBuf;

use clap::{ArgGroup, Parser};

use crate::input::{ModelSource, PromptSource, SystemPromptSource};

/// CLI arguments for promptcast
#[derive(Parser, Debug)]
#[command(name = "promptcast")]
#[command(version, about = "Send one prompt to several LLMs and save every reply")]
#[command(long_about = r#"
Sends one prompt (plus an optional system prompt) to each listed model in turn
and writes the replies to results_<YYYY_MM_DD_HH_MM_SS>.json.

Models are written as <provider>/<model-name>. Built-in providers: openai,
anthropic, openrouter, xai, groq, mistral, deepseek, together (API key from
<PROVIDER>_API_KEY) and ollama. More can be added in promptcast.toml.

Example:
  promptcast --llm-list openai/gpt-4o,anthropic/claude-sonnet-4-5 --prompt-string "Hi"
  promptcast --llm-file models.txt --prompt-file prompt.md --system-prompt-file sys.md
"#)]
#[command(group(ArgGroup::new("models").required(true).args(["llm_list", "llm_file"])))]
#[command(group(ArgGroup::new("prompt").required(true).args(["prompt_string", "prompt_file"])))]
#[command(group(ArgGroup::new("system").args(["system_prompt", "system_prompt_file"])))]
pub struct Cli {
    /// Comma-separated models (e.g. 'openai/gpt-4o,openrouter/meta-llama/llama-3-70b')
    #[arg(long, value_name = "LIST")]
    pub llm_list: Option<String>,

    /// File with one model per line; blank lines and '#' comments are ignored
    #[arg(long, value_name = "PATH")]
    pub llm_file: Option<PathBuf>,

    /// Prompt text
    #[arg(long, value_name = "TEXT")]
    pub prompt_string: Option<String>,

    /// File containing the prompt text
    #[arg(long, value_name = "PATH")]
    pub prompt_file: Option<PathBuf>,

    /// System prompt text (default: "You are a helpful assistant")
    #[arg(long, value_name = "TEXT")]
    pub system_prompt: Option<String>,

    /// File containing the system prompt text
    #[arg(long, value_name = "PATH")]
    pub system_prompt_file: Option<PathBuf>,

    /// Provider config file (default: ./promptcast.toml if present)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory the results file is written to
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// The arg groups guarantee exactly one of the pair is set.
    pub fn model_source(&self) -> Option<ModelSource> {
        match (&self.llm_list, &self.llm_file) {
            (Some(list), _) => Some(ModelSource::List(list.clone())),
            (None, Some(path)) => Some(ModelSource::File(path.clone())),
            (None, None) => None,
        }
    }

    pub fn prompt_source(&self) -> Option<PromptSource> {
        match (&self.prompt_string, &self.prompt_file) {
            (Some(text), _) => Some(PromptSource::Text(text.clone())),
            (None, Some(path)) => Some(PromptSource::File(path.clone())),
            (None, None) => None,
        }
    }

    pub fn system_prompt_source(&self) -> SystemPromptSource {
        match (&self.system_prompt, &self.system_prompt_file) {
            (Some(text), _) => SystemPromptSource::Text(text.clone()),
            (None, Some(path)) => SystemPromptSource::File(path.clone()),
            (None, None) => SystemPromptSource::Default,
        }
    }

    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("promptcast").chain(args.iter().copied()))
    }

    #[test]
    fn minimal_invocation_uses_default_system_prompt() {
        let cli = parse(&["--llm-list", "a/b", "--prompt-string", "Hello"]).unwrap();
        assert_eq!(cli.model_source(), Some(ModelSource::List("a/b".into())));
        assert_eq!(cli.prompt_source(), Some(PromptSource::Text("Hello".into())));
        assert_eq!(cli.system_prompt_source(), SystemPromptSource::Default);
        assert_eq!(cli.output_dir, PathBuf::from("."));
    }

    #[test]
    fn file_sources_map_to_file_variants() {
        let cli = parse(&[
            "--llm-file",
            "models.txt",
            "--prompt-file",
            "p.md",
            "--system-prompt-file",
            "s.md",
        ])
        .unwrap();
        assert_eq!(cli.model_source(), Some(ModelSource::File("models.txt".into())));
        assert_eq!(cli.prompt_source(), Some(PromptSource::File("p.md".into())));
        assert_eq!(cli.system_prompt_source(), SystemPromptSource::File("s.md".into()));
    }

    #[test]
    fn model_sources_are_mutually_exclusive() {
        let err = parse(&[
            "--llm-list",
            "a/b",
            "--llm-file",
            "m.txt",
            "--prompt-string",
            "x",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn prompt_sources_are_mutually_exclusive() {
        let err = parse(&[
            "--llm-list",
            "a/b",
            "--prompt-string",
            "x",
            "--prompt-file",
            "p.md",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn system_prompt_sources_are_mutually_exclusive() {
        let err = parse(&[
            "--llm-list",
            "a/b",
            "--prompt-string",
            "x",
            "--system-prompt",
            "s",
            "--system-prompt-file",
            "s.md",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn model_and_prompt_are_required() {
        let err = parse(&["--prompt-string", "x"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        let err = parse(&["--llm-list", "a/b"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn verbosity_maps_to_filter() {
        let cli = parse(&["--llm-list", "a/b", "--prompt-string", "x", "-vv"]).unwrap();
        assert_eq!(cli.log_filter(), "debug");
    }
}
