//! End-to-end runs against a stubbed completion client.

mod common;

use common::{StubClient, fixed_clock, json_files, temp_dir};
use promptcast::app::{RunInputs, run};
use promptcast::error::PromptcastError;
use promptcast::input::{ModelSource, PromptSource, SystemPromptSource};

fn inputs(models: ModelSource, prompt: &str, dir: &std::path::Path) -> RunInputs {
    RunInputs {
        models,
        prompt: PromptSource::Text(prompt.to_string()),
        system_prompt: SystemPromptSource::Default,
        output_dir: dir.to_path_buf(),
    }
}

#[tokio::test]
async fn two_model_scenario_writes_expected_json() {
    let dir = temp_dir("run-scenario");
    let client = StubClient::new(&[
        ("fakeprovider/modelA", "OK-A"),
        ("fakeprovider/modelB", "OK-B"),
    ]);

    let outcome = run(
        &client,
        &inputs(
            ModelSource::List("fakeprovider/modelA,fakeprovider/modelB".to_string()),
            "Hello",
            &dir,
        ),
        &fixed_clock(),
    )
    .await
    .unwrap();

    assert_eq!(
        outcome.results_file,
        dir.join("results_2025_03_04_05_06_07.json")
    );
    let written = std::fs::read_to_string(&outcome.results_file).unwrap();
    assert_eq!(
        written,
        r#"[{"model":"fakeprovider/modelA","response":"OK-A"},{"model":"fakeprovider/modelB","response":"OK-B"}]"#
    );
    for (_, system, user) in client.calls() {
        assert_eq!(system, "You are a helpful assistant");
        assert_eq!(user, "Hello");
    }
}

#[tokio::test]
async fn entry_count_matches_resolved_models_from_file() {
    let dir = temp_dir("run-count");
    let list = dir.join("models.txt");
    std::fs::write(&list, "# models\na/1\n\nb/2\nc/3\n#d/4\n").unwrap();
    let client = StubClient::new(&[]);

    let outcome = run(&client, &inputs(ModelSource::File(list), "hi", &dir), &fixed_clock())
        .await
        .unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&outcome.results_file).unwrap()).unwrap();
    let entries = written.as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(outcome.results.len(), 3);
    assert_eq!(entries[2]["model"], "c/3");
    assert_eq!(entries[2]["response"], "reply from c/3");
}

#[tokio::test]
async fn failure_on_second_of_three_writes_nothing() {
    let dir = temp_dir("run-failure");
    let client = StubClient::new(&[]).failing_on("p/b");

    let err = run(
        &client,
        &inputs(ModelSource::List("p/a,p/b,p/c".to_string()), "Hello", &dir),
        &fixed_clock(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, PromptcastError::Dispatch { .. }));
    assert!(json_files(&dir).is_empty(), "no results file on failure");
    assert_eq!(client.calls_for("p/a"), 1);
    assert_eq!(client.calls_for("p/c"), 0);
}

#[tokio::test]
async fn invalid_model_means_zero_dispatches() {
    let dir = temp_dir("run-invalid");
    let client = StubClient::new(&[]);

    let err = run(
        &client,
        &inputs(ModelSource::List("good/model,no-separator".to_string()), "Hello", &dir),
        &fixed_clock(),
    )
    .await
    .unwrap_err();

    assert!(err.is_input_error());
    assert!(client.calls().is_empty());
    assert!(json_files(&dir).is_empty());
}

#[tokio::test]
async fn unreadable_system_prompt_file_aborts_before_dispatch() {
    let dir = temp_dir("run-missing-system");
    let client = StubClient::new(&[]);
    let mut run_inputs = inputs(ModelSource::List("a/b".to_string()), "Hello", &dir);
    run_inputs.system_prompt = SystemPromptSource::File(dir.join("missing.md"));

    let err = run(&client, &run_inputs, &fixed_clock()).await.unwrap_err();

    assert!(matches!(err, PromptcastError::ReadInput { .. }));
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn same_second_runs_overwrite_each_other() {
    let dir = temp_dir("run-collision");
    let clock = fixed_clock();

    let first = StubClient::new(&[("a/b", "first")]);
    run(&first, &inputs(ModelSource::List("a/b".into()), "x", &dir), &clock)
        .await
        .unwrap();
    let second = StubClient::new(&[("a/b", "second")]);
    let outcome = run(&second, &inputs(ModelSource::List("a/b".into()), "x", &dir), &clock)
        .await
        .unwrap();

    assert_eq!(json_files(&dir).len(), 1);
    let written = std::fs::read_to_string(outcome.results_file).unwrap();
    assert!(written.contains("second"));
}
