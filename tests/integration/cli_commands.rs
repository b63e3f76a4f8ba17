use promptcast::backend::BackendRegistry;
use promptcast::cli::{Commands, RunContext};
use promptcast::config::PromptcastConfig;
use promptcast::error::{ApiError, BackendError};
use std::path::PathBuf;
use tempfile::TempDir;

use crate::integration::test_utils::{backend, png, registry, FakeBackend, Step};

fn fast_config() -> PromptcastConfig {
    let mut config = PromptcastConfig::default();
    config.generation.max_retries = 2;
    config.generation.retry_delay_secs = 0;
    config.credentials.token_env = "PROMPTCAST_IT_TOKEN_UNSET".to_string();
    config
}

fn context(workspace: &TempDir, registry: BackendRegistry) -> RunContext {
    RunContext::from_config(workspace.path().to_path_buf(), fast_config())
        .unwrap()
        .with_registry(registry)
        .with_warm_up(false)
}

fn generate(prompts: &[&str], backends: &[&str], format: &str) -> Commands {
    Commands::Generate {
        prompts: prompts.iter().map(|p| p.to_string()).collect(),
        backends: backends.iter().map(|b| b.to_string()).collect(),
        format: format.to_string(),
    }
}

fn two_good_backends() -> BackendRegistry {
    registry(vec![
        backend("1", "Flux", FakeBackend::always(Step::Succeed(png()))),
        backend("2", "Nercy", FakeBackend::always(Step::Succeed(png()))),
    ])
}

#[test]
fn generate_writes_images_and_summarizes() {
    let workspace = TempDir::new().unwrap();
    let ctx = context(&workspace, two_good_backends());

    let output = ctx.execute(&generate(&["paisley"], &[], "text")).unwrap();

    assert!(output.contains("2 of 2 images generated"));
    let written = std::fs::read_dir(workspace.path().join("output")).unwrap().count();
    assert_eq!(written, 2);
}

#[test]
fn generate_json_reports_outcomes() {
    let workspace = TempDir::new().unwrap();
    let ctx = context(&workspace, two_good_backends());

    let output = ctx.execute(&generate(&["a", "b"], &["2"], "json")).unwrap();

    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(value["report"]["total"], 2);
    assert_eq!(value["report"]["successes"], 2);
    let outcomes = value["outcomes"].as_array().unwrap();
    assert!(outcomes.iter().all(|o| o["outcome"] == "success"));
    assert!(outcomes
        .iter()
        .all(|o| o["artifact_path"].as_str().unwrap().contains("nercy_2_")));
}

#[test]
fn generate_with_zero_successes_is_an_error() {
    let workspace = TempDir::new().unwrap();
    let failing = FakeBackend::always(Step::Fail(BackendError::other("overloaded")));
    let ctx = context(&workspace, registry(vec![backend("1", "Flux", failing.clone())]));

    let err = ctx.execute(&generate(&["paisley"], &[], "text")).unwrap_err();

    assert!(matches!(err, ApiError::GenerationFailed(_)));
    assert_eq!(failing.calls(), 2);
}

#[test]
fn unknown_backend_is_rejected_before_dispatch() {
    let workspace = TempDir::new().unwrap();
    let good = FakeBackend::always(Step::Succeed(png()));
    let ctx = context(&workspace, registry(vec![backend("1", "Flux", good.clone())]));

    let err = ctx.execute(&generate(&["paisley"], &["9"], "text")).unwrap_err();

    assert!(matches!(err, ApiError::BackendNotFound(ref id) if id == "9"));
    assert_eq!(good.calls(), 0);
}

#[test]
fn catalog_records_each_generated_image() {
    let workspace = TempDir::new().unwrap();
    let ctx = context(&workspace, two_good_backends())
        .with_catalog(Some(PathBuf::from("catalog.jsonl")));

    let output = ctx.execute(&generate(&["paisley"], &[], "text")).unwrap();

    assert!(output.contains("Published: 2 delivered, 0 failed"));
    let catalog = std::fs::read_to_string(workspace.path().join("catalog.jsonl")).unwrap();
    let rows: Vec<serde_json::Value> = catalog
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r["prompt"] == "paisley"));
    assert!(rows.iter().all(|r| r["category"] == "Seamless Pattern"));
}

#[test]
fn warm_up_keeps_a_backend_whose_probe_failed() {
    let workspace = TempDir::new().unwrap();
    let cold = FakeBackend::new(vec![
        Step::Fail(BackendError::other("cold start")),
        Step::Succeed(png()),
    ]);
    let ctx = RunContext::from_config(workspace.path().to_path_buf(), fast_config())
        .unwrap()
        .with_registry(registry(vec![backend("1", "Flux", cold.clone())]));

    let output = ctx.execute(&generate(&["paisley"], &[], "text")).unwrap();

    assert!(output.contains("1 of 1 images generated"));
    assert_eq!(cold.calls(), 2);
}

#[test]
fn probe_command_reports_each_backend() {
    let workspace = TempDir::new().unwrap();
    let ctx = context(
        &workspace,
        registry(vec![
            backend("1", "Flux", FakeBackend::always(Step::Succeed(png()))),
            backend("2", "Nercy", FakeBackend::always(Step::Fail(BackendError::other("down")))),
        ]),
    );

    let output = ctx
        .execute(&Commands::Probe {
            format: "json".to_string(),
        })
        .unwrap();

    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    let results = value["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["status"]["status"], "ready");
    assert_eq!(results[1]["status"]["status"], "degraded");
}
