use promptcast::cli::{Commands, RunContext};
use promptcast::config::ConfigLoader;
use promptcast::error::ApiError;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use crate::integration::with_xdg_env;

fn write(path: &std::path::Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

#[test]
fn workspace_file_layers_over_global_file() {
    let temp_dir = TempDir::new().unwrap();
    with_xdg_env(&temp_dir, || {
        let workspace = temp_dir.path().join("workspace");
        write(
            &temp_dir.path().join("xdg").join("promptcast").join("config.toml"),
            r#"
output_dir = "xdg-out"

[generation]
max_retries = 2
retry_delay_secs = 1
"#,
        );
        write(
            &workspace.join("config").join("config.toml"),
            r#"
[generation]
max_retries = 3

[backends.7]
display_name = "Local"
model = "org/local"
endpoint = "http://localhost:8080"
"#,
        );

        let ctx = RunContext::new(workspace.clone(), None).unwrap();
        let config = ctx.config();
        assert_eq!(config.output_dir, PathBuf::from("xdg-out"));
        assert_eq!(config.generation.max_retries, 3);
        assert_eq!(config.generation.retry_delay_secs, 1);
        assert_eq!(config.effective_backends().len(), 1);
        assert_eq!(ctx.output_dir(), workspace.join("xdg-out"));
    });
}

#[test]
fn explicit_config_file_replaces_discovery() {
    let temp_dir = TempDir::new().unwrap();
    with_xdg_env(&temp_dir, || {
        let workspace = temp_dir.path().join("workspace");
        write(
            &workspace.join("config").join("config.toml"),
            "output_dir = \"from-workspace\"\n",
        );
        let explicit = temp_dir.path().join("explicit.toml");
        write(&explicit, "[warm_up]\nenabled = false\n");

        let config = ConfigLoader::resolve(&workspace, Some(explicit.as_path())).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert!(!config.warm_up.enabled);
    });
}

#[test]
fn invalid_values_fail_before_any_command_runs() {
    let temp_dir = TempDir::new().unwrap();
    with_xdg_env(&temp_dir, || {
        let explicit = temp_dir.path().join("bad.toml");
        write(
            &explicit,
            r#"
[generation]
max_retries = 0

[backends.1]
display_name = "Flux"
model = ""
"#,
        );

        let err = match RunContext::new(temp_dir.path().to_path_buf(), Some(explicit)) {
            Ok(_) => panic!("invalid config must be rejected"),
            Err(e) => e,
        };
        match err {
            ApiError::ConfigError(message) => {
                assert!(message.contains("Generation"));
                assert!(message.contains("Backend '1'"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    });
}

#[test]
fn config_command_prints_effective_toml() {
    let temp_dir = TempDir::new().unwrap();
    with_xdg_env(&temp_dir, || {
        let workspace = temp_dir.path().join("workspace");
        write(
            &workspace.join("config").join("config.toml"),
            "[catalog]\nenabled = true\ncategory = \"Wallpaper\"\n",
        );

        let ctx = RunContext::new(workspace, None).unwrap();
        let rendered = ctx.execute(&Commands::Config).unwrap();
        let parsed: toml::Value = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed["catalog"]["category"].as_str(), Some("Wallpaper"));
        assert_eq!(parsed["backends"]["4"]["display_name"].as_str(), Some("Nercy"));
    });
}
