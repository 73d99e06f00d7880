use sheetpipe::config::ConfigLoader;
use std::fs;
use tempfile::TempDir;

use crate::integration::test_utils::with_isolated_env;

#[test]
fn defaults_apply_without_any_files() {
    let temp_dir = TempDir::new().unwrap();
    with_isolated_env(&temp_dir, || {
        let config = ConfigLoader::load(temp_dir.path()).unwrap();
        assert_eq!(config.batch.concurrency, 3);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(
            config.storage.resolve_path(temp_dir.path()),
            temp_dir.path().join(".sheetpipe/store")
        );
    });
}

#[test]
fn workspace_env_file_and_variables_layer_in_order() {
    let temp_dir = TempDir::new().unwrap();
    with_isolated_env(&temp_dir, || {
        let global_dir = temp_dir.path().join("xdg_config").join("sheetpipe");
        fs::create_dir_all(&global_dir).unwrap();
        fs::write(
            global_dir.join("config.toml"),
            "[batch]\nconcurrency = 2\n\n[retry]\nbase_delay_ms = 250\n",
        )
        .unwrap();

        let workspace = temp_dir.path().join("ws");
        let config_dir = workspace.join("config");
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(
            config_dir.join("config.toml"),
            "[batch]\nconcurrency = 4\n\n[retry]\nmax_retries = 5\n",
        )
        .unwrap();
        fs::write(config_dir.join("staging.toml"), "[retry]\nmax_retries = 7\n").unwrap();

        std::env::set_var("SHEETPIPE_ENV", "staging");
        std::env::set_var("SHEETPIPE__BATCH__CONCURRENCY", "9");

        let config = ConfigLoader::load(&workspace).unwrap();
        assert_eq!(config.batch.concurrency, 9);
        assert_eq!(config.retry.max_retries, 7);
        assert_eq!(config.retry.base_delay_ms, 250);
        assert_eq!(config.retry.backoff_factor, 2.0);
    });
}

#[test]
fn invalid_layered_value_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    with_isolated_env(&temp_dir, || {
        let config_dir = temp_dir.path().join("config");
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join("config.toml"), "[retry]\nbackoff_factor = 1.0\n").unwrap();

        let err = ConfigLoader::load(temp_dir.path()).unwrap_err();
        assert!(err.to_string().contains("backoff_factor"));
    });
}
