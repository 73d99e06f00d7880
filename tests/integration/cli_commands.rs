use sheetpipe::retry::RetryState;
use sheetpipe::store::{KeyValueStore, SledStore};
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn sheetpipe(workspace: &Path, config_home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sheetpipe"))
        .env("XDG_CONFIG_HOME", config_home)
        .env_remove("SHEETPIPE_LOG")
        .env_remove("SHEETPIPE_ENV")
        .env_remove("SHEETPIPE__BATCH__CONCURRENCY")
        .arg("--quiet")
        .arg("--workspace")
        .arg(workspace)
        .args(args)
        .output()
        .unwrap()
}

fn stdout_json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "command failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn ingest_reports_each_file() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path().join("ws");
    fs::create_dir_all(&workspace).unwrap();
    let good = workspace.join("sales.csv");
    fs::write(&good, "region,total\nnorth,10\nsouth,12\n").unwrap();
    let missing = workspace.join("missing.csv");

    let output = sheetpipe(
        &workspace,
        &temp_dir.path().join("xdg"),
        &[
            "ingest",
            good.to_str().unwrap(),
            missing.to_str().unwrap(),
            "--concurrency",
            "1",
            "--format",
            "json",
        ],
    );
    let json = stdout_json(&output);

    let files = json["files"].as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0]["file"], "sales.csv");
    assert_eq!(files[0]["ok"], true);
    assert_eq!(files[0]["rows"], 3);
    assert_eq!(files[1]["ok"], false);
    assert_eq!(json["progress"]["completed"], 2);
    assert_eq!(json["progress"]["errors"][0]["file_name"], "missing.csv");
}

#[test]
fn retry_status_and_reset_use_persisted_record() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path().join("ws");
    let store_path = workspace.join(".sheetpipe/store");
    fs::create_dir_all(&store_path).unwrap();
    {
        let store = SledStore::open(&store_path).unwrap();
        let state = RetryState {
            retry_count: 3,
            last_retry_at: 1_710_000_000_000,
        };
        store.set("chunk:charts", &state.encode()).unwrap();
    }
    let config_home = temp_dir.path().join("xdg");

    let status = stdout_json(&sheetpipe(
        &workspace,
        &config_home,
        &["retry", "status", "--key", "chunk:charts", "--format", "json"],
    ));
    assert_eq!(status["retry_count"], 3);
    assert_eq!(status["phase"], "exhausted");
    assert_eq!(status["can_retry"], false);

    let reset = sheetpipe(&workspace, &config_home, &["retry", "reset", "--key", "chunk:charts"]);
    assert!(reset.status.success());
    assert!(String::from_utf8_lossy(&reset.stdout).contains("was 3 retries"));

    let status = stdout_json(&sheetpipe(
        &workspace,
        &config_home,
        &["retry", "status", "--key", "chunk:charts", "--format", "json"],
    ));
    assert_eq!(status["retry_count"], 0);
    assert_eq!(status["can_retry"], true);
    assert_eq!(status["next_delay_ms"], 1000);
}
