//! Shared test utilities for integration tests

use std::sync::Mutex;
use tempfile::TempDir;

/// Serializes tests that touch process environment variables.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const TOUCHED_VARS: &[&str] = &[
    "XDG_CONFIG_HOME",
    "SHEETPIPE_ENV",
    "SHEETPIPE__BATCH__CONCURRENCY",
    "SHEETPIPE__RETRY__MAX_RETRIES",
];

/// Run `f` with XDG_CONFIG_HOME pointed into `temp_dir`, restoring the
/// environment afterwards.
pub fn with_isolated_env<F, R>(temp_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let saved: Vec<(&str, Option<String>)> = TOUCHED_VARS
        .iter()
        .map(|name| (*name, std::env::var(name).ok()))
        .collect();

    for name in TOUCHED_VARS {
        std::env::remove_var(name);
    }
    std::env::set_var("XDG_CONFIG_HOME", temp_dir.path().join("xdg_config"));

    let result = f();

    for (name, value) in saved {
        match value {
            Some(v) => std::env::set_var(name, v),
            None => std::env::remove_var(name),
        }
    }
    result
}
