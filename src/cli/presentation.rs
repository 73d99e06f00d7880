//! Presentation: ingest report and retry state formatters.

use crate::error::ApiError;
use crate::ingest::{IngestReport, SheetSummary};
use crate::retry::{RetryController, RetryPhase};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use serde_json::json;

pub fn format_ingest_report(
    report: &IngestReport<SheetSummary>,
    format: &str,
) -> Result<String, ApiError> {
    if format == "json" {
        let files: Vec<serde_json::Value> = report
            .results
            .iter()
            .map(|r| {
                json!({
                    "file": report.file_names[r.index()],
                    "ok": r.ok(),
                    "rows": r.value().map(|v| v.rows),
                    "bytes": r.value().map(|v| v.bytes),
                    "error": r.error().map(|e| e.message.clone()),
                })
            })
            .collect();
        let out = json!({
            "files": files,
            "progress": report.progress,
        });
        return Ok(serde_json::to_string_pretty(&out)?);
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["#", "File", "Status", "Rows", "Bytes", "Error"]);
    for r in &report.results {
        let (rows, bytes) = r
            .value()
            .map(|v| (v.rows.to_string(), v.bytes.to_string()))
            .unwrap_or_else(|| ("-".to_string(), "-".to_string()));
        table.add_row(vec![
            (r.index() + 1).to_string(),
            report.file_names[r.index()].clone(),
            if r.ok() { "ok" } else { "failed" }.to_string(),
            rows,
            bytes,
            r.error().map(|e| e.message.clone()).unwrap_or_default(),
        ]);
    }
    Ok(format!(
        "{}\n{} of {} files parsed, {} failed",
        table,
        report.succeeded(),
        report.progress.total(),
        report.progress.error_count()
    ))
}

pub fn format_retry_status(controller: &RetryController, format: &str) -> Result<String, ApiError> {
    let state = controller.state();
    let phase = match controller.phase() {
        RetryPhase::Idle => "idle".to_string(),
        RetryPhase::Retrying(n) => format!("retrying ({})", n),
        RetryPhase::Exhausted => "exhausted".to_string(),
    };
    let last_retry_at = chrono::DateTime::from_timestamp_millis(state.last_retry_at as i64)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| state.last_retry_at.to_string());

    if format == "json" {
        let out = json!({
            "storage_key": controller.storage_key(),
            "retry_count": state.retry_count,
            "max_retries": controller.config().max_retries,
            "phase": phase,
            "can_retry": controller.can_retry(),
            "next_delay_ms": controller.retry_delay_ms(),
            "last_retry_at": last_retry_at,
            "degraded": controller.is_degraded(),
        });
        return Ok(serde_json::to_string_pretty(&out)?);
    }

    Ok(format!(
        "Retry state for {}:\n  Phase: {}\n  Retries: {}/{}\n  Can retry: {}\n  Next delay: {} ms\n  Last retry: {}",
        controller.storage_key(),
        phase,
        state.retry_count,
        controller.config().max_retries,
        controller.can_retry(),
        controller.retry_delay_ms(),
        last_retry_at
    ))
}

pub fn format_retry_keys(keys: &[String]) -> String {
    if keys.is_empty() {
        return "No persisted retry records.".to_string();
    }
    let mut lines: Vec<String> = keys.iter().map(|k| format!("  {}", k)).collect();
    lines.insert(0, "Persisted retry records:".to_string());
    lines.join("\n")
}
