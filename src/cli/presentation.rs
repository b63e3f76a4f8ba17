//! CLI presentation: text and json formatters per command, plus the terminal progress sink.

use crate::backend::BackendConfig;
use crate::cli::output::to_json;
use crate::error::ApiError;
use crate::generation::{GenerationBatch, Outcome, ProbeStatus, WarmUpReport};
use crate::progress::{AttemptStatus, ProgressEvent, ProgressSink};
use crate::publish::PublishReport;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::{Cell, Color, Table};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use serde_json::json;
use std::collections::BTreeMap;
use std::io::Write;

fn title(text: &str) -> String {
    format!("{}", text.bold().underline())
}

pub fn format_backends_text(backends: &BTreeMap<String, BackendConfig>) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["ID", "Name", "Model", "Endpoint"]);
    for (id, backend) in backends {
        table.add_row(vec![
            id.as_str(),
            backend.display_name.as_str(),
            backend.model.as_str(),
            backend.endpoint_or_default(),
        ]);
    }
    format!("{}\n{}", title("Backends"), table)
}

pub fn format_backends_json(
    backends: &BTreeMap<String, BackendConfig>,
) -> Result<String, ApiError> {
    let rows: Vec<serde_json::Value> = backends
        .iter()
        .map(|(id, backend)| {
            json!({
                "identifier": id,
                "display_name": backend.display_name,
                "backend_type": backend.backend_type.as_str(),
                "model": backend.model,
                "endpoint": backend.endpoint_or_default(),
            })
        })
        .collect();
    to_json(&rows)
}

/// Cells carry their colour as table styling so column widths stay correct.
fn status_cell(status: &ProbeStatus) -> Cell {
    match status {
        ProbeStatus::Ready => Cell::new("ready").fg(Color::Green),
        ProbeStatus::Degraded(reason) => {
            Cell::new(format!("degraded ({})", reason)).fg(Color::Yellow)
        }
        ProbeStatus::NotProbed => Cell::new("not probed").fg(Color::DarkGrey),
    }
}

fn probe_table(report: &WarmUpReport) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["ID", "Backend", "Status", "Time"]);
    for result in &report.results {
        let time = result
            .elapsed_secs
            .map(|secs| format!("{:.1}s", secs))
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            Cell::new(&result.backend_identifier),
            Cell::new(&result.backend_name),
            status_cell(&result.status),
            Cell::new(time),
        ]);
    }
    table
}

pub fn format_probe_text(report: &WarmUpReport) -> String {
    format!(
        "{}\n{}\n{} ready, {} degraded, {} not probed in {:.1}s",
        title("Warm-up"),
        probe_table(report),
        report.count("ready"),
        report.count("degraded"),
        report.count("not probed"),
        report.elapsed.as_secs_f64()
    )
}

pub fn format_probe_json(report: &WarmUpReport) -> Result<String, ApiError> {
    to_json(&json!({
        "results": report.results,
        "elapsed_secs": report.elapsed.as_secs_f64(),
    }))
}

fn batch_table(batch: &GenerationBatch) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Unit", "Backend", "Result", "Attempts", "Time", "Artifact"]);
    for outcome in &batch.outcomes {
        match outcome {
            Outcome::Success(artifact) => table.add_row(vec![
                Cell::new(&artifact.unit_id),
                Cell::new(&artifact.backend_name),
                Cell::new("ok").fg(Color::Green),
                Cell::new(artifact.attempt_count),
                Cell::new(format!("{:.1}s", artifact.elapsed.as_secs_f64())),
                Cell::new(artifact.artifact_path.display()),
            ]),
            Outcome::Exhausted(unit) => table.add_row(vec![
                Cell::new(&unit.unit_id),
                Cell::new(&unit.backend_name),
                Cell::new("failed").fg(Color::Red),
                Cell::new(unit.attempt_count),
                Cell::new("-"),
                Cell::new(&unit.last_reason),
            ]),
        };
    }
    table
}

pub fn format_batch_text(batch: &GenerationBatch, publish: Option<&PublishReport>) -> String {
    let table = batch_table(batch);

    let report = batch.report();
    let mut output = format!("{}\n{}\n", title("Summary"), table);
    if report.successes == 0 {
        output.push_str(&format!("{}", "No images were successfully generated".yellow().bold()));
    } else {
        output.push_str(&format!(
            "{} of {} images generated in {:.1}s",
            report.successes,
            report.total,
            report.elapsed.as_secs_f64()
        ));
    }
    if let Some(publish) = publish {
        if !publish.deliveries.is_empty() {
            output.push_str(&format!(
                "\nPublished: {} delivered, {} failed",
                publish.delivered(),
                publish.failed()
            ));
        }
    }
    output
}

pub fn format_batch_json(
    batch: &GenerationBatch,
    publish: Option<&PublishReport>,
) -> Result<String, ApiError> {
    to_json(&json!({
        "report": batch.report(),
        "outcomes": batch.outcomes,
        "publish": publish,
    }))
}

/// One terminal line for a progress event.
pub fn format_progress_line(event: &ProgressEvent) -> String {
    let head = format!(
        "[{}] {} attempt {}/{}",
        event.unit_id,
        event.backend_name,
        event.attempt_index + 1,
        event.max_attempts
    );
    let detail = event
        .detail
        .as_deref()
        .map(|d| format!(": {}", d))
        .unwrap_or_default();
    match event.status {
        AttemptStatus::Attempting => format!("{} {}", head, "generating".blue()),
        AttemptStatus::Succeeded => format!("{} {}", head, "done".green()),
        AttemptStatus::TimedOut => format!("{} {}{}", head, "timed out".yellow(), detail),
        AttemptStatus::Failed => format!("{} {}{}", head, "failed".yellow(), detail),
        AttemptStatus::Retrying => format!("{} {}", head, "retrying".dimmed()),
        AttemptStatus::Exhausted => format!("{} {}{}", head, "gave up".red(), detail),
    }
}

/// Prints progress lines to stderr; concurrent units share the lock.
pub struct ConsoleProgress {
    lock: Mutex<()>,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self {
            lock: Mutex::new(()),
        }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ConsoleProgress {
    fn emit(&self, event: ProgressEvent) {
        if event.status == AttemptStatus::Retrying {
            return;
        }
        let line = format_progress_line(&event);
        let _guard = self.lock.lock();
        let _ = writeln!(std::io::stderr(), "{}", line);
    }
}
