use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use aegis_core::{Analysis, AnalysisConfig, analyze_batch, load_config, load_events};

/// Load the config, or fall back to defaults (all built-ins, no cooldowns)
fn config_or_default(path: Option<&Path>) -> Result<AnalysisConfig, String> {
    match path {
        Some(path) => load_config(path).map_err(|e| format!("{e}: {}", source_chain(&e))),
        None => Ok(AnalysisConfig::default()),
    }
}

fn source_chain(err: &dyn std::error::Error) -> String {
    let mut parts = Vec::new();
    let mut source = err.source();
    while let Some(cause) = source {
        parts.push(cause.to_string());
        source = cause.source();
    }
    parts.join(": ")
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<(), String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| e.to_string())?;

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{rendered}").map_err(|e| e.to_string())?;
    stdout.flush().map_err(|e| e.to_string())
}

/// Analyze a single event log and print its report
pub fn analyze(events: &Path, config: Option<&Path>, pretty: bool) -> Result<(), String> {
    let config = config_or_default(config)?;
    let analysis = Analysis::from_config(config).map_err(|e| e.to_string())?;

    let loaded = load_events(events).map_err(|e| format!("{e}: {}", source_chain(&e)))?;
    let result = analysis.run(loaded.events).map_err(|e| e.to_string())?;

    for failure in result.failures() {
        warn!(module = %failure.module, error = %failure.error, "module left out of report");
    }
    let mut report = result.report();
    report.skipped += loaded.skipped;
    print_json(&report, pretty)
}

#[derive(Serialize)]
struct BatchEntry {
    file: PathBuf,
    #[serde(flatten)]
    outcome: BatchOutcome,
}

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
enum BatchOutcome {
    Report(aegis_core::AnalysisReport),
    Error(String),
}

/// Analyze several logs in parallel and print one report per file
pub fn batch(files: &[PathBuf], config: Option<&Path>, pretty: bool) -> Result<(), String> {
    let config = config_or_default(config)?;
    let analysis = Analysis::from_config(config).map_err(|e| e.to_string())?;

    // Unreadable files are reported per entry rather than failing the batch
    let mut loaded = Vec::with_capacity(files.len());
    let mut skipped_at_load = Vec::with_capacity(files.len());
    let mut entries: Vec<Option<BatchEntry>> = Vec::with_capacity(files.len());
    for file in files {
        match load_events(file) {
            Ok(file_events) => {
                loaded.push(file_events.events);
                skipped_at_load.push(file_events.skipped);
                entries.push(None);
            }
            Err(e) => entries.push(Some(BatchEntry {
                file: file.clone(),
                outcome: BatchOutcome::Error(format!("{e}: {}", source_chain(&e))),
            })),
        }
    }

    let mut results = analyze_batch(&analysis, loaded)
        .into_iter()
        .zip(skipped_at_load);
    let entries: Vec<BatchEntry> = entries
        .into_iter()
        .zip(files)
        .filter_map(|(entry, file)| {
            entry.or_else(|| {
                results.next().map(|(result, skipped)| BatchEntry {
                    file: file.clone(),
                    outcome: match result {
                        Ok(mut report) => {
                            report.skipped += skipped;
                            BatchOutcome::Report(report)
                        }
                        Err(e) => BatchOutcome::Error(e.to_string()),
                    },
                })
            })
        })
        .collect();

    info!(files = files.len(), "batch complete");
    print_json(&entries, pretty)
}
