use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

use crate::reconcile::BatchResult;

/// One pushed row, as appended to the report log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PushEvent {
    pub timestamp: String,
    pub row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

pub fn events(result: &BatchResult) -> Vec<PushEvent> {
    let timestamp = result.finished_at.to_rfc3339();
    result
        .reports
        .iter()
        .map(|report| PushEvent {
            timestamp: timestamp.clone(),
            row: report.row,
            key: report.key.clone(),
            outcome: report.outcome.kind().to_string(),
            detail: report.outcome.detail(),
        })
        .collect()
}

/// Append every row outcome of a batch as JSON lines.
pub fn append_batch(path: &Path, result: &BatchResult) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    for event in events(result) {
        let line = serde_json::to_string(&event)?;
        writeln!(file, "{line}")?;
    }
    Ok(())
}

pub fn read_events(path: &Path, limit: Option<usize>) -> Vec<PushEvent> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::debug!(
                    path = %path.display(),
                    error = %e,
                    "could not read push report"
                );
            }
            return Vec::new();
        }
    };

    let mut events: Vec<PushEvent> = contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(i, line)| match serde_json::from_str(line) {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::debug!(
                    path = %path.display(),
                    line = i + 1,
                    error = %e,
                    "skipping malformed report line"
                );
                None
            }
        })
        .collect();

    if let Some(limit) = limit {
        let len = events.len();
        if len > limit {
            events = events.split_off(len - limit);
        }
    }

    events
}
