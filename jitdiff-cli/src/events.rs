//! `--output-events-to <path>` event log: one tagged JSON
//! object per line, written as the dispatcher goes, so a downstream
//! reporter can consume it without waiting for a worker to finish.

use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind")]
pub enum Event {
    ProgramGenerated { seed: u64, bytes: usize },
    CompileResult { seed: u64, config: String, outcome: String },
    ExecuteResult { seed: u64, outcome: String },
    Mismatch { seed: u64, debug_summary: String, release_summary: String },
    ReductionStep { seed: u64, phase: String, bytes_before: usize, bytes_after: usize },
    ReductionDone { seed: u64, original_bytes: usize, reduced_bytes: usize, elapsed_hhmmss: String },
}

/// Append-only, one worker owns one open file handle per `--output-events-to`
/// path; a `Mutex` here only guards concurrent writes from within a
/// single worker's own async tasks, not across workers.
#[derive(Debug)]
pub struct EventLog {
    writer: Mutex<BufWriter<File>>,
}

impl EventLog {
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let file = File::options().create(true).append(true).open(path)?;
        Ok(Self { writer: Mutex::new(BufWriter::new(file)) })
    }

    pub fn record(&self, event: &Event) {
        let mut line = serde_json::to_string(event).expect("Event always serializes");
        line.push('\n');
        let mut writer = self.writer.lock().expect("event log mutex poisoned");
        let _ = writer.write_all(line.as_bytes());
        let _ = writer.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_append_as_one_json_object_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let log = EventLog::open(&path).unwrap();
        log.record(&Event::ProgramGenerated { seed: 1, bytes: 100 });
        log.record(&Event::Mismatch { seed: 1, debug_summary: "1".into(), release_summary: "2".into() });
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"kind\":\"ProgramGenerated\""));
        assert!(lines[1].contains("\"kind\":\"Mismatch\""));
    }
}
