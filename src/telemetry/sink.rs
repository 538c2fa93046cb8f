//! Append-only JSONL telemetry sink with size-based rotation

use super::events::TelemetryEvent;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

const EVENTS_FILE: &str = "events.jsonl";
const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("telemetry io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("telemetry serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Writes events to `<dir>/events.jsonl`, rotating to `events.jsonl.N` when
/// the active file exceeds 100 MB.
pub struct TelemetrySink {
    dir: PathBuf,
}

impl TelemetrySink {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, TelemetryError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn events_path(&self) -> PathBuf {
        self.dir.join(EVENTS_FILE)
    }

    fn rotate_if_needed(&self) -> Result<(), TelemetryError> {
        let path = self.events_path();
        let size = match fs::metadata(&path) {
            Ok(meta) => meta.len(),
            Err(_) => return Ok(()),
        };
        if size < MAX_FILE_SIZE {
            return Ok(());
        }
        let mut n = 1;
        while self.dir.join(format!("{}.{}", EVENTS_FILE, n)).exists() {
            n += 1;
        }
        fs::rename(&path, self.dir.join(format!("{}.{}", EVENTS_FILE, n)))?;
        Ok(())
    }

    pub fn record(&self, event: &TelemetryEvent) -> Result<(), TelemetryError> {
        self.rotate_if_needed()?;
        let mut line = serde_json::to_string(event)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.events_path())?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    /// Read back every event in the active file. Skips lines that fail to
    /// parse rather than aborting the whole read.
    pub fn read_events(&self) -> Result<Vec<TelemetryEvent>, TelemetryError> {
        let path = self.events_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        read_jsonl(&path)
    }
}

fn read_jsonl(path: &Path) -> Result<Vec<TelemetryEvent>, TelemetryError> {
    let reader = BufReader::new(File::open(path)?);
    let mut events = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if let Ok(event) = serde_json::from_str(&line) {
            events.push(event);
        }
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::events::session_start_event;
    use tempfile::TempDir;

    #[test]
    fn events_round_trip_through_jsonl() {
        let dir = TempDir::new().unwrap();
        let sink = TelemetrySink::new(dir.path()).unwrap();

        sink.record(&session_start_event("session-1", "ship it")).unwrap();
        sink.record(&session_start_event("session-2", "fix it")).unwrap();

        let events = sink.read_events().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, "session.start");
        assert_eq!(events[1].trace_id, "sess-session-2");
    }

    #[test]
    fn unparseable_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let sink = TelemetrySink::new(dir.path()).unwrap();
        sink.record(&session_start_event("session-1", "ok")).unwrap();

        let path = dir.path().join(EVENTS_FILE);
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "not json at all").unwrap();

        assert_eq!(sink.read_events().unwrap().len(), 1);
    }

    #[test]
    fn oversized_file_rotates_before_write() {
        let dir = TempDir::new().unwrap();
        let sink = TelemetrySink::new(dir.path()).unwrap();
        let path = dir.path().join(EVENTS_FILE);

        // Fake an oversized active file
        let file = File::create(&path).unwrap();
        file.set_len(MAX_FILE_SIZE + 1).unwrap();
        drop(file);

        sink.record(&session_start_event("session-1", "ok")).unwrap();
        assert!(dir.path().join("events.jsonl.1").exists());
        assert_eq!(sink.read_events().unwrap().len(), 1);
    }
}
