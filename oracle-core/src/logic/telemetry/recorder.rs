//! Comparison Log Recorder
//!
//! Append-only JSONL writer for telemetry events.
//! Thread-safe; rotates to a new file past a size limit. Writes block, so
//! async callers should reach it through a `QueuedSink`.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use parking_lot::Mutex;

use super::event::TelemetryEvent;
use super::sink::TelemetrySink;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Maximum file size before rotation (50 MB)
const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Log file extension
const LOG_EXT: &str = ".jsonl";

// ============================================================================
// RECORDER
// ============================================================================

struct LogFile {
    writer: BufWriter<File>,
    path: PathBuf,
    size: u64,
}

/// Append-only JSONL recorder
pub struct JsonlRecorder {
    base_dir: PathBuf,
    max_file_size: u64,
    file: Mutex<LogFile>,
    events_recorded: AtomicU64,
}

impl JsonlRecorder {
    /// Create a recorder in the given directory
    pub fn new(base_dir: PathBuf) -> std::io::Result<Self> {
        Self::with_max_size(base_dir, MAX_FILE_SIZE)
    }

    pub fn with_max_size(base_dir: PathBuf, max_file_size: u64) -> std::io::Result<Self> {
        std::fs::create_dir_all(&base_dir)?;
        let file = Self::open_new_file(&base_dir)?;

        Ok(Self {
            base_dir,
            max_file_size,
            file: Mutex::new(file),
            events_recorded: AtomicU64::new(0),
        })
    }

    /// Open a new log file named by timestamp
    fn open_new_file(base_dir: &Path) -> std::io::Result<LogFile> {
        let filename = format!(
            "comparisons_{}_{}{}",
            Utc::now().format("%Y_%m_%d_%H%M%S"),
            &uuid::Uuid::new_v4().simple().to_string()[..8],
            LOG_EXT
        );
        let path = base_dir.join(filename);

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        tracing::info!("Opened comparison log: {:?}", path);
        Ok(LogFile {
            writer: BufWriter::new(file),
            path,
            size: 0,
        })
    }

    /// Write one event as a JSON line
    pub fn append(&self, event: &TelemetryEvent) -> std::io::Result<()> {
        let line = serde_json::to_string(event)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let bytes = line.as_bytes();

        let mut file = self.file.lock();

        if file.size > 0 && file.size + bytes.len() as u64 + 1 > self.max_file_size {
            file.writer.flush()?;
            let next = Self::open_new_file(&self.base_dir)?;
            tracing::info!("Rotated from {:?} to {:?}", file.path, next.path);
            *file = next;
        }

        file.writer.write_all(bytes)?;
        file.writer.write_all(b"\n")?;
        file.writer.flush()?;
        file.size += bytes.len() as u64 + 1;

        self.events_recorded.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Current log file path
    pub fn current_file(&self) -> PathBuf {
        self.file.lock().path.clone()
    }

    /// Events written since creation
    pub fn events_recorded(&self) -> u64 {
        self.events_recorded.load(Ordering::Relaxed)
    }
}

impl TelemetrySink for JsonlRecorder {
    fn record(&self, event: TelemetryEvent) {
        if let Err(e) = self.append(&event) {
            tracing::error!(
                request_id = %event.request_id(),
                "Failed to record {} event: {}",
                event.as_str(),
                e
            );
        }
    }
}

// ============================================================================
// QUERY API
// ============================================================================

/// Read all events from a log file as raw JSON
pub fn read_events(file_path: &Path) -> std::io::Result<Vec<serde_json::Value>> {
    let reader = BufReader::new(File::open(file_path)?);
    let mut events = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        if let Ok(event) = serde_json::from_str(&line) {
            events.push(event);
        }
    }

    Ok(events)
}

/// All log files in a directory, oldest first
pub fn list_log_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if dir.is_dir() {
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().map_or(false, |e| e == "jsonl") {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::schema::PromptVariant;
    use crate::logic::telemetry::event::{AttemptOutcome, AttemptRecord};
    use tempfile::TempDir;
    use uuid::Uuid;

    fn attempt(n: u8) -> TelemetryEvent {
        TelemetryEvent::RepairAttempt(AttemptRecord {
            request_id: Uuid::new_v4(),
            variant: PromptVariant::Standard,
            attempt: n,
            max_tokens: 800,
            latency_ms: 12,
            outcome: AttemptOutcome::Rejected {
                reason: "malformed_json".to_string(),
                detail: "expected value".to_string(),
            },
            recorded_at: Utc::now(),
        })
    }

    #[test]
    fn test_recorder_creation() {
        let temp_dir = TempDir::new().unwrap();
        let recorder = JsonlRecorder::new(temp_dir.path().to_path_buf()).unwrap();
        assert!(recorder.current_file().exists());
    }

    #[test]
    fn test_jsonl_format() {
        let temp_dir = TempDir::new().unwrap();
        let recorder = JsonlRecorder::new(temp_dir.path().to_path_buf()).unwrap();

        for i in 1..=3 {
            recorder.record(attempt(i));
        }

        let events = read_events(&recorder.current_file()).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0]["event"], "repair_attempt");
        assert_eq!(events[2]["attempt"], 3);
        assert_eq!(events[0]["outcome"]["status"], "rejected");
        assert_eq!(recorder.events_recorded(), 3);
    }

    #[test]
    fn test_rotation() {
        let temp_dir = TempDir::new().unwrap();
        let recorder = JsonlRecorder::with_max_size(temp_dir.path().to_path_buf(), 64).unwrap();

        recorder.record(attempt(1));
        let first = recorder.current_file();
        recorder.record(attempt(2));

        assert_ne!(first, recorder.current_file());
        let files = list_log_files(temp_dir.path()).unwrap();
        assert_eq!(files.len(), 2);
    }
}
