// Conversion progress tracing
// Append-only JSONL trace file, one line per stage event

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during trace operations
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Conversion stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Load,
    Pitch,
    Segment,
    Export,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Load => "load",
            Stage::Pitch => "pitch",
            Stage::Segment => "segment",
            Stage::Export => "export",
        }
    }

    /// Overall progress once this stage has finished
    pub fn completed_progress(&self) -> f32 {
        match self {
            Stage::Load => 0.25,
            Stage::Pitch => 0.6,
            Stage::Segment => 0.8,
            Stage::Export => 1.0,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single line in the conversion trace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    /// RFC 3339 timestamp of when this entry was created
    pub timestamp: String,

    /// Conversion run this entry belongs to
    pub run_id: Uuid,

    pub stage: Stage,

    /// Overall progress [0.0, 1.0]
    pub progress: f32,

    pub message: String,

    /// Optional structured data (frame counts, note counts, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl TraceEntry {
    pub fn new(run_id: Uuid, stage: Stage, progress: f32, message: impl Into<String>) -> Self {
        TraceEntry {
            timestamp: Utc::now().to_rfc3339(),
            run_id,
            stage,
            progress: progress.clamp(0.0, 1.0),
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Serialize to JSON line (with newline)
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(format!("{}\n", json))
    }
}

/// Appends entries to a JSONL file
pub struct TraceWriter {
    file_path: PathBuf,
}

impl TraceWriter {
    pub fn new(file_path: PathBuf) -> Self {
        TraceWriter { file_path }
    }

    /// Append a trace entry, creating the file if needed
    pub fn write(&self, entry: &TraceEntry) -> Result<(), TraceError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)?;

        file.write_all(entry.to_json_line()?.as_bytes())?;
        file.flush()?;

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

/// Per-run trace emitter; a no-op when no trace file was requested
pub struct Tracer {
    run_id: Uuid,
    writer: Option<TraceWriter>,
}

impl Tracer {
    pub fn new(run_id: Uuid, path: Option<&Path>) -> Self {
        Tracer {
            run_id,
            writer: path.map(|p| TraceWriter::new(p.to_path_buf())),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Record the start of a stage
    pub fn start(&self, stage: Stage, message: impl Into<String>) -> Result<(), TraceError> {
        let progress = match stage {
            Stage::Load => 0.0,
            Stage::Pitch => Stage::Load.completed_progress(),
            Stage::Segment => Stage::Pitch.completed_progress(),
            Stage::Export => Stage::Segment.completed_progress(),
        };
        self.emit(TraceEntry::new(self.run_id, stage, progress, message))
    }

    /// Record the end of a stage with its results
    pub fn complete(
        &self,
        stage: Stage,
        message: impl Into<String>,
        data: serde_json::Value,
    ) -> Result<(), TraceError> {
        let message = message.into();
        log::info!("[{}] {}", stage, message);
        self.emit(
            TraceEntry::new(self.run_id, stage, stage.completed_progress(), message).with_data(data),
        )
    }

    fn emit(&self, entry: TraceEntry) -> Result<(), TraceError> {
        match &self.writer {
            Some(writer) => writer.write(&entry),
            None => Ok(()),
        }
    }
}

/// Read trace entries from a JSONL file
pub fn read_trace_file(path: &Path) -> Result<Vec<TraceEntry>, TraceError> {
    let contents = std::fs::read_to_string(path)?;
    let mut entries = Vec::new();

    for line in contents.lines() {
        if line.trim().is_empty() {
            continue;
        }

        let entry: TraceEntry = serde_json::from_str(line)?;
        entries.push(entry);
    }

    Ok(entries)
}
