// Command layer
// Resolves user-facing requests into a configuration and runs the conversion

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::{self, Config, Strategy};
use crate::pipeline::{self, ConvertSummary};
use crate::storage;

#[derive(Debug, Serialize)]
pub struct CommandError {
    message: String,
}

impl CommandError {
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl<E: std::fmt::Display> From<E> for CommandError {
    fn from(error: E) -> Self {
        CommandError {
            message: error.to_string(),
        }
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

/// A single conversion request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConvertRequest {
    pub input: PathBuf,

    /// Defaults to the input path with a `.mid` extension
    pub output: Option<PathBuf>,

    /// JSON configuration file applied before the overrides below
    pub config: Option<PathBuf>,

    pub strategy: Option<Strategy>,
    pub confidence_threshold: Option<f32>,
    pub min_note_duration: Option<f64>,

    /// JSONL trace file to append stage events to
    pub trace: Option<PathBuf>,
}

/// Build the effective configuration: file (or defaults), then overrides
pub fn resolve_config(request: &ConvertRequest) -> CommandResult<Config> {
    let mut config = match &request.config {
        Some(path) => config::load_config(path)?,
        None => Config::default(),
    };

    if let Some(strategy) = request.strategy {
        config.strategy = strategy;
    }
    if let Some(threshold) = request.confidence_threshold {
        config.segment.confidence_threshold = threshold;
    }
    if let Some(min_duration) = request.min_note_duration {
        config.segment.min_note_duration = min_duration;
    }

    Ok(config)
}

pub fn convert_command(request: ConvertRequest) -> CommandResult<ConvertSummary> {
    let config = resolve_config(&request)?;
    let output = request
        .output
        .clone()
        .unwrap_or_else(|| storage::default_output_path(&request.input));

    let summary = pipeline::convert(&request.input, &output, &config, request.trace.as_deref())?;
    Ok(summary)
}
