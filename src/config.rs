// Conversion settings
// JSON-loadable configuration covering every pipeline stage

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::audio::ResampleQuality;
use crate::midi::{MidiError, MidiExportOptions};
use crate::pitch::{PiptrackAnalyzer, PiptrackConfig, PitchError, PyinConfig, PyinTracker};
use crate::segment::{SegmentConfig, SegmentError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid audio settings: {0}")]
    Audio(String),

    #[error("Invalid pitch settings: {0}")]
    Pitch(#[from] PitchError),

    #[error("Invalid segmentation settings: {0}")]
    Segment(#[from] SegmentError),

    #[error("Invalid MIDI settings: {0}")]
    Midi(#[from] MidiError),
}

/// Melody extraction strategy
///
/// `Confidence` pairs probabilistic YIN with the confidence-gated segmenter.
/// `Simple` pairs spectral peak picking with repeat collapsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Confidence,
    Simple,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Confidence => "confidence",
            Strategy::Simple => "simple",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "confidence" => Ok(Strategy::Confidence),
            "simple" => Ok(Strategy::Simple),
            other => Err(format!("unknown strategy '{}'", other)),
        }
    }
}

/// Input audio handling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Every input is resampled to this rate before analysis
    pub target_sample_rate: u32,

    pub resample_quality: ResampleQuality,
}

impl Default for AudioConfig {
    fn default() -> Self {
        AudioConfig {
            target_sample_rate: 22050,
            resample_quality: ResampleQuality::default(),
        }
    }
}

/// Full conversion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,

    pub strategy: Strategy,

    pub pyin: PyinConfig,

    /// Median filter kernel applied to the pYIN frequency track (1 disables)
    pub median_kernel: usize,

    pub piptrack: PiptrackConfig,

    pub segment: SegmentConfig,

    pub midi: MidiExportOptions,
}

/// Reference settings: pYIN over C4-C7 with a 5-frame median filter
impl Default for Config {
    fn default() -> Self {
        Config {
            audio: AudioConfig::default(),
            strategy: Strategy::default(),
            pyin: PyinConfig::default(),
            median_kernel: 5,
            piptrack: PiptrackConfig::default(),
            segment: SegmentConfig::default(),
            midi: MidiExportOptions::default(),
        }
    }
}

impl Config {
    /// Check every section, including pitch settings against the target rate
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sample_rate = self.audio.target_sample_rate;
        if sample_rate == 0 {
            return Err(ConfigError::Audio("target_sample_rate must be positive".to_string()));
        }

        if self.median_kernel == 0 || self.median_kernel % 2 == 0 {
            return Err(PitchError::InvalidKernel(self.median_kernel).into());
        }

        match self.strategy {
            Strategy::Confidence => PyinTracker::new(self.pyin.clone()).validate(sample_rate)?,
            Strategy::Simple => {
                PiptrackAnalyzer::new(self.piptrack.clone())?;
            }
        }

        self.segment.validate()?;
        self.midi.validate()?;
        Ok(())
    }
}

/// Load a configuration from a JSON file
///
/// Missing fields fall back to the reference settings.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;

    parse_config(&contents)
}

/// Parse a configuration from JSON text
pub fn parse_config(json: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(json)?;
    log::debug!("Parsed config: strategy={}", config.strategy);
    Ok(config)
}
