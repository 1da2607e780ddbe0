// Pitch extractor backend abstraction
// Both analysis methods produce the same frame stream for the segmenter

use thiserror::Error;

use crate::config::{Config, Strategy};
use super::piptrack::{PiptrackAnalyzer, PiptrackConfig};
use super::smoothing::smooth_frames;
use super::types::PitchTrack;
use super::yin::{PyinConfig, PyinTracker};

/// Errors that can occur during pitch extraction
#[derive(Debug, Error)]
pub enum PitchError {
    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(u32),

    #[error("Invalid frequency range: fmin={fmin} Hz, fmax={fmax} Hz")]
    InvalidRange { fmin: f32, fmax: f32 },

    #[error("Invalid frame size: frame_length={frame_length}, hop_length={hop_length}")]
    InvalidFrameSize { frame_length: usize, hop_length: usize },

    #[error("Median filter kernel must be odd and positive, got {0}")]
    InvalidKernel(usize),

    #[error("Signal of {samples} samples is shorter than one frame ({frame_length})")]
    SignalTooShort { samples: usize, frame_length: usize },

    #[error("FFT failed: {0}")]
    Fft(String),
}

/// A pitch extraction method
pub trait PitchExtractor {
    /// Short identifier used in logs and traces
    fn name(&self) -> &'static str;

    /// Analyse mono samples into a time-ordered frame sequence
    fn extract(&self, samples: &[f32], sample_rate: u32) -> Result<PitchTrack, PitchError>;
}

/// Probabilistic YIN followed by median smoothing
pub struct PyinExtractor {
    tracker: PyinTracker,
    median_kernel: usize,
}

impl PyinExtractor {
    pub fn new(config: PyinConfig, median_kernel: usize) -> Self {
        PyinExtractor {
            tracker: PyinTracker::new(config),
            median_kernel,
        }
    }
}

impl PitchExtractor for PyinExtractor {
    fn name(&self) -> &'static str {
        "pyin"
    }

    fn extract(&self, samples: &[f32], sample_rate: u32) -> Result<PitchTrack, PitchError> {
        let mut track = self.tracker.track(samples, sample_rate)?;
        if self.median_kernel > 1 {
            track.frames = smooth_frames(&track.frames, self.median_kernel)?;
        }
        Ok(track)
    }
}

/// Spectral peak picking collapsed to the loudest peak per frame
pub struct PiptrackExtractor {
    analyzer: PiptrackAnalyzer,
}

impl PiptrackExtractor {
    pub fn new(config: PiptrackConfig) -> Result<Self, PitchError> {
        Ok(PiptrackExtractor {
            analyzer: PiptrackAnalyzer::new(config)?,
        })
    }
}

impl PitchExtractor for PiptrackExtractor {
    fn name(&self) -> &'static str {
        "piptrack"
    }

    fn extract(&self, samples: &[f32], sample_rate: u32) -> Result<PitchTrack, PitchError> {
        let matrix = self.analyzer.analyze(samples, sample_rate)?;
        Ok(matrix.to_track())
    }
}

/// Build the extractor that pairs with a segmentation strategy
pub fn extractor_for(config: &Config) -> Result<Box<dyn PitchExtractor>, PitchError> {
    match config.strategy {
        Strategy::Confidence => Ok(Box::new(PyinExtractor::new(
            config.pyin.clone(),
            config.median_kernel,
        ))),
        Strategy::Simple => Ok(Box::new(PiptrackExtractor::new(config.piptrack.clone())?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, seconds: f32) -> Vec<f32> {
        let n = (sample_rate as f32 * seconds) as usize;
        (0..n)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn test_extractor_selection() {
        let mut config = Config::default();
        assert_eq!(extractor_for(&config).unwrap().name(), "pyin");

        config.strategy = Strategy::Simple;
        assert_eq!(extractor_for(&config).unwrap().name(), "piptrack");
    }

    #[test]
    fn test_pyin_extractor_smooths() {
        let extractor = PyinExtractor::new(PyinConfig::default(), 5);
        let track = extractor.extract(&sine(523.25, 22050, 0.4), 22050).unwrap();

        assert_eq!(track.hop_length, 512);
        assert_eq!(track.sample_rate, 22050);
        assert!(track.voiced_count() > track.len() / 2);
    }

    #[test]
    fn test_pyin_extractor_rejects_even_kernel() {
        let extractor = PyinExtractor::new(PyinConfig::default(), 4);
        let result = extractor.extract(&sine(523.25, 22050, 0.2), 22050);
        assert!(matches!(result, Err(PitchError::InvalidKernel(4))));
    }

    #[test]
    fn test_piptrack_extractor_frames() {
        let extractor = PiptrackExtractor::new(PiptrackConfig::default()).unwrap();
        let track = extractor.extract(&sine(660.0, 22050, 0.4), 22050).unwrap();

        assert!(!track.is_empty());
        assert!(track.frames.iter().all(|f| f.voiced == f.frequency.is_some()));
        assert!(track.frames.windows(2).all(|w| w[0].time < w[1].time));
    }
}
