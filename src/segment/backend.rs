// Segmentation strategy abstraction
// Confidence-gated (reference) and simple (baseline) segmenters behind one interface

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Strategy;
use crate::pitch::Frame;
use super::confidence::{self, ConfidenceParams};
use super::simple;
use super::types::Melody;

/// Errors raised when building a segmenter
#[derive(Debug, Error)]
pub enum SegmentError {
    #[error("Minimum note duration must be positive, got {0}")]
    InvalidMinDuration(f64),

    #[error("Fixed note duration must be positive, got {0}")]
    InvalidFixedDuration(f64),

    #[error("Confidence threshold must be within [0, 1], got {0}")]
    InvalidConfidenceThreshold(f32),
}

/// Segmentation settings shared by both strategies
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Frames at or below this voicing probability end the current note
    pub confidence_threshold: f32,

    /// Notes shorter than this (seconds) are discarded
    pub min_note_duration: f64,

    /// Duration given to every note by the simple strategy (seconds)
    pub fixed_note_duration: f64,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        SegmentConfig {
            confidence_threshold: 0.6,
            min_note_duration: 0.1,
            fixed_note_duration: 0.4,
        }
    }
}

impl SegmentConfig {
    pub fn validate(&self) -> Result<(), SegmentError> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(SegmentError::InvalidConfidenceThreshold(self.confidence_threshold));
        }
        if !(self.min_note_duration > 0.0 && self.min_note_duration.is_finite()) {
            return Err(SegmentError::InvalidMinDuration(self.min_note_duration));
        }
        if !(self.fixed_note_duration > 0.0 && self.fixed_note_duration.is_finite()) {
            return Err(SegmentError::InvalidFixedDuration(self.fixed_note_duration));
        }
        Ok(())
    }
}

/// A strategy that collapses frames into a melody
pub trait Segment {
    fn segment(&self, frames: &[Frame]) -> Melody;
}

/// Confidence-gated segmenter with minimum duration enforcement
#[derive(Debug, Clone)]
pub struct ConfidenceSegmenter {
    params: ConfidenceParams,
}

impl ConfidenceSegmenter {
    pub fn new(confidence_threshold: f32, min_note_duration: f64) -> Result<Self, SegmentError> {
        if !(0.0..=1.0).contains(&confidence_threshold) {
            return Err(SegmentError::InvalidConfidenceThreshold(confidence_threshold));
        }
        if !(min_note_duration > 0.0 && min_note_duration.is_finite()) {
            return Err(SegmentError::InvalidMinDuration(min_note_duration));
        }

        Ok(ConfidenceSegmenter {
            params: ConfidenceParams {
                confidence_threshold,
                min_note_duration,
            },
        })
    }

    pub fn params(&self) -> &ConfidenceParams {
        &self.params
    }
}

impl Segment for ConfidenceSegmenter {
    fn segment(&self, frames: &[Frame]) -> Melody {
        confidence::segment_frames(frames, &self.params)
    }
}

/// Dedup segmenter with fixed synthetic note durations
#[derive(Debug, Clone)]
pub struct SimpleSegmenter {
    note_duration: f64,
}

impl SimpleSegmenter {
    pub fn new(note_duration: f64) -> Result<Self, SegmentError> {
        if !(note_duration > 0.0 && note_duration.is_finite()) {
            return Err(SegmentError::InvalidFixedDuration(note_duration));
        }
        Ok(SimpleSegmenter { note_duration })
    }
}

impl Segment for SimpleSegmenter {
    fn segment(&self, frames: &[Frame]) -> Melody {
        simple::segment_frames(frames, self.note_duration)
    }
}

/// Segmenter selected by strategy
pub struct Segmenter {
    strategy: Strategy,
    inner: Box<dyn Segment>,
}

impl Segmenter {
    pub fn new(strategy: Strategy, config: &SegmentConfig) -> Result<Self, SegmentError> {
        let inner: Box<dyn Segment> = match strategy {
            Strategy::Confidence => Box::new(ConfidenceSegmenter::new(
                config.confidence_threshold,
                config.min_note_duration,
            )?),
            Strategy::Simple => Box::new(SimpleSegmenter::new(config.fixed_note_duration)?),
        };

        Ok(Segmenter { strategy, inner })
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn segment(&self, frames: &[Frame]) -> Melody {
        self.inner.segment(frames)
    }
}
