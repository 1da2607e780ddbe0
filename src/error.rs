// Top-level conversion error
use thiserror::Error;

use crate::audio::AudioError;
use crate::config::ConfigError;
use crate::midi::MidiError;
use crate::pipeline::TraceError;
use crate::pitch::PitchError;
use crate::segment::SegmentError;
use crate::storage::StorageError;

/// Any failure that aborts a conversion run
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Pitch(#[from] PitchError),

    #[error(transparent)]
    Segment(#[from] SegmentError),

    #[error(transparent)]
    Midi(#[from] MidiError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Failed to write trace: {0}")]
    Trace(#[from] TraceError),
}

pub type ConvertResult<T> = Result<T, ConvertError>;
