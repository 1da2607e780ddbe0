// Pitch extraction module
// Fundamental frequency tracking and spectral peak picking

pub mod backend;
pub mod piptrack;
pub mod smoothing;
pub mod types;
pub mod yin;

pub use backend::{extractor_for, PiptrackExtractor, PitchError, PitchExtractor, PyinExtractor};
pub use piptrack::{PiptrackAnalyzer, PiptrackConfig};
pub use smoothing::{median_filter, smooth_frames};
pub use types::{frames_to_time, hz_to_midi, midi_note_number, midi_to_hz, note_name, note_to_hz, Frame, PeakMatrix, PitchTrack};
pub use yin::{PyinConfig, PyinTracker};
