// Note segmentation module
// Turns per-frame pitch estimates into discrete note events

pub mod backend;
pub mod confidence;
pub mod simple;
pub mod types;

pub use backend::{ConfidenceSegmenter, Segment, SegmentConfig, SegmentError, Segmenter, SimpleSegmenter};
pub use confidence::{ConfidenceParams, HeldNote, SegmenterState};
pub use types::{Melody, NoteEvent};
