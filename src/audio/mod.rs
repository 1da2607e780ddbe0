// Audio processing module
// Handles file ingestion, downmixing and sample rate conversion

pub mod ingest;
pub mod resample;

pub use ingest::{decode_audio, ingest_wav, load_audio, AudioData, AudioError};
pub use resample::{resample_mono, ResampleQuality};
