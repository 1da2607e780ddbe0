// Audio-to-MIDI conversion run
// load -> pitch -> segment -> export, traced stage by stage

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::audio::{load_audio, resample_mono};
use crate::config::{Config, Strategy};
use crate::error::ConvertResult;
use crate::midi::export_midi;
use crate::pitch::extractor_for;
use crate::segment::{Melody, Segmenter};
use crate::storage::{calculate_sha256, write_output};

use super::trace::{Stage, Tracer};

/// Outcome of a successful conversion
#[derive(Debug, Clone, Serialize)]
pub struct ConvertSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,

    pub input_path: PathBuf,
    pub input_sha256: String,

    pub output_path: PathBuf,
    pub output_sha256: String,

    pub strategy: Strategy,

    /// Name of the pitch extractor that produced the frames
    pub extractor: String,

    /// Analysis sample rate after resampling
    pub sample_rate: u32,

    /// Input duration in seconds
    pub duration_secs: f64,

    pub frame_count: usize,
    pub voiced_frames: usize,
    pub note_count: usize,

    pub melody: Melody,
}

/// Convert one audio file into a MIDI file
///
/// A recording with no usable pitch is not an error: it produces an empty
/// (but valid) MIDI file and a summary with zero notes.
pub fn convert(
    input: &Path,
    output: &Path,
    config: &Config,
    trace: Option<&Path>,
) -> ConvertResult<ConvertSummary> {
    config.validate()?;

    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    let tracer = Tracer::new(run_id, trace);

    log::info!("Converting {} ({} strategy, run {})", input.display(), config.strategy, run_id);

    // Load
    tracer.start(Stage::Load, format!("Loading {}", input.display()))?;
    let (audio, data) = load_audio(input)?;
    let input_sha256 = calculate_sha256(&data);

    let target_rate = config.audio.target_sample_rate;
    let samples = resample_mono(
        &audio.to_mono(),
        audio.sample_rate,
        target_rate,
        config.audio.resample_quality,
    )?;
    tracer.complete(
        Stage::Load,
        format!(
            "Loaded {:.2}s of audio ({} Hz, {} ch) resampled to {} Hz",
            audio.duration_secs(),
            audio.sample_rate,
            audio.channels,
            target_rate
        ),
        serde_json::json!({
            "source_sample_rate": audio.sample_rate,
            "channels": audio.channels,
            "bit_depth": audio.bit_depth,
            "duration_ms": audio.duration_ms,
            "samples": samples.len(),
            "sha256": input_sha256,
        }),
    )?;

    // Pitch
    let extractor = extractor_for(config)?;
    tracer.start(Stage::Pitch, format!("Extracting pitch with {}", extractor.name()))?;
    let track = extractor.extract(&samples, target_rate)?;
    let voiced_frames = track.voiced_count();
    tracer.complete(
        Stage::Pitch,
        format!("{} frames, {} voiced", track.len(), voiced_frames),
        serde_json::json!({
            "extractor": extractor.name(),
            "frames": track.len(),
            "voiced": voiced_frames,
            "hop_length": track.hop_length,
        }),
    )?;

    // Segment
    let segmenter = Segmenter::new(config.strategy, &config.segment)?;
    tracer.start(Stage::Segment, format!("Segmenting ({})", segmenter.strategy()))?;
    let melody = segmenter.segment(&track.frames);
    if melody.is_empty() {
        log::warn!("No notes detected in {}", input.display());
    } else {
        log::debug!("Notes: {}", melody.note_names().join(" "));
    }
    tracer.complete(
        Stage::Segment,
        format!("{} notes", melody.len()),
        serde_json::json!({
            "notes": melody.len(),
            "end_time": melody.end_time(),
        }),
    )?;

    // Export
    tracer.start(Stage::Export, format!("Writing {}", output.display()))?;
    let bytes = export_midi(&melody, &config.midi)?;
    let output_sha256 = write_output(output, &bytes)?;
    tracer.complete(
        Stage::Export,
        format!("Wrote {} bytes to {}", bytes.len(), output.display()),
        serde_json::json!({
            "bytes": bytes.len(),
            "sha256": output_sha256,
        }),
    )?;

    Ok(ConvertSummary {
        run_id,
        started_at,
        input_path: input.to_path_buf(),
        input_sha256,
        output_path: output.to_path_buf(),
        output_sha256,
        strategy: config.strategy,
        extractor: extractor.name().to_string(),
        sample_rate: target_rate,
        duration_secs: audio.duration_secs(),
        frame_count: track.len(),
        voiced_frames,
        note_count: melody.len(),
        melody,
    })
}
