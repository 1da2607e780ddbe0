// Audio ingestion module
// Reads audio files, extracts metadata, and normalizes audio samples

use hound::{SampleFormat, WavReader};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Failed to read audio file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read WAV file: {0}")]
    WavReadError(#[from] hound::Error),

    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to decode audio: {0}")]
    DecodeError(String),

    #[error("Failed to resample audio: {0}")]
    ResampleError(String),

    #[error("Invalid audio data")]
    InvalidData,
}

#[derive(Debug, Clone)]
pub struct AudioData {
    /// Audio samples normalized to f32 in range [-1.0, 1.0], interleaved
    pub samples: Vec<f32>,

    /// Sample rate in Hz (e.g., 22050, 44100, 48000)
    pub sample_rate: u32,

    /// Number of channels (1 = mono, 2 = stereo)
    pub channels: u16,

    /// Bit depth of original audio (8, 16, 24, 32); 32 for decoded formats
    pub bit_depth: u16,

    /// Duration in milliseconds
    pub duration_ms: i64,

    /// Total number of frames (samples / channels)
    pub frame_count: usize,
}

impl AudioData {
    /// Build from interleaved samples, deriving frame count and duration
    pub fn from_interleaved(
        samples: Vec<f32>,
        sample_rate: u32,
        channels: u16,
        bit_depth: u16,
    ) -> Result<Self, AudioError> {
        if channels == 0 || sample_rate == 0 {
            return Err(AudioError::InvalidData);
        }

        let frame_count = samples.len() / channels as usize;
        let duration_secs = frame_count as f64 / sample_rate as f64;

        Ok(AudioData {
            samples,
            sample_rate,
            channels,
            bit_depth,
            duration_ms: (duration_secs * 1000.0) as i64,
            frame_count,
        })
    }

    /// Get duration in seconds as f64
    pub fn duration_secs(&self) -> f64 {
        self.duration_ms as f64 / 1000.0
    }

    /// Convert to mono by averaging channels
    pub fn to_mono(&self) -> Vec<f32> {
        if self.channels == 1 {
            return self.samples.clone();
        }

        let channels = self.channels as usize;
        self.samples
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    }
}

/// Load an audio file from disk
///
/// RIFF/WAV input is read with hound; anything else goes through symphonia
/// when the `symphonia-decode` feature is enabled. The raw file bytes are
/// returned alongside the decoded audio so callers can hash the input.
pub fn load_audio(path: &Path) -> Result<(AudioData, Vec<u8>), AudioError> {
    let data = std::fs::read(path).map_err(|source| AudioError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let audio = decode_audio(&data)?;

    log::info!(
        "Loaded {}: {} Hz, {} channels, {} bit, {} ms",
        path.display(),
        audio.sample_rate,
        audio.channels,
        audio.bit_depth,
        audio.duration_ms
    );

    Ok((audio, data))
}

/// Decode audio from raw bytes
pub fn decode_audio(data: &[u8]) -> Result<AudioData, AudioError> {
    if data.len() >= 4 && &data[0..4] == b"RIFF" {
        return ingest_wav(data);
    }

    #[cfg(feature = "symphonia-decode")]
    {
        decode_symphonia(data)
    }

    #[cfg(not(feature = "symphonia-decode"))]
    {
        Err(AudioError::UnsupportedFormat(
            "not a WAV file (build with the symphonia-decode feature for MP3/FLAC/OGG)".to_string(),
        ))
    }
}

/// Ingest a WAV file from raw bytes
/// Returns AudioData with normalized samples and metadata
pub fn ingest_wav(data: &[u8]) -> Result<AudioData, AudioError> {
    let cursor = Cursor::new(data);
    let mut reader = WavReader::new(cursor)?;

    let spec = reader.spec();
    let sample_rate = spec.sample_rate;
    let channels = spec.channels;
    let bit_depth = spec.bits_per_sample;
    let sample_format = spec.sample_format;

    // Read and normalize samples to f32 [-1.0, 1.0]
    let samples: Vec<f32> = match (sample_format, bit_depth) {
        (SampleFormat::Int, 8) => {
            // hound yields 8-bit PCM already shifted to signed [-128, 127]
            reader
                .samples::<i8>()
                .collect::<Result<Vec<_>, _>>()?
                .into_iter()
                .map(|s| s as f32 / 128.0)
                .collect()
        }
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|s| s as f32 / 32768.0)
            .collect(),
        (SampleFormat::Int, 24) => reader
            .samples::<i32>()
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|s| s as f32 / 8388608.0)
            .collect(),
        (SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|s| s as f32 / 2147483648.0)
            .collect(),
        (SampleFormat::Float, 32) => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
        _ => {
            return Err(AudioError::UnsupportedFormat(format!(
                "{:?} {}-bit audio",
                sample_format, bit_depth
            )));
        }
    };

    AudioData::from_interleaved(samples, sample_rate, channels, bit_depth)
}

/// Decode compressed audio (MP3, FLAC, OGG, ...) with symphonia
#[cfg(feature = "symphonia-decode")]
fn decode_symphonia(data: &[u8]) -> Result<AudioData, AudioError> {
    use symphonia::core::audio::SampleBuffer;
    use symphonia::core::codecs::DecoderOptions;
    use symphonia::core::errors::Error as SymphoniaError;
    use symphonia::core::formats::FormatOptions;
    use symphonia::core::io::MediaSourceStream;
    use symphonia::core::meta::MetadataOptions;
    use symphonia::core::probe::Hint;

    let cursor = Cursor::new(data.to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let probed = symphonia::default::get_probe()
        .format(&Hint::new(), mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| AudioError::UnsupportedFormat(e.to_string()))?;

    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| AudioError::DecodeError("no audio track found".to_string()))?;

    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| AudioError::DecodeError("unknown sample rate".to_string()))?;
    let mut channels = track.codec_params.channels.map(|c| c.count() as u16);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| AudioError::UnsupportedFormat(e.to_string()))?;

    let track_id = track.id;
    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(AudioError::DecodeError(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            // Corrupt frames are skipped
            Err(SymphoniaError::DecodeError(e)) => {
                log::warn!("Skipping undecodable packet: {}", e);
                continue;
            }
            Err(e) => return Err(AudioError::DecodeError(e.to_string())),
        };

        let spec = *decoded.spec();
        channels.get_or_insert(spec.channels.count() as u16);

        let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buffer.copy_interleaved_ref(decoded);
        samples.extend_from_slice(buffer.samples());
    }

    AudioData::from_interleaved(samples, sample_rate, channels.unwrap_or(1), 32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_bytes(spec: hound::WavSpec, write: impl FnOnce(&mut hound::WavWriter<Cursor<&mut Vec<u8>>>)) -> Vec<u8> {
        let mut bytes = Vec::new();
        {
            let mut writer = hound::WavWriter::new(Cursor::new(&mut bytes), spec).unwrap();
            write(&mut writer);
            writer.finalize().unwrap();
        }
        bytes
    }

    #[test]
    fn test_audio_data_to_mono() {
        // Create stereo audio: [L, R, L, R, L, R]
        let stereo = vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6];
        let audio_data = AudioData::from_interleaved(stereo, 44100, 2, 16).unwrap();

        let mono = audio_data.to_mono();

        assert_eq!(mono.len(), 3);
        assert!((mono[0] - 0.15).abs() < 1e-6); // (0.1 + 0.2) / 2
        assert!((mono[1] - 0.35).abs() < 1e-6); // (0.3 + 0.4) / 2
        assert!((mono[2] - 0.55).abs() < 1e-6); // (0.5 + 0.6) / 2
    }

    #[test]
    fn test_audio_data_duration_secs() {
        let audio_data = AudioData::from_interleaved(vec![0.0; 22050 * 5], 22050, 1, 16).unwrap();
        assert_eq!(audio_data.frame_count, 22050 * 5);
        assert_eq!(audio_data.duration_secs(), 5.0);
    }

    #[test]
    fn test_from_interleaved_rejects_zero_channels() {
        assert!(matches!(
            AudioData::from_interleaved(vec![0.0], 44100, 0, 16),
            Err(AudioError::InvalidData)
        ));
    }

    #[test]
    fn test_ingest_16_bit_wav() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let bytes = wav_bytes(spec, |writer| {
            for s in [0i16, 16384, -32768, 32767] {
                writer.write_sample(s).unwrap();
            }
        });

        let audio = ingest_wav(&bytes).unwrap();
        assert_eq!(audio.sample_rate, 22050);
        assert_eq!(audio.channels, 1);
        assert_eq!(audio.bit_depth, 16);
        assert_eq!(audio.frame_count, 4);
        assert_eq!(audio.samples[0], 0.0);
        assert_eq!(audio.samples[1], 0.5);
        assert_eq!(audio.samples[2], -1.0);
    }

    #[test]
    fn test_ingest_float_stereo_wav() {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 48000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let bytes = wav_bytes(spec, |writer| {
            for s in [0.25f32, -0.25, 0.5, 0.5] {
                writer.write_sample(s).unwrap();
            }
        });

        let audio = decode_audio(&bytes).unwrap();
        assert_eq!(audio.channels, 2);
        assert_eq!(audio.frame_count, 2);
        assert_eq!(audio.to_mono(), vec![0.0, 0.5]);
    }

    #[test]
    fn test_ingest_8_bit_wav() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 8,
            sample_format: hound::SampleFormat::Int,
        };
        let bytes = wav_bytes(spec, |writer| {
            for s in [0i8, 64, -128] {
                writer.write_sample(s).unwrap();
            }
        });

        let audio = ingest_wav(&bytes).unwrap();
        assert_eq!(audio.samples, vec![0.0, 0.5, -1.0]);
    }

    #[test]
    fn test_rejects_garbage() {
        let result = decode_audio(b"RIFF not really a wav file");
        assert!(matches!(result, Err(AudioError::WavReadError(_))));
    }

    #[cfg(not(feature = "symphonia-decode"))]
    #[test]
    fn test_non_wav_needs_decoder_feature() {
        let result = decode_audio(b"ID3\x04 fake mp3 header");
        assert!(matches!(result, Err(AudioError::UnsupportedFormat(_))));
    }

    #[cfg(feature = "symphonia-decode")]
    #[test]
    fn test_symphonia_decodes_container() {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let bytes = wav_bytes(spec, |writer| {
            for _ in 0..1000 {
                writer.write_sample(16384i16).unwrap();
                writer.write_sample(-16384i16).unwrap();
            }
        });

        let audio = decode_symphonia(&bytes).unwrap();
        assert_eq!(audio.sample_rate, 44100);
        assert_eq!(audio.channels, 2);
        assert_eq!(audio.frame_count, 1000);
        assert!((audio.samples[0] - 0.5).abs() < 1e-3);
        assert!((audio.samples[1] + 0.5).abs() < 1e-3);
    }

    #[cfg(feature = "symphonia-decode")]
    #[test]
    fn test_non_wav_goes_through_symphonia() {
        let result = decode_audio(b"definitely not an audio stream");
        assert!(matches!(result, Err(AudioError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_load_audio_returns_bytes() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("tone.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let bytes = wav_bytes(spec, |writer| {
            for s in [0i16, 100, -100] {
                writer.write_sample(s).unwrap();
            }
        });
        std::fs::write(&path, &bytes).unwrap();

        let (audio, data) = load_audio(&path).unwrap();
        assert_eq!(data, bytes);
        assert_eq!(audio.frame_count, 3);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_audio(Path::new("/definitely/not/here.wav"));
        assert!(matches!(result, Err(AudioError::Io { .. })));
    }
}
