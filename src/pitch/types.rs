// Pitch tracking types
// Frames, pitch tracks, peak matrices and pitch/MIDI conversions

use serde::{Deserialize, Serialize};

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// One analysis instant produced by a pitch extractor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Frame centre in seconds from start of audio
    pub time: f64,

    /// Fundamental frequency estimate in Hz
    /// `None` when the extractor has no defined pitch for this frame
    pub frequency: Option<f32>,

    /// Extractor judged this frame to contain pitched content
    pub voiced: bool,

    /// Voicing probability [0.0, 1.0]
    pub confidence: f32,
}

impl Frame {
    /// Create a voiced frame
    pub fn voiced(time: f64, frequency: f32, confidence: f32) -> Self {
        Frame {
            time,
            frequency: Some(frequency),
            voiced: true,
            confidence,
        }
    }

    /// Create an unvoiced frame with no defined pitch
    pub fn unvoiced(time: f64, confidence: f32) -> Self {
        Frame {
            time,
            frequency: None,
            voiced: false,
            confidence,
        }
    }
}

/// Output of a pitch extractor: a frame sequence with fixed hop spacing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PitchTrack {
    pub frames: Vec<Frame>,

    /// Hop size in samples between successive frames
    pub hop_length: usize,

    /// Sample rate of the analysed signal
    pub sample_rate: u32,
}

impl PitchTrack {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Number of frames flagged as voiced
    pub fn voiced_count(&self) -> usize {
        self.frames.iter().filter(|f| f.voiced).count()
    }

    /// Frame timestamps in seconds
    pub fn times(&self) -> Vec<f64> {
        self.frames.iter().map(|f| f.time).collect()
    }
}

/// Candidate frequencies and magnitudes laid out as (bin x frame)
///
/// Cells that are not spectral peaks hold 0.0 in both matrices.
#[derive(Debug, Clone)]
pub struct PeakMatrix {
    /// `pitches[bin][frame]` in Hz
    pub pitches: Vec<Vec<f32>>,

    /// `magnitudes[bin][frame]`, same shape as `pitches`
    pub magnitudes: Vec<Vec<f32>>,

    pub hop_length: usize,
    pub sample_rate: u32,
}

impl PeakMatrix {
    pub fn n_bins(&self) -> usize {
        self.pitches.len()
    }

    pub fn n_frames(&self) -> usize {
        self.pitches.first().map(|row| row.len()).unwrap_or(0)
    }

    /// Collapse to one pitch per frame: the frequency of the bin with the
    /// largest magnitude. Frames without a positive pitch map to 0.0.
    pub fn dominant_pitches(&self) -> Vec<f32> {
        (0..self.n_frames())
            .map(|frame| {
                let mut best_bin = 0;
                let mut best_mag = f32::NEG_INFINITY;
                for (bin, row) in self.magnitudes.iter().enumerate() {
                    if row[frame] > best_mag {
                        best_mag = row[frame];
                        best_bin = bin;
                    }
                }

                let pitch = self
                    .pitches
                    .get(best_bin)
                    .map(|row| row[frame])
                    .unwrap_or(0.0);
                if pitch > 0.0 {
                    pitch
                } else {
                    0.0
                }
            })
            .collect()
    }

    /// Convert the dominant pitch per frame into a frame sequence
    /// Zero pitches become unvoiced frames
    pub fn to_track(&self) -> PitchTrack {
        let frames = self
            .dominant_pitches()
            .into_iter()
            .enumerate()
            .map(|(i, pitch)| {
                let time = frames_to_time(i, self.hop_length, self.sample_rate);
                if pitch > 0.0 {
                    Frame::voiced(time, pitch, 1.0)
                } else {
                    Frame::unvoiced(time, 0.0)
                }
            })
            .collect();

        PitchTrack {
            frames,
            hop_length: self.hop_length,
            sample_rate: self.sample_rate,
        }
    }
}

/// Convert a frame index to its timestamp in seconds
pub fn frames_to_time(frame: usize, hop_length: usize, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    (frame * hop_length) as f64 / sample_rate as f64
}

/// Convert a frequency in Hz to a (fractional) MIDI note number
pub fn hz_to_midi(hz: f32) -> f32 {
    12.0 * (hz.log2() - 440.0f32.log2()) + 69.0
}

/// Nearest MIDI note number for a frequency
/// `None` when the frequency is not positive or rounds outside 0-127
pub fn midi_note_number(hz: f32) -> Option<u8> {
    if !(hz > 0.0) {
        return None;
    }
    let midi = hz_to_midi(hz).round();
    if (0.0..=127.0).contains(&midi) {
        Some(midi as u8)
    } else {
        None
    }
}

/// Convert a MIDI note number to its frequency in Hz
pub fn midi_to_hz(midi: f32) -> f32 {
    440.0 * 2.0f32.powf((midi - 69.0) / 12.0)
}

/// Scientific pitch name for a MIDI note (57 -> "A3")
pub fn note_name(midi_note: u8) -> String {
    let octave = midi_note as i32 / 12 - 1;
    format!("{}{}", NOTE_NAMES[(midi_note % 12) as usize], octave)
}

/// Parse a note name such as "C4", "F#3" or "Bb5" into Hz
pub fn note_to_hz(name: &str) -> Option<f32> {
    let name = name.trim();
    let mut chars = name.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    let base = match letter {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };

    let rest: &str = chars.as_str();
    let (accidental, octave_str) = match rest.chars().next() {
        Some('#') => (1, &rest[1..]),
        Some('b') => (-1, &rest[1..]),
        _ => (0, rest),
    };

    let octave: i32 = octave_str.parse().ok()?;
    let midi = (octave + 1) * 12 + base + accidental;
    Some(midi_to_hz(midi as f32))
}
