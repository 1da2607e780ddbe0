// Confidence-gated note segmentation
// Single-pass state machine turning a pitch/confidence frame stream into
// bounded note events with onset and release times

use crate::pitch::{midi_note_number, Frame};
use super::types::{Melody, NoteEvent};

/// The note currently being held
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeldNote {
    pub pitch: u8,
    pub start: f64,
}

/// Segmenter parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceParams {
    /// A frame qualifies only when its confidence exceeds this value
    pub confidence_threshold: f32,

    /// Shortest note that is emitted, in seconds
    pub min_note_duration: f64,
}

impl Default for ConfidenceParams {
    fn default() -> Self {
        ConfidenceParams {
            confidence_threshold: 0.6,
            min_note_duration: 0.1,
        }
    }
}

/// Segmenter state between frames
///
/// `held` is `None` between notes. The state is advanced one frame at a time
/// by [`SegmenterState::step`] and closed by [`SegmenterState::finish`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmenterState {
    pub held: Option<HeldNote>,
}

impl SegmenterState {
    pub fn new() -> Self {
        SegmenterState { held: None }
    }

    /// Advance by one frame, returning a note if this frame closed one
    pub fn step(&mut self, frame: &Frame, params: &ConfidenceParams) -> Option<NoteEvent> {
        match qualifying_pitch(frame, params) {
            Some(midi_note) => match self.held {
                None => {
                    self.held = Some(HeldNote {
                        pitch: midi_note,
                        start: frame.time,
                    });
                    None
                }
                Some(held) if (midi_note as f32 - held.pitch as f32).abs() > 0.5 => {
                    self.held = Some(HeldNote {
                        pitch: midi_note,
                        start: frame.time,
                    });
                    close(held, frame.time, params)
                }
                Some(_) => None,
            },
            None => self.held.take().and_then(|held| close(held, frame.time, params)),
        }
    }

    /// Close any held note at end of stream
    ///
    /// `last_time` is the timestamp of the final frame; without one the note
    /// is closed at exactly the minimum duration.
    pub fn finish(self, last_time: Option<f64>, params: &ConfidenceParams) -> Option<NoteEvent> {
        self.held.and_then(|held| {
            let end = last_time.unwrap_or(held.start + params.min_note_duration);
            close(held, end, params)
        })
    }
}

/// MIDI note for a frame that passes voicing, confidence and pitch checks
fn qualifying_pitch(frame: &Frame, params: &ConfidenceParams) -> Option<u8> {
    if !frame.voiced || frame.confidence <= params.confidence_threshold {
        return None;
    }
    frame.frequency.and_then(midi_note_number)
}

/// Finalize a held note if it lasted long enough
fn close(held: HeldNote, end: f64, params: &ConfidenceParams) -> Option<NoteEvent> {
    if end - held.start >= params.min_note_duration {
        Some(NoteEvent::new(held.pitch, held.start, end))
    } else {
        None
    }
}

/// Run the state machine over a whole frame sequence
pub fn segment_frames(frames: &[Frame], params: &ConfidenceParams) -> Melody {
    let mut state = SegmenterState::new();
    let mut melody = Melody::new();

    for frame in frames {
        if let Some(note) = state.step(frame, params) {
            melody.push(note);
        }
    }

    if let Some(note) = state.finish(frames.last().map(|f| f.time), params) {
        melody.push(note);
    }

    melody
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ConfidenceParams {
        ConfidenceParams::default()
    }

    #[test]
    fn test_single_note_closed_by_unvoiced_frame() {
        let frames = vec![
            Frame::voiced(0.0, 220.0, 0.9),
            Frame::voiced(0.1, 220.0, 0.9),
            Frame::unvoiced(0.2, 0.1),
        ];

        let melody = segment_frames(&frames, &params());
        assert_eq!(melody.notes(), &[NoteEvent::new(57, 0.0, 0.2)]);
    }

    #[test]
    fn test_low_confidence_closes_note() {
        let frames = vec![
            Frame::voiced(0.0, 220.0, 0.9),
            Frame::voiced(0.1, 220.0, 0.3),
            Frame::unvoiced(0.2, 0.1),
        ];

        let melody = segment_frames(&frames, &params());
        assert_eq!(melody.notes(), &[NoteEvent::new(57, 0.0, 0.1)]);
    }

    #[test]
    fn test_low_confidence_before_min_duration_drops_note() {
        let frames = vec![
            Frame::voiced(0.0, 220.0, 0.9),
            Frame::voiced(0.05, 220.0, 0.3),
            Frame::unvoiced(0.2, 0.1),
        ];

        let melody = segment_frames(&frames, &params());
        assert!(melody.is_empty());
    }

    #[test]
    fn test_confidence_must_exceed_threshold() {
        let frames = vec![
            Frame::voiced(0.0, 220.0, 0.6),
            Frame::voiced(0.1, 220.0, 0.6),
            Frame::voiced(0.2, 220.0, 0.6),
        ];

        assert!(segment_frames(&frames, &params()).is_empty());
    }

    #[test]
    fn test_short_span_yields_nothing() {
        let frames = vec![
            Frame::voiced(0.0, 440.0, 0.95),
            Frame::voiced(0.03, 440.0, 0.95),
            Frame::voiced(0.06, 440.0, 0.95),
        ];

        assert!(segment_frames(&frames, &params()).is_empty());
    }

    #[test]
    fn test_note_held_to_end_of_stream() {
        let frames = vec![
            Frame::voiced(0.0, 440.0, 0.95),
            Frame::voiced(0.1, 440.0, 0.95),
            Frame::voiced(0.25, 440.0, 0.95),
        ];

        let melody = segment_frames(&frames, &params());
        assert_eq!(melody.notes(), &[NoteEvent::new(69, 0.0, 0.25)]);
    }

    #[test]
    fn test_pitch_change_splits_notes() {
        let frames = vec![
            Frame::voiced(0.0, 261.63, 0.9), // C4
            Frame::voiced(0.1, 261.63, 0.9),
            Frame::voiced(0.2, 293.66, 0.9), // D4
            Frame::voiced(0.3, 293.66, 0.9),
            Frame::unvoiced(0.4, 0.0),
        ];

        let melody = segment_frames(&frames, &params());
        assert_eq!(
            melody.notes(),
            &[NoteEvent::new(60, 0.0, 0.2), NoteEvent::new(62, 0.2, 0.4)]
        );
    }

    #[test]
    fn test_short_note_between_changes_is_dropped() {
        let frames = vec![
            Frame::voiced(0.0, 261.63, 0.9),  // C4
            Frame::voiced(0.2, 293.66, 0.9),  // D4, lasts 0.05 s
            Frame::voiced(0.25, 329.63, 0.9), // E4
            Frame::voiced(0.4, 329.63, 0.9),
        ];

        let melody = segment_frames(&frames, &params());
        assert_eq!(
            melody.notes(),
            &[NoteEvent::new(60, 0.0, 0.2), NoteEvent::new(64, 0.25, 0.4)]
        );
    }

    #[test]
    fn test_sub_semitone_jitter_keeps_one_note() {
        // All of these round to MIDI 57
        let jitter = [220.0, 224.0, 216.5, 225.5, 214.0, 220.5];
        let frames: Vec<Frame> = jitter
            .iter()
            .enumerate()
            .map(|(i, &hz)| Frame::voiced(i as f64 * 0.05, hz, 0.9))
            .collect();

        let melody = segment_frames(&frames, &params());
        assert_eq!(melody.len(), 1);
        assert_eq!(melody.notes()[0].pitch, 57);
        assert_eq!(melody.notes()[0].start, 0.0);
        assert_eq!(melody.notes()[0].end, 0.25);
    }

    #[test]
    fn test_unvoiced_flag_overrides_frequency() {
        let frames = vec![
            Frame::voiced(0.0, 220.0, 0.9),
            Frame {
                time: 0.2,
                frequency: Some(220.0),
                voiced: false,
                confidence: 0.9,
            },
            Frame::voiced(0.3, 220.0, 0.9),
            Frame::voiced(0.5, 220.0, 0.9),
        ];

        let melody = segment_frames(&frames, &params());
        assert_eq!(
            melody.notes(),
            &[NoteEvent::new(57, 0.0, 0.2), NoteEvent::new(57, 0.3, 0.5)]
        );
    }

    #[test]
    fn test_voiced_without_frequency_is_boundary() {
        let frames = vec![
            Frame::voiced(0.0, 220.0, 0.9),
            Frame {
                time: 0.2,
                frequency: None,
                voiced: true,
                confidence: 0.9,
            },
        ];

        let melody = segment_frames(&frames, &params());
        assert_eq!(melody.notes(), &[NoteEvent::new(57, 0.0, 0.2)]);
    }

    #[test]
    fn test_out_of_range_pitch_is_boundary() {
        let frames = vec![
            Frame::voiced(0.0, 220.0, 0.9),
            Frame::voiced(0.2, 30000.0, 0.9),
            Frame::voiced(0.3, 220.0, 0.9),
        ];

        let melody = segment_frames(&frames, &params());
        assert_eq!(melody.notes(), &[NoteEvent::new(57, 0.0, 0.2)]);
    }

    #[test]
    fn test_no_frames() {
        assert!(segment_frames(&[], &params()).is_empty());
    }

    #[test]
    fn test_finish_without_frames_uses_min_duration() {
        let state = SegmenterState {
            held: Some(HeldNote {
                pitch: 60,
                start: 1.0,
            }),
        };

        let note = state.finish(None, &params()).unwrap();
        assert_eq!(note.pitch, 60);
        assert_eq!(note.start, 1.0);
        assert!((note.end - 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_step_transitions() {
        let p = params();
        let mut state = SegmenterState::new();

        assert_eq!(state.step(&Frame::voiced(0.0, 440.0, 0.9), &p), None);
        assert_eq!(
            state.held,
            Some(HeldNote {
                pitch: 69,
                start: 0.0
            })
        );

        assert_eq!(state.step(&Frame::voiced(0.1, 441.0, 0.9), &p), None);
        assert_eq!(state.held.map(|h| h.start), Some(0.0));

        let closed = state.step(&Frame::unvoiced(0.3, 0.0), &p);
        assert_eq!(closed, Some(NoteEvent::new(69, 0.0, 0.3)));
        assert_eq!(state, SegmenterState::new());
    }

    #[test]
    fn test_segmentation_is_repeatable() {
        let frames: Vec<Frame> = (0..40)
            .map(|i| {
                let t = i as f64 * 0.023;
                if i % 13 == 12 {
                    Frame::unvoiced(t, 0.2)
                } else {
                    Frame::voiced(t, 220.0 * (1.0 + (i / 7) as f32 * 0.06), 0.85)
                }
            })
            .collect();

        let first = segment_frames(&frames, &params());
        let second = segment_frames(&frames, &params());
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }
}
