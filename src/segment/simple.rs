// Simple note segmentation
// Drops silent frames, collapses repeated notes and lays the survivors out
// back to back with a fixed duration. Detected timing is discarded.

use crate::pitch::{midi_note_number, Frame};
use super::types::{Melody, NoteEvent};

/// Reduce a frame sequence to a sequence of distinct notes
///
/// Silent frames do not reset the previous note, so a note repeated across
/// a gap is emitted once.
pub fn collapse_repeats(frames: &[Frame]) -> Vec<u8> {
    let mut notes = Vec::new();
    let mut previous: Option<u8> = None;

    for midi_note in frames.iter().filter_map(|f| f.frequency).filter_map(midi_note_number) {
        if previous != Some(midi_note) {
            notes.push(midi_note);
            previous = Some(midi_note);
        }
    }

    notes
}

/// Lay notes out back to back from time zero
pub fn layout_fixed(notes: &[u8], note_duration: f64) -> Melody {
    let mut melody = Melody::new();
    let mut start = 0.0;

    for &pitch in notes {
        let end = start + note_duration;
        melody.push(NoteEvent::new(pitch, start, end));
        start = end;
    }

    melody
}

/// Run the whole simple reduction
pub fn segment_frames(frames: &[Frame], note_duration: f64) -> Melody {
    layout_fixed(&collapse_repeats(frames), note_duration)
}
