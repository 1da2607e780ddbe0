// Note segmentation types
// Note events and the melody they form

use serde::{Deserialize, Serialize};

use crate::pitch::note_name;

/// A finalized melodic note
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// MIDI note number (0-127)
    pub pitch: u8,

    /// Onset in seconds
    pub start: f64,

    /// Release in seconds, always after `start`
    pub end: f64,
}

impl NoteEvent {
    pub fn new(pitch: u8, start: f64, end: f64) -> Self {
        NoteEvent { pitch, start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Scientific pitch name, e.g. "A3"
    pub fn name(&self) -> String {
        note_name(self.pitch)
    }
}

/// Time-ordered, non-overlapping sequence of note events
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Melody {
    notes: Vec<NoteEvent>,
}

impl Melody {
    pub fn new() -> Self {
        Melody { notes: Vec::new() }
    }

    /// Append a note; notes arrive in time order
    pub fn push(&mut self, note: NoteEvent) {
        debug_assert!(
            self.notes.last().map_or(true, |last| note.start >= last.end),
            "notes must not overlap"
        );
        self.notes.push(note);
    }

    pub fn notes(&self) -> &[NoteEvent] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NoteEvent> {
        self.notes.iter()
    }

    /// End time of the last note, 0.0 for an empty melody
    pub fn end_time(&self) -> f64 {
        self.notes.last().map(|n| n.end).unwrap_or(0.0)
    }

    /// Note names in order, e.g. ["A3", "C4"]
    pub fn note_names(&self) -> Vec<String> {
        self.notes.iter().map(|n| n.name()).collect()
    }
}

impl From<Vec<NoteEvent>> for Melody {
    fn from(notes: Vec<NoteEvent>) -> Self {
        let mut melody = Melody::new();
        for note in notes {
            melody.push(note);
        }
        melody
    }
}

impl<'a> IntoIterator for &'a Melody {
    type Item = &'a NoteEvent;
    type IntoIter = std::slice::Iter<'a, NoteEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.notes.iter()
    }
}
