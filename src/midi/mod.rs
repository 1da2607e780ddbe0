// MIDI module
// Serializes melodies into Standard MIDI Files

pub mod export;

pub use export::{export_midi, MidiError, MidiExportOptions};
