// MIDI Export - Convert melodies to Standard MIDI Files using midly crate
// One tempo track plus one instrument track holding the melody

use midly::{Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::segment::Melody;

/// Errors that can occur while building a MIDI file
#[derive(Debug, Error)]
pub enum MidiError {
    #[error("Note pitch {pitch} is outside the MIDI range 0-127")]
    InvalidNote { pitch: u8 },

    #[error("Invalid MIDI export option: {0}")]
    InvalidOptions(String),

    #[error("Failed to write MIDI: {0}")]
    Write(#[from] std::io::Error),
}

/// MIDI export options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiExportOptions {
    /// Pulses per quarter note (PPQ) - typically 480 or 960
    /// Higher values = better timing resolution
    pub ppq: u16,

    /// Tempo written to the file; note times are converted at this tempo
    pub bpm: f64,

    /// General MIDI program for the instrument track (0 = Acoustic Grand Piano)
    pub program: u8,

    /// Velocity for every note
    pub velocity: u8,

    /// MIDI channel (0-15)
    pub channel: u8,

    /// Include track names
    pub track_names: bool,

    /// Name of the instrument track
    pub instrument_name: String,
}

impl Default for MidiExportOptions {
    fn default() -> Self {
        MidiExportOptions {
            ppq: 480,
            bpm: 120.0,
            program: 0,
            velocity: 100,
            channel: 0,
            track_names: true,
            instrument_name: "MELODY".to_string(),
        }
    }
}

impl MidiExportOptions {
    pub fn validate(&self) -> Result<(), MidiError> {
        if self.ppq == 0 || self.ppq > 0x7FFF {
            return Err(MidiError::InvalidOptions(format!("ppq {} out of range 1-32767", self.ppq)));
        }
        if !(self.bpm > 0.0 && self.bpm.is_finite()) {
            return Err(MidiError::InvalidOptions(format!("bpm {} must be positive", self.bpm)));
        }
        if self.program > 127 {
            return Err(MidiError::InvalidOptions(format!("program {} out of range 0-127", self.program)));
        }
        if self.velocity > 127 {
            return Err(MidiError::InvalidOptions(format!("velocity {} out of range 0-127", self.velocity)));
        }
        if self.channel > 15 {
            return Err(MidiError::InvalidOptions(format!("channel {} out of range 0-15", self.channel)));
        }
        Ok(())
    }
}

/// Export a melody to MIDI file bytes
///
/// Returns the MIDI file as a Vec<u8> ready to be written to disk.
/// An empty melody still yields a valid file with an empty instrument track.
pub fn export_midi(melody: &Melody, options: &MidiExportOptions) -> Result<Vec<u8>, MidiError> {
    options.validate()?;

    let header = Header {
        format: midly::Format::Parallel,
        timing: Timing::Metrical(options.ppq.into()),
    };

    let ticks_per_second = calculate_ticks_per_second(options.bpm, options.ppq);

    // Track 0: tempo metadata
    let mut meta_track = Track::new();
    if options.track_names {
        add_track_name(&mut meta_track, 0, "META");
    }
    add_tempo(&mut meta_track, 0, options.bpm);
    add_end_of_track(&mut meta_track, 0);

    let melody_track = create_melody_track(melody, ticks_per_second, options)?;

    let smf = Smf {
        header,
        tracks: vec![meta_track, melody_track],
    };

    let mut bytes = Vec::new();
    smf.write_std(&mut bytes)?;

    log::debug!(
        "Exported {} notes as {} bytes of MIDI ({} PPQ, {} BPM)",
        melody.len(),
        bytes.len(),
        options.ppq,
        options.bpm
    );

    Ok(bytes)
}

/// Create the instrument track for a melody
fn create_melody_track<'a>(
    melody: &Melody,
    ticks_per_second: f64,
    options: &'a MidiExportOptions,
) -> Result<Track<'a>, MidiError> {
    let mut track = Track::new();
    let channel = options.channel.into();

    if options.track_names {
        add_track_name(&mut track, 0, &options.instrument_name);
    }

    track.push(TrackEvent {
        delta: 0u32.into(),
        kind: TrackEventKind::Midi {
            channel,
            message: MidiMessage::ProgramChange {
                program: options.program.into(),
            },
        },
    });

    // (tick, order, event) - note-offs sort before note-ons on the same tick
    let mut events: Vec<(u32, u8, TrackEventKind)> = Vec::with_capacity(melody.len() * 2);

    for note in melody.iter() {
        if note.pitch > 127 {
            return Err(MidiError::InvalidNote { pitch: note.pitch });
        }

        let tick_on = seconds_to_ticks(note.start, ticks_per_second);
        let tick_off = seconds_to_ticks(note.end, ticks_per_second).max(tick_on + 1);

        events.push((
            tick_on,
            1,
            TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOn {
                    key: note.pitch.into(),
                    vel: options.velocity.into(),
                },
            },
        ));

        events.push((
            tick_off,
            0,
            TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOff {
                    key: note.pitch.into(),
                    vel: 0u8.into(),
                },
            },
        ));
    }

    events.sort_by_key(|(tick, order, _)| (*tick, *order));

    // Convert to delta times
    let mut last_tick = 0;
    for (tick, _, kind) in events {
        track.push(TrackEvent {
            delta: tick.saturating_sub(last_tick).into(),
            kind,
        });
        last_tick = tick;
    }

    add_end_of_track(&mut track, 0);

    Ok(track)
}

/// Ticks per second at a given tempo
fn calculate_ticks_per_second(bpm: f64, ppq: u16) -> f64 {
    ppq as f64 * bpm / 60.0
}

fn seconds_to_ticks(seconds: f64, ticks_per_second: f64) -> u32 {
    (seconds.max(0.0) * ticks_per_second).round() as u32
}

/// Add track name to track
fn add_track_name<'a>(track: &mut Track<'a>, delta: u32, name: &'a str) {
    track.push(TrackEvent {
        delta: delta.into(),
        kind: TrackEventKind::Meta(MetaMessage::TrackName(name.as_bytes())),
    });
}

/// Add tempo meta message
fn add_tempo(track: &mut Track<'_>, delta: u32, bpm: f64) {
    // Microseconds per quarter note, 24-bit
    let us_per_quarter = ((60_000_000.0 / bpm).round() as u32).min(0xFF_FFFF);

    track.push(TrackEvent {
        delta: delta.into(),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(us_per_quarter.into())),
    });
}

/// Add end of track message
fn add_end_of_track(track: &mut Track<'_>, delta: u32) {
    track.push(TrackEvent {
        delta: delta.into(),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
}
