// End-to-end conversion of synthesized whistles
use std::f32::consts::PI;
use std::path::Path;

use hum2midi_lib::pipeline::read_trace_file;
use hum2midi_lib::{convert, Config, Strategy};
use midly::{MidiMessage, Smf, TrackEventKind};
use tempfile::TempDir;

const SAMPLE_RATE: u32 = 44100;

/// (frequency in Hz or 0 for silence, seconds)
fn synthesize(segments: &[(f32, f32)]) -> Vec<f32> {
    let mut samples = Vec::new();
    let mut phase = 0.0f32;
    let fade = (0.01 * SAMPLE_RATE as f32) as usize;

    for &(freq, seconds) in segments {
        let n = (seconds * SAMPLE_RATE as f32) as usize;
        for i in 0..n {
            if freq <= 0.0 {
                samples.push(0.0);
                continue;
            }
            let envelope = (i.min(n - 1 - i) as f32 / fade as f32).min(1.0);
            phase += 2.0 * PI * freq / SAMPLE_RATE as f32;
            samples.push(0.4 * envelope * phase.sin());
        }
    }

    samples
}

fn write_wav(path: &Path, samples: &[f32]) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &s in samples {
        writer.write_sample((s * 32767.0) as i16).unwrap();
    }
    writer.finalize().unwrap();
}

fn note_ons(bytes: &[u8]) -> Vec<u8> {
    let smf = Smf::parse(bytes).unwrap();
    smf.tracks
        .iter()
        .flatten()
        .filter_map(|event| match &event.kind {
            TrackEventKind::Midi {
                message: MidiMessage::NoteOn { key, vel },
                ..
            } if u8::from(*vel) > 0 => Some(u8::from(*key)),
            _ => None,
        })
        .collect()
}

fn c_d_e() -> Vec<f32> {
    // C5, D5, E5 separated by short rests
    synthesize(&[
        (0.0, 0.1),
        (523.25, 0.4),
        (0.0, 0.15),
        (587.33, 0.4),
        (0.0, 0.15),
        (659.26, 0.4),
        (0.0, 0.1),
    ])
}

#[test]
fn test_confidence_strategy_recovers_melody() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("whistle.wav");
    let output = temp_dir.path().join("whistle.mid");
    let trace = temp_dir.path().join("trace.jsonl");
    write_wav(&input, &c_d_e());

    let summary = convert(&input, &output, &Config::default(), Some(&trace)).unwrap();

    let pitches: Vec<u8> = summary.melody.iter().map(|n| n.pitch).collect();
    assert_eq!(pitches, vec![72, 74, 76]);

    // Detected timing follows the recording
    let expected_starts = [0.1, 0.65, 1.2];
    for (note, expected) in summary.melody.iter().zip(expected_starts) {
        assert!((note.start - expected).abs() < 0.08, "start {} vs {}", note.start, expected);
        assert!(note.duration() >= 0.1);
        assert!(note.duration() < 0.5);
    }

    assert_eq!(summary.sample_rate, 22050);
    assert_eq!(note_ons(&std::fs::read(&output).unwrap()), vec![72, 74, 76]);

    let entries = read_trace_file(&trace).unwrap();
    assert_eq!(entries.len(), 8);
}

#[test]
fn test_simple_strategy_uses_fixed_layout() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("whistle.wav");
    let output = temp_dir.path().join("whistle.mid");
    write_wav(&input, &c_d_e());

    let config = Config {
        strategy: Strategy::Simple,
        ..Default::default()
    };
    let summary = convert(&input, &output, &config, None).unwrap();

    assert_eq!(summary.extractor, "piptrack");
    let pitches: Vec<u8> = summary.melody.iter().map(|n| n.pitch).collect();
    assert_eq!(pitches, vec![72, 74, 76]);
    assert_eq!(summary.melody.notes()[0].start, 0.0);
    assert!((summary.melody.end_time() - 1.2).abs() < 1e-9);
}

#[test]
fn test_vibrato_stays_one_note() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("vibrato.wav");
    let output = temp_dir.path().join("vibrato.mid");

    // A5 with a 5 Hz, +-20 cent vibrato
    let n = SAMPLE_RATE as usize;
    let mut phase = 0.0f32;
    let samples: Vec<f32> = (0..n)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            let cents = 20.0 * (2.0 * PI * 5.0 * t).sin();
            let freq = 880.0 * 2.0f32.powf(cents / 1200.0);
            phase += 2.0 * PI * freq / SAMPLE_RATE as f32;
            0.4 * phase.sin()
        })
        .collect();
    write_wav(&input, &samples);

    let summary = convert(&input, &output, &Config::default(), None).unwrap();
    let pitches: Vec<u8> = summary.melody.iter().map(|n| n.pitch).collect();
    assert_eq!(pitches, vec![81]);
}

#[test]
fn test_repeated_runs_are_identical() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("whistle.wav");
    write_wav(&input, &c_d_e());

    let first = convert(&input, &temp_dir.path().join("a.mid"), &Config::default(), None).unwrap();
    let second = convert(&input, &temp_dir.path().join("b.mid"), &Config::default(), None).unwrap();

    assert_eq!(first.melody, second.melody);
    assert_eq!(first.output_sha256, second.output_sha256);
    assert_ne!(first.run_id, second.run_id);
}
