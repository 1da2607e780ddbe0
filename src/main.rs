// hum2midi command line entry point
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use hum2midi_lib::commands::{convert_command, ConvertRequest};
use hum2midi_lib::config::Strategy;

/// Convert a whistled or hummed recording into a MIDI melody
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Input audio file (WAV; MP3 with the symphonia-decode feature)
    input: PathBuf,

    /// Output MIDI file (defaults to the input path with a .mid extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Melody extraction strategy
    #[arg(long, value_enum)]
    strategy: Option<Strategy>,

    /// Voicing probability a frame must exceed to count toward a note
    #[arg(long)]
    confidence_threshold: Option<f32>,

    /// Shortest note kept, in seconds
    #[arg(long)]
    min_note_duration: Option<f64>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Append stage-by-stage progress to this JSONL file
    #[arg(long)]
    trace: Option<PathBuf>,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let json = args.json;

    let request = ConvertRequest {
        input: args.input,
        output: args.output,
        config: args.config,
        strategy: args.strategy,
        confidence_threshold: args.confidence_threshold,
        min_note_duration: args.min_note_duration,
        trace: args.trace,
    };

    match convert_command(request) {
        Ok(summary) => {
            if json {
                match serde_json::to_string_pretty(&summary) {
                    Ok(text) => println!("{}", text),
                    Err(e) => {
                        eprintln!("Error serializing summary: {}", e);
                        return ExitCode::FAILURE;
                    }
                }
            } else {
                println!("MIDI file saved to: {}", summary.output_path.display());
                println!("Detected {} notes", summary.note_count);
            }
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("Error processing audio: {}", error.message());
            eprintln!("Make sure the audio file exists and is in a supported format.");
            ExitCode::FAILURE
        }
    }
}
