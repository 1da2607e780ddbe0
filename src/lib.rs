// hum2midi - Whistle/Hum to MIDI melody converter
// Module declarations

pub mod audio;
pub mod commands;
pub mod config;
pub mod error;
pub mod midi;
pub mod pipeline;
pub mod pitch;
pub mod segment;
pub mod storage;

pub use config::{Config, Strategy};
pub use error::{ConvertError, ConvertResult};
pub use pipeline::{convert, ConvertSummary};
