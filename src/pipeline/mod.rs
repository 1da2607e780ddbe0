// Pipeline execution and monitoring module
// Orchestrates the full audio-to-MIDI conversion

pub mod convert;
pub mod trace;

pub use convert::{convert, ConvertSummary};
pub use trace::{read_trace_file, Stage, TraceEntry, TraceError, TraceWriter, Tracer};
