//! Media pipeline: speech-to-text for uploaded audio.

pub mod stt;

pub use stt::{AssemblyAiTranscriber, Transcriber};
