//! `batchscribe`: batch conversion of local audio/video into transcripts via a
//! remote speech-to-text service.
//!
//! This crate provides:
//! - Media normalization through an external `ffmpeg` process
//! - Duplicate detection over normalized audio (byte-size or content hash)
//! - Blocking transcription/translation dispatch with typed failures
//! - An optional punctuation pass over plain-text transcripts
//!
//! The library is designed to be used by the bundled CLI as well as programmatic
//! batch jobs, with an emphasis on sequential, predictable processing and
//! per-file error recovery: one bad input never aborts a run.

// High-level API (most consumers should start here).
pub mod opts;
pub mod pipeline;

// Configuration loading and validation.
pub mod config;

// Input collection and media normalization.
pub mod normalize;
pub mod scan;

// Duplicate detection over normalized audio.
pub mod dedup;

// Remote service boundaries and their OpenAI-backed implementation.
pub mod client;
pub mod openai;

// Transcript values, response formats, and output serialization.
pub mod output;
pub mod response_format;
pub mod transcript;

// Logging configuration and control.
#[cfg(feature = "logging")]
pub mod logging;

mod error;

pub use error::{Error, Result};
