//! Conversion backends.
//!
//! This module contains the phonetic transcription and speech synthesis
//! adapters.
//!
//! # Available Backends
//!
//! - `espeak` - IPA transcription via the espeak-ng binary (always built)
//! - `gtts` - MP3 synthesis via the Google Translate TTS endpoint
//!   (enable the `gtts` cargo feature)

pub mod espeak;

#[cfg(feature = "gtts")]
pub mod gtts;
