//! # ipa-tts
//!
//! English IPA transcription and text-to-speech synthesis, with a
//! single-sentence mode and a batch CSV mode that packages its results
//! into a ZIP archive.
//!
//! ## Features
//!
//! - **IPA transcription**: approximate phonetic transcription via espeak-ng
//! - **Speech synthesis**: MP3 audio from the Google Translate TTS endpoint
//! - **Batch processing**: CSV in, ZIP of per-row MP3s + `results.csv` out,
//!   with per-row failure isolation
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! ipa-tts = "0.1"
//! ```
//!
//! ```ignore
//! use ipa_tts::engines::espeak::EspeakTranscriber;
//! use ipa_tts::engines::gtts::GttsSynthesizer;
//! use ipa_tts::{SynthesisOptions, Synthesizer, Transcriber};
//!
//! let transcriber = EspeakTranscriber::new();
//! println!("{}", transcriber.transcribe("Hello, world!"));
//!
//! let synthesizer = GttsSynthesizer::new()?;
//! let audio = synthesizer.synthesize("Hello, world!", &SynthesisOptions::default())?;
//! audio.write_mp3(std::path::Path::new("hello.mp3"))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod archive;
pub mod batch;
pub mod engines;
pub mod sanitize;
pub mod segment;

use std::path::Path;

/// Options applied to a single synthesis request.
#[derive(Debug, Clone)]
pub struct SynthesisOptions {
    /// Language code passed to the speech backend (e.g. `"en"`, `"en-uk"`).
    pub lang: String,
    /// Request a slower speech rate.
    pub slow: bool,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            lang: "en".to_string(),
            slow: false,
        }
    }
}

/// The result of a synthesis (text-to-speech) operation.
///
/// Contains the encoded MP3 byte stream returned by the speech backend.
#[derive(Debug, Clone)]
pub struct SpeechAudio {
    /// Encoded MP3 audio bytes.
    pub bytes: Vec<u8>,
}

impl SpeechAudio {
    /// Write the audio to an MP3 file.
    pub fn write_mp3(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, &self.bytes)
    }

    /// Consume the artifact, returning the raw MP3 bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Errors raised by a speech synthesis backend.
///
/// Payloads are plain strings so the error type stays independent of
/// whichever HTTP stack a backend happens to use.
#[derive(thiserror::Error, Debug)]
pub enum SynthesisError {
    #[error("cannot synthesize empty text")]
    EmptyText,
    #[error("network error: {0}")]
    Network(String),
    #[error("speech service returned HTTP {0}: {1}")]
    RemoteStatus(u16, String),
    #[error("language {0:?} is not supported by the speech service")]
    UnsupportedLanguage(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Phonetic transcription backend.
///
/// `transcribe` is total: on any internal failure it returns a
/// parenthesized diagnostic string instead of raising, so callers never
/// have to branch on a transcription error.
pub trait Transcriber {
    /// Return the approximate IPA transcription of `text`, or a
    /// human-readable diagnostic placeholder on failure.
    fn transcribe(&self, text: &str) -> String;
}

/// Speech synthesis backend.
pub trait Synthesizer {
    /// Synthesize speech audio from the given text.
    fn synthesize(
        &self,
        text: &str,
        opts: &SynthesisOptions,
    ) -> Result<SpeechAudio, SynthesisError>;

    /// Synthesize speech from the given text and write it to an MP3 file.
    ///
    /// Default implementation calls `synthesize()` then
    /// `SpeechAudio::write_mp3()`.
    fn synthesize_to_file(
        &self,
        text: &str,
        mp3_path: &Path,
        opts: &SynthesisOptions,
    ) -> Result<(), SynthesisError> {
        self.synthesize(text, opts)?.write_mp3(mp3_path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::SpeechAudio;

    #[test]
    fn write_mp3_writes_the_raw_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp3");

        let audio = SpeechAudio {
            bytes: vec![0x49, 0x44, 0x33, 0x04, 0x00],
        };
        audio.write_mp3(&path).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), audio.bytes);
    }
}
