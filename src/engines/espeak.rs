//! IPA transcription via espeak-ng.
//!
//! Shells out to the espeak-ng binary in `--ipa` mode and captures the
//! transcription from stdout. espeak-ng produces an approximation, in
//! particular for long sentences, which matches the contract of the
//! transcription adapter: a best-effort phonetic spelling, never an error.
//!
//! # System Requirements
//!
//! **espeak-ng** must be installed (or a bundled binary configured through
//! [`EspeakConfig`]):
//! - **Linux**: `sudo apt-get install espeak-ng`
//! - **macOS**: `brew install espeak-ng`
//! - **Windows**: Download installer from <https://espeak-ng.org/download>

use std::borrow::Cow;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::Transcriber;

/// Configuration for locating and invoking espeak-ng.
#[derive(Debug, Clone)]
pub struct EspeakConfig {
    /// Path to the espeak-ng binary. `None` uses `espeak-ng` from PATH.
    pub bin_path: Option<PathBuf>,
    /// Path to an espeak-ng data directory (for bundled installs).
    pub data_path: Option<PathBuf>,
    /// espeak-ng voice to transcribe with (e.g. `"en-us"`, `"en-gb"`).
    pub voice: String,
}

impl Default for EspeakConfig {
    fn default() -> Self {
        Self {
            bin_path: None,
            data_path: None,
            voice: "en-us".to_string(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
enum EspeakError {
    #[error(
        "espeak-ng not found. Install: Linux: `sudo apt-get install espeak-ng`, \
         macOS: `brew install espeak-ng`, Windows: https://espeak-ng.org/download"
    )]
    NotFound,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("espeak-ng exited with code {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },
}

/// Phonetic transcriber backed by the espeak-ng binary.
///
/// # Quick Start
///
/// ```no_run
/// use ipa_tts::engines::espeak::EspeakTranscriber;
/// use ipa_tts::Transcriber;
///
/// let transcriber = EspeakTranscriber::new();
/// let ipa = transcriber.transcribe("Hello, world!");
/// println!("{ipa}");
/// ```
pub struct EspeakTranscriber {
    config: EspeakConfig,
}

impl Default for EspeakTranscriber {
    fn default() -> Self {
        Self::new()
    }
}

impl EspeakTranscriber {
    /// Create a transcriber that uses `espeak-ng` from PATH with the
    /// default American English voice.
    pub fn new() -> Self {
        Self {
            config: EspeakConfig::default(),
        }
    }

    /// Create a transcriber with explicit binary/data paths or voice.
    pub fn with_config(config: EspeakConfig) -> Self {
        Self { config }
    }

    fn run_espeak(&self, input: &str) -> Result<String, EspeakError> {
        let bin: Cow<'_, str> = match &self.config.bin_path {
            Some(path) => path.to_string_lossy(),
            None => Cow::Borrowed("espeak-ng"),
        };

        let mut command = Command::new(bin.as_ref());
        command.args(["--ipa", "--stdin", "-q", "-v", self.config.voice.as_str()]);
        if let Some(data) = &self.config.data_path {
            command.arg(format!("--path={}", data.display()));
        }

        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    EspeakError::NotFound
                } else {
                    EspeakError::Io(e)
                }
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // espeak-ng treats stdin as line-oriented input; without a final
            // line terminator the last token can be under-processed.
            let payload = canonicalize_stdin_payload(input);
            stdin.write_all(payload.as_bytes()).map_err(EspeakError::Io)?;
        }

        let output = child.wait_with_output().map_err(EspeakError::Io)?;

        if !output.status.success() {
            return Err(EspeakError::Failed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Transcriber for EspeakTranscriber {
    fn transcribe(&self, text: &str) -> String {
        match self.run_espeak(text) {
            Ok(raw) => normalize_ipa(&raw),
            Err(e) => {
                log::warn!("IPA transcription failed: {e}");
                format!("(IPA unavailable: {e})")
            }
        }
    }
}

fn canonicalize_stdin_payload(input: &str) -> Cow<'_, str> {
    if input.ends_with('\n') {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(format!("{input}\n"))
    }
}

/// Collapse espeak-ng's line-oriented IPA output into one display string.
///
/// espeak-ng emits one line per input line plus `_` pause markers in some
/// modes; both are normalized away.
fn normalize_ipa(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.chars().filter(|&ch| ch != '_').collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}
