//! Speech synthesis via the Google Translate TTS endpoint.
//!
//! The endpoint returns MP3 audio for short text fragments and requires an
//! Internet connection. Language codes are free text (e.g. `"en"`,
//! `"en-uk"`, `"en-au"`); an unknown code is rejected by the service.

use std::time::Duration;

use derive_builder::Builder;

use crate::{SpeechAudio, SynthesisError, SynthesisOptions, Synthesizer};

/// Default translate_tts endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://translate.google.com/translate_tts";

/// Maximum number of characters the endpoint accepts per request.
/// Longer input is chunked and the MP3 streams concatenated.
const MAX_CHUNK_CHARS: usize = 200;

/// The endpoint rejects non-browser clients.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/115.0";

/// `ttsspeed` values understood by the endpoint.
const SPEED_NORMAL: &str = "1";
const SPEED_SLOW: &str = "0.3";

/// Configuration for the remote speech endpoint.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct GttsConfig {
    /// Endpoint URL. Override to point at a mirror or a local stub.
    #[builder(default = "DEFAULT_ENDPOINT.to_string()")]
    pub endpoint: String,
    /// Per-request timeout.
    #[builder(default = "Duration::from_secs(30)")]
    pub timeout: Duration,
}

impl Default for GttsConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Speech synthesizer backed by the Google Translate TTS endpoint.
///
/// # Quick Start
///
/// ```no_run
/// use ipa_tts::engines::gtts::GttsSynthesizer;
/// use ipa_tts::{SynthesisOptions, Synthesizer};
///
/// let synthesizer = GttsSynthesizer::new()?;
/// let audio = synthesizer.synthesize("Hello, world!", &SynthesisOptions::default())?;
/// println!("{} MP3 bytes", audio.bytes.len());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct GttsSynthesizer {
    config: GttsConfig,
    client: reqwest::blocking::Client,
}

impl GttsSynthesizer {
    /// Create a synthesizer with the default endpoint and timeout.
    pub fn new() -> Result<Self, SynthesisError> {
        Self::with_config(GttsConfig::default())
    }

    /// Create a synthesizer with custom configuration.
    pub fn with_config(config: GttsConfig) -> Result<Self, SynthesisError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| SynthesisError::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Fetch the MP3 audio for one chunk of text.
    fn fetch_chunk(&self, chunk: &str, opts: &SynthesisOptions) -> Result<Vec<u8>, SynthesisError> {
        let speed = if opts.slow { SPEED_SLOW } else { SPEED_NORMAL };

        log::debug!("Requesting TTS for {} chars (lang={})", chunk.chars().count(), opts.lang);

        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", opts.lang.as_str()),
                ("ttsspeed", speed),
                ("q", chunk),
            ])
            .send()
            .map_err(|e| SynthesisError::Network(e.to_string()))?;

        let status = response.status();

        // The service answers 404 for unknown language codes.
        if status.as_u16() == 404 {
            return Err(SynthesisError::UnsupportedLanguage(opts.lang.clone()));
        }

        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(SynthesisError::RemoteStatus(status.as_u16(), body));
        }

        let bytes = response
            .bytes()
            .map_err(|e| SynthesisError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

impl Synthesizer for GttsSynthesizer {
    fn synthesize(
        &self,
        text: &str,
        opts: &SynthesisOptions,
    ) -> Result<SpeechAudio, SynthesisError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SynthesisError::EmptyText);
        }

        // MP3 frames are self-contained, so the per-chunk streams can be
        // concatenated into one playable file.
        let mut bytes = Vec::new();
        for chunk in split_chunks(text) {
            bytes.extend(self.fetch_chunk(&chunk, opts)?);
        }

        Ok(SpeechAudio { bytes })
    }
}

/// Split text into chunks of at most `MAX_CHUNK_CHARS`, preferring
/// whitespace boundaries so words are never cut in half.
fn split_chunks(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= MAX_CHUNK_CHARS {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + MAX_CHUNK_CHARS).min(chars.len());
        if end == chars.len() {
            push_chunk(&mut chunks, &chars[start..end]);
            break;
        }

        // Last whitespace before the limit, or a hard cut when one word
        // exceeds the limit on its own.
        let split = chars[start..end]
            .iter()
            .rposition(|ch| ch.is_whitespace())
            .map(|i| start + i + 1)
            .unwrap_or(end);

        push_chunk(&mut chunks, &chars[start..split]);
        start = split;
    }

    chunks
}

fn push_chunk(chunks: &mut Vec<String>, chars: &[char]) {
    let chunk: String = chars.iter().collect();
    let chunk = chunk.trim();
    if !chunk.is_empty() {
        chunks.push(chunk.to_string());
    }
}
