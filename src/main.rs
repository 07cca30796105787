//! Command-line interface for IPA transcription and text-to-speech.
//!
//! `single` steps through the sentences of a text block, printing the IPA
//! transcription and saving MP3 audio for each; `batch` processes a CSV
//! with a `text` column into a ZIP of MP3s plus `results.csv`.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use ipa_tts::batch::{process_batch, RowOutcome};
use ipa_tts::engines::espeak::EspeakTranscriber;
use ipa_tts::engines::gtts::GttsSynthesizer;
use ipa_tts::sanitize::{sanitize, DEFAULT_MAX_LEN};
use ipa_tts::segment::{segment, SentenceCursor};
use ipa_tts::{SynthesisOptions, Synthesizer, Transcriber};

#[derive(Parser)]
#[command(author, version, about = "English IPA transcription and text-to-speech", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transcribe and synthesize sentences from a block of text
    Single {
        /// Text block; split into sentences on '.'
        text: String,

        /// Language code for the speech backend (e.g. en, en-uk, en-au)
        #[arg(long, default_value = "en")]
        lang: String,

        /// Request a slower speech rate
        #[arg(long)]
        slow: bool,

        /// Base name for saved MP3 files (sanitized before use)
        #[arg(long, default_value = "speech")]
        output: String,

        /// Zero-based index of the sentence to start at
        #[arg(long, default_value_t = 0)]
        sentence: usize,

        /// Step through sentences with n/p/q on stdin
        #[arg(long, short)]
        interactive: bool,
    },

    /// Process a CSV with a `text` column into a ZIP of MP3s + results.csv
    Batch {
        /// Input CSV file
        input: PathBuf,

        /// Language code for the speech backend
        #[arg(long, default_value = "en")]
        lang: String,

        /// Request a slower speech rate
        #[arg(long)]
        slow: bool,

        /// Base name of the output ZIP (sanitized before use)
        #[arg(long, default_value = "audios")]
        name: String,

        /// Directory to write the archive into
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Single {
            text,
            lang,
            slow,
            output,
            sentence,
            interactive,
        } => run_single(&text, SynthesisOptions { lang, slow }, &output, sentence, interactive),
        Commands::Batch {
            input,
            lang,
            slow,
            name,
            out_dir,
        } => run_batch(&input, SynthesisOptions { lang, slow }, &name, &out_dir),
    }
}

fn run_single(
    text: &str,
    opts: SynthesisOptions,
    output: &str,
    sentence: usize,
    interactive: bool,
) -> Result<()> {
    let units = segment(text);
    if units.is_empty() {
        bail!("no sentences found in the input text");
    }

    let mut cursor = SentenceCursor::new(units);
    cursor.jump_to(sentence);

    let transcriber = EspeakTranscriber::new();
    let synthesizer = GttsSynthesizer::new()?;
    let base = sanitize(output, DEFAULT_MAX_LEN);

    if !interactive {
        let mp3_path = PathBuf::from(format!("{base}.mp3"));
        return speak_sentence(&cursor, &transcriber, &synthesizer, &opts, &mp3_path);
    }

    loop {
        let mp3_path = PathBuf::from(format!("{base}_{:03}.mp3", cursor.position()));
        if let Err(e) = speak_sentence(&cursor, &transcriber, &synthesizer, &opts, &mp3_path) {
            // A failed synthesis should not end the session.
            eprintln!("error: {e:#}");
        }

        eprint!("[n]ext, [p]rev, [q]uit: ");
        std::io::stderr().flush()?;

        let mut line = String::new();
        if std::io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        match line.trim() {
            "n" => {
                if !cursor.next() {
                    eprintln!("already at the last sentence");
                }
            }
            "p" => {
                if !cursor.prev() {
                    eprintln!("already at the first sentence");
                }
            }
            "q" => break,
            "" => {}
            other => eprintln!("unknown command {other:?}"),
        }
    }

    Ok(())
}

fn speak_sentence(
    cursor: &SentenceCursor,
    transcriber: &EspeakTranscriber,
    synthesizer: &GttsSynthesizer,
    opts: &SynthesisOptions,
    mp3_path: &Path,
) -> Result<()> {
    let sentence = cursor
        .current()
        .context("sentence cursor is out of range")?;

    println!("Sentence {}/{}: {sentence}", cursor.position() + 1, cursor.len());
    println!("IPA: {}", transcriber.transcribe(sentence));

    synthesizer
        .synthesize_to_file(sentence, mp3_path, opts)
        .with_context(|| format!("could not synthesize {sentence:?}"))?;
    println!("Saved {}", mp3_path.display());

    Ok(())
}

fn run_batch(input: &Path, opts: SynthesisOptions, name: &str, out_dir: &Path) -> Result<()> {
    let file = File::open(input).with_context(|| format!("could not open {}", input.display()))?;

    let transcriber = EspeakTranscriber::new();
    let synthesizer = GttsSynthesizer::new()?;

    let output = process_batch(file, &transcriber, &synthesizer, &opts)?;

    for (i, outcome) in output.outcomes.iter().enumerate() {
        match outcome {
            RowOutcome::Audio { entry } => println!("{i:03} ok      {entry}"),
            RowOutcome::ErrorNotice { entry } => println!("{i:03} error   {entry}"),
            RowOutcome::Skipped => println!("{i:03} skipped (empty text)"),
        }
    }

    let archive_path = out_dir.join(format!("{}.zip", sanitize(name, DEFAULT_MAX_LEN)));
    std::fs::write(&archive_path, &output.archive)
        .with_context(|| format!("could not write {}", archive_path.display()))?;

    let audio = output
        .outcomes
        .iter()
        .filter(|o| matches!(o, RowOutcome::Audio { .. }))
        .count();
    let errors = output
        .outcomes
        .iter()
        .filter(|o| matches!(o, RowOutcome::ErrorNotice { .. }))
        .count();

    println!(
        "Processed {} rows: {audio} synthesized, {errors} failed. Archive: {}",
        output.outcomes.len(),
        archive_path.display()
    );

    Ok(())
}
