//! The batch pipeline: CSV in, ZIP of per-row MP3s plus `results.csv` out.
//!
//! Rows are processed strictly in input order. A synthesis failure is
//! isolated to its row (an error-notice entry replaces the audio entry);
//! only schema or parse failures of the whole input abort the batch.

use std::io::Read;

use crate::archive::ArchiveBuilder;
use crate::sanitize::{sanitize, DEFAULT_MAX_LEN};
use crate::{SynthesisOptions, Synthesizer, Transcriber};

/// Required input column.
const TEXT_COLUMN: &str = "text";

/// Column appended to the results table.
const IPA_COLUMN: &str = "ipa";

/// Name of the results-table entry in the archive.
const RESULTS_ENTRY: &str = "results.csv";

/// How many characters of the row text go into the audio entry name.
const NAME_PREFIX_CHARS: usize = 40;

#[derive(thiserror::Error, Debug)]
pub enum BatchError {
    #[error("could not parse the input table: {0}")]
    Parse(#[from] csv::Error),
    #[error("input table has no {0:?} column")]
    MissingColumn(String),
    #[error("could not write the archive: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// What the pipeline did for one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    /// Synthesis succeeded; an audio entry was added to the archive.
    Audio { entry: String },
    /// Synthesis failed; an error-notice entry was added instead.
    ErrorNotice { entry: String },
    /// Row text was empty after trimming; nothing was added.
    Skipped,
}

/// The results table: all original columns plus `ipa`, row order preserved.
#[derive(Debug, Clone)]
pub struct ResultsTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ResultsTable {
    /// Serialize the table as UTF-8 CSV, headers first, no index column.
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>, BatchError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(self.headers.iter().map(String::as_str))?;
        for row in &self.rows {
            writer.write_record(row.iter().map(String::as_str))?;
        }
        writer.flush()?;
        writer
            .into_inner()
            .map_err(|e| BatchError::Io(e.into_error()))
    }
}

/// Everything the batch pipeline produces.
#[derive(Debug)]
pub struct BatchOutput {
    /// The finished ZIP archive bytes.
    pub archive: Vec<u8>,
    /// The in-memory results table, for display alongside the download.
    pub table: ResultsTable,
    /// Per-row outcome, same order as the input rows.
    pub outcomes: Vec<RowOutcome>,
}

/// Run the batch pipeline over CSV input.
///
/// The input must carry a `text` column; `BatchError::MissingColumn` or
/// `BatchError::Parse` abort the whole batch before any conversion work.
/// After validation every row is processed in order:
///
/// 1. empty text (after trimming) records an empty transcription and is
///    skipped for synthesis;
/// 2. otherwise the transcription is recorded unconditionally (diagnostic
///    placeholders count as success) and synthesis is attempted;
/// 3. successful synthesis adds `<index>_<sanitized prefix>.mp3`, a failed
///    one adds `<index>_ERROR.txt` with the original text and the cause.
///
/// The archive always ends with exactly one `results.csv` entry.
pub fn process_batch<R: Read>(
    input: R,
    transcriber: &dyn Transcriber,
    synthesizer: &dyn Synthesizer,
    opts: &SynthesisOptions,
) -> Result<BatchOutput, BatchError> {
    let mut reader = csv::ReaderBuilder::new().from_reader(input);
    let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();

    let text_idx = headers
        .iter()
        .position(|h| h == TEXT_COLUMN)
        .ok_or_else(|| BatchError::MissingColumn(TEXT_COLUMN.to_string()))?;

    // Parse the whole table up front: a malformed row must abort the batch
    // before any row has been converted.
    let records = reader.records().collect::<Result<Vec<_>, _>>()?;

    log::info!("Batch: processing {} rows (lang={})", records.len(), opts.lang);

    let mut archive = ArchiveBuilder::new();
    let mut rows = Vec::with_capacity(records.len());
    let mut outcomes = Vec::with_capacity(records.len());

    for (i, record) in records.iter().enumerate() {
        let text = record.get(text_idx).unwrap_or("").trim().to_string();

        let (ipa, outcome) = if text.is_empty() {
            (String::new(), RowOutcome::Skipped)
        } else {
            let ipa = transcriber.transcribe(&text);

            let outcome = match synthesizer.synthesize(&text, opts) {
                Ok(audio) => {
                    let prefix: String = text.chars().take(NAME_PREFIX_CHARS).collect();
                    let entry = format!("{i:03}_{}.mp3", sanitize(&prefix, DEFAULT_MAX_LEN));
                    archive.add_entry(&entry, &audio.bytes)?;
                    RowOutcome::Audio { entry }
                }
                Err(e) => {
                    log::warn!("Batch row {i}: synthesis failed: {e}");
                    let entry = format!("{i:03}_ERROR.txt");
                    let notice = format!("Text: {text}\nError: {e}");
                    archive.add_entry(&entry, notice.as_bytes())?;
                    RowOutcome::ErrorNotice { entry }
                }
            };

            (ipa, outcome)
        };

        let mut row: Vec<String> = record.iter().map(String::from).collect();
        row.push(ipa);
        rows.push(row);
        outcomes.push(outcome);
    }

    let mut out_headers = headers;
    out_headers.push(IPA_COLUMN.to_string());
    let table = ResultsTable {
        headers: out_headers,
        rows,
    };

    archive.add_entry(RESULTS_ENTRY, &table.to_csv_bytes()?)?;

    let audio_count = outcomes
        .iter()
        .filter(|o| matches!(o, RowOutcome::Audio { .. }))
        .count();
    log::info!(
        "Batch: done, {audio_count}/{} rows synthesized, {} archive entries",
        outcomes.len(),
        archive.len()
    );

    Ok(BatchOutput {
        archive: archive.finish()?,
        table,
        outcomes,
    })
}

#[cfg(test)]
mod tests {
    use super::{process_batch, BatchError, RowOutcome};
    use crate::{SpeechAudio, SynthesisError, SynthesisOptions, Synthesizer, Transcriber};
    use std::io::{Cursor, Read};

    struct StubTranscriber;

    impl Transcriber for StubTranscriber {
        fn transcribe(&self, text: &str) -> String {
            format!("ipa:{text}")
        }
    }

    /// Succeeds with fixed bytes unless the text matches `fail_on`.
    struct StubSynthesizer {
        fail_on: Option<String>,
    }

    impl StubSynthesizer {
        fn ok() -> Self {
            Self { fail_on: None }
        }

        fn failing_on(text: &str) -> Self {
            Self {
                fail_on: Some(text.to_string()),
            }
        }
    }

    impl Synthesizer for StubSynthesizer {
        fn synthesize(
            &self,
            text: &str,
            _opts: &SynthesisOptions,
        ) -> Result<SpeechAudio, SynthesisError> {
            if self.fail_on.as_deref() == Some(text) {
                return Err(SynthesisError::Network("stub failure".to_string()));
            }
            Ok(SpeechAudio {
                bytes: b"mp3".to_vec(),
            })
        }
    }

    fn run(
        csv_input: &str,
        synthesizer: &dyn Synthesizer,
    ) -> Result<super::BatchOutput, BatchError> {
        process_batch(
            Cursor::new(csv_input.as_bytes().to_vec()),
            &StubTranscriber,
            synthesizer,
            &SynthesisOptions::default(),
        )
    }

    fn archive_names(bytes: &[u8]) -> Vec<String> {
        let archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        archive.file_names().map(String::from).collect()
    }

    fn read_entry(bytes: &[u8], name: &str) -> Vec<u8> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        let mut entry = archive.by_name(name).unwrap();
        let mut data = Vec::new();
        entry.read_to_end(&mut data).unwrap();
        data
    }

    #[test]
    fn empty_rows_are_skipped_without_entries() {
        // A blank line would be skipped by the CSV parser entirely; an
        // explicitly empty field is a real row with empty text.
        let out = run("text\nHello\n\"\"\nWorld\n", &StubSynthesizer::ok()).unwrap();

        assert_eq!(
            out.outcomes,
            vec![
                RowOutcome::Audio {
                    entry: "000_Hello.mp3".to_string()
                },
                RowOutcome::Skipped,
                RowOutcome::Audio {
                    entry: "002_World.mp3".to_string()
                },
            ]
        );

        // 2 audio entries + results.csv, nothing for the empty row.
        let names = archive_names(&out.archive);
        assert_eq!(names.len(), 3);
        assert!(names.contains(&"results.csv".to_string()));

        assert_eq!(out.table.rows.len(), 3);
        assert_eq!(out.table.rows[1], vec!["".to_string(), "".to_string()]);
        assert_eq!(out.table.rows[0][1], "ipa:Hello");
    }

    #[test]
    fn synthesis_failure_is_isolated_to_its_row() {
        let out = run(
            "text\nHello\nBroken\nWorld\n",
            &StubSynthesizer::failing_on("Broken"),
        )
        .unwrap();

        assert_eq!(
            out.outcomes,
            vec![
                RowOutcome::Audio {
                    entry: "000_Hello.mp3".to_string()
                },
                RowOutcome::ErrorNotice {
                    entry: "001_ERROR.txt".to_string()
                },
                RowOutcome::Audio {
                    entry: "002_World.mp3".to_string()
                },
            ]
        );

        let notice = String::from_utf8(read_entry(&out.archive, "001_ERROR.txt")).unwrap();
        assert!(notice.contains("Text: Broken"));
        assert!(notice.contains("Error:"));

        // No audio entry for the failed row.
        let names = archive_names(&out.archive);
        assert!(!names.iter().any(|n| n.starts_with("001_") && n.ends_with(".mp3")));

        // Transcription is still recorded for the failed row.
        assert_eq!(out.table.rows[1][1], "ipa:Broken");
    }

    #[test]
    fn missing_text_column_is_fatal() {
        let err = run("sentence\nHello\n", &StubSynthesizer::ok()).unwrap_err();
        assert!(matches!(err, BatchError::MissingColumn(ref c) if c == "text"));
    }

    #[test]
    fn malformed_csv_is_fatal() {
        // A record with more fields than the header row.
        let err = run("text\nHello,extra\n", &StubSynthesizer::ok()).unwrap_err();
        assert!(matches!(err, BatchError::Parse(_)));
    }

    #[test]
    fn extra_columns_are_preserved_in_order() {
        let out = run("id,text\n1,Hello\n2,World\n", &StubSynthesizer::ok()).unwrap();

        assert_eq!(out.table.headers, vec!["id", "text", "ipa"]);
        assert_eq!(out.table.rows[0], vec!["1", "Hello", "ipa:Hello"]);
        assert_eq!(out.table.rows[1], vec!["2", "World", "ipa:World"]);
    }

    #[test]
    fn results_csv_round_trips_text_values() {
        let input = "text\nHello\n\"\"\nWorld\n";
        let out = run(input, &StubSynthesizer::ok()).unwrap();

        let csv_bytes = read_entry(&out.archive, "results.csv");
        let mut reader = csv::Reader::from_reader(Cursor::new(csv_bytes));

        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, vec!["text", "ipa"]);

        let texts: Vec<String> = reader
            .records()
            .map(|r| r.unwrap().get(0).unwrap().to_string())
            .collect();
        assert_eq!(texts, vec!["Hello", "", "World"]);
    }

    #[test]
    fn entry_names_use_sanitized_prefixes() {
        let long = "This sentence is well over forty characters long, count them all";
        let input = format!("text\n{long}\na/b: c\n");
        let out = run(&input, &StubSynthesizer::ok()).unwrap();

        match &out.outcomes[0] {
            RowOutcome::Audio { entry } => {
                assert!(entry.starts_with("000_This_sentence_is_well_over_forty"));
                assert!(entry.ends_with(".mp3"));
                // 40-character prefix, sanitized.
                assert!(entry.len() <= "000_".len() + 40 + ".mp3".len());
            }
            other => panic!("expected audio entry, got {other:?}"),
        }

        assert_eq!(
            out.outcomes[1],
            RowOutcome::Audio {
                entry: "001_a_b__c.mp3".to_string()
            }
        );
    }
}
