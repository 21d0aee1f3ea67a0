//! Batch orchestration: normalize → dedup → admission → transcribe → punctuate → write.
//!
//! We expose a single entry point (`Pipeline`) that drives every input file through
//! the whole sequence, strictly one file at a time. The intent is:
//! - We construct the long-lived collaborators once (normalizer, clients, store).
//! - Each file is fully settled (discarded, skipped, or written) before the next
//!   file's normalization begins.
//! - Per-file problems become warnings and a skip; only setup problems abort a run.
//!
//! The single shared scratch path is what forces sequential processing: a future
//! concurrent implementation would need a scratch path per in-flight file and a
//! serialized store, so parallelism stays out of scope here on purpose.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::client::{Punctuator, SpeechToText};
use crate::dedup::DedupStore;
use crate::error::{Error, Result};
use crate::normalize::Normalizer;
use crate::opts::Opts;
use crate::output::write_transcript;
use crate::response_format::ResponseFormat;
use crate::scan::InputFile;
use crate::transcript::Transcript;

/// Largest normalized file the remote API accepts: 25 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 25 * 1024 * 1024;

/// Filesystem locations used by one run.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Where normalized audio lands before the duplicate check. Shared across
    /// iterations, so it must never survive from one file to the next.
    pub scratch_path: PathBuf,

    /// Directory of committed normalized files, purged at run start and end.
    pub store_dir: PathBuf,

    /// Directory transcript outputs are written into, created on first write.
    pub output_dir: PathBuf,

    /// Admission ceiling for uploads, in bytes. Files strictly above it are
    /// skipped; a file exactly at the ceiling is admitted.
    pub max_upload_bytes: u64,
}

impl PipelineSettings {
    /// Standard locations: scratch and store under the system temp directory,
    /// outputs in an `output/` subdirectory of the working directory.
    pub fn for_work_dir(work_dir: &Path) -> Self {
        let base = std::env::temp_dir().join("batchscribe");
        Self {
            scratch_path: base.join("scratch.wav"),
            store_dir: base.join("normalized"),
            output_dir: work_dir.join("output"),
            max_upload_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

/// What happened to one input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Transcript written. `punctuated` is set when the second pass also ran
    /// and produced its output file.
    Transcribed { punctuated: bool },

    /// Normalized audio matched an already-committed file and was discarded;
    /// the file contributes no output.
    Duplicate,

    /// No transcription slot was available this iteration; the committed file
    /// stays in the store untranscribed.
    Deferred,

    /// Committed file exceeded the upload ceiling. The slot is consumed but no
    /// output is produced.
    Oversize,

    /// A per-file error, already reported as a warning.
    Failed(String),
}

/// Per-input bookkeeping.
///
/// One record exists per input file, in processing order. The two run-level
/// counts the admission gate compares are derived from these flags rather than
/// tracked as loose integers, which keeps `slots consumed <= files committed`
/// checkable at any point.
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// The input's bare file name.
    pub name: String,

    /// Normalization produced a scratch WAV.
    pub normalized: bool,

    /// The scratch WAV was committed into the store (i.e. it was not a duplicate).
    pub committed: bool,

    /// Where the committed WAV lives for the rest of the run.
    pub stored_path: Option<PathBuf>,

    /// This file consumed its transcription slot, whether by being transcribed,
    /// failing transcription, or being skipped as oversize.
    pub slot_consumed: bool,

    /// Final disposition.
    pub outcome: Outcome,
}

impl FileRecord {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            normalized: false,
            committed: false,
            stored_path: None,
            slot_consumed: false,
            outcome: Outcome::Failed("not processed".to_string()),
        }
    }
}

/// Summary of a completed run.
#[derive(Debug)]
pub struct RunReport {
    /// One record per input file, in processing order.
    pub records: Vec<FileRecord>,

    /// Total warnings emitted during the run.
    pub warnings: u32,
}

impl RunReport {
    /// Number of inputs that produced a transcript file.
    pub fn transcribed(&self) -> usize {
        self.records
            .iter()
            .filter(|record| matches!(record.outcome, Outcome::Transcribed { .. }))
            .count()
    }
}

/// The batch orchestrator.
///
/// Generic over its three collaborators so tests (and future embedders) can
/// substitute implementations without touching the control flow.
pub struct Pipeline<'a, N, S, P> {
    settings: PipelineSettings,
    opts: &'a Opts,
    normalizer: &'a N,
    stt: &'a S,
    punctuator: &'a P,
    store: DedupStore,
    records: Vec<FileRecord>,
    warnings: u32,
}

impl<'a, N, S, P> Pipeline<'a, N, S, P>
where
    N: Normalizer,
    S: SpeechToText,
    P: Punctuator,
{
    pub fn new(
        settings: PipelineSettings,
        opts: &'a Opts,
        normalizer: &'a N,
        stt: &'a S,
        punctuator: &'a P,
    ) -> Self {
        let store = DedupStore::new(settings.store_dir.clone());
        Self {
            settings,
            opts,
            normalizer,
            stt,
            punctuator,
            store,
            records: Vec::new(),
            warnings: 0,
        }
    }

    /// Replace the dedup store, e.g. to select a different comparison strategy.
    ///
    /// The store must point at `settings.store_dir`, otherwise committed files
    /// and the purge lifecycle end up in different places.
    pub fn with_store(mut self, store: DedupStore) -> Self {
        self.store = store;
        self
    }

    /// Process every input file in order and report what happened.
    ///
    /// Setup problems (unusable scratch/store directories, failing output
    /// directory creation) abort with an error; everything else is recorded
    /// per-file and the run continues.
    pub fn run(mut self, files: &[InputFile]) -> Result<RunReport> {
        self.setup()?;
        info!(count = files.len(), "processing input files");

        for file in files {
            self.records.push(FileRecord::new(&file.name));
            let idx = self.records.len() - 1;

            match self.process_file(file, idx) {
                Ok(outcome) => self.records[idx].outcome = outcome,
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    self.warn(&file.name, &err.to_string());
                    // The scratch file must never survive into the next iteration.
                    let _ = fs::remove_file(&self.settings.scratch_path);
                    self.records[idx].outcome = Outcome::Failed(err.to_string());
                }
            }

            debug_assert!(self.slots_consumed() <= self.files_committed());
        }

        if let Err(err) = self.store.purge_all() {
            self.warn("cleanup", &err.to_string());
        }

        info!(warnings = self.warnings, "run complete");
        Ok(RunReport {
            records: self.records,
            warnings: self.warnings,
        })
    }

    fn setup(&mut self) -> Result<()> {
        if let Some(parent) = self.settings.scratch_path.parent() {
            fs::create_dir_all(parent).map_err(|source| Error::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        // Stale state from a crashed prior run must not leak into this one.
        let _ = fs::remove_file(&self.settings.scratch_path);
        self.store.purge_all()?;
        Ok(())
    }

    fn process_file(&mut self, file: &InputFile, idx: usize) -> Result<Outcome> {
        let scratch = self.settings.scratch_path.clone();

        info!(file = %file.name, "normalizing");
        self.normalizer.normalize(&file.path, &scratch)?;
        self.records[idx].normalized = true;

        if self.store.is_duplicate(&scratch)? {
            info!(file = %file.name, "duplicate audio content, discarding");
            return Ok(Outcome::Duplicate);
        }

        let stored = self.store.commit(&scratch)?;
        self.records[idx].committed = true;
        self.records[idx].stored_path = Some(stored.clone());

        // Admission gate: transcription may only consume slots normalization has
        // earned. With no duplicates this is always a 1:1 pass-through; it exists
        // so a discard can never skew stored names against input order.
        if self.slots_consumed() >= self.files_committed() {
            return Ok(Outcome::Deferred);
        }

        let size = fs::metadata(&stored)?.len();
        if size > self.settings.max_upload_bytes {
            self.records[idx].slot_consumed = true;
            self.warn(
                &file.name,
                &format!(
                    "normalized file is {size} bytes, above the {} byte upload limit; skipping transcription",
                    self.settings.max_upload_bytes
                ),
            );
            return Ok(Outcome::Oversize);
        }

        let dispatched = if self.opts.translation {
            self.stt.translate(&stored, self.opts)
        } else {
            self.stt.transcribe(&stored, self.opts)
        };

        // The slot is consumed by the attempt, not by its success.
        self.records[idx].slot_consumed = true;
        let transcript = dispatched?;

        let transcript_path = self.output_path(&file.name, "_transcript")?;
        write_transcript(&transcript_path, &transcript)?;
        info!(file = %file.name, output = %transcript_path.display(), "transcript written");

        if !self.opts.punctuation.enabled || self.opts.response_format != ResponseFormat::Text {
            return Ok(Outcome::Transcribed { punctuated: false });
        }

        let Some(text) = transcript.plain_text() else {
            return Ok(Outcome::Transcribed { punctuated: false });
        };

        match self.punctuator.punctuate(text, &self.opts.punctuation.model) {
            Ok(punctuated) => {
                let punctuation_path = self.output_path(&file.name, "_punctuation")?;
                write_transcript(&punctuation_path, &Transcript::Plain(punctuated))?;
                info!(file = %file.name, output = %punctuation_path.display(), "punctuation written");
                Ok(Outcome::Transcribed { punctuated: true })
            }
            Err(err) => {
                // The transcript is already on disk; losing the punctuation pass
                // is a warning, not a reason to discard the file's work.
                self.warn(&file.name, &format!("punctuation failed: {err}"));
                Ok(Outcome::Transcribed { punctuated: false })
            }
        }
    }

    /// Build an output path, creating the output directory on first use.
    fn output_path(&self, input_name: &str, suffix: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.settings.output_dir).map_err(|source| Error::CreateDir {
            path: self.settings.output_dir.clone(),
            source,
        })?;

        let stem = Path::new(input_name)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(input_name);

        Ok(self.settings.output_dir.join(format!(
            "{stem}{suffix}{}",
            self.opts.response_format.extension()
        )))
    }

    /// Inputs whose normalized audio was committed to the store.
    fn files_committed(&self) -> usize {
        self.records.iter().filter(|record| record.committed).count()
    }

    /// Committed files whose transcription slot has been consumed.
    fn slots_consumed(&self) -> usize {
        self.records
            .iter()
            .filter(|record| record.slot_consumed)
            .count()
    }

    fn warn(&mut self, file: &str, reason: &str) {
        warn!(file, "{reason}");
        self.warnings += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup::DedupStrategy;
    use crate::opts::PunctuationOpts;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;

    /// Writes canned bytes to the scratch path; names it doesn't know fail.
    struct FakeNormalizer {
        outputs: HashMap<String, Vec<u8>>,
    }

    impl FakeNormalizer {
        fn with(entries: &[(&str, Vec<u8>)]) -> Self {
            Self {
                outputs: entries
                    .iter()
                    .map(|(name, bytes)| (name.to_string(), bytes.clone()))
                    .collect(),
            }
        }
    }

    impl Normalizer for FakeNormalizer {
        fn normalize(&self, input: &Path, output: &Path) -> Result<()> {
            let name = input.file_name().unwrap().to_str().unwrap();
            match self.outputs.get(name) {
                Some(bytes) => {
                    fs::write(output, bytes)?;
                    Ok(())
                }
                None => Err(Error::Normalize {
                    input: name.to_string(),
                    reason: "simulated conversion failure".to_string(),
                }),
            }
        }
    }

    #[derive(Debug)]
    struct SttCall {
        translate: bool,
        audio: PathBuf,
    }

    /// Records every dispatch; optionally fails the first N calls.
    struct RecordingStt {
        calls: RefCell<Vec<SttCall>>,
        fail_first: Cell<usize>,
    }

    impl RecordingStt {
        fn ok() -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                fail_first: Cell::new(0),
            }
        }

        fn failing_first(n: usize) -> Self {
            let stt = Self::ok();
            stt.fail_first.set(n);
            stt
        }

        fn record(&self, translate: bool, audio: &Path, opts: &Opts) -> Result<Transcript> {
            self.calls.borrow_mut().push(SttCall {
                translate,
                audio: audio.to_path_buf(),
            });

            if self.fail_first.get() > 0 {
                self.fail_first.set(self.fail_first.get() - 1);
                return Err(Error::Api {
                    status: 500,
                    body: "simulated server error".to_string(),
                });
            }

            if opts.response_format.is_structured() {
                Ok(Transcript::Structured(
                    serde_json::json!({"text": "hello world"}),
                ))
            } else {
                Ok(Transcript::Plain("hello world".to_string()))
            }
        }
    }

    impl SpeechToText for RecordingStt {
        fn transcribe(&self, audio: &Path, opts: &Opts) -> Result<Transcript> {
            self.record(false, audio, opts)
        }

        fn translate(&self, audio: &Path, opts: &Opts) -> Result<Transcript> {
            self.record(true, audio, opts)
        }
    }

    struct RecordingPunctuator {
        calls: RefCell<Vec<String>>,
        fail: bool,
    }

    impl RecordingPunctuator {
        fn ok() -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                fail: true,
            }
        }
    }

    impl Punctuator for RecordingPunctuator {
        fn punctuate(&self, text: &str, _model: &str) -> Result<String> {
            self.calls.borrow_mut().push(text.to_string());
            if self.fail {
                return Err(Error::Quota);
            }
            Ok(format!("{text}."))
        }
    }

    fn settings(root: &Path) -> PipelineSettings {
        PipelineSettings {
            scratch_path: root.join("tmp").join("scratch.wav"),
            store_dir: root.join("normalized"),
            output_dir: root.join("output"),
            max_upload_bytes: MAX_UPLOAD_BYTES,
        }
    }

    fn inputs(root: &Path, names: &[&str]) -> Vec<InputFile> {
        names
            .iter()
            .map(|name| InputFile {
                name: name.to_string(),
                path: root.join(name),
            })
            .collect()
    }

    fn opts(format: ResponseFormat) -> Opts {
        Opts {
            translation: false,
            model: "whisper-1".to_string(),
            prompt: None,
            response_format: format,
            temperature: 0.0,
            language: None,
            punctuation: PunctuationOpts {
                enabled: false,
                model: "gpt-3.5-turbo".to_string(),
            },
        }
    }

    fn opts_with_punctuation(format: ResponseFormat) -> Opts {
        let mut opts = opts(format);
        opts.punctuation.enabled = true;
        opts
    }

    #[test]
    fn transcribes_each_unique_input() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let root = dir.path();
        let normalizer =
            FakeNormalizer::with(&[("a.mp3", vec![1u8; 100]), ("b.mp4", vec![2u8; 200])]);
        let stt = RecordingStt::ok();
        let punctuator = RecordingPunctuator::ok();
        let run_opts = opts(ResponseFormat::Text);

        let report = Pipeline::new(settings(root), &run_opts, &normalizer, &stt, &punctuator)
            .run(&inputs(root, &["a.mp3", "b.mp4"]))?;

        assert_eq!(report.warnings, 0);
        assert_eq!(report.transcribed(), 2);
        assert_eq!(stt.calls.borrow().len(), 2);
        assert_eq!(
            fs::read_to_string(root.join("output").join("a_transcript.txt"))?,
            "hello world"
        );
        assert_eq!(
            fs::read_to_string(root.join("output").join("b_transcript.txt"))?,
            "hello world"
        );

        // Final cleanup: the store is emptied and the scratch path is gone.
        assert_eq!(fs::read_dir(root.join("normalized"))?.count(), 0);
        assert!(!root.join("tmp").join("scratch.wav").exists());
        Ok(())
    }

    #[test]
    fn same_size_normalized_output_discards_the_second_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let root = dir.path();
        // Identical byte length, different content: still treated as duplicate.
        let normalizer =
            FakeNormalizer::with(&[("a.mp3", vec![1u8; 500]), ("b.mp3", vec![2u8; 500])]);
        let stt = RecordingStt::ok();
        let punctuator = RecordingPunctuator::ok();
        let run_opts = opts(ResponseFormat::Text);

        let report = Pipeline::new(settings(root), &run_opts, &normalizer, &stt, &punctuator)
            .run(&inputs(root, &["a.mp3", "b.mp3"]))?;

        assert_eq!(report.records[0].outcome, Outcome::Transcribed { punctuated: false });
        assert_eq!(report.records[1].outcome, Outcome::Duplicate);
        assert!(report.records[1].normalized);
        assert!(!report.records[1].committed);
        assert!(!report.records[1].slot_consumed);

        assert_eq!(stt.calls.borrow().len(), 1);
        assert!(root.join("output").join("a_transcript.txt").exists());
        assert!(!root.join("output").join("b_transcript.txt").exists());
        Ok(())
    }

    #[test]
    fn content_hash_store_keeps_distinct_same_size_files() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let root = dir.path();
        let normalizer =
            FakeNormalizer::with(&[("a.mp3", vec![1u8; 500]), ("b.mp3", vec![2u8; 500])]);
        let stt = RecordingStt::ok();
        let punctuator = RecordingPunctuator::ok();
        let run_opts = opts(ResponseFormat::Text);
        let run_settings = settings(root);

        let store =
            DedupStore::with_strategy(run_settings.store_dir.clone(), DedupStrategy::ContentHash);
        let report = Pipeline::new(run_settings, &run_opts, &normalizer, &stt, &punctuator)
            .with_store(store)
            .run(&inputs(root, &["a.mp3", "b.mp3"]))?;

        assert_eq!(report.transcribed(), 2);
        assert_eq!(stt.calls.borrow().len(), 2);
        Ok(())
    }

    #[test]
    fn oversize_is_skipped_but_consumes_a_slot() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let root = dir.path();
        let normalizer =
            FakeNormalizer::with(&[("big.mp3", vec![1u8; 65]), ("fits.mp3", vec![2u8; 64])]);
        let stt = RecordingStt::ok();
        let punctuator = RecordingPunctuator::ok();
        let run_opts = opts(ResponseFormat::Text);
        let mut run_settings = settings(root);
        run_settings.max_upload_bytes = 64;

        let report = Pipeline::new(run_settings, &run_opts, &normalizer, &stt, &punctuator)
            .run(&inputs(root, &["big.mp3", "fits.mp3"]))?;

        assert_eq!(report.records[0].outcome, Outcome::Oversize);
        assert!(report.records[0].slot_consumed);
        assert_eq!(report.warnings, 1);
        assert!(!root.join("output").join("big_transcript.txt").exists());

        // Exactly at the ceiling is admitted.
        assert_eq!(report.records[1].outcome, Outcome::Transcribed { punctuated: false });
        assert_eq!(stt.calls.borrow().len(), 1);
        assert!(stt.calls.borrow()[0].audio.ends_with("1.wav"));
        Ok(())
    }

    #[test]
    fn admission_gate_never_outruns_normalization() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let root = dir.path();
        let normalizer = FakeNormalizer::with(&[
            ("a.mp3", vec![1u8; 10]),
            ("b.mp3", vec![2u8; 10]), // duplicate of a by size
            ("d.mp3", vec![3u8; 30]),
        ]);
        let stt = RecordingStt::ok();
        let punctuator = RecordingPunctuator::ok();
        let run_opts = opts(ResponseFormat::Text);

        let report = Pipeline::new(settings(root), &run_opts, &normalizer, &stt, &punctuator)
            .run(&inputs(root, &["a.mp3", "b.mp3", "c.mp3", "d.mp3"]))?;

        // The invariant holds for every prefix of the run, not just the end state.
        for end in 0..=report.records.len() {
            let committed = report.records[..end].iter().filter(|r| r.committed).count();
            let consumed = report.records[..end]
                .iter()
                .filter(|r| r.slot_consumed)
                .count();
            assert!(consumed <= committed);
        }

        assert_eq!(report.records[1].outcome, Outcome::Duplicate);
        assert!(matches!(report.records[2].outcome, Outcome::Failed(_)));
        assert_eq!(report.records[3].outcome, Outcome::Transcribed { punctuated: false });
        Ok(())
    }

    #[test]
    fn translation_uses_the_translate_call() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let root = dir.path();
        let normalizer = FakeNormalizer::with(&[("a.mp3", vec![1u8; 10])]);
        let stt = RecordingStt::ok();
        let punctuator = RecordingPunctuator::ok();
        let mut run_opts = opts(ResponseFormat::Text);
        run_opts.translation = true;
        run_opts.language = Some("fr".to_string());

        Pipeline::new(settings(root), &run_opts, &normalizer, &stt, &punctuator)
            .run(&inputs(root, &["a.mp3"]))?;

        let calls = stt.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].translate);
        Ok(())
    }

    #[test]
    fn punctuation_only_runs_for_plain_text() -> anyhow::Result<()> {
        for format in [
            ResponseFormat::Json,
            ResponseFormat::Srt,
            ResponseFormat::VerboseJson,
            ResponseFormat::Vtt,
        ] {
            let dir = tempfile::tempdir()?;
            let root = dir.path();
            let normalizer = FakeNormalizer::with(&[("a.mp3", vec![1u8; 10])]);
            let stt = RecordingStt::ok();
            let punctuator = RecordingPunctuator::ok();
            let run_opts = opts_with_punctuation(format);

            let report = Pipeline::new(settings(root), &run_opts, &normalizer, &stt, &punctuator)
                .run(&inputs(root, &["a.mp3"]))?;

            assert_eq!(
                report.records[0].outcome,
                Outcome::Transcribed { punctuated: false },
                "format {format} must not trigger punctuation"
            );
            assert!(punctuator.calls.borrow().is_empty());
        }

        let dir = tempfile::tempdir()?;
        let root = dir.path();
        let normalizer = FakeNormalizer::with(&[("a.mp3", vec![1u8; 10])]);
        let stt = RecordingStt::ok();
        let punctuator = RecordingPunctuator::ok();
        let run_opts = opts_with_punctuation(ResponseFormat::Text);

        let report = Pipeline::new(settings(root), &run_opts, &normalizer, &stt, &punctuator)
            .run(&inputs(root, &["a.mp3"]))?;

        assert_eq!(report.records[0].outcome, Outcome::Transcribed { punctuated: true });
        assert_eq!(punctuator.calls.borrow().len(), 1);
        assert_eq!(punctuator.calls.borrow()[0], "hello world");
        assert_eq!(
            fs::read_to_string(root.join("output").join("a_punctuation.txt"))?,
            "hello world."
        );
        Ok(())
    }

    #[test]
    fn normalization_failure_warns_and_continues() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let root = dir.path();
        // "broken.mp3" is unknown to the fake, so conversion fails.
        let normalizer = FakeNormalizer::with(&[("ok.mp3", vec![1u8; 10])]);
        let stt = RecordingStt::ok();
        let punctuator = RecordingPunctuator::ok();
        let run_opts = opts(ResponseFormat::Text);

        let report = Pipeline::new(settings(root), &run_opts, &normalizer, &stt, &punctuator)
            .run(&inputs(root, &["broken.mp3", "ok.mp3"]))?;

        assert!(matches!(report.records[0].outcome, Outcome::Failed(_)));
        assert!(!report.records[0].normalized);
        assert_eq!(report.warnings, 1);
        assert_eq!(report.records[1].outcome, Outcome::Transcribed { punctuated: false });
        Ok(())
    }

    #[test]
    fn transcription_failure_consumes_the_slot_and_continues() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let root = dir.path();
        let normalizer =
            FakeNormalizer::with(&[("a.mp3", vec![1u8; 10]), ("b.mp3", vec![2u8; 20])]);
        let stt = RecordingStt::failing_first(1);
        let punctuator = RecordingPunctuator::ok();
        let run_opts = opts(ResponseFormat::Text);

        let report = Pipeline::new(settings(root), &run_opts, &normalizer, &stt, &punctuator)
            .run(&inputs(root, &["a.mp3", "b.mp3"]))?;

        assert!(matches!(report.records[0].outcome, Outcome::Failed(_)));
        assert!(report.records[0].slot_consumed);
        assert_eq!(report.warnings, 1);
        assert!(!root.join("output").join("a_transcript.txt").exists());

        assert_eq!(report.records[1].outcome, Outcome::Transcribed { punctuated: false });
        assert!(root.join("output").join("b_transcript.txt").exists());
        Ok(())
    }

    #[test]
    fn punctuation_failure_keeps_the_transcript() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let root = dir.path();
        let normalizer = FakeNormalizer::with(&[("a.mp3", vec![1u8; 10])]);
        let stt = RecordingStt::ok();
        let punctuator = RecordingPunctuator::failing();
        let run_opts = opts_with_punctuation(ResponseFormat::Text);

        let report = Pipeline::new(settings(root), &run_opts, &normalizer, &stt, &punctuator)
            .run(&inputs(root, &["a.mp3"]))?;

        assert_eq!(report.records[0].outcome, Outcome::Transcribed { punctuated: false });
        assert_eq!(report.warnings, 1);
        assert!(root.join("output").join("a_transcript.txt").exists());
        assert!(!root.join("output").join("a_punctuation.txt").exists());
        Ok(())
    }

    #[test]
    fn stale_store_entries_are_purged_before_processing() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let root = dir.path();
        let run_settings = settings(root);

        // A crashed prior run left an entry with the same byte size as our input.
        fs::create_dir_all(&run_settings.store_dir)?;
        fs::write(run_settings.store_dir.join("9.wav"), vec![9u8; 10])?;

        let normalizer = FakeNormalizer::with(&[("a.mp3", vec![1u8; 10])]);
        let stt = RecordingStt::ok();
        let punctuator = RecordingPunctuator::ok();
        let run_opts = opts(ResponseFormat::Text);

        let report = Pipeline::new(run_settings, &run_opts, &normalizer, &stt, &punctuator)
            .run(&inputs(root, &["a.mp3"]))?;

        // Without the purge the stale entry would have shadowed this file.
        assert_eq!(report.records[0].outcome, Outcome::Transcribed { punctuated: false });
        Ok(())
    }

    #[test]
    fn rerunning_yields_identical_outputs() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let root = dir.path();
        let normalizer =
            FakeNormalizer::with(&[("a.mp3", vec![1u8; 10]), ("b.mp3", vec![2u8; 20])]);
        let run_opts = opts(ResponseFormat::Json);
        let names = ["a.mp3", "b.mp3"];

        let mut outputs = Vec::new();
        for _ in 0..2 {
            let stt = RecordingStt::ok();
            let punctuator = RecordingPunctuator::ok();
            Pipeline::new(settings(root), &run_opts, &normalizer, &stt, &punctuator)
                .run(&inputs(root, &names))?;

            outputs.push((
                fs::read(root.join("output").join("a_transcript.json"))?,
                fs::read(root.join("output").join("b_transcript.json"))?,
            ));
        }

        assert_eq!(outputs[0], outputs[1]);
        Ok(())
    }
}
