use std::path::Path;

use crate::error::Result;
use crate::opts::Opts;
use crate::transcript::Transcript;

/// Remote speech-to-text boundary used by [`crate::pipeline::Pipeline`].
///
/// Both calls block until the service responds or fails; implementations must not
/// retry internally, so a failure is surfaced immediately and the orchestrator can
/// apply its per-file skip policy. The orchestrator picks `translate` or
/// `transcribe` based on the translation flag in `Opts`.
pub trait SpeechToText {
    /// Transcribe the audio file verbatim, honoring the prompt and language hints
    /// carried in `opts`.
    fn transcribe(&self, audio: &Path, opts: &Opts) -> Result<Transcript>;

    /// Translate the audio file's speech to English.
    ///
    /// Implementations must not send a language hint: the source language is
    /// always detected by the service.
    fn translate(&self, audio: &Path, opts: &Opts) -> Result<Transcript>;
}

/// Remote text-completion boundary for the punctuation pass.
pub trait Punctuator {
    /// Return `text` with punctuation restored, using the given model.
    fn punctuate(&self, text: &str, model: &str) -> Result<String>;
}
