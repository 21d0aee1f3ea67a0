/// A transcription result returned by the remote service.
///
/// Structured formats (`json`, `verbose_json`) carry a parsed JSON value; everything
/// else is the raw response body. A transcript is immutable once produced and is
/// written at most twice: once as the transcript file, and once more as the input to
/// the punctuation pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Transcript {
    /// Parsed JSON response.
    Structured(serde_json::Value),

    /// Raw response text (`text`, `srt`, `vtt`).
    Plain(String),
}

impl Transcript {
    /// The transcript text, when this is a plain-text transcript.
    ///
    /// The punctuation pass only ever applies to plain text, so there is deliberately
    /// no accessor that digs text out of a structured transcript.
    pub fn plain_text(&self) -> Option<&str> {
        match self {
            Transcript::Plain(text) => Some(text),
            Transcript::Structured(_) => None,
        }
    }
}
