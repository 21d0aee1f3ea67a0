use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::transcript::Transcript;

/// Serialize a transcript to `path`.
///
/// Structured transcripts are written as formatted JSON; plain transcripts are
/// written verbatim. An existing file at `path` is always truncated and replaced,
/// never appended to, so re-running over the same inputs converges on identical
/// outputs.
pub fn write_transcript(path: &Path, transcript: &Transcript) -> Result<()> {
    match transcript {
        Transcript::Structured(value) => {
            let formatted = serde_json::to_string_pretty(value)
                .map_err(|err| Error::msg(format!("failed to serialize transcript: {err}")))?;
            fs::write(path, formatted)?;
        }
        Transcript::Plain(text) => {
            fs::write(path, text)?;
        }
    }

    Ok(())
}
