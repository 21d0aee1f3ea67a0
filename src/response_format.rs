use std::fmt;

use tracing::warn;

/// The response formats supported by the transcription service.
///
/// Why this exists:
/// - We want a single, strongly-typed representation of response formats
///   across the CLI, config, and library code.
/// - Using an enum avoids stringly-typed conditionals and keeps format
///   selection explicit and discoverable.
///
/// Integration notes:
/// - The wire name (`as_str`) is what gets sent to the remote API.
/// - Each variant maps to a fixed output file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// Structured transcript as a JSON object.
    Json,

    /// Plain transcript text. The only format eligible for the punctuation pass.
    Text,

    /// SubRip subtitle text.
    Srt,

    /// Structured transcript with timing and token metadata.
    VerboseJson,

    /// WebVTT subtitle text.
    Vtt,
}

impl ResponseFormat {
    /// The format unsupported config values are coerced to.
    pub const FALLBACK: ResponseFormat = ResponseFormat::Text;

    /// Every supported format, in wire-name order.
    pub const ALL: [ResponseFormat; 5] = [
        ResponseFormat::Json,
        ResponseFormat::Text,
        ResponseFormat::Srt,
        ResponseFormat::VerboseJson,
        ResponseFormat::Vtt,
    ];

    /// The name the remote API expects.
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseFormat::Json => "json",
            ResponseFormat::Text => "text",
            ResponseFormat::Srt => "srt",
            ResponseFormat::VerboseJson => "verbose_json",
            ResponseFormat::Vtt => "vtt",
        }
    }

    /// The extension used for output files in this format.
    pub fn extension(self) -> &'static str {
        match self {
            ResponseFormat::Json => ".json",
            ResponseFormat::Text => ".txt",
            ResponseFormat::Srt => ".srt",
            ResponseFormat::VerboseJson => ".verbose_json",
            ResponseFormat::Vtt => ".vtt",
        }
    }

    /// Whether responses in this format are structured JSON rather than plain text.
    pub fn is_structured(self) -> bool {
        matches!(self, ResponseFormat::Json | ResponseFormat::VerboseJson)
    }

    /// Parse a wire name into a format.
    pub fn parse(s: &str) -> Option<ResponseFormat> {
        Self::ALL.into_iter().find(|format| format.as_str() == s)
    }

    /// Resolve a config value into a supported format.
    ///
    /// Unsupported values are coerced to [`ResponseFormat::FALLBACK`] with a warning,
    /// never an error, so a typo in the config file can't prevent a run.
    pub fn coerce(s: &str) -> ResponseFormat {
        match Self::parse(s) {
            Some(format) => format,
            None => {
                warn!(
                    value = s,
                    fallback = Self::FALLBACK.as_str(),
                    "unsupported response_format, using fallback"
                );
                Self::FALLBACK
            }
        }
    }
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
