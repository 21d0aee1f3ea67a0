use crate::response_format::ResponseFormat;

/// Options that control how a batch run talks to the remote services.
///
/// This struct represents *library-level configuration*, not CLI flags or config-file
/// fields directly. The config layer is responsible for mapping user input into this
/// type so that:
/// - the library remains reusable outside of a CLI context
/// - other frontends (tests, batch jobs) can construct options programmatically
///
/// The optional fields encode the request-shaping rule directly: a `None` prompt or
/// language is simply never sent. The config layer maps an empty prompt and the
/// `"auto"` language tag to `None` exactly once, at resolve time.
#[derive(Debug, Clone)]
pub struct Opts {
    /// Whether to translate speech to English instead of transcribing verbatim.
    ///
    /// Translation requests never carry a language hint; the source language is
    /// always detected by the service.
    pub translation: bool,

    /// The speech-to-text model, validated against the supported-model allowlist.
    pub model: String,

    /// Optional prompt to guide the model. `None` when the config value was empty.
    pub prompt: Option<String>,

    /// The desired response format, already resolved to a supported value.
    pub response_format: ResponseFormat,

    /// Sampling temperature passed through to the service.
    pub temperature: f32,

    /// Optional language hint (ISO code). `None` when the config said `"auto"`.
    pub language: Option<String>,

    /// Settings for the secondary punctuation pass.
    pub punctuation: PunctuationOpts,
}

/// Settings for the punctuation pass over plain-text transcripts.
#[derive(Debug, Clone)]
pub struct PunctuationOpts {
    /// Whether the pass runs at all. Even when enabled it only applies to the
    /// plain `text` response format.
    pub enabled: bool,

    /// The text-completion model used to add punctuation.
    pub model: String,
}
