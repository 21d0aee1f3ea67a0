use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::error::{Error, Result};
use crate::opts::{Opts, PunctuationOpts};
use crate::response_format::ResponseFormat;

/// Speech-to-text models the service accepts.
///
/// We intentionally keep an allowlist of known-good model names; unsupported config
/// values are coerced to the first entry with a warning.
pub const SUPPORTED_MODELS: &[&str] = &["whisper-1"];

/// The config file written when none exists yet.
const DEFAULT_CONFIG: &str = "\
# batchscribe configuration

[general]
# API key for the remote services. Falls back to the OPENAI_API_KEY
# environment variable when empty.
api_key = \"\"
temperature = 0.0

[audio]
# true = translate speech to English, false = transcribe verbatim
translation = false
model = \"whisper-1\"
prompt = \"\"
# one of: json, text, srt, verbose_json, vtt
response_format = \"text\"
# \"auto\" or an ISO language code such as \"en\"
language = \"auto\"

[punctuation]
model = \"gpt-3.5-turbo\"
enabled = false
";

/// Raw on-disk configuration.
///
/// Every field has a documented default, so a partial (or empty) file still loads.
/// Values that must be drawn from a fixed set (`response_format`, `model`) are kept
/// as strings here and validated by [`Config::resolve`], which coerces unsupported
/// values instead of erroring.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralSection,
    pub audio: AudioSection,
    pub punctuation: PunctuationSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GeneralSection {
    pub api_key: String,
    pub temperature: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AudioSection {
    pub translation: bool,
    pub model: String,
    pub prompt: String,
    pub response_format: String,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PunctuationSection {
    pub model: String,
    pub enabled: bool,
}

impl Default for GeneralSection {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            temperature: 0.0,
        }
    }
}

impl Default for AudioSection {
    fn default() -> Self {
        Self {
            translation: false,
            model: "whisper-1".to_string(),
            prompt: String::new(),
            response_format: "text".to_string(),
            language: "auto".to_string(),
        }
    }
}

impl Default for PunctuationSection {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            enabled: false,
        }
    }
}

/// A validated configuration, ready for the pipeline.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub api_key: String,
    pub opts: Opts,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// Missing fields use their defaults; invalid TOML is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|err| Error::Config(format!("failed to parse {}: {err}", path.display())))
    }

    /// Load configuration, generating a default config file if none exists.
    ///
    /// Only a missing file triggers generation; an unreadable or invalid file is
    /// still an error.
    pub fn load_or_init(path: &Path) -> Result<Self> {
        match fs::metadata(path) {
            Ok(_) => Self::load(path),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "config file not found, generating defaults");
                fs::write(path, DEFAULT_CONFIG)?;
                Ok(Self::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Validate this configuration and produce pipeline-ready options.
    ///
    /// - `response_format` and `model` are coerced to supported values (warning, not error)
    /// - an empty prompt and the `"auto"` language tag become `None`
    /// - a missing API key falls back to `OPENAI_API_KEY`; missing both is fatal
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        self.resolve_with_env(std::env::var("OPENAI_API_KEY").ok())
    }

    fn resolve_with_env(&self, env_api_key: Option<String>) -> Result<ResolvedConfig> {
        let api_key = if self.general.api_key.is_empty() {
            env_api_key.filter(|key| !key.is_empty())
        } else {
            Some(self.general.api_key.clone())
        }
        .ok_or(Error::MissingApiKey)?;

        let response_format = ResponseFormat::coerce(&self.audio.response_format);

        let model = if SUPPORTED_MODELS.contains(&self.audio.model.as_str()) {
            self.audio.model.clone()
        } else {
            warn!(
                value = %self.audio.model,
                fallback = SUPPORTED_MODELS[0],
                "unsupported model, using fallback"
            );
            SUPPORTED_MODELS[0].to_string()
        };

        let prompt = (!self.audio.prompt.is_empty()).then(|| self.audio.prompt.clone());
        let language = (self.audio.language != "auto").then(|| self.audio.language.clone());

        Ok(ResolvedConfig {
            api_key,
            opts: Opts {
                translation: self.audio.translation,
                model,
                prompt,
                response_format,
                temperature: self.general.temperature,
                language,
                punctuation: PunctuationOpts {
                    enabled: self.punctuation.enabled,
                    model: self.punctuation.model.clone(),
                },
            },
        })
    }
}
