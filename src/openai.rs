//! OpenAI-backed implementations of the remote service boundaries.
//!
//! Request shaping deliberately mirrors the service's API: multipart uploads for
//! audio, JSON for chat completions, and only non-default optional fields on the
//! wire. HTTP status classes map onto the typed failures in [`crate::Error`].

use std::path::Path;

use reqwest::blocking::multipart::Form;
use reqwest::blocking::{Client, Response};
use reqwest::header::CONTENT_TYPE;

use crate::client::{Punctuator, SpeechToText};
use crate::error::{Error, Result};
use crate::opts::Opts;
use crate::transcript::Transcript;

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// System instruction for the punctuation completion.
const PUNCTUATION_INSTRUCTION: &str = "Do not explain. Just follow the instructions.";

/// A blocking client for the transcription and completion endpoints.
pub struct OpenAiClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    /// Create a client against the production API.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client against a custom API root (primarily for testing).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("batchscribe/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn audio_request(
        &self,
        endpoint: &str,
        audio: &Path,
        opts: &Opts,
        include_language: bool,
    ) -> Result<Transcript> {
        let mut form = Form::new().file("file", audio)?;
        for (name, value) in audio_form_fields(opts, include_language) {
            form = form.text(name, value);
        }

        let response = self
            .http
            .post(format!("{}/{endpoint}", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()?;

        let body = check_status(response)?.text()?;

        if opts.response_format.is_structured() {
            let value = serde_json::from_str(&body).map_err(|err| {
                Error::MalformedResponse(format!("expected a JSON transcript: {err}"))
            })?;
            Ok(Transcript::Structured(value))
        } else {
            Ok(Transcript::Plain(body))
        }
    }
}

impl SpeechToText for OpenAiClient {
    fn transcribe(&self, audio: &Path, opts: &Opts) -> Result<Transcript> {
        self.audio_request("audio/transcriptions", audio, opts, true)
    }

    fn translate(&self, audio: &Path, opts: &Opts) -> Result<Transcript> {
        self.audio_request("audio/translations", audio, opts, false)
    }
}

impl Punctuator for OpenAiClient {
    fn punctuate(&self, text: &str, model: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": model,
            "messages": [
                { "role": "system", "content": PUNCTUATION_INSTRUCTION },
                { "role": "user", "content": punctuation_prompt(text) },
            ],
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()?;

        let body = check_status(response)?.text()?;
        let completion: serde_json::Value = serde_json::from_str(&body)
            .map_err(|err| Error::MalformedResponse(format!("expected a JSON completion: {err}")))?;

        completion["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| {
                Error::MalformedResponse("completion is missing message content".to_string())
            })
    }
}

/// The non-file multipart fields for one audio request.
///
/// Optional fields are included only when they carry a non-default value: the
/// prompt only when configured, and the language only for transcription (never
/// translation) and only when it isn't auto-detect.
fn audio_form_fields(opts: &Opts, include_language: bool) -> Vec<(&'static str, String)> {
    let mut fields = vec![
        ("model", opts.model.clone()),
        ("response_format", opts.response_format.as_str().to_string()),
        ("temperature", opts.temperature.to_string()),
    ];

    if let Some(prompt) = &opts.prompt {
        fields.push(("prompt", prompt.clone()));
    }

    if include_language {
        if let Some(language) = &opts.language {
            fields.push(("language", language.clone()));
        }
    }

    fields
}

fn punctuation_prompt(text: &str) -> String {
    format!("Add the punctuation for the following text.\n{text}")
}

/// Map HTTP status classes onto typed failures.
fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status.as_u16() {
        code @ (401 | 403) => Err(Error::Auth { status: code }),
        429 => Err(Error::Quota),
        code => {
            let body = response.text().unwrap_or_default();
            Err(Error::Api { status: code, body })
        }
    }
}
