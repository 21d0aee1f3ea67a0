//! Media normalization via an external `ffmpeg` process.
//!
//! The rest of the pipeline only ever sees canonical audio: mono, 16 kHz, 16-bit
//! PCM WAV. Everything format-related (codecs, containers, video tracks) is
//! delegated to `ffmpeg`, which we treat as a black box with a narrow contract:
//! given an input path, produce the canonical WAV at the output path, or fail.

use std::path::Path;
use std::process::Command;

use crate::error::{Error, Result};

/// Sample rate of normalized audio.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Converts one input media file into canonical WAV audio.
///
/// This is a seam: the pipeline is generic over it so tests can substitute a
/// normalizer that fabricates output (or fails on demand) without spawning
/// processes.
pub trait Normalizer {
    /// Produce a mono/16kHz/16-bit WAV at `output` from the media file at `input`.
    ///
    /// Implementations must either leave a valid file at `output` or return an
    /// error; a missing output after an apparent success is an error too.
    fn normalize(&self, input: &Path, output: &Path) -> Result<()>;
}

/// The production [`Normalizer`], shelling out to `ffmpeg`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegNormalizer;

impl Normalizer for FfmpegNormalizer {
    fn normalize(&self, input: &Path, output: &Path) -> Result<()> {
        let result = Command::new("ffmpeg")
            .arg("-loglevel")
            .arg("error")
            .arg("-i")
            .arg(input)
            .args(["-ac", "1", "-ar", "16000", "-sample_fmt", "s16"])
            .arg(output)
            .output();

        let input_name = input.display().to_string();

        let process_output = match result {
            Ok(process_output) => process_output,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::Normalize {
                    input: input_name,
                    reason: "ffmpeg not found; install ffmpeg and ensure it is on PATH"
                        .to_string(),
                });
            }
            Err(err) => {
                return Err(Error::Normalize {
                    input: input_name,
                    reason: format!("failed to run ffmpeg: {err}"),
                });
            }
        };

        if !process_output.status.success() {
            let stderr = String::from_utf8_lossy(&process_output.stderr);
            return Err(Error::Normalize {
                input: input_name,
                reason: format!(
                    "ffmpeg exited with {}: {}",
                    process_output.status,
                    stderr.trim()
                ),
            });
        }

        if !output.is_file() {
            return Err(Error::Normalize {
                input: input_name,
                reason: "ffmpeg reported success but produced no output file".to_string(),
            });
        }

        verify_wav_contract(output)
    }
}

/// Check that a file honors the canonical-audio contract: mono, 16 kHz, 16-bit PCM.
///
/// Enforcing constraints here keeps downstream byte-size comparisons and uploads
/// simple and predictable.
pub fn verify_wav_contract(path: &Path) -> Result<()> {
    let fail = |reason: String| Error::Normalize {
        input: path.display().to_string(),
        reason,
    };

    let reader =
        hound::WavReader::open(path).map_err(|err| fail(format!("unreadable WAV: {err}")))?;
    let spec = reader.spec();

    if spec.channels != 1 {
        return Err(fail(format!(
            "expected mono WAV (1 channel), got {} channels",
            spec.channels
        )));
    }

    if spec.sample_rate != TARGET_SAMPLE_RATE {
        return Err(fail(format!(
            "expected {TARGET_SAMPLE_RATE} Hz sample rate, got {} Hz",
            spec.sample_rate
        )));
    }

    if spec.bits_per_sample != 16 || spec.sample_format != hound::SampleFormat::Int {
        return Err(fail(format!(
            "expected 16-bit integer PCM, got {}-bit {:?}",
            spec.bits_per_sample, spec.sample_format
        )));
    }

    Ok(())
}
