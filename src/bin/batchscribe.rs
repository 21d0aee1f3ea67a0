use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use batchscribe::config::Config;
use batchscribe::logging;
use batchscribe::normalize::FfmpegNormalizer;
use batchscribe::openai::OpenAiClient;
use batchscribe::pipeline::{MAX_UPLOAD_BYTES, Pipeline, PipelineSettings};
use batchscribe::scan::{self, collect_input_files};

#[derive(Parser, Debug)]
#[command(name = "batchscribe")]
#[command(about = "Batch-transcribe audio and video files with a remote speech-to-text service")]
struct Params {
    /// Path to the TOML configuration file (generated with defaults when missing).
    #[arg(short = 'c', long = "config", default_value = "batchscribe.toml")]
    pub config_path: PathBuf,

    /// Directory containing the input media files. Prompted for when omitted.
    #[arg(short = 'd', long = "dir")]
    pub work_dir: Option<PathBuf>,

    /// A single file to transcribe instead of every supported file.
    #[arg(short = 'f', long = "file")]
    pub file: Option<String>,

    /// Answer the prompts with their defaults (current directory, all files).
    #[arg(short = 'y', long = "yes", default_value_t = false)]
    pub assume_defaults: bool,
}

fn main() -> Result<()> {
    logging::init();
    let params = Params::parse();

    let config = Config::load_or_init(&params.config_path)?;
    let resolved = config.resolve()?;

    print_banner();

    let work_dir = match params.work_dir {
        Some(dir) => dir,
        None if params.assume_defaults => std::env::current_dir()?,
        None => prompt_work_dir()?,
    };

    let file = match params.file {
        Some(name) => Some(name),
        None if params.assume_defaults => None,
        None => prompt_filename()?,
    };

    let files = collect_input_files(&work_dir, file.as_deref())?;
    if files.is_empty() {
        println!("No supported input files found in {}", work_dir.display());
        return Ok(());
    }

    let client = OpenAiClient::new(resolved.api_key.clone())?;
    let normalizer = FfmpegNormalizer;
    let settings = PipelineSettings::for_work_dir(&work_dir);

    let report = Pipeline::new(settings, &resolved.opts, &normalizer, &client, &client)
        .run(&files)?;

    println!(
        "\nProcessed {} file(s): {} transcribed, {} warning(s).",
        report.records.len(),
        report.transcribed(),
        report.warnings
    );
    Ok(())
}

fn print_banner() {
    println!("Upload limit: {} MiB per normalized file", MAX_UPLOAD_BYTES / (1024 * 1024));
    println!(
        "Supported input types: {}",
        scan::SUPPORTED_EXTENSIONS.join(", ")
    );
    println!();
}

fn prompt_work_dir() -> Result<PathBuf> {
    let answer = prompt("Directory with your media files (empty = current directory): ")?;
    if answer.is_empty() {
        Ok(std::env::current_dir()?)
    } else {
        Ok(PathBuf::from(answer))
    }
}

fn prompt_filename() -> Result<Option<String>> {
    let answer = prompt("File to transcribe (empty = every supported file): ")?;
    Ok((!answer.is_empty()).then_some(answer))
}

fn prompt(message: &str) -> Result<String> {
    print!("{message}");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
