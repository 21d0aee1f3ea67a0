use std::path::{Path, PathBuf};

use crate::error::Result;

/// Input extensions the normalizer knows how to handle, lower-case, without dots.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "flac", "mp3", "mp4", "mpeg", "mpga", "m4a", "ogg", "wav", "webm",
];

/// One input media file selected for processing. Immutable for the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    /// The bare file name, used for output naming and reporting.
    pub name: String,

    /// Absolute (or working-dir-relative) path handed to the normalizer.
    pub path: PathBuf,
}

/// Whether a file name carries one of the supported extensions (case-insensitive).
pub fn has_supported_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        })
}

/// Collect the input files for a run.
///
/// With a filename, that single file is selected as-is; whether it exists or is
/// convertible is the normalizer's problem, reported per-file rather than up front.
/// Without one, every supported file directly inside `work_dir` is selected,
/// sorted by name so processing order (and therefore dedup and output naming)
/// is deterministic.
pub fn collect_input_files(work_dir: &Path, filename: Option<&str>) -> Result<Vec<InputFile>> {
    if let Some(name) = filename {
        return Ok(vec![InputFile {
            name: name.to_string(),
            path: work_dir.join(name),
        }]);
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(work_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }

        let Ok(name) = entry.file_name().into_string() else {
            // Non-UTF-8 names can't be matched against the extension list; skip them.
            continue;
        };

        if has_supported_extension(&name) {
            files.push(InputFile {
                name,
                path: entry.path(),
            });
        }
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}
