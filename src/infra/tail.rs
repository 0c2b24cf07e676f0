use crate::domain::{LogFileCandidate, find_model_in_lines};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Files below this size are scanned in full.
pub const WHOLE_FILE_THRESHOLD_BYTES: u64 = 10_000;
/// Trailing window read from larger files.
pub const TAIL_WINDOW_BYTES: u64 = 50_000;
/// Lines inspected from the trailing window, newest first.
pub const MAX_TAIL_LINES: usize = 100;

/// Decodes the last `window` bytes of the first `size` bytes of `path`.
/// Data appended after `size` was observed is not read.
pub fn read_tail_window(path: &Path, size: u64, window: u64) -> io::Result<String> {
    let mut file = File::open(path)?;
    let start = size.saturating_sub(window);
    file.seek(SeekFrom::Start(start))?;
    let mut buf = Vec::new();
    file.take(size - start).read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Reads the lines worth inspecting for `path`, newest first.
pub fn read_recent_lines(path: &Path) -> io::Result<Vec<String>> {
    let size = std::fs::metadata(path)?.len();
    if size < WHOLE_FILE_THRESHOLD_BYTES {
        let text = read_tail_window(path, size, size)?;
        return Ok(text.split('\n').rev().map(str::to_string).collect());
    }

    let text = read_tail_window(path, size, TAIL_WINDOW_BYTES)?;
    Ok(text
        .split('\n')
        .rev()
        .take(MAX_TAIL_LINES)
        .map(str::to_string)
        .collect())
}

pub fn extract_model_from_log(path: &Path) -> io::Result<Option<String>> {
    let lines = read_recent_lines(path)?;
    Ok(find_model_in_lines(lines.iter().map(String::as_str)))
}

/// Tries candidates in order; a file that cannot be read is skipped.
pub fn extract_model_from_logs(candidates: &[LogFileCandidate]) -> Option<(String, PathBuf)> {
    for candidate in candidates {
        match extract_model_from_log(&candidate.path) {
            Ok(Some(model)) => {
                debug!(path = %candidate.path.display(), %model, "model found in log");
                return Some((model, candidate.path.clone()));
            }
            Ok(None) => {}
            Err(error) => {
                warn!(path = %candidate.path.display(), %error, "failed to read log file");
            }
        }
    }

    None
}
