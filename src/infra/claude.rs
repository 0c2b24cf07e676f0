use crate::domain::LogFileCandidate;
use dirs::home_dir;
use std::cmp::Reverse;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use tracing::{debug, warn};

const LOG_FILE_EXTENSION: &str = "jsonl";
const SETTINGS_FILE_NAME: &str = "settings.json";
const DIR_NAME_SEPARATOR: char = '-';

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClaudePaths {
    pub root_dir: PathBuf,
    pub projects_dir: PathBuf,
    pub settings_path: PathBuf,
}

impl ClaudePaths {
    pub fn from_root(root_dir: PathBuf) -> Self {
        Self {
            projects_dir: root_dir.join("projects"),
            settings_path: root_dir.join(SETTINGS_FILE_NAME),
            root_dir,
        }
    }

    pub fn project_log_dir(&self, project: Option<&Path>) -> Option<PathBuf> {
        project_log_dir(&self.projects_dir, project)
    }
}

#[derive(Debug, Error)]
pub enum ResolveClaudePathsError {
    #[error("home directory not found")]
    HomeDirNotFound,
}

pub fn resolve_claude_root_dir() -> Result<PathBuf, ResolveClaudePathsError> {
    if let Some(override_dir) = std::env::var_os("CLAUDE_CONFIG_DIR") {
        return Ok(PathBuf::from(override_dir));
    }

    let Some(home) = home_dir() else {
        return Err(ResolveClaudePathsError::HomeDirNotFound);
    };

    Ok(home.join(".claude"))
}

pub fn resolve_claude_paths() -> Result<ClaudePaths, ResolveClaudePathsError> {
    let mut paths = ClaudePaths::from_root(resolve_claude_root_dir()?);
    if let Some(override_dir) = std::env::var_os("CLAUDE_PROJECTS_DIR") {
        paths.projects_dir = PathBuf::from(override_dir);
    }
    Ok(paths)
}

/// Lexical normalization: drops `.` components, folds `..` into the preceding
/// component and strips trailing separators. Never touches the filesystem.
pub fn normalize_project_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let last_is_normal = matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                );
                if last_is_normal {
                    normalized.pop();
                } else if !normalized.has_root() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// `/Users/aki/src/github.com/aki77/project` -> `-Users-aki-src-github-com-aki77-project`
pub fn project_log_dir_name(project: &Path) -> String {
    normalize_project_path(project)
        .to_string_lossy()
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | '.' => DIR_NAME_SEPARATOR,
            other => other,
        })
        .collect()
}

pub fn project_log_dir(projects_dir: &Path, project: Option<&Path>) -> Option<PathBuf> {
    let project = project.filter(|path| !path.as_os_str().is_empty())?;
    Some(projects_dir.join(project_log_dir_name(project)))
}

pub fn list_log_files(dir: &Path) -> Vec<LogFileCandidate> {
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "log directory not found");
        return Vec::new();
    }

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) => {
            warn!(dir = %dir.display(), %error, "failed to read log directory");
            return Vec::new();
        }
    };

    let mut candidates: Vec<LogFileCandidate> = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(LOG_FILE_EXTENSION) {
            continue;
        }
        let Ok(metadata) = fs::metadata(&path) else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        candidates.push(LogFileCandidate {
            path,
            modified: metadata.modified().ok(),
            size_bytes: metadata.len(),
        });
    }

    candidates.sort_by_key(|candidate| {
        Reverse(candidate.modified.unwrap_or(SystemTime::UNIX_EPOCH))
    });
    debug!(dir = %dir.display(), count = candidates.len(), "listed log files");
    candidates
}
