use crate::domain::{Detection, LogFileCandidate, ModelSource, status_text};
use crate::infra::{
    ClaudePaths, ResolveClaudePathsError, extract_model_from_logs, list_log_files,
    load_settings_model, resolve_claude_paths,
};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum DetectError {
    #[error(transparent)]
    Paths(#[from] ResolveClaudePathsError),
}

/// Resolves the project whose logs should be inspected: an explicit path (made
/// absolute against the working directory) or the working directory itself.
pub fn resolve_current_project(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) if path.is_absolute() => Some(path.to_path_buf()),
        Some(path) => std::env::current_dir().ok().map(|cwd| cwd.join(path)),
        None => std::env::current_dir().ok(),
    }
}

#[derive(Clone, Debug)]
pub struct ModelDetector {
    project: Option<PathBuf>,
    paths: Option<ClaudePaths>,
}

impl ModelDetector {
    pub fn new(project: Option<PathBuf>) -> Self {
        Self {
            project,
            paths: None,
        }
    }

    pub fn with_paths(mut self, paths: ClaudePaths) -> Self {
        self.paths = Some(paths);
        self
    }

    pub fn project(&self) -> Option<&Path> {
        self.project.as_deref()
    }

    pub fn paths(&self) -> Result<ClaudePaths, DetectError> {
        match &self.paths {
            Some(paths) => Ok(paths.clone()),
            None => Ok(resolve_claude_paths()?),
        }
    }

    pub fn log_dir(&self) -> Result<Option<PathBuf>, DetectError> {
        Ok(self.paths()?.project_log_dir(self.project()))
    }

    pub fn log_files(&self) -> Result<Vec<LogFileCandidate>, DetectError> {
        let Some(dir) = self.log_dir()? else {
            debug!("no project known, nothing to search");
            return Ok(Vec::new());
        };
        Ok(list_log_files(&dir))
    }

    pub fn detect(&self) -> Result<Detection, DetectError> {
        let paths = self.paths()?;
        let candidates = match paths.project_log_dir(self.project()) {
            Some(dir) => {
                debug!(project = ?self.project, dir = %dir.display(), "resolved log directory");
                list_log_files(&dir)
            }
            None => Vec::new(),
        };

        if let Some((model, path)) = extract_model_from_logs(&candidates) {
            return Ok(Detection::found(model, ModelSource::Log { path }));
        }

        debug!("no model found in logs, trying settings fallback");
        match load_settings_model(&paths.settings_path) {
            Some(model) => Ok(Detection::found(
                model,
                ModelSource::Settings {
                    path: paths.settings_path,
                },
            )),
            None => Ok(Detection::not_detected()),
        }
    }

    pub fn current_model(&self) -> Option<String> {
        match self.detect() {
            Ok(detection) => detection.model,
            Err(error) => {
                warn!(%error, "failed to detect current model");
                None
            }
        }
    }

    pub fn status_text(&self) -> String {
        status_text(self.current_model().as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const PROJECT: &str = "/work/github.com/acme/app";

    fn detector(root: &Path) -> ModelDetector {
        ModelDetector::new(Some(PathBuf::from(PROJECT)))
            .with_paths(ClaudePaths::from_root(root.to_path_buf()))
    }

    fn project_dir(root: &Path) -> PathBuf {
        let dir = root.join("projects").join("-work-github-com-acme-app");
        fs::create_dir_all(&dir).expect("mkdirs");
        dir
    }

    #[test]
    fn model_comes_from_latest_log() {
        let root = tempdir().expect("tempdir");
        let log = project_dir(root.path()).join("s1.jsonl");
        fs::write(
            &log,
            concat!(
                r#"{"type":"user","message":{"role":"user","content":"hi"}}"#,
                "\n",
                r#"{"type":"assistant","message":{"role":"assistant","model":"claude-sonnet-4-20250514"}}"#,
                "\n",
                r#"{"type":"assistant","message":{"role":"assistant","model":"claude-opus-4-x"}}"#,
                "\n",
            ),
        )
        .expect("write");
        fs::write(root.path().join("settings.json"), r#"{"model":"claude-haiku-3-y"}"#)
            .expect("write");

        let detection = detector(root.path()).detect().expect("detect");
        assert_eq!(detection.model.as_deref(), Some("claude-opus-4-x"));
        assert_eq!(detection.source, Some(ModelSource::Log { path: log }));
        assert_eq!(detector(root.path()).status_text(), "⚡ Opus 4");
    }

    #[test]
    fn falls_back_to_settings() {
        let root = tempdir().expect("tempdir");
        fs::write(
            project_dir(root.path()).join("s1.jsonl"),
            r#"{"type":"user","message":{"role":"user","content":"hi"}}"#,
        )
        .expect("write");
        let settings = root.path().join("settings.json");
        fs::write(&settings, r#"{"model":"claude-haiku-3-y"}"#).expect("write");

        let detection = detector(root.path()).detect().expect("detect");
        assert_eq!(detection.model.as_deref(), Some("claude-haiku-3-y"));
        assert_eq!(detection.source, Some(ModelSource::Settings { path: settings }));
        assert_eq!(
            detector(root.path()).current_model(),
            Some("claude-haiku-3-y".to_string())
        );
    }

    #[test]
    fn nothing_found_is_not_detected() {
        let root = tempdir().expect("tempdir");
        let detector = detector(root.path());
        assert_eq!(detector.detect().expect("detect"), Detection::not_detected());
        assert_eq!(detector.current_model(), None);
        assert_eq!(detector.status_text(), "Claude: Not detected");

        fs::write(root.path().join("settings.json"), r#"{"theme":"dark"}"#).expect("write");
        assert_eq!(detector.current_model(), None);
    }

    #[test]
    fn unknown_project_still_consults_settings() {
        let root = tempdir().expect("tempdir");
        fs::write(root.path().join("settings.json"), r#"{"model":"claude-opus-4-1"}"#)
            .expect("write");
        let paths = ClaudePaths::from_root(root.path().to_path_buf());
        let detector = ModelDetector::new(None).with_paths(paths);
        assert_eq!(detector.log_dir().expect("dir"), None);
        assert!(detector.log_files().expect("files").is_empty());
        assert_eq!(detector.current_model(), Some("claude-opus-4-1".to_string()));
    }

    #[test]
    fn explicit_absolute_project_is_kept() {
        assert_eq!(
            resolve_current_project(Some(Path::new(PROJECT))),
            Some(PathBuf::from(PROJECT))
        );
    }
}
