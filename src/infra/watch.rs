use notify::event::{EventKind, ModifyKind};
use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, Sender, channel};
use thiserror::Error;

/// What the loop learns from the log directory watcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WatchSignal {
    /// A conversation log directly inside the directory changed.
    Changed,
    /// The directory itself was removed or renamed; the watch is dead.
    DirGone,
    Error(String),
}

/// A non-recursive watch on one project log directory.
#[derive(Debug)]
pub struct LogDirWatcher {
    _watcher: RecommendedWatcher,
    dir: PathBuf,
    rx: Receiver<WatchSignal>,
}

impl LogDirWatcher {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn try_recv(&self) -> Option<WatchSignal> {
        self.rx.try_recv().ok()
    }
}

#[derive(Debug, Error)]
pub enum WatchLogDirError {
    #[error("failed to watch log directory {dir}: {source}")]
    Notify {
        dir: PathBuf,
        #[source]
        source: notify::Error,
    },
}

pub fn watch_log_dir(dir: &Path) -> Result<LogDirWatcher, WatchLogDirError> {
    let (tx, rx) = channel::<WatchSignal>();
    let handler_dir = dir.to_path_buf();
    let notify_error = |source| WatchLogDirError::Notify {
        dir: dir.to_path_buf(),
        source,
    };

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<notify::Event>| forward(&handler_dir, res, &tx),
        Config::default(),
    )
    .map_err(notify_error)?;
    watcher
        .watch(dir, RecursiveMode::NonRecursive)
        .map_err(notify_error)?;

    Ok(LogDirWatcher {
        _watcher: watcher,
        dir: dir.to_path_buf(),
        rx,
    })
}

fn forward(dir: &Path, res: notify::Result<notify::Event>, tx: &Sender<WatchSignal>) {
    let signal = match res {
        Ok(event) => classify_event(dir, &event),
        Err(error) => Some(WatchSignal::Error(error.to_string())),
    };
    if let Some(signal) = signal {
        let _ = tx.send(signal);
    }
}

/// Maps a raw event on `dir` to the signal the refresh loop cares about.
pub fn classify_event(dir: &Path, event: &notify::Event) -> Option<WatchSignal> {
    if matches!(event.kind, EventKind::Access(_)) {
        return None;
    }

    let dir_moved_or_removed = matches!(
        event.kind,
        EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(_))
    ) && event.paths.iter().any(|path| path == dir);
    if dir_moved_or_removed {
        return Some(WatchSignal::DirGone);
    }

    // Some backends cannot tell which entry changed.
    if event.paths.is_empty() {
        return Some(WatchSignal::Changed);
    }

    event
        .paths
        .iter()
        .any(|path| is_log_in(dir, path))
        .then_some(WatchSignal::Changed)
}

fn is_log_in(dir: &Path, path: &Path) -> bool {
    path.parent() == Some(dir) && path.extension().is_some_and(|ext| ext == "jsonl")
}
