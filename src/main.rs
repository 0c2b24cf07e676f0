use ccmodel::app::{self, AppCommand, AppEvent, StatusModel, WatchConfig};
use ccmodel::cli::{self, CliCommand, CliInvocation};
use ccmodel::domain::Detection;
use ccmodel::infra::{
    LogDirWatcher, ModelDetector, WatchSignal, resolve_current_project, watch_log_dir,
};
use ccmodel::ui::{IndicatorPrinter, OutputFormat};
use std::io::{self, BufRead, Write};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc::{RecvTimeoutError, Sender, channel};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

const TICK: Duration = Duration::from_millis(100);
const LOG_FILTER_ENV: &str = "CCMODEL_LOG";

#[derive(Debug, Error)]
enum MainError {
    #[error(transparent)]
    Cli(#[from] cli::CliRunError),

    #[error(transparent)]
    Watch(#[from] WatchError),
}

#[derive(Debug, Error)]
enum WatchError {
    #[error("failed to write status: {0}")]
    Write(#[from] io::Error),
}

#[derive(Debug)]
enum LoopSignal {
    RefreshRequested,
    Quit,
    Finished(Result<Detection, String>),
}

fn main() {
    if let Err(error) = run_main() {
        let mut err = io::stderr().lock();
        let _ = writeln!(err, "{error}");
        std::process::exit(1);
    }
}

fn run_main() -> Result<(), MainError> {
    let args = std::env::args().collect::<Vec<_>>();
    let invocation = match cli::parse_invocation(&args) {
        Ok(invocation) => invocation,
        Err(error) => {
            let mut err = io::stderr().lock();
            let _ = writeln!(err, "{error}");
            let _ = writeln!(err);
            print_help();
            std::process::exit(2);
        }
    };

    match invocation {
        CliInvocation::PrintHelp => {
            print_help();
            Ok(())
        }
        CliInvocation::PrintVersion => {
            let mut out = io::stdout().lock();
            let _ = writeln!(out, "{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        CliInvocation::Run { options, command } => {
            init_logging(options.verbose);
            let project = resolve_current_project(options.project.as_deref());
            debug!(?project, "resolved project");
            let detector = ModelDetector::new(project);
            match command {
                CliCommand::Watch { config, json } => {
                    let format = if json {
                        OutputFormat::Json
                    } else {
                        OutputFormat::Plain
                    };
                    run_watch(detector, config, format)?;
                }
                other => cli::run(other, &detector)?,
            }
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let default_directive = if verbose {
        format!("warn,{}=debug", env!("CARGO_PKG_NAME"))
    } else {
        "warn".to_string()
    };
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn print_help() {
    let text = format!(
        "{name} - show the Claude model active for a project\n\nUSAGE:\n  {name} [--project PATH] [--verbose]        Same as `watch`\n  {name} watch [--interval SECS] [--debounce MS] [--json]  Keep a status line updated on stdout\n  {name} status [--json]                     Print the status text once\n  {name} model                               Print the raw model id (exit 1 if not detected)\n  {name} files                               List candidate log files, newest first\n  {name} dir                                 Print the log directory mapped from the project\n  {name} --help | --version\n\nGLOBAL FLAGS:\n  --project PATH  Project to inspect (default: current folder)\n  --verbose       Log diagnostics to stderr\n\nWATCH:\n  --interval SECS  Periodic refresh interval, at most 86400 (default: 30)\n  --debounce MS    Delay after a log change before refreshing, at most 60000 (default: 500)\n  --json           Emit {{state,text,tooltip,model}} objects instead of text\n  Press Enter to refresh now, `q` + Enter to quit.\n\nOUTPUT:\n  files: modified_rfc3339<TAB>size_bytes<TAB>log_path\n\nENV:\n  CLAUDE_CONFIG_DIR    Override Claude root dir (default: ~/.claude)\n  CLAUDE_PROJECTS_DIR  Override Claude projects dir (default: <root>/projects)\n  CCMODEL_LOG          Log filter, e.g. `debug` (default: warn)\n",
        name = env!("CARGO_PKG_NAME")
    );
    let mut out = io::stdout().lock();
    let _ = write!(out, "{text}");
}

fn run_watch(
    detector: ModelDetector,
    config: WatchConfig,
    format: OutputFormat,
) -> Result<(), WatchError> {
    let (tx, rx) = channel::<LoopSignal>();
    spawn_stdin_reader(tx.clone());

    let mut printer = IndicatorPrinter::new(io::stdout(), format);
    let mut watcher: Option<LogDirWatcher> = None;
    let mut model = step(
        StatusModel::new(config),
        AppEvent::Start,
        Instant::now(),
        &detector,
        &tx,
    );
    printer.show(&model.view())?;

    loop {
        let signal = match rx.recv_timeout(TICK) {
            Ok(signal) => Some(signal),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => return Ok(()),
        };

        match signal {
            Some(LoopSignal::Quit) => return Ok(()),
            Some(LoopSignal::RefreshRequested) => {
                model = step(model, AppEvent::RefreshRequested, Instant::now(), &detector, &tx);
            }
            Some(LoopSignal::Finished(result)) => {
                model = step(
                    model,
                    AppEvent::RefreshFinished(result),
                    Instant::now(),
                    &detector,
                    &tx,
                );
                ensure_log_dir_watcher(&detector, &mut watcher);
            }
            None => {}
        }

        let mut watcher_dead = false;
        if let Some(active) = &watcher {
            while let Some(signal) = active.try_recv() {
                match signal {
                    WatchSignal::Changed => {
                        model = step(model, AppEvent::LogDirChanged, Instant::now(), &detector, &tx);
                    }
                    WatchSignal::DirGone => {
                        debug!(dir = %active.dir().display(), "log directory went away");
                        watcher_dead = true;
                        model = step(model, AppEvent::LogDirChanged, Instant::now(), &detector, &tx);
                    }
                    WatchSignal::Error(message) => {
                        let dir = active.dir().display();
                        warn!(dir = %dir, error = %message, "log watcher error");
                        watcher_dead = true;
                        model = step(model, AppEvent::LogDirChanged, Instant::now(), &detector, &tx);
                    }
                }
            }
        }
        // Re-armed by `ensure_log_dir_watcher` once the next refresh finishes.
        if watcher_dead {
            watcher = None;
        }

        model = step(model, AppEvent::Tick, Instant::now(), &detector, &tx);
        printer.show(&model.view())?;
    }
}

fn step(
    model: StatusModel,
    event: AppEvent,
    now: Instant,
    detector: &ModelDetector,
    tx: &Sender<LoopSignal>,
) -> StatusModel {
    let (model, command) = app::update(model, event, now);
    if let AppCommand::StartRefresh(kind) = command {
        debug!(?kind, "starting refresh");
        spawn_refresh(detector.clone(), tx.clone());
    }
    model
}

fn spawn_refresh(detector: ModelDetector, tx: Sender<LoopSignal>) {
    std::thread::spawn(move || {
        let result = match catch_unwind(AssertUnwindSafe(|| detector.detect())) {
            Ok(Ok(detection)) => Ok(detection),
            Ok(Err(error)) => Err(error.to_string()),
            Err(_) => Err("refresh worker panicked".to_string()),
        };
        let _ = tx.send(LoopSignal::Finished(result));
    });
}

// The log directory may only appear once the first conversation starts.
fn ensure_log_dir_watcher(detector: &ModelDetector, watcher: &mut Option<LogDirWatcher>) {
    let dir = match detector.log_dir() {
        Ok(Some(dir)) => dir,
        Ok(None) => return,
        Err(error) => {
            debug!(%error, "log directory unavailable");
            return;
        }
    };

    if !dir.is_dir() {
        *watcher = None;
        return;
    }
    if watcher.as_ref().is_some_and(|active| active.dir() == dir.as_path()) {
        return;
    }

    match watch_log_dir(&dir) {
        Ok(active) => {
            debug!(dir = %dir.display(), "watching log directory");
            *watcher = Some(active);
        }
        Err(error) => {
            warn!(dir = %dir.display(), %error, "auto-refresh on log changes disabled");
        }
    }
}

fn spawn_stdin_reader(tx: Sender<LoopSignal>) {
    std::thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                return;
            };
            let signal = match line.trim() {
                "q" | "quit" => LoopSignal::Quit,
                _ => LoopSignal::RefreshRequested,
            };
            if tx.send(signal).is_err() {
                return;
            }
        }
    });
}
