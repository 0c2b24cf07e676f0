use crate::app::WatchConfig;
use crate::domain::{LogFileCandidate, ModelSource, status_text, tooltip_text};
use crate::infra::{DetectError, ModelDetector};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CliOptions {
    pub project: Option<PathBuf>,
    pub verbose: bool,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CliInvocation {
    PrintHelp,
    PrintVersion,
    Run {
        options: CliOptions,
        command: CliCommand,
    },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CliCommand {
    Watch { config: WatchConfig, json: bool },
    Status { json: bool },
    Model,
    Files,
    Dir,
}

#[derive(Debug, Error)]
pub enum CliParseError {
    #[error("unknown subcommand: {0}")]
    UnknownSubcommand(String),

    #[error("unknown flag: {0}")]
    UnknownFlag(String),

    #[error("missing value for flag: {0}")]
    MissingFlagValue(String),

    #[error("invalid value for {flag}: {value}")]
    InvalidFlagValue { flag: String, value: String },

    #[error("unexpected argument: {0}")]
    UnexpectedArgument(String),
}

pub fn parse_invocation(args: &[String]) -> Result<CliInvocation, CliParseError> {
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        return Ok(CliInvocation::PrintHelp);
    }
    if args.iter().any(|arg| arg == "--version" || arg == "-V") {
        return Ok(CliInvocation::PrintVersion);
    }

    let mut options = CliOptions::default();
    let mut subcommand: Option<String> = None;
    let mut json = false;
    let mut interval: Option<Duration> = None;
    let mut debounce: Option<Duration> = None;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--project" | "-p" => {
                let value = iter
                    .next()
                    .ok_or_else(|| CliParseError::MissingFlagValue("--project".to_string()))?;
                options.project = Some(PathBuf::from(value));
            }
            "--verbose" | "-v" => options.verbose = true,
            "--json" => json = true,
            "--interval" => {
                let value = iter
                    .next()
                    .ok_or_else(|| CliParseError::MissingFlagValue("--interval".to_string()))?;
                let secs = parse_bounded_flag("--interval", value, MAX_INTERVAL_SECS)?;
                interval = Some(Duration::from_secs(secs));
            }
            "--debounce" => {
                let value = iter
                    .next()
                    .ok_or_else(|| CliParseError::MissingFlagValue("--debounce".to_string()))?;
                let millis = parse_bounded_flag("--debounce", value, MAX_DEBOUNCE_MS)?;
                debounce = Some(Duration::from_millis(millis));
            }
            _ if arg.starts_with('-') => {
                return Err(CliParseError::UnknownFlag(arg.to_string()));
            }
            _ if subcommand.is_none() => subcommand = Some(arg.to_string()),
            _ => return Err(CliParseError::UnexpectedArgument(arg.to_string())),
        }
    }

    let subcommand = subcommand.unwrap_or_else(|| "watch".to_string());
    if subcommand != "watch" {
        if interval.is_some() {
            return Err(CliParseError::UnknownFlag("--interval".to_string()));
        }
        if debounce.is_some() {
            return Err(CliParseError::UnknownFlag("--debounce".to_string()));
        }
    }
    if json && !matches!(subcommand.as_str(), "watch" | "status") {
        return Err(CliParseError::UnknownFlag("--json".to_string()));
    }

    let command = match subcommand.as_str() {
        "watch" => {
            let defaults = WatchConfig::default();
            CliCommand::Watch {
                config: WatchConfig {
                    interval: interval.unwrap_or(defaults.interval),
                    debounce: debounce.unwrap_or(defaults.debounce),
                    confirm: defaults.confirm,
                },
                json,
            }
        }
        "status" => CliCommand::Status { json },
        "model" => CliCommand::Model,
        "files" => CliCommand::Files,
        "dir" => CliCommand::Dir,
        other => return Err(CliParseError::UnknownSubcommand(other.to_string())),
    };

    Ok(CliInvocation::Run { options, command })
}

/// One day; longer periods are indistinguishable from "never" for a status line.
const MAX_INTERVAL_SECS: u64 = 86_400;
const MAX_DEBOUNCE_MS: u64 = 60_000;

fn parse_bounded_flag(flag: &str, value: &str, max: u64) -> Result<u64, CliParseError> {
    match value.parse::<u64>() {
        Ok(parsed) if (1..=max).contains(&parsed) => Ok(parsed),
        _ => Err(CliParseError::InvalidFlagValue {
            flag: flag.to_string(),
            value: value.to_string(),
        }),
    }
}

#[derive(Debug, Error)]
pub enum CliRunError {
    #[error(transparent)]
    Detect(#[from] DetectError),

    #[error("failed to write output: {0}")]
    Write(#[from] io::Error),

    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("model not detected")]
    ModelNotDetected,

    #[error("no project directory (pass --project PATH)")]
    NoProject,
}

#[derive(Debug, Serialize)]
struct StatusReport<'a> {
    text: String,
    tooltip: String,
    model: Option<&'a str>,
    source: Option<&'a ModelSource>,
    log_dir: Option<PathBuf>,
}

/// Runs a one-shot command; `watch` is driven by the main loop instead.
pub fn run(command: CliCommand, detector: &ModelDetector) -> Result<(), CliRunError> {
    let mut out = io::stdout().lock();
    run_to(command, detector, &mut out)
}

pub fn run_to<W: Write>(
    command: CliCommand,
    detector: &ModelDetector,
    out: &mut W,
) -> Result<(), CliRunError> {
    match command {
        CliCommand::Watch { .. } => Ok(()),
        CliCommand::Status { json } => {
            let detection = detector.detect()?;
            let report = StatusReport {
                text: status_text(detection.model.as_deref()),
                tooltip: tooltip_text(detection.model.as_deref()),
                model: detection.model.as_deref(),
                source: detection.source.as_ref(),
                log_dir: detector.log_dir()?,
            };
            if json {
                writeln!(out, "{}", serde_json::to_string(&report)?)?;
                return Ok(());
            }

            writeln!(out, "{}", report.text)?;
            if let Some(source) = report.source {
                writeln!(out, "{}\t{}", source.label(), source.path().display())?;
            }
            Ok(())
        }
        CliCommand::Model => {
            let Some(model) = detector.detect()?.model else {
                return Err(CliRunError::ModelNotDetected);
            };
            writeln!(out, "{model}")?;
            Ok(())
        }
        CliCommand::Files => {
            for candidate in detector.log_files()? {
                writeln!(out, "{}", format_candidate_row(&candidate))?;
            }
            Ok(())
        }
        CliCommand::Dir => {
            let Some(dir) = detector.log_dir()? else {
                return Err(CliRunError::NoProject);
            };
            writeln!(out, "{}", dir.display())?;
            Ok(())
        }
    }
}

fn format_candidate_row(candidate: &LogFileCandidate) -> String {
    let modified = candidate
        .modified
        .and_then(system_time_to_rfc3339)
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{modified}\t{}\t{}",
        candidate.size_bytes,
        candidate.path.display()
    )
}

fn system_time_to_rfc3339(value: SystemTime) -> Option<String> {
    let timestamp = OffsetDateTime::from(value);
    timestamp.format(&Rfc3339).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::ClaudePaths;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    fn run_command(command: CliCommand, detector: &ModelDetector) -> Result<String, CliRunError> {
        let mut out = Vec::new();
        run_to(command, detector, &mut out)?;
        Ok(String::from_utf8(out).expect("utf8"))
    }

    fn detector(root: &Path) -> ModelDetector {
        ModelDetector::new(Some(PathBuf::from("/srv/app")))
            .with_paths(ClaudePaths::from_root(root.to_path_buf()))
    }

    #[test]
    fn parse_defaults_to_watch() {
        let parsed = parse_invocation(&args(&["ccmodel"])).expect("parse");
        assert_eq!(
            parsed,
            CliInvocation::Run {
                options: CliOptions::default(),
                command: CliCommand::Watch {
                    config: WatchConfig::default(),
                    json: false
                },
            }
        );
    }

    #[test]
    fn parse_help_flag_wins() {
        let parsed = parse_invocation(&args(&["ccmodel", "status", "--help"])).expect("parse");
        assert_eq!(parsed, CliInvocation::PrintHelp);
    }

    #[test]
    fn parse_watch_timing_flags() {
        let parsed = parse_invocation(&args(&[
            "ccmodel",
            "--project",
            "/srv/app",
            "watch",
            "--interval",
            "5",
            "--debounce",
            "250",
            "--json",
        ]))
        .expect("parse");
        let CliInvocation::Run { options, command } = parsed else {
            panic!("expected run");
        };
        assert_eq!(options.project, Some(PathBuf::from("/srv/app")));
        assert_eq!(
            command,
            CliCommand::Watch {
                config: WatchConfig {
                    interval: Duration::from_secs(5),
                    debounce: Duration::from_millis(250),
                    confirm: WatchConfig::default().confirm,
                },
                json: true,
            }
        );
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(matches!(
            parse_invocation(&args(&["ccmodel", "bogus"])),
            Err(CliParseError::UnknownSubcommand(_))
        ));
        assert!(matches!(
            parse_invocation(&args(&["ccmodel", "status", "--interval", "5"])),
            Err(CliParseError::UnknownFlag(_))
        ));
        assert!(matches!(
            parse_invocation(&args(&["ccmodel", "watch", "--interval", "0"])),
            Err(CliParseError::InvalidFlagValue { .. })
        ));
        assert!(matches!(
            parse_invocation(&args(&["ccmodel", "watch", "--interval", "18446744073709551615"])),
            Err(CliParseError::InvalidFlagValue { .. })
        ));
        assert!(matches!(
            parse_invocation(&args(&["ccmodel", "watch", "--interval", "86401"])),
            Err(CliParseError::InvalidFlagValue { .. })
        ));
        assert!(matches!(
            parse_invocation(&args(&["ccmodel", "watch", "--debounce", "60001"])),
            Err(CliParseError::InvalidFlagValue { .. })
        ));
        assert!(matches!(
            parse_invocation(&args(&["ccmodel", "model", "--json"])),
            Err(CliParseError::UnknownFlag(_))
        ));
        assert!(matches!(
            parse_invocation(&args(&["ccmodel", "--project"])),
            Err(CliParseError::MissingFlagValue(_))
        ));
        assert!(matches!(
            parse_invocation(&args(&["ccmodel", "status", "extra"])),
            Err(CliParseError::UnexpectedArgument(_))
        ));
    }

    #[test]
    fn status_prints_text_and_source() {
        let root = tempdir().expect("tempdir");
        let settings = root.path().join("settings.json");
        fs::write(&settings, r#"{"model":"claude-haiku-3-y"}"#).expect("write");

        let out = run_command(CliCommand::Status { json: false }, &detector(root.path()))
            .expect("status");
        assert_eq!(out, format!("⚡ Haiku 3\nsettings\t{}\n", settings.display()));
    }

    #[test]
    fn status_json_reports_not_detected() {
        let root = tempdir().expect("tempdir");
        let out = run_command(CliCommand::Status { json: true }, &detector(root.path()))
            .expect("status");
        let value: serde_json::Value = serde_json::from_str(out.trim()).expect("json");
        assert_eq!(value["text"], "Claude: Not detected");
        assert!(value["model"].is_null());
        assert_eq!(
            value["log_dir"],
            root.path().join("projects").join("-srv-app").display().to_string()
        );
    }

    #[test]
    fn model_requires_a_detection() {
        let root = tempdir().expect("tempdir");
        assert!(matches!(
            run_command(CliCommand::Model, &detector(root.path())),
            Err(CliRunError::ModelNotDetected)
        ));

        fs::write(root.path().join("settings.json"), r#"{"model":"claude-opus-4-x"}"#)
            .expect("write");
        let out = run_command(CliCommand::Model, &detector(root.path())).expect("model");
        assert_eq!(out, "claude-opus-4-x\n");
    }

    #[test]
    fn files_lists_candidates() {
        let root = tempdir().expect("tempdir");
        let dir = root.path().join("projects").join("-srv-app");
        fs::create_dir_all(&dir).expect("mkdirs");
        fs::write(dir.join("a.jsonl"), "{}\n").expect("write");

        let out = run_command(CliCommand::Files, &detector(root.path())).expect("files");
        let row: Vec<&str> = out.trim_end().split('\t').collect();
        assert_eq!(row.len(), 3);
        assert_eq!(row[1], "3");
        assert_eq!(row[2], dir.join("a.jsonl").display().to_string());
    }

    #[test]
    fn dir_needs_a_project() {
        let root = tempdir().expect("tempdir");
        let detector =
            ModelDetector::new(None).with_paths(ClaudePaths::from_root(root.path().to_path_buf()));
        assert!(matches!(
            run_command(CliCommand::Dir, &detector),
            Err(CliRunError::NoProject)
        ));
    }
}
