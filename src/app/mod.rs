use crate::domain::{
    Detection, ERROR_TEXT, ERROR_TOOLTIP, LOADING_TEXT, REFRESHING_TEXT, StatusView,
    confirmed_text, make_status_view,
};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const DETECTING_TOOLTIP: &str = "Detecting Claude model";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WatchConfig {
    pub interval: Duration,
    pub debounce: Duration,
    pub confirm: Duration,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            debounce: Duration::from_millis(500),
            confirm: Duration::from_millis(1000),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RefreshKind {
    Initial,
    Periodic,
    Changed,
    Manual,
}

impl RefreshKind {
    pub fn is_manual(self) -> bool {
        self == Self::Manual
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Indicator {
    Loading,
    Ready(StatusView),
    Refreshing {
        previous: Option<StatusView>,
        manual: bool,
    },
    Error(String),
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct IndicatorView {
    pub state: &'static str,
    pub text: String,
    pub tooltip: String,
    pub model: Option<String>,
}

#[derive(Clone, Debug)]
pub struct StatusModel {
    pub config: WatchConfig,
    pub indicator: Indicator,
    pub refresh_count: u64,
    in_flight: Option<RefreshKind>,
    queued_manual: bool,
    debounce_deadline: Option<Instant>,
    next_periodic_at: Option<Instant>,
    confirm_until: Option<Instant>,
}

impl StatusModel {
    pub fn new(config: WatchConfig) -> Self {
        Self {
            config,
            indicator: Indicator::Loading,
            refresh_count: 0,
            in_flight: None,
            queued_manual: false,
            debounce_deadline: None,
            next_periodic_at: None,
            confirm_until: None,
        }
    }

    pub fn is_refreshing(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn view(&self) -> IndicatorView {
        match &self.indicator {
            Indicator::Loading => IndicatorView {
                state: "loading",
                text: LOADING_TEXT.to_string(),
                tooltip: DETECTING_TOOLTIP.to_string(),
                model: None,
            },
            Indicator::Ready(status) => IndicatorView {
                state: "ready",
                text: if self.confirm_until.is_some() {
                    confirmed_text(&status.text)
                } else {
                    status.text.clone()
                },
                tooltip: status.tooltip.clone(),
                model: status.model.clone(),
            },
            Indicator::Refreshing { previous, manual } => {
                let text = match (*manual, previous) {
                    (true, _) => REFRESHING_TEXT.to_string(),
                    (false, Some(previous)) => previous.text.clone(),
                    (false, None) => LOADING_TEXT.to_string(),
                };
                IndicatorView {
                    state: "refreshing",
                    text,
                    tooltip: previous
                        .as_ref()
                        .map(|previous| previous.tooltip.clone())
                        .unwrap_or_else(|| DETECTING_TOOLTIP.to_string()),
                    model: previous.as_ref().and_then(|previous| previous.model.clone()),
                }
            }
            Indicator::Error(_) => IndicatorView {
                state: "error",
                text: ERROR_TEXT.to_string(),
                tooltip: ERROR_TOOLTIP.to_string(),
                model: None,
            },
        }
    }
}

#[derive(Clone, Debug)]
pub enum AppEvent {
    Start,
    Tick,
    LogDirChanged,
    RefreshRequested,
    RefreshFinished(Result<Detection, String>),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AppCommand {
    None,
    StartRefresh(RefreshKind),
}

pub fn update(model: StatusModel, event: AppEvent, now: Instant) -> (StatusModel, AppCommand) {
    match event {
        AppEvent::Start => start_refresh(model, RefreshKind::Initial),
        AppEvent::Tick => update_on_tick(model, now),
        AppEvent::LogDirChanged => {
            let mut model = model;
            model.debounce_deadline = now.checked_add(model.config.debounce);
            (model, AppCommand::None)
        }
        AppEvent::RefreshRequested => {
            if model.is_refreshing() {
                let mut model = model;
                model.queued_manual = true;
                return (model, AppCommand::None);
            }
            start_refresh(model, RefreshKind::Manual)
        }
        AppEvent::RefreshFinished(result) => update_on_finished(model, result, now),
    }
}

fn update_on_tick(model: StatusModel, now: Instant) -> (StatusModel, AppCommand) {
    let mut model = model;
    if model.confirm_until.is_some_and(|until| now >= until) {
        model.confirm_until = None;
    }
    if model.is_refreshing() {
        return (model, AppCommand::None);
    }

    if model.debounce_deadline.is_some_and(|due| now >= due) {
        return start_refresh(model, RefreshKind::Changed);
    }
    if model.next_periodic_at.is_some_and(|due| now >= due) {
        return start_refresh(model, RefreshKind::Periodic);
    }

    (model, AppCommand::None)
}

fn update_on_finished(
    model: StatusModel,
    result: Result<Detection, String>,
    now: Instant,
) -> (StatusModel, AppCommand) {
    let mut model = model;
    let Some(kind) = model.in_flight.take() else {
        return (model, AppCommand::None);
    };

    model.indicator = match result {
        Ok(detection) => {
            debug!(?kind, model = ?detection.model, "refresh finished");
            if kind.is_manual() {
                model.confirm_until = now.checked_add(model.config.confirm);
            }
            Indicator::Ready(make_status_view(detection.model))
        }
        Err(message) => {
            warn!(?kind, error = %message, "refresh failed");
            Indicator::Error(message)
        }
    };
    // An interval past the clock's range never fires.
    model.next_periodic_at = now.checked_add(model.config.interval);

    if model.queued_manual {
        model.queued_manual = false;
        return start_refresh(model, RefreshKind::Manual);
    }

    (model, AppCommand::None)
}

fn start_refresh(model: StatusModel, kind: RefreshKind) -> (StatusModel, AppCommand) {
    let mut model = model;
    let manual = kind.is_manual();
    model.indicator = match model.indicator {
        Indicator::Loading if !manual => Indicator::Loading,
        Indicator::Error(message) if !manual => Indicator::Error(message),
        Indicator::Loading | Indicator::Error(_) => Indicator::Refreshing {
            previous: None,
            manual,
        },
        Indicator::Ready(previous) => Indicator::Refreshing {
            previous: Some(previous),
            manual,
        },
        Indicator::Refreshing { previous, .. } => Indicator::Refreshing { previous, manual },
    };
    model.in_flight = Some(kind);
    model.debounce_deadline = None;
    model.next_periodic_at = None;
    model.confirm_until = None;
    model.refresh_count += 1;
    (model, AppCommand::StartRefresh(kind))
}
