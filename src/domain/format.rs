use crate::domain::StatusView;

pub const NOT_DETECTED_TEXT: &str = "Claude: Not detected";
pub const LOADING_TEXT: &str = "⟳ Claude: Loading...";
pub const REFRESHING_TEXT: &str = "⟳ Claude: Refreshing...";
pub const ERROR_TEXT: &str = "Claude: Error";
pub const ERROR_TOOLTIP: &str = "Error getting Claude model status";

const MODEL_ICON: &str = "⚡";
const CONFIRM_ICON: &str = "✓";

// Ordered: more specific patterns must precede their prefixes.
const MODEL_LABELS: &[(&str, &str)] = &[
    ("claude-sonnet-4-5", "Sonnet 4.5"),
    ("claude-sonnet-4", "Sonnet 4"),
    ("claude-haiku-3", "Haiku 3"),
    ("claude-opus-4-1", "Opus 4.1"),
    ("claude-opus-4", "Opus 4"),
    ("claude-3-7-sonnet", "Sonnet 3.7"),
    ("claude-3-5-sonnet", "Sonnet 3.5"),
    ("claude-3-5-haiku", "Haiku 3.5"),
    ("claude-3-opus", "Opus 3"),
];

pub fn format_model_name(model_id: &str) -> String {
    MODEL_LABELS
        .iter()
        .find(|(pattern, _)| model_id.contains(pattern))
        .map(|(_, label)| (*label).to_string())
        .unwrap_or_else(|| model_id.to_string())
}

pub fn status_text(model: Option<&str>) -> String {
    match model {
        Some(model) => format!("{MODEL_ICON} {}", format_model_name(model)),
        None => NOT_DETECTED_TEXT.to_string(),
    }
}

pub fn tooltip_text(model: Option<&str>) -> String {
    match model {
        Some(model) => format!("Current Claude model: {model}"),
        None => "Claude model not detected".to_string(),
    }
}

pub fn confirmed_text(text: &str) -> String {
    format!("{CONFIRM_ICON} {text}")
}

pub fn make_status_view(model: Option<String>) -> StatusView {
    StatusView {
        text: status_text(model.as_deref()),
        tooltip: tooltip_text(model.as_deref()),
        model,
    }
}
