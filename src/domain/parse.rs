use serde::Deserialize;
use thiserror::Error;

pub const ASSISTANT: &str = "assistant";

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct LogRecordLine {
    #[serde(rename = "type")]
    line_type: String,
    message: Option<LogRecordMessage>,
}

#[derive(Debug, Deserialize)]
struct LogRecordMessage {
    role: Option<String>,
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SettingsFile {
    model: Option<String>,
}

/// Returns the model of an assistant-originated record, `Ok(None)` for any other
/// well-formed record.
pub fn parse_assistant_model_line(line: &str) -> Result<Option<String>, ParseError> {
    let parsed: LogRecordLine = serde_json::from_str(line)?;
    if parsed.line_type != ASSISTANT {
        return Ok(None);
    }
    let Some(message) = parsed.message else {
        return Ok(None);
    };
    if message.role.as_deref() != Some(ASSISTANT) {
        return Ok(None);
    }

    Ok(message.model.filter(|model| !model.is_empty()))
}

/// Scans lines in the order given and returns the first qualifying model.
pub fn find_model_in_lines<'a, I>(lines: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Ok(Some(model)) = parse_assistant_model_line(line) else {
            continue;
        };
        return Some(model);
    }

    None
}

pub fn parse_settings_model(text: &str) -> Result<Option<String>, ParseError> {
    let parsed: SettingsFile = serde_json::from_str(text)?;
    Ok(parsed.model.filter(|model| !model.is_empty()))
}
