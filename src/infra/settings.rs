use crate::domain::parse_settings_model;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

pub fn load_settings_model(settings_path: &Path) -> Option<String> {
    let raw = match fs::read_to_string(settings_path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            debug!(path = %settings_path.display(), "settings file not found");
            return None;
        }
        Err(error) => {
            warn!(path = %settings_path.display(), %error, "failed to read settings file");
            return None;
        }
    };

    match parse_settings_model(&raw) {
        Ok(Some(model)) => {
            info!(path = %settings_path.display(), %model, "model found in settings");
            Some(model)
        }
        Ok(None) => None,
        Err(error) => {
            warn!(path = %settings_path.display(), %error, "failed to parse settings file");
            None
        }
    }
}
