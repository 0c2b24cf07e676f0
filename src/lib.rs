//! Reports the Claude model currently active for a project by tailing the
//! assistant's local conversation logs.
//!
//! The core surface is [`infra::ModelDetector`]: [`infra::ModelDetector::current_model`]
//! and [`infra::ModelDetector::status_text`]. [`app`] holds the refresh state machine
//! used by the `watch` command.

pub mod app;
pub mod cli;
pub mod domain;
pub mod infra;
pub mod ui;
