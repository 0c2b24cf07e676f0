use crate::app::IndicatorView;
use std::io::{self, Write};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum OutputFormat {
    #[default]
    Plain,
    Json,
}

pub fn render_line(view: &IndicatorView, format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Plain => Ok(view.text.clone()),
        OutputFormat::Json => serde_json::to_string(view),
    }
}

/// Writes indicator lines, skipping output when the rendered line is unchanged.
#[derive(Debug)]
pub struct IndicatorPrinter<W: Write> {
    out: W,
    format: OutputFormat,
    last_line: Option<String>,
}

impl<W: Write> IndicatorPrinter<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self {
            out,
            format,
            last_line: None,
        }
    }

    pub fn show(&mut self, view: &IndicatorView) -> io::Result<bool> {
        let line = render_line(view, self.format)?;
        if self.last_line.as_deref() == Some(line.as_str()) {
            return Ok(false);
        }
        writeln!(self.out, "{line}")?;
        self.out.flush()?;
        self.last_line = Some(line);
        Ok(true)
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
