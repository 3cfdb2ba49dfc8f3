use std::io::{self, Write};

use serde::Serialize;
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::commands::CommandResult;
use crate::error::CliError;
use crate::metadata::Metadata;

/// JSON response wrapper.
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub meta: Metadata,
    pub data: Value,
}

impl Envelope {
    pub fn from_result(result: CommandResult) -> Result<Self, CliError> {
        let mut meta = Metadata::new(result.latency_ms)?;
        for warning in result.warnings {
            meta.push_warning(warning);
        }
        Ok(Self {
            meta,
            data: result.data,
        })
    }
}

pub fn render(result: CommandResult, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match format {
        OutputFormat::Json => {
            let envelope = Envelope::from_result(result)?;
            let payload = if pretty {
                serde_json::to_string_pretty(&envelope)?
            } else {
                serde_json::to_string(&envelope)?
            };
            writeln!(out, "{payload}")?;
        }
        OutputFormat::Text => {
            for warning in &result.warnings {
                eprintln!("warning: {warning}");
            }
            let text = result.text.trim_end();
            writeln!(out, "{text}")?;
        }
    }

    out.flush()?;
    Ok(())
}
