//! JSON summary output.

use anyhow::Result;
use idgen_core::PredictionSummary;
use std::io::{self, Write};
use std::sync::Mutex;

/// Writes prediction summaries as JSON.
pub struct JsonOutput {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonOutput {
    /// Creates a new JSON output writing to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self {
            writer: Mutex::new(Box::new(io::stdout())),
        }
    }

    /// Creates a new JSON output writing to the given writer.
    #[cfg(test)]
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Writes one summary, compact on a single line unless `pretty`.
    #[allow(clippy::significant_drop_tightening)]
    pub fn write_summary(&self, summary: &PredictionSummary, pretty: bool) -> Result<()> {
        let json = if pretty {
            serde_json::to_string_pretty(summary)?
        } else {
            serde_json::to_string(summary)?
        };
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        writeln!(writer, "{json}")?;
        writer.flush()?;
        Ok(())
    }
}
