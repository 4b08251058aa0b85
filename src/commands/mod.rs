//! Command handlers for the bill-split CLI.

mod split;

use crate::Result;
use anyhow::Context;
use serde::Serialize;
use std::fmt::Debug;
use std::io::Write;
use tracing::debug;

pub use split::split_bill;

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data that is only shown at the debug log level.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to stdout, regardless of the log level, and the structured data (if it
    /// exists) as JSON to `debug!`.
    pub fn print(&self) -> Result<()> {
        self.print_to(std::io::stdout().lock())
    }

    /// Write the message as a line to `out` and log the structured data as JSON to `debug!`.
    pub fn print_to(&self, mut out: impl Write) -> Result<()> {
        writeln!(out, "{}", self.message).context("Unable to print the command output")?;
        out.flush().context("Unable to flush the command output")?;
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
        Ok(())
    }
}
