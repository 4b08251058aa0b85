//! Interactive collection of the bill's inputs.
//!
//! Each field is asked for in a fixed order and asked again until its validator accepts the
//! answer. The prompter works on any `BufRead`/`Write` pair so it can be driven by stdin/stdout or
//! by in-memory buffers.

use crate::model::{BillRecord, Figure, Person};
use crate::Result;
use anyhow::{bail, Context};
use std::io::{BufRead, Write};
use std::str::FromStr;
use tracing::trace;

/// Asks questions on `output` and reads answers from `input`, one line per answer.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R, W> Prompter<R, W>
where
    R: BufRead,
    W: Write,
{
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Asks the seven questions and builds the `BillRecord`.
    pub fn collect(&mut self) -> Result<BillRecord> {
        let first = self.person("first")?;
        let second = self.person("second")?;
        let total_money = self.figure("Enter total money:", "Total money must be a number")?;
        Ok(BillRecord::new(first, second, total_money))
    }

    fn person(&mut self, ordinal: &str) -> Result<Person> {
        let name = self.name(&format!("Enter {ordinal} person's name:"))?;
        let previous = self.figure(
            &format!("Enter {ordinal} person's previous unit:"),
            "Previous unit must be a number",
        )?;
        let current = self.figure(
            &format!("Enter {ordinal} person's current unit:"),
            "Current unit must be a number",
        )?;
        Ok(Person::new(name, previous, current))
    }

    /// Asks for a name. The answer is kept as typed, but must not be blank.
    pub fn name(&mut self, message: &str) -> Result<String> {
        self.ask(message, |answer| {
            if answer.trim().is_empty() {
                Err("Name cannot be empty")
            } else {
                Ok(answer.to_string())
            }
        })
    }

    /// Asks for a number. Any value that parses is accepted, including negative ones.
    pub fn figure(&mut self, message: &str, invalid: &'static str) -> Result<Figure> {
        self.ask(message, |answer| Figure::from_str(answer).map_err(|_| invalid))
    }

    /// Writes `message` and reads a line until `validate` accepts it. When it does not, the
    /// validator's message is written and the question is asked again.
    fn ask<T, F>(&mut self, message: &str, validate: F) -> Result<T>
    where
        F: Fn(&str) -> std::result::Result<T, &'static str>,
    {
        loop {
            write!(self.output, "{message} ").context("Unable to write the prompt")?;
            self.output.flush().context("Unable to flush the prompt")?;

            let mut line = String::new();
            let read = self
                .input
                .read_line(&mut line)
                .context("Unable to read the answer")?;
            if read == 0 {
                bail!("Input ended before '{message}' was answered")
            }
            let answer = line.trim_end_matches(['\n', '\r']);
            trace!("'{message}' answered with '{answer}'");

            match validate(answer) {
                Ok(value) => return Ok(value),
                Err(problem) => {
                    writeln!(self.output, "{problem}")
                        .context("Unable to write the validation message")?;
                }
            }
        }
    }
}
