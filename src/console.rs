//! Line-oriented operator I/O

use std::io::{self, BufRead, Write};

use crate::error::{GmailError, Result};

/// Operator-facing text channel used by the deletion drivers
pub trait Console {
    /// Print one line
    fn say(&mut self, line: &str) -> Result<()>;

    /// Print `prompt` without a newline and read one line of input.
    /// The returned answer has its line terminator stripped.
    fn ask(&mut self, prompt: &str) -> Result<String>;
}

/// [`Console`] over any reader/writer pair
pub struct LineConsole<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LineConsole<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl LineConsole<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Console for LineConsole<R, W> {
    fn say(&mut self, line: &str) -> Result<()> {
        writeln!(self.output, "{}", line)?;
        Ok(())
    }

    fn ask(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut answer = String::new();
        if self.input.read_line(&mut answer)? == 0 {
            return Err(GmailError::InputClosed(prompt.trim().to_string()));
        }
        Ok(answer.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// Prompt until the operator enters a non-blank query; returns it trimmed
pub fn read_query<C: Console + ?Sized>(console: &mut C) -> Result<String> {
    loop {
        let answer = console.ask("Enter bulk delete gmail query: ")?;
        let query = answer.trim();
        if !query.is_empty() {
            return Ok(query.to_string());
        }
        console.say("Query must not be empty.")?;
    }
}
