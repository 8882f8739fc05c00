use std::io::Write;

use tracing::{debug, info};

use crate::ast::Command;
use crate::builtins;
use crate::config::Config;
use crate::executor::Executor;
use crate::history::History;
use crate::parser;
use crate::reader::LineSource;
use crate::tokenizer;
use crate::types::{ExecutionResult, ShellError};

pub const NAME: &str = "pipeshell";

/// The read-classify-execute loop.
///
/// Owns the history log and the sequence counter for its whole run.
/// Interpreter messages (results, history listings) go to `out`; children
/// write to the real standard streams.
pub struct Shell<S, W> {
    source: S,
    out: W,
    history: History,
    executor: Executor,
    sequence: usize,
    /// Set when the input ran out at a nested prompt.
    exhausted: bool,
}

impl<S: LineSource, W: Write> Shell<S, W> {
    pub fn new(source: S, out: W, config: &Config) -> Self {
        Self {
            source,
            out,
            history: History::with_capacity(config.history_size),
            executor: Executor::with_config(config),
            sequence: 0,
            exhausted: false,
        }
    }

    #[cfg(test)]
    pub fn history(&self) -> &History {
        &self.history
    }

    #[cfg(test)]
    pub fn output(&self) -> &W {
        &self.out
    }

    /// Runs until the input is exhausted. Only an input failure is
    /// returned; everything else is reported and the loop goes on.
    pub fn run(&mut self) -> Result<(), ShellError> {
        while !self.exhausted {
            let prompt = prompt();
            let Some(line) = self.source.read_line(&prompt)? else {
                break;
            };
            self.run_line(&line)?;
        }
        info!(recorded = self.history.len(), "end of input");
        Ok(())
    }

    /// Dispatches one line and reports its outcome.
    pub fn run_line(&mut self, line: &str) -> Result<Option<ExecutionResult>, ShellError> {
        match self.dispatch(line) {
            Ok(Some(result)) => {
                debug!(pid = result.pid, success = result.success(), "command completed");
                writeln!(self.out, "{}", result)?;
                self.out.flush()?;
                Ok(Some(result))
            }
            Ok(None) => Ok(None),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                eprintln!("{}: {}", NAME, e);
                Ok(None)
            }
        }
    }

    /// Records the line, then classifies, splits and executes it.
    pub fn dispatch(&mut self, line: &str) -> Result<Option<ExecutionResult>, ShellError> {
        let line = line.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() {
            return Ok(None);
        }

        self.sequence += 1;
        self.history.append(self.sequence, line);

        let Some(classified) = tokenizer::classify(line)? else {
            return Ok(None);
        };
        match parser::parse(classified)? {
            Command::History { count } => self.run_history(count),
            command => self.executor.execute(&command).map(Some),
        }
    }

    /// Lists history, asks which entry to run and replays it.
    fn run_history(&mut self, count: Option<usize>) -> Result<Option<ExecutionResult>, ShellError> {
        let start = builtins::listing_start(self.sequence, count);
        builtins::write_history(&mut self.out, self.history.list_from(start))?;

        let Some(answer) = self.source.read_line(builtins::SELECTION_PROMPT)? else {
            self.exhausted = true;
            return Ok(None);
        };
        match builtins::parse_selection(&answer) {
            Some(sequence) => self.replay(sequence),
            None => Ok(None),
        }
    }

    /// Re-enters dispatch with a recorded line; a missing entry runs nothing.
    pub fn replay(&mut self, sequence: usize) -> Result<Option<ExecutionResult>, ShellError> {
        let Some(text) = self.history.lookup(sequence).map(str::to_string) else {
            writeln!(self.out, "{}: no entry {}", builtins::HISTORY, sequence)?;
            return Ok(None);
        };
        debug!(sequence, %text, "replaying");
        self.dispatch(&text)
    }
}

fn prompt() -> String {
    match nix::unistd::getcwd() {
        Ok(dir) => format!("{}$ ", dir.display()),
        Err(_) => "?$ ".to_string(),
    }
}
