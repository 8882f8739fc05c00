use crate::types::ShellError;

/// Program name followed by its arguments. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentVector(Vec<String>);

impl ArgumentVector {
    pub fn new(words: Vec<String>) -> Result<Self, ShellError> {
        if words.is_empty() {
            return Err(ShellError::syntax("expected command"));
        }
        Ok(Self(words))
    }

    pub fn program(&self) -> &str {
        &self.0[0]
    }

    pub fn args(&self) -> &[String] {
        &self.0[1..]
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectMode {
    Overwrite, // >
    Append,    // >>
    Input,     // <
}

/// A classified line, ready for the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Simple(ArgumentVector),
    Redirect {
        command: ArgumentVector,
        file: String,
        mode: RedirectMode,
    },
    Pipeline(Vec<ArgumentVector>),
    FanOut {
        source: ArgumentVector,
        branches: Vec<ArgumentVector>,
    },
    History {
        count: Option<usize>,
    },
}
