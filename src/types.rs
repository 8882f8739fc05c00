use std::fmt;
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;

use thiserror::Error;

/// The operator structure that governs how a line is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    Simple,         // no operator
    OutputRedirect, // >
    OutputAppend,   // >>
    InputRedirect,  // <
    PipedChain,     // |
    DoublePipe,     // ||
    TriplePipe,     // |||
    HistoryReplay,  // cmdhist
}

impl CommandType {
    /// Maps an operator token to the type it selects.
    pub fn from_operator(token: &str) -> Option<Self> {
        match token {
            ">" => Some(CommandType::OutputRedirect),
            ">>" => Some(CommandType::OutputAppend),
            "<" => Some(CommandType::InputRedirect),
            "|" => Some(CommandType::PipedChain),
            "||" => Some(CommandType::DoublePipe),
            "|||" => Some(CommandType::TriplePipe),
            _ => None,
        }
    }

    pub fn operator(self) -> Option<&'static str> {
        match self {
            CommandType::OutputRedirect => Some(">"),
            CommandType::OutputAppend => Some(">>"),
            CommandType::InputRedirect => Some("<"),
            CommandType::PipedChain => Some("|"),
            CommandType::DoublePipe => Some("||"),
            CommandType::TriplePipe => Some("|||"),
            CommandType::Simple | CommandType::HistoryReplay => None,
        }
    }

    pub fn is_redirect(self) -> bool {
        matches!(
            self,
            CommandType::OutputRedirect | CommandType::OutputAppend | CommandType::InputRedirect
        )
    }

    /// Number of comma-separated branches a fan-out operator feeds.
    pub fn branch_count(self) -> Option<usize> {
        match self {
            CommandType::DoublePipe => Some(2),
            CommandType::TriplePipe => Some(3),
            _ => None,
        }
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operator() {
            Some(op) => write!(f, "`{}`", op),
            None if *self == CommandType::HistoryReplay => write!(f, "`cmdhist`"),
            None => write!(f, "simple command"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDescriptor {
    pub kind: CommandType,
    /// Set only for `>`, `>>` and `<`.
    pub redirect_filename: Option<String>,
}

/// Process id and raw wait status of the last child a command completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionResult {
    pub pid: u32,
    pub status: ExitStatus,
}

impl ExecutionResult {
    pub fn raw_status(&self) -> i32 {
        self.status.into_raw()
    }

    pub fn success(&self) -> bool {
        self.status.success()
    }
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PID of completed command = {} and Status of completed command = {}.",
            self.pid,
            self.raw_status()
        )
    }
}

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("System error ({1}): {0}")]
    Nix(nix::errno::Errno, String), // errno with the call that failed
    #[error("Input error: {0}")]
    Input(String),
    #[error("{0}: command not found")]
    CommandNotFound(String),
    #[error("Invalid syntax: {0}")]
    InvalidSyntax(String),
    #[error("{path}: {source}")]
    Redirect {
        path: String,
        source: std::io::Error,
    },
    #[error("{program}: failed to start: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("Internal shell error: {0}")]
    Internal(String),
}

impl ShellError {
    /// Only a broken input stream ends the interpreter.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ShellError::Input(_))
    }

    pub fn syntax(msg: impl Into<String>) -> Self {
        ShellError::InvalidSyntax(msg.into())
    }
}

pub type ExecuteResult = Result<ExecutionResult, ShellError>;
