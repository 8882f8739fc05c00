use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::fd::{FromRawFd, OwnedFd};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::process::CommandExt;
use std::process::{self, Child, Stdio};
use std::thread;

use bytes::{Bytes, BytesMut};
use nix::fcntl::OFlag;
use nix::unistd;
use tracing::{debug, warn};

use crate::ast::{ArgumentVector, Command, RedirectMode};
use crate::config::Config;
use crate::types::{ExecuteResult, ExecutionResult, ShellError};
use crate::utils::search_cmd;

const READ_CHUNK: usize = 8192;
const OUTPUT_FILE_MODE: u32 = 0o644;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FanOutMode {
    #[default]
    Concurrent,
    Sequential,
}

/// Spawns and wires child processes for a parsed command line.
///
/// Every strategy blocks until its children have been waited on and
/// reports the last one. There is no timeout: a child that never exits
/// holds the interpreter with it.
#[derive(Debug, Clone, Default)]
pub struct Executor {
    capture_limit: Option<usize>,
    fan_out: FanOutMode,
}

impl Executor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &Config) -> Self {
        let mode = if config.sequential_fan_out {
            FanOutMode::Sequential
        } else {
            FanOutMode::Concurrent
        };
        Self::new()
            .capture_limit(config.capture_limit)
            .fan_out_mode(mode)
    }

    pub fn capture_limit(mut self, limit: Option<usize>) -> Self {
        self.capture_limit = limit;
        self
    }

    pub fn fan_out_mode(mut self, mode: FanOutMode) -> Self {
        self.fan_out = mode;
        self
    }

    pub fn execute(&self, command: &Command) -> ExecuteResult {
        debug!(?command, "executing");

        match command {
            Command::Simple(argv) => {
                let mut cmd = build_command(argv)?;
                let child = spawn(&mut cmd, argv)?;
                wait(child)
            }
            Command::Redirect {
                command,
                file,
                mode: RedirectMode::Input,
            } => self.run_input_redirect(command, file),
            Command::Redirect { command, file, mode } => {
                self.run_output_redirect(command, file, *mode == RedirectMode::Append)
            }
            Command::Pipeline(stages) => self.run_pipeline(stages),
            Command::FanOut { source, branches } => self.run_fan_out(source, branches),
            Command::History { .. } => Err(ShellError::Internal(
                "history replay is dispatched by the shell".to_string(),
            )),
        }
    }

    fn run_input_redirect(&self, argv: &ArgumentVector, file: &str) -> ExecuteResult {
        let mut cmd = build_command(argv)?;
        let input = File::open(file).map_err(|source| ShellError::Redirect {
            path: file.to_string(),
            source,
        })?;
        cmd.stdin(Stdio::from(input));
        let child = spawn(&mut cmd, argv)?;
        drop(cmd);
        wait(child)
    }

    fn run_output_redirect(&self, argv: &ArgumentVector, file: &str, append: bool) -> ExecuteResult {
        let (output, result) = self.run_captured(argv)?;

        let mut target = OpenOptions::new()
            .write(true)
            .create(true)
            .append(append)
            .truncate(!append)
            .mode(OUTPUT_FILE_MODE)
            .open(file)
            .map_err(|source| ShellError::Redirect {
                path: file.to_string(),
                source,
            })?;
        target.write_all(&output)?;
        Ok(result)
    }

    fn run_pipeline(&self, stages: &[ArgumentVector]) -> ExecuteResult {
        // Resolve every stage first so an unknown program spawns nothing.
        let commands = stages
            .iter()
            .map(|argv| build_command(argv).map(|cmd| (argv, cmd)))
            .collect::<Result<Vec<_>, _>>()?;

        let last = commands.len().saturating_sub(1);
        let mut children: Vec<Child> = Vec::with_capacity(commands.len());
        let mut upstream: Option<OwnedFd> = None;

        for (i, (argv, mut cmd)) in commands.into_iter().enumerate() {
            if let Some(read_end) = upstream.take() {
                cmd.stdin(Stdio::from(read_end));
            }
            if i < last {
                let (read_end, write_end) = pipe()?;
                cmd.stdout(Stdio::from(write_end));
                upstream = Some(read_end);
            }
            match spawn(&mut cmd, argv) {
                Ok(child) => children.push(child),
                Err(e) => {
                    drop(cmd);
                    drop(upstream);
                    // A running stage may be reading the terminal and never
                    // see EOF, so it is killed before being reaped.
                    abort(children);
                    return Err(e);
                }
            }
            // `cmd` still owns the parent's copies of this stage's ends.
        }

        // Every stage is waited on even after one wait fails.
        let mut result = None;
        let mut failure = None;
        for child in children {
            let pid = child.id();
            match wait(child) {
                Ok(done) => result = Some(done),
                Err(e) if failure.is_none() => failure = Some(e),
                Err(e) => warn!(pid, error = %e, "failed to reap child"),
            }
        }
        if let Some(e) = failure {
            return Err(e);
        }
        result.ok_or_else(|| ShellError::Internal("empty pipeline".to_string()))
    }

    fn run_fan_out(&self, source: &ArgumentVector, branches: &[ArgumentVector]) -> ExecuteResult {
        let commands = branches
            .iter()
            .map(|argv| build_command(argv).map(|cmd| (argv, cmd)))
            .collect::<Result<Vec<_>, _>>()?;

        let (output, _) = self.run_captured(source)?;
        debug!(bytes = output.len(), branches = commands.len(), "fanning out");

        let results: Vec<ExecuteResult> = match self.fan_out {
            FanOutMode::Sequential => commands
                .into_iter()
                .map(|(argv, cmd)| feed_branch(argv, cmd, output.clone()))
                .collect(),
            FanOutMode::Concurrent => thread::scope(|scope| {
                let handles: Vec<_> = commands
                    .into_iter()
                    .map(|(argv, cmd)| {
                        let input = output.clone();
                        scope.spawn(move || feed_branch(argv, cmd, input))
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|handle| {
                        handle.join().unwrap_or_else(|_| {
                            Err(ShellError::Internal("fan-out branch panicked".to_string()))
                        })
                    })
                    .collect()
            }),
        };

        let mut last = None;
        for result in results {
            last = Some(result?);
        }
        last.ok_or_else(|| ShellError::Internal("fan-out without branches".to_string()))
    }

    /// Runs `argv` with its stdout on a pipe and reads that pipe to EOF
    /// before waiting, so the child never stalls on a full pipe.
    fn run_captured(&self, argv: &ArgumentVector) -> Result<(Bytes, ExecutionResult), ShellError> {
        let mut cmd = build_command(argv)?;
        let (read_end, write_end) = pipe()?;
        cmd.stdout(Stdio::from(write_end));
        let child = spawn(&mut cmd, argv)?;
        // The parent's write end lives in `cmd`; EOF needs it closed.
        drop(cmd);

        let captured = self.capture(File::from(read_end));
        let result = wait(child)?;
        Ok((captured?, result))
    }

    fn capture(&self, mut source: impl Read) -> io::Result<Bytes> {
        let mut buf = BytesMut::with_capacity(READ_CHUNK);
        let mut chunk = [0u8; READ_CHUNK];
        let mut discarded = 0usize;

        loop {
            let n = match source.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            let keep = match self.capture_limit {
                Some(limit) => n.min(limit.saturating_sub(buf.len())),
                None => n,
            };
            buf.extend_from_slice(&chunk[..keep]);
            discarded += n - keep;
        }

        if discarded > 0 {
            warn!(
                kept = buf.len(),
                discarded, "captured output exceeded the capture limit"
            );
        }
        Ok(buf.freeze())
    }
}

fn build_command(argv: &ArgumentVector) -> Result<process::Command, ShellError> {
    let paths = std::env::var("PATH").unwrap_or_default();
    let path = search_cmd(argv.program(), &paths)
        .ok_or_else(|| ShellError::CommandNotFound(argv.program().to_string()))?;
    let mut cmd = process::Command::new(path);
    cmd.arg0(argv.program()).args(argv.args());
    Ok(cmd)
}

fn spawn(cmd: &mut process::Command, argv: &ArgumentVector) -> Result<Child, ShellError> {
    let child = cmd.spawn().map_err(|source| ShellError::Spawn {
        program: argv.program().to_string(),
        source,
    })?;
    debug!(pid = child.id(), argv = ?argv.as_slice(), "spawned");
    Ok(child)
}

fn wait(mut child: Child) -> ExecuteResult {
    let status = child.wait()?;
    debug!(pid = child.id(), %status, "completed");
    Ok(ExecutionResult {
        pid: child.id(),
        status,
    })
}

/// Kills and waits on the children of an aborted command so none are
/// left running or as zombies.
fn abort(children: Vec<Child>) {
    for mut child in children {
        if let Err(e) = child.kill() {
            warn!(pid = child.id(), error = %e, "failed to kill child");
        }
        if let Err(e) = child.wait() {
            warn!(pid = child.id(), error = %e, "failed to reap child");
        }
    }
}

/// Both ends are close-on-exec: a child only keeps the end it was handed
/// as stdin/stdout, never one belonging to a sibling.
fn pipe() -> Result<(OwnedFd, OwnedFd), ShellError> {
    let (read_end, write_end) =
        unistd::pipe2(OFlag::O_CLOEXEC).map_err(|e| ShellError::Nix(e, "pipe2".to_string()))?;
    // SAFETY: pipe2 just opened both descriptors and nothing else owns them.
    Ok(unsafe { (OwnedFd::from_raw_fd(read_end), OwnedFd::from_raw_fd(write_end)) })
}

/// Starts one fan-out branch reading from a fresh pipe and writes the
/// whole captured buffer into it.
fn feed_branch(argv: &ArgumentVector, mut cmd: process::Command, input: Bytes) -> ExecuteResult {
    let (read_end, write_end) = pipe()?;
    cmd.stdin(Stdio::from(read_end));
    let child = spawn(&mut cmd, argv)?;
    drop(cmd);

    let mut writer = File::from(write_end);
    match writer.write_all(&input) {
        Ok(()) => {}
        // The branch stopped reading early; it still gets waited on.
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            debug!(program = argv.program(), "branch closed its input early");
        }
        Err(e) => {
            drop(writer);
            let pid = child.id();
            if let Err(wait_err) = wait(child) {
                warn!(pid, error = %wait_err, "failed to reap child");
            }
            return Err(e.into());
        }
    }
    drop(writer);
    wait(child)
}
