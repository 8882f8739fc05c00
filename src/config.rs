use clap::{ArgAction, Parser};
use tracing::Level;

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "pipeshell", version, about = "Interactive shell with pipes, redirection and fan-out")]
pub struct Config {
    /// Keep at most this many bytes of a command's captured output
    /// (for `>`, `>>`, `||` and `|||`). Unbounded when unset.
    #[arg(long, value_name = "BYTES")]
    pub capture_limit: Option<usize>,

    /// Run fan-out branches one after another instead of concurrently.
    #[arg(long)]
    pub sequential_fan_out: bool,

    /// Keep at most this many history entries.
    #[arg(long, value_name = "ENTRIES")]
    pub history_size: Option<usize>,

    /// Increase diagnostic output on stderr (-v, -vv, -vvv).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Config {
    pub fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}
