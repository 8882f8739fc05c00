mod ast;
mod builtins;
mod config;
mod executor;
mod history;
mod parser;
mod reader;
mod shell;
mod tokenizer;
mod types;
mod utils;

#[cfg(test)]
mod tests;

use std::io;

use anyhow::{Context, Result};
use clap::Parser;

use crate::config::Config;
use crate::reader::Prompter;
use crate::shell::Shell;

fn main() -> Result<()> {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_max_level(config.log_level())
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let input = Prompter::new().context("failed to set up the line editor")?;
    let mut shell = Shell::new(input, io::stdout(), &config);
    shell.run().context("failed to read input")?;
    Ok(())
}
