mod pipeline_tests;
mod redirection_tests;

use crate::ast::Command;
use crate::parser::parse;
use crate::tokenizer::classify;
use crate::types::ShellError;

pub fn words(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Classifies and parses a non-blank line.
pub fn plan(line: &str) -> Result<Command, ShellError> {
    let classified = classify(line)?.ok_or_else(|| ShellError::syntax("blank line"))?;
    parse(classified)
}
