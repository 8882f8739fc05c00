use tracing::debug;

use crate::ast::{ArgumentVector, Command, RedirectMode};
use crate::builtins;
use crate::tokenizer::Classified;
use crate::types::{CommandType, ShellError};

const BRANCH_SEPARATOR: char = ',';

pub fn parse(classified: Classified) -> Result<Command, ShellError> {
    let Classified { descriptor, tokens } = classified;

    let command = match descriptor.kind {
        CommandType::Simple => Command::Simple(ArgumentVector::new(tokens)?),
        CommandType::OutputRedirect | CommandType::OutputAppend | CommandType::InputRedirect => {
            let file = descriptor.redirect_filename.ok_or_else(|| {
                ShellError::syntax("Expected file after redirection operator")
            })?;
            Command::Redirect {
                command: ArgumentVector::new(tokens)?,
                file,
                mode: match descriptor.kind {
                    CommandType::OutputRedirect => RedirectMode::Overwrite,
                    CommandType::OutputAppend => RedirectMode::Append,
                    _ => RedirectMode::Input,
                },
            }
        }
        CommandType::PipedChain => Command::Pipeline(split(&tokens, descriptor.kind)?),
        CommandType::DoublePipe | CommandType::TriplePipe => {
            let mut vectors = split(&tokens, descriptor.kind)?.into_iter();
            let source = vectors
                .next()
                .ok_or_else(|| ShellError::Internal("fan-out split produced nothing".into()))?;
            Command::FanOut {
                source,
                branches: vectors.collect(),
            }
        }
        CommandType::HistoryReplay => parse_history(&tokens)?,
    };

    debug!(?command, "parsed");
    Ok(command)
}

/// Partitions a chain or fan-out token stream into one argument vector
/// per stage. For fan-out the first vector is the source command and the
/// rest are its branches.
pub fn split(tokens: &[String], kind: CommandType) -> Result<Vec<ArgumentVector>, ShellError> {
    match kind {
        CommandType::PipedChain => split_pipeline(tokens),
        CommandType::DoublePipe | CommandType::TriplePipe => split_fan_out(tokens, kind),
        other => Err(ShellError::Internal(format!("cannot split a {} line", other))),
    }
}

fn split_pipeline(tokens: &[String]) -> Result<Vec<ArgumentVector>, ShellError> {
    tokens
        .split(|token| token == "|")
        .map(|stage| {
            ArgumentVector::new(stage.to_vec())
                .map_err(|_| ShellError::syntax("empty command in pipeline"))
        })
        .collect()
}

fn split_fan_out(tokens: &[String], kind: CommandType) -> Result<Vec<ArgumentVector>, ShellError> {
    let (operator, expected) = match (kind.operator(), kind.branch_count()) {
        (Some(op), Some(n)) => (op, n),
        _ => return Err(ShellError::Internal(format!("{} is not a fan-out", kind))),
    };

    let at = tokens
        .iter()
        .position(|token| token == operator)
        .ok_or_else(|| ShellError::Internal(format!("{} missing from tokens", kind)))?;
    let source = ArgumentVector::new(tokens[..at].to_vec())
        .map_err(|_| ShellError::syntax(format!("expected command before {}", kind)))?;

    let mut branches: Vec<Vec<String>> = Vec::with_capacity(expected);
    let mut current = Vec::new();
    for token in &tokens[at + 1..] {
        if CommandType::from_operator(token).is_some() {
            return Err(ShellError::syntax(format!(
                "unexpected `{}` in branches of {}",
                token, kind
            )));
        }
        // A comma ends a branch whether it stands alone or is glued on.
        match token.strip_suffix(BRANCH_SEPARATOR) {
            Some("") => branches.push(std::mem::take(&mut current)),
            Some(word) => {
                current.push(word.to_string());
                branches.push(std::mem::take(&mut current));
            }
            None => current.push(token.clone()),
        }
    }
    branches.push(current);

    if branches.len() != expected {
        return Err(ShellError::syntax(format!(
            "{} expects {} comma-separated commands, found {}",
            kind,
            expected,
            branches.len()
        )));
    }

    let mut vectors = Vec::with_capacity(expected + 1);
    vectors.push(source);
    for branch in branches {
        vectors.push(
            ArgumentVector::new(branch)
                .map_err(|_| ShellError::syntax(format!("empty command after {}", kind)))?,
        );
    }
    Ok(vectors)
}

fn parse_history(tokens: &[String]) -> Result<Command, ShellError> {
    match tokens {
        [_] => Ok(Command::History { count: None }),
        [_, count] => match count.parse::<usize>() {
            Ok(n) if n > 0 => Ok(Command::History { count: Some(n) }),
            _ => Err(ShellError::syntax(format!(
                "{}: expected a positive count, got `{}`",
                builtins::HISTORY,
                count
            ))),
        },
        _ => Err(ShellError::syntax(format!(
            "{}: too many arguments",
            builtins::HISTORY
        ))),
    }
}
