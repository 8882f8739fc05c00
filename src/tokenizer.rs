use tracing::{debug, warn};

use crate::types::{CommandDescriptor, CommandType, ShellError};
use crate::utils;

/// Output of [`classify`]: the governing type plus every retained token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub descriptor: CommandDescriptor,
    pub tokens: Vec<String>,
}

fn is_separator(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n')
}

pub fn tokenize(input: &str) -> Vec<String> {
    input
        .split(is_separator)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Splits a line into tokens and works out which operator governs it.
///
/// Redirect operators are consumed together with the filename after them,
/// and the scan stops there. Chain and fan-out operators stay in the token
/// stream so the splitter can find them. `cmdhist` is only a builtin in
/// command position.
///
/// Returns `Ok(None)` for a blank line.
pub fn classify(line: &str) -> Result<Option<Classified>, ShellError> {
    let mut kind = CommandType::Simple;
    let mut redirect_filename = None;
    let mut tokens = Vec::new();

    let mut words = tokenize(line).into_iter();
    let mut position = 0;
    while let Some(word) = words.next() {
        if kind.is_redirect() {
            redirect_filename = Some(word);
            let dropped: Vec<String> = words.by_ref().collect();
            if !dropped.is_empty() {
                warn!(?dropped, "ignoring tokens after redirection target");
            }
            break;
        }

        match CommandType::from_operator(&word) {
            Some(next) if next.is_redirect() => {
                if kind != CommandType::Simple {
                    return Err(ShellError::syntax(format!(
                        "`{}` cannot follow {}",
                        word, kind
                    )));
                }
                kind = next;
            }
            Some(next) => {
                if kind != CommandType::Simple && kind != next {
                    return Err(ShellError::syntax(format!(
                        "`{}` cannot be combined with {}",
                        word, kind
                    )));
                }
                kind = next;
                tokens.push(word);
            }
            None if position == 0 && utils::is_builtin(&word) => {
                kind = CommandType::HistoryReplay;
                tokens.push(word);
            }
            None => tokens.push(word),
        }
        position += 1;
    }

    if position == 0 {
        return Ok(None);
    }
    if kind.is_redirect() && redirect_filename.is_none() {
        return Err(ShellError::syntax(format!(
            "expected file after {}",
            kind
        )));
    }

    debug!(?kind, ?redirect_filename, ?tokens, "classified line");
    Ok(Some(Classified {
        descriptor: CommandDescriptor {
            kind,
            redirect_filename,
        },
        tokens,
    }))
}
