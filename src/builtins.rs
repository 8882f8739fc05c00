use std::io::Write;

use crate::history::HistoryEntry;

pub const HISTORY: &str = "cmdhist";

pub const BUILTINS: [&str; 1] = [HISTORY];

pub const SELECTION_PROMPT: &str = "Enter command number (or Enter to quit): ";

/// Writes history entries as `<sequence>\t<text>` lines.
pub fn write_history<'a, W, I>(out: &mut W, entries: I) -> std::io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a HistoryEntry>,
{
    for entry in entries {
        writeln!(out, "{}\t{}", entry.sequence, entry.text)?;
    }
    out.flush()
}

/// First sequence number shown by `cmdhist N` when `current` is the
/// sequence number of the `cmdhist` line itself.
pub fn listing_start(current: usize, count: Option<usize>) -> usize {
    match count {
        Some(n) => (current + 1).saturating_sub(n).max(1),
        None => 1,
    }
}

/// Interprets the answer to the selection prompt. Anything but a
/// positive integer means "do nothing".
pub fn parse_selection(answer: &str) -> Option<usize> {
    match answer.trim().parse::<usize>() {
        Ok(n) if n > 0 => Some(n),
        _ => None,
    }
}
