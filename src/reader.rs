use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::types::ShellError;

/// Where the shell gets its next line from.
pub trait LineSource {
    /// `Ok(None)` means the input is exhausted.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, ShellError>;
}

impl<T: LineSource + ?Sized> LineSource for &mut T {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, ShellError> {
        (**self).read_line(prompt)
    }
}

/// Interactive input through a line editor.
pub struct Prompter {
    editor: DefaultEditor,
}

impl Prompter {
    pub fn new() -> Result<Self, ShellError> {
        let editor = DefaultEditor::new().map_err(|e| ShellError::Input(e.to_string()))?;
        Ok(Self { editor })
    }
}

impl LineSource for Prompter {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, ShellError> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(Some(line))
            }
            // Ctrl-C abandons the line being typed
            Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
            Err(ReadlineError::Eof) => Ok(None),
            Err(e) => Err(ShellError::Input(e.to_string())),
        }
    }
}
