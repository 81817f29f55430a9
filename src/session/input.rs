//! Command line sources for the session loop

use std::io::BufRead;

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::{Error, Result};

/// Source of command lines
pub trait LineSource {
    /// Read the next line, `None` at end of input
    ///
    /// # Errors
    ///
    /// Returns error if the underlying terminal or reader fails
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

impl<T: LineSource + ?Sized> LineSource for Box<T> {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        (**self).read_line(prompt)
    }
}

/// Interactive terminal input with line editing and in-memory history
pub struct Readline {
    editor: DefaultEditor,
}

impl Readline {
    /// Create an editor on the controlling terminal
    ///
    /// # Errors
    ///
    /// Returns error if the terminal cannot be initialized
    pub fn new() -> Result<Self> {
        let editor = DefaultEditor::new().map_err(|e| Error::Input(e.to_string()))?;
        Ok(Self { editor })
    }
}

impl LineSource for Readline {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    if let Err(e) = self.editor.add_history_entry(line.as_str()) {
                        tracing::debug!(error = %e, "failed to record history entry");
                    }
                }
                Ok(Some(line))
            }
            // Ctrl-C abandons the current line only
            Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
            Err(ReadlineError::Eof) => Ok(None),
            Err(e) => Err(Error::Input(e.to_string())),
        }
    }
}

/// Lines from any buffered reader (piped stdin, scripted tests)
pub struct ReaderInput<R> {
    reader: R,
}

impl<R: BufRead> ReaderInput<R> {
    pub const fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> LineSource for ReaderInput<R> {
    fn read_line(&mut self, _prompt: &str) -> Result<Option<String>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}
