use std::collections::VecDeque;

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::error::ArchpromptError;

/// Source of user lines. `Ok(None)` means input is exhausted (EOF or
/// interrupt); the driver treats it like a blank line.
pub trait LineSource {
    fn read_line(&mut self) -> Result<Option<String>, ArchpromptError>;
}

/// Interactive terminal reader with line editing and in-session history.
pub struct TerminalInput {
    editor: DefaultEditor,
}

impl TerminalInput {
    pub fn new() -> Result<Self, ArchpromptError> {
        let editor = DefaultEditor::new()
            .map_err(|e| ArchpromptError::Input(format!("cannot open terminal: {e}")))?;
        Ok(Self { editor })
    }
}

impl LineSource for TerminalInput {
    fn read_line(&mut self) -> Result<Option<String>, ArchpromptError> {
        match self.editor.readline("") {
            Ok(line) => {
                if !line.is_empty() {
                    // History is a convenience; failing to record it is not fatal.
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Eof | ReadlineError::Interrupted) => Ok(None),
            Err(e) => Err(ArchpromptError::Input(e.to_string())),
        }
    }
}

/// Pre-recorded lines, for piping a fixed script through the driver.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    lines: VecDeque<String>,
}

impl ScriptedInput {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

impl LineSource for ScriptedInput {
    fn read_line(&mut self) -> Result<Option<String>, ArchpromptError> {
        Ok(self.lines.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_input_yields_lines_then_none() {
        let mut input = ScriptedInput::new(["first", "  second  "]);
        assert_eq!(input.read_line().unwrap().as_deref(), Some("first"));
        assert_eq!(input.read_line().unwrap().as_deref(), Some("  second  "));
        assert_eq!(input.remaining(), 0);
        assert!(input.read_line().unwrap().is_none());
    }
}
