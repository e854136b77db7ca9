use std::io::Write;

use crate::error::ArchpromptError;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Human-readable session output: underlined section headers followed by
/// bodies, each section closed by a blank line.
pub struct Transcript<W> {
    out: W,
    bold: bool,
    pretty_json: bool,
}

impl<W: Write> Transcript<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            bold: true,
            pretty_json: false,
        }
    }

    /// Disable ANSI bold on headers.
    pub fn plain(mut self) -> Self {
        self.bold = false;
        self
    }

    /// Re-indent replies that parse as JSON.
    pub fn pretty_json(mut self, enabled: bool) -> Self {
        self.pretty_json = enabled;
        self
    }

    /// Write a header and its `=` underline.
    pub fn header(&mut self, title: &str) -> Result<(), ArchpromptError> {
        let underline = "=".repeat(title.chars().count());
        self.bold_line(title)?;
        self.bold_line(&underline)?;
        self.out.flush()?;
        Ok(())
    }

    pub fn line(&mut self, text: &str) -> Result<(), ArchpromptError> {
        writeln!(self.out, "{text}")?;
        Ok(())
    }

    pub fn blank(&mut self) -> Result<(), ArchpromptError> {
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }

    /// Header, body, blank line.
    pub fn section(&mut self, title: &str, body: &str) -> Result<(), ArchpromptError> {
        self.header(title)?;
        self.line(body)?;
        self.blank()
    }

    /// Like `section`, but the body is a model reply.
    pub fn reply(&mut self, title: &str, content: &str) -> Result<(), ArchpromptError> {
        let rendered = self.render_reply(content);
        self.section(title, &rendered)
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn bold_line(&mut self, text: &str) -> Result<(), ArchpromptError> {
        if self.bold {
            writeln!(self.out, "{BOLD}{text}{RESET}")?;
        } else {
            writeln!(self.out, "{text}")?;
        }
        Ok(())
    }

    fn render_reply(&self, content: &str) -> String {
        if !self.pretty_json {
            return content.to_owned();
        }
        serde_json::from_str::<serde_json::Value>(content)
            .and_then(|value| serde_json::to_string_pretty(&value))
            .unwrap_or_else(|_| content.to_owned())
    }
}
