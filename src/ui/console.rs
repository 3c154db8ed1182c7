//! Line-oriented terminal I/O owned by the interaction controller.

use std::io::{self, Write};

use async_trait::async_trait;
use crossterm::style::Stylize;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::utils::signal::interrupted;

/// How a piece of output should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Progress notes ("Executing...").
    Status,
    /// Section headings and successful outcomes.
    Success,
    /// Model-written explanations.
    Explanation,
    Warning,
    Error,
    /// Verbatim text such as commands and captured output.
    Plain,
}

/// The interactive channel of a run: answers come from stdin, run output goes
/// to stdout. Startup diagnostics before a run go to stderr instead.
#[async_trait]
pub trait Console: Send {
    /// Print one block of text.
    fn show(&mut self, tone: Tone, text: &str);

    /// Print `prompt` and read one line. `None` means no answer (EOF or interrupt).
    async fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>>;
}

/// Console bound to the process's standard streams.
pub struct StdConsole {
    lines: Lines<BufReader<Stdin>>,
    width: usize,
}

impl Default for StdConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl StdConsole {
    const MAX_WIDTH: usize = 100;

    pub fn new() -> Self {
        let width = crossterm::terminal::size()
            .map(|(cols, _)| cols as usize)
            .unwrap_or(80)
            .clamp(20, Self::MAX_WIDTH);
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            width,
        }
    }

    fn render(&self, tone: Tone, text: &str) -> String {
        match tone {
            Tone::Status => text.cyan().to_string(),
            Tone::Success => text.green().to_string(),
            Tone::Explanation => wrap(text, self.width).blue().to_string(),
            Tone::Warning => text.yellow().to_string(),
            Tone::Error => text.red().to_string(),
            Tone::Plain => text.to_string(),
        }
    }
}

/// Wrap prose to `width`, keeping existing line breaks.
pub fn wrap(text: &str, width: usize) -> String {
    textwrap::fill(text, width)
}

/// Indent every line of `text`, as used for commands and short explanations.
pub fn indent(text: &str) -> String {
    textwrap::indent(text, "   ").trim_end_matches('\n').to_string()
}

/// Normalize a typed answer for comparison.
pub fn normalize_answer(line: &str) -> String {
    line.trim().to_lowercase()
}

#[async_trait]
impl Console for StdConsole {
    fn show(&mut self, tone: Tone, text: &str) {
        let rendered = self.render(tone, text);
        let mut out = io::stdout().lock();
        if let Err(e) = writeln!(out, "{}", rendered).and_then(|_| out.flush()) {
            tracing::error!("Failed to write to stdout: {}", e);
        }
    }

    async fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        {
            let mut out = io::stdout().lock();
            write!(out, "{}", prompt)?;
            out.flush()?;
        }

        tokio::select! {
            line = self.lines.next_line() => line,
            _ = interrupted() => {
                // Move past the ^C echo before the caller prints anything else.
                println!();
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_answer() {
        assert_eq!(normalize_answer("  Y \n"), "y");
        assert_eq!(normalize_answer("E"), "e");
        assert_eq!(normalize_answer(""), "");
        assert_eq!(normalize_answer("Yes"), "yes");
    }

    #[test]
    fn test_indent_multiline() {
        assert_eq!(indent("ls -la"), "   ls -la");
        assert_eq!(indent("first\nsecond\n"), "   first\n   second");
    }

    #[test]
    fn test_wrap_keeps_line_breaks() {
        let wrapped = wrap("1. short\n2. also short", 40);
        assert_eq!(wrapped, "1. short\n2. also short");

        let long = "word ".repeat(30);
        assert!(wrap(long.trim(), 40).lines().all(|l| l.len() <= 40));
    }
}
