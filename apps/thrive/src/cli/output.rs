//! # Terminal Output
//!
//! Operator-facing formatting: headers, key/value lines, lists and copy
//! blocks. Commands write through a `Terminal` so tests can drive them with
//! in-memory input and capture their output.

use std::io::{self, BufRead, IsTerminal, Write};

const RESET: &str = "\x1b[0m";
const BRIGHT: &str = "\x1b[1m";

#[derive(Debug, Clone, Copy)]
enum Tone {
    Blue,
    Gold,
    White,
}

impl Tone {
    const fn code(self) -> &'static str {
        match self {
            Self::Blue => "\x1b[34m",
            Self::Gold => "\x1b[33m",
            Self::White => "\x1b[37m",
        }
    }
}

/// True when stdout is a TTY and `NO_COLOR` is unset.
pub fn color_supported() -> bool {
    std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal()
}

/// Input and output streams for one command run.
pub struct Terminal<'a> {
    input: &'a mut dyn BufRead,
    out: &'a mut dyn Write,
    color: bool,
}

impl<'a> Terminal<'a> {
    pub fn new(input: &'a mut dyn BufRead, out: &'a mut dyn Write, color: bool) -> Self {
        Self { input, out, color }
    }

    fn paint(&self, text: &str, tone: Tone, bright: bool) -> String {
        if !self.color {
            return text.to_string();
        }
        let style = if bright { BRIGHT } else { "" };
        format!("{}{}{}{}", style, tone.code(), text, RESET)
    }

    /// Plain line, no styling.
    pub fn line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{}", text)
    }

    pub fn header(&mut self, title: &str) -> io::Result<()> {
        let rule = "-".repeat(title.chars().count());
        let title = self.paint(title, Tone::Blue, true);
        let rule = self.paint(&rule, Tone::Blue, false);
        writeln!(self.out, "{}", title)?;
        writeln!(self.out, "{}", rule)
    }

    pub fn key_value(&mut self, label: &str, value: &str) -> io::Result<()> {
        let label = self.paint(&format!("{}:", label), Tone::White, true);
        let value = self.paint(value, Tone::Gold, false);
        writeln!(self.out, "{} {}", label, value)
    }

    pub fn warning(&mut self, message: &str) -> io::Result<()> {
        let message = self.paint(message, Tone::Gold, true);
        writeln!(self.out, "{}", message)
    }

    pub fn list(&mut self, label: &str, items: &[String]) -> io::Result<()> {
        let label = self.paint(&format!("{}:", label), Tone::White, true);
        writeln!(self.out, "{}", label)?;
        for item in items {
            let item = self.paint(item, Tone::Gold, false);
            writeln!(self.out, "  - {}", item)?;
        }
        Ok(())
    }

    /// Labelled value followed by a `[ready to copy]` marker.
    pub fn copy_block(&mut self, label: &str, value: &str) -> io::Result<()> {
        let label = self.paint(&format!("{}:", label), Tone::White, true);
        let value = self.paint(value, Tone::Gold, false);
        writeln!(self.out, "{}", label)?;
        writeln!(self.out, "{}", value)?;
        writeln!(self.out, "[ready to copy]")
    }

    /// Write `prompt` and read one trimmed line. `None` at end of input.
    pub fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.out, "{}", prompt)?;
        self.out.flush()?;
        let mut buf = String::new();
        if self.input.read_line(&mut buf)? == 0 {
            return Ok(None);
        }
        Ok(Some(buf.trim().to_string()))
    }

    /// `y`/`yes` (any case) confirms; anything else, including end of
    /// input, declines.
    pub fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        Ok(self
            .read_line(prompt)?
            .is_some_and(|answer| matches!(answer.to_lowercase().as_str(), "y" | "yes")))
    }

    /// Read everything left on the input stream.
    pub fn read_to_end(&mut self) -> io::Result<String> {
        let mut text = String::new();
        self.input.read_to_string(&mut text)?;
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(f: impl FnOnce(&mut Terminal<'_>) -> io::Result<()>) -> String {
        let mut input: &[u8] = b"";
        let mut out = Vec::new();
        {
            let mut term = Terminal::new(&mut input, &mut out, false);
            f(&mut term).expect("write");
        }
        String::from_utf8(out).expect("utf8")
    }

    #[test]
    fn header_is_underlined_to_title_width() {
        let text = render(|t| t.header("Wallet Address"));
        assert_eq!(text, "Wallet Address\n--------------\n");
    }

    #[test]
    fn copy_block_ends_with_marker() {
        let text = render(|t| t.copy_block("Address", "abc"));
        assert_eq!(text, "Address:\nabc\n[ready to copy]\n");
    }

    #[test]
    fn list_indents_items() {
        let items = vec!["ETH: 1".to_string(), "USDC: 100".to_string()];
        let text = render(|t| t.list("Exposures", &items));
        assert_eq!(text, "Exposures:\n  - ETH: 1\n  - USDC: 100\n");
    }

    #[test]
    fn color_wraps_values_in_ansi_codes() {
        let mut input: &[u8] = b"";
        let mut out = Vec::new();
        {
            let mut term = Terminal::new(&mut input, &mut out, true);
            term.key_value("Wallet", "LOCKED").expect("write");
        }
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("\x1b[33mLOCKED\x1b[0m"));
    }

    #[test]
    fn confirm_accepts_y_and_yes_only() {
        let mut input: &[u8] = b"YES\nn\n";
        let mut out = Vec::new();
        let mut term = Terminal::new(&mut input, &mut out, false);
        assert!(term.confirm("? ").expect("read"));
        assert!(!term.confirm("? ").expect("read"));
        assert!(!term.confirm("? ").expect("eof declines"));
    }

    #[test]
    fn read_line_reports_end_of_input() {
        let mut input: &[u8] = b"  value  \n";
        let mut out = Vec::new();
        let mut term = Terminal::new(&mut input, &mut out, false);
        assert_eq!(term.read_line("> ").expect("read"), Some("value".to_string()));
        assert_eq!(term.read_line("> ").expect("read"), None);
    }
}
