//! Terminal output.
//!
//! [`Style`] names the handful of looks the CLI uses and maps each one to a
//! `colored` style. [`Printer`] writes styled lines, headers and rules to any
//! writer, and renders [`Progress`] events.

use crate::config::Chunk;
use crate::progress::Progress;
use crate::sync::{Outcome, TransferItem};
use colored::{ColoredString, Colorize};
use std::env;
use std::io::{self, Write};
use std::path::Path;

const DEFAULT_WIDTH: usize = 80;

/// Output styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Plain,
    Red,
    RedBold,
    Green,
    Blue,
    BlueBold,
    Cyan,
    Gray,
}

impl Style {
    pub fn paint(self, text: &str) -> ColoredString {
        match self {
            Style::Plain => text.normal(),
            Style::Red => text.red(),
            Style::RedBold => text.red().bold(),
            Style::Green => text.green(),
            Style::Blue => text.truecolor(24, 116, 205),
            Style::BlueBold => text.truecolor(24, 116, 205).bold(),
            Style::Cyan => text.cyan(),
            Style::Gray => text.truecolor(77, 77, 77),
        }
    }
}

/// Writes styled output. Write errors are ignored, as with `println!`
/// on a closed pipe there is nobody left to tell.
pub struct Printer<W: Write> {
    out: W,
    width: usize,
}

impl Printer<io::Stdout> {
    /// Prints to stdout, `COLUMNS` wide.
    pub fn stdout() -> Self {
        let width = env::var("COLUMNS")
            .ok()
            .and_then(|c| c.parse().ok())
            .filter(|&w| w > 0)
            .unwrap_or(DEFAULT_WIDTH);
        Printer::new(io::stdout(), width)
    }
}

impl<W: Write> Printer<W> {
    pub fn new(out: W, width: usize) -> Self {
        Self { out, width }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// One styled line.
    pub fn line(&mut self, style: Style, text: impl AsRef<str>) {
        let _ = writeln!(self.out, "{}", style.paint(text.as_ref()));
    }

    /// One styled line indented by `indent` spaces.
    pub fn indented(&mut self, indent: usize, style: Style, text: impl AsRef<str>) {
        let text = format!("{:indent$}{}", "", text.as_ref());
        self.line(style, text);
    }

    pub fn blank(&mut self) {
        let _ = writeln!(self.out);
    }

    /// A full-width rule of `=` around a centered title.
    pub fn header(&mut self, style: Style, text: &str) {
        let rule = "=".repeat(self.width);
        self.blank();
        self.line(style, &rule);
        self.line(style, self.center(text));
        self.line(style, &rule);
        self.blank();
    }

    /// A full-width rule of `-` with `title` in the middle.
    pub fn rule(&mut self, style: Style, title: &str) {
        if title.is_empty() {
            let rule = "-".repeat(self.width);
            self.line(style, rule);
            return;
        }
        let fill = self.width.saturating_sub(title.chars().count() + 2);
        let left = fill / 2;
        let text = format!("{} {} {}", "-".repeat(left), title, "-".repeat(fill - left));
        self.line(style, text);
    }

    fn center(&self, text: &str) -> String {
        let pad = self.width.saturating_sub(text.chars().count()) / 2;
        format!("{:pad$}{}", "", text)
    }
}

impl<W: Write> Progress for Printer<W> {
    fn on_probe(&mut self, mount: &Path, mounted: bool) {
        self.line(Style::Gray, format!("Looking for mount {}...", mount.display()));
        if mounted {
            self.line(
                Style::Blue,
                format!("Found mount {} and will use as destination.", mount.display()),
            );
        } else {
            self.line(Style::Gray, "... not found");
        }
    }

    fn on_destination_created(&mut self, root: &Path) {
        self.line(Style::Green, format!("created {}", root.display()));
    }

    fn on_chunk_started(&mut self, chunk: &Chunk, base_dest: &Path) {
        self.rule(Style::Green, &format!("Syncing {}", chunk.name));
        self.line(Style::Gray, format!("into {}", base_dest.display()));
    }

    fn on_item_started(&mut self, item: &TransferItem) {
        self.line(Style::BlueBold, &item.relative_path);
        let _ = writeln!(
            self.out,
            "{} {} {}",
            item.source.display(),
            "=>".green(),
            item.dest.display()
        );
    }

    fn on_planned(&mut self, description: &str) {
        self.line(Style::Gray, description);
    }

    fn on_mirror_line(&mut self, line: &str) {
        self.indented(4, Style::Cyan, line);
    }

    fn on_item_completed(&mut self, item: &TransferItem) {
        if let Outcome::Error(message) = &item.outcome {
            self.line(Style::Red, format!("Error: {message}. Skipping."));
        }
        self.blank();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::PathKind;
    use std::path::PathBuf;

    fn plain() -> Printer<Vec<u8>> {
        colored::control::set_override(false);
        Printer::new(Vec::new(), 20)
    }

    fn text(p: Printer<Vec<u8>>) -> String {
        String::from_utf8(p.into_inner()).unwrap()
    }

    #[test]
    fn test_header_and_rule() {
        let mut p = plain();
        p.header(Style::Plain, "Start");
        p.rule(Style::Plain, "ab");
        let out = text(p);
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines[1], "=".repeat(20));
        assert_eq!(lines[2].trim(), "Start");
        assert_eq!(lines[5].len(), 20);
        assert!(lines[5].contains(" ab "));
    }

    #[test]
    fn test_item_error_is_printed() {
        let mut p = plain();
        let item = TransferItem {
            chunk_name: "stuff".to_string(),
            relative_path: "ghost".to_string(),
            source: PathBuf::from("/home/me/ghost"),
            dest: PathBuf::from("/mnt/b/stuff/ghost"),
            kind: PathKind::Other,
            outcome: Outcome::Error("source is neither file nor directory".to_string()),
        };
        p.on_item_started(&item);
        p.on_item_completed(&item);
        let out = text(p);
        assert!(out.contains("/home/me/ghost => /mnt/b/stuff/ghost"));
        assert!(out.contains("Error: source is neither file nor directory"));
    }
}
