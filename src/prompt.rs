//! Yes/no questions for the operator.

use std::io::{self, BufRead, Write};

/// Asks the operator to confirm something.
pub trait Prompter {
    /// Returns `true` on an affirmative answer.
    fn confirm(&mut self, question: &str) -> io::Result<bool>;
}

/// Prompts on stdout and reads the answer from stdin.
#[derive(Debug, Default)]
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn confirm(&mut self, question: &str) -> io::Result<bool> {
        let mut stdout = io::stdout().lock();
        write!(stdout, "{question} (y/n): ")?;
        stdout.flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(is_yes(&line))
    }
}

/// Only `y` and `yes` (any case) count as agreement. End of input is a no.
pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
