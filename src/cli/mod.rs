pub mod prompt;

use anyhow::Result;
use console::Term;
use std::sync::atomic::{AtomicBool, Ordering};

/// Width of the prefix column, including the trailing space
const PREFIX_LEN: usize = 10;

static VERBOSE: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(verbose: bool) {
    VERBOSE.store(verbose, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

/// Right-align a (possibly styled) prefix in the prefix column
pub fn gen_prefix(prefix: &str) -> String {
    let len = console::measure_text_width(prefix);
    if len >= PREFIX_LEN {
        format!("{prefix} ")
    } else {
        format!("{}{prefix} ", " ".repeat(PREFIX_LEN - 1 - len))
    }
}

/// Writes prefixed, wrapped lines to the terminal
pub struct Writer {
    term: Term,
}

impl Writer {
    pub fn new() -> Self {
        Writer {
            term: Term::stdout(),
        }
    }

    fn max_msg_len(&self) -> usize {
        let (_, cols) = self.term.size_checked().unwrap_or((25, 80));
        (cols as usize).saturating_sub(PREFIX_LEN).max(20)
    }

    pub fn writeln(&self, prefix: &str, msg: &str) -> Result<()> {
        let words: Vec<&str> = msg.split(' ').collect();
        self.write_wrapped(prefix, &words, " ")
    }

    /// Write chunks that should never be split across lines
    pub fn write_chunks<S: AsRef<str>>(&self, prefix: &str, chunks: &[S]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }
        let chunks: Vec<&str> = chunks.iter().map(|c| c.as_ref()).collect();
        self.write_wrapped(prefix, &chunks, " ")
    }

    fn write_wrapped(&self, prefix: &str, pieces: &[&str], sep: &str) -> Result<()> {
        let max_len = self.max_msg_len();
        let mut lines: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut current_len = 0;
        for piece in pieces {
            let piece_len = console::measure_text_width(piece);
            if current_len > 0 && current_len + sep.len() + piece_len > max_len {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push_str(sep);
                current_len += sep.len();
            }
            current.push_str(piece);
            current_len += piece_len;
        }
        lines.push(current);

        let mut first = true;
        for line in lines {
            let p = if first { gen_prefix(prefix) } else { gen_prefix("") };
            first = false;
            self.term.write_line(&format!("{p}{line}"))?;
        }
        Ok(())
    }
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

#[macro_export]
macro_rules! msg {
    ($prefix:expr, $($arg:tt)+) => {{
        $crate::WRITER.writeln($prefix, &format!($($arg)+)).ok();
    }};
}

#[macro_export]
macro_rules! debug {
    ($($arg:tt)+) => {
        if $crate::cli::is_verbose() {
            $crate::msg!(&console::style("DEBUG").dim().to_string(), $($arg)+)
        }
    };
}

#[macro_export]
macro_rules! success {
    ($($arg:tt)+) => {
        $crate::msg!(&console::style("SUCCESS").green().bold().to_string(), $($arg)+)
    };
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)+) => {
        $crate::msg!(&console::style("INFO").blue().bold().to_string(), $($arg)+)
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)+) => {
        $crate::msg!(&console::style("WARNING").yellow().bold().to_string(), $($arg)+)
    };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)+) => {
        $crate::msg!(&console::style("ERROR").red().bold().to_string(), $($arg)+)
    };
}

#[macro_export]
macro_rules! due_to {
    ($($arg:tt)+) => {
        $crate::msg!(&console::style("DUE TO").yellow().bold().to_string(), $($arg)+)
    };
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_gen_prefix() {
        let tests = vec![
            ("", "          "),
            ("INFO", "     INFO "),
            ("VERYLONGPREFIX", "VERYLONGPREFIX "),
        ];

        for (input, output) in tests {
            assert_eq!(gen_prefix(input), output);
        }
    }

    #[test]
    fn test_styled_prefix_width() {
        let styled = console::style("ERROR").red().force_styling(true).to_string();
        let prefix = gen_prefix(&styled);
        assert_eq!(console::measure_text_width(&prefix), PREFIX_LEN);
    }

    #[test]
    fn test_macros_in_match_arms() {
        let res: Vec<()> = vec![Some("aiofiles"), None]
            .into_iter()
            .map(|name| match name {
                Some(name) => info!("Found {}", name),
                None => warn!("Nothing found"),
            })
            .collect();
        assert_eq!(res.len(), 2);
    }
}
