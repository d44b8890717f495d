//! Console output utilities.

use std::io::{BufRead, Write};

use colored::Colorize;

use crate::report::OutputFormat;

/// Prints an error message.
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Writes a success message.
pub fn success_to<W: Write>(writer: &mut W, message: &str) -> std::io::Result<()> {
    writeln!(writer, "{} {}", "✓".green().bold(), message)
}

/// Writes a warning message.
pub fn warning_to<W: Write>(writer: &mut W, message: &str) -> std::io::Result<()> {
    writeln!(writer, "{} {}", "⚠".yellow().bold(), message)
}

/// Writes an info message.
pub fn info_to<W: Write>(writer: &mut W, message: &str) -> std::io::Result<()> {
    writeln!(writer, "{} {}", "ℹ".blue().bold(), message)
}

/// Stream for status messages and prompts given the report format.
///
/// Status goes to stdout for text reports and to stderr for JSON, so stdout
/// carries nothing but the document.
#[must_use]
pub fn status_stream(format: OutputFormat) -> Box<dyn Write> {
    match format {
        OutputFormat::Text => Box::new(std::io::stdout()),
        OutputFormat::Json => Box::new(std::io::stderr()),
    }
}

/// Checks whether an answer confirms: its trimmed form starts with `Y` or `y`.
#[must_use]
pub fn is_affirmative(answer: &str) -> bool {
    answer
        .trim()
        .chars()
        .next()
        .is_some_and(|c| c.eq_ignore_ascii_case(&'y'))
}

/// Prompts for confirmation on stdin, writing the prompt to the status stream
/// for `format`.
pub fn confirm(message: &str, format: OutputFormat) -> crate::MapperResult<bool> {
    let stdin = std::io::stdin();
    confirm_with(&mut stdin.lock(), &mut status_stream(format), message)
}

/// Prompts for confirmation on the given reader and writer.
///
/// End of input counts as a decline.
pub fn confirm_with<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
    message: &str,
) -> crate::MapperResult<bool> {
    write!(writer, "{message} (Y/N): ")?;
    writer.flush()?;

    let mut input = String::new();
    reader.read_line(&mut input)?;
    Ok(is_affirmative(&input))
}
