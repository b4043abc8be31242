//! Colour and glyph helpers for terminal output.
//!
//! Everything here targets stdout except [`error_stderr`], which checks
//! stderr's terminal so redirecting one stream does not affect the other.

use console::Style;

fn marked(mark: &str, style: &Style, msg: &str) -> String {
    format!("{} {}", style.apply_to(mark), style.apply_to(msg))
}

/// Green check before an unstyled message.
pub fn success(msg: &str) -> String {
    format!("{} {}", Style::new().green().apply_to("✓"), msg)
}

pub fn error(msg: &str) -> String {
    marked("✗", &Style::new().red(), msg)
}

/// [`error`] for lines written with `eprintln!`.
pub fn error_stderr(msg: &str) -> String {
    marked("✗", &Style::new().for_stderr().red(), msg)
}

pub fn warn(msg: &str) -> String {
    marked("⚠", &Style::new().yellow(), msg)
}

pub fn header(msg: &str) -> String {
    Style::new().bold().apply_to(msg).to_string()
}

pub fn dim(msg: &str) -> String {
    Style::new().dim().apply_to(msg).to_string()
}

/// Red diff body, one styled line at a time so terminals reset per line.
pub fn diff(text: &str) -> String {
    let style = Style::new().red();
    text.lines()
        .map(|line| style.apply_to(line).to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn sha(sha: &str) -> String {
    Style::new().yellow().apply_to(sha).to_string()
}
