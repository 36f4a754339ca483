//! Terminal output for the one-shot commands: toned notes, status lines and a summary table.

use std::io::IsTerminal;

use flatframe_core::Status;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// What a note reports. Decides its marker, colour and output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Info,
    Warn,
    Error,
    Success,
}

impl Tone {
    fn color(self) -> &'static str {
        match self {
            Tone::Info => "\x1b[36m",
            Tone::Warn => "\x1b[33m",
            Tone::Error => "\x1b[31m",
            Tone::Success => "\x1b[32m",
        }
    }

    fn marker(self) -> &'static str {
        match self {
            Tone::Info => "ℹ",
            Tone::Warn => "⚠",
            Tone::Error => "✗",
            Tone::Success => "✓",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Tone::Info => "INFO",
            Tone::Warn => "WARN",
            Tone::Error => "ERROR",
            Tone::Success => "OK",
        }
    }

    fn to_stderr(self) -> bool {
        self == Tone::Error
    }
}

/// Colour only when the target stream is a terminal and `NO_COLOR` is unset.
fn color_enabled(stderr: bool) -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if stderr {
        std::io::stderr().is_terminal()
    } else {
        std::io::stdout().is_terminal()
    }
}

fn format_note(tone: Tone, msg: &str, color: bool) -> String {
    if color {
        format!("{}{BOLD}{}{RESET} {msg}", tone.color(), tone.marker())
    } else {
        format!("{}: {msg}", tone.label())
    }
}

pub fn note(tone: Tone, msg: &str) {
    let line = format_note(tone, msg, color_enabled(tone.to_stderr()));
    if tone.to_stderr() {
        eprintln!("{line}");
    } else {
        println!("{line}");
    }
}

fn format_status(status: Status, detail: &str, color: bool) -> String {
    if color {
        format!("{DIM}[{status}]{RESET} {detail}")
    } else {
        format!("[{status}] {detail}")
    }
}

/// Announce a status change reported by the studio.
pub fn note_status(status: Status, detail: &str) {
    println!("{}", format_status(status, detail, color_enabled(false)));
}

/// Render `label: value` rows for stdout with the labels padded to a common width.
pub fn render_summary(rows: &[(&str, String)]) -> String {
    summary_table(rows, color_enabled(false))
}

fn summary_table(rows: &[(&str, String)], color: bool) -> String {
    let width = rows
        .iter()
        .map(|(label, _)| label.chars().count())
        .max()
        .unwrap_or(0);

    rows.iter()
        .map(|(label, value)| {
            let pad = " ".repeat(width - label.chars().count());
            if color {
                format!("  {BOLD}{label}{RESET}{pad}  {value}\n")
            } else {
                format!("  {label}{pad}  {value}\n")
            }
        })
        .collect()
}
