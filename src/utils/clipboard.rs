use std::fmt;
use std::io::Write;
use std::process::{Command, Stdio};

/// Why a copy to the system clipboard did not happen.
#[derive(Debug)]
pub enum ClipboardError {
    /// None of the platform clipboard helpers could be started.
    Unavailable,
    /// A helper started but exited unsuccessfully or could not be fed.
    Failed { command: &'static str },
}

impl fmt::Display for ClipboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClipboardError::Unavailable => {
                write!(f, "No clipboard command found (install wl-copy, xclip, or xsel)")
            }
            ClipboardError::Failed { command } => {
                write!(f, "Clipboard command `{command}` failed")
            }
        }
    }
}

impl std::error::Error for ClipboardError {}

#[cfg(target_os = "macos")]
const HELPERS: &[(&str, &[&str])] = &[("pbcopy", &[])];

#[cfg(target_os = "windows")]
const HELPERS: &[(&str, &[&str])] = &[("clip", &[])];

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const HELPERS: &[(&str, &[&str])] = &[
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
];

/// Copies `text` with the first clipboard helper that can be started.
pub fn copy_to_clipboard(text: &str) -> Result<(), ClipboardError> {
    copy_with(HELPERS, text)
}

fn copy_with(helpers: &[(&'static str, &[&str])], text: &str) -> Result<(), ClipboardError> {
    let mut last_failure = None;
    for (command, args) in helpers {
        match run_with_stdin(command, args, text) {
            Ok(()) => return Ok(()),
            Err(ClipboardError::Unavailable) => continue,
            Err(err) => last_failure = Some(err),
        }
    }
    Err(last_failure.unwrap_or(ClipboardError::Unavailable))
}

fn run_with_stdin(command: &'static str, args: &[&str], input: &str) -> Result<(), ClipboardError> {
    let mut child = Command::new(command)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|_| ClipboardError::Unavailable)?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(input.as_bytes())
            .map_err(|_| ClipboardError::Failed { command })?;
    }

    match child.wait() {
        Ok(status) if status.success() => Ok(()),
        _ => Err(ClipboardError::Failed { command }),
    }
}
