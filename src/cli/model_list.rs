//! Model listing

use std::io::{self, Write};

use crate::core::config::AVAILABLE_MODELS;

/// Prints the allow-list, marking `active`.
pub fn list_models(active: &str) -> io::Result<()> {
    write_models(&mut io::stdout(), active)
}

fn write_models<W: Write>(out: &mut W, active: &str) -> io::Result<()> {
    writeln!(out, "Available models:")?;
    for option in AVAILABLE_MODELS.iter() {
        let marker = if option.id == active { "*" } else { " " };
        writeln!(out, " {marker} {:<26} {}", option.id, option.label)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marks_only_the_active_model() {
        let mut out = Vec::new();
        write_models(&mut out, "gemini-3-pro-preview").unwrap();
        let text = String::from_utf8(out).unwrap();

        let marked: Vec<_> = text.lines().filter(|line| line.starts_with(" *")).collect();
        assert_eq!(marked.len(), 1);
        assert!(marked[0].contains("gemini-3-pro-preview"));
        assert!(marked[0].contains("Gemini 3.0 Pro (Reasoning)"));
        assert_eq!(text.lines().count(), AVAILABLE_MODELS.len() + 1);
    }
}
