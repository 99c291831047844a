//! TUI-less "say" command

use std::error::Error;
use std::io::{self, Write};

use tracing::error;

use crate::core::app::STREAM_FAILURE_MESSAGE;
use crate::core::config::AssistantConfig;
use crate::core::session::{ChatSession, SessionFactory, TransportError};

pub async fn run_say(
    prompt: Vec<String>,
    config: AssistantConfig,
    factory: SessionFactory,
) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    if prompt.trim().is_empty() {
        eprintln!("Usage: parley say <prompt>");
        std::process::exit(2);
    }

    let session = factory.create_session(&config.model, &config.system_instruction);
    let mut stdout = io::stdout();
    match stream_reply(&session, &prompt, &mut stdout).await {
        Ok(_) => {
            writeln!(stdout)?;
            Ok(())
        }
        Err(SayError::Transport(err)) => {
            error!(session = session.id(), "say failed: {err}");
            eprintln!("\n{STREAM_FAILURE_MESSAGE}");
            std::process::exit(1);
        }
        Err(SayError::Output(err)) => Err(err.into()),
    }
}

#[derive(Debug)]
pub enum SayError {
    Transport(TransportError),
    Output(io::Error),
}

/// Streams one reply into `out`, writing only the text each snapshot adds.
pub async fn stream_reply<W>(
    session: &ChatSession,
    prompt: &str,
    out: &mut W,
) -> Result<String, SayError>
where
    W: Write + Send,
{
    let mut printed = 0usize;
    let mut write_error: Option<io::Error> = None;

    let result = session
        .send_message_stream(prompt, |snapshot| {
            if write_error.is_some() {
                return;
            }
            let suffix = snapshot.get(printed..).unwrap_or(snapshot);
            if let Err(err) = out.write_all(suffix.as_bytes()).and_then(|_| out.flush()) {
                write_error = Some(err);
            }
            printed = snapshot.len();
        })
        .await;

    if let Some(err) = write_error {
        return Err(SayError::Output(err));
    }
    result.map_err(SayError::Transport)
}
