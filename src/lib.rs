//! Parley is a terminal chat client for a single configurable assistant backed
//! by a hosted Gemini model.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the assistant configuration, session creation, the
//!   streaming transport, the message log, and the send state machine.
//! - [`ui`] renders the terminal interface and runs the interactive event loop
//!   that drives user input and display updates.
//! - [`api`] defines the provider wire payloads used by the transport.
//! - [`cli`] parses arguments, installs logging, and dispatches into the chat
//!   loop or the one-shot commands.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
