pub mod app;
pub mod chat_stream;
pub mod config;
pub mod credentials;
pub mod exchange;
pub mod gemini;
pub mod message;
pub mod message_log;
pub mod session;
