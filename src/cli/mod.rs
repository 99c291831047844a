//! Command-line interface parsing and handling
//!
//! Parses arguments, installs logging, resolves the starting assistant and
//! dispatches to the chat loop or one of the one-shot commands.

pub mod model_list;
pub mod say;

use std::error::Error;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use clap::builder::PossibleValuesParser;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::cli::model_list::list_models;
use crate::cli::say::run_say;
use crate::core::app::App;
use crate::core::config::{ConfigFile, ConfigOverrides, AVAILABLE_MODELS};
use crate::core::credentials::ProviderSettings;
use crate::core::gemini::GeminiBackend;
use crate::core::session::SessionFactory;
use crate::ui::chat_loop::run_chat;
use crate::ui::theme::Theme;

#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(version)]
#[command(about = "A terminal chat client for a configurable Gemini assistant")]
#[command(
    long_about = "Parley is a full-screen terminal chat with one configurable assistant \
backed by a hosted Gemini model. Replies stream in as they are generated.\n\n\
Environment Variables:\n\
  GEMINI_API_KEY    API key (falls back to API_KEY)\n\
  GEMINI_BASE_URL   Custom API base URL (optional)\n\
  RUST_LOG          Log filter (default: warn)\n\n\
Controls:\n\
  Enter             Send the message\n\
  Shift/Alt+Enter   Insert a newline\n\
  Tab / Shift+Tab   Move between the input and the settings fields\n\
  Ctrl+O            Show or hide the settings panel on narrow terminals\n\
  Ctrl+R            Apply settings and restart the chat\n\
  Ctrl+Y            Copy the latest reply\n\
  PageUp/PageDown   Scroll the conversation\n\
  Ctrl+C            Quit"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to chat with
    #[arg(
        short = 'm',
        long,
        global = true,
        value_name = "MODEL",
        value_parser = PossibleValuesParser::new(AVAILABLE_MODELS.iter().map(|m| m.id))
    )]
    pub model: Option<String>,

    /// Assistant name
    #[arg(short = 'n', long, global = true)]
    pub name: Option<String>,

    /// System instruction text
    #[arg(short = 'i', long, global = true, conflicts_with = "instruction_file")]
    pub instruction: Option<String>,

    /// Read the system instruction from a file
    #[arg(long, global = true, value_name = "PATH")]
    pub instruction_file: Option<PathBuf>,

    /// Config file to use instead of the default location
    #[arg(short = 'c', long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write diagnostic logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Log at debug level
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Send one prompt and stream the reply to stdout
    Say {
        /// Prompt text
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// List the models the assistant can use
    Models,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            name: self.name.clone(),
            model: self.model.clone(),
            system_instruction: self.instruction.clone(),
            system_instruction_file: self.instruction_file.clone(),
        }
    }

    fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Chat)
    }
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(&args)?;
    tokio::runtime::Runtime::new()?.block_on(async_main(args))
}

fn log_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    }
}

/// Chat mode owns the terminal, so it only logs when given a file. The
/// one-shot commands log to stderr.
fn init_tracing(args: &Args) -> Result<(), Box<dyn Error>> {
    let filter = log_filter(args.verbose);
    match (&args.log_file, args.command()) {
        (Some(path), _) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        (None, Commands::Chat) => {}
        (None, _) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

fn build_session_factory(file: &ConfigFile) -> SessionFactory {
    let settings = ProviderSettings::from_env(file.base_url.as_deref());
    let backend = GeminiBackend::new(reqwest::Client::new(), settings);
    SessionFactory::new(Arc::new(backend))
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    let file = ConfigFile::load(args.config.as_deref())?;
    let config = file.resolve(&args.overrides())?;
    debug!(name = %config.name, model = %config.model, "resolved assistant");

    match args.command() {
        Commands::Chat => {
            let app = App::new(config, build_session_factory(&file), Theme::detect());
            run_chat(app).await
        }
        Commands::Say { prompt } => run_say(prompt, config, build_session_factory(&file)).await,
        Commands::Models => {
            list_models(&config.model)?;
            Ok(())
        }
    }
}
