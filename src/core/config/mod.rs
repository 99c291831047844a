//! Assistant configuration.
//!
//! [`AssistantConfig`] is what the user edits; [`ConfigStore`] holds the
//! current value for the view. The baked-in persona lives in [`defaults`] and
//! the optional on-disk overrides in [`io`].

pub mod defaults;
pub mod io;

use serde::{Deserialize, Serialize};

pub use defaults::{default_config, find_model, ModelOption, AVAILABLE_MODELS};
pub use io::{ConfigError, ConfigFile, ConfigOverrides};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantConfig {
    pub name: String,
    pub system_instruction: String,
    pub model: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        default_config()
    }
}

impl AssistantConfig {
    /// Greeting that opens every new chat.
    pub fn greeting(&self) -> String {
        format!("Hello! I am **{}**. How can I help you today?", self.name)
    }

    /// Model id without the provider family prefix, for compact labels.
    pub fn short_model(&self) -> &str {
        self.model.strip_prefix("gemini-").unwrap_or(&self.model)
    }

    /// The allow-list entry after (or before) the current model. A model
    /// outside the list moves to the first entry.
    pub fn cycle_model(&self, forward: bool) -> &'static str {
        let len = AVAILABLE_MODELS.len();
        let next = match AVAILABLE_MODELS.iter().position(|m| m.id == self.model) {
            Some(index) if forward => (index + 1) % len,
            Some(index) => (index + len - 1) % len,
            None => 0,
        };
        AVAILABLE_MODELS[next].id
    }
}

/// Current configuration as seen by the view. Every `set` replaces the whole
/// value.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    current: AssistantConfig,
}

impl ConfigStore {
    pub fn new(initial: AssistantConfig) -> Self {
        Self { current: initial }
    }

    pub fn get(&self) -> &AssistantConfig {
        &self.current
    }

    pub fn set(&mut self, config: AssistantConfig) {
        self.current = config;
    }

    pub fn update<F>(&mut self, edit: F)
    where
        F: FnOnce(&mut AssistantConfig),
    {
        let mut next = self.current.clone();
        edit(&mut next);
        self.set(next);
    }
}
