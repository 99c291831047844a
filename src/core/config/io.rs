//! Optional on-disk overrides for the starting configuration.
//!
//! The file is only ever read. Precedence when resolving the starting
//! assistant is: command line, then this file, then the baked-in default.

use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;
use tracing::warn;

use super::{default_config, find_model, AssistantConfig};

/// Errors that can occur when loading configuration from disk.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read a file from disk.
    Read {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the configuration file as valid TOML.
    Parse {
        /// Path to the configuration file with invalid TOML.
        path: PathBuf,
        /// The TOML deserialization error.
        source: toml::de::Error,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "Failed to read {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "Failed to parse config at {}: {}", path.display(), source)
            }
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub name: Option<String>,
    pub model: Option<String>,
    pub system_instruction: Option<String>,
    /// Read the instruction from this file instead; relative paths resolve
    /// against the config file's directory.
    pub system_instruction_file: Option<PathBuf>,
    pub base_url: Option<String>,
}

/// Values given on the command line, applied over the file.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub name: Option<String>,
    pub model: Option<String>,
    pub system_instruction: Option<String>,
    pub system_instruction_file: Option<PathBuf>,
}

impl ConfigFile {
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "parley").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Loads `path`; a missing file yields the empty configuration.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut file: ConfigFile =
            toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if let (Some(instruction_file), Some(dir)) =
            (file.system_instruction_file.as_mut(), path.parent())
        {
            if instruction_file.is_relative() {
                *instruction_file = dir.join(&*instruction_file);
            }
        }
        Ok(file)
    }

    /// Loads `explicit` if given, else the platform default location.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load_from_path(path),
            None => match Self::default_path() {
                Some(path) => Self::load_from_path(&path),
                None => Ok(Self::default()),
            },
        }
    }

    /// Builds the starting assistant from the default, this file and
    /// `overrides`, in increasing precedence.
    pub fn resolve(&self, overrides: &ConfigOverrides) -> Result<AssistantConfig, ConfigError> {
        let mut config = default_config();

        if let Some(name) = &self.name {
            config.name = name.clone();
        }
        if let Some(model) = &self.model {
            if find_model(model).is_some() {
                config.model = model.clone();
            } else {
                warn!(model = %model, "ignoring config file model outside the allow-list");
            }
        }
        if let Some(instruction) = instruction_from(
            self.system_instruction.as_ref(),
            self.system_instruction_file.as_deref(),
        )? {
            config.system_instruction = instruction;
        }

        if let Some(name) = &overrides.name {
            config.name = name.clone();
        }
        if let Some(model) = &overrides.model {
            config.model = model.clone();
        }
        if let Some(instruction) = instruction_from(
            overrides.system_instruction.as_ref(),
            overrides.system_instruction_file.as_deref(),
        )? {
            config.system_instruction = instruction;
        }

        Ok(config)
    }
}

fn instruction_from(
    inline: Option<&String>,
    file: Option<&Path>,
) -> Result<Option<String>, ConfigError> {
    if let Some(path) = file {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        return Ok(Some(text.trim_end().to_string()));
    }
    Ok(inline.cloned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::defaults::{DEFAULT_MODEL, DEFAULT_NAME, DEFAULT_SYSTEM_INSTRUCTION};
    use std::io::Write;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn missing_file_resolves_to_the_default() {
        let dir = TempDir::new().unwrap();
        let file = ConfigFile::load_from_path(&dir.path().join("absent.toml")).unwrap();
        let config = file.resolve(&ConfigOverrides::default()).unwrap();

        assert_eq!(config.name, DEFAULT_NAME);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.system_instruction, DEFAULT_SYSTEM_INSTRUCTION);
    }

    #[test]
    fn file_values_override_defaults_and_flags_override_file() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
name = "Librarian"
model = "gemini-3-flash-preview"
system_instruction = "cite sources"
"#,
        );
        let file = ConfigFile::load_from_path(&path).unwrap();

        let from_file = file.resolve(&ConfigOverrides::default()).unwrap();
        assert_eq!(from_file.name, "Librarian");
        assert_eq!(from_file.model, "gemini-3-flash-preview");
        assert_eq!(from_file.system_instruction, "cite sources");

        let overrides = ConfigOverrides {
            name: Some("Helper".into()),
            ..Default::default()
        };
        let resolved = file.resolve(&overrides).unwrap();
        assert_eq!(resolved.name, "Helper");
        assert_eq!(resolved.system_instruction, "cite sources");
    }

    #[test]
    fn unlisted_file_model_falls_back_to_default() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "model = \"gpt-4o\"\n");
        let config = ConfigFile::load_from_path(&path)
            .unwrap()
            .resolve(&ConfigOverrides::default())
            .unwrap();
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn relative_instruction_file_resolves_next_to_config() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("persona.md"), "You are a librarian.\n\n").unwrap();
        let path = write_config(&dir, "system_instruction_file = \"persona.md\"\n");

        let config = ConfigFile::load_from_path(&path)
            .unwrap()
            .resolve(&ConfigOverrides::default())
            .unwrap();
        assert_eq!(config.system_instruction, "You are a librarian.");
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "name = [unterminated");
        let err = ConfigFile::load_from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "nmae = \"typo\"\n");
        assert!(ConfigFile::load_from_path(&path).is_err());
    }

    #[test]
    fn missing_instruction_file_is_a_read_error() {
        let overrides = ConfigOverrides {
            system_instruction_file: Some(PathBuf::from("/definitely/not/here.md")),
            ..Default::default()
        };
        let err = ConfigFile::default().resolve(&overrides).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
