//! Key-state options persisted as TOML.
//!
//! The embedding application decides where the file lives; this module only
//! defines the schema and the load/save helpers.  A missing file yields
//! [`KeyStateOptions::default`], so first runs need no setup.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for options file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing options at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse options TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The options could not be serialized to TOML.
    #[error("failed to serialize options: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Tunable behavior of [`KeyState`](crate::state::KeyState).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyStateOptions {
    /// Overrides the hardware keyboard type used to pick a resource
    /// section.  `None` queries the OS at init.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyboard_type: Option<u32>,

    /// Emit a press+release pair when the caps-lock flag toggles.  The
    /// hardware reports caps as a latched flag, not a held key, so a single
    /// edge would leave the remote side with a stuck key.
    #[serde(default = "default_true")]
    pub synthesize_caps_release: bool,
}

impl Default for KeyStateOptions {
    fn default() -> Self {
        KeyStateOptions {
            keyboard_type: None,
            synthesize_caps_release: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Loads options from `path`, returning defaults if the file does not yet
/// exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not
/// found", and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_options(path: &Path) -> Result<KeyStateOptions, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let options: KeyStateOptions = toml::from_str(&content)?;
            Ok(options)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(KeyStateOptions::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Persists `options` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_options(path: &Path, options: &KeyStateOptions) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    let content = toml::to_string_pretty(options)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
