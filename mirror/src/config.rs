//! Engine Configuration
//!
//! Loaded from TOML:
//!
//! ```toml
//! [binding]
//! public = true
//! non_public = false
//! instance = true
//! static = true
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::member::BindingFlags;

/// Errors from loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Configuration for resolution and invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which members resolution may select.
    pub binding: BindingConfig,
}

/// Member filter. Every category is admitted by default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingConfig {
    /// Admit public members.
    pub public: bool,

    /// Admit protected and private members.
    pub non_public: bool,

    /// Admit instance members.
    pub instance: bool,

    /// Admit static members.
    #[serde(rename = "static")]
    pub statics: bool,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            public: true,
            non_public: true,
            instance: true,
            statics: true,
        }
    }
}

impl BindingConfig {
    pub fn flags(&self) -> BindingFlags {
        let mut flags = BindingFlags::empty();
        flags.set(BindingFlags::PUBLIC, self.public);
        flags.set(BindingFlags::NON_PUBLIC, self.non_public);
        flags.set(BindingFlags::INSTANCE, self.instance);
        flags.set(BindingFlags::STATIC, self.statics);
        flags
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Binding flags for the resolver.
    pub fn flags(&self) -> BindingFlags {
        self.binding.flags()
    }
}
