//! Errors raised while locating, parsing or validating modem settings.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read settings from '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file exists but is not valid TOML for [`Config`](super::Config).
    #[error("Malformed settings in '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Cannot encode settings: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("Cannot write settings to '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A setting that no modem session could use, e.g. an empty device.
    #[error("Bad value for '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },

    /// An `AT_TTY_*` override that does not parse.
    #[error("Environment override {var}={value:?} is not a valid {expected}")]
    BadOverride {
        var: String,
        value: String,
        expected: &'static str,
    },

    /// `save()` on a loader that was built from defaults only.
    #[error("No settings file to save to")]
    NoPath,
}

impl ConfigError {
    pub fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
