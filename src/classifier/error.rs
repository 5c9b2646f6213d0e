use std::path::PathBuf;
use thiserror::Error;

use crate::core::command::CommandError;

/// Errors that can occur while loading or composing classification rules.
///
/// Raw rule text is checked when a layer is loaded; a `RuleSet` that exists
/// is always usable.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Capability name does not match any known flag.
    #[error("Unknown capability flag: {0}")]
    UnknownCapability(String),
    /// Risk tier name is not recognised.
    #[error("Unknown risk level: {0}")]
    UnknownRiskLevel(String),
    /// `SAFE` has no keyword tier; it is what remains when nothing fires.
    #[error("Risk level {0} cannot carry keyword rules")]
    InvalidTier(String),
    /// A keyword tier must require at least one match.
    #[error("Invalid min_matches for {tier}: {value}")]
    InvalidThreshold { tier: String, value: usize },
    /// Capability pattern is not a valid regex.
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    /// Override key is not a valid command name.
    #[error("Invalid override command '{command}': {source}")]
    InvalidCommand {
        command: String,
        #[source]
        source: CommandError,
    },
    /// Override carries no justification.
    #[error("Override for '{0}' has no rationale")]
    MissingRationale(String),
    /// Rule file is not valid TOML for a rule layer.
    #[error("Failed to parse rules: {0}")]
    Parse(#[from] toml::de::Error),
    /// Rule file could not be read.
    #[error("Failed to read rules file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
