// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Command name validation and normalisation
//!
//! Every command that reaches the classifier, the codec or the store goes
//! through `CommandName::parse` first. The normalised form is the cache key
//! and the input to the identity hash, so `git  push` and ` git push`
//! resolve to the same descriptor.
//!
//! # Rejected input
//! - Empty or whitespace-only names
//! - Names longer than `MAX_COMMAND_LEN` bytes
//! - Control characters (including newlines)
//! - Shell metacharacters: a descriptor names a tool, never a pipeline

use std::fmt;
use thiserror::Error;

/// Maximum length of a normalised command name in bytes
pub const MAX_COMMAND_LEN: usize = 256;

/// Command name validation errors
#[derive(Clone, Debug, Error, PartialEq)]
pub enum CommandError {
    /// Nothing left after trimming
    #[error("Command name is empty")]
    Empty,

    /// Normalised name exceeds the length limit
    #[error("Command name too long: {0} bytes (max 256)")]
    TooLong(usize),

    /// Control characters are never part of a tool name
    #[error("Command name contains control characters")]
    ControlCharacter,

    /// Shell metacharacters would make the name a pipeline
    #[error("Shell metacharacters detected in command name: '{0}'")]
    ShellMetacharacters(String),
}

/// Checks for shell metacharacters that turn a name into a pipeline
///
/// Detects: ; | & $ ` ( ) { } [ ] < > \ " '
pub fn check_shell_metacharacters(input: &str) -> Result<(), CommandError> {
    const DANGEROUS_CHARS: &[char] = &[
        ';', '|', '&', '$', '`', '(', ')', '{', '}',
        '[', ']', '<', '>', '\\', '"', '\'',
    ];

    if input.contains(DANGEROUS_CHARS) {
        return Err(CommandError::ShellMetacharacters(input.to_string()));
    }

    Ok(())
}

/// A validated, whitespace-normalised command name
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct CommandName(String);

impl CommandName {
    /// Validates and normalises a raw command string
    ///
    /// # Examples
    /// ```
    /// use capdesc::core::CommandName;
    ///
    /// let name = CommandName::parse("  git   push ").unwrap();
    /// assert_eq!(name.as_str(), "git push");
    /// assert_eq!(name.root(), "git");
    /// ```
    pub fn parse(raw: &str) -> Result<Self, CommandError> {
        // Tabs collapse like spaces, everything else (newlines included) is rejected
        if raw.chars().any(|c| c.is_control() && c != '\t') {
            return Err(CommandError::ControlCharacter);
        }

        let normalised = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        if normalised.is_empty() {
            return Err(CommandError::Empty);
        }
        if normalised.len() > MAX_COMMAND_LEN {
            return Err(CommandError::TooLong(normalised.len()));
        }
        check_shell_metacharacters(&normalised)?;

        Ok(Self(normalised))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First token: the tool a subcommand belongs to
    pub fn root(&self) -> &str {
        self.0.split(' ').next().unwrap_or(&self.0)
    }

    /// Everything after the root token, if any
    pub fn subcommand(&self) -> Option<&str> {
        self.0.split_once(' ').map(|(_, rest)| rest)
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CommandName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
