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

//! Documentation sources
//!
//! A `DocumentationProvider` fetches the free text documentation of a
//! command. `Ok(None)` means the command has no documentation; errors are
//! split by whether a retry could help.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

/// Documentation fetch failure
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ProviderError {
    /// Worth retrying (timeouts, interrupted I/O).
    #[error("Transient documentation failure: {0}")]
    Transient(String),
    /// Retrying cannot help (missing tooling, rejected request).
    #[error("Permanent documentation failure: {0}")]
    Permanent(String),
}

/// Source of command documentation
#[async_trait]
pub trait DocumentationProvider: Send + Sync {
    /// Documentation for a normalised command, `None` if there is none
    async fn get_documentation(&self, command: &str) -> Result<Option<String>, ProviderError>;
}

/// In-memory documentation table
#[derive(Clone, Debug, Default)]
pub struct StaticProvider {
    docs: HashMap<String, String>,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the documentation of `command`
    pub fn with(mut self, command: impl Into<String>, documentation: impl Into<String>) -> Self {
        self.insert(command, documentation);
        self
    }

    pub fn insert(&mut self, command: impl Into<String>, documentation: impl Into<String>) {
        self.docs.insert(command.into(), documentation.into());
    }
}

impl<C: Into<String>, D: Into<String>> FromIterator<(C, D)> for StaticProvider {
    fn from_iter<I: IntoIterator<Item = (C, D)>>(iter: I) -> Self {
        Self {
            docs: iter.into_iter().map(|(c, d)| (c.into(), d.into())).collect(),
        }
    }
}

#[async_trait]
impl DocumentationProvider for StaticProvider {
    async fn get_documentation(&self, command: &str) -> Result<Option<String>, ProviderError> {
        Ok(self.docs.get(command).cloned())
    }
}

/// Reads manual pages through the system `man` command
///
/// Multi-word commands map to their hyphenated page (`git push` reads
/// `git-push`). If the default lookup finds nothing, sections 1, 8 and 5
/// are tried in that order.
#[derive(Clone, Debug)]
pub struct ManPageProvider {
    timeout: Duration,
    sections: Vec<String>,
}

impl Default for ManPageProvider {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            sections: vec!["1".to_string(), "8".to_string(), "5".to_string()],
        }
    }
}

impl ManPageProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-invocation timeout (default 5 s)
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Manual page name for a normalised command
    pub fn page_name(command: &str) -> String {
        command.split_whitespace().collect::<Vec<_>>().join("-")
    }

    async fn run_man(&self, args: &[&str]) -> Result<Option<String>, ProviderError> {
        let mut cmd = Command::new("man");
        cmd.args(args)
            .env("MANPAGER", "cat")
            .env("PAGER", "cat")
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Err(_) => {
                return Err(ProviderError::Transient(format!(
                    "man {} timed out after {:?}",
                    args.join(" "),
                    self.timeout
                )))
            }
            Ok(Err(err)) if err.kind() == ErrorKind::NotFound => {
                return Err(ProviderError::Permanent("man is not installed".to_string()))
            }
            Ok(Err(err)) => return Err(ProviderError::Transient(err.to_string())),
            Ok(Ok(output)) => output,
        };

        if output.status.success() && !output.stdout.is_empty() {
            Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()))
        } else {
            Ok(None)
        }
    }
}

#[async_trait]
impl DocumentationProvider for ManPageProvider {
    async fn get_documentation(&self, command: &str) -> Result<Option<String>, ProviderError> {
        let page = Self::page_name(command);

        if let Some(doc) = self.run_man(&[page.as_str()]).await? {
            return Ok(Some(doc));
        }
        for section in &self.sections {
            if let Some(doc) = self.run_man(&[section.as_str(), page.as_str()]).await? {
                log::debug!("found {} in man section {}", page, section);
                return Ok(Some(doc));
            }
        }

        log::debug!("no manual page for {}", page);
        Ok(None)
    }
}
