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

//! Documentation-driven risk classification.
//!
//! Turns the free text documentation of a command into a risk tier and a
//! capability set.
//!
//! # Classification Steps
//! 1. **Keyword tiers**: count distinct keywords per tier; the most severe
//!    tier whose count reaches its threshold wins, `SAFE` if none does
//! 2. **Capabilities**: every capability regex is matched on its own,
//!    independently of the tier
//! 3. **Dangerous options**: option patterns over the `SYNOPSIS` section
//! 4. **Overrides**: a reviewed tier for exactly this command replaces step 1
//!
//! Missing documentation is never read as safe. Without documentation and
//! without an override the command gets the rule set's unknown tier and
//! the `unverified` flag.
//!
//! Classification is a pure function of the command, the documentation
//! and the rule set.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use regex::Regex;

pub mod config;
pub mod error;
pub mod rules;

pub use config::{CapabilityPattern, OptionPattern, RiskOverride, RuleLayer, RuleSet, TierRule};
pub use error::ConfigError;

use crate::core::command::CommandName;
use crate::core::types::{CapabilityFlag, CapabilityFlags, RiskLevel};

/// Where a classification's risk tier came from
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Evidence {
    /// Scored from documentation
    Documented,
    /// Taken from a reviewed override
    Overridden { rationale: String },
    /// No documentation was available; the tier is an assumption
    Unavailable,
}

/// Result of classifying one command
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Classification {
    pub command: CommandName,
    pub risk: RiskLevel,
    pub capabilities: CapabilityFlags,
    /// Human-readable account of how the tier was reached
    pub rationale: String,
    /// Keywords that occurred, per tier (including tiers that did not fire)
    pub matched_keywords: BTreeMap<RiskLevel, Vec<String>>,
    /// Descriptions of dangerous options found in the synopsis
    pub dangerous_options: Vec<String>,
    pub evidence: Evidence,
}

impl Classification {
    /// True when the tier rests on documentation or review, not an assumption
    pub fn is_verified(&self) -> bool {
        !matches!(self.evidence, Evidence::Unavailable)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} {}", self.command, self.risk, self.capabilities)
    }
}

/// Keyword and pattern based classifier over a shared rule set
#[derive(Clone, Debug)]
pub struct RiskClassifier {
    rules: Arc<RuleSet>,
}

impl Default for RiskClassifier {
    fn default() -> Self {
        Self::new(RuleSet::base())
    }
}

impl RiskClassifier {
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules: Arc::new(rules),
        }
    }

    /// Shares an existing rule set without copying it
    pub fn with_shared(rules: Arc<RuleSet>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Classifies `command` from its documentation
    ///
    /// # Examples
    /// ```
    /// use capdesc::classifier::RiskClassifier;
    /// use capdesc::core::{CapabilityFlag, CommandName, RiskLevel};
    ///
    /// let classifier = RiskClassifier::default();
    /// let ls = CommandName::parse("ls").unwrap();
    ///
    /// let result = classifier.classify(&ls, Some("ls - list directory contents"));
    /// assert_eq!(result.risk, RiskLevel::Safe);
    /// assert!(result.capabilities.contains(CapabilityFlag::FileOperations));
    ///
    /// // No documentation is never read as safe
    /// let unknown = classifier.classify(&ls, None);
    /// assert_eq!(unknown.risk, RiskLevel::Critical);
    /// ```
    pub fn classify(&self, command: &CommandName, documentation: Option<&str>) -> Classification {
        let documentation = documentation.filter(|doc| !doc.trim().is_empty());
        let overridden = self.rules.override_for(command);

        let Some(doc) = documentation else {
            let mut capabilities = CapabilityFlags::EMPTY;
            capabilities.insert(CapabilityFlag::Unverified);

            return match overridden {
                Some(rule) => {
                    log::info!(
                        "{}: no documentation, using reviewed tier {} ({})",
                        command,
                        rule.risk,
                        rule.rationale
                    );
                    Classification {
                        command: command.clone(),
                        risk: rule.risk,
                        capabilities,
                        rationale: rule.rationale.clone(),
                        matched_keywords: BTreeMap::new(),
                        dangerous_options: Vec::new(),
                        evidence: Evidence::Overridden {
                            rationale: rule.rationale.clone(),
                        },
                    }
                }
                None => {
                    let risk = self.rules.unknown_risk();
                    log::debug!("{}: no documentation, assuming {}", command, risk);
                    Classification {
                        command: command.clone(),
                        risk,
                        capabilities,
                        rationale: format!("No documentation available; assuming {}", risk),
                        matched_keywords: BTreeMap::new(),
                        dangerous_options: Vec::new(),
                        evidence: Evidence::Unavailable,
                    }
                }
            };
        };

        let text = doc.to_lowercase();

        // Step 1: keyword tiers
        let mut matched_keywords = BTreeMap::new();
        let mut scored = RiskLevel::Safe;
        for tier in self.rules.tiers() {
            let hits = tier.matches(&text);
            if hits.len() >= tier.min_matches {
                scored = scored.max(tier.risk);
            }
            if !hits.is_empty() {
                matched_keywords.insert(tier.risk, hits.into_iter().map(String::from).collect::<Vec<_>>());
            }
        }

        // Step 2: capabilities
        let capabilities = self
            .rules
            .capability_patterns()
            .iter()
            .filter(|pattern| pattern.regex.is_match(&text))
            .map(|pattern| pattern.flag)
            .collect::<CapabilityFlags>();

        // Step 3: dangerous options
        let dangerous_options = synopsis_section(doc)
            .map(|synopsis| {
                self.rules
                    .option_patterns()
                    .iter()
                    .filter(|option| option.regex.is_match(synopsis))
                    .map(|option| option.description.clone())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        // Step 4: overrides
        let (risk, rationale, evidence) = match overridden {
            Some(rule) => {
                log::info!(
                    "{}: reviewed tier {} replaces scored tier {} ({})",
                    command,
                    rule.risk,
                    scored,
                    rule.rationale
                );
                (
                    rule.risk,
                    rule.rationale.clone(),
                    Evidence::Overridden {
                        rationale: rule.rationale.clone(),
                    },
                )
            }
            None => (
                scored,
                score_rationale(scored, &matched_keywords, &dangerous_options),
                Evidence::Documented,
            ),
        };

        log::debug!("{}: classified {} with {}", command, risk, capabilities);

        Classification {
            command: command.clone(),
            risk,
            capabilities,
            rationale,
            matched_keywords,
            dangerous_options,
            evidence,
        }
    }
}

/// Body of the `SYNOPSIS` section, up to the first blank line or `DESCRIPTION`
pub fn synopsis_section(doc: &str) -> Option<&str> {
    static HEADER: OnceLock<Regex> = OnceLock::new();
    let header = HEADER.get_or_init(|| Regex::new(r"SYNOPSIS\s*\n").expect("synopsis header pattern should be valid regex"));

    let start = header.find(doc)?.end();
    let rest = &doc[start..];
    let end = [rest.find("\n\n"), rest.find("\nDESCRIPTION")]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(rest.len());
    Some(&rest[..end])
}

fn score_rationale(
    risk: RiskLevel,
    matched: &BTreeMap<RiskLevel, Vec<String>>,
    dangerous_options: &[String],
) -> String {
    let mut rationale = match matched.get(&risk) {
        Some(keywords) if risk != RiskLevel::Safe => {
            format!("{} keywords matched: {}", risk, keywords.join(", "))
        }
        _ => "No risk tier reached its keyword threshold".to_string(),
    };
    if !dangerous_options.is_empty() {
        rationale.push_str(&format!("; dangerous options: {}", dangerous_options.join(", ")));
    }
    rationale
}

#[cfg(test)]
mod tests;
