//! Classification rule sets
//!
//! A `RuleSet` is assembled once and never mutated afterwards. Composition
//! goes through `RuleSet::with_layer`, which consumes a set and a
//! `RuleLayer` and returns a new set.
//!
//! # Rule files
//! Layers can be loaded from TOML:
//!
//! ```toml
//! unknown_risk = "HIGH_RISK"
//!
//! [tiers.HIGH_RISK]
//! keywords = ["shred", "truncate"]
//! min_matches = 2
//!
//! [[capabilities]]
//! flag = "network_access"
//! pattern = "(curl|wget|rsync)"
//!
//! [overrides.rm]
//! risk = "HIGH_RISK"
//! rationale = "Reviewed: deletes files, never the whole system"
//! ```
//!
//! Every name and pattern in the file is checked at load time.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::Deserialize;

use crate::classifier::error::ConfigError;
use crate::classifier::rules;
use crate::core::command::CommandName;
use crate::core::types::{CapabilityFlag, RiskLevel};

/// Keyword tier: fires when at least `min_matches` distinct keywords occur
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TierRule {
    pub risk: RiskLevel,
    pub keywords: Vec<String>,
    pub min_matches: usize,
}

impl TierRule {
    pub fn new(risk: RiskLevel, keywords: &[&str], min_matches: usize) -> Self {
        Self {
            risk,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            min_matches,
        }
    }

    /// Distinct keywords of this tier occurring in `text` (already lower-cased)
    pub fn matches<'a>(&'a self, text: &str) -> Vec<&'a str> {
        self.keywords
            .iter()
            .filter(|keyword| text.contains(keyword.as_str()))
            .map(String::as_str)
            .collect()
    }
}

/// Regex that sets one capability flag
#[derive(Clone, Debug)]
pub struct CapabilityPattern {
    pub flag: CapabilityFlag,
    pub regex: Regex,
}

/// Regex over the synopsis that reports a dangerous option
#[derive(Clone, Debug)]
pub struct OptionPattern {
    pub regex: Regex,
    pub description: String,
}

/// Reviewed tier for one command, taking precedence over keyword scoring
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RiskOverride {
    pub risk: RiskLevel,
    pub rationale: String,
}

impl RiskOverride {
    pub fn new(risk: RiskLevel, rationale: impl Into<String>) -> Self {
        Self {
            risk,
            rationale: rationale.into(),
        }
    }
}

/// Immutable classification rules
#[derive(Clone, Debug)]
pub struct RuleSet {
    tiers: Vec<TierRule>,
    capabilities: Vec<CapabilityPattern>,
    options: Vec<OptionPattern>,
    overrides: HashMap<String, RiskOverride>,
    unknown_risk: RiskLevel,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::base()
    }
}

impl RuleSet {
    /// Built-in keyword, capability and option tables
    pub fn base() -> Self {
        Self {
            tiers: rules::build_tier_rules(),
            capabilities: rules::build_capability_patterns(),
            options: rules::build_option_patterns(),
            overrides: HashMap::new(),
            unknown_risk: RiskLevel::MOST_CONSERVATIVE,
        }
    }

    /// Base tables plus the built-in enhanced layer
    pub fn enhanced() -> Self {
        Self::base()
            .with_layer(rules::build_enhanced_layer())
            .expect("built-in enhanced layer should compose onto base rules")
    }

    /// Composes `layer` on top of this rule set
    ///
    /// - Keywords are appended to their tier, lower-cased and deduplicated
    /// - A capability pattern replaces the existing one for its flag, or is added
    /// - Overrides replace or add per command
    /// - `min_matches` and `unknown_risk` replace the current values when given
    ///
    /// # Errors
    /// - `ConfigError::InvalidTier` for keywords or thresholds on `SAFE`
    /// - `ConfigError::InvalidThreshold` for `min_matches == 0`
    /// - `ConfigError::InvalidCommand` for override keys that are not command names
    /// - `ConfigError::MissingRationale` for overrides without a justification
    pub fn with_layer(mut self, layer: RuleLayer) -> Result<Self, ConfigError> {
        for (risk, keywords) in layer.keywords {
            let tier = self.tier_mut(risk)?;
            for keyword in keywords {
                let keyword = keyword.trim().to_lowercase();
                if !keyword.is_empty() && !tier.keywords.contains(&keyword) {
                    tier.keywords.push(keyword);
                }
            }
        }

        for (risk, min_matches) in layer.min_matches {
            if min_matches == 0 {
                return Err(ConfigError::InvalidThreshold {
                    tier: risk.to_string(),
                    value: min_matches,
                });
            }
            self.tier_mut(risk)?.min_matches = min_matches;
        }

        for pattern in layer.capabilities {
            match self.capabilities.iter_mut().find(|p| p.flag == pattern.flag) {
                Some(existing) => *existing = pattern,
                None => self.capabilities.push(pattern),
            }
        }

        for (command, rule) in layer.overrides {
            let name = CommandName::parse(&command).map_err(|source| ConfigError::InvalidCommand {
                command: command.clone(),
                source,
            })?;
            if rule.rationale.trim().is_empty() {
                return Err(ConfigError::MissingRationale(command));
            }
            self.overrides.insert(name.as_str().to_string(), rule);
        }

        if let Some(risk) = layer.unknown_risk {
            self.unknown_risk = risk;
        }

        Ok(self)
    }

    /// Keyword tiers, most severe first
    pub fn tiers(&self) -> &[TierRule] {
        &self.tiers
    }

    pub fn tier(&self, risk: RiskLevel) -> Option<&TierRule> {
        self.tiers.iter().find(|tier| tier.risk == risk)
    }

    pub fn capability_patterns(&self) -> &[CapabilityPattern] {
        &self.capabilities
    }

    pub fn option_patterns(&self) -> &[OptionPattern] {
        &self.options
    }

    /// Override for exactly this normalised command
    ///
    /// An override for `rm` does not cover `rm -rf /`: argument and
    /// subcommand forms are scored from their own documentation.
    pub fn override_for(&self, command: &CommandName) -> Option<&RiskOverride> {
        self.overrides.get(command.as_str())
    }

    /// Tier assigned when no documentation is available
    pub fn unknown_risk(&self) -> RiskLevel {
        self.unknown_risk
    }

    fn tier_mut(&mut self, risk: RiskLevel) -> Result<&mut TierRule, ConfigError> {
        if risk == RiskLevel::Safe {
            return Err(ConfigError::InvalidTier(risk.to_string()));
        }
        // Every rule set starts from `base()`, which carries all four tiers
        self.tiers
            .iter_mut()
            .find(|tier| tier.risk == risk)
            .ok_or_else(|| ConfigError::InvalidTier(risk.to_string()))
    }
}

/// Validated additions to a rule set
#[derive(Clone, Debug, Default)]
pub struct RuleLayer {
    pub keywords: BTreeMap<RiskLevel, Vec<String>>,
    pub min_matches: BTreeMap<RiskLevel, usize>,
    pub capabilities: Vec<CapabilityPattern>,
    pub overrides: BTreeMap<String, RiskOverride>,
    pub unknown_risk: Option<RiskLevel>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLayer {
    #[serde(default)]
    unknown_risk: Option<String>,
    #[serde(default)]
    tiers: BTreeMap<String, RawTier>,
    #[serde(default)]
    capabilities: Vec<RawCapability>,
    #[serde(default)]
    overrides: BTreeMap<String, RawOverride>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTier {
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    min_matches: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCapability {
    flag: String,
    pattern: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOverride {
    risk: String,
    #[serde(default)]
    rationale: String,
}

impl RuleLayer {
    /// Parses and validates a TOML rule layer
    ///
    /// # Errors
    /// - `ConfigError::Parse` for malformed TOML or unknown keys
    /// - `ConfigError::UnknownRiskLevel` / `UnknownCapability` for bad names
    /// - `ConfigError::InvalidPattern` for regexes that do not compile
    /// - `ConfigError::MissingRationale` for overrides without a justification
    ///
    /// Capability patterns are compiled case-insensitively: they run against
    /// lower-cased documentation, so `SUDO` and `sudo` mean the same thing.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let raw: RawLayer = toml::from_str(text)?;
        let mut layer = RuleLayer {
            unknown_risk: raw.unknown_risk.as_deref().map(parse_risk).transpose()?,
            ..RuleLayer::default()
        };

        for (name, tier) in raw.tiers {
            let risk = parse_risk(&name)?;
            if !tier.keywords.is_empty() {
                layer.keywords.insert(risk, tier.keywords);
            }
            if let Some(min_matches) = tier.min_matches {
                layer.min_matches.insert(risk, min_matches);
            }
        }

        for capability in raw.capabilities {
            let flag = CapabilityFlag::from_name(&capability.flag)
                .ok_or_else(|| ConfigError::UnknownCapability(capability.flag.clone()))?;
            let regex = RegexBuilder::new(&capability.pattern)
                .case_insensitive(true)
                .build()
                .map_err(|source| ConfigError::InvalidPattern {
                pattern: capability.pattern.clone(),
                source,
            })?;
            layer.capabilities.push(CapabilityPattern { flag, regex });
        }

        for (command, rule) in raw.overrides {
            if rule.rationale.trim().is_empty() {
                return Err(ConfigError::MissingRationale(command));
            }
            let risk = parse_risk(&rule.risk)?;
            layer.overrides.insert(command, RiskOverride::new(risk, rule.rationale));
        }

        Ok(layer)
    }

    /// Reads a rule layer from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("loaded rule layer from {}", path.display());
        Self::from_toml_str(&text)
    }
}

fn parse_risk(name: &str) -> Result<RiskLevel, ConfigError> {
    RiskLevel::from_name(name).ok_or_else(|| ConfigError::UnknownRiskLevel(name.to_string()))
}
