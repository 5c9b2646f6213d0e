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

//! Built-in classification tables
//!
//! This module contains the keyword, capability and option tables that
//! `RuleSet::base()` and `RuleSet::enhanced()` are assembled from.

use std::collections::BTreeMap;

use regex::Regex;

use crate::classifier::config::{CapabilityPattern, OptionPattern, RiskOverride, RuleLayer, TierRule};
use crate::core::types::{CapabilityFlag, RiskLevel};

/// Matches needed for each tier to fire in the base rule set
pub const CRITICAL_MIN_MATCHES: usize = 1;
pub const HIGH_RISK_MIN_MATCHES: usize = 2;
pub const MEDIUM_RISK_MIN_MATCHES: usize = 3;
pub const LOW_RISK_MIN_MATCHES: usize = 4;

/// Builds the keyword tiers, most severe first
///
/// Keywords are lower-case and matched as plain substrings of the
/// lower-cased documentation, so `"remove"` also counts `"removes"`.
///
/// # Tiers
/// - **CRITICAL**: irreversible destruction vocabulary, one hit is enough
/// - **HIGH_RISK**: deletion, permission and system changes
/// - **MEDIUM_RISK**: writes and network transfer
/// - **LOW_RISK**: read and inspection verbs
pub fn build_tier_rules() -> Vec<TierRule> {
    vec![
        TierRule::new(
            RiskLevel::Critical,
            &[
                "destroy",
                "erase",
                "wipe",
                "format",
                "delete permanently",
                "irreversible",
                "data loss",
                "cannot be undone",
                "destructive",
                "overwrite",
                "unrecoverable",
                "obliterate",
            ],
            CRITICAL_MIN_MATCHES,
        ),
        TierRule::new(
            RiskLevel::HighRisk,
            &[
                "delete",
                "remove",
                "modify",
                "change",
                "alter",
                "permission",
                "root",
                "sudo",
                "privilege",
                "system",
                "configuration",
                "recursive",
                "force",
                "unlink",
            ],
            HIGH_RISK_MIN_MATCHES,
        ),
        TierRule::new(
            RiskLevel::MediumRisk,
            &[
                "write", "create", "update", "edit", "move", "rename", "network", "connect", "download",
                "upload",
            ],
            MEDIUM_RISK_MIN_MATCHES,
        ),
        TierRule::new(
            RiskLevel::LowRisk,
            &["read", "list", "display", "show", "view", "check", "status", "info", "query"],
            LOW_RISK_MIN_MATCHES,
        ),
    ]
}

/// Builds the capability patterns of the base rule set
///
/// Each pattern runs against the lower-cased documentation and sets its
/// flag on any match. Security flags use loose alternations; tool feature
/// flags anchor on word boundaries to keep prose from tripping them.
pub fn build_capability_patterns() -> Vec<CapabilityPattern> {
    [
        // Security mechanics
        (CapabilityFlag::RequiresRoot, r"(requires?\s+root|must\s+be\s+root|superuser|sudo)"),
        (CapabilityFlag::Destructive, r"(destroy|delete|remove|erase|wipe|format)"),
        (CapabilityFlag::NetworkAccess, r"(network|internet|download|upload|remote|ssh|http)"),
        (CapabilityFlag::FileModification, r"(write|modify|create|delete|change.*file)"),
        (CapabilityFlag::SystemModification, r"(system|kernel|boot|service|daemon)"),
        (CapabilityFlag::PrivilegeEscalation, r"(setuid|privilege|escalat|sudo|root)"),
        // Tool features
        (CapabilityFlag::TextProcessing, r"\b(text|lines|characters)\b"),
        (CapabilityFlag::JsonHandling, r"\bjson\b"),
        (CapabilityFlag::FileOperations, r"\b(files?|director(y|ies))\b"),
        (CapabilityFlag::StdinSupport, r"(standard input|\bstdin\b)"),
        (CapabilityFlag::RecursiveOperations, r"recursive"),
        (CapabilityFlag::ParallelProcessing, r"(\bparallel\b|concurren)"),
        (CapabilityFlag::StreamingSupport, r"\bstream"),
        (CapabilityFlag::PatternMatching, r"(regular expression|\bpatterns?\b|\bregex)"),
        (CapabilityFlag::CaseHandling, r"(case[- ]?(in)?sensitiv|ignore[- ]case)"),
        (CapabilityFlag::WordBoundaries, r"(whole words?|word boundar)"),
        (CapabilityFlag::LineNumbering, r"line[- ]numbers?"),
        (CapabilityFlag::ContextAware, r"\bcontext\b"),
        (CapabilityFlag::BinarySupport, r"\bbinary\b"),
        (CapabilityFlag::Compression, r"(compress|\bgzip\b|\bzip\b|\bxz\b)"),
        (CapabilityFlag::NetworkOperations, r"\b(sockets?|tcp|udp|hosts?)\b"),
        (CapabilityFlag::RealTimeProcessing, r"(real[- ]time|\bfollow\b)"),
    ]
    .into_iter()
    .map(|(flag, pattern)| CapabilityPattern {
        flag,
        regex: Regex::new(pattern).expect("built-in capability pattern should be valid regex"),
    })
    .collect()
}

/// Builds the dangerous option patterns matched against the synopsis
///
/// These run on the original (not lower-cased) synopsis text, since `-R`
/// and `-r` can mean different things.
pub fn build_option_patterns() -> Vec<OptionPattern> {
    vec![
        OptionPattern {
            regex: Regex::new(r"-[rf]\s").expect("short -r/-f option pattern should be valid regex"),
            description: "recursive/force".to_string(),
        },
        OptionPattern {
            regex: Regex::new(r"--force").expect("--force pattern should be valid regex"),
            description: "force operation".to_string(),
        },
        OptionPattern {
            regex: Regex::new(r"--recursive").expect("--recursive pattern should be valid regex"),
            description: "recursive operation".to_string(),
        },
        OptionPattern {
            regex: Regex::new(r"--no-preserve-root").expect("--no-preserve-root pattern should be valid regex"),
            description: "no root protection".to_string(),
        },
        OptionPattern {
            regex: Regex::new(r"--remove").expect("--remove pattern should be valid regex"),
            description: "remove operation".to_string(),
        },
    ]
}

/// Builds the layer that turns the base rule set into the enhanced one
///
/// # Contents
/// - Extra CRITICAL vocabulary around execution and authentication
/// - Extra HIGH_RISK vocabulary from `dd`, `chmod` and `rm` documentation
/// - Four coarse capability patterns (bits 6-9)
/// - Reviewed tiers for `rm`, `dd` and `chmod`
pub fn build_enhanced_layer() -> RuleLayer {
    let mut keywords = BTreeMap::new();
    keywords.insert(
        RiskLevel::Critical,
        to_strings(&["execute", "security policy", "authentication", "superuser", "password"]),
    );
    keywords.insert(
        RiskLevel::HighRisk,
        to_strings(&[
            "conv",
            "noerror",
            "setgid",
            "recursive",
            "unlink",
            "notrunc",
            "fsync",
            "force",
            "sync",
            "setuid",
            "sticky bit",
        ]),
    );

    let capabilities = [
        (CapabilityFlag::FileSystemAccess, r"(file|system|access)"),
        (CapabilityFlag::ExecuteCommands, r"(execute|commands)"),
        (CapabilityFlag::AccessControl, r"(access|control)"),
        (CapabilityFlag::FileSystemChanges, r"(file|system|changes)"),
    ]
    .into_iter()
    .map(|(flag, pattern)| CapabilityPattern {
        flag,
        regex: Regex::new(pattern).expect("enhanced capability pattern should be valid regex"),
    })
    .collect();

    let mut overrides = BTreeMap::new();
    overrides.insert(
        "rm".to_string(),
        RiskOverride::new(
            RiskLevel::HighRisk,
            "rm can permanently delete files and directories, which could lead to data loss if used improperly.",
        ),
    );
    overrides.insert(
        "dd".to_string(),
        RiskOverride::new(
            RiskLevel::HighRisk,
            "dd can overwrite and corrupt data on disks and files, potentially causing data loss or system instability if misused.",
        ),
    );
    overrides.insert(
        "chmod".to_string(),
        RiskOverride::new(
            RiskLevel::HighRisk,
            "chmod can grant or revoke permissions on files and directories, potentially allowing unauthorized access or unintended changes.",
        ),
    );

    RuleLayer {
        keywords,
        min_matches: BTreeMap::new(),
        capabilities,
        overrides,
        unknown_risk: None,
    }
}

fn to_strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}
