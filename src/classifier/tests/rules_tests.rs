use crate::classifier::rules::*;
use crate::classifier::synopsis_section;
use crate::core::types::{CapabilityFlag, RiskLevel};

#[test]
fn test_tiers_are_most_severe_first() {
    let tiers = build_tier_rules();
    let order: Vec<RiskLevel> = tiers.iter().map(|t| t.risk).collect();
    assert_eq!(
        order,
        vec![RiskLevel::Critical, RiskLevel::HighRisk, RiskLevel::MediumRisk, RiskLevel::LowRisk]
    );
}

#[test]
fn test_base_thresholds() {
    let tiers = build_tier_rules();
    let thresholds: Vec<usize> = tiers.iter().map(|t| t.min_matches).collect();
    assert_eq!(thresholds, vec![1, 2, 3, 4]);
}

#[test]
fn test_keywords_are_lower_case_and_unique() {
    for tier in build_tier_rules() {
        for (i, keyword) in tier.keywords.iter().enumerate() {
            assert_eq!(keyword, &keyword.to_lowercase());
            assert!(!tier.keywords[i + 1..].contains(keyword), "duplicate keyword {}", keyword);
        }
    }
}

#[test]
fn test_tier_matches_count_distinct_keywords() {
    let tiers = build_tier_rules();
    let high = &tiers[1];
    // "remove" appears three times but counts once
    let hits = high.matches("remove, remove, remove and delete");
    assert_eq!(hits, vec!["delete", "remove"]);
}

#[test]
fn test_capability_patterns_compile_and_are_unique() {
    let patterns = build_capability_patterns();
    for (i, pattern) in patterns.iter().enumerate() {
        assert!(
            patterns[i + 1..].iter().all(|p| p.flag != pattern.flag),
            "flag {} has two patterns",
            pattern.flag
        );
    }
    assert!(patterns.iter().all(|p| p.flag != CapabilityFlag::Unverified));
}

#[test]
fn test_tool_feature_patterns() {
    let patterns = build_capability_patterns();
    let flags_for = |text: &str| -> Vec<CapabilityFlag> {
        patterns
            .iter()
            .filter(|p| p.regex.is_match(text))
            .map(|p| p.flag)
            .collect()
    };

    assert!(flags_for("parse json from standard input").contains(&CapabilityFlag::JsonHandling));
    assert!(flags_for("parse json from standard input").contains(&CapabilityFlag::StdinSupport));
    assert!(flags_for("print line numbers").contains(&CapabilityFlag::LineNumbering));
    assert!(flags_for("ignore case distinctions").contains(&CapabilityFlag::CaseHandling));
    assert!(flags_for("compress with gzip").contains(&CapabilityFlag::Compression));
    assert!(flags_for("output appended data as the file grows; follow").contains(&CapabilityFlag::RealTimeProcessing));
    // "jsonify" is not a word match for json
    assert!(!flags_for("jsonify").contains(&CapabilityFlag::JsonHandling));
}

#[test]
fn test_option_patterns() {
    let options = build_option_patterns();
    let found = |synopsis: &str| -> Vec<String> {
        options
            .iter()
            .filter(|o| o.regex.is_match(synopsis))
            .map(|o| o.description.clone())
            .collect()
    };

    assert_eq!(found("rm -r FILE"), vec!["recursive/force"]);
    assert_eq!(found("rm --no-preserve-root /"), vec!["no root protection"]);
    assert!(found("ls [OPTION]... [FILE]...").is_empty());
    // Upper-case -R is a different option on many tools
    assert!(found("cp -R SRC DST").is_empty());
}

#[test]
fn test_enhanced_layer_contents() {
    let layer = build_enhanced_layer();

    assert_eq!(layer.capabilities.len(), 4);
    assert!(layer.keywords[&RiskLevel::Critical].contains(&"password".to_string()));
    assert!(layer.keywords[&RiskLevel::HighRisk].contains(&"sticky bit".to_string()));
    for command in ["rm", "dd", "chmod"] {
        assert_eq!(layer.overrides[command].risk, RiskLevel::HighRisk);
        assert!(!layer.overrides[command].rationale.is_empty());
    }
}

#[test]
fn test_synopsis_section_bounds() {
    let doc = "NAME\n  shred\n\nSYNOPSIS\n  shred -f -u FILE\n  shred --remove FILE\n\nDESCRIPTION\n  -r here\n";
    assert_eq!(synopsis_section(doc), Some("  shred -f -u FILE\n  shred --remove FILE"));

    let compact = "SYNOPSIS\n  tool -x\nDESCRIPTION\n  more";
    assert_eq!(synopsis_section(compact), Some("  tool -x"));

    assert_eq!(synopsis_section("no sections at all"), None);
}
