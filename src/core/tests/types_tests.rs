use crate::core::command::CommandName;
use crate::core::types::{AgentAction, CapabilityFlag, CapabilityFlags, CommandIdentity, RiskLevel};

#[test]
fn test_risk_levels_ordered_by_severity() {
    assert!(RiskLevel::Safe < RiskLevel::LowRisk);
    assert!(RiskLevel::LowRisk < RiskLevel::MediumRisk);
    assert!(RiskLevel::MediumRisk < RiskLevel::HighRisk);
    assert!(RiskLevel::HighRisk < RiskLevel::Critical);

    let worst = [RiskLevel::LowRisk, RiskLevel::Critical, RiskLevel::Safe]
        .into_iter()
        .max();
    assert_eq!(worst, Some(RiskLevel::Critical));
}

#[test]
fn test_risk_level_wire_values() {
    for level in RiskLevel::ALL {
        assert_eq!(RiskLevel::from_wire(level.as_wire()), Some(level));
    }
    assert_eq!(RiskLevel::from_wire(5), None);
    assert_eq!(RiskLevel::from_wire(255), None);
}

#[test]
fn test_risk_level_names() {
    assert_eq!(RiskLevel::from_name("HIGH_RISK"), Some(RiskLevel::HighRisk));
    assert_eq!(RiskLevel::from_name("medium-risk"), Some(RiskLevel::MediumRisk));
    assert_eq!(RiskLevel::from_name("critical"), Some(RiskLevel::Critical));
    assert_eq!(RiskLevel::from_name("catastrophic"), None);
    assert_eq!(format!("{}", RiskLevel::LowRisk), "LOW_RISK");
}

#[test]
fn test_most_conservative_is_critical() {
    assert_eq!(RiskLevel::MOST_CONSERVATIVE, RiskLevel::Critical);
    assert!(RiskLevel::ALL.iter().all(|l| *l <= RiskLevel::MOST_CONSERVATIVE));
}

#[test]
fn test_agent_actions() {
    assert_eq!(RiskLevel::Safe.agent_action(), AgentAction::Approve);
    assert_eq!(RiskLevel::LowRisk.agent_action(), AgentAction::Approve);
    assert_eq!(RiskLevel::MediumRisk.agent_action(), AgentAction::Monitor);
    assert_eq!(RiskLevel::HighRisk.agent_action(), AgentAction::RequireApproval);
    assert_eq!(RiskLevel::Critical.agent_action(), AgentAction::Reject);
}

#[test]
fn test_capability_membership_is_bitwise() {
    let mut flags = CapabilityFlags::EMPTY;
    flags.insert(CapabilityFlag::Destructive);
    flags.insert(CapabilityFlag::PatternMatching);

    assert!(flags.contains(CapabilityFlag::Destructive));
    assert!(flags.contains(CapabilityFlag::PatternMatching));
    assert!(!flags.contains(CapabilityFlag::RequiresRoot));
    assert_eq!(flags.bits(), (1 << 1) | (1 << 23));
    assert_eq!(flags.len(), 2);

    flags.remove(CapabilityFlag::Destructive);
    assert!(!flags.contains(CapabilityFlag::Destructive));
}

#[test]
fn test_capability_from_bits_rejects_unassigned() {
    assert!(CapabilityFlags::from_bits(1 << 15).is_ok());
    assert_eq!(CapabilityFlags::from_bits(1 << 12), Err(1 << 12));
    assert_eq!(
        CapabilityFlags::from_bits((1 << 0) | (1 << 10) | (1 << 14)),
        Err((1 << 10) | (1 << 14))
    );
}

#[test]
fn test_capability_names_round_trip() {
    for flag in CapabilityFlag::all() {
        assert_eq!(CapabilityFlag::from_name(flag.name()), Some(flag));
    }
    assert_eq!(
        CapabilityFlag::from_name("REQUIRES-ROOT"),
        Some(CapabilityFlag::RequiresRoot)
    );
    assert_eq!(CapabilityFlag::from_name("teleportation"), None);
}

#[test]
fn test_capability_set_algebra() {
    let a: CapabilityFlags = [CapabilityFlag::Destructive, CapabilityFlag::FileOperations]
        .into_iter()
        .collect();
    let b: CapabilityFlags = [CapabilityFlag::FileOperations, CapabilityFlag::NetworkAccess]
        .into_iter()
        .collect();

    assert_eq!(a.intersection(b).iter().collect::<Vec<_>>(), vec![CapabilityFlag::FileOperations]);
    assert_eq!(a.union(b).len(), 3);
    assert_eq!(
        a.xor(b).iter().collect::<Vec<_>>(),
        vec![CapabilityFlag::Destructive, CapabilityFlag::NetworkAccess]
    );
    assert_eq!(a.xor(b).xor(b), a);
}

#[test]
fn test_capability_display() {
    assert_eq!(format!("{}", CapabilityFlags::EMPTY), "{}");
    let flags: CapabilityFlags = [CapabilityFlag::TextProcessing, CapabilityFlag::RequiresRoot]
        .into_iter()
        .collect();
    assert_eq!(format!("{}", flags), "{requires_root, text_processing}");
}

#[test]
fn test_identity_shares_family_for_subcommands() {
    let git = CommandIdentity::of(&CommandName::parse("git").unwrap());
    let push = CommandIdentity::of(&CommandName::parse("git push").unwrap());
    let log = CommandIdentity::of(&CommandName::parse("git log").unwrap());
    let docker = CommandIdentity::of(&CommandName::parse("docker ps").unwrap());

    assert!(git.same_family(push));
    assert!(push.same_family(log));
    assert_ne!(push, log);
    assert!(!git.same_family(docker));
}

#[test]
fn test_identity_is_deterministic_and_normalised() {
    let a = CommandIdentity::of(&CommandName::parse("git  push").unwrap());
    let b = CommandIdentity::of(&CommandName::parse("git push").unwrap());
    assert_eq!(a, b);
    assert_eq!(CommandIdentity::from_wire(a.to_wire()), a);
}
