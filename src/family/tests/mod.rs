//! Family encoding tests
//!
//! - Delta tests (field selection, size bounds, record parsing)
//! - Family tests (membership, expansion, statistics, container format)

#[cfg(test)]
mod delta_tests;


use crate::codec::{CoarseTimestamp, CommandDescriptor, PerformanceHints, ProtocolVersion};
use crate::core::{CapabilityFlag, CapabilityFlags, CommandIdentity, CommandName, RiskLevel};

/// Descriptor for `command` with the given tier and flags
pub(super) fn descriptor(
    version: ProtocolVersion,
    command: &str,
    risk: RiskLevel,
    flags: &[CapabilityFlag],
) -> CommandDescriptor {
    let name = CommandName::parse(command).unwrap();
    CommandDescriptor::new(
        version,
        CommandIdentity::of(&name),
        risk,
        flags.iter().copied().collect::<CapabilityFlags>(),
        PerformanceHints::new(100, 1, 1),
        CoarseTimestamp(20_000),
    )
}
