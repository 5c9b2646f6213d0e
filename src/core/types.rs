//! src/core/types.rs
//!
//! Core type definitions shared by every layer of the protocol
//!
//! This module defines the fundamental types used throughout the crate:
//! - `RiskLevel`: Ordered severity tier of a command
//! - `CapabilityFlag`: A single named mechanism a command can invoke
//! - `CapabilityFlags`: Bitset of capability flags as stored on the wire
//! - `CommandIdentity`: Fixed-width fingerprint of a command string
//!
//! Risk and capabilities are independent axes: a `Safe` command may still
//! carry flags describing how it works.

use sha2::{Digest, Sha256};
use std::fmt;

use crate::core::command::CommandName;

/// Severity tier of a command
///
/// Variants are declared in increasing severity so the derived `Ord`
/// matches the protocol ordering. The discriminant is the wire value.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum RiskLevel {
    /// Read-only, no side effects worth reviewing
    Safe = 0,
    /// Information gathering, minor side effects
    LowRisk = 1,
    /// Writes files or talks to the network
    MediumRisk = 2,
    /// Deletes data, changes permissions or system state
    HighRisk = 3,
    /// Irreversible destruction (wipe, format, overwrite devices)
    Critical = 4,
}

impl RiskLevel {
    /// Tier used whenever certainty is missing (failed decode, no documentation)
    pub const MOST_CONSERVATIVE: RiskLevel = RiskLevel::Critical;

    /// All tiers in ascending severity.
    pub const ALL: [RiskLevel; 5] = [
        RiskLevel::Safe,
        RiskLevel::LowRisk,
        RiskLevel::MediumRisk,
        RiskLevel::HighRisk,
        RiskLevel::Critical,
    ];

    /// Wire value of this tier
    pub fn as_wire(self) -> u8 {
        self as u8
    }

    /// Parses a wire value, returning `None` for anything above `Critical`
    pub fn from_wire(value: u8) -> Option<Self> {
        Self::ALL.get(usize::from(value)).copied()
    }

    /// Parses a tier name such as `HIGH_RISK`, `high-risk` or `critical`
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "SAFE" => Some(RiskLevel::Safe),
            "LOW_RISK" | "LOW" => Some(RiskLevel::LowRisk),
            "MEDIUM_RISK" | "MEDIUM" => Some(RiskLevel::MediumRisk),
            "HIGH_RISK" | "HIGH" => Some(RiskLevel::HighRisk),
            "CRITICAL" => Some(RiskLevel::Critical),
            _ => None,
        }
    }

    /// Decision an autonomous agent should take for this tier
    pub fn agent_action(self) -> AgentAction {
        match self {
            RiskLevel::Safe | RiskLevel::LowRisk => AgentAction::Approve,
            RiskLevel::MediumRisk => AgentAction::Monitor,
            RiskLevel::HighRisk => AgentAction::RequireApproval,
            RiskLevel::Critical => AgentAction::Reject,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Safe => write!(f, "SAFE"),
            RiskLevel::LowRisk => write!(f, "LOW_RISK"),
            RiskLevel::MediumRisk => write!(f, "MEDIUM_RISK"),
            RiskLevel::HighRisk => write!(f, "HIGH_RISK"),
            RiskLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// What an agent does with a command of a given tier
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AgentAction {
    /// Execute autonomously with basic logging
    Approve,
    /// Execute, but track file operations
    Monitor,
    /// Ask a human first
    RequireApproval,
    /// Never execute autonomously
    Reject,
}

impl fmt::Display for AgentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentAction::Approve => write!(f, "APPROVE"),
            AgentAction::Monitor => write!(f, "MONITOR"),
            AgentAction::RequireApproval => write!(f, "REQUIRE_APPROVAL"),
            AgentAction::Reject => write!(f, "REJECT"),
        }
    }
}

/// A single capability bit
///
/// The discriminant is the bit position inside `CapabilityFlags`.
/// Bits 0-9 describe security-relevant mechanics, bit 15 marks descriptors
/// produced without documentation, bits 16-31 describe tool features.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum CapabilityFlag {
    RequiresRoot = 0,
    Destructive = 1,
    NetworkAccess = 2,
    FileModification = 3,
    SystemModification = 4,
    PrivilegeEscalation = 5,
    FileSystemAccess = 6,
    ExecuteCommands = 7,
    AccessControl = 8,
    FileSystemChanges = 9,
    /// Classified without documentation
    Unverified = 15,
    TextProcessing = 16,
    JsonHandling = 17,
    FileOperations = 18,
    StdinSupport = 19,
    RecursiveOperations = 20,
    ParallelProcessing = 21,
    StreamingSupport = 22,
    PatternMatching = 23,
    CaseHandling = 24,
    WordBoundaries = 25,
    LineNumbering = 26,
    ContextAware = 27,
    BinarySupport = 28,
    Compression = 29,
    NetworkOperations = 30,
    RealTimeProcessing = 31,
}

/// Name table for every known flag, in bit order
const FLAG_NAMES: &[(CapabilityFlag, &str)] = &[
    (CapabilityFlag::RequiresRoot, "requires_root"),
    (CapabilityFlag::Destructive, "destructive"),
    (CapabilityFlag::NetworkAccess, "network_access"),
    (CapabilityFlag::FileModification, "file_modification"),
    (CapabilityFlag::SystemModification, "system_modification"),
    (CapabilityFlag::PrivilegeEscalation, "privilege_escalation"),
    (CapabilityFlag::FileSystemAccess, "file_system_access"),
    (CapabilityFlag::ExecuteCommands, "execute_commands"),
    (CapabilityFlag::AccessControl, "access_control"),
    (CapabilityFlag::FileSystemChanges, "file_system_changes"),
    (CapabilityFlag::Unverified, "unverified"),
    (CapabilityFlag::TextProcessing, "text_processing"),
    (CapabilityFlag::JsonHandling, "json_handling"),
    (CapabilityFlag::FileOperations, "file_operations"),
    (CapabilityFlag::StdinSupport, "stdin_support"),
    (CapabilityFlag::RecursiveOperations, "recursive_operations"),
    (CapabilityFlag::ParallelProcessing, "parallel_processing"),
    (CapabilityFlag::StreamingSupport, "streaming_support"),
    (CapabilityFlag::PatternMatching, "pattern_matching"),
    (CapabilityFlag::CaseHandling, "case_handling"),
    (CapabilityFlag::WordBoundaries, "word_boundaries"),
    (CapabilityFlag::LineNumbering, "line_numbering"),
    (CapabilityFlag::ContextAware, "context_aware"),
    (CapabilityFlag::BinarySupport, "binary_support"),
    (CapabilityFlag::Compression, "compression"),
    (CapabilityFlag::NetworkOperations, "network_operations"),
    (CapabilityFlag::RealTimeProcessing, "real_time_processing"),
];

impl CapabilityFlag {
    /// Bit mask of this flag
    pub fn bit(self) -> u32 {
        1 << (self as u32)
    }

    /// Canonical snake_case name
    pub fn name(self) -> &'static str {
        FLAG_NAMES
            .iter()
            .find(|(flag, _)| *flag == self)
            .map(|(_, name)| *name)
            .unwrap_or("unknown")
    }

    /// Looks up a flag by name (case-insensitive, `-` accepted for `_`)
    pub fn from_name(name: &str) -> Option<Self> {
        let wanted = name.trim().to_ascii_lowercase().replace('-', "_");
        FLAG_NAMES
            .iter()
            .find(|(_, candidate)| *candidate == wanted)
            .map(|(flag, _)| *flag)
    }

    /// Every known flag in bit order
    pub fn all() -> impl Iterator<Item = CapabilityFlag> {
        FLAG_NAMES.iter().map(|(flag, _)| *flag)
    }
}

impl fmt::Display for CapabilityFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Bitset of capability flags
///
/// Membership is a bitwise AND against the flag's mask. Only known bits can
/// be set through the public API; `from_bits` rejects anything else.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct CapabilityFlags(u32);

impl CapabilityFlags {
    /// The empty set
    pub const EMPTY: CapabilityFlags = CapabilityFlags(0);

    /// Mask of every assigned bit
    pub fn known_mask() -> u32 {
        CapabilityFlag::all().fold(0, |mask, flag| mask | flag.bit())
    }

    /// Builds a set from raw bits, or returns the unknown bits on failure
    pub fn from_bits(bits: u32) -> Result<Self, u32> {
        let unknown = bits & !Self::known_mask();
        if unknown == 0 {
            Ok(Self(bits))
        } else {
            Err(unknown)
        }
    }

    /// Raw bit representation
    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// True when `flag` is set
    pub fn contains(self, flag: CapabilityFlag) -> bool {
        self.0 & flag.bit() != 0
    }

    pub fn insert(&mut self, flag: CapabilityFlag) {
        self.0 |= flag.bit();
    }

    pub fn remove(&mut self, flag: CapabilityFlag) {
        self.0 &= !flag.bit();
    }

    pub fn union(self, other: CapabilityFlags) -> CapabilityFlags {
        CapabilityFlags(self.0 | other.0)
    }

    pub fn intersection(self, other: CapabilityFlags) -> CapabilityFlags {
        CapabilityFlags(self.0 & other.0)
    }

    /// Bits that differ between the two sets
    pub fn xor(self, other: CapabilityFlags) -> CapabilityFlags {
        CapabilityFlags(self.0 ^ other.0)
    }

    /// Iterates the set flags in bit order
    pub fn iter(self) -> impl Iterator<Item = CapabilityFlag> {
        CapabilityFlag::all().filter(move |flag| self.contains(*flag))
    }
}

impl FromIterator<CapabilityFlag> for CapabilityFlags {
    fn from_iter<I: IntoIterator<Item = CapabilityFlag>>(iter: I) -> Self {
        let mut flags = CapabilityFlags::EMPTY;
        for flag in iter {
            flags.insert(flag);
        }
        flags
    }
}

impl fmt::Display for CapabilityFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "{{}}");
        }
        let names = self
            .iter()
            .map(CapabilityFlag::name)
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{{{}}}", names)
    }
}

/// Fixed-width fingerprint of a command
///
/// # Layout
/// The upper half identifies the tool family (hash of the first token),
/// the lower half identifies the exact command. `git push` and `git log`
/// therefore share `family` but not `member`. Collisions are possible and
/// acceptable; the identity is a fingerprint, not an encoding.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct CommandIdentity {
    /// Hash prefix of the root tool token
    pub family: u16,
    /// Hash prefix of the full normalised command
    pub member: u16,
}

impl CommandIdentity {
    /// Computes the identity of a validated command name
    pub fn of(command: &CommandName) -> Self {
        Self {
            family: hash_prefix(command.root()),
            member: hash_prefix(command.as_str()),
        }
    }

    /// Packs both halves as `family << 16 | member`
    pub fn to_wire(self) -> u32 {
        (u32::from(self.family) << 16) | u32::from(self.member)
    }

    pub fn from_wire(value: u32) -> Self {
        Self {
            family: (value >> 16) as u16,
            member: (value & 0xFFFF) as u16,
        }
    }

    /// True when both identities belong to the same tool family
    pub fn same_family(self, other: CommandIdentity) -> bool {
        self.family == other.family
    }
}

impl fmt::Display for CommandIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.family, self.member)
    }
}

fn hash_prefix(text: &str) -> u16 {
    let digest = Sha256::digest(text.as_bytes());
    u16::from_be_bytes([digest[0], digest[1]])
}
