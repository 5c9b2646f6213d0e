//! Descriptor value types
//!
//! `CommandDescriptor` is the decoded form of a descriptor. It is immutable:
//! every field is fixed at construction, and construction already clamps the
//! performance hints into the widths of the chosen protocol version. This
//! keeps `decode(encode(d)) == d` true for every descriptor that can exist.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::codec::layout::{saturate, ProtocolVersion};
use crate::core::types::{CapabilityFlag, CapabilityFlags, CommandIdentity, RiskLevel};

/// Coarse creation time: whole days since the Unix epoch
///
/// Saturates at `u16::MAX` (year 2149). Dates before 1970 clamp to day 0.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct CoarseTimestamp(pub u16);

impl CoarseTimestamp {
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        let days = at.timestamp().div_euclid(86_400).max(0);
        Self(u16::try_from(days).unwrap_or(u16::MAX))
    }

    pub fn days(self) -> u16 {
        self.0
    }

    /// Midnight UTC of the stored day
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(i64::from(self.0) * 86_400, 0)
    }
}

/// Performance hint triple
///
/// Stored at full `u32` precision in memory; each field is clamped to the
/// width its protocol version allots when a descriptor is built.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct PerformanceHints {
    /// Expected execution time in milliseconds
    pub latency_ms: u32,
    /// Expected peak memory in megabytes
    pub memory_mb: u32,
    /// Expected output size in kilobytes
    pub output_kb: u32,
}

impl PerformanceHints {
    pub const fn new(latency_ms: u32, memory_mb: u32, output_kb: u32) -> Self {
        Self {
            latency_ms,
            memory_mb,
            output_kb,
        }
    }

    /// Rough hints derived from a command's capabilities
    ///
    /// Destructive operations are assumed to take about five seconds and
    /// network operations about two; everything else 100 ms, 1 MB, 1 KB.
    pub fn estimate(capabilities: CapabilityFlags) -> Self {
        let latency_ms = if capabilities.contains(CapabilityFlag::Destructive) {
            5_000
        } else if capabilities.contains(CapabilityFlag::NetworkAccess) {
            2_000
        } else {
            100
        };
        Self::new(latency_ms, 1, 1)
    }

    /// Clamps every field into the widths of `version`
    pub fn clamp_to(self, version: ProtocolVersion) -> Self {
        let layout = version.layout();
        let clamp = |value: u32, width: usize| saturate(u64::from(value), width) as u32;
        let clamped = Self {
            latency_ms: clamp(self.latency_ms, layout.latency),
            memory_mb: clamp(self.memory_mb, layout.memory),
            output_kb: clamp(self.output_kb, layout.output),
        };
        if clamped != self {
            log::debug!(
                "performance hints {:?} saturated to {:?} for protocol {}",
                self,
                clamped,
                version
            );
        }
        clamped
    }
}

/// Decoded descriptor of one command
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct CommandDescriptor {
    version: ProtocolVersion,
    identity: CommandIdentity,
    risk: RiskLevel,
    capabilities: CapabilityFlags,
    performance: PerformanceHints,
    timestamp: CoarseTimestamp,
}

impl CommandDescriptor {
    /// Builds a descriptor, saturating performance hints to `version`'s widths
    pub fn new(
        version: ProtocolVersion,
        identity: CommandIdentity,
        risk: RiskLevel,
        capabilities: CapabilityFlags,
        performance: PerformanceHints,
        timestamp: CoarseTimestamp,
    ) -> Self {
        Self {
            version,
            identity,
            risk,
            capabilities,
            performance: performance.clamp_to(version),
            timestamp,
        }
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn identity(&self) -> CommandIdentity {
        self.identity
    }

    pub fn risk(&self) -> RiskLevel {
        self.risk
    }

    pub fn capabilities(&self) -> CapabilityFlags {
        self.capabilities
    }

    pub fn performance(&self) -> PerformanceHints {
        self.performance
    }

    pub fn timestamp(&self) -> CoarseTimestamp {
        self.timestamp
    }

    /// Checksum the codec writes for this descriptor
    pub fn checksum(&self) -> u32 {
        crate::codec::checksum_of(self)
    }

    /// Same descriptor with a different risk tier
    pub fn with_risk(self, risk: RiskLevel) -> Self {
        Self { risk, ..self }
    }

    /// Same descriptor with different capabilities
    pub fn with_capabilities(self, capabilities: CapabilityFlags) -> Self {
        Self {
            capabilities,
            ..self
        }
    }
}

impl fmt::Display for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} ({} ms, {} MB, {} KB, day {})",
            self.version,
            self.identity,
            self.risk,
            self.capabilities,
            self.performance.latency_ms,
            self.performance.memory_mb,
            self.performance.output_kb,
            self.timestamp.days()
        )
    }
}
