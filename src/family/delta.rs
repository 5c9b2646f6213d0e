//! Per-child delta records
//!
//! ```text
//! | mask | member | risk? | flags xor parent? | perf? | days? |
//!    1       2       1      layout.flags        perf    2
//! ```
//!
//! Mask bits: 0 risk, 1 flags, 2 performance, 3 timestamp. Absent fields
//! are inherited from the parent. The family half of the identity always
//! equals the parent's, so only the member half is stored.

use crate::codec::layout::{put_uint, FieldReader, ProtocolVersion, RISK_WIDTH, TIMESTAMP_WIDTH};
use crate::codec::{CoarseTimestamp, CommandDescriptor, PerformanceHints};
use crate::core::types::{CapabilityFlags, CommandIdentity, RiskLevel};
use crate::family::FamilyError;

const MASK_WIDTH: usize = 1;
const MEMBER_WIDTH: usize = 2;

const RISK_BIT: u8 = 1 << 0;
const FLAGS_BIT: u8 = 1 << 1;
const PERFORMANCE_BIT: u8 = 1 << 2;
const TIMESTAMP_BIT: u8 = 1 << 3;
const KNOWN_BITS: u8 = RISK_BIT | FLAGS_BIT | PERFORMANCE_BIT | TIMESTAMP_BIT;

/// Difference between one family member and its parent
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DeltaRecord {
    member: u16,
    risk: Option<RiskLevel>,
    flags_xor: Option<CapabilityFlags>,
    performance: Option<PerformanceHints>,
    timestamp: Option<CoarseTimestamp>,
}

impl DeltaRecord {
    /// Records every field where `child` differs from `parent`
    pub fn between(parent: &CommandDescriptor, child: &CommandDescriptor) -> Self {
        let flags_xor = parent.capabilities().xor(child.capabilities());
        Self {
            member: child.identity().member,
            risk: (child.risk() != parent.risk()).then_some(child.risk()),
            flags_xor: (!flags_xor.is_empty()).then_some(flags_xor),
            performance: (child.performance() != parent.performance()).then_some(child.performance()),
            timestamp: (child.timestamp() != parent.timestamp()).then_some(child.timestamp()),
        }
    }

    /// Rebuilds the child descriptor on top of `parent`
    pub fn apply(&self, parent: &CommandDescriptor) -> CommandDescriptor {
        let capabilities = match self.flags_xor {
            Some(diff) => parent.capabilities().xor(diff),
            None => parent.capabilities(),
        };
        CommandDescriptor::new(
            parent.version(),
            CommandIdentity {
                family: parent.identity().family,
                member: self.member,
            },
            self.risk.unwrap_or(parent.risk()),
            capabilities,
            self.performance.unwrap_or(parent.performance()),
            self.timestamp.unwrap_or(parent.timestamp()),
        )
    }

    pub fn member(&self) -> u16 {
        self.member
    }

    /// True when the child is identical to the parent apart from its identity
    pub fn is_identity_only(&self) -> bool {
        self.mask() == 0
    }

    fn mask(&self) -> u8 {
        let mut mask = 0;
        if self.risk.is_some() {
            mask |= RISK_BIT;
        }
        if self.flags_xor.is_some() {
            mask |= FLAGS_BIT;
        }
        if self.performance.is_some() {
            mask |= PERFORMANCE_BIT;
        }
        if self.timestamp.is_some() {
            mask |= TIMESTAMP_BIT;
        }
        mask
    }

    /// Encoded size of this record under `version`
    pub fn encoded_len(&self, version: ProtocolVersion) -> usize {
        let layout = version.layout();
        let mut len = MASK_WIDTH + MEMBER_WIDTH;
        if self.risk.is_some() {
            len += RISK_WIDTH;
        }
        if self.flags_xor.is_some() {
            len += layout.flags;
        }
        if self.performance.is_some() {
            len += layout.performance_size();
        }
        if self.timestamp.is_some() {
            len += TIMESTAMP_WIDTH;
        }
        len
    }

    /// Largest possible record under `version` (every field present)
    pub fn max_size(version: ProtocolVersion) -> usize {
        let layout = version.layout();
        MASK_WIDTH + MEMBER_WIDTH + RISK_WIDTH + layout.flags + layout.performance_size() + TIMESTAMP_WIDTH
    }

    /// Appends the record to `buf`
    pub fn encode_into(&self, version: ProtocolVersion, buf: &mut Vec<u8>) {
        let layout = version.layout();
        buf.push(self.mask());
        put_uint(buf, u64::from(self.member), MEMBER_WIDTH);
        if let Some(risk) = self.risk {
            put_uint(buf, u64::from(risk.as_wire()), RISK_WIDTH);
        }
        if let Some(diff) = self.flags_xor {
            put_uint(buf, u64::from(diff.bits()), layout.flags);
        }
        if let Some(performance) = self.performance {
            put_uint(buf, u64::from(performance.latency_ms), layout.latency);
            put_uint(buf, u64::from(performance.memory_mb), layout.memory);
            put_uint(buf, u64::from(performance.output_kb), layout.output);
        }
        if let Some(timestamp) = self.timestamp {
            put_uint(buf, u64::from(timestamp.days()), TIMESTAMP_WIDTH);
        }
    }

    pub fn encode(&self, version: ProtocolVersion) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len(version));
        self.encode_into(version, &mut buf);
        buf
    }

    /// Reads one record from `reader`
    ///
    /// `index` is the record's position in its family, used for errors.
    pub(crate) fn read(version: ProtocolVersion, reader: &mut FieldReader<'_>, index: usize) -> Result<Self, FamilyError> {
        let layout = version.layout();
        let invalid = |reason: &str| FamilyError::InvalidDelta {
            index,
            reason: reason.to_string(),
        };

        let mask = reader.uint(MASK_WIDTH).ok_or_else(|| invalid("truncated mask"))? as u8;
        if mask & !KNOWN_BITS != 0 {
            return Err(invalid("unknown presence bits"));
        }
        let member = reader.uint(MEMBER_WIDTH).ok_or_else(|| invalid("truncated member id"))? as u16;

        let risk = if mask & RISK_BIT != 0 {
            let byte = reader.uint(RISK_WIDTH).ok_or_else(|| invalid("truncated risk"))? as u8;
            Some(RiskLevel::from_wire(byte).ok_or_else(|| invalid("invalid risk level"))?)
        } else {
            None
        };

        let flags_xor = if mask & FLAGS_BIT != 0 {
            let raw = reader.uint(layout.flags).ok_or_else(|| invalid("truncated flags"))?;
            let bits = u32::try_from(raw).map_err(|_| invalid("unknown capability bits"))?;
            Some(CapabilityFlags::from_bits(bits).map_err(|_| invalid("unknown capability bits"))?)
        } else {
            None
        };

        let performance = if mask & PERFORMANCE_BIT != 0 {
            let latency_ms = reader.uint(layout.latency).ok_or_else(|| invalid("truncated latency"))? as u32;
            let memory_mb = reader.uint(layout.memory).ok_or_else(|| invalid("truncated memory"))? as u32;
            let output_kb = reader.uint(layout.output).ok_or_else(|| invalid("truncated output"))? as u32;
            Some(PerformanceHints::new(latency_ms, memory_mb, output_kb))
        } else {
            None
        };

        let timestamp = if mask & TIMESTAMP_BIT != 0 {
            let days = reader.uint(TIMESTAMP_WIDTH).ok_or_else(|| invalid("truncated timestamp"))? as u16;
            Some(CoarseTimestamp(days))
        } else {
            None
        };

        Ok(Self {
            member,
            risk,
            flags_xor,
            performance,
            timestamp,
        })
    }
}
