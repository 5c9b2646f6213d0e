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

//! Fixed-size descriptor codec.
//!
//! Serialises a `CommandDescriptor` into the fixed byte layout of its
//! protocol version and back. See [`layout`] for the byte maps.
//!
//! # Decode order
//! 1. **Length**: input must be exactly the layout size
//! 2. **Checksum**: recomputed over every preceding byte
//! 3. **Fields**: magic, version, risk, capabilities, reserved padding
//!
//! No decoded field is returned, or even parsed, before step 2 passes.
//!
//! # Overflow policy
//! Integer fields **saturate**: a value wider than its field is written as
//! the field's maximum. `CommandDescriptor::new` applies the same clamp, so
//! a descriptor always round-trips exactly.

use crc32fast::Hasher;

pub mod descriptor;
pub mod error;
pub mod layout;

pub use descriptor::{CoarseTimestamp, CommandDescriptor, PerformanceHints};
pub use error::CodecError;
pub use layout::{Layout, ProtocolVersion, MAGIC};

use crate::core::types::{CapabilityFlags, CommandIdentity, RiskLevel};
use layout::{put_uint, FieldReader, IDENTITY_WIDTH, MAGIC_WIDTH, RISK_WIDTH, TIMESTAMP_WIDTH, VERSION_WIDTH};

/// Encoder/decoder bound to one protocol version
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DescriptorCodec {
    version: ProtocolVersion,
}

impl DescriptorCodec {
    pub fn new(version: ProtocolVersion) -> Self {
        Self { version }
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn layout(&self) -> Layout {
        self.version.layout()
    }

    /// Fixed encoded size for this version
    pub fn size(&self) -> usize {
        self.layout().size()
    }

    /// Encodes a descriptor into exactly `self.size()` bytes
    ///
    /// A descriptor built for another version is re-clamped into this
    /// codec's layout. The checksum is appended last.
    ///
    /// # Examples
    /// ```
    /// use capdesc::codec::{CoarseTimestamp, CommandDescriptor, DescriptorCodec, PerformanceHints, ProtocolVersion};
    /// use capdesc::core::{CapabilityFlags, CommandIdentity, CommandName, RiskLevel};
    ///
    /// let codec = DescriptorCodec::new(ProtocolVersion::V2);
    /// let name = CommandName::parse("ls").unwrap();
    /// let descriptor = CommandDescriptor::new(
    ///     ProtocolVersion::V2,
    ///     CommandIdentity::of(&name),
    ///     RiskLevel::Safe,
    ///     CapabilityFlags::EMPTY,
    ///     PerformanceHints::new(100, 1, 1),
    ///     CoarseTimestamp(20_000),
    /// );
    ///
    /// let bytes = codec.encode(&descriptor);
    /// assert_eq!(bytes.len(), 24);
    /// assert_eq!(codec.decode(&bytes).unwrap(), descriptor);
    /// ```
    pub fn encode(&self, descriptor: &CommandDescriptor) -> Vec<u8> {
        let layout = self.layout();
        let mut buf = encode_body(self.version, descriptor);
        let checksum = checksum_for(&buf, layout.checksum);
        put_uint(&mut buf, u64::from(checksum), layout.checksum);
        debug_assert_eq!(buf.len(), layout.size());
        buf
    }

    /// Decodes and validates a descriptor
    ///
    /// # Errors
    /// - `CodecError::Length` when `bytes` is not exactly `self.size()` long
    /// - `CodecError::ChecksumMismatch` on any corruption of the checksummed range
    /// - `BadMagic`, `UnsupportedVersion`, `InvalidRiskLevel`,
    ///   `UnknownCapabilityBits`, `ReservedNotZero` for well-checksummed but
    ///   foreign or malformed records
    pub fn decode(&self, bytes: &[u8]) -> Result<CommandDescriptor, CodecError> {
        let layout = self.layout();
        if bytes.len() != layout.size() {
            return Err(CodecError::Length {
                expected: layout.size(),
                actual: bytes.len(),
            });
        }

        let (body, trailer) = bytes.split_at(layout.body_size());
        let stored = FieldReader::new(trailer)
            .uint(layout.checksum)
            .map(|v| v as u32)
            .ok_or(CodecError::Length {
                expected: layout.size(),
                actual: bytes.len(),
            })?;
        let computed = checksum_for(body, layout.checksum);
        if stored != computed {
            log::warn!(
                "descriptor checksum mismatch (stored {:#x}, computed {:#x}): {}",
                stored,
                computed,
                hex::encode(bytes)
            );
            return Err(CodecError::ChecksumMismatch { stored, computed });
        }

        self.decode_body(body)
    }

    /// Parses a checksum-verified body
    fn decode_body(&self, body: &[u8]) -> Result<CommandDescriptor, CodecError> {
        let layout = self.layout();
        let truncated = || CodecError::Length {
            expected: layout.size(),
            actual: body.len() + layout.checksum,
        };
        let mut reader = FieldReader::new(body);

        let magic = reader.take(MAGIC_WIDTH).ok_or_else(truncated)?;
        if magic != MAGIC {
            let mut found = [0u8; 3];
            found.copy_from_slice(magic);
            return Err(CodecError::BadMagic(found));
        }

        let version_byte = reader.uint(VERSION_WIDTH).ok_or_else(truncated)? as u8;
        if version_byte != self.version.as_byte() {
            return Err(CodecError::UnsupportedVersion(version_byte));
        }

        let identity = reader.uint(IDENTITY_WIDTH).ok_or_else(truncated)? as u32;

        let risk_byte = reader.uint(RISK_WIDTH).ok_or_else(truncated)? as u8;
        let risk = RiskLevel::from_wire(risk_byte).ok_or(CodecError::InvalidRiskLevel(risk_byte))?;

        let raw_flags = reader.uint(layout.flags).ok_or_else(truncated)?;
        let flag_bits = u32::try_from(raw_flags)
            .map_err(|_| CodecError::UnknownCapabilityBits(raw_flags & !u64::from(u32::MAX)))?;
        let capabilities = CapabilityFlags::from_bits(flag_bits)
            .map_err(|unknown| CodecError::UnknownCapabilityBits(u64::from(unknown)))?;

        let latency_ms = reader.uint(layout.latency).ok_or_else(truncated)? as u32;
        let memory_mb = reader.uint(layout.memory).ok_or_else(truncated)? as u32;
        let output_kb = reader.uint(layout.output).ok_or_else(truncated)? as u32;
        let days = reader.uint(TIMESTAMP_WIDTH).ok_or_else(truncated)? as u16;

        if layout.reserved > 0 {
            let reserved = reader.uint(layout.reserved).ok_or_else(truncated)?;
            if reserved != 0 {
                return Err(CodecError::ReservedNotZero(reserved));
            }
        }

        Ok(CommandDescriptor::new(
            self.version,
            CommandIdentity::from_wire(identity),
            risk,
            capabilities,
            PerformanceHints::new(latency_ms, memory_mb, output_kb),
            CoarseTimestamp(days),
        ))
    }
}

/// Risk tier to act on for a decode result
///
/// A failed decode never reads as `Safe`: absence of certainty maps to
/// `RiskLevel::MOST_CONSERVATIVE`.
pub fn risk_or_conservative(result: &Result<CommandDescriptor, CodecError>) -> RiskLevel {
    match result {
        Ok(descriptor) => descriptor.risk(),
        Err(err) => {
            log::warn!("treating undecodable descriptor as {}: {}", RiskLevel::MOST_CONSERVATIVE, err);
            RiskLevel::MOST_CONSERVATIVE
        }
    }
}

/// Checksum the codec of `descriptor`'s own version would write
pub(crate) fn checksum_of(descriptor: &CommandDescriptor) -> u32 {
    let body = encode_body(descriptor.version(), descriptor);
    checksum_for(&body, descriptor.version().layout().checksum)
}

/// Serialises every field except the checksum
fn encode_body(version: ProtocolVersion, descriptor: &CommandDescriptor) -> Vec<u8> {
    let layout = version.layout();
    let performance = descriptor.performance();
    let mut buf = Vec::with_capacity(layout.size());

    buf.extend_from_slice(&MAGIC);
    put_uint(&mut buf, u64::from(version.as_byte()), VERSION_WIDTH);
    put_uint(&mut buf, u64::from(descriptor.identity().to_wire()), IDENTITY_WIDTH);
    put_uint(&mut buf, u64::from(descriptor.risk().as_wire()), RISK_WIDTH);
    put_uint(&mut buf, u64::from(descriptor.capabilities().bits()), layout.flags);
    put_uint(&mut buf, u64::from(performance.latency_ms), layout.latency);
    put_uint(&mut buf, u64::from(performance.memory_mb), layout.memory);
    put_uint(&mut buf, u64::from(performance.output_kb), layout.output);
    put_uint(&mut buf, u64::from(descriptor.timestamp().days()), TIMESTAMP_WIDTH);
    put_uint(&mut buf, 0, layout.reserved);

    buf
}

/// CRC-32 (IEEE) of `body`, truncated to `width` bytes
fn checksum_for(body: &[u8], width: usize) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(body);
    let crc = hasher.finalize();
    match width {
        2 => crc & 0xFFFF,
        _ => crc,
    }
}

#[cfg(test)]
mod tests;
