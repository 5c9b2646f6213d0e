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

//! Hierarchical family encoding.
//!
//! Commands sharing a root tool (`git push`, `git log`, `git status`) are
//! stored as one full parent descriptor plus one small `DeltaRecord` per
//! child. A child belongs to a family when it uses the parent's protocol
//! version and its identity carries the parent's family half.
//!
//! # Container layout
//! ```text
//! | parent descriptor | count (u16) | delta 0 | ... | delta n-1 | crc32 |
//! ```
//! The CRC-32 (big-endian) covers every preceding byte.

use std::collections::BTreeMap;

use crc32fast::Hasher;
use thiserror::Error;

pub mod delta;

pub use delta::DeltaRecord;

use crate::codec::layout::{put_uint, FieldReader, ProtocolVersion};
use crate::codec::{CodecError, CommandDescriptor, DescriptorCodec};
use crate::core::command::CommandName;
use crate::core::types::{CapabilityFlags, RiskLevel};

const COUNT_WIDTH: usize = 2;
const CONTAINER_CHECKSUM_WIDTH: usize = 4;

/// Errors that can occur while building or reading a family.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum FamilyError {
    /// Child does not share the parent's root tool.
    #[error("Child {index} is not a member of the parent's family")]
    NotAMember { index: usize },
    /// Child uses a different protocol version than the parent.
    #[error("Child {index} uses a different protocol version than the parent")]
    VersionMismatch { index: usize },
    /// More children than the container's count field can hold.
    #[error("Too many family members: {0}")]
    TooManyMembers(usize),
    /// Parent descriptor failed to decode.
    #[error("Invalid parent descriptor: {0}")]
    Parent(#[from] CodecError),
    /// Container is shorter than its header claims.
    #[error("Family container truncated: need at least {needed} bytes, found {actual}")]
    Truncated { needed: usize, actual: usize },
    /// Container checksum does not match.
    #[error("Family container checksum mismatch: stored {stored:#x}, computed {computed:#x}")]
    ChecksumMismatch { stored: u32, computed: u32 },
    /// A delta record is malformed.
    #[error("Invalid delta record {index}: {reason}")]
    InvalidDelta { index: usize, reason: String },
    /// Bytes remain after the last delta record.
    #[error("Family container has {0} trailing bytes")]
    TrailingBytes(usize),
}

/// Parent descriptor plus ordered child deltas
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandFamily {
    parent: CommandDescriptor,
    deltas: Vec<DeltaRecord>,
}

/// Encodes `children` as deltas against `parent`
///
/// Neither input is modified. Children keep their order.
///
/// # Errors
/// - `FamilyError::VersionMismatch` for a child on another protocol version
/// - `FamilyError::NotAMember` for a child from another tool family
pub fn compress_family(parent: &CommandDescriptor, children: &[CommandDescriptor]) -> Result<CommandFamily, FamilyError> {
    if children.len() > usize::from(u16::MAX) {
        return Err(FamilyError::TooManyMembers(children.len()));
    }

    let mut deltas = Vec::with_capacity(children.len());
    for (index, child) in children.iter().enumerate() {
        if child.version() != parent.version() {
            return Err(FamilyError::VersionMismatch { index });
        }
        if !child.identity().same_family(parent.identity()) {
            return Err(FamilyError::NotAMember { index });
        }
        deltas.push(DeltaRecord::between(parent, child));
    }

    let family = CommandFamily {
        parent: *parent,
        deltas,
    };
    log::debug!(
        "compressed family {:04x} with {} members (ratio {:.2})",
        parent.identity().family,
        family.deltas.len(),
        family.compression_ratio()
    );
    Ok(family)
}

/// Groups a flat command list into families keyed by root tool
///
/// Each family lists its subcommand forms in first-seen order, without
/// duplicates and without the bare root itself. A bare command with no
/// subcommands in the list still gets an (empty) family.
///
/// # Examples
/// ```
/// use capdesc::core::CommandName;
/// use capdesc::family::group_families;
///
/// let commands: Vec<CommandName> = ["git status", "ls", "git push", "git status"]
///     .into_iter()
///     .map(|c| CommandName::parse(c).unwrap())
///     .collect();
///
/// let families = group_families(&commands);
/// assert_eq!(families.len(), 2);
/// assert_eq!(families["git"].len(), 2);
/// assert!(families["ls"].is_empty());
/// ```
pub fn group_families(commands: &[CommandName]) -> BTreeMap<String, Vec<CommandName>> {
    let mut families: BTreeMap<String, Vec<CommandName>> = BTreeMap::new();
    for command in commands {
        let members = families.entry(command.root().to_string()).or_default();
        if command.subcommand().is_some() && !members.contains(command) {
            members.push(command.clone());
        }
    }
    families
}

impl CommandFamily {
    pub fn parent(&self) -> &CommandDescriptor {
        &self.parent
    }

    pub fn deltas(&self) -> &[DeltaRecord] {
        &self.deltas
    }

    pub fn version(&self) -> ProtocolVersion {
        self.parent.version()
    }

    /// Number of children (the parent is not counted)
    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    /// Rebuilds every child, in the original order
    pub fn expand(&self) -> Vec<CommandDescriptor> {
        self.deltas.iter().map(|delta| delta.apply(&self.parent)).collect()
    }

    /// Bytes of the parent plus all encoded deltas
    pub fn encoded_size(&self) -> usize {
        let version = self.version();
        version.layout().size() + self.deltas.iter().map(|d| d.encoded_len(version)).sum::<usize>()
    }

    /// Full-encoding size of every member divided by the family's size
    ///
    /// `(1 + n) * full / (full + sum of delta sizes)`, `1.0` for a family
    /// without children.
    pub fn compression_ratio(&self) -> f64 {
        self.uncompressed_size() as f64 / self.encoded_size() as f64
    }

    /// Bytes the parent and every child take as full descriptors
    pub fn uncompressed_size(&self) -> usize {
        (1 + self.deltas.len()) * self.version().layout().size()
    }

    /// Bytes saved over storing every member as a full descriptor
    pub fn space_saved(&self) -> usize {
        self.uncompressed_size().saturating_sub(self.encoded_size())
    }

    /// Number of children per risk tier
    pub fn risk_distribution(&self) -> BTreeMap<RiskLevel, usize> {
        let mut distribution = BTreeMap::new();
        for child in self.expand() {
            *distribution.entry(child.risk()).or_insert(0) += 1;
        }
        distribution
    }

    /// Lowest risk among the children, or the parent's for an empty family
    pub fn risk_floor(&self) -> RiskLevel {
        self.expand()
            .iter()
            .map(CommandDescriptor::risk)
            .min()
            .unwrap_or(self.parent.risk())
    }

    /// Capabilities every child carries, or the parent's for an empty family
    pub fn common_capabilities(&self) -> CapabilityFlags {
        self.expand()
            .iter()
            .map(CommandDescriptor::capabilities)
            .reduce(CapabilityFlags::intersection)
            .unwrap_or(self.parent.capabilities())
    }

    /// Serialises the family container
    pub fn to_bytes(&self) -> Vec<u8> {
        let version = self.version();
        let mut buf = DescriptorCodec::new(version).encode(&self.parent);
        put_uint(&mut buf, self.deltas.len() as u64, COUNT_WIDTH);
        for delta in &self.deltas {
            delta.encode_into(version, &mut buf);
        }
        let checksum = container_checksum(&buf);
        buf.extend_from_slice(&checksum.to_be_bytes());
        buf
    }

    /// Reads a family container written by `to_bytes`
    ///
    /// # Errors
    /// - `FamilyError::Truncated` when the container cannot hold its header
    /// - `FamilyError::ChecksumMismatch` for corruption anywhere
    /// - `FamilyError::Parent` when the parent descriptor does not decode
    /// - `FamilyError::InvalidDelta` / `TrailingBytes` for malformed records
    pub fn from_bytes(version: ProtocolVersion, bytes: &[u8]) -> Result<Self, FamilyError> {
        let full = version.layout().size();
        let minimum = full + COUNT_WIDTH + CONTAINER_CHECKSUM_WIDTH;
        if bytes.len() < minimum {
            return Err(FamilyError::Truncated {
                needed: minimum,
                actual: bytes.len(),
            });
        }

        let (body, trailer) = bytes.split_at(bytes.len() - CONTAINER_CHECKSUM_WIDTH);
        let stored = FieldReader::new(trailer)
            .uint(CONTAINER_CHECKSUM_WIDTH)
            .map(|v| v as u32)
            .ok_or(FamilyError::Truncated {
                needed: minimum,
                actual: bytes.len(),
            })?;
        let computed = container_checksum(body);
        if stored != computed {
            log::warn!(
                "family container checksum mismatch (stored {:#x}, computed {:#x})",
                stored,
                computed
            );
            return Err(FamilyError::ChecksumMismatch { stored, computed });
        }

        let parent = DescriptorCodec::new(version).decode(&body[..full])?;
        let mut reader = FieldReader::new(&body[full..]);
        let count = reader.uint(COUNT_WIDTH).ok_or(FamilyError::Truncated {
            needed: minimum,
            actual: bytes.len(),
        })? as usize;

        let mut deltas = Vec::with_capacity(count);
        for index in 0..count {
            deltas.push(DeltaRecord::read(version, &mut reader, index)?);
        }

        let trailing = body.len() - full - reader.position();
        if trailing != 0 {
            return Err(FamilyError::TrailingBytes(trailing));
        }

        Ok(Self { parent, deltas })
    }
}

fn container_checksum(body: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(body);
    hasher.finalize()
}

#[cfg(test)]
mod tests;
