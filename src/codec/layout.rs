//! Protocol versions and their fixed byte layouts
//!
//! Each protocol version pins one layout. Field order is the same for every
//! version; only the widths of the capability, performance and checksum
//! fields differ.
//!
//! ```text
//! | magic | ver | identity | risk | flags | latency | memory | output | days | rsv | crc |
//! V1 (20):  3     1      4       1      4       1        1        1      2      0     2
//! V2 (24):  3     1      4       1      4       2        2        2      2      1     2
//! V3 (32):  3     1      4       1      8       4        2        2      2      1     4
//! ```
//!
//! All multi-byte fields are big-endian. A 2-byte checksum is the low half
//! of CRC-32 (IEEE); a 4-byte checksum is the full CRC-32.

use std::fmt;

/// Magic tag opening every descriptor
pub const MAGIC: [u8; 3] = *b"TCP";

pub const MAGIC_WIDTH: usize = 3;
pub const VERSION_WIDTH: usize = 1;
pub const IDENTITY_WIDTH: usize = 4;
pub const RISK_WIDTH: usize = 1;
pub const TIMESTAMP_WIDTH: usize = 2;

/// Supported protocol versions
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum ProtocolVersion {
    /// 20-byte compact profile
    V1,
    /// 24-byte standard descriptor
    #[default]
    V2,
    /// 32-byte extended descriptor
    V3,
}

impl ProtocolVersion {
    pub const ALL: [ProtocolVersion; 3] = [ProtocolVersion::V1, ProtocolVersion::V2, ProtocolVersion::V3];

    /// Version byte written after the magic tag
    pub fn as_byte(self) -> u8 {
        match self {
            ProtocolVersion::V1 => 1,
            ProtocolVersion::V2 => 2,
            ProtocolVersion::V3 => 3,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(ProtocolVersion::V1),
            2 => Some(ProtocolVersion::V2),
            3 => Some(ProtocolVersion::V3),
            _ => None,
        }
    }

    /// Version whose fixed size is `size`, if any
    pub fn from_size(size: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.layout().size() == size)
    }

    /// Parses `v1`, `2` or `V3`; at most one `v` prefix
    pub fn from_name(name: &str) -> Option<Self> {
        let trimmed = name.trim();
        let digits = trimmed
            .strip_prefix(['v', 'V'])
            .unwrap_or(trimmed);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse::<u8>().ok().and_then(Self::from_byte)
    }

    pub fn layout(self) -> Layout {
        match self {
            ProtocolVersion::V1 => Layout {
                flags: 4,
                latency: 1,
                memory: 1,
                output: 1,
                reserved: 0,
                checksum: 2,
            },
            ProtocolVersion::V2 => Layout {
                flags: 4,
                latency: 2,
                memory: 2,
                output: 2,
                reserved: 1,
                checksum: 2,
            },
            ProtocolVersion::V3 => Layout {
                flags: 8,
                latency: 4,
                memory: 2,
                output: 2,
                reserved: 1,
                checksum: 4,
            },
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.as_byte())
    }
}

/// Widths of the version-dependent fields, in bytes
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Layout {
    pub flags: usize,
    pub latency: usize,
    pub memory: usize,
    pub output: usize,
    pub reserved: usize,
    pub checksum: usize,
}

impl Layout {
    /// Bytes covered by the checksum (everything before it)
    pub fn body_size(&self) -> usize {
        MAGIC_WIDTH
            + VERSION_WIDTH
            + IDENTITY_WIDTH
            + RISK_WIDTH
            + self.flags
            + self.performance_size()
            + TIMESTAMP_WIDTH
            + self.reserved
    }

    /// Total fixed size of an encoded descriptor
    pub fn size(&self) -> usize {
        self.body_size() + self.checksum
    }

    pub fn performance_size(&self) -> usize {
        self.latency + self.memory + self.output
    }
}

/// Largest value representable in `width` bytes
pub fn max_for_width(width: usize) -> u64 {
    if width >= 8 {
        u64::MAX
    } else {
        (1u64 << (8 * width)) - 1
    }
}

/// Clamps `value` into `width` bytes (saturating policy)
pub fn saturate(value: u64, width: usize) -> u64 {
    value.min(max_for_width(width))
}

/// Appends `value` big-endian in exactly `width` bytes, saturating first
pub fn put_uint(buf: &mut Vec<u8>, value: u64, width: usize) {
    let clamped = saturate(value, width);
    let bytes = clamped.to_be_bytes();
    buf.extend_from_slice(&bytes[8 - width..]);
}

/// Sequential big-endian reader over a slice whose length is already checked
pub struct FieldReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Reads the next `width` bytes as an unsigned integer
    ///
    /// Returns `None` when fewer than `width` bytes remain.
    pub fn uint(&mut self, width: usize) -> Option<u64> {
        let field = self.take(width)?;
        Some(field.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
    }

    pub fn take(&mut self, width: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(width)?;
        let field = self.bytes.get(self.pos..end)?;
        self.pos = end;
        Some(field)
    }

    pub fn position(&self) -> usize {
        self.pos
    }
}
