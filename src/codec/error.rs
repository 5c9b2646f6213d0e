use thiserror::Error;

/// Errors that can occur while decoding a descriptor.
///
/// Every variant is fatal to the decode that produced it. None of them is
/// ever recovered into a risk tier other than the most conservative one.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum CodecError {
    /// Input is not exactly the protocol's fixed size.
    #[error("Descriptor length error: expected {expected} bytes, found {actual}")]
    Length { expected: usize, actual: usize },
    /// Stored checksum does not match the recomputed one.
    #[error("Descriptor checksum mismatch: stored {stored:#x}, computed {computed:#x}")]
    ChecksumMismatch { stored: u32, computed: u32 },
    /// Magic tag is not `TCP`.
    #[error("Bad descriptor magic: {0:02x?}")]
    BadMagic([u8; 3]),
    /// Version byte does not match the decoder's protocol version.
    #[error("Unsupported descriptor version byte: {0}")]
    UnsupportedVersion(u8),
    /// Risk byte is outside the known tiers.
    #[error("Invalid risk level byte: {0}")]
    InvalidRiskLevel(u8),
    /// Capability field carries bits with no assigned flag.
    #[error("Unknown capability bits set: {0:#x}")]
    UnknownCapabilityBits(u64),
    /// Reserved padding must be zero.
    #[error("Reserved descriptor byte is not zero: {0:#x}")]
    ReservedNotZero(u64),
}
