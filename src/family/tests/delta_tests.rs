use super::descriptor;
use crate::codec::layout::FieldReader;
use crate::codec::{CoarseTimestamp, PerformanceHints, ProtocolVersion};
use crate::core::{CapabilityFlag, RiskLevel};
use crate::family::{DeltaRecord, FamilyError};

#[test]
fn test_delta_is_strictly_smaller_than_full_descriptor() {
    assert_eq!(DeltaRecord::max_size(ProtocolVersion::V1), 13);
    assert_eq!(DeltaRecord::max_size(ProtocolVersion::V2), 16);
    assert_eq!(DeltaRecord::max_size(ProtocolVersion::V3), 22);
    for version in ProtocolVersion::ALL {
        assert!(DeltaRecord::max_size(version) < version.layout().size());
    }
}

#[test]
fn test_identical_fields_are_omitted() {
    let v = ProtocolVersion::V2;
    let parent = descriptor(v, "git", RiskLevel::LowRisk, &[CapabilityFlag::FileOperations]);
    let child = descriptor(v, "git status", RiskLevel::LowRisk, &[CapabilityFlag::FileOperations]);

    let delta = DeltaRecord::between(&parent, &child);
    assert!(delta.is_identity_only());
    assert_eq!(delta.encoded_len(v), 3);
    assert_eq!(delta.encode(v), {
        let mut expected = vec![0u8];
        expected.extend_from_slice(&child.identity().member.to_be_bytes());
        expected
    });
}

#[test]
fn test_changed_fields_are_recorded() {
    let v = ProtocolVersion::V2;
    let parent = descriptor(v, "git", RiskLevel::LowRisk, &[CapabilityFlag::FileOperations]);
    let child = descriptor(
        v,
        "git push",
        RiskLevel::MediumRisk,
        &[CapabilityFlag::FileOperations, CapabilityFlag::NetworkAccess],
    );

    let delta = DeltaRecord::between(&parent, &child);
    // mask + member + risk + 4 flag bytes
    assert_eq!(delta.encoded_len(v), 8);
    assert_eq!(delta.encode(v)[0], 0b0011);
    assert_eq!(delta.apply(&parent), child);
}

#[test]
fn test_every_field_changed() {
    for version in ProtocolVersion::ALL {
        let parent = descriptor(version, "docker", RiskLevel::Safe, &[]);
        let child = crate::codec::CommandDescriptor::new(
            version,
            descriptor(version, "docker rm", RiskLevel::Safe, &[]).identity(),
            RiskLevel::HighRisk,
            [CapabilityFlag::Destructive].into_iter().collect(),
            PerformanceHints::new(5_000, 2, 2),
            CoarseTimestamp(20_001),
        );

        let delta = DeltaRecord::between(&parent, &child);
        let bytes = delta.encode(version);
        assert_eq!(bytes.len(), DeltaRecord::max_size(version));

        let mut reader = FieldReader::new(&bytes);
        let read = DeltaRecord::read(version, &mut reader, 0).unwrap();
        assert_eq!(read, delta);
        assert_eq!(read.apply(&parent), child);
    }
}

#[test]
fn test_unknown_mask_bits_rejected() {
    let bytes = [0b1_0000u8, 0x12, 0x34];
    let mut reader = FieldReader::new(&bytes);
    assert!(matches!(
        DeltaRecord::read(ProtocolVersion::V2, &mut reader, 3),
        Err(FamilyError::InvalidDelta { index: 3, .. })
    ));
}

#[test]
fn test_truncated_record_rejected() {
    // Mask claims a risk byte that is not there
    let bytes = [0b0001u8, 0x12, 0x34];
    let mut reader = FieldReader::new(&bytes);
    assert!(matches!(
        DeltaRecord::read(ProtocolVersion::V1, &mut reader, 0),
        Err(FamilyError::InvalidDelta { .. })
    ));
}

#[test]
fn test_invalid_risk_in_record_rejected() {
    let bytes = [0b0001u8, 0x12, 0x34, 9];
    let mut reader = FieldReader::new(&bytes);
    assert!(matches!(
        DeltaRecord::read(ProtocolVersion::V1, &mut reader, 0),
        Err(FamilyError::InvalidDelta { reason, .. }) if reason.contains("risk")
    ));
}

#[test]
fn test_dropped_capability_is_recorded() {
    let v = ProtocolVersion::V3;
    let parent = descriptor(
        v,
        "git",
        RiskLevel::MediumRisk,
        &[CapabilityFlag::FileOperations, CapabilityFlag::NetworkAccess],
    );
    let child = descriptor(v, "git log", RiskLevel::MediumRisk, &[])
        .with_risk(RiskLevel::Safe)
        .with_capabilities([CapabilityFlag::FileOperations].into_iter().collect());

    let delta = DeltaRecord::between(&parent, &child);
    // mask + member + risk + 8 flag bytes
    assert_eq!(delta.encoded_len(v), 12);
    assert_eq!(delta.encode(v)[0], 0b0011);

    let rebuilt = delta.apply(&parent);
    assert!(!rebuilt.capabilities().contains(CapabilityFlag::NetworkAccess));
    assert_eq!(rebuilt, child);
}
