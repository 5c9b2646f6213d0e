use crate::codec::layout::{max_for_width, put_uint, saturate, FieldReader, ProtocolVersion};

#[test]
fn test_pinned_sizes() {
    assert_eq!(ProtocolVersion::V1.layout().size(), 20);
    assert_eq!(ProtocolVersion::V2.layout().size(), 24);
    assert_eq!(ProtocolVersion::V3.layout().size(), 32);
}

#[test]
fn test_body_excludes_checksum() {
    for version in ProtocolVersion::ALL {
        let layout = version.layout();
        assert_eq!(layout.body_size() + layout.checksum, layout.size());
    }
    assert_eq!(ProtocolVersion::V3.layout().checksum, 4);
    assert_eq!(ProtocolVersion::V2.layout().checksum, 2);
}

#[test]
fn test_version_lookup() {
    assert_eq!(ProtocolVersion::from_size(24), Some(ProtocolVersion::V2));
    assert_eq!(ProtocolVersion::from_size(25), None);
    assert_eq!(ProtocolVersion::from_byte(3), Some(ProtocolVersion::V3));
    assert_eq!(ProtocolVersion::from_byte(9), None);
    assert_eq!(ProtocolVersion::from_name("v1"), Some(ProtocolVersion::V1));
    assert_eq!(ProtocolVersion::from_name("V3"), Some(ProtocolVersion::V3));
    assert_eq!(ProtocolVersion::from_name("2"), Some(ProtocolVersion::V2));
    assert_eq!(ProtocolVersion::from_name("v7"), None);
    assert_eq!(ProtocolVersion::default(), ProtocolVersion::V2);
}

#[test]
fn test_version_name_allows_single_prefix() {
    assert_eq!(ProtocolVersion::from_name(" v2 "), Some(ProtocolVersion::V2));
    for name in ["vv2", "Vv3", "v", "", "version2", "v 1", "v+2"] {
        assert_eq!(ProtocolVersion::from_name(name), None, "{:?}", name);
    }
}

#[test]
fn test_saturation_helpers() {
    assert_eq!(max_for_width(0), 0);
    assert_eq!(max_for_width(1), 255);
    assert_eq!(max_for_width(2), 65_535);
    assert_eq!(max_for_width(8), u64::MAX);
    assert_eq!(saturate(70_000, 2), 65_535);
    assert_eq!(saturate(12, 2), 12);
}

#[test]
fn test_put_uint_is_big_endian_and_saturating() {
    let mut buf = Vec::new();
    put_uint(&mut buf, 0x0102, 2);
    put_uint(&mut buf, 0x1_0000, 2);
    put_uint(&mut buf, 7, 0);
    assert_eq!(buf, vec![0x01, 0x02, 0xFF, 0xFF]);
}

#[test]
fn test_field_reader_stops_at_end() {
    let bytes = [0x00, 0x2A, 0x01];
    let mut reader = FieldReader::new(&bytes);
    assert_eq!(reader.uint(2), Some(42));
    assert_eq!(reader.position(), 2);
    assert_eq!(reader.uint(2), None);
    assert_eq!(reader.uint(1), Some(1));
}
