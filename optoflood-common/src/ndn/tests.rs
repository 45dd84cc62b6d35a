//! Unit tests for the NDN packet implementation

use super::*;
use bytes::Bytes;

#[test]
fn test_name_creation() {
    let name = Name::from_string("/test/data/1");

    assert_eq!(name.len(), 3);
    assert_eq!(&name.get(0).unwrap().0[..], b"test");
    assert_eq!(&name.get(1).unwrap().0[..], b"data");
    assert_eq!(&name.get(2).unwrap().0[..], b"1");

    assert_eq!(name.to_string(), "/test/data/1");
}

#[test]
fn test_name_compare() {
    let name1 = Name::from_string("/a/b/c");
    let name2 = Name::from_string("/a/b/c");
    let name3 = Name::from_string("/a/b/d");
    let name4 = Name::from_string("/a/b");

    assert_eq!(name1, name2);
    assert_ne!(name1, name3);
    assert_ne!(name1, name4);

    // Test prefix matching
    assert!(name4.is_prefix_of(&name1));
    assert!(!name1.is_prefix_of(&name4));
    assert!(!name3.is_prefix_of(&name1));
}

#[test]
fn test_name_ordering() {
    // A proper prefix sorts before every extension of itself
    let parent = Name::from_string("/a/b");
    let child = Name::from_string("/a/b/c");
    assert!(parent < child);

    // Shorter components sort first, then lexicographic
    let short = Name::from_string("/a/z");
    let long = Name::from_string("/a/aa");
    assert!(short < long);

    let x = Name::from_string("/a/b");
    let y = Name::from_string("/a/c");
    assert!(x < y);
}

#[test]
fn test_name_parent_and_prefix() {
    let name = Name::from_string("/a/b/c");
    assert_eq!(name.parent(), Name::from_string("/a/b"));
    assert_eq!(name.prefix(1), Name::from_string("/a"));
    assert_eq!(name.prefix(0), Name::new());
    assert_eq!(Name::new().parent(), Name::new());
}

#[test]
fn test_name_tlv_roundtrip() {
    let name = Name::from_string("/optoflood/video/segment/9");
    let element = name.to_tlv();
    let parsed = Name::from_tlv(&element).unwrap();
    assert_eq!(parsed, name);
}

#[test]
fn test_interest_roundtrip() {
    let name = Name::from_string("/test/interest");
    let interest = Interest::new(name.clone())
        .with_nonce(42)
        .with_lifetime(4000)
        .with_hop_limit(3)
        .with_can_be_prefix(true)
        .with_must_be_fresh(true)
        .with_app_params(Bytes::from_static(&[0xCD, 0x01, 0x02]));

    let wire = interest.to_wire();
    let parsed = Interest::from_wire(&wire).unwrap();

    assert_eq!(parsed.name, name);
    assert_eq!(parsed.nonce, 42);
    assert_eq!(parsed.lifetime_ms, 4000);
    assert_eq!(parsed.hop_limit, Some(3));
    assert!(parsed.can_be_prefix);
    assert!(parsed.must_be_fresh);
    assert_eq!(parsed.app_params, Some(Bytes::from_static(&[0xCD, 0x01, 0x02])));
}

#[test]
fn test_data_roundtrip() {
    let name = Name::from_string("/test/data");
    let content = Bytes::from_static(b"Hello, NDN!");
    let data = Data::new(name.clone(), content.clone())
        .with_freshness(10_000)
        .with_app_meta(Bytes::from_static(&[0xC9, 0x00, 0xCA, 0x01, 0x2A]));

    let wire = data.to_wire();
    let parsed = Data::from_wire(&wire).unwrap();

    assert_eq!(parsed.name, name);
    assert_eq!(parsed.content, content);
    assert_eq!(parsed.freshness_ms, 10_000);
    // The metadata block survives the round trip byte-for-byte
    assert_eq!(parsed.app_meta, data.app_meta);
}

#[test]
fn test_data_without_name_rejected() {
    // A bare Data TLV with empty payload has no name
    let wire = Bytes::from_static(&[0x06, 0x00]);
    assert!(Data::from_wire(&wire).is_err());
}
