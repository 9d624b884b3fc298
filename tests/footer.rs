use proptest::prelude::*;
use vhd::{FOOTER_SIZE, VhdFooter, footer_checksum, generate_footer};

fn be_u64(bytes: &[u8]) -> u64 {
    u64::from_be_bytes(bytes.try_into().unwrap())
}

fn be_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes(bytes.try_into().unwrap())
}

fn recompute_checksum(footer: &[u8; FOOTER_SIZE]) -> u32 {
    let mut zeroed = *footer;
    zeroed[64..68].fill(0);
    !zeroed.iter().fold(0u32, |acc, &b| acc.wrapping_add(b as u32))
}

const CAPACITIES: [u64; 7] = [0, 1, 512, 1 << 20, 1 << 30, 1 << 40, 1 << 63];

#[test]
fn length_and_cookie() {
    for capacity in CAPACITIES {
        let footer = generate_footer(capacity);
        assert_eq!(footer.len(), 512);
        assert_eq!(&footer[0..8], b"conectix");
    }
}

#[test]
fn sizes_round_trip() {
    for capacity in CAPACITIES {
        let footer = generate_footer(capacity);
        assert_eq!(be_u64(&footer[40..48]), capacity);
        assert_eq!(be_u64(&footer[48..56]), capacity);
        assert_eq!(&footer[40..48], &footer[48..56]);
    }
}

#[test]
fn disk_type_is_fixed() {
    for capacity in CAPACITIES {
        assert_eq!(be_u32(&generate_footer(capacity)[60..64]), 2);
    }
}

#[test]
fn one_kib_disk() {
    let footer = generate_footer(1024);
    assert_eq!(footer.len(), 512);
    assert_eq!(&footer[0..8], b"conectix");
    assert_eq!(be_u64(&footer[40..48]), 1024);
    assert_eq!(recompute_checksum(&footer), be_u32(&footer[64..68]));
}

#[test]
fn zero_capacity_disk() {
    let footer = generate_footer(0);
    assert_eq!(be_u64(&footer[40..48]), 0);
    assert_eq!(be_u64(&footer[48..56]), 0);
    assert_eq!(recompute_checksum(&footer), be_u32(&footer[64..68]));
}

#[test]
fn two_tib_disk() {
    let footer = generate_footer(2_199_023_255_552);
    assert_eq!(be_u64(&footer[40..48]), 2_199_023_255_552);
    assert_eq!(be_u64(&footer[48..56]), 2_199_023_255_552);
}

#[test]
fn unique_ids_differ() {
    let a = generate_footer(1024);
    let b = generate_footer(1024);
    assert_ne!(&a[68..84], &b[68..84]);
}

#[test]
fn generated_footer_parses() {
    let footer = VhdFooter::parse(&generate_footer(1 << 30)).unwrap();
    assert_eq!(footer.capacity(), 1 << 30);
    assert_eq!(footer.data_offset.get(), u64::MAX);
    assert_eq!(footer.features.get(), 2);
    assert_eq!(footer.format_version.get(), 0x0001_0000);
    assert_eq!(&footer.creator_app, b"wa\0\0");
    assert_eq!(&footer.creator_os, b"Wi2k");
    assert!(footer.unique_id.get_version_num() == 4);
}

#[test]
fn timestamp_is_recent() {
    let before = vhd::timestamp::vhd_timestamp(std::time::SystemTime::now());
    let footer = generate_footer(512);
    let after = vhd::timestamp::vhd_timestamp(std::time::SystemTime::now());
    let stamp = be_u32(&footer[24..28]);
    assert!(before <= stamp && stamp <= after);
}

proptest! {
    #[test]
    fn checksum_is_self_consistent(capacity in any::<u64>()) {
        let footer = generate_footer(capacity);
        prop_assert_eq!(footer_checksum(&footer), be_u32(&footer[64..68]));
        prop_assert_eq!(recompute_checksum(&footer), be_u32(&footer[64..68]));
    }

    #[test]
    fn size_round_trips(capacity in any::<u64>()) {
        let footer = generate_footer(capacity);
        prop_assert_eq!(be_u64(&footer[40..48]), capacity);
        prop_assert_eq!(VhdFooter::parse(&footer).unwrap().capacity(), capacity);
    }
}
