use ticktrade_core::decision::{flag_bits, pack_batch, DecisionRecord, DECISION_RECORD_SIZE};

#[test]
fn size_and_alignment_are_fixed() {
    assert_eq!(DECISION_RECORD_SIZE, 64);
    assert_eq!(std::mem::size_of::<DecisionRecord>(), 64);
    assert_eq!(std::mem::align_of::<DecisionRecord>(), 64);
}

#[test]
fn accept_record_roundtrips_through_the_wire_format() {
    let rec = DecisionRecord::new(
        7,
        1_000,
        1_040,
        3,
        1,
        1 << flag_bits::ACCEPT,
        100,
        1_500_000,
        1_500_000,
        250,
        -25,
        1_500_000,
    );
    let packed = rec.pack();
    assert!(DecisionRecord::verify_crc(&packed));

    let unpacked = DecisionRecord::unpack(&packed).unwrap();
    assert_eq!(unpacked.seq, 7);
    assert_eq!(unpacked.symbol_index, 3);
    assert!(unpacked.is_accept());
    assert_eq!(unpacked.qty, 100);
    assert_eq!(unpacked.price, 1_500_000);
}

#[test]
fn reject_record_carries_the_rejecting_flag_only() {
    let rec = DecisionRecord::new(8, 0, 0, 0, 0, 1 << flag_bits::PRICE_BAND_FAIL, 0, 0, 0, 0, 0, 0);
    assert!(!rec.is_accept());
    assert_eq!(rec.flags, 1 << flag_bits::PRICE_BAND_FAIL);
}

#[test]
fn a_corrupted_byte_outside_the_reserved_tail_fails_the_crc() {
    let rec = DecisionRecord::new(1, 2, 3, 4, 0, 0, 5, 6, 7, 8, 9, 10);
    let mut packed = rec.pack();
    packed[30] ^= 0x01;
    assert!(!DecisionRecord::verify_crc(&packed));
}

#[test]
fn batch_packing_is_just_concatenation() {
    let a = DecisionRecord::new(1, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0);
    let b = DecisionRecord::new(2, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0);
    let batch = pack_batch(&[a, b]);
    assert_eq!(batch.len(), 2 * DECISION_RECORD_SIZE);
    assert_eq!(&batch[0..DECISION_RECORD_SIZE], &a.pack()[..]);
    assert_eq!(&batch[DECISION_RECORD_SIZE..], &b.pack()[..]);
}

#[test]
fn short_buffer_fails_to_unpack() {
    assert!(DecisionRecord::unpack(&[0u8; 63]).is_none());
}
