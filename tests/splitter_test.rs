use ticktrade_core::splitter::Splitter;

fn message(msg_type: u8, seq: u32, len: usize) -> Vec<u8> {
    let mut frame = vec![0u8; len];
    frame[0] = msg_type;
    frame[1..5].copy_from_slice(&seq.to_be_bytes());
    frame
}

#[test]
fn a_gap_latches_stale_until_the_threshold_is_crossed() {
    // expected=3 after seq 1,2; a gap to seq=5 sets target = 3 + 10 = 13.
    let mut splitter = Splitter::new(10);
    let mut payload = message(b'D', 1, 19);
    payload.extend(message(b'D', 2, 19));
    payload.extend(message(b'D', 5, 19));

    let mut stale = Vec::new();
    let report = splitter.split(&payload, |f| stale.push((f.seq, f.stale)));
    assert_eq!(report.gaps, 1);
    assert_eq!(stale, vec![(1, false), (2, false), (5, true)]);
    assert!(splitter.is_stale());

    // Messages before the target stay stale; the one at the target clears
    // the latch, visible on that same record.
    let mut payload2 = Vec::new();
    for seq in 6..=12u32 {
        payload2.extend(message(b'D', seq, 19));
    }
    let mut stale2 = Vec::new();
    splitter.split(&payload2, |f| stale2.push(f.stale));
    assert!(stale2.iter().all(|&s| s), "still below the target of 13");

    let payload3 = message(b'D', 13, 19);
    let mut stale3 = Vec::new();
    splitter.split(&payload3, |f| stale3.push(f.stale));
    assert_eq!(stale3, vec![false]);
    assert!(!splitter.is_stale());
}

#[test]
fn operator_can_manually_clear_the_stale_latch() {
    let mut splitter = Splitter::new(100);
    let mut payload = message(b'D', 1, 19);
    payload.extend(message(b'D', 50, 19));
    splitter.split(&payload, |_| {});
    assert!(splitter.is_stale());

    splitter.clear_stale();
    assert!(!splitter.is_stale());
}

#[test]
fn an_unrecognized_message_type_desyncs_and_stops_the_packet() {
    let mut splitter = Splitter::new(10);
    let mut payload = message(b'D', 1, 19);
    payload.push(b'?');
    payload.extend_from_slice(&[0u8; 30]);

    let mut seen = Vec::new();
    let report = splitter.split(&payload, |f| seen.push(f.seq));
    assert_eq!(seen, vec![1]);
    assert_eq!(report.desyncs, 1);
}

#[test]
fn disabling_sequence_checking_forwards_everything_unconditionally() {
    let mut splitter = Splitter::new(10);
    splitter.set_seq_check_enabled(false);
    let mut payload = message(b'D', 1, 19);
    payload.extend(message(b'D', 1, 19));
    payload.extend(message(b'D', 9_999, 19));

    let mut seen = Vec::new();
    let report = splitter.split(&payload, |f| seen.push(f.seq));
    assert_eq!(seen, vec![1, 1, 9_999]);
    assert_eq!(report.gaps, 0);
    assert_eq!(report.dupes, 0);
    assert!(!splitter.is_stale());
}
