use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ticktrade_core::common::pad_symbol;
use ticktrade_core::pipeline::Pipeline;
use ticktrade_core::ring::RingConsumer;

fn add_order_payload(seq: u32, price: u32, qty: u32, symbol: &str) -> Vec<u8> {
    let mut frame = vec![0u8; 36];
    frame[0] = b'A';
    frame[1..5].copy_from_slice(&seq.to_be_bytes());
    frame[13] = b'B';
    frame[14..18].copy_from_slice(&qty.to_be_bytes());
    frame[18..26].copy_from_slice(&pad_symbol(symbol).unwrap());
    frame[26..30].copy_from_slice(&price.to_be_bytes());
    frame
}

fn on_payload_add_order(c: &mut Criterion) {
    let (mut pipeline, config) = Pipeline::new(1000);
    config.load_symbol(pad_symbol("AAPL").unwrap(), 0).unwrap();
    config.commit_symbols();
    config.set_reference_price(0, 1_500_000);

    let mut seq = 0u32;
    c.bench_function("on_payload add-order", |b| {
        b.iter(|| {
            seq = seq.wrapping_add(1);
            let payload = add_order_payload(seq, 1_500_000 + (seq % 100), 100, "AAPL");
            pipeline.on_payload(black_box(&payload), seq as u64);
            let mut consumer = RingConsumer::new(pipeline.ring());
            while consumer.pop().is_some() {}
        })
    });
}

criterion_group!(benches, on_payload_add_order);
criterion_main!(benches);
