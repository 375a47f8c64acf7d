// Run with:  cargo bench --bench encode

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use hub75_bcm::bitplane::TransferBuffer;
use hub75_bcm::framebuffer::FrameBuffer;
use hub75_bcm::gamma::GammaLut;
use hub75_bcm::Color;
use std::hint::black_box;

const ROWS: usize = 32;
const COLS: usize = 64;
const NROWS: usize = hub75_bcm::compute_scan_rate(ROWS);
const BITS: usize = 8;

fn encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    group.throughput(Throughput::Bytes(
        hub75_bcm::compute_transfer_len(COLS, NROWS, BITS) as u64,
    ));

    group.bench_function("full_frame", |b| {
        let mut frame = FrameBuffer::<ROWS, COLS>::new();
        frame.fill(Color::new(200, 150, 100));
        let lut = GammaLut::default();
        let mut buffer = TransferBuffer::<COLS, NROWS, BITS>::new();

        b.iter(|| {
            black_box(&mut buffer).encode(black_box(&frame), black_box(&lut));
        });
    });

    group.finish();
}

criterion_group!(benches, encode);
criterion_main!(benches);
