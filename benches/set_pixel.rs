// Run with:  cargo bench --bench set_pixel

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use embedded_graphics::prelude::Point;
use hub75_bcm::framebuffer::FrameBuffer;
use hub75_bcm::Color;
use std::hint::black_box;

const ROWS: usize = 32;
const COLS: usize = 64;

fn set_pixel(c: &mut Criterion) {
    let mut group = c.benchmark_group("set_pixel");
    group.throughput(Throughput::Elements((ROWS * COLS) as u64));

    group.bench_function("frame_buffer", |b| {
        let mut frame = FrameBuffer::<ROWS, COLS>::new();

        b.iter(|| {
            for y in 0..ROWS {
                for x in 0..COLS {
                    black_box(&mut frame).set_pixel(
                        black_box(Point::new(x as i32, y as i32)),
                        black_box(Color::new(255, 0, 0)),
                    );
                }
            }
        });
    });

    group.finish();
}

criterion_group!(benches, set_pixel);
criterion_main!(benches);
