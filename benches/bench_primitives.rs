//! Host reference primitive benchmarks.
//!
//! Batches: 1K, 16K, 256K elements for the elementwise primitives; single
//! warp operations for ldmatrix and mma. Reports element throughput.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use half::f16;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

use tcgs_primitives::{
    fast_ex2_f16, fast_fma_rn_ftz_f16x2, fast_lg2_f32, float22reg, FragmentA, FragmentB,
    FragmentC, LaneAddrs, Matrix16x8, Matrix8x8, SharedMemory, Warp, TILE_BYTES,
};

const ELEM_SIZES: &[usize] = &[1024, 16384, 262144];

fn size_label(n: usize) -> String {
    match n {
        1024 => "1K".into(),
        16384 => "16K".into(),
        262144 => "256K".into(),
        _ => format!("{n}"),
    }
}

fn random_f32(rng: &mut StdRng, n: usize, lo: f32, hi: f32) -> Vec<f32> {
    (0..n).map(|_| rng.gen_range(lo..hi)).collect()
}

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("float22reg");
    let mut rng = StdRng::seed_from_u64(1);
    for &n in ELEM_SIZES {
        let xs = random_f32(&mut rng, n, -70000.0, 70000.0);
        let ys = random_f32(&mut rng, n, -1.0, 1.0);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size_label(n)), &n, |b, _| {
            b.iter(|| {
                let packed: Vec<u32> = xs
                    .iter()
                    .zip(&ys)
                    .map(|(&x, &y)| float22reg(x, y))
                    .collect();
                black_box(packed)
            })
        });
    }
    group.finish();
}

fn bench_approx(c: &mut Criterion) {
    let mut group = c.benchmark_group("approx");
    let mut rng = StdRng::seed_from_u64(2);
    for &n in ELEM_SIZES {
        let ex2_in: Vec<f16> = random_f32(&mut rng, n, -12.0, 2.0)
            .into_iter()
            .map(f16::from_f32)
            .collect();
        let lg2_in = random_f32(&mut rng, n, 1.0e-3, 1.0e3);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("ex2_f16", size_label(n)), &n, |b, _| {
            b.iter(|| black_box(ex2_in.iter().map(|&x| fast_ex2_f16(x)).collect::<Vec<_>>()))
        });
        group.bench_with_input(BenchmarkId::new("lg2_f32", size_label(n)), &n, |b, _| {
            b.iter(|| black_box(lg2_in.iter().map(|&x| fast_lg2_f32(x)).collect::<Vec<_>>()))
        });
    }
    group.finish();
}

fn bench_fma(c: &mut Criterion) {
    let mut group = c.benchmark_group("fma_rn_ftz_f16x2");
    let mut rng = StdRng::seed_from_u64(3);
    for &n in ELEM_SIZES {
        let regs: Vec<u32> = random_f32(&mut rng, 2 * n, -4.0, 4.0)
            .chunks_exact(2)
            .map(|p| float22reg(p[0], p[1]))
            .collect();
        group.throughput(Throughput::Elements(2 * n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size_label(n)), &n, |b, _| {
            b.iter(|| {
                let out: Vec<u32> = regs
                    .windows(3)
                    .map(|w| fast_fma_rn_ftz_f16x2(w[0], w[1], w[2]))
                    .collect();
                black_box(out)
            })
        });
    }
    group.finish();
}

fn bench_warp_ops(c: &mut Criterion) {
    let mut group = c.benchmark_group("warp");
    let warp = Warp::converged();

    let mut smem = SharedMemory::with_tiles(4);
    let tile = Matrix8x8::from_fn(|r, c| f16::from_f32((r * 8 + c) as f32));
    for t in 0..4 {
        tile.store(&mut smem, t * TILE_BYTES).unwrap();
    }
    let addrs = LaneAddrs::contiguous(0);
    group.bench_function("ldmatrix_x4", |b| {
        b.iter(|| black_box(warp.load_matrix_x4(black_box(&smem), &addrs).unwrap()))
    });

    let a = FragmentA::from_matrix(&Matrix16x8::from_fn(|r, c| f16::from_f32((r + c) as f32 * 0.125)));
    let bm = FragmentB::from_matrix(&Matrix8x8::identity());
    let acc = FragmentC::zeros();
    group.bench_function("mma_16x8x8", |b| {
        b.iter(|| black_box(warp.mma_16x8x8_f16_f16(black_box(&a), &bm, &acc).unwrap()))
    });
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default().measurement_time(Duration::from_secs(3));
    targets = bench_codec, bench_approx, bench_fma, bench_warp_ops
}
criterion_main!(benches);
