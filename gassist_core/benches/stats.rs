use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use gassist_core::StatisticsTracker;

// Synthetic guide trace: slow periodic error plus xorshift seeing noise
fn synth_trace(n: usize, noise_amp: f64, seed: u32) -> Vec<f64> {
    let mut state = seed.max(1);
    let mut next_f64 = || {
        let mut x = state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        state = x;
        f64::from(x) / (f64::from(u32::MAX) + 1.0)
    };
    (0..n)
        .map(|i| {
            let t = i as f64 * 2.0;
            let pe = 1.2 * (t / 480.0 * std::f64::consts::TAU).sin();
            pe + (next_f64() * 2.0 - 1.0) * noise_amp
        })
        .collect()
}

fn bench_tracker(c: &mut Criterion) {
    let trace = synth_trace(10_000, 0.3, 0x5eed);

    c.bench_function("tracker_add_sample_10k", |b| {
        b.iter_batched(
            || StatisticsTracker::new(6.0, 2.0),
            |mut t| {
                for &x in &trace {
                    t.add_sample(black_box(x));
                }
                black_box(t.mean_and_stdev())
            },
            BatchSize::SmallInput,
        )
    });

    let mut warm = StatisticsTracker::new(6.0, 2.0);
    for &x in &trace {
        warm.add_sample(x);
    }
    c.bench_function("tracker_mean_and_stdev", |b| {
        b.iter(|| black_box(warm.mean_and_stdev()))
    });
}

criterion_group!(benches, bench_tracker);
criterion_main!(benches);
