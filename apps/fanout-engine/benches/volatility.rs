use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use fanout_engine::numeric::{log_returns, rolling_std};
use fanout_engine::parallel_volatility;
use fanout_engine::simulation::simulate_gbm_path;
use rand::SeedableRng;
use rand::rngs::StdRng;

const DAYS: [usize; 3] = [1_000, 10_000, 100_000];
const WINDOW: usize = 20;
const WORKERS: [usize; 3] = [1, 2, 4];

fn returns_fixture(days: usize) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(7);
    let path = simulate_gbm_path(100.0, 0.0005, 0.02, days, &mut rng).unwrap();
    log_returns(&path).unwrap()
}

fn bench_volatility(c: &mut Criterion) {
    let mut group = c.benchmark_group("volatility");

    for days in DAYS {
        let returns = returns_fixture(days);
        group.throughput(Throughput::Elements((returns.len() - WINDOW + 1) as u64));

        group.bench_with_input(BenchmarkId::new("sequential", days), &returns, |b, returns| {
            b.iter(|| rolling_std(black_box(returns), WINDOW, 0).unwrap());
        });

        for workers in WORKERS {
            group.bench_with_input(
                BenchmarkId::new(format!("workers_{workers}"), days),
                &returns,
                |b, returns| {
                    b.iter(|| parallel_volatility(black_box(returns), WINDOW, workers).unwrap());
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_volatility);
criterion_main!(benches);
