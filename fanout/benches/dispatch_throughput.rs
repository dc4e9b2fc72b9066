//! Benchmarks for dispatch throughput using criterion.
//!
//! These benchmarks measure end-to-end job processing throughput:
//! - Jobs per second with 1, 4 and 16 workers
//! - Overhead of the merge loop when half of the jobs fail
//!
//! Every iteration opens fresh lanes and workers, so lane setup and
//! teardown are part of the measured cost.

#![allow(missing_docs)]

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fanout::{process_fn, CancelToken, PoolConfig, WorkerPool};

const JOB_COUNT: u64 = 10_000;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .expect("build tokio runtime")
}

fn bench_worker_scaling(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("dispatch_scaling");
    group.throughput(Throughput::Elements(JOB_COUNT));

    for workers in [1usize, 4, 16] {
        group.bench_with_input(BenchmarkId::from_parameter(workers), &workers, |b, &workers| {
            b.to_async(&rt).iter(|| async move {
                let mut total = 0u64;
                let mut pool = WorkerPool::new(
                    PoolConfig::new(workers),
                    process_fn(|job: u64| Ok::<_, ()>(job.wrapping_mul(31))),
                    |value| total = total.wrapping_add(value),
                    |_| {},
                );
                pool.dispatch(&CancelToken::new(), 0..JOB_COUNT)
                    .await
                    .expect("dispatch");
                drop(pool);
                total
            });
        });
    }

    group.finish();
}

fn bench_mixed_outcomes(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("dispatch_mixed_outcomes");
    group.throughput(Throughput::Elements(JOB_COUNT));

    group.bench_function("half_failing", |b| {
        b.to_async(&rt).iter(|| async {
            let mut succeeded = 0usize;
            let mut failed = 0usize;
            let mut pool = WorkerPool::new(
                PoolConfig::new(4),
                process_fn(|job: u64| if job % 2 == 0 { Ok(job) } else { Err(job) }),
                |_| succeeded += 1,
                |_| failed += 1,
            );
            pool.dispatch(&CancelToken::new(), 0..JOB_COUNT)
                .await
                .expect("dispatch");
            drop(pool);
            (succeeded, failed)
        });
    });

    group.finish();
}

criterion_group!(benches, bench_worker_scaling, bench_mixed_outcomes);
criterion_main!(benches);
