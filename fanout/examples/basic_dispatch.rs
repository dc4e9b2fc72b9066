//! Basic dispatch example.
//!
//! Runs a batch of simulated downloads on three workers, prints each
//! outcome as it arrives, and cancels the batch once too many downloads
//! have failed.
//!
//! Run with `RUST_LOG=fanout=debug cargo run --example basic_dispatch`.

use std::time::Duration;

use fanout::{process_async_fn, CancelToken, PoolConfig, WorkerPool};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct Download {
    url: String,
    size_kb: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let jobs: Vec<Download> = (1..=12)
        .map(|n| Download {
            url: format!("https://mirror.example/archive-{n}.tar.gz"),
            size_kb: n * 40,
        })
        .collect();

    let cancel = CancelToken::new();
    let failure_budget = 3;
    let mut downloaded_kb = 0;
    let mut failures = 0;

    let trigger = cancel.clone();
    let mut pool = WorkerPool::new(
        PoolConfig::new(3).with_worker_prefix("downloader"),
        process_async_fn(|job: Download| async move {
            tokio::time::sleep(Duration::from_millis(job.size_kb)).await;
            if job.size_kb % 160 == 0 {
                return Err(format!("{}: checksum mismatch", job.url));
            }
            Ok(job)
        }),
        |job| {
            println!("[OK]   {} ({} KiB)", job.url, job.size_kb);
            downloaded_kb += job.size_kb;
        },
        |err| {
            println!("[FAIL] {err}");
            failures += 1;
            if failures >= failure_budget {
                println!("[STOP] failure budget exhausted, cancelling");
                trigger.cancel();
            }
        },
    );

    let summary = pool.dispatch(&cancel, jobs).await?;
    drop(pool);

    println!(
        "\n{} of {} downloads reported ({} ok, {} failed), {} KiB total, cancelled: {}",
        summary.observed(),
        summary.submitted,
        summary.succeeded,
        summary.failed,
        downloaded_kb,
        summary.cancelled,
    );
    Ok(())
}
