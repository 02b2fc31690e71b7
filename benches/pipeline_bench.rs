//! Pipeline throughput benchmarks.
//!
//! Pushes a batch of lines through the parser and filter stages over real
//! tokio channels, measuring lines per second end to end.
//!
//! # Groups
//!
//! | Group | What it measures |
//! |-------|-----------------|
//! | `capacity` | Effect of the inter-stage queue bound |
//! | `filters` | Cost of a realistic filter chain on top of parsing |
//!
//! # Viewing results
//!
//! ```sh
//! cargo bench --bench pipeline_bench
//! ```

use chrono::TimeDelta;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use logmunch_core::filter::{BucketizeKey, FilterChain, NormalizeUrlPath, RoundTimestamp};
use logmunch_core::{Parser, Pipeline, Script};

const BATCH: usize = 10_000;

fn lines() -> Vec<String> {
    (0..BATCH)
        .map(|i| {
            format!(
                "<158>1 2015-03-20T19:{:02}:{:02}.000000+00:00 host heroku router - - at=info method=GET path=\"/users/{i}\" dyno=web.{} service={}ms status={}",
                (i / 60) % 60,
                i % 60,
                i % 4,
                i % 900,
                if i % 10 == 0 { 503 } else { 200 },
            )
        })
        .collect()
}

async fn drive(pipeline: Pipeline, lines: Vec<String>) -> usize {
    let (tx, rx) = pipeline.line_channel();
    let mut running = pipeline.spawn(rx);

    let feeder = tokio::spawn(async move {
        for line in lines {
            if tx.send(line).await.is_err() {
                break;
            }
        }
    });

    let mut count = 0;
    while running.records.recv().await.is_some() {
        count += 1;
    }
    let _ = feeder.await;
    count
}

fn realistic_chain() -> FilterChain {
    FilterChain::new()
        .with(NormalizeUrlPath::new("path", ["/users/:uid"]).expect("valid template"))
        .with(Script::new("status >= 500").expect("valid script"))
        .with(RoundTimestamp::new(TimeDelta::minutes(1)))
        .with(BucketizeKey::new("service"))
}

fn capacity_bench(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
    let mut group = c.benchmark_group("capacity");
    group.throughput(Throughput::Elements(BATCH as u64));
    group.sample_size(20);

    for capacity in [1usize, 100, 1_000] {
        group.bench_with_input(BenchmarkId::from_parameter(capacity), &capacity, |b, &capacity| {
            b.to_async(&rt).iter(|| async move {
                let pipeline = Pipeline::new(Parser::new(), FilterChain::new()).with_capacity(capacity);
                drive(pipeline, lines()).await
            })
        });
    }
    group.finish();
}

fn filters_bench(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
    let mut group = c.benchmark_group("filters");
    group.throughput(Throughput::Elements(BATCH as u64));
    group.sample_size(20);

    group.bench_function("none", |b| {
        b.to_async(&rt)
            .iter(|| drive(Pipeline::new(Parser::new(), FilterChain::new()), lines()))
    });
    group.bench_function("realistic", |b| {
        b.to_async(&rt)
            .iter(|| drive(Pipeline::new(Parser::new(), realistic_chain()), lines()))
    });
    group.finish();
}

criterion_group!(benches, capacity_bench, filters_bench);
criterion_main!(benches);
