//! Bump-allocation throughput, thread-safe vs local front-end

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use sealpool::{LocalPool, Pool, PoolConfig};

const PAGE: usize = 1 << 20;
const ALLOCS: usize = 1024;

fn config() -> PoolConfig {
    PoolConfig::new().with_page_size(PAGE)
}

fn alloc_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("alloc_16");

    group.bench_function("pool", |b| {
        b.iter_batched(
            || Pool::with_config(config()).unwrap(),
            |pool| {
                for _ in 0..ALLOCS {
                    black_box(pool.alloc_bytes(16).unwrap());
                }
            },
            BatchSize::SmallInput,
        )
    });

    group.bench_function("local_pool", |b| {
        b.iter_batched(
            || LocalPool::with_config(config()).unwrap(),
            |pool| {
                for _ in 0..ALLOCS {
                    black_box(pool.alloc_bytes(16).unwrap());
                }
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

fn protect_cost(c: &mut Criterion) {
    c.bench_function("protect_8_pages", |b| {
        b.iter_batched(
            || {
                let pool = Pool::with_page_size(4096).unwrap();
                for _ in 0..8 {
                    pool.alloc_bytes(2048).unwrap();
                    pool.protect();
                }
                pool
            },
            |pool| pool.protect(),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, alloc_throughput, protect_cost);
criterion_main!(benches);
