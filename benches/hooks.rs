//! Benchmarks for memaudit.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use memaudit::{alloc_scalar, alloc_vector, free_scalar, free_vector, AllocKind, Auditor};

fn bench_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("round_trip");

    group.bench_function("scalar_16b", |b| {
        b.iter(|| {
            let ptr = alloc_scalar(black_box(16)).unwrap();
            unsafe { free_scalar(ptr.as_ptr()) };
        })
    });

    group.bench_function("vector_1kb", |b| {
        b.iter(|| {
            let ptr = alloc_vector(black_box(1024)).unwrap();
            unsafe { free_vector(ptr.as_ptr()) };
        })
    });

    group.finish();
}

fn bench_live_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("live_set");

    for live in [16usize, 1024, 16_384] {
        group.throughput(Throughput::Elements(live as u64));
        group.bench_with_input(BenchmarkId::new("alloc_then_free", live), &live, |b, &live| {
            let auditor = Auditor::new();
            let mut ptrs = Vec::with_capacity(live);
            b.iter(|| {
                for i in 0..live {
                    ptrs.push(auditor.allocate(AllocKind::ALL[i % 2], 32).unwrap());
                }
                for (i, ptr) in ptrs.drain(..).enumerate() {
                    unsafe { auditor.deallocate(AllocKind::ALL[i % 2], ptr.as_ptr()).unwrap() };
                }
            })
        });
    }

    group.finish();
}

fn bench_contended(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended");

    group.bench_function("4_threads_256_each", |b| {
        b.iter(|| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    std::thread::spawn(|| {
                        for _ in 0..256 {
                            let ptr = alloc_scalar(64).unwrap();
                            unsafe { free_scalar(black_box(ptr).as_ptr()) };
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
        })
    });

    group.finish();
}

criterion_group!(benches, bench_round_trip, bench_live_set, bench_contended);
criterion_main!(benches);
