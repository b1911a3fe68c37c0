//! Basic benchmarks for `TaggedUnion` construction and reassignment.
#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::hint::black_box;
use std::time::Instant;

use alloc_tracker::Allocator;
use criterion::{Criterion, criterion_group, criterion_main};
use variant_unions::TaggedUnion;

criterion_group!(benches, entrypoint);
criterion_main!(benches);

#[global_allocator]
static ALLOCATOR: Allocator<std::alloc::System> = Allocator::system();

type Number = TaggedUnion<(u64, f64)>;
type Mixed = TaggedUnion<(u64, String)>;

const TEST_NUMBER: u64 = 1024;
const TEST_TEXT: &str = "a string that is long enough to need its own allocation";

fn entrypoint(c: &mut Criterion) {
    let allocs = alloc_tracker::Session::new();

    let mut group = c.benchmark_group("tagged_basic");

    let allocs_op = allocs.operation("construct_number");
    group.bench_function("construct_number", |b| {
        b.iter_custom(|iters| {
            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for _ in 0..iters {
                drop(black_box(Number::from_value::<u64, _>(black_box(TEST_NUMBER))));
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("set_same_type");
    group.bench_function("set_same_type", |b| {
        b.iter_custom(|iters| {
            let mut union = Number::from_value::<u64, _>(TEST_NUMBER);

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for _ in 0..iters {
                union.set::<u64, _>(black_box(TEST_NUMBER));
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("set_cross_type");
    group.bench_function("set_cross_type", |b| {
        b.iter_custom(|iters| {
            let mut union = Number::from_value::<u64, _>(TEST_NUMBER);

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for _ in 0..iters {
                union.set::<f64, _>(black_box(0.5));
                union.set::<u64, _>(black_box(TEST_NUMBER));
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("clone_from_same_type");
    group.bench_function("clone_from_same_type", |b| {
        b.iter_custom(|iters| {
            let source = Mixed::from_value::<String, _>(TEST_TEXT.to_owned());
            let mut destination = Mixed::from_value::<String, _>(TEST_TEXT.to_owned());

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for _ in 0..iters {
                destination.clone_from(black_box(&source));
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("clone_from_cross_type");
    group.bench_function("clone_from_cross_type", |b| {
        b.iter_custom(|iters| {
            let text = Mixed::from_value::<String, _>(TEST_TEXT.to_owned());
            let number = Mixed::from_value::<u64, _>(TEST_NUMBER);
            let mut destination = Mixed::new();

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for _ in 0..iters {
                destination.clone_from(black_box(&text));
                destination.clone_from(black_box(&number));
            }

            start.elapsed()
        });
    });

    group.finish();

    allocs.print_to_stdout();
}
