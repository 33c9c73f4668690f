//! Manual timing loops for the allocate/deallocate hot path.
//!
//! Uses `std::time::Instant`-based timing loops rather than
//! `#[bench]`/`test::Bencher`, which requires nightly's `#![feature(test)]`,
//! or a `criterion` dependency. A hand-rolled loop is simpler than adding a
//! new dev-dependency for a single benchmark file and needs no nightly
//! toolchain to run.
//!
//! Run with `cargo bench`.

use std::alloc::{GlobalAlloc as _, Layout};
use std::hint::black_box;
use std::time::{Duration, Instant};

const ITERATIONS: usize = 100_000;

/// Repeatedly allocate and deallocate the same single-byte block, after
/// first filling the heap with `pre_allocations` unrelated, never-freed
/// blocks to show the impact of the engine's linear best-fit scan as the
/// registry grows.
fn benchmark_with_preallocation(name: &str, pre_allocations: usize) {
    let allocator = breakalloc::Allocator::new();
    let layout = Layout::new::<u8>();

    for _ in 0..pre_allocations {
        unsafe { allocator.alloc(layout) };
    }

    // make sure there is room for the next allocation before timing starts.
    let warmup = unsafe { allocator.alloc(layout) };
    assert_ne!(warmup, std::ptr::null_mut());
    unsafe { allocator.dealloc(warmup, layout) };

    let start = Instant::now();
    for _ in 0..ITERATIONS {
        let ptr = unsafe { allocator.alloc(layout) };
        let ptr = black_box(ptr);
        unsafe { allocator.dealloc(ptr, layout) };
    }
    let elapsed = start.elapsed();

    report(name, elapsed, ITERATIONS);
}

fn report(name: &str, elapsed: Duration, iterations: usize) {
    let per_iter = elapsed / iterations as u32;
    println!("{name}: {iterations} iterations in {elapsed:?} ({per_iter:?}/iter)");
}

fn main() {
    benchmark_with_preallocation("no_memory_usage", 0);
    benchmark_with_preallocation("low_memory_usage", 8);
    benchmark_with_preallocation("medium_memory_usage", 510);
    benchmark_with_preallocation("high_memory_usage", 1020);
}
