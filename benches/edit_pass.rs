//! Benchmarks for the synchronous edit pass and reconciliation.
//!
//! Both run once per keystroke, so they are measured on documents with a
//! realistic number of highlighted tokens.

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use irodori::edit_transform::{TransformOptions, apply_edit};
use irodori::{Edit, IdentifierRule, Range, RangeSet, reconcile};
use std::hint::black_box;

const TAGS: [&str; 4] = ["keyword", "field", "function", "number"];

/// A range every 8 bytes, 5 bytes long.
fn generate_ranges(count: usize) -> Vec<Range> {
    (0..count)
        .map(|i| Range::new(i * 8, 5, TAGS[i % TAGS.len()]))
        .collect()
}

fn benchmark_edit_pass(c: &mut Criterion) {
    let rule = IdentifierRule::default();
    let options = TransformOptions {
        identifier: &rule,
        split_on_identifier_boundary: true,
    };

    let mut group = c.benchmark_group("edit_pass");
    for count in [1_000, 10_000, 100_000].iter() {
        let set = RangeSet::from_sorted(generate_ranges(*count));
        let middle = count * 4;

        group.bench_with_input(BenchmarkId::new("typing", count), &set, |b, set| {
            b.iter_batched(
                || set.clone(),
                |mut set| apply_edit(&mut set, &Edit::insert(middle + 2, "x"), options),
                BatchSize::LargeInput,
            )
        });

        group.bench_with_input(BenchmarkId::new("split", count), &set, |b, set| {
            b.iter_batched(
                || set.clone(),
                |mut set| apply_edit(&mut set, &Edit::insert(middle + 2, " "), options),
                BatchSize::LargeInput,
            )
        });

        group.bench_with_input(BenchmarkId::new("delete_block", count), &set, |b, set| {
            b.iter_batched(
                || set.clone(),
                |mut set| apply_edit(&mut set, &Edit::delete(middle, 800), options),
                BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

fn benchmark_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");
    for count in [1_000, 10_000, 100_000].iter() {
        let old = RangeSet::from_sorted(generate_ranges(*count));

        // Same ranges except one token in the middle changed its tag.
        let mut candidates = generate_ranges(*count);
        let middle = count / 2;
        candidates[middle] = Range::new(middle * 8, 5, "parameter");

        group.bench_with_input(
            BenchmarkId::new("one_changed", count),
            &(&old, &candidates),
            |b, (old, candidates)| {
                b.iter_batched(
                    || (*candidates).clone(),
                    |candidates| black_box(reconcile(old, candidates)),
                    BatchSize::LargeInput,
                )
            },
        );
    }
    group.finish();
}

criterion_group!(benches, benchmark_edit_pass, benchmark_reconcile);
criterion_main!(benches);
