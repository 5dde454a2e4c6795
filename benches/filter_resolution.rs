//! Benchmarks for end-to-end filter resolution.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use filtra::prelude::*;

fn engine(depth: usize) -> FilterEngine {
    // Chain of models M0 -> M1 -> ... each with a `next` relation.
    let models = (0..=depth).map(|i| {
        let model = ModelDef::new(format!("M{}", i)).fields(["id", "name", "score"]);
        if i < depth {
            model.relation(RelationDef::has_many("next", format!("M{}", i + 1)))
        } else {
            model
        }
    });
    let schema = Schema::new(models).expect("valid schema");
    FilterEngine::new(Resolver::with_defaults(), schema, Dialect::PostgreSQL).expect("valid engine")
}

fn nested_filter(depth: usize) -> FilterExpr {
    let mut expr = FilterExpr::entry("name", FilterExpr::entry("$contains", "bench"));
    for _ in 0..depth {
        expr = FilterExpr::entry("next", expr);
    }
    expr
}

fn bench_nesting_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_depth");

    for depth in [0, 1, 3, 6] {
        let engine = engine(depth);
        let filter = nested_filter(depth);

        group.bench_with_input(BenchmarkId::new("filter", depth), &filter, |b, filter| {
            b.iter(|| black_box(engine.filter("M0", filter)))
        });
    }

    group.finish();
}

fn bench_wide_filters(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_width");
    let engine = engine(1);

    for width in 1..=3 {
        let filter = FilterExpr::entry(
            "next",
            FilterExpr::map((0..width).map(|i| {
                let (field, op) = [("id", "$gte"), ("name", "$startsWith"), ("score", "$lt")][i];
                (
                    field.to_string(),
                    FilterExpr::entry(op, FilterValue::Int(i as i64 * 10)),
                )
            })),
        );

        group.bench_with_input(BenchmarkId::new("apply_all", width), &filter, |b, filter| {
            b.iter(|| black_box(engine.filter("M0", filter)))
        });
    }

    group.finish();
}

fn bench_validate(c: &mut Criterion) {
    let resolver = Resolver::with_defaults();
    let deep = nested_filter(8);

    c.bench_function("validate_depth_8", |b| {
        b.iter(|| black_box(resolver.validate(black_box(&deep))))
    });
}

criterion_group!(benches, bench_nesting_depth, bench_wide_filters, bench_validate);
criterion_main!(benches);
