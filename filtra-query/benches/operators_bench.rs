//! Benchmarks for operator strategies, registry lookups and SQL rendering.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use filtra_query::{Dialect, FilterRegistry, FilterValue, Operator, QueryScope, SqlScope, StrategyArgs};

fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("strategy");
    let text = [FilterValue::from("rust")];
    let list: Vec<FilterValue> = (0..32_i64).map(FilterValue::from).collect();
    let pair = [FilterValue::Int(10), FilterValue::Int(20)];

    for dialect in [Dialect::PostgreSQL, Dialect::MySQL, Dialect::SQLite, Dialect::MsSql] {
        group.bench_with_input(
            BenchmarkId::new("contains_case_sensitive", dialect.name()),
            &dialect,
            |b, dialect| {
                b.iter(|| {
                    let args = StrategyArgs::new("$containsc", "title", &text, dialect);
                    black_box(Operator::ContainsCaseSensitive.build(&args))
                })
            },
        );
    }

    group.bench_function("in_32", |b| {
        b.iter(|| {
            let args = StrategyArgs::new("$in", "id", &list, &Dialect::PostgreSQL);
            black_box(Operator::In.build(&args))
        })
    });

    group.bench_function("between", |b| {
        b.iter(|| {
            let args = StrategyArgs::new("$between", "age", &pair, &Dialect::PostgreSQL);
            black_box(Operator::Between.build(&args))
        })
    });

    group.finish();
}

fn bench_registry(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry");
    let registry = FilterRegistry::with_defaults();

    group.bench_function("lookup_hit", |b| {
        b.iter(|| black_box(registry.lookup(black_box("$notBetween"))))
    });
    group.bench_function("lookup_miss", |b| {
        b.iter(|| black_box(registry.lookup(black_box("author"))))
    });
    group.bench_function("only_3", |b| {
        b.iter(|| black_box(registry.only(["$eq", "$in", "$null"])))
    });

    group.finish();
}

fn bench_rendering(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");

    for count in [1, 10, 50] {
        let mut scope = SqlScope::postgres("users");
        for i in 0..count {
            scope.where_in(&format!("field_{}", i), vec![1.into(), 2.into(), 3.into()], false);
        }
        group.bench_with_input(BenchmarkId::new("where_in", count), &scope, |b, scope| {
            b.iter(|| black_box(scope.to_where_sql()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_strategies, bench_registry, bench_rendering);
criterion_main!(benches);
