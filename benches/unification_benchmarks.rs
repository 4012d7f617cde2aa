//! Unification and Horn-clause composition benchmarks: scaling in term
//! depth, tuple arity, and composition-chain length.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::collections::BTreeSet;
use std::time::Duration;

use hornproof::guard::Guard;
use hornproof::horn::{HornClause, ANY_TIME};
use hornproof::message::Message;

fn nested_function(depth: u32) -> Message {
    let mut m = Message::var("x");
    for i in 0..depth {
        m = Message::function(format!("f{i}"), [m]);
    }
    m
}

fn bench_unify_nested_functions(c: &mut Criterion) {
    let mut group = c.benchmark_group("unify_nested_functions");
    for depth in [4u32, 16, 64] {
        let pattern = nested_function(depth);
        let mut ground = Message::name("leaf");
        for i in 0..depth {
            ground = Message::function(format!("f{i}"), [ground]);
        }
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| pattern.is_unifiable_with(&ground));
        });
    }
    group.finish();
}

fn bench_unify_wide_tuple(c: &mut Criterion) {
    let mut group = c.benchmark_group("unify_wide_tuple");
    for arity in [2usize, 8, 32] {
        let pattern = Message::tuple((0..arity).map(|i| Message::var(format!("v{i}"))));
        let ground = Message::tuple((0..arity).map(|i| Message::name(format!("n{i}"))));
        group.bench_with_input(BenchmarkId::from_parameter(arity), &arity, |b, _| {
            b.iter(|| pattern.is_unifiable_with(&ground));
        });
    }
    group.finish();
}

fn bench_compose_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose_chain");
    for length in [4usize, 16, 32] {
        let mut clauses = Vec::with_capacity(length);
        for i in 0..length {
            let premises: BTreeSet<Message> = if i == 0 {
                BTreeSet::new()
            } else {
                [Message::name(format!("fact{}", i - 1))].into_iter().collect()
            };
            clauses.push(HornClause::new(premises, Message::name(format!("fact{i}")), Guard::empty(), ANY_TIME));
        }
        group.bench_with_input(BenchmarkId::from_parameter(length), &length, |b, _| {
            b.iter(|| {
                let mut chain = clauses[length - 1].clone();
                for clause in clauses.iter().rev().skip(1) {
                    if let Some(composed) = chain.compose_upon(clause) {
                        chain = composed;
                    }
                }
                chain
            });
        });
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1));
    targets = bench_unify_nested_functions, bench_unify_wide_tuple, bench_compose_chain
}
criterion_main!(benches);
