//! End-to-end `verify` benchmarks: scaling in Horn-clause composition depth
//! (repeated attacker replay through a responder) and nession elaboration
//! depth (a chain of independent cell mutations gating a leak).

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::time::Duration;

use hornproof::{verify, CancelToken, EngineLimits};
use hornproof_model::builders::{NetworkBuilder, ProcessBuilder};
use hornproof_model::{Network, Term};

fn run(net: &Network, limits: &EngineLimits) -> bool {
    let cancel = CancelToken::new();
    verify(net, &net.queries[0], limits, &cancel).expect("well-formed network").is_some()
}

/// A replicated responder applying `h` to whatever it's sent, queried for
/// `h` nested `rounds` deep — each extra round is one more composition step
/// the query engine's backward search has to chain through.
fn replay_network(rounds: u32) -> Network {
    let body = ProcessBuilder::new_name(
        "c",
        "channel",
        ProcessBuilder::parallel([
            ProcessBuilder::out(Term::name("pubC"), Term::name("c")),
            ProcessBuilder::input(
                Term::name("c"),
                Term::var("reply_in"),
                ProcessBuilder::out(Term::name("c"), Term::apply("h", [Term::var("reply_in")])),
            ),
            ProcessBuilder::out(Term::name("c"), Term::name("holder")),
        ]),
    );
    let main = ProcessBuilder::replicate(body).build();

    let mut goal = Term::name("holder");
    for _ in 0..rounds {
        goal = Term::apply("h", [goal]);
    }

    NetworkBuilder::new(main)
        .free("pubC", "channel", false)
        .free("holder", "bitstring", true)
        .constructor("h", vec!["bitstring".into()], "bitstring", true)
        .query(goal)
        .build()
}

fn bench_composition_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("composition_depth");
    for rounds in [1u32, 3, 6] {
        let net = replay_network(rounds);
        let limits = EngineLimits { maximum_terms: 20_000, elaboration_limit: 64 };
        group.bench_with_input(BenchmarkId::from_parameter(rounds), &rounds, |b, _| {
            b.iter(|| run(&net, &limits));
        });
    }
    group.finish();
}

/// A chain of `cells` independent mutations gating a single leak: each extra
/// cell is one more nession frame the elaboration loop must advance through
/// before the leak's snapshot requirement is satisfiable.
fn cell_chain_network(cells: u32) -> Network {
    let mut tail = ProcessBuilder::out(Term::name("c"), Term::name("secretData"));
    for i in (0..cells).rev() {
        tail = ProcessBuilder::mutate(format!("cell{i}"), Term::name(format!("level{i}")), tail);
    }
    let main = tail.build();

    let mut builder = NetworkBuilder::new(main).free("c", "channel", false).constant("secretData", "bitstring");
    for i in 0..cells {
        builder = builder.constant(format!("level{i}"), "state");
    }
    builder.query(Term::name("secretData")).build()
}

fn bench_nession_chain_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("nession_chain_depth");
    for cells in [1u32, 3, 6] {
        let net = cell_chain_network(cells);
        let limits = EngineLimits::default();
        group.bench_with_input(BenchmarkId::from_parameter(cells), &cells, |b, _| {
            b.iter(|| run(&net, &limits));
        });
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(8))
        .warm_up_time(Duration::from_secs(2));
    targets = bench_composition_depth, bench_nession_chain_depth
}
criterion_main!(benches);
