//! # HornProof
//!
//! A symbolic security-protocol analyzer: given a resolved Applied Pi
//! Calculus [`hornproof_model::Network`] and a reachability query, decides
//! whether a Dolev-Yao attacker (extended with explicit mutable state
//! cells) can derive the queried message.
//!
//! ## Pipeline
//!
//! ```text
//! hornproof_model::Network
//!     ↓
//! [translate]                 → Vec<Rule> (StateConsistentRule / StateTransferringRule)
//!     ↓
//! [nession::NessionManager]   → Vec<Nession>  (symbolic state-trace elaboration)
//!     ↓
//! [nession::Nession::collect_horn_clauses] + [horn::from_stateless_scr]
//!     ↓
//! [horn::filter_implied_rules] → Vec<HornClause>
//!     ↓
//! [query::QueryEngine / query::find_attack] → Option<query::Attack>
//! ```
//!
//! The translation, nession elaboration, and query-resolution stages are
//! independent and may be driven directly (see each module's docs) rather
//! than only through [`verify`], which wires the whole pipeline together
//! for the common case of "one network, one query."
//!
//! ## Module organization
//!
//! | Module | Role |
//! |---|---|
//! | [`message`] | The term algebra (`Message`, `SigmaMap`) and unification |
//! | [`guard`] | Negative binding constraints consulted by unification |
//! | [`sigma_factory`] | Bidirectional tentative-substitution accumulator |
//! | [`event`] | Tagged rule premises/results (`Know`, `New`, `Make`, ...) |
//! | [`state`] / [`snapshot`] | Named cell values and their history premises |
//! | [`rule`] | `StateConsistentRule` / `StateTransferringRule` |
//! | [`horn`] | Ranked Horn clauses: composition, scrub, detuple, implication |
//! | [`translate`] | `hornproof_model::Network` → `Vec<Rule>` |
//! | [`nession`] | Symbolic state-trace elaboration (`NessionManager`, `KnitPattern`) |
//! | [`query`] | Backward AND/OR proof search and attack-witness assembly |
//! | [`describe`] | Textual rendering of an `Attack`'s derivation tree |
//! | [`error`] | `EngineError`, the one error taxonomy the core returns |
//! | [`limits`] | `EngineLimits` / `CancelToken`, the constructor-parameter config surface |

pub mod describe;
pub mod error;
pub mod event;
pub mod guard;
pub mod horn;
pub mod limits;
pub mod message;
pub mod nession;
pub mod query;
pub mod rule;
pub mod sigma_factory;
pub mod snapshot;
pub mod state;
pub mod translate;

pub use describe::{describe, describe_with_sources};
pub use error::EngineError;
pub use limits::{CancelToken, EngineLimits};
pub use message::{Message, SigmaMap};
pub use nession::{Nession, NessionManager};
pub use query::{find_attack, Attack, QueryEngine};
pub use rule::{Rule, StateConsistentRule, StateTransferringRule};

use hornproof_model::{Network, QueryDecl};

/// Runs the whole pipeline for one query against one network: translates
/// the network, elaborates every reachable nession, and resolves the
/// query's goal (under its optional `when` clause) against the clauses
/// gathered from each nession in turn.
///
/// Returns `Ok(None)` if no nession proves the goal; returns `Err` only for
/// [`EngineError::IllFormedInput`] (translation rejected the network) or a
/// fatal [`EngineError::InvariantViolation`].
pub fn verify(
    network: &Network,
    query: &QueryDecl,
    limits: &EngineLimits,
    cancel: &CancelToken,
) -> Result<Option<Attack>, EngineError> {
    let rules = translate::translate(network)?;

    let scrs: Vec<StateConsistentRule> = rules.iter().filter_map(Rule::as_scr).cloned().collect();
    let strs: Vec<StateTransferringRule> = rules.iter().filter_map(Rule::as_str_rule).cloned().collect();

    let stateless: Vec<horn::HornClause> = scrs.iter().filter_map(horn::from_stateless_scr).collect();

    let stateful_scrs: Vec<StateConsistentRule> = scrs.iter().filter(|r| !r.snapshots.is_empty()).cloned().collect();
    let initial_cells = initial_state_cells(network);

    let nessions = NessionManager::elaborate(initial_cells, &stateful_scrs, &strs, limits, cancel);

    Ok(find_attack(&nessions, &stateless, &query.goal, query.when.as_ref(), limits, cancel))
}

/// The declared starting value of every cell a `mutate` touches, as a
/// distinct ground placeholder name — a protocol's initial cell contents
/// are not separately declared in [`hornproof_model::Network`]. A ground
/// name rather than a fresh variable so [`nession::Nession::cell_holds`]
/// (used by a query's `when` clause) can't spuriously match an
/// unrelated value against a cell that was never actually mutated to it;
/// the first `mutate` on a cell already supplies its own fresh "before"
/// variable (see `translate::translate_process`'s `Mutate` arm) to match
/// whatever this placeholder turns out to be.
fn initial_state_cells(network: &Network) -> Vec<state::State> {
    use std::collections::BTreeSet;
    let mut cells = BTreeSet::new();
    collect_cells_from_process(&network.main, &mut cells);
    cells
        .into_iter()
        .map(|cell| state::State::new(cell.clone(), message::Message::name(format!("{cell}_init"))))
        .collect()
}

fn collect_cells_from_process(p: &hornproof_model::Process, out: &mut std::collections::BTreeSet<String>) {
    use hornproof_model::Process;
    match p {
        Process::Nil => {}
        Process::New { then, .. }
        | Process::In { then, .. }
        | Process::Out { then, .. }
        | Process::Insert { then, .. }
        | Process::Event { then, .. } => collect_cells_from_process(then, out),
        Process::Mutate { cell, then, .. } => {
            out.insert(cell.clone());
            collect_cells_from_process(then, out);
        }
        Process::Let { then, or_else, .. } | Process::Get { then, or_else, .. } => {
            collect_cells_from_process(then, out);
            if let Some(b) = or_else {
                collect_cells_from_process(b, out);
            }
        }
        Process::If { then_branch, else_branch, .. } => {
            collect_cells_from_process(then_branch, out);
            collect_cells_from_process(else_branch, out);
        }
        Process::Replicate(body) => collect_cells_from_process(body, out),
        Process::Parallel(branches) => branches.iter().for_each(|b| collect_cells_from_process(b, out)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hornproof_model::builders::{NetworkBuilder, ProcessBuilder};
    use hornproof_model::Term;

    #[test]
    fn verify_finds_no_attack_on_the_false_attack_avoidance_shape() {
        let main = ProcessBuilder::parallel([
            ProcessBuilder::out(Term::name("d"), Term::name("s")),
            ProcessBuilder::input(Term::name("d"), Term::var("v"), ProcessBuilder::out(Term::name("c"), Term::name("d"))),
        ])
        .build();
        let net = NetworkBuilder::new(main)
            .free("c", "channel", false)
            .free("d", "channel", true)
            .free("s", "bitstring", true)
            .query(Term::name("s"))
            .build();

        let limits = EngineLimits::default();
        let cancel = CancelToken::new();
        let attack = verify(&net, &net.queries[0], &limits, &cancel).expect("translation succeeds");
        assert!(attack.is_none());
    }

    #[test]
    fn verify_rejects_ill_formed_network_without_searching() {
        let net = NetworkBuilder::new(ProcessBuilder::nil().build())
            .destructor(vec!["x".into()], Term::apply("fst", [Term::var("x")]), Term::var("y"))
            .query(Term::name("anything"))
            .build();
        let limits = EngineLimits::default();
        let cancel = CancelToken::new();
        assert!(matches!(verify(&net, &net.queries[0], &limits, &cancel), Err(EngineError::IllFormedInput(_))));
    }
}
