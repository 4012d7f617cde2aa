//! # Query engine
//!
//! Backward (AND/OR) proof search over a flat set of Horn clauses. One
//! [`QueryEngine`] resolves goals against one fixed clause set — callers
//! build a fresh clause set per nession (stateless clauses plus that
//! nession's own) and fan the search out across nessions with
//! [`find_attack`], one `rayon` worker per nession, since each worker only
//! ever touches its own [`QueryNodeMatrix`].

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::guard::Guard;
use crate::horn::{filter_implied_rules, HornClause};
use crate::limits::{CancelToken, EngineLimits};
use crate::message::Message;
use crate::nession::Nession;
use crate::query::attack::Attack;
use crate::query::matrix::QueryNodeMatrix;
use crate::query::node::QueryNode;
use crate::query::option_set::PremiseOptionSet;
use crate::translate::term_to_message;

pub struct QueryEngine<'a> {
    clauses: &'a [HornClause],
    limits: &'a EngineLimits,
    cancel: &'a CancelToken,
}

impl<'a> QueryEngine<'a> {
    pub fn new(clauses: &'a [HornClause], limits: &'a EngineLimits, cancel: &'a CancelToken) -> Self {
        QueryEngine { clauses, limits, cancel }
    }

    /// Attempts to prove `goal` is derivable from this engine's clause set.
    pub fn resolve(&self, goal: &Message) -> QueryNode {
        let matrix = QueryNodeMatrix::new();
        let mut considered = 0usize;
        let mut instance_counter = 0u64;
        let verdict = self.prove(goal, &Guard::empty(), &matrix, &mut considered, &mut instance_counter);
        if matches!(verdict, QueryNode::Unresolvable) {
            tracing::warn!(?goal, terms_considered = considered, limit = self.limits.maximum_terms, "query budget exhausted, attempting final assessment");
            let settled = self.final_assess(goal, &Guard::empty(), &matrix, &mut instance_counter);
            if settled.is_proven() {
                return settled;
            }
        }
        verdict
    }

    /// Budget-exhaustion fallback: one bounded pass over `goal`'s candidate
    /// clauses that promotes an option whose every non-variable premise is
    /// *already* sitting in `matrix` as `Proven`, without any further
    /// recursive expansion — so it cannot itself overrun the budget.
    /// Recovers derivations the ordinary search left partially assembled
    /// when `considered` ran out, instead of discarding that work outright.
    fn final_assess(&self, goal: &Message, guard: &Guard, matrix: &QueryNodeMatrix, instance_counter: &mut u64) -> QueryNode {
        let options = PremiseOptionSet::for_premise(goal, guard, self.clauses);
        for clause in &options.options {
            *instance_counter += 1;
            let tag = instance_counter.to_string();
            let Some(sf) = clause.can_result_in(goal, guard, &tag) else {
                continue;
            };
            let fwd = sf.create_forward_map();
            let instance = clause.subscript(&tag).substitute(&fwd);

            let mut sub_attacks = BTreeMap::new();
            let mut all_settled = true;
            for premise in &instance.premises {
                if premise.is_variable() {
                    continue;
                }
                match matrix.get(premise, &instance.guard) {
                    Some(QueryNode::Proven(attack)) => {
                        sub_attacks.insert(premise.clone(), attack);
                    }
                    _ => {
                        all_settled = false;
                        break;
                    }
                }
            }

            if all_settled {
                return QueryNode::Proven(Attack {
                    query: goal.clone(),
                    actual: instance.result.clone(),
                    clause: instance,
                    sub_attacks,
                    when: None,
                });
            }
        }
        QueryNode::Unresolvable
    }

    fn prove(
        &self,
        goal: &Message,
        guard: &Guard,
        matrix: &QueryNodeMatrix,
        considered: &mut usize,
        instance_counter: &mut u64,
    ) -> QueryNode {
        if self.cancel.is_cancelled() {
            return QueryNode::Unresolvable;
        }
        if let Some(existing) = matrix.get(goal, guard) {
            return existing;
        }
        if *considered >= self.limits.maximum_terms {
            return QueryNode::Unresolvable;
        }
        *considered += 1;
        matrix.set(goal, guard, QueryNode::InProgress);

        let options = PremiseOptionSet::for_premise(goal, guard, self.clauses);
        let mut any_unresolvable = false;
        for clause in &options.options {
            *instance_counter += 1;
            let tag = instance_counter.to_string();
            let Some(sf) = clause.can_result_in(goal, guard, &tag) else {
                continue;
            };
            let fwd = sf.create_forward_map();
            let instance = clause.subscript(&tag).substitute(&fwd);

            let mut sub_attacks = BTreeMap::new();
            let mut all_proven = true;
            for premise in &instance.premises {
                if premise.is_variable() {
                    continue;
                }
                match self.prove(premise, &instance.guard, matrix, considered, instance_counter) {
                    QueryNode::Proven(attack) => {
                        sub_attacks.insert(premise.clone(), attack);
                    }
                    QueryNode::Unresolvable => {
                        // Budget exhaustion on this one premise does not
                        // condemn the whole goal — a cheaper option further
                        // down the list may resolve from facts this option
                        // happened to prove and cache along the way.
                        any_unresolvable = true;
                        all_proven = false;
                        break;
                    }
                    QueryNode::Failed | QueryNode::InProgress => {
                        all_proven = false;
                        break;
                    }
                }
            }

            if all_proven {
                let attack = Attack {
                    query: goal.clone(),
                    actual: instance.result.clone(),
                    clause: instance,
                    sub_attacks,
                    when: None,
                };
                let node = QueryNode::Proven(attack);
                matrix.set(goal, guard, node.clone());
                return node;
            }
        }

        let verdict = if any_unresolvable { QueryNode::Unresolvable } else { QueryNode::Failed };
        matrix.set(goal, guard, verdict.clone());
        verdict
    }
}

/// Resolves one query across every nession, in parallel, stopping at the
/// first nession that proves it. `when` restricts the search to nessions
/// whose history satisfies the query's state precondition.
pub fn find_attack(
    nessions: &[Nession],
    stateless_clauses: &[HornClause],
    goal: &hornproof_model::Term,
    when: Option<&hornproof_model::WhenClause>,
    limits: &EngineLimits,
    cancel: &CancelToken,
) -> Option<Attack> {
    let goal = term_to_message(goal);
    let when = when.map(|w| (w.cell.clone(), term_to_message(&w.value)));

    let span = tracing::info_span!("resolve_query", goal = ?goal);
    let _enter = span.enter();

    nessions.par_iter().find_map_any(|n| {
        if let Some((cell, value)) = &when {
            if !n.cell_holds(cell, value) {
                return None;
            }
        }
        let mut clauses = stateless_clauses.to_vec();
        clauses.extend(n.collect_horn_clauses());
        let clauses = filter_implied_rules(&clauses);
        let engine = QueryEngine::new(&clauses, limits, cancel);
        match engine.resolve(&goal) {
            QueryNode::Proven(attack) => Some(attack),
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::horn::ANY_TIME;

    fn fact(result: Message) -> HornClause {
        HornClause::new(Default::default(), result, Guard::empty(), ANY_TIME)
    }

    fn rule(premises: &[Message], result: Message) -> HornClause {
        HornClause::new(premises.iter().cloned().collect(), result, Guard::empty(), ANY_TIME)
    }

    #[test]
    fn resolves_a_goal_reachable_in_one_step() {
        let clauses = vec![fact(Message::name("a")), rule(&[Message::name("a")], Message::name("secret"))];
        let limits = EngineLimits::default();
        let cancel = CancelToken::new();
        let engine = QueryEngine::new(&clauses, &limits, &cancel);
        assert!(engine.resolve(&Message::name("secret")).is_proven());
    }

    #[test]
    fn reports_failed_when_no_clause_proves_goal() {
        let clauses = vec![fact(Message::name("a"))];
        let limits = EngineLimits::default();
        let cancel = CancelToken::new();
        let engine = QueryEngine::new(&clauses, &limits, &cancel);
        assert!(matches!(engine.resolve(&Message::name("secret")), QueryNode::Failed));
    }

    #[test]
    fn does_not_loop_forever_on_a_self_referential_clause_set() {
        let clauses = vec![rule(&[Message::name("b")], Message::name("a")), rule(&[Message::name("a")], Message::name("b"))];
        let limits = EngineLimits::default();
        let cancel = CancelToken::new();
        let engine = QueryEngine::new(&clauses, &limits, &cancel);
        assert!(matches!(engine.resolve(&Message::name("a")), QueryNode::Failed));
    }

    #[test]
    fn false_attack_avoidance_query_is_not_derivable() {
        // out(d, s) requires Know(d); the only other clause is Know(c), so
        // Know(d) (and hence Know(s)) is never reachable.
        let know_c = fact(Message::name("c"));
        let leak_s = rule(&[Message::name("d")], Message::name("s"));
        let replay = rule(&[Message::name("d"), Message::name("v"), Message::name("c")], Message::name("d"));
        let clauses = vec![know_c, leak_s, replay];
        let limits = EngineLimits::default();
        let cancel = CancelToken::new();
        let engine = QueryEngine::new(&clauses, &limits, &cancel);
        assert!(matches!(engine.resolve(&Message::name("s")), QueryNode::Failed));
    }

    #[test]
    fn budget_exhaustion_on_one_option_does_not_block_a_cheaper_alternative() {
        // secret <- deadend0 (tried first, and deadend0's own chain runs
        // the budget out before it can ever terminate) or secret <- cheap
        // (tried second). `cheap` is also a premise of deadend0, so it gets
        // proven and cached before the chain beneath it exhausts the
        // budget — the second option must still be able to reuse it.
        let clauses = vec![
            rule(&[Message::name("deadend0")], Message::name("secret")),
            rule(&[Message::name("cheap")], Message::name("secret")),
            rule(&[Message::name("cheap"), Message::name("deadend1")], Message::name("deadend0")),
            fact(Message::name("cheap")),
            rule(&[Message::name("deadend2")], Message::name("deadend1")),
            rule(&[Message::name("deadend3")], Message::name("deadend2")),
            rule(&[Message::name("deadend4")], Message::name("deadend3")),
            rule(&[Message::name("deadend5")], Message::name("deadend4")),
        ];
        let limits = EngineLimits { maximum_terms: 4, elaboration_limit: EngineLimits::default().elaboration_limit };
        let cancel = CancelToken::new();
        let engine = QueryEngine::new(&clauses, &limits, &cancel);
        assert!(engine.resolve(&Message::name("secret")).is_proven());
    }

    #[test]
    fn final_assess_promotes_a_goal_settled_only_by_cached_premises() {
        let matrix = QueryNodeMatrix::new();
        matrix.set(&Message::name("a"), &Guard::empty(), QueryNode::Proven(leaf_attack(Message::name("a"))));
        let clauses = vec![rule(&[Message::name("a")], Message::name("secret"))];
        let limits = EngineLimits::default();
        let cancel = CancelToken::new();
        let engine = QueryEngine::new(&clauses, &limits, &cancel);
        let mut instance_counter = 0u64;
        let settled = engine.final_assess(&Message::name("secret"), &Guard::empty(), &matrix, &mut instance_counter);
        assert!(settled.is_proven());
    }

    fn leaf_attack(result: Message) -> Attack {
        Attack { query: result.clone(), actual: result.clone(), clause: fact(result), sub_attacks: BTreeMap::new(), when: None }
    }
}
