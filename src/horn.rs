//! # Horn clauses
//!
//! A [`HornClause`] is `premises -> result` under a [`Guard`], carrying a
//! `rank` (the earliest frame index at which it can fire; `-1` means "any
//! time"). The query engine never consults a nession directly — every
//! nession is first reduced to a flat set of Horn clauses
//! ([`crate::nession::Nession::collect_horn_clauses`]), and all backward
//! search happens over that set via [`HornClause::compose_upon`] and
//! [`HornClause::can_result_in`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::event::EventTag;
use crate::guard::Guard;
use crate::message::{Message, SigmaMap};
use crate::rule::StateConsistentRule;
use crate::sigma_factory::SigmaFactory;

/// Rank value meaning "holds at any time, with no frame dependency".
pub const ANY_TIME: i64 = -1;

/// Where a clause came from, kept for [`crate::describe`] and for debugging;
/// never consulted by equality or by the solver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    Composition,
    Substitution,
    Detuple,
    Scrub,
    Pairing,
    FromNession { frame_rank: i64, rule_description: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HornClause {
    pub premises: BTreeSet<Message>,
    pub result: Message,
    pub guard: Guard,
    pub rank: i64,
    pub source: Option<Source>,
}

impl PartialEq for HornClause {
    fn eq(&self, other: &Self) -> bool {
        self.premises == other.premises
            && self.result == other.result
            && self.guard == other.guard
            && self.rank == other.rank
    }
}

impl Eq for HornClause {}

/// `RatchetRank`: combines two ranks, treating `-1` as the neutral element
/// (a clause with no frame dependency imposes no additional constraint).
pub fn ratchet_rank(a: i64, b: i64) -> i64 {
    match (a, b) {
        (ANY_TIME, x) | (x, ANY_TIME) => x,
        (x, y) => x.min(y),
    }
}

impl HornClause {
    pub fn new(premises: BTreeSet<Message>, result: Message, guard: Guard, rank: i64) -> Self {
        HornClause { premises, result, guard, rank, source: None }
    }

    pub fn with_source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }

    /// `BeforeRank`: `true` iff this clause's rank does not come strictly
    /// after `r` (an "any time" rank on either side always satisfies this).
    pub fn before_rank(&self, r: i64) -> bool {
        self.rank == ANY_TIME || r == ANY_TIME || self.rank <= r
    }

    pub fn substitute(&self, sigma: &SigmaMap) -> HornClause {
        HornClause {
            premises: self.premises.iter().map(|p| p.substitute(sigma)).collect(),
            result: self.result.substitute(sigma),
            guard: self.guard.substitute(sigma),
            rank: self.rank,
            source: Some(Source::Substitution),
        }
    }

    /// Renames every variable in this clause to `v@tag`, so that two live
    /// instantiations of the same clause never share a binding.
    pub fn subscript(&self, tag: &str) -> HornClause {
        let mut vars = BTreeSet::new();
        for p in &self.premises {
            vars.extend(p.variables());
        }
        vars.extend(self.result.variables());
        let mut sigma = SigmaMap::empty();
        for v in vars {
            sigma.insert(v.clone(), Message::var(format!("{v}@{tag}")));
        }
        self.substitute(&sigma)
    }

    /// Tries to discharge one non-variable premise of `self` using
    /// `other`'s result, inserting `other`'s premises in its place. Returns
    /// `None` if no premise unifies, if the two clauses are the same clause
    /// (guards against a clause iterating against itself without bound),
    /// or if the composed result would appear among its own premises
    /// (self-premising, which can never be satisfied).
    pub fn compose_upon(&self, other: &HornClause) -> Option<HornClause> {
        if self == other || self.premises.is_empty() {
            return None;
        }
        for premise in &self.premises {
            if premise.is_variable() {
                continue;
            }
            let mut sf = SigmaFactory::new();
            if !premise.determine_unifiable_substitution(&other.result, &self.guard, &other.guard, &mut sf) {
                continue;
            }
            let fwd = sf.create_forward_map();
            let bwd = sf.create_backward_map();

            let mut new_premises: BTreeSet<Message> = self
                .premises
                .iter()
                .filter(|p| *p != premise)
                .map(|p| p.substitute(&fwd))
                .collect();
            for p in &other.premises {
                new_premises.insert(p.substitute(&bwd));
            }

            let new_result = self.result.substitute(&fwd);
            if new_premises.contains(&new_result) {
                continue;
            }

            let new_guard = self.guard.substitute(&fwd).union(&other.guard.substitute(&bwd));
            let rank = ratchet_rank(self.rank, other.rank);
            return Some(HornClause::new(new_premises, new_result, new_guard, rank).with_source(Source::Composition));
        }
        None
    }

    /// Drops single-variable premises that appear nowhere else in the
    /// clause — they constrain nothing and only slow down matching.
    pub fn scrub_loose_variables(&self) -> HornClause {
        let mut referenced = self.result.variables();
        for p in &self.premises {
            if !p.is_variable() {
                referenced.extend(p.variables());
            }
        }
        let premises = self
            .premises
            .iter()
            .filter(|p| match p {
                Message::Variable(v) => referenced.contains(v),
                _ => true,
            })
            .cloned()
            .collect();
        HornClause {
            premises,
            result: self.result.clone(),
            guard: self.guard.clone(),
            rank: self.rank,
            source: Some(Source::Scrub),
        }
    }

    /// Splits a clause whose result is a tuple into one clause per member,
    /// recursively, since the attacker can only ever ask for a component
    /// of a tuple once it knows the tuple itself.
    pub fn detuple_result(&self) -> Vec<HornClause> {
        match &self.result {
            Message::Tuple(members) => members
                .iter()
                .flat_map(|m| {
                    HornClause {
                        premises: self.premises.clone(),
                        result: m.clone(),
                        guard: self.guard.clone(),
                        rank: self.rank,
                        source: Some(Source::Detuple),
                    }
                    .detuple_result()
                })
                .collect(),
            _ => vec![self.clone()],
        }
    }

    /// `true` iff every derivation `other` can produce, `self` can also
    /// produce — used to drop redundant clauses from a composed set.
    pub fn implies(&self, other: &HornClause) -> bool {
        if self.premises.len() > other.premises.len() {
            return false;
        }
        if !self.before_rank(other.rank) {
            return false;
        }
        let mut sf = SigmaFactory::new();
        if !self.result.determine_unified_to_substitution(&other.result, &self.guard, &mut sf) {
            return false;
        }
        let fwd = sf.create_forward_map();
        let self_premises: Vec<Message> = self.premises.iter().map(|p| p.substitute(&fwd)).collect();
        let other_premises: Vec<&Message> = other.premises.iter().collect();

        let mut oi = 0;
        for sp in &self_premises {
            while oi < other_premises.len() && sp != other_premises[oi] {
                oi += 1;
            }
            if oi >= other_premises.len() {
                return false;
            }
            oi += 1;
        }
        sf.forward_is_valid_by_guard(&self.guard)
    }

    /// Attempts to derive `m` from this clause under `g`. The clause's own
    /// variables are first subscripted to a fresh instance tag so that
    /// repeated uses of the same clause in one derivation tree never
    /// collide. Returns the substitution needed on success.
    pub fn can_result_in(&self, m: &Message, g: &Guard, instance_tag: &str) -> Option<SigmaFactory> {
        let instance = self.subscript(instance_tag);
        let combined_guard = instance.guard.union(g);
        let mut sf = SigmaFactory::new();
        if instance.result.determine_unified_to_substitution(m, &combined_guard, &mut sf) {
            Some(sf)
        } else {
            None
        }
    }
}

/// The inverse of [`HornClause::detuple_result`]: knowing every member of a
/// tuple is enough to know the tuple, so any tuple-shaped goal can always be
/// split into one premise per member. Synthesized fresh per query rather
/// than carried in the clause set, since it applies uniformly to any tuple.
pub fn tuple_pairing_clause(members: &[Message]) -> HornClause {
    HornClause {
        premises: members.iter().cloned().collect(),
        result: Message::Tuple(members.to_vec()),
        guard: Guard::empty(),
        rank: ANY_TIME,
        source: Some(Source::Pairing),
    }
}

/// Removes clauses implied by some other clause in the set, keeping the set
/// to its minimal generating subset. Ties (mutual implication) keep the
/// earlier-indexed clause.
pub fn filter_implied_rules(clauses: &[HornClause]) -> Vec<HornClause> {
    let mut kept = Vec::new();
    'outer: for (i, c) in clauses.iter().enumerate() {
        for (j, other) in clauses.iter().enumerate() {
            if i == j {
                continue;
            }
            let mutual = other.implies(c) && c.implies(other);
            if other.implies(c) && !(mutual && i < j) {
                continue 'outer;
            }
        }
        kept.push(c.clone());
    }
    kept
}

/// Converts a stateless [`StateConsistentRule`] (one with an empty snapshot
/// tree) directly into a Horn clause: its `Know` premises become the
/// clause's premises, its result event's message becomes the clause's
/// result, and its rank is [`ANY_TIME`] since it carries no frame
/// dependency. Returns `None` for a stateful SCR — those must instead be
/// elaborated into a nession first.
pub fn from_stateless_scr(scr: &StateConsistentRule) -> Option<HornClause> {
    if !scr.snapshots.is_empty() {
        return None;
    }
    let premises = scr
        .premises
        .iter()
        .filter(|e| e.tag == EventTag::Know)
        .map(|e| e.message().clone())
        .collect();
    Some(HornClause {
        premises,
        result: scr.result.message().clone(),
        guard: scr.guard.clone(),
        rank: ANY_TIME,
        source: Some(Source::FromNession {
            frame_rank: ANY_TIME,
            rule_description: format!("scr#{}", scr.id_tag),
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use crate::snapshot::SnapshotTree;

    fn clause(premises: &[Message], result: Message) -> HornClause {
        HornClause::new(premises.iter().cloned().collect(), result, Guard::empty(), ANY_TIME)
    }

    #[test]
    fn ratchet_rank_treats_any_time_as_neutral() {
        assert_eq!(ratchet_rank(ANY_TIME, 4), 4);
        assert_eq!(ratchet_rank(3, ANY_TIME), 3);
        assert_eq!(ratchet_rank(ANY_TIME, ANY_TIME), ANY_TIME);
        assert_eq!(ratchet_rank(2, 5), 2);
    }

    #[test]
    fn compose_upon_discharges_matching_premise() {
        let consumer = clause(&[Message::function("enc", [Message::var("m"), Message::name("k")])], Message::var("m"));
        let producer = clause(&[], Message::function("enc", [Message::name("secret"), Message::name("k")]));
        let composed = consumer.compose_upon(&producer).expect("should compose");
        assert!(composed.premises.is_empty());
        assert_eq!(composed.result, Message::name("secret"));
    }

    #[test]
    fn compose_upon_rejects_self_premising_result() {
        let c = clause(&[Message::function("f", [Message::var("x")])], Message::var("x"));
        let producer = clause(&[Message::var("x")], Message::function("f", [Message::var("x")]));
        assert!(c.compose_upon(&producer).is_none());
    }

    #[test]
    fn compose_upon_refuses_to_compose_clause_with_itself() {
        let c = clause(&[Message::name("a")], Message::name("b"));
        assert!(c.compose_upon(&c).is_none());
    }

    #[test]
    fn scrub_drops_unreferenced_variable_premise() {
        let c = clause(&[Message::var("unused"), Message::name("known")], Message::name("known"));
        let scrubbed = c.scrub_loose_variables();
        assert_eq!(scrubbed.premises.len(), 1);
        assert!(scrubbed.premises.contains(&Message::name("known")));
    }

    #[test]
    fn scrub_keeps_variable_referenced_in_result() {
        let c = clause(&[Message::var("x")], Message::var("x"));
        assert_eq!(c.scrub_loose_variables().premises.len(), 1);
    }

    #[test]
    fn detuple_splits_tuple_result_into_one_clause_per_member() {
        let c = clause(&[], Message::tuple([Message::name("a"), Message::name("b")]));
        let split = c.detuple_result();
        assert_eq!(split.len(), 2);
        assert!(split.iter().any(|x| x.result == Message::name("a")));
        assert!(split.iter().any(|x| x.result == Message::name("b")));
    }

    #[test]
    fn tuple_pairing_clause_requires_knowledge_of_every_member() {
        let pairing = tuple_pairing_clause(&[Message::name("a"), Message::name("b")]);
        assert_eq!(pairing.premises.len(), 2);
        assert!(pairing.premises.contains(&Message::name("a")));
        assert_eq!(pairing.result, Message::tuple([Message::name("a"), Message::name("b")]));
    }

    #[test]
    fn detuple_is_identity_on_non_tuple_result() {
        let c = clause(&[], Message::name("a"));
        assert_eq!(c.detuple_result(), vec![c]);
    }

    #[test]
    fn implies_holds_for_identical_clause() {
        let c = clause(&[Message::name("p")], Message::name("r"));
        assert!(c.implies(&c));
    }

    #[test]
    fn implies_fails_when_fewer_premises_available() {
        let general = clause(&[Message::name("a"), Message::name("b")], Message::name("r"));
        let specific = clause(&[Message::name("a")], Message::name("r"));
        assert!(!general.implies(&specific));
    }

    #[test]
    fn filter_implied_rules_drops_strictly_weaker_clause() {
        let strong = clause(&[], Message::name("r"));
        let weak = clause(&[Message::name("needs_more")], Message::name("r"));
        let kept = filter_implied_rules(&[strong.clone(), weak]);
        assert_eq!(kept, vec![strong]);
    }

    #[test]
    fn can_result_in_renames_clause_variables_per_instance() {
        let c = clause(&[], Message::function("pair", [Message::var("x"), Message::var("x")]));
        let target = Message::function("pair", [Message::name("a"), Message::name("a")]);
        let sf = c.can_result_in(&target, &Guard::empty(), "1").expect("should derive");
        assert_eq!(sf.forward_binding("x@1"), Some(&Message::name("a")));
    }

    #[test]
    fn from_stateless_scr_uses_know_premises_and_any_time_rank() {
        let scr = StateConsistentRule {
            premises: vec![Event::know(Message::var("x")), Event::new_nonce(Message::nonce("n"))],
            result: Event::know(Message::function("f", [Message::var("x")])),
            guard: Guard::empty(),
            snapshots: SnapshotTree::empty(),
            id_tag: 7,
        };
        let hc = from_stateless_scr(&scr).expect("stateless scr converts");
        assert_eq!(hc.rank, ANY_TIME);
        assert_eq!(hc.premises.len(), 1);
        assert!(hc.premises.contains(&Message::var("x")));
    }

    #[test]
    fn from_stateless_scr_rejects_stateful_rule() {
        use crate::snapshot::Snapshot;
        use crate::state::State;
        let scr = StateConsistentRule {
            premises: vec![],
            result: Event::know(Message::name("r")),
            guard: Guard::empty(),
            snapshots: SnapshotTree::single(Snapshot::new(State::new("mem", Message::name("v")))),
            id_tag: 1,
        };
        assert!(from_stateless_scr(&scr).is_none());
    }
}
