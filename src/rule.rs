//! # Rules
//!
//! A rule has premises (a set of [`Event`]s), a [`Guard`], a
//! [`SnapshotTree`], and a fresh-variable subscripting mechanism. Two
//! concrete kinds exist: [`StateConsistentRule`] (SCR), which does not
//! change state and produces a single result event, and
//! [`StateTransferringRule`] (STR), which rewrites one or more cells. The
//! [`Rule`] enum is the "abstract rule" of the spec — a discriminated
//! variant rather than a trait object, per the engine's no-dynamic-dispatch
//! convention.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::event::{Event, EventTag};
use crate::guard::Guard;
use crate::message::{Message, SigmaMap};
use crate::snapshot::{Snapshot, SnapshotTree};
use crate::state::State;

/// `(afterPoint, newValue)`: one cell rewrite performed by an STR.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transformation {
    pub after_point: Snapshot,
    pub new_value: State,
}

impl Transformation {
    pub fn new(after_point: Snapshot, new_value: State) -> Self {
        Transformation { after_point, new_value }
    }

    pub fn cell(&self) -> &str {
        &self.new_value.cell
    }

    pub fn substitute(&self, sigma: &SigmaMap) -> Transformation {
        Transformation {
            after_point: self.after_point.substitute(sigma),
            new_value: self.new_value.substitute(sigma),
        }
    }
}

/// A rule that acts on a frame without changing state. `IdTag` is a stable
/// integer assigned once by the engine, used to avoid re-adding the same
/// SCR to a frame ([`Rule::matches_tag_of`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateConsistentRule {
    pub premises: Vec<Event>,
    pub result: Event,
    pub guard: Guard,
    pub snapshots: SnapshotTree,
    pub id_tag: u64,
}

/// A rule producing one or more cell rewrites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransferringRule {
    pub premises: Vec<Event>,
    pub transformations: Vec<Transformation>,
    pub guard: Guard,
    pub snapshots: SnapshotTree,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rule {
    Scr(StateConsistentRule),
    Str(StateTransferringRule),
}

impl Rule {
    pub fn premises(&self) -> &[Event] {
        match self {
            Rule::Scr(r) => &r.premises,
            Rule::Str(r) => &r.premises,
        }
    }

    pub fn guard(&self) -> &Guard {
        match self {
            Rule::Scr(r) => &r.guard,
            Rule::Str(r) => &r.guard,
        }
    }

    pub fn snapshot_tree(&self) -> &SnapshotTree {
        match self {
            Rule::Scr(r) => &r.snapshots,
            Rule::Str(r) => &r.snapshots,
        }
    }

    /// A rule is stateless iff its snapshot tree is empty.
    pub fn is_stateless(&self) -> bool {
        self.snapshot_tree().is_empty()
    }

    pub fn as_scr(&self) -> Option<&StateConsistentRule> {
        match self {
            Rule::Scr(r) => Some(r),
            Rule::Str(_) => None,
        }
    }

    pub fn as_str_rule(&self) -> Option<&StateTransferringRule> {
        match self {
            Rule::Str(r) => Some(r),
            Rule::Scr(_) => None,
        }
    }

    pub fn substitute(&self, sigma: &SigmaMap) -> Rule {
        match self {
            Rule::Scr(r) => Rule::Scr(StateConsistentRule {
                premises: r.premises.iter().map(|e| e.substitute(sigma)).collect(),
                result: r.result.substitute(sigma),
                guard: r.guard.substitute(sigma),
                snapshots: r.snapshots.substitute(sigma),
                id_tag: r.id_tag,
            }),
            Rule::Str(r) => Rule::Str(StateTransferringRule {
                premises: r.premises.iter().map(|e| e.substitute(sigma)).collect(),
                transformations: r.transformations.iter().map(|t| t.substitute(sigma)).collect(),
                guard: r.guard.substitute(sigma),
                snapshots: r.snapshots.substitute(sigma),
            }),
        }
    }

    /// Every variable occurring anywhere in this rule.
    pub fn variables(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        for event in self.premises() {
            for m in &event.messages {
                out.extend(m.variables());
            }
        }
        match self {
            Rule::Scr(r) => out.extend(r.result.message().variables()),
            Rule::Str(r) => {
                for t in &r.transformations {
                    out.extend(t.new_value.value.variables());
                    out.extend(t.after_point.current.value.variables());
                    for (_, s) in &t.after_point.chain {
                        out.extend(s.value.variables());
                    }
                }
            }
        }
        out
    }

    /// Renames every variable `v` to `v@tag`, the α-renaming used to avoid
    /// variable capture when inserting the rule into a nession.
    pub fn subscript_variables(&self, tag: &str) -> Rule {
        let mut sigma = SigmaMap::empty();
        for v in self.variables() {
            sigma.insert(v.clone(), Message::var(format!("{v}@{tag}")));
        }
        self.substitute(&sigma)
    }

    /// The `New(N)` events appearing in this rule's premises.
    pub fn nonce_declarations(&self) -> BTreeSet<Message> {
        self.premises()
            .iter()
            .filter(|e| e.tag == EventTag::New)
            .map(|e| e.message().clone())
            .collect()
    }

    /// Nonce leaves referenced anywhere in this rule but not declared by it
    /// (a multiset, represented with duplicates preserved).
    pub fn nonces_required(&self) -> Vec<Message> {
        let declared = self.nonce_declarations();
        let mut leaves = Vec::new();
        for event in self.premises() {
            for m in &event.messages {
                collect_nonces(m, &mut leaves);
            }
        }
        match self {
            Rule::Scr(r) => collect_nonces(r.result.message(), &mut leaves),
            Rule::Str(r) => {
                for t in &r.transformations {
                    collect_nonces(&t.new_value.value, &mut leaves);
                }
            }
        }
        leaves.retain(|n| !declared.contains(n));
        leaves
    }
}

impl StateConsistentRule {
    /// Compares by `IdTag`, used to avoid re-adding the same SCR to a
    /// frame.
    pub fn matches_tag_of(&self, other: &StateConsistentRule) -> bool {
        self.id_tag == other.id_tag
    }

    /// The `New(N)` events appearing in this rule's premises.
    pub fn nonce_declarations(&self) -> BTreeSet<Message> {
        self.premises.iter().filter(|e| e.tag == EventTag::New).map(|e| e.message().clone()).collect()
    }
}

fn collect_nonces(m: &Message, out: &mut Vec<Message>) {
    match m {
        Message::Nonce(_) => out.push(m.clone()),
        Message::Variable(_) | Message::Name(_) => {}
        Message::Function(_, args) => args.iter().for_each(|a| collect_nonces(a, out)),
        Message::Tuple(members) => members.iter().for_each(|mem| collect_nonces(mem, out)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple_scr(id_tag: u64) -> StateConsistentRule {
        StateConsistentRule {
            premises: vec![Event::know(Message::var("x"))],
            result: Event::know(Message::function("f", [Message::var("x")])),
            guard: Guard::empty(),
            snapshots: SnapshotTree::empty(),
            id_tag,
        }
    }

    #[test]
    fn stateless_scr_has_empty_snapshot_tree() {
        assert!(Rule::Scr(simple_scr(1)).is_stateless());
    }

    #[test]
    fn matches_tag_of_compares_id_tag_only() {
        let a = simple_scr(1);
        let b = simple_scr(1);
        let c = simple_scr(2);
        assert!(a.matches_tag_of(&b));
        assert!(!a.matches_tag_of(&c));
    }

    #[test]
    fn subscript_variables_renames_every_occurrence() {
        let r = Rule::Scr(simple_scr(1));
        let renamed = r.subscript_variables("3");
        assert!(renamed.variables().contains("x@3"));
        assert!(!renamed.variables().contains("x"));
    }

    #[test]
    fn nonce_declarations_collects_new_events() {
        let r = Rule::Scr(StateConsistentRule {
            premises: vec![Event::new_nonce(Message::nonce("n"))],
            result: Event::know(Message::nonce("n")),
            guard: Guard::empty(),
            snapshots: SnapshotTree::empty(),
            id_tag: 1,
        });
        assert!(r.nonce_declarations().contains(&Message::nonce("n")));
        assert!(r.nonces_required().is_empty());
    }

    #[test]
    fn nonces_required_excludes_declared_nonces() {
        let r = Rule::Scr(StateConsistentRule {
            premises: vec![Event::know(Message::nonce("undeclared"))],
            result: Event::know(Message::nonce("undeclared")),
            guard: Guard::empty(),
            snapshots: SnapshotTree::empty(),
            id_tag: 1,
        });
        assert_eq!(r.nonces_required(), vec![Message::nonce("undeclared")]);
    }
}
