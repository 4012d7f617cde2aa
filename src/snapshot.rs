//! # Snapshots
//!
//! A [`Snapshot`] is a single state and a (possibly empty) chain of *prior*
//! links, encoding the premise "cell X went through these values in this
//! order prior to the current frame". A [`SnapshotTree`] aggregates the
//! snapshots appearing in one rule.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::message::SigmaMap;
use crate::state::State;

/// How strictly a prior value must be matched while walking a nession's
/// history backward from the current cell value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PriorTag {
    /// No skipping: the very next distinct predecessor value must unify.
    ModifiedOnceAfter,
    /// Skipping permitted: values that don't unify may be passed over.
    ModifiedAnyTimesAfter,
}

/// `current` is the state the rule expects the cell to hold *now*; `chain`
/// lists, oldest-referenced-last-applied, the sequence of prior values
/// `(tag, state)` the cell must have passed through before that, walked in
/// the order given (index 0 is the value immediately prior to `current`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub current: State,
    pub chain: Vec<(PriorTag, State)>,
}

impl Snapshot {
    pub fn new(current: State) -> Self {
        Snapshot {
            current,
            chain: Vec::new(),
        }
    }

    pub fn with_prior(mut self, tag: PriorTag, state: State) -> Self {
        self.chain.push((tag, state));
        self
    }

    pub fn cell(&self) -> &str {
        &self.current.cell
    }

    pub fn substitute(&self, sigma: &SigmaMap) -> Snapshot {
        Snapshot {
            current: self.current.substitute(sigma),
            chain: self
                .chain
                .iter()
                .map(|(tag, s)| (*tag, s.substitute(sigma)))
                .collect(),
        }
    }
}

/// The snapshots referenced by one rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotTree {
    snapshots: Vec<Snapshot>,
}

impl SnapshotTree {
    pub fn empty() -> Self {
        SnapshotTree::default()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn push(&mut self, snapshot: Snapshot) {
        self.snapshots.push(snapshot);
    }

    pub fn single(snapshot: Snapshot) -> Self {
        let mut t = SnapshotTree::empty();
        t.push(snapshot);
        t
    }

    /// The snapshot traces carried by this rule.
    pub fn traces(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn cells(&self) -> BTreeSet<String> {
        self.snapshots.iter().map(|s| s.cell().to_string()).collect()
    }

    pub fn substitute(&self, sigma: &SigmaMap) -> SnapshotTree {
        SnapshotTree {
            snapshots: self.snapshots.iter().map(|s| s.substitute(sigma)).collect(),
        }
    }
}
