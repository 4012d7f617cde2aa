//! # Knit pattern
//!
//! Precomputes which cells each [`StateTransferringRule`] writes, so the
//! elaboration loop can group simultaneously-applicable STRs into
//! cell-disjoint transfer groups instead of trying every subset — the
//! combinatorial blowup the spec's design notes call out for naive
//! multi-transfer elaboration.

use std::collections::BTreeSet;

use crate::rule::{StateTransferringRule, Transformation};

pub struct KnitPattern {
    affected_cells: Vec<BTreeSet<String>>,
}

impl KnitPattern {
    pub fn new(strs: &[StateTransferringRule]) -> Self {
        let affected_cells = strs
            .iter()
            .map(|r| r.transformations.iter().map(Transformation::cell).map(String::from).collect())
            .collect();
        KnitPattern { affected_cells }
    }

    fn compatible(&self, a: usize, b: usize) -> bool {
        self.affected_cells[a].is_disjoint(&self.affected_cells[b])
    }

    /// Greedily groups `candidates` (STR indices) into maximal cell-disjoint
    /// sets, each applicable together as a single frame transition.
    pub fn transfer_groups(&self, candidates: &[usize]) -> Vec<Vec<usize>> {
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for &idx in candidates {
            let slot = groups.iter_mut().find(|group| group.iter().all(|&g| self.compatible(g, idx)));
            match slot {
                Some(group) => group.push(idx),
                None => groups.push(vec![idx]),
            }
        }
        groups
    }
}
