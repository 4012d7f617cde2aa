//! A single point in a nession's history: the value of every tracked cell
//! at that point, plus the stateless-looking SCRs that have been shown
//! applicable without changing any cell.

use crate::guard::Guard;
use crate::rule::{StateConsistentRule, StateTransferringRule};
use crate::state::State;

/// A cell's current value, with the STR that produced it (absent for the
/// initial frame, where cells hold their declared starting values).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateCell {
    pub state: State,
    pub producer: Option<StateTransferringRule>,
}

impl StateCell {
    pub fn new(state: State) -> Self {
        StateCell { state, producer: None }
    }

    pub fn with_producer(state: State, producer: StateTransferringRule) -> Self {
        StateCell { state, producer: Some(producer) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Sorted by cell name, so frames of the same shape compare and hash
    /// consistently.
    pub cells: Vec<StateCell>,
    pub scrs: Vec<StateConsistentRule>,
    pub guard: Guard,
}

impl Frame {
    pub fn new(mut cells: Vec<StateCell>) -> Self {
        cells.sort_by(|a, b| a.state.cell.cmp(&b.state.cell));
        Frame { cells, scrs: Vec::new(), guard: Guard::empty() }
    }

    pub fn cell(&self, name: &str) -> Option<&StateCell> {
        self.cells.iter().find(|c| c.state.cell == name)
    }

    pub fn has_scr_tagged(&self, id_tag: u64) -> bool {
        self.scrs.iter().any(|r| r.id_tag == id_tag)
    }
}
