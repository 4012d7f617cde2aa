//! # State
//!
//! A named cell condition carrying one message value.

use serde::{Deserialize, Serialize};

use crate::guard::Guard;
use crate::message::{Message, SigmaMap};
use crate::sigma_factory::SigmaFactory;

/// A cell named `cell` currently holding `value`.
///
/// Ordered by `cell` first (then by `value`) so cells of the same name
/// across nession frames compare consistently, matching the "cells are
/// ordered alphabetically by cell name" invariant on [`crate::nession::Frame`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct State {
    pub cell: String,
    pub value: Message,
}

impl State {
    pub fn new(cell: impl Into<String>, value: Message) -> Self {
        State {
            cell: cell.into(),
            value,
        }
    }

    pub fn substitute(&self, sigma: &SigmaMap) -> State {
        State {
            cell: self.cell.clone(),
            value: self.value.substitute(sigma),
        }
    }

    /// Tentatively records bindings into `sf` reconciling this state's
    /// value with `other`'s — the two only unify if they name the same
    /// cell.
    pub fn can_be_unifiable_with(
        &self,
        other: &State,
        g_self: &Guard,
        g_other: &Guard,
        sf: &mut SigmaFactory,
    ) -> bool {
        self.cell == other.cell
            && self
                .value
                .determine_unifiable_substitution(&other.value, g_self, g_other, sf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unifiable_requires_same_cell_name() {
        let a = State::new("mem", Message::name("x"));
        let b = State::new("other", Message::name("x"));
        let mut sf = SigmaFactory::new();
        assert!(!a.can_be_unifiable_with(&b, &Guard::empty(), &Guard::empty(), &mut sf));
    }

    #[test]
    fn unifiable_same_cell_reconciles_values() {
        let a = State::new("mem", Message::var("x"));
        let b = State::new("mem", Message::name("v"));
        let mut sf = SigmaFactory::new();
        assert!(a.can_be_unifiable_with(&b, &Guard::empty(), &Guard::empty(), &mut sf));
        assert_eq!(sf.forward_binding("x"), Some(&Message::name("v")));
    }

    #[test]
    fn ordering_is_by_cell_name_first() {
        let a = State::new("a", Message::name("z"));
        let b = State::new("b", Message::name("a"));
        assert!(a < b);
    }
}
