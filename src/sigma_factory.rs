//! # Sigma Factory
//!
//! [`SigmaFactory`] records *bidirectional* tentative substitutions made
//! during unification: a forward map (bindings on "this" side) and a
//! backward map (bindings on "other" side), kept consistent so that
//! composing them would unify the two original terms.

use crate::guard::Guard;
use crate::message::{Message, SigmaMap};

#[derive(Debug, Clone, Default)]
pub struct SigmaFactory {
    forward: SigmaMap,
    backward: SigmaMap,
}

impl SigmaFactory {
    pub fn new() -> Self {
        SigmaFactory::default()
    }

    pub fn forward_binding(&self, var: &str) -> Option<&Message> {
        self.forward.get(var)
    }

    pub fn backward_binding(&self, var: &str) -> Option<&Message> {
        self.backward.get(var)
    }

    /// Records `var -> value` on the forward side. Fails if `var` is
    /// already bound to a different value.
    pub fn bind_forward(&mut self, var: &str, value: Message) -> bool {
        self.forward.insert(var.to_string(), value)
    }

    /// Records `var -> value` on the backward side. Fails if `var` is
    /// already bound to a different value.
    pub fn bind_backward(&mut self, var: &str, value: Message) -> bool {
        self.backward.insert(var.to_string(), value)
    }

    pub fn create_forward_map(&self) -> SigmaMap {
        self.forward.clone()
    }

    pub fn create_backward_map(&self) -> SigmaMap {
        self.backward.clone()
    }

    /// Applies the forward map to `m`, then an additional `extra` map on
    /// top (used when a caller wants to compose a pending substitution
    /// without mutating the factory).
    pub fn forward_substitute(&self, m: &Message, extra: &SigmaMap) -> Message {
        m.substitute(&self.forward).substitute(extra)
    }

    pub fn backward_substitute(&self, m: &Message, extra: &SigmaMap) -> Message {
        m.substitute(&self.backward).substitute(extra)
    }

    /// `true` iff no binding in the forward map violates `guard`.
    pub fn forward_is_valid_by_guard(&self, guard: &Guard) -> bool {
        self.forward
            .iter()
            .all(|(var, value)| !guard.forbids(var, value))
    }

    /// `true` iff no binding in the backward map violates `guard`.
    pub fn backward_is_valid_by_guard(&self, guard: &Guard) -> bool {
        self.backward
            .iter()
            .all(|(var, value)| !guard.forbids(var, value))
    }

    /// `true` when no variable was bound backward — the knit pattern uses
    /// this to know a rule applies without rewriting nession history:
    /// applying a rule with only a forward substitution mutates the
    /// current frame in place, while any non-empty backward map forces a
    /// branching clone of the nession.
    pub fn not_backward(&self) -> bool {
        self.backward.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty() && self.backward.is_empty()
    }
}
