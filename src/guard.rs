//! # Guards
//!
//! A [`Guard`] is a set of prohibited bindings: a map from a variable name
//! to the set of messages it must *not* unify to. Every unification
//! attempt consults it; an otherwise-valid unifier is rejected if it
//! reconciles a banned pair.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::message::{Message, SigmaMap};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Guard {
    banned: BTreeMap<String, BTreeSet<Message>>,
}

impl Guard {
    pub fn empty() -> Self {
        Guard::default()
    }

    pub fn is_empty(&self) -> bool {
        self.banned.values().all(BTreeSet::is_empty)
    }

    /// A guard forbidding `var` from ever unifying to `value`.
    pub fn forbidding(var: impl Into<String>, value: Message) -> Self {
        let mut g = Guard::empty();
        g.ban(var, value);
        g
    }

    pub fn ban(&mut self, var: impl Into<String>, value: Message) {
        self.banned.entry(var.into()).or_default().insert(value);
    }

    /// `true` iff `value` is in `var`'s banned set.
    pub fn forbids(&self, var: &str, value: &Message) -> bool {
        self.banned
            .get(var)
            .map(|banned| banned.contains(value))
            .unwrap_or(false)
    }

    pub fn union(&self, other: &Guard) -> Guard {
        let mut merged = self.clone();
        for (var, banned) in &other.banned {
            merged.banned.entry(var.clone()).or_default().extend(banned.iter().cloned());
        }
        merged
    }

    /// Applies `sigma` to every key and every banned value; a key that
    /// substitutes to something other than a bare variable is dropped (a
    /// guard only meaningfully constrains a variable).
    pub fn substitute(&self, sigma: &SigmaMap) -> Guard {
        let mut out = Guard::empty();
        for (var, banned) in &self.banned {
            let new_key = match sigma.get(var) {
                Some(Message::Variable(renamed)) => renamed.clone(),
                Some(_) => continue,
                None => var.clone(),
            };
            for value in banned {
                out.ban(new_key.clone(), value.substitute(sigma));
            }
        }
        out
    }

    /// Keeps only the constraints whose variable is in `vars`.
    pub fn filter(&self, vars: &BTreeSet<String>) -> Guard {
        Guard {
            banned: self
                .banned
                .iter()
                .filter(|(var, _)| vars.contains(*var))
                .map(|(var, banned)| (var.clone(), banned.clone()))
                .collect(),
        }
    }

    pub fn equals(&self, other: &Guard) -> bool {
        self.banned == other.banned
    }
}
