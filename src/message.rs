//! # Message Algebra
//!
//! [`Message`] is the term algebra every other core type is built from: a
//! tagged sum of five variants, dispatched and recursed on structurally for
//! equality, hashing, substitution, variable collection, and depth — per
//! DESIGN NOTES, no dynamic dispatch, one enum.
//!
//! Unification lives here too (`is_unifiable_with`,
//! `determine_unifiable_substitution`, `determine_unified_to_substitution`)
//! because it is defined by structural recursion over the same match arms.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::guard::Guard;
use crate::sigma_factory::SigmaFactory;

/// An algebraic term.
///
/// Equality, ordering, and hashing are derived structurally: two terms are
/// equal iff they agree in variant, name (if any), and recursively in
/// children.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Message {
    /// A placeholder, unifiable with any term subject to a [`Guard`].
    Variable(String),
    /// A public or known constant/atom.
    Name(String),
    /// A freshly generated secret atom.
    Nonce(String),
    /// Constructor application; arity is fixed by `args.len()`.
    Function(String, Vec<Message>),
    /// An ordered product of two or more members.
    Tuple(Vec<Message>),
}

impl Message {
    pub fn var(name: impl Into<String>) -> Self {
        Message::Variable(name.into())
    }

    pub fn name(name: impl Into<String>) -> Self {
        Message::Name(name.into())
    }

    pub fn nonce(name: impl Into<String>) -> Self {
        Message::Nonce(name.into())
    }

    pub fn function(name: impl Into<String>, args: impl IntoIterator<Item = Message>) -> Self {
        Message::Function(name.into(), args.into_iter().collect())
    }

    pub fn tuple(members: impl IntoIterator<Item = Message>) -> Self {
        Message::Tuple(members.into_iter().collect())
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Message::Variable(_))
    }

    pub fn is_tuple(&self) -> bool {
        matches!(self, Message::Tuple(_))
    }

    /// The union of this term's variable-leaf names.
    pub fn variables(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut BTreeSet<String>) {
        match self {
            Message::Variable(v) => {
                out.insert(v.clone());
            }
            Message::Name(_) | Message::Nonce(_) => {}
            Message::Function(_, args) => args.iter().for_each(|a| a.collect_variables(out)),
            Message::Tuple(members) => members.iter().for_each(|m| m.collect_variables(out)),
        }
    }

    /// The finite maximum nesting depth of this term (a leaf has depth 1).
    pub fn depth(&self) -> usize {
        match self {
            Message::Variable(_) | Message::Name(_) | Message::Nonce(_) => 1,
            Message::Function(_, args) => {
                1 + args.iter().map(Message::depth).max().unwrap_or(0)
            }
            Message::Tuple(members) => {
                1 + members.iter().map(Message::depth).max().unwrap_or(0)
            }
        }
    }

    /// Capture-free, simultaneous replacement: variable leaves that are keys
    /// of `sigma` are replaced; the term is returned unchanged if no key
    /// occurs in it.
    pub fn substitute(&self, sigma: &SigmaMap) -> Message {
        match self {
            Message::Variable(v) => sigma.get(v).cloned().unwrap_or_else(|| self.clone()),
            Message::Name(_) | Message::Nonce(_) => self.clone(),
            Message::Function(f, args) => {
                Message::Function(f.clone(), args.iter().map(|a| a.substitute(sigma)).collect())
            }
            Message::Tuple(members) => {
                Message::Tuple(members.iter().map(|m| m.substitute(sigma)).collect())
            }
        }
    }

    /// Bidirectional unification: `self`/`other` may each bind variables on
    /// their own side into `sf`, subject to `g_self`/`g_other`.
    pub fn is_unifiable_with(&self, other: &Message) -> bool {
        let mut sf = SigmaFactory::new();
        self.determine_unifiable_substitution(other, &Guard::empty(), &Guard::empty(), &mut sf)
    }

    pub fn determine_unifiable_substitution(
        &self,
        other: &Message,
        g_self: &Guard,
        g_other: &Guard,
        sf: &mut SigmaFactory,
    ) -> bool {
        if !unify_rec(self, other, g_self, g_other, sf, true) {
            return false;
        }
        sf.forward_is_valid_by_guard(g_self) && sf.backward_is_valid_by_guard(g_other)
    }

    /// One-sided unification: only `self`'s variables may bind; `other` is
    /// a fixed target shape. Used by implication checks.
    pub fn determine_unified_to_substitution(
        &self,
        other: &Message,
        g_self: &Guard,
        sf: &mut SigmaFactory,
    ) -> bool {
        if !unify_rec(self, other, g_self, &Guard::empty(), sf, false) {
            return false;
        }
        sf.forward_is_valid_by_guard(g_self)
    }
}

/// Structural recursion implementing both unification modes.
///
/// `bidirectional = false` forbids binding a variable that occurs on the
/// `other` side — `other` is a fixed shape `self` must be unified *into*.
fn unify_rec(
    this: &Message,
    other: &Message,
    g_this: &Guard,
    g_other: &Guard,
    sf: &mut SigmaFactory,
    bidirectional: bool,
) -> bool {
    if let Message::Variable(v) = this {
        return bind_forward(v, other, g_this, sf, g_other, bidirectional);
    }
    if let Message::Variable(v) = other {
        if !bidirectional {
            return false;
        }
        return bind_backward(v, this, g_other, sf, g_this);
    }
    match (this, other) {
        (Message::Name(a), Message::Name(b)) => a == b,
        (Message::Nonce(a), Message::Nonce(b)) => a == b,
        (Message::Function(f, xs), Message::Function(g, ys)) => {
            f == g
                && xs.len() == ys.len()
                && xs
                    .iter()
                    .zip(ys.iter())
                    .all(|(x, y)| unify_rec(x, y, g_this, g_other, sf, bidirectional))
        }
        (Message::Tuple(xs), Message::Tuple(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .zip(ys.iter())
                    .all(|(x, y)| unify_rec(x, y, g_this, g_other, sf, bidirectional))
        }
        _ => false,
    }
}

fn bind_forward(
    var: &str,
    value: &Message,
    g_var_side: &Guard,
    sf: &mut SigmaFactory,
    g_value_side: &Guard,
    bidirectional: bool,
) -> bool {
    if let Some(existing) = sf.forward_binding(var).cloned() {
        return unify_rec(&existing, value, g_var_side, g_value_side, sf, bidirectional);
    }
    if g_var_side.forbids(var, value) {
        return false;
    }
    sf.bind_forward(var, value.clone())
}

fn bind_backward(
    var: &str,
    value: &Message,
    g_var_side: &Guard,
    sf: &mut SigmaFactory,
    g_value_side: &Guard,
) -> bool {
    if let Some(existing) = sf.backward_binding(var).cloned() {
        return unify_rec(&existing, value, g_var_side, g_value_side, sf, true);
    }
    if g_var_side.forbids(var, value) {
        return false;
    }
    sf.bind_backward(var, value.clone())
}

/// A substitution `Variable -> Message` with unique keys, applied by
/// simultaneous capture-free replacement. The empty map is the identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigmaMap {
    bindings: std::collections::BTreeMap<String, Message>,
}

impl SigmaMap {
    pub fn empty() -> Self {
        SigmaMap::default()
    }

    pub fn singleton(var: impl Into<String>, value: Message) -> Self {
        let mut m = SigmaMap::empty();
        m.insert(var, value);
        m
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn get(&self, var: &str) -> Option<&Message> {
        self.bindings.get(var)
    }

    pub fn contains(&self, var: &str) -> bool {
        self.bindings.contains_key(var)
    }

    /// Inserts `var -> value`. Returns `false` (no-op) if `var` is already
    /// bound to a *different* value — keys are unique in a `SigmaMap`.
    pub fn insert(&mut self, var: impl Into<String>, value: Message) -> bool {
        let var = var.into();
        match self.bindings.get(&var) {
            Some(existing) if existing != &value => false,
            _ => {
                self.bindings.insert(var, value);
                true
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Message)> {
        self.bindings.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.bindings.keys()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// The free variables appearing in the range of this map — the
    /// "inserted variables" used to state the substitution law in §8.
    pub fn inserted_variables(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        for value in self.bindings.values() {
            out.extend(value.variables());
        }
        out
    }

    /// Merges `other` into a fresh copy of `self`; `other`'s bindings take
    /// precedence on key collision.
    pub fn extended_with(&self, other: &SigmaMap) -> SigmaMap {
        let mut merged = self.clone();
        for (k, v) in other.iter() {
            merged.bindings.insert(k.clone(), v.clone());
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(n: &str) -> Message {
        Message::var(n)
    }

    #[test]
    fn substitute_identity_on_empty_sigma() {
        let m = Message::function("enc", [var("x"), Message::name("k")]);
        assert_eq!(m.substitute(&SigmaMap::empty()), m);
    }

    #[test]
    fn substitute_replaces_free_variables_only() {
        let m = Message::tuple([var("x"), var("y")]);
        let sigma = SigmaMap::singleton("x", Message::nonce("n"));
        let result = m.substitute(&sigma);
        assert_eq!(result, Message::tuple([Message::nonce("n"), var("y")]));

        let expected_vars: BTreeSet<String> =
            (m.variables().difference(&["x".to_string()].into_iter().collect()))
                .cloned()
                .collect();
        assert_eq!(result.variables(), expected_vars);
    }

    #[test]
    fn structural_equality_over_function_args() {
        let a = Message::function("enc", [Message::name("m"), Message::name("k")]);
        let b = Message::function("enc", [Message::name("m"), Message::name("k")]);
        let c = Message::function("enc", [Message::name("m"), Message::name("k2")]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn unify_names_require_exact_match() {
        assert!(Message::name("a").is_unifiable_with(&Message::name("a")));
        assert!(!Message::name("a").is_unifiable_with(&Message::name("b")));
    }

    #[test]
    fn unify_function_requires_same_functor_and_arity() {
        let a = Message::function("enc", [Message::name("m"), Message::name("k")]);
        let b = Message::function("enc", [var("x"), var("y")]);
        let c = Message::function("dec", [var("x"), var("y")]);
        assert!(a.is_unifiable_with(&b));
        assert!(!a.is_unifiable_with(&c));
    }

    #[test]
    fn unify_variable_binds_either_side() {
        let mut sf = SigmaFactory::new();
        let a = var("x");
        let b = Message::name("n");
        assert!(a.determine_unifiable_substitution(&b, &Guard::empty(), &Guard::empty(), &mut sf));
        assert_eq!(sf.forward_binding("x"), Some(&Message::name("n")));
    }

    #[test]
    fn one_sided_unification_rejects_binding_other_side() {
        let mut sf = SigmaFactory::new();
        let this = Message::name("n");
        let other = var("y");
        assert!(!this.determine_unified_to_substitution(&other, &Guard::empty(), &mut sf));
    }

    #[test]
    fn one_sided_unification_allows_binding_this_side() {
        let mut sf = SigmaFactory::new();
        let this = var("x");
        let other = Message::name("n");
        assert!(this.determine_unified_to_substitution(&other, &Guard::empty(), &mut sf));
        assert_eq!(sf.forward_binding("x"), Some(&Message::name("n")));
    }

    #[test]
    fn tuple_unification_requires_equal_arity() {
        let a = Message::tuple([var("x"), var("y")]);
        let b = Message::tuple([Message::name("1"), Message::name("2"), Message::name("3")]);
        assert!(!a.is_unifiable_with(&b));
    }

    #[test]
    fn depth_of_leaf_is_one() {
        assert_eq!(Message::name("a").depth(), 1);
        assert_eq!(Message::function("f", [Message::name("a")]).depth(), 2);
    }
}
