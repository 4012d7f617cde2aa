//! # HornProof Model
//!
//! Resolved Applied Pi Calculus types consumed by the `hornproof` verification
//! engine. This crate has no opinion about syntax, parsing, or macro
//! expansion — it is the stable shape that an (out-of-scope) parser and
//! resolver would hand to the engine: a type-checked [`Network`] of
//! declarations plus a flat, macro-expanded main [`Process`].
//!
//! Nothing here knows about the engine's `Message` algebra or Horn clauses;
//! the one place allowed to bridge the two is the engine's `translate`
//! module. Keeping that dependency one-directional is what lets this crate
//! stay dependency-free.

pub mod builders;

use std::collections::HashSet;

// ============================================================================
// Terms
// ============================================================================

/// A syntax-level term: the pre-translation shape of a message.
///
/// `Var` names a binding introduced by `in`, `let`, or `get`; `Name` refers
/// to a declared free name or constant; `Apply` is a constructor or
/// destructor application; `Tuple` is an ordered product of two or more
/// terms.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Var(String),
    Name(String),
    Apply(String, Vec<Term>),
    Tuple(Vec<Term>),
}

impl Term {
    pub fn var(name: impl Into<String>) -> Self {
        Term::Var(name.into())
    }

    pub fn name(name: impl Into<String>) -> Self {
        Term::Name(name.into())
    }

    pub fn apply(f: impl Into<String>, args: impl IntoIterator<Item = Term>) -> Self {
        Term::Apply(f.into(), args.into_iter().collect())
    }

    pub fn tuple(members: impl IntoIterator<Item = Term>) -> Self {
        Term::Tuple(members.into_iter().collect())
    }

    /// Every `Var` leaf appearing in this term.
    pub fn variables(&self) -> HashSet<String> {
        let mut out = HashSet::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut HashSet<String>) {
        match self {
            Term::Var(v) => {
                out.insert(v.clone());
            }
            Term::Name(_) => {}
            Term::Apply(_, args) => args.iter().for_each(|a| a.collect_variables(out)),
            Term::Tuple(members) => members.iter().for_each(|m| m.collect_variables(out)),
        }
    }
}

/// A pattern is syntactically a [`Term`]; `Var` leaves are binding
/// occurrences rather than references. Kept as a distinct alias so call
/// sites document intent (`in(c, pattern)`, `let pattern = term`).
pub type Pattern = Term;

// ============================================================================
// Boolean comparisons (the condition of an `if`)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Comparison {
    Eq(Term, Term),
    Neq(Term, Term),
    And(Box<Comparison>, Box<Comparison>),
    Or(Box<Comparison>, Box<Comparison>),
    Not(Box<Comparison>),
}

impl Comparison {
    pub fn eq(a: Term, b: Term) -> Self {
        Comparison::Eq(a, b)
    }

    pub fn and(self, other: Comparison) -> Self {
        Comparison::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Comparison) -> Self {
        Comparison::Or(Box::new(self), Box::new(other))
    }

    pub fn not(self) -> Self {
        Comparison::Not(Box::new(self))
    }
}

// ============================================================================
// Process tree (resolved: macros already expanded, variables already
// alpha-renamed by the out-of-scope resolver)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Process {
    Nil,
    New {
        name: String,
        ty: String,
        then: Box<Process>,
    },
    In {
        channel: Term,
        pattern: Pattern,
        then: Box<Process>,
    },
    Out {
        channel: Term,
        message: Term,
        then: Box<Process>,
    },
    Let {
        pattern: Pattern,
        term: Term,
        then: Box<Process>,
        or_else: Option<Box<Process>>,
    },
    If {
        cond: Comparison,
        then_branch: Box<Process>,
        else_branch: Box<Process>,
    },
    Mutate {
        cell: String,
        value: Term,
        then: Box<Process>,
    },
    Insert {
        table: String,
        args: Vec<Term>,
        then: Box<Process>,
    },
    Get {
        table: String,
        patterns: Vec<Pattern>,
        then: Box<Process>,
        or_else: Option<Box<Process>>,
    },
    Event {
        name: String,
        args: Vec<Term>,
        then: Box<Process>,
    },
    Replicate(Box<Process>),
    Parallel(Vec<Process>),
}

impl Process {
    /// Every `let`-bound variable that is *referenced* inside `process`'s
    /// own `or_else` branch, walking only that branch (not `then`). Used by
    /// the translator to enforce the stricter-than-ProVerif rule that a
    /// let-bound variable may not be used in the failure branch of its own
    /// binding (see DESIGN.md, open question #1).
    pub fn references_in_else(&self) -> HashSet<String> {
        let mut out = HashSet::new();
        if let Process::Let {
            or_else: Some(branch),
            ..
        } = self
        {
            branch.collect_referenced_variables(&mut out);
        }
        out
    }

    fn collect_referenced_variables(&self, out: &mut HashSet<String>) {
        match self {
            Process::Nil => {}
            Process::New { then, .. } => then.collect_referenced_variables(out),
            Process::In { channel, then, .. } => {
                out.extend(channel.variables());
                then.collect_referenced_variables(out);
            }
            Process::Out {
                channel,
                message,
                then,
            } => {
                out.extend(channel.variables());
                out.extend(message.variables());
                then.collect_referenced_variables(out);
            }
            Process::Let {
                term,
                then,
                or_else,
                ..
            } => {
                out.extend(term.variables());
                then.collect_referenced_variables(out);
                if let Some(b) = or_else {
                    b.collect_referenced_variables(out);
                }
            }
            Process::If {
                then_branch,
                else_branch,
                ..
            } => {
                then_branch.collect_referenced_variables(out);
                else_branch.collect_referenced_variables(out);
            }
            Process::Mutate { value, then, .. } => {
                out.extend(value.variables());
                then.collect_referenced_variables(out);
            }
            Process::Insert { args, then, .. } => {
                args.iter().for_each(|a| out.extend(a.variables()));
                then.collect_referenced_variables(out);
            }
            Process::Get {
                then, or_else, ..
            } => {
                then.collect_referenced_variables(out);
                if let Some(b) = or_else {
                    b.collect_referenced_variables(out);
                }
            }
            Process::Event { args, then, .. } => {
                args.iter().for_each(|a| out.extend(a.variables()));
                then.collect_referenced_variables(out);
            }
            Process::Replicate(p) => p.collect_referenced_variables(out),
            Process::Parallel(ps) => ps.iter().for_each(|p| p.collect_referenced_variables(out)),
        }
    }
}

// ============================================================================
// Declarations
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FreeDeclaration {
    pub name: String,
    pub ty: String,
    pub private: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConstantDecl {
    pub name: String,
    pub ty: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConstructorDecl {
    pub name: String,
    pub param_types: Vec<String>,
    pub result_type: String,
    pub private: bool,
}

/// `reduc forall <vars>; f(lhs_args) = rhs.`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DestructorDecl {
    pub bound_vars: Vec<String>,
    pub lhs: Term,
    pub rhs: Term,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableDecl {
    pub name: String,
    pub arg_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WhenClause {
    pub cell: String,
    pub value: Term,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryDecl {
    pub goal: Term,
    pub when: Option<WhenClause>,
}

// ============================================================================
// Network
// ============================================================================

/// A type-checked, resolved Applied Pi program: the only thing the engine's
/// `translate` module reads.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Network {
    pub types: Vec<String>,
    pub frees: Vec<FreeDeclaration>,
    pub constants: Vec<ConstantDecl>,
    pub constructors: Vec<ConstructorDecl>,
    pub destructors: Vec<DestructorDecl>,
    pub tables: Vec<TableDecl>,
    pub queries: Vec<QueryDecl>,
    pub main: Process,
}

impl Network {
    pub fn new(main: Process) -> Self {
        Network {
            types: Vec::new(),
            frees: Vec::new(),
            constants: Vec::new(),
            constructors: Vec::new(),
            destructors: Vec::new(),
            tables: Vec::new(),
            queries: Vec::new(),
            main,
        }
    }

    pub fn is_private(&self, name: &str) -> bool {
        self.frees
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.private)
            .unwrap_or(false)
    }
}
