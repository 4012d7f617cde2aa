//! Fluent builders for constructing [`Network`](crate::Network) values and
//! [`Process`](crate::Process) trees, used by the engine's tests in place of
//! a textual parser.
//!
//! ## Example
//!
//! ```rust
//! use hornproof_model::builders::{NetworkBuilder, ProcessBuilder};
//! use hornproof_model::Term;
//!
//! // free c: channel.
//! // process out(c, ok).
//! let net = NetworkBuilder::new(
//!     ProcessBuilder::out(Term::name("c"), Term::name("ok")).build(),
//! )
//! .free("c", "channel", false)
//! .build();
//! assert_eq!(net.frees.len(), 1);
//! ```

use crate::{
    Comparison, ConstantDecl, ConstructorDecl, DestructorDecl, FreeDeclaration, Network, Pattern,
    Process, QueryDecl, TableDecl, Term, WhenClause,
};

/// Builder for a resolved [`Process`] tree. Each method prepends one
/// construct and returns the builder so call sites read top-down the way
/// the surface syntax would.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    process: Process,
}

impl ProcessBuilder {
    pub fn nil() -> Self {
        ProcessBuilder { process: Process::Nil }
    }

    pub fn new_name(name: impl Into<String>, ty: impl Into<String>, then: ProcessBuilder) -> Self {
        ProcessBuilder {
            process: Process::New {
                name: name.into(),
                ty: ty.into(),
                then: Box::new(then.process),
            },
        }
    }

    pub fn input(channel: Term, pattern: Pattern, then: ProcessBuilder) -> Self {
        ProcessBuilder {
            process: Process::In {
                channel,
                pattern,
                then: Box::new(then.process),
            },
        }
    }

    pub fn out(channel: Term, message: Term) -> Self {
        ProcessBuilder {
            process: Process::Out {
                channel,
                message,
                then: Box::new(Process::Nil),
            },
        }
    }

    pub fn out_then(channel: Term, message: Term, then: ProcessBuilder) -> Self {
        ProcessBuilder {
            process: Process::Out {
                channel,
                message,
                then: Box::new(then.process),
            },
        }
    }

    pub fn let_in(pattern: Pattern, term: Term, then: ProcessBuilder) -> Self {
        ProcessBuilder {
            process: Process::Let {
                pattern,
                term,
                then: Box::new(then.process),
                or_else: None,
            },
        }
    }

    pub fn let_in_else(
        pattern: Pattern,
        term: Term,
        then: ProcessBuilder,
        or_else: ProcessBuilder,
    ) -> Self {
        ProcessBuilder {
            process: Process::Let {
                pattern,
                term,
                then: Box::new(then.process),
                or_else: Some(Box::new(or_else.process)),
            },
        }
    }

    pub fn if_then_else(cond: Comparison, then_branch: ProcessBuilder, else_branch: ProcessBuilder) -> Self {
        ProcessBuilder {
            process: Process::If {
                cond,
                then_branch: Box::new(then_branch.process),
                else_branch: Box::new(else_branch.process),
            },
        }
    }

    pub fn mutate(cell: impl Into<String>, value: Term, then: ProcessBuilder) -> Self {
        ProcessBuilder {
            process: Process::Mutate {
                cell: cell.into(),
                value,
                then: Box::new(then.process),
            },
        }
    }

    pub fn insert(table: impl Into<String>, args: Vec<Term>, then: ProcessBuilder) -> Self {
        ProcessBuilder {
            process: Process::Insert {
                table: table.into(),
                args,
                then: Box::new(then.process),
            },
        }
    }

    pub fn get(
        table: impl Into<String>,
        patterns: Vec<Pattern>,
        then: ProcessBuilder,
        or_else: Option<ProcessBuilder>,
    ) -> Self {
        ProcessBuilder {
            process: Process::Get {
                table: table.into(),
                patterns,
                then: Box::new(then.process),
                or_else: or_else.map(|b| Box::new(b.process)),
            },
        }
    }

    pub fn event(name: impl Into<String>, args: Vec<Term>, then: ProcessBuilder) -> Self {
        ProcessBuilder {
            process: Process::Event {
                name: name.into(),
                args,
                then: Box::new(then.process),
            },
        }
    }

    pub fn replicate(body: ProcessBuilder) -> Self {
        ProcessBuilder {
            process: Process::Replicate(Box::new(body.process)),
        }
    }

    pub fn parallel(branches: impl IntoIterator<Item = ProcessBuilder>) -> Self {
        ProcessBuilder {
            process: Process::Parallel(branches.into_iter().map(|b| b.process).collect()),
        }
    }

    pub fn build(self) -> Process {
        self.process
    }
}

/// Builder for a [`Network`].
#[derive(Debug, Clone)]
pub struct NetworkBuilder {
    network: Network,
}

impl NetworkBuilder {
    pub fn new(main: Process) -> Self {
        NetworkBuilder {
            network: Network::new(main),
        }
    }

    pub fn ty(mut self, name: impl Into<String>) -> Self {
        self.network.types.push(name.into());
        self
    }

    pub fn free(mut self, name: impl Into<String>, ty: impl Into<String>, private: bool) -> Self {
        self.network.frees.push(FreeDeclaration {
            name: name.into(),
            ty: ty.into(),
            private,
        });
        self
    }

    pub fn constant(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.network.constants.push(ConstantDecl {
            name: name.into(),
            ty: ty.into(),
        });
        self
    }

    pub fn constructor(
        mut self,
        name: impl Into<String>,
        param_types: Vec<String>,
        result_type: impl Into<String>,
        private: bool,
    ) -> Self {
        self.network.constructors.push(ConstructorDecl {
            name: name.into(),
            param_types,
            result_type: result_type.into(),
            private,
        });
        self
    }

    pub fn destructor(mut self, bound_vars: Vec<String>, lhs: Term, rhs: Term) -> Self {
        self.network.destructors.push(DestructorDecl {
            bound_vars,
            lhs,
            rhs,
        });
        self
    }

    pub fn table(mut self, name: impl Into<String>, arg_types: Vec<String>) -> Self {
        self.network.tables.push(TableDecl {
            name: name.into(),
            arg_types,
        });
        self
    }

    pub fn query(mut self, goal: Term) -> Self {
        self.network.queries.push(QueryDecl { goal, when: None });
        self
    }

    pub fn query_when(mut self, goal: Term, cell: impl Into<String>, value: Term) -> Self {
        self.network.queries.push(QueryDecl {
            goal,
            when: Some(WhenClause {
                cell: cell.into(),
                value,
            }),
        });
        self
    }

    pub fn build(self) -> Network {
        self.network
    }
}
