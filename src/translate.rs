//! # Translation
//!
//! Lowers a [`hornproof_model::Network`] into the engine's rule set. This is
//! the one module allowed to know about both the external model crate and
//! the core `Message` algebra — `term_to_message` lives here, as a function
//! of the translator, rather than as a method on the external `Term`, so
//! that `hornproof-model` never depends on the engine.
//!
//! Free names and constants become premise-less SCRs; constructors and
//! destructors become SCRs over freshly named parameters; the main process
//! is walked by recursive descent, threading the set of facts known so far
//! (`TranslateCtx::premises`), a guard, and a snapshot tree for stateful
//! reads. `New`/`Mutate`/`Insert`/`Get` are grounded in the two Open
//! Question decisions recorded in DESIGN.md: tables lower to synthetic
//! cells named `__table_<name>` holding a cons-chain of inserted rows.

use hornproof_model::{Comparison, Network, Pattern, Process, Term};

use crate::error::EngineError;
use crate::event::Event;
use crate::guard::Guard;
use crate::message::{Message, SigmaMap};
use crate::rule::{Rule, StateConsistentRule, StateTransferringRule, Transformation};
use crate::sigma_factory::SigmaFactory;
use crate::snapshot::{PriorTag, Snapshot, SnapshotTree};
use crate::state::State;

/// Bridges the external term syntax into the engine's message algebra.
/// Kept as a free function (not a method on `Term`) to preserve the
/// one-directional dependency between `hornproof-model` and the engine.
pub(crate) fn term_to_message(t: &Term) -> Message {
    match t {
        Term::Var(v) => Message::var(v.clone()),
        Term::Name(n) => Message::name(n.clone()),
        Term::Apply(f, args) => Message::function(f.clone(), args.iter().map(term_to_message)),
        Term::Tuple(members) => Message::tuple(members.iter().map(term_to_message)),
    }
}

#[derive(Default)]
struct TagGen {
    next: u64,
}

impl TagGen {
    fn fresh(&mut self) -> u64 {
        let v = self.next;
        self.next += 1;
        v
    }

    fn fresh_tag(&mut self) -> String {
        self.fresh().to_string()
    }
}

#[derive(Clone, Default)]
struct TranslateCtx {
    premises: Vec<Event>,
    guard: Guard,
    snapshots: SnapshotTree,
}

impl TranslateCtx {
    fn with_premise(&self, e: Event) -> TranslateCtx {
        let mut c = self.clone();
        c.premises.push(e);
        c
    }
}

/// Walks the whole process tree, rejecting any `let` whose `or_else`
/// branch references a variable bound by that same `let`'s pattern
/// (Open Question #1: stricter than ProVerif, which allows it).
fn validate_no_let_self_reference(p: &Process) -> Result<(), EngineError> {
    if let Process::Let { pattern, or_else: Some(_), .. } = p {
        let bound = pattern.variables();
        let referenced = p.references_in_else();
        let offending: Vec<&String> = bound.intersection(&referenced).collect();
        if !offending.is_empty() {
            return Err(EngineError::IllFormedInput(format!(
                "let-bound variable(s) {offending:?} referenced in the same let's own else branch"
            )));
        }
    }
    for child in children_of(p) {
        validate_no_let_self_reference(child)?;
    }
    Ok(())
}

fn children_of(p: &Process) -> Vec<&Process> {
    match p {
        Process::Nil => vec![],
        Process::New { then, .. }
        | Process::In { then, .. }
        | Process::Out { then, .. }
        | Process::Mutate { then, .. }
        | Process::Insert { then, .. }
        | Process::Event { then, .. } => vec![then.as_ref()],
        Process::Let { then, or_else, .. } | Process::Get { then, or_else, .. } => {
            let mut out = vec![then.as_ref()];
            if let Some(b) = or_else {
                out.push(b.as_ref());
            }
            out
        }
        Process::If { then_branch, else_branch, .. } => vec![then_branch.as_ref(), else_branch.as_ref()],
        Process::Replicate(body) => vec![body.as_ref()],
        Process::Parallel(branches) => branches.iter().collect(),
    }
}

/// Rejects a network where some destructor's `rhs` mentions a variable not
/// bound by its `lhs` pattern — such a destructor could never produce a
/// well-formed value (Open Question #2).
fn validate_destructor_typeability(network: &Network) -> Result<(), EngineError> {
    for d in &network.destructors {
        let bound = d.lhs.variables();
        let rhs_vars = d.rhs.variables();
        let escaping: Vec<&String> = rhs_vars.iter().filter(|v| !bound.contains(*v)).collect();
        if !escaping.is_empty() {
            return Err(EngineError::IllFormedInput(format!(
                "destructor `{:?}` has right-hand variable(s) {escaping:?} not bound by its pattern",
                d.lhs
            )));
        }
    }
    Ok(())
}

fn base_rules(network: &Network, tags: &mut TagGen) -> Vec<Rule> {
    let mut rules = Vec::new();

    for free in &network.frees {
        if !free.private {
            rules.push(Rule::Scr(StateConsistentRule {
                premises: vec![],
                result: Event::know(Message::name(free.name.clone())),
                guard: Guard::empty(),
                snapshots: SnapshotTree::empty(),
                id_tag: tags.fresh(),
            }));
        }
    }

    for constant in &network.constants {
        rules.push(Rule::Scr(StateConsistentRule {
            premises: vec![],
            result: Event::know(Message::name(constant.name.clone())),
            guard: Guard::empty(),
            snapshots: SnapshotTree::empty(),
            id_tag: tags.fresh(),
        }));
    }

    for ctor in &network.constructors {
        let params: Vec<Message> = (0..ctor.param_types.len())
            .map(|i| Message::var(format!("{}_arg{i}", ctor.name)))
            .collect();
        rules.push(Rule::Scr(StateConsistentRule {
            premises: params.iter().cloned().map(Event::know).collect(),
            result: Event::know(Message::function(ctor.name.clone(), params)),
            guard: Guard::empty(),
            snapshots: SnapshotTree::empty(),
            id_tag: tags.fresh(),
        }));
    }

    for destructor in &network.destructors {
        rules.push(Rule::Scr(StateConsistentRule {
            premises: vec![Event::know(term_to_message(&destructor.lhs))],
            result: Event::know(term_to_message(&destructor.rhs)),
            guard: Guard::empty(),
            snapshots: SnapshotTree::empty(),
            id_tag: tags.fresh(),
        }));
    }

    rules
}

/// Pushes `Not` down to the leaves, turning `Eq` into `Neq` and vice versa
/// and applying De Morgan's laws across `And`/`Or`.
fn push_negation(c: &Comparison) -> Comparison {
    match c {
        Comparison::Eq(a, b) => Comparison::Eq(a.clone(), b.clone()),
        Comparison::Neq(a, b) => Comparison::Neq(a.clone(), b.clone()),
        Comparison::And(a, b) => Comparison::And(Box::new(push_negation(a)), Box::new(push_negation(b))),
        Comparison::Or(a, b) => Comparison::Or(Box::new(push_negation(a)), Box::new(push_negation(b))),
        Comparison::Not(inner) => negate(inner),
    }
}

fn negate(c: &Comparison) -> Comparison {
    match c {
        Comparison::Eq(a, b) => Comparison::Neq(a.clone(), b.clone()),
        Comparison::Neq(a, b) => Comparison::Eq(a.clone(), b.clone()),
        Comparison::And(a, b) => Comparison::Or(Box::new(negate(a)), Box::new(negate(b))),
        Comparison::Or(a, b) => Comparison::And(Box::new(negate(a)), Box::new(negate(b))),
        Comparison::Not(inner) => push_negation(inner),
    }
}

/// Every disjunctive way `c` (already negation-free) can hold, as a
/// `(substitution, extra guard)` pair.
fn comparison_effects(c: &Comparison) -> Vec<(SigmaMap, Guard)> {
    match c {
        Comparison::Eq(a, b) => {
            let ma = term_to_message(a);
            let mb = term_to_message(b);
            let mut sf = SigmaFactory::new();
            if ma.determine_unifiable_substitution(&mb, &Guard::empty(), &Guard::empty(), &mut sf) {
                vec![(sf.create_forward_map().extended_with(&sf.create_backward_map()), Guard::empty())]
            } else {
                vec![]
            }
        }
        Comparison::Neq(a, b) => {
            let ma = term_to_message(a);
            let mb = term_to_message(b);
            match (&ma, &mb) {
                (Message::Variable(v), other) | (other, Message::Variable(v)) => {
                    vec![(SigmaMap::empty(), Guard::forbidding(v.clone(), other.clone()))]
                }
                _ if ma == mb => vec![],
                _ => vec![(SigmaMap::empty(), Guard::empty())],
            }
        }
        Comparison::And(a, b) => {
            let mut out = Vec::new();
            for (sa, ga) in comparison_effects(a) {
                for (sb, gb) in comparison_effects(b) {
                    out.push((sa.extended_with(&sb), ga.union(&gb)));
                }
            }
            out
        }
        Comparison::Or(a, b) => {
            let mut out = comparison_effects(a);
            out.extend(comparison_effects(b));
            out
        }
        Comparison::Not(_) => unreachable!("negation already pushed to leaves by push_negation"),
    }
}

fn translate_process(p: &Process, ctx: &TranslateCtx, tags: &mut TagGen, rules: &mut Vec<Rule>) {
    match p {
        Process::Nil => {}

        Process::New { name, ty: _, then } => {
            let ctx2 = ctx.with_premise(Event::new_nonce(Message::nonce(name.clone())));
            translate_process(then, &ctx2, tags, rules);
        }

        Process::In { channel, pattern, then } => {
            let mut ctx2 = ctx.with_premise(Event::know(term_to_message(channel)));
            ctx2.premises.push(Event::know(pattern_to_message(pattern)));
            translate_process(then, &ctx2, tags, rules);
        }

        Process::Out { channel, message, then } => {
            let id_tag = tags.fresh();
            rules.push(Rule::Scr(StateConsistentRule {
                premises: {
                    let mut p = ctx.premises.clone();
                    p.push(Event::know(term_to_message(channel)));
                    p
                },
                result: Event::know(term_to_message(message)),
                guard: ctx.guard.clone(),
                snapshots: ctx.snapshots.clone(),
                id_tag,
            }));
            translate_process(then, ctx, tags, rules);
        }

        Process::Let { pattern, term, then, or_else } => {
            let pmsg = pattern_to_message(pattern);
            let tmsg = term_to_message(term);
            let mut sf = SigmaFactory::new();
            let statically_matches =
                pmsg.determine_unifiable_substitution(&tmsg, &Guard::empty(), &Guard::empty(), &mut sf)
                    && sf.not_backward();

            if statically_matches {
                let fwd = sf.create_forward_map();
                let ctx2 = TranslateCtx {
                    premises: ctx.premises.iter().map(|e| e.substitute(&fwd)).collect(),
                    guard: ctx.guard.substitute(&fwd),
                    snapshots: ctx.snapshots.substitute(&fwd),
                };
                translate_process(then, &ctx2, tags, rules);
            } else {
                let ctx2 = ctx.with_premise(Event::know(pmsg));
                translate_process(then, &ctx2, tags, rules);
                if let Some(alt) = or_else {
                    translate_process(alt, ctx, tags, rules);
                }
            }
        }

        Process::If { cond, then_branch, else_branch } => {
            let positive = push_negation(cond);
            for (sigma, guard) in comparison_effects(&positive) {
                let ctx2 = TranslateCtx {
                    premises: ctx.premises.iter().map(|e| e.substitute(&sigma)).collect(),
                    guard: ctx.guard.union(&guard).substitute(&sigma),
                    snapshots: ctx.snapshots.substitute(&sigma),
                };
                translate_process(then_branch, &ctx2, tags, rules);
            }
            let negative = negate(&positive);
            for (sigma, guard) in comparison_effects(&negative) {
                let ctx2 = TranslateCtx {
                    premises: ctx.premises.iter().map(|e| e.substitute(&sigma)).collect(),
                    guard: ctx.guard.union(&guard).substitute(&sigma),
                    snapshots: ctx.snapshots.substitute(&sigma),
                };
                translate_process(else_branch, &ctx2, tags, rules);
            }
        }

        Process::Mutate { cell, value, then } => {
            let before = ctx
                .snapshots
                .traces()
                .iter()
                .find(|s| s.cell() == cell)
                .map(|s| s.current.clone())
                .unwrap_or_else(|| State::new(cell.clone(), Message::var(format!("{cell}_before@{}", tags.fresh_tag()))));

            let new_state = State::new(cell.clone(), term_to_message(value));
            rules.push(Rule::Str(StateTransferringRule {
                premises: ctx.premises.clone(),
                transformations: vec![Transformation::new(Snapshot::new(before), new_state.clone())],
                guard: ctx.guard.clone(),
                snapshots: ctx.snapshots.clone(),
            }));

            let mut snapshots = ctx.snapshots.clone();
            snapshots.push(Snapshot::new(new_state));
            let ctx2 = TranslateCtx { premises: ctx.premises.clone(), guard: ctx.guard.clone(), snapshots };
            translate_process(then, &ctx2, tags, rules);
        }

        Process::Insert { table, args, then } => {
            let cell_name = format!("__table_{table}");
            let row = Message::function(format!("__table_cons_{table}"), args.iter().map(term_to_message));
            let before_var = ctx
                .snapshots
                .traces()
                .iter()
                .find(|s| s.cell() == cell_name)
                .map(|s| s.current.clone())
                .unwrap_or_else(|| State::new(cell_name.clone(), Message::var(format!("{cell_name}_before@{}", tags.fresh_tag()))));

            let new_value = Message::tuple([before_var.value.clone(), row]);
            let new_state = State::new(cell_name.clone(), new_value);
            rules.push(Rule::Str(StateTransferringRule {
                premises: ctx.premises.clone(),
                transformations: vec![Transformation::new(Snapshot::new(before_var), new_state.clone())],
                guard: ctx.guard.clone(),
                snapshots: ctx.snapshots.clone(),
            }));

            let mut snapshots = ctx.snapshots.clone();
            snapshots.push(Snapshot::new(new_state));
            let ctx2 = TranslateCtx { premises: ctx.premises.clone(), guard: ctx.guard.clone(), snapshots };
            translate_process(then, &ctx2, tags, rules);
        }

        Process::Get { table, patterns, then, or_else } => {
            let cell_name = format!("__table_{table}");
            let tag = tags.fresh_tag();
            let row_pattern = Message::function(format!("__table_cons_{table}"), patterns.iter().map(pattern_to_message));
            let snapshot = Snapshot::new(State::new(cell_name.clone(), Message::var(format!("{cell_name}_tail@{tag}"))))
                .with_prior(PriorTag::ModifiedAnyTimesAfter, State::new(cell_name, row_pattern));

            let mut snapshots = ctx.snapshots.clone();
            snapshots.push(snapshot);
            let ctx2 = TranslateCtx { premises: ctx.premises.clone(), guard: ctx.guard.clone(), snapshots };
            translate_process(then, &ctx2, tags, rules);

            if let Some(alt) = or_else {
                translate_process(alt, ctx, tags, rules);
            }
        }

        Process::Event { name, args, then } => {
            let id_tag = tags.fresh();
            rules.push(Rule::Scr(StateConsistentRule {
                premises: ctx.premises.clone(),
                result: Event::make(Message::function(format!("evt_{name}"), args.iter().map(term_to_message))),
                guard: ctx.guard.clone(),
                snapshots: ctx.snapshots.clone(),
                id_tag,
            }));
            translate_process(then, ctx, tags, rules);
        }

        Process::Replicate(body) => {
            // Horn clauses are persistent facts, so an unbounded number of
            // sessions needs no special translation: each derivation reuses
            // the clause with fresh instance variables at query time
            // (`HornClause::can_result_in`).
            translate_process(body, ctx, tags, rules);
        }

        Process::Parallel(branches) => {
            for branch in branches {
                translate_process(branch, ctx, tags, rules);
            }
        }
    }
}

fn pattern_to_message(p: &Pattern) -> Message {
    term_to_message(p)
}

/// Lowers a resolved [`Network`] into the engine's rule set, enforcing the
/// two Open Question restrictions up front.
pub fn translate(network: &Network) -> Result<Vec<Rule>, EngineError> {
    if let Err(e) = validate_no_let_self_reference(&network.main) {
        tracing::warn!(error = %e, "rejecting network: let-bound variable referenced in its own else branch");
        return Err(e);
    }
    if let Err(e) = validate_destructor_typeability(network) {
        tracing::warn!(error = %e, "rejecting network: destructor right-hand side not typeable from its pattern");
        return Err(e);
    }

    let mut tags = TagGen::default();
    let mut rules = base_rules(network, &mut tags);
    translate_process(&network.main, &TranslateCtx::default(), &mut tags, &mut rules);
    Ok(rules)
}
