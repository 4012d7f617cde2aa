//! # Textual derivation reporting
//!
//! The engine's only textual output surface: renders an [`Attack`]'s
//! derivation tree as indented text. Performs no file I/O and returns
//! `String` — a caller (CLI, UI, test) decides what to do with it.

use std::fmt::Write as _;

use crate::horn::Source;
use crate::query::Attack;

/// Renders `attack` as an indented derivation tree: one line per clause
/// application, its result message, and (if present) the `when` state the
/// query required.
pub fn describe(attack: &Attack) -> String {
    let mut out = String::new();
    write_node(&mut out, attack, 0, false);
    out
}

/// Like [`describe`], but annotates each line with the clause's
/// [`Source`] (`Composition`, `Substitution`, `Detuple`, `Scrub`, or
/// `FromNession { frame_rank, rule_description }`).
pub fn describe_with_sources(attack: &Attack) -> String {
    let mut out = String::new();
    write_node(&mut out, attack, 0, true);
    out
}

fn write_node(out: &mut String, attack: &Attack, depth: usize, with_sources: bool) {
    let indent = "  ".repeat(depth);
    let _ = write!(out, "{indent}knows {:?}", attack.actual);
    if with_sources {
        if let Some(source) = &attack.clause.source {
            let _ = write!(out, "  [{}]", describe_source(source));
        }
    }
    if let Some(when) = &attack.when {
        let _ = write!(out, "  (when {} = {:?})", when.cell, when.value);
    }
    out.push('\n');
    for sub in attack.sub_attacks.values() {
        write_node(out, sub, depth + 1, with_sources);
    }
}

fn describe_source(source: &Source) -> String {
    match source {
        Source::Composition => "composed".to_string(),
        Source::Substitution => "substituted".to_string(),
        Source::Detuple => "detupled".to_string(),
        Source::Scrub => "scrubbed".to_string(),
        Source::Pairing => "paired".to_string(),
        Source::FromNession { frame_rank, rule_description } => {
            format!("nession frame {frame_rank}, rule {rule_description}")
        }
    }
}
