//! # Limits and cancellation
//!
//! Grounded on the teacher's `ExecutionConfig`/`QueryTimeout` pair
//! (`src/execution/mod.rs`, `src/execution/timeout.rs`): a small
//! plain-data limits struct plus a cheaply-clonable cooperative
//! cancellation flag, checked between passes rather than preemptively.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Engine-wide resource limits for one `resolve`/`elaborate` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineLimits {
    /// `MaximumTerms`: the query engine gives up and falls back to
    /// `FinalAssess` once this many distinct terms have been considered.
    pub maximum_terms: usize,
    /// Caps the number of nession-manager elaboration rounds.
    pub elaboration_limit: usize,
}

impl EngineLimits {
    pub const DEFAULT_MAXIMUM_TERMS: usize = 300;

    /// `|SCRs| + 2 * |STRs|`, the default elaboration round cap: enough for
    /// every STR to apply at least twice along any one derivation path.
    pub fn with_rule_counts(scr_count: usize, str_count: usize) -> Self {
        EngineLimits {
            maximum_terms: Self::DEFAULT_MAXIMUM_TERMS,
            elaboration_limit: scr_count + 2 * str_count,
        }
    }
}

impl Default for EngineLimits {
    fn default() -> Self {
        EngineLimits { maximum_terms: Self::DEFAULT_MAXIMUM_TERMS, elaboration_limit: 64 }
    }
}

/// A cooperative cancellation flag shared (via `Arc`) across every worker
/// of one query or elaboration run. Checked between SCR/STR passes and
/// between per-nession query workers; never interrupts work mid-step.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elaboration_limit_follows_rule_counts() {
        let limits = EngineLimits::with_rule_counts(3, 5);
        assert_eq!(limits.elaboration_limit, 3 + 2 * 5);
    }

    #[test]
    fn cancel_token_is_observed_after_clone() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
