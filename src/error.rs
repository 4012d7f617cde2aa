//! # Errors
//!
//! All fallible engine entry points return `Result<_, EngineError>`.
//! [`EngineError::RuleContradiction`] exists for API completeness but is
//! never constructed in normal operation: a contradictory rule is a local,
//! recoverable condition (the rule is skipped, or the affected query node
//! becomes [`crate::query::QueryNode::Failed`]), not a reason to abort the
//! whole run. The only variant the engine returns unconditionally on
//! detection is [`EngineError::InvariantViolation`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("ill-formed input: {0}")]
    IllFormedInput(String),

    #[error("rule contradiction: {0}")]
    RuleContradiction(String),

    #[error("budget exhausted after {terms_considered} terms (limit {limit})")]
    BudgetExhausted { terms_considered: usize, limit: usize },

    #[error("query cancelled")]
    Cancelled,

    #[error("invariant violated by rule `{rule}` (nession: {nession_summary})")]
    InvariantViolation { rule: String, nession_summary: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ill_formed_input_carries_message() {
        let e = EngineError::IllFormedInput("let pattern references its own else branch".into());
        assert!(e.to_string().contains("own else branch"));
    }

    #[test]
    fn budget_exhausted_reports_both_counts() {
        let e = EngineError::BudgetExhausted { terms_considered: 301, limit: 300 };
        assert!(e.to_string().contains("301"));
        assert!(e.to_string().contains("300"));
    }
}
