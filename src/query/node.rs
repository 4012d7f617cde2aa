//! The state of one `(goal, guard)` proof obligation during backward
//! search.

use crate::query::attack::Attack;

#[derive(Debug, Clone)]
pub enum QueryNode {
    /// Currently being expanded; seeing this again for the same key means
    /// the search has looped back on itself.
    InProgress,
    /// Proven, with the witnessing derivation.
    Proven(Attack),
    /// No clause could be found to discharge this goal.
    Failed,
    /// The term budget or cancellation stopped search before a verdict was
    /// reached.
    Unresolvable,
}

impl QueryNode {
    pub fn is_proven(&self) -> bool {
        matches!(self, QueryNode::Proven(_))
    }

    pub fn attack(&self) -> Option<&Attack> {
        match self {
            QueryNode::Proven(a) => Some(a),
            _ => None,
        }
    }
}
