//! Interns `(goal, guard)` proof obligations so the same sub-goal is never
//! expanded twice within one resolution — the engine's recursion guard and
//! memoization table in one.

use dashmap::DashMap;

use crate::guard::Guard;
use crate::message::Message;
use crate::query::node::QueryNode;

#[derive(Default)]
pub struct QueryNodeMatrix {
    nodes: DashMap<(Message, Guard), QueryNode>,
}

impl QueryNodeMatrix {
    pub fn new() -> Self {
        QueryNodeMatrix::default()
    }

    pub fn get(&self, goal: &Message, guard: &Guard) -> Option<QueryNode> {
        self.nodes.get(&(goal.clone(), guard.clone())).map(|entry| entry.value().clone())
    }

    pub fn set(&self, goal: &Message, guard: &Guard, node: QueryNode) {
        self.nodes.insert((goal.clone(), guard.clone()), node);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
