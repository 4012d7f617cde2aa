//! # Query engine
//!
//! Backward-search proof resolution over a nession's Horn clauses: a goal
//! [`Message`](crate::message::Message) is proven by finding a clause whose
//! result it unifies with, then recursively proving every premise of that
//! clause, memoizing `(goal, guard)` pairs in a [`matrix::QueryNodeMatrix`]
//! so the same sub-goal is never expanded twice and cycles terminate as
//! [`node::QueryNode::Failed`] rather than looping. A premise hitting the
//! term budget does not condemn the whole goal — [`engine::QueryEngine`]
//! keeps trying the goal's remaining clause options, and once every option
//! is exhausted makes one final pass promoting any option whose premises
//! the search already cached as proven along the way.

pub mod attack;
pub mod engine;
pub mod matrix;
pub mod node;
pub mod option_set;

pub use attack::Attack;
pub use engine::{find_attack, QueryEngine};
pub use matrix::QueryNodeMatrix;
pub use node::QueryNode;
pub use option_set::PremiseOptionSet;
