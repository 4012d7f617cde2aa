//! An attack witness: a concrete derivation showing the query goal is
//! reachable, recorded as the clause that produced it plus one sub-attack
//! per non-trivial premise it needed.

use std::collections::BTreeMap;

use crate::horn::HornClause;
use crate::message::Message;
use crate::state::State;

#[derive(Debug, Clone, PartialEq)]
pub struct Attack {
    pub query: Message,
    pub actual: Message,
    pub clause: HornClause,
    pub sub_attacks: BTreeMap<Message, Attack>,
    /// The cell state a `when` clause on the query required, if the query
    /// had one.
    pub when: Option<State>,
}

impl Attack {
    /// The number of clause applications in this derivation, counting the
    /// attack itself.
    pub fn size(&self) -> usize {
        1 + self.sub_attacks.values().map(Attack::size).sum::<usize>()
    }

    pub fn depth(&self) -> usize {
        1 + self.sub_attacks.values().map(Attack::depth).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::Guard;

    fn leaf(result: Message) -> Attack {
        Attack {
            query: result.clone(),
            actual: result.clone(),
            clause: HornClause::new(Default::default(), result, Guard::empty(), -1),
            sub_attacks: BTreeMap::new(),
            when: None,
        }
    }

    #[test]
    fn size_counts_every_node_in_the_tree() {
        let mut sub = BTreeMap::new();
        sub.insert(Message::name("a"), leaf(Message::name("a")));
        sub.insert(Message::name("b"), leaf(Message::name("b")));
        let root = Attack {
            query: Message::name("secret"),
            actual: Message::name("secret"),
            clause: HornClause::new(Default::default(), Message::name("secret"), Guard::empty(), -1),
            sub_attacks: sub,
            when: None,
        };
        assert_eq!(root.size(), 3);
        assert_eq!(root.depth(), 2);
    }
}
