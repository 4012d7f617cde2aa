//! The candidate clauses that could discharge one premise, handed to the
//! query engine so it can try them in priority order instead of clause
//! declaration order.

use crate::guard::Guard;
use crate::horn::{tuple_pairing_clause, HornClause};
use crate::message::Message;

pub struct PremiseOptionSet {
    pub premise: Message,
    pub options: Vec<HornClause>,
}

impl PremiseOptionSet {
    /// Collects every clause whose result could plausibly unify with
    /// `premise` — same top-level shape (variable, name, nonce, functor, or
    /// tuple arity), deferring the exact check to
    /// [`HornClause::can_result_in`] since that also needs a guard and a
    /// fresh instance tag. Ordered by premise count so clauses needing
    /// fewer further obligations are tried first.
    ///
    /// When `premise` is itself a tuple, a synthetic
    /// [`tuple_pairing_clause`] is added alongside whatever literal
    /// tuple-shaped clauses exist, so a tuple whose members were only ever
    /// learned separately is still derivable as a whole.
    pub fn for_premise(premise: &Message, _guard: &Guard, clauses: &[HornClause]) -> Self {
        let mut options: Vec<HornClause> =
            clauses.iter().filter(|c| shape_compatible(&c.result, premise)).cloned().collect();
        if let Message::Tuple(members) = premise {
            options.push(tuple_pairing_clause(members));
        }
        options.sort_by_key(|c| c.premises.len());
        PremiseOptionSet { premise: premise.clone(), options }
    }
}

fn shape_compatible(result: &Message, premise: &Message) -> bool {
    if result.is_variable() || premise.is_variable() {
        return true;
    }
    match (result, premise) {
        (Message::Name(_), Message::Name(_)) => true,
        (Message::Nonce(_), Message::Nonce(_)) => true,
        (Message::Function(f, xs), Message::Function(g, ys)) => f == g && xs.len() == ys.len(),
        (Message::Tuple(xs), Message::Tuple(ys)) => xs.len() == ys.len(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_out_clauses_with_incompatible_functor() {
        let clauses = vec![
            HornClause::new(Default::default(), Message::function("enc", [Message::name("a")]), Guard::empty(), -1),
            HornClause::new(Default::default(), Message::function("dec", [Message::name("a")]), Guard::empty(), -1),
        ];
        let goal = Message::function("enc", [Message::name("x")]);
        let set = PremiseOptionSet::for_premise(&goal, &Guard::empty(), &clauses);
        assert_eq!(set.options.len(), 1);
    }

    #[test]
    fn keeps_variable_result_clauses_as_always_compatible() {
        let clauses = vec![HornClause::new(Default::default(), Message::var("x"), Guard::empty(), -1)];
        let goal = Message::name("anything");
        let set = PremiseOptionSet::for_premise(&goal, &Guard::empty(), &clauses);
        assert_eq!(set.options.len(), 1);
    }

    #[test]
    fn tuple_goal_gets_a_synthetic_pairing_clause_even_with_no_literal_tuple_clauses() {
        let clauses = vec![
            HornClause::new(Default::default(), Message::name("b"), Guard::empty(), -1),
            HornClause::new(Default::default(), Message::name("d"), Guard::empty(), -1),
        ];
        let goal = Message::tuple([Message::name("b"), Message::name("d")]);
        let set = PremiseOptionSet::for_premise(&goal, &Guard::empty(), &clauses);
        let pairing = set.options.iter().find(|c| c.result == goal).expect("pairing clause present");
        assert_eq!(pairing.premises.len(), 2);
    }
}
