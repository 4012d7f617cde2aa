//! # Events
//!
//! A tagged atom carrying one or more messages. At the algorithmic core
//! only [`EventTag::Know`], [`EventTag::New`], and [`EventTag::Make`] are
//! operational; `Init`, `Accept`, and `Leak` round out the tag set the
//! translator can emit but are not consulted by unification, rule
//! application, or Horn-clause extraction.

use serde::{Deserialize, Serialize};

use crate::message::{Message, SigmaMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventTag {
    /// The attacker knows `M`.
    Know,
    /// Nonce `N` is generated.
    New,
    /// Rule-local production marker used during Horn extraction.
    Make,
    Init,
    Accept,
    Leak,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Event {
    pub tag: EventTag,
    pub messages: Vec<Message>,
}

impl Event {
    pub fn new(tag: EventTag, messages: Vec<Message>) -> Self {
        Event { tag, messages }
    }

    pub fn know(m: Message) -> Self {
        Event::new(EventTag::Know, vec![m])
    }

    pub fn new_nonce(m: Message) -> Self {
        Event::new(EventTag::New, vec![m])
    }

    pub fn make(m: Message) -> Self {
        Event::new(EventTag::Make, vec![m])
    }

    pub fn is_know(&self) -> bool {
        self.tag == EventTag::Know
    }

    pub fn is_new(&self) -> bool {
        self.tag == EventTag::New
    }

    pub fn is_make(&self) -> bool {
        self.tag == EventTag::Make
    }

    /// The event's single message, for the single-message tags (`Know`,
    /// `New`, `Make`).
    pub fn message(&self) -> &Message {
        &self.messages[0]
    }

    pub fn substitute(&self, sigma: &SigmaMap) -> Event {
        Event {
            tag: self.tag,
            messages: self.messages.iter().map(|m| m.substitute(sigma)).collect(),
        }
    }
}
