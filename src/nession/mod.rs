//! # Nessions
//!
//! A *nession* ("nonce session") is one append-only history of cell states
//! a stateful protocol could pass through. Stateless rules are converted
//! directly to Horn clauses ([`crate::horn::from_stateless_scr`]); stateful
//! rules instead need [`NessionManager::elaborate`] to discover every
//! reachable history before they can be converted, since which SCRs and
//! STRs apply depends on the sequence of cell values already reached.

pub mod frame;
pub mod knit;
pub mod manager;

use std::collections::BTreeSet;

pub use frame::{Frame, StateCell};
pub use knit::KnitPattern;
pub use manager::NessionManager;

use crate::guard::Guard;
use crate::horn::{HornClause, Source};
use crate::message::Message;
use crate::rule::{StateConsistentRule, StateTransferringRule};
use crate::sigma_factory::SigmaFactory;
use crate::snapshot::{PriorTag, Snapshot, SnapshotTree};
use crate::state::State;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nession {
    pub frames: Vec<Frame>,
    pub nonce_declarations: BTreeSet<Message>,
    pub v_number: u64,
}

impl Nession {
    pub fn initial(cells: Vec<State>) -> Self {
        Nession {
            frames: vec![Frame::new(cells.into_iter().map(StateCell::new).collect())],
            nonce_declarations: BTreeSet::new(),
            v_number: 0,
        }
    }

    pub fn latest_frame(&self) -> &Frame {
        self.frames.last().expect("a nession always has at least one frame")
    }

    /// The index of the current (last) frame, used as a Horn clause rank.
    pub fn rank(&self) -> i64 {
        (self.frames.len() - 1) as i64
    }

    /// `true` iff every snapshot in `tree` can be matched: the `current`
    /// state against this nession's latest frame, and each `chain` entry
    /// against some earlier frame, walked backward and respecting
    /// [`PriorTag::ModifiedOnceAfter`]'s no-skipping rule.
    pub fn matches_snapshot_tree(&self, tree: &SnapshotTree, sf: &mut SigmaFactory) -> bool {
        tree.traces().iter().all(|snap| self.matches_snapshot(snap, sf))
    }

    fn matches_snapshot(&self, snap: &Snapshot, sf: &mut SigmaFactory) -> bool {
        let Some(current_cell) = self.latest_frame().cell(snap.cell()) else {
            return false;
        };
        if !current_cell.state.can_be_unifiable_with(&snap.current, &Guard::empty(), &Guard::empty(), sf) {
            return false;
        }

        let mut search_from = self.frames.len().saturating_sub(1);
        for (tag, wanted) in &snap.chain {
            let mut found = false;
            while search_from > 0 {
                search_from -= 1;
                let Some(candidate) = self.frames[search_from].cell(snap.cell()) else {
                    continue;
                };
                let mut trial = sf.clone();
                if candidate.state.can_be_unifiable_with(wanted, &Guard::empty(), &Guard::empty(), &mut trial) {
                    *sf = trial;
                    found = true;
                    break;
                }
                if *tag == PriorTag::ModifiedOnceAfter {
                    break;
                }
            }
            if !found {
                return false;
            }
        }
        true
    }

    /// Applies a stateful SCR to the current frame, returning a new
    /// nession with the SCR recorded. Returns `None` if the rule's
    /// snapshot requirement doesn't match or it was already applied in
    /// this frame (by `IdTag`).
    pub fn try_apply_system_rule(&self, scr: &StateConsistentRule) -> Option<Nession> {
        if self.latest_frame().has_scr_tagged(scr.id_tag) {
            return None;
        }
        let mut sf = SigmaFactory::new();
        if !self.matches_snapshot_tree(&scr.snapshots, &mut sf) {
            return None;
        }
        let mut out = self.clone();
        out.frames.last_mut().expect("non-empty").scrs.push(scr.clone());
        out.nonce_declarations.extend(scr.nonce_declarations());
        Some(out)
    }

    /// Applies a state-transferring rule, appending a new frame whose cells
    /// reflect every rewrite the rule performs.
    pub fn try_apply_transfer(&self, str_rule: &StateTransferringRule) -> Option<Nession> {
        let mut sf = SigmaFactory::new();
        if !self.matches_snapshot_tree(&str_rule.snapshots, &mut sf) {
            return None;
        }

        let mut next_cells = self.latest_frame().cells.clone();
        for t in &str_rule.transformations {
            let mut local = sf.clone();
            if !self.matches_snapshot(&t.after_point, &mut local) {
                return None;
            }
            sf = local;
            let fwd = sf.create_forward_map();
            let new_state = t.new_value.substitute(&fwd);
            match next_cells.iter_mut().find(|c| c.state.cell == new_state.cell) {
                Some(existing) => *existing = StateCell::with_producer(new_state, str_rule.clone()),
                None => next_cells.push(StateCell::with_producer(new_state, str_rule.clone())),
            }
        }

        let mut out = self.clone();
        out.frames.push(Frame::new(next_cells));
        out.nonce_declarations.extend(
            str_rule.premises.iter().filter(|e| e.is_new()).map(|e| e.message().clone()),
        );
        out.v_number += 1;
        Some(out)
    }

    /// Flattens every frame's recorded SCRs into Horn clauses, ranked by
    /// the frame they were shown applicable in.
    pub fn collect_horn_clauses(&self) -> Vec<HornClause> {
        self.frames
            .iter()
            .enumerate()
            .flat_map(|(rank, frame)| {
                frame.scrs.iter().map(move |scr| {
                    let premises = scr.premises.iter().filter(|e| e.is_know()).map(|e| e.message().clone()).collect();
                    HornClause {
                        premises,
                        result: scr.result.message().clone(),
                        guard: scr.guard.clone(),
                        rank: rank as i64,
                        source: Some(Source::FromNession {
                            frame_rank: rank as i64,
                            rule_description: format!("scr#{}", scr.id_tag),
                        }),
                    }
                })
            })
            .collect()
    }

    /// `true` iff some frame's `cell` unifies with `value` — used to check
    /// a query's `when` clause against this nession.
    pub fn cell_holds(&self, cell: &str, value: &Message) -> bool {
        self.frames
            .iter()
            .any(|f| f.cell(cell).map(|c| c.state.value.is_unifiable_with(value)).unwrap_or(false))
    }
}
