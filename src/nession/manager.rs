//! # Nession manager
//!
//! Drives the elaboration loop that discovers every stateful history a set
//! of SCRs and STRs can produce from an initial cell assignment: alternate
//! saturating each live nession with every applicable SCR, then branching
//! each into one nession per compatible transfer group of applicable STRs,
//! until no nession can advance further or the round budget is spent.
//! Checked cooperatively against [`CancelToken`] between passes, matching
//! the teacher's timeout-by-polling convention rather than preemptive
//! interruption.

use crate::limits::{CancelToken, EngineLimits};
use crate::nession::{KnitPattern, Nession};
use crate::rule::{StateConsistentRule, StateTransferringRule};
use crate::sigma_factory::SigmaFactory;
use crate::state::State;

pub struct NessionManager;

impl NessionManager {
    /// Elaborates every nession reachable from `initial` by the given
    /// rules. `finished` collects nessions no STR can advance further;
    /// elaboration otherwise stops once `limits.elaboration_limit` rounds
    /// have run or `cancel` is observed.
    pub fn elaborate(
        initial: Vec<State>,
        scrs: &[StateConsistentRule],
        strs: &[StateTransferringRule],
        limits: &EngineLimits,
        cancel: &CancelToken,
    ) -> Vec<Nession> {
        let span = tracing::info_span!(
            "elaborate",
            scr_count = scrs.len(),
            str_count = strs.len(),
            elaboration_limit = limits.elaboration_limit
        );
        let _enter = span.enter();

        let knit = KnitPattern::new(strs);
        let mut frontier = vec![Nession::initial(initial)];
        let mut finished = Vec::new();
        let mut rounds = 0;

        while !frontier.is_empty() && rounds < limits.elaboration_limit {
            if cancel.is_cancelled() {
                tracing::debug!(rounds, "elaboration cancelled between scr passes");
                break;
            }
            rounds += 1;

            let saturated: Vec<Nession> = frontier.iter().map(|n| saturate_with_scrs(n, scrs)).collect();

            if cancel.is_cancelled() {
                break;
            }

            let mut next_frontier = Vec::new();
            for n in &saturated {
                let applicable: Vec<usize> = strs
                    .iter()
                    .enumerate()
                    .filter(|(_, r)| {
                        let mut sf = SigmaFactory::new();
                        n.matches_snapshot_tree(&r.snapshots, &mut sf)
                    })
                    .map(|(i, _)| i)
                    .collect();

                if applicable.is_empty() {
                    finished.push(n.clone());
                    continue;
                }

                for group in knit.transfer_groups(&applicable) {
                    let mut branch = n.clone();
                    let mut ok = true;
                    for idx in group {
                        match branch.try_apply_transfer(&strs[idx]) {
                            Some(advanced) => branch = advanced,
                            None => {
                                tracing::debug!(str_index = idx, "transfer rejected: snapshot did not match nession history");
                                ok = false;
                                break;
                            }
                        }
                    }
                    if ok {
                        next_frontier.push(branch);
                    }
                }
            }

            frontier = next_frontier;
        }

        if rounds >= limits.elaboration_limit && !frontier.is_empty() {
            tracing::warn!(rounds, limit = limits.elaboration_limit, "elaboration round budget exhausted with live nessions remaining");
        }

        finished.extend(frontier);
        finished
    }
}

/// Repeatedly applies every SCR that matches until none does, so a single
/// frame ends up carrying every stateless-looking fact reachable without
/// advancing a cell.
fn saturate_with_scrs(n: &Nession, scrs: &[StateConsistentRule]) -> Nession {
    let mut current = n.clone();
    let mut changed = true;
    while changed {
        changed = false;
        for scr in scrs {
            if let Some(advanced) = current.try_apply_system_rule(scr) {
                current = advanced;
                changed = true;
            }
        }
    }
    current
}
