//! Assignment policy: greedy best-scorer selection.
//!
//! Eligibility is decided from the result log alone: a user who already holds
//! a recorded outcome for the exact (task, user) pair is out; everyone else
//! is in, including users mid-flight on other tasks. Progress status is
//! deliberately not consulted here (see DESIGN.md).
//!
//! Tie-break: strict greater-than, so the first-encountered user wins ties.
//! Users are scored in store order (ascending ids in practice), which keeps
//! assignment reproducible for a fixed scorer state.

use crate::record::Task;
use crate::scorer::Scorer;
use crate::store::Store;

/// A chosen assignee together with the score that won.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub user_id: u32,
    pub user_name: String,
    pub score: f64,
}

/// Score every eligible user for `task` and pick the best. `None` when no
/// user is eligible — a "no available assignee" signal, not an error.
pub fn pick_best(store: &Store, scorer: &mut Scorer, task: &Task) -> Option<Assignment> {
    let mut best: Option<Assignment> = None;

    for user in &store.users {
        if store.has_result(task.task_id, user.user_id) {
            continue;
        }
        let score = scorer.predict(user.user_id, task);
        let beats = best.as_ref().is_none_or(|b| score > b.score);
        if beats {
            best = Some(Assignment {
                user_id: user.user_id,
                user_name: user.name.clone(),
                score,
            });
        }
    }

    best
}
