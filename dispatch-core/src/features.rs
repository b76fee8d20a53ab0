//! Feature builder: turns the result log into a supervised-learning table.
//!
//! Each result row is inner-joined with its task and user; rows whose task or
//! user has since been deleted are dropped silently. Features per row are
//! `[user_id, complexity, deadline]` — user_id as a plain numeric feature is
//! a known modeling limitation (it does not generalize across a changing user
//! population) carried over deliberately from the data this engine inherits.
//!
//! Label: 0.7 * (quality / 5) + 0.3 * clamp(1 - time_taken / deadline, 0, 1).
//! The efficiency term rewards finishing under budget; the clamp keeps
//! overruns from going negative.

use crate::store::Store;

pub const FEATURES: usize = 3;

/// Joined, numeric training table.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSet {
    pub features: Vec<[f64; FEATURES]>,
    pub labels: Vec<f64>,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Success label for one completed (task, user) outcome.
pub fn success_label(quality: u8, time_taken: f64, deadline: f64) -> f64 {
    let quality_score = f64::from(quality) / 5.0;
    let efficiency = (1.0 - time_taken / deadline).clamp(0.0, 1.0);
    0.7 * quality_score + 0.3 * efficiency
}

/// Build the training table, or `None` when there is nothing to learn from
/// (no results, or every result's task/user has been deleted). `None` means
/// "insufficient data", not an error.
pub fn build_training_set(store: &Store) -> Option<TrainingSet> {
    if store.results.is_empty() {
        return None;
    }

    let mut features = Vec::with_capacity(store.results.len());
    let mut labels = Vec::with_capacity(store.results.len());

    for r in &store.results {
        let Some(task) = store.task(r.task_id) else {
            continue;
        };
        if store.user(r.user_id).is_none() {
            continue;
        }
        features.push([f64::from(r.user_id), task.complexity, task.deadline]);
        labels.push(success_label(r.quality, r.time_taken, task.deadline));
    }

    if labels.is_empty() {
        return None;
    }
    Some(TrainingSet { features, labels })
}
