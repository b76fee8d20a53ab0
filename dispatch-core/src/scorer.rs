//! Scorer: the model seam between training data and the assignment policy.
//!
//! Untrained, every prediction is a uniform draw in [0, 1) — the explicit
//! cold-start policy: assignments made before any outcome exists are random
//! and callers surface them as low-confidence. Trained, predictions come from
//! the fitted forest, clamped to [0, 1] since the regressor itself does not
//! respect the label's range.
//!
//! The fitted forest travels as a versioned artifact blob so the concrete
//! regressor can change without touching policy or progress code.

use anyhow::{Context, Result, bail};
use rand::{Rng, SeedableRng, rngs::SmallRng};
use serde::{Deserialize, Serialize};

use crate::features::TrainingSet;
use crate::forest::{ForestConfig, ForestRegressor};
use crate::record::Task;

const ARTIFACT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct ModelArtifact {
    version: u32,
    forest: ForestRegressor,
}

#[derive(Debug, Clone)]
pub struct Scorer {
    forest: Option<ForestRegressor>,
    config: ForestConfig,
    cold_start: SmallRng,
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new()
    }
}

impl Scorer {
    pub fn new() -> Self {
        Self {
            forest: None,
            config: ForestConfig::default(),
            cold_start: SmallRng::from_entropy(),
        }
    }

    /// Test hook: deterministic cold-start draws.
    pub fn with_cold_start_seed(seed: u64) -> Self {
        Self {
            cold_start: SmallRng::seed_from_u64(seed),
            ..Self::new()
        }
    }

    pub fn is_trained(&self) -> bool {
        self.forest.is_some()
    }

    /// Fit (or refit) the forest. Replaces any previous fit; there is no
    /// versioning or rollback of model state.
    pub fn train(&mut self, set: &TrainingSet) {
        self.forest = Some(ForestRegressor::fit(set, self.config));
    }

    /// Drop the fitted model, returning to cold start.
    pub fn reset(&mut self) {
        self.forest = None;
    }

    /// Predicted success estimate for (user, task), always in [0, 1].
    pub fn predict(&mut self, user_id: u32, task: &Task) -> f64 {
        match &self.forest {
            None => self.cold_start.r#gen::<f64>(),
            Some(forest) => forest
                .predict(&[f64::from(user_id), task.complexity, task.deadline])
                .clamp(0.0, 1.0),
        }
    }

    /// Serialize the fitted model; `None` when untrained.
    pub fn to_artifact(&self) -> Result<Option<Vec<u8>>> {
        let Some(forest) = &self.forest else {
            return Ok(None);
        };
        let artifact = ModelArtifact {
            version: ARTIFACT_VERSION,
            forest: forest.clone(),
        };
        Ok(Some(
            serde_json::to_vec(&artifact).context("encode model artifact")?,
        ))
    }

    /// Restore a previously serialized model into this scorer.
    pub fn load_artifact(&mut self, bytes: &[u8]) -> Result<()> {
        let artifact: ModelArtifact =
            serde_json::from_slice(bytes).context("decode model artifact")?;
        if artifact.version != ARTIFACT_VERSION {
            bail!(
                "unsupported model artifact version {} (expected {})",
                artifact.version,
                ARTIFACT_VERSION
            );
        }
        self.forest = Some(artifact.forest);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task() -> Task {
        Task {
            task_id: 1,
            kind: "Design".to_string(),
            complexity: 0.5,
            deadline: 10.0,
        }
    }

    fn tiny_set() -> TrainingSet {
        TrainingSet {
            features: vec![[1.0, 0.5, 10.0], [2.0, 0.5, 10.0]],
            labels: vec![0.9, 0.1],
        }
    }

    #[test]
    fn untrained_predictions_stay_in_unit_interval() {
        let mut s = Scorer::with_cold_start_seed(7);
        for _ in 0..100 {
            let p = s.predict(1, &task());
            assert!((0.0..1.0).contains(&p));
        }
    }

    #[test]
    fn training_flips_is_trained() {
        let mut s = Scorer::with_cold_start_seed(7);
        assert!(!s.is_trained());
        s.train(&tiny_set());
        assert!(s.is_trained());
        s.reset();
        assert!(!s.is_trained());
    }

    #[test]
    fn trained_predictions_are_clamped_and_stable() {
        let mut s = Scorer::with_cold_start_seed(7);
        s.train(&tiny_set());
        let a = s.predict(1, &task());
        let b = s.predict(1, &task());
        assert_eq!(a, b, "trained predictions must not consume randomness");
        assert!((0.0..=1.0).contains(&a));
    }

    #[test]
    fn artifact_round_trip_restores_the_fit() {
        let mut s = Scorer::with_cold_start_seed(7);
        s.train(&tiny_set());
        let blob = s.to_artifact().unwrap().unwrap();

        let mut restored = Scorer::with_cold_start_seed(9);
        restored.load_artifact(&blob).unwrap();
        assert!(restored.is_trained());
        assert_eq!(restored.predict(1, &task()), s.predict(1, &task()));
    }

    #[test]
    fn untrained_scorer_has_no_artifact() {
        let s = Scorer::with_cold_start_seed(7);
        assert!(s.to_artifact().unwrap().is_none());
    }

    #[test]
    fn garbage_artifact_is_an_error() {
        let mut s = Scorer::new();
        assert!(s.load_artifact(b"not json").is_err());
        assert!(!s.is_trained());
    }
}
