//! Small random-forest regressor for the 3-feature success table.
//!
//! The datasets this engine sees are tiny (one row per completed task), so
//! this stays deliberately simple: an ensemble of depth-limited CART-style
//! regression trees, each fit on a bootstrap resample drawn from a seeded
//! `SmallRng`. Given the same seed and training set the fit is fully
//! deterministic, which the assignment policy relies on for reproducible
//! tie-breaks.
//!
//! The whole fitted forest is serde-serializable; that is the "opaque
//! artifact" the storage layer persists between runs.

use rand::{Rng, SeedableRng, rngs::SmallRng};
use serde::{Deserialize, Serialize};

use crate::features::{FEATURES, TrainingSet};

const MIN_SSE_GAIN: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn predict(&self, x: &[f64; FEATURES]) -> f64 {
        match self {
            Node::Leaf { value } => *value,
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if x[*feature] <= *threshold {
                    left.predict(x)
                } else {
                    right.predict(x)
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct RegressionTree {
    root: Node,
}

impl RegressionTree {
    fn fit(set: &TrainingSet, rows: &[usize], max_depth: u32, min_leaf: usize) -> Self {
        Self {
            root: build_node(set, rows, 0, max_depth, min_leaf),
        }
    }

    fn predict(&self, x: &[f64; FEATURES]) -> f64 {
        self.root.predict(x)
    }
}

fn mean_label(set: &TrainingSet, rows: &[usize]) -> f64 {
    let sum: f64 = rows.iter().map(|&i| set.labels[i]).sum();
    sum / rows.len() as f64
}

fn build_node(
    set: &TrainingSet,
    rows: &[usize],
    depth: u32,
    max_depth: u32,
    min_leaf: usize,
) -> Node {
    if depth >= max_depth || rows.len() < 2 * min_leaf || rows.len() < 2 {
        return Node::Leaf {
            value: mean_label(set, rows),
        };
    }

    let Some((feature, threshold)) = best_split(set, rows, min_leaf) else {
        return Node::Leaf {
            value: mean_label(set, rows),
        };
    };

    let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
        .iter()
        .copied()
        .partition(|&i| set.features[i][feature] <= threshold);

    Node::Split {
        feature,
        threshold,
        left: Box::new(build_node(set, &left_rows, depth + 1, max_depth, min_leaf)),
        right: Box::new(build_node(set, &right_rows, depth + 1, max_depth, min_leaf)),
    }
}

/// Exhaustive best split by sum-of-squared-error reduction. With only three
/// features there is no point subsampling them per split; tree diversity
/// comes from the bootstrap alone.
fn best_split(set: &TrainingSet, rows: &[usize], min_leaf: usize) -> Option<(usize, f64)> {
    let n = rows.len();
    let total_sum: f64 = rows.iter().map(|&i| set.labels[i]).sum();
    let total_sq: f64 = rows.iter().map(|&i| set.labels[i] * set.labels[i]).sum();
    let parent_sse = total_sq - total_sum * total_sum / n as f64;

    let mut best: Option<(f64, usize, f64)> = None; // (sse, feature, threshold)

    for feature in 0..FEATURES {
        let mut order = rows.to_vec();
        order.sort_by(|&a, &b| set.features[a][feature].total_cmp(&set.features[b][feature]));

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;

        for (k, &i) in order.iter().enumerate().take(n - 1) {
            left_sum += set.labels[i];
            left_sq += set.labels[i] * set.labels[i];

            let here = set.features[i][feature];
            let next = set.features[order[k + 1]][feature];
            if here == next {
                continue; // cannot split between equal values
            }
            let left_n = k + 1;
            let right_n = n - left_n;
            if left_n < min_leaf || right_n < min_leaf {
                continue;
            }

            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let sse = (left_sq - left_sum * left_sum / left_n as f64)
                + (right_sq - right_sum * right_sum / right_n as f64);

            if best.is_none_or(|(b, _, _)| sse < b) {
                best = Some((sse, feature, (here + next) / 2.0));
            }
        }
    }

    let (sse, feature, threshold) = best?;
    if parent_sse - sse < MIN_SSE_GAIN {
        return None;
    }
    Some((feature, threshold))
}

/// Ensemble regressor: bootstrap-resampled regression trees, averaged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestRegressor {
    trees: Vec<RegressionTree>,
}

#[derive(Debug, Clone, Copy)]
pub struct ForestConfig {
    pub trees: usize,
    pub max_depth: u32,
    pub min_leaf: usize,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            trees: 50,
            max_depth: 6,
            min_leaf: 1,
            seed: 42,
        }
    }
}

impl ForestRegressor {
    /// Fit on a non-empty training set. Deterministic for a fixed
    /// (config.seed, set) pair.
    pub fn fit(set: &TrainingSet, config: ForestConfig) -> Self {
        let n = set.len();
        let mut rng = SmallRng::seed_from_u64(config.seed);

        let trees = (0..config.trees)
            .map(|_| {
                let rows: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                RegressionTree::fit(set, &rows, config.max_depth, config.min_leaf)
            })
            .collect();

        Self { trees }
    }

    /// Mean prediction across trees. Not clamped; the scorer owns the
    /// [0, 1] output contract.
    pub fn predict(&self, x: &[f64; FEATURES]) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict(x)).sum();
        sum / self.trees.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(rows: &[([f64; 3], f64)]) -> TrainingSet {
        TrainingSet {
            features: rows.iter().map(|(x, _)| *x).collect(),
            labels: rows.iter().map(|(_, y)| *y).collect(),
        }
    }

    #[test]
    fn constant_labels_predict_that_constant() {
        let s = set(&[
            ([1.0, 0.2, 5.0], 0.6),
            ([2.0, 0.8, 10.0], 0.6),
            ([3.0, 0.5, 8.0], 0.6),
        ]);
        let f = ForestRegressor::fit(&s, ForestConfig::default());
        assert!((f.predict(&[1.5, 0.4, 7.0]) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn separates_two_users() {
        // User 1 succeeds, user 2 does not; the forest should pull
        // predictions for each user toward their own history.
        let s = set(&[
            ([1.0, 0.5, 10.0], 0.9),
            ([1.0, 0.6, 8.0], 0.85),
            ([1.0, 0.4, 12.0], 0.95),
            ([2.0, 0.5, 10.0], 0.2),
            ([2.0, 0.6, 8.0], 0.25),
            ([2.0, 0.4, 12.0], 0.15),
        ]);
        let f = ForestRegressor::fit(&s, ForestConfig::default());
        let good = f.predict(&[1.0, 0.5, 10.0]);
        let poor = f.predict(&[2.0, 0.5, 10.0]);
        assert!(good > poor, "expected {good} > {poor}");
        assert!(good > 0.6);
        assert!(poor < 0.5);
    }

    #[test]
    fn fit_is_deterministic_for_a_fixed_seed() {
        let s = set(&[
            ([1.0, 0.5, 10.0], 0.9),
            ([2.0, 0.5, 10.0], 0.2),
            ([3.0, 0.7, 6.0], 0.5),
        ]);
        let a = ForestRegressor::fit(&s, ForestConfig::default());
        let b = ForestRegressor::fit(&s, ForestConfig::default());
        assert_eq!(a, b);
        assert_eq!(a.predict(&[2.0, 0.5, 10.0]), b.predict(&[2.0, 0.5, 10.0]));
    }

    #[test]
    fn single_row_fits_a_stump() {
        let s = set(&[([1.0, 0.5, 10.0], 0.62)]);
        let f = ForestRegressor::fit(&s, ForestConfig::default());
        assert!((f.predict(&[9.0, 0.1, 2.0]) - 0.62).abs() < 1e-12);
    }

    #[test]
    fn serde_round_trip_preserves_predictions() {
        let s = set(&[
            ([1.0, 0.5, 10.0], 0.9),
            ([2.0, 0.5, 10.0], 0.2),
            ([3.0, 0.7, 6.0], 0.5),
        ]);
        let f = ForestRegressor::fit(&s, ForestConfig::default());
        let json = serde_json::to_string(&f).unwrap();
        let g: ForestRegressor = serde_json::from_str(&json).unwrap();
        assert_eq!(f, g);
    }
}
