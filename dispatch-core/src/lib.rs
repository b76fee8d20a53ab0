//! dispatch-core: assignment/learning loop for task dispatching.
//!
//! Store -> feature builder -> scorer training; store + scorer -> assignment
//! policy -> progress tracker; completions feed the result log back into the
//! next retrain. The `Engine` facade ties the loop to a `Storage` backend.

pub mod engine;
pub mod error;
pub mod features;
pub mod forest;
pub mod policy;
pub mod progress;
pub mod record;
pub mod scorer;
pub mod stats;
pub mod store;

pub use engine::{CompletionSummary, Engine, Storage};
pub use error::EngineError;
pub use features::{TrainingSet, build_training_set, success_label};
pub use forest::{ForestConfig, ForestRegressor};
pub use policy::{Assignment, pick_best};
pub use progress::{ProgressRecord, ProgressStatus, ProgressTracker, ProgressUpdate};
pub use record::{ResultRecord, Task, User};
pub use scorer::Scorer;
pub use stats::{
    ActiveAssignment, DashboardSnapshot, SkillEntry, SkillLevel, Totals, UserPerformance,
};
pub use store::Store;
