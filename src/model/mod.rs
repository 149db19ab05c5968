//! Seeded random-forest classifier and its supporting pieces: stratified
//! splitting, binary classification metrics, and the gini tree the forest
//! aggregates.

mod forest;
mod metrics;
mod split;
mod tree;

pub use forest::RandomForest;
pub use metrics::{accuracy, classification_report, ClassMetrics, ClassificationReport};
pub use split::stratified_split;
pub use tree::DecisionTree;
