//! Tenant-facing train and predict procedures. Both report failures in
//! their return values; neither raises past its boundary.

mod predict;
mod train;

pub use predict::{predict, Prediction};
pub use train::{train, ReportStatus, TrainingReport};
