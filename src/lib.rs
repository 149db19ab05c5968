//! Calificar: multi-tenant lead scoring
//!
//! Ingests tabular lead data (CSV, TSV, Excel or JSON records), fits
//! per-tenant preprocessing state and a seeded random-forest classifier,
//! and keeps trained artifacts in a registry backed by JSON files on
//! disk.
//!
//! The tenant-facing procedures live in [`scoring`]: [`scoring::train`]
//! and [`scoring::predict`] report failures in their return values and
//! never raise past their boundary.
//!
//! ```no_run
//! use calificar::config::EngineConfig;
//! use calificar::ingest::Ingestor;
//! use calificar::registry::{FsStore, ModelRegistry};
//! use calificar::scoring;
//!
//! let config = EngineConfig::default();
//! let registry = ModelRegistry::new(FsStore::new(&config.model_dir));
//!
//! let ingested = Ingestor::new().ingest_path("leads.csv").unwrap();
//! let report = scoring::train(&registry, &config, "acme", &ingested.frame, "converted");
//! println!("test accuracy: {:?}", report.test_accuracy);
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod frame;
pub mod ingest;
pub mod model;
pub mod preprocess;
pub mod registry;
pub mod scoring;

pub use config::EngineConfig;
pub use error::{Error, Result};
pub use frame::{Frame, Value};
pub use registry::{FsStore, ModelKey, ModelKind, ModelRegistry, TenantId};
pub use scoring::{predict, train, Prediction, TrainingReport};
