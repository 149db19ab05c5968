//! End-to-end pipeline tests: ingest a labeled CSV, train a tenant's
//! model, score new leads, and exercise registry persistence across
//! process-like restarts (fresh registries over the same directory).

use calificar::config::EngineConfig;
use calificar::ingest::Ingestor;
use calificar::registry::{FsStore, ModelKey, ModelRegistry};
use calificar::scoring::{self, ReportStatus};
use tempfile::TempDir;

/// Twelve leads, six per class, with a clean signal in `score` and a
/// categorical `source` column. Classes interleave so `lead_id` carries
/// no signal.
const TRAINING_CSV: &str = "\
lead_id,source,score,converted
1,web,10,0
2,ads,80,1
3,web,12,0
4,referral,82,1
5,referral,15,0
6,web,85,1
7,web,18,0
8,ads,88,1
9,ads,20,0
10,referral,90,1
11,referral,22,0
12,web,95,1
";

const SCORING_CSV: &str = "\
lead_id,source,score
101,web,11
102,ads,90
";

fn setup(dir: &TempDir) -> (ModelRegistry, EngineConfig) {
    let config = EngineConfig {
        model_dir: dir.path().to_path_buf(),
        n_estimators: 20,
        ..EngineConfig::default()
    };
    let registry = ModelRegistry::new(FsStore::new(dir.path()));
    (registry, config)
}

fn train_acme(registry: &ModelRegistry, config: &EngineConfig) -> scoring::TrainingReport {
    let ingested = Ingestor::new()
        .ingest_csv_bytes(TRAINING_CSV.as_bytes())
        .unwrap();
    scoring::train(registry, config, "acme", &ingested.frame, "converted")
}

#[test]
fn test_train_succeeds_with_stratified_holdout() {
    let dir = TempDir::new().unwrap();
    let (registry, config) = setup(&dir);

    let report = train_acme(&registry, &config);
    assert_eq!(report.status, ReportStatus::Success);
    // 12 rows, 0.2 per class: one holdout row per class.
    assert_eq!(report.test_samples, 2);
    assert_eq!(report.training_samples, 10);
    assert!(report.train_accuracy.unwrap() > 0.8);
    assert!(report.classification_report.is_some());
    assert!(!report.feature_importance.is_empty());
}

#[test]
fn test_predict_scores_every_row() {
    let dir = TempDir::new().unwrap();
    let (registry, config) = setup(&dir);
    train_acme(&registry, &config);

    let batch = Ingestor::new()
        .ingest_csv_bytes(SCORING_CSV.as_bytes())
        .unwrap();
    let predictions = scoring::predict(&registry, &config, "acme", &batch.frame);

    assert_eq!(predictions.len(), 2);
    assert!(predictions
        .iter()
        .all(|p| p.status == ReportStatus::Success));
    assert_eq!(predictions[0].id, "101");
    assert_eq!(predictions[1].id, "102");
    // Low score looks less like a conversion than a high one.
    assert!(predictions[0].probability.unwrap() < predictions[1].probability.unwrap());
    assert_eq!(predictions[1].label, Some(1));
}

#[test]
fn test_reload_from_disk_scores_identically() {
    let dir = TempDir::new().unwrap();
    let (registry, config) = setup(&dir);
    train_acme(&registry, &config);

    let batch = Ingestor::new()
        .ingest_csv_bytes(SCORING_CSV.as_bytes())
        .unwrap();
    let before = scoring::predict(&registry, &config, "acme", &batch.frame);

    // Fresh registry over the same directory: lazy load from artifacts.
    let reloaded = ModelRegistry::new(FsStore::new(dir.path()));
    let after = scoring::predict(&reloaded, &config, "acme", &batch.frame);

    let probs = |ps: &[scoring::Prediction]| -> Vec<f64> {
        ps.iter().map(|p| p.probability.unwrap()).collect()
    };
    assert_eq!(probs(&before), probs(&after));
}

#[test]
fn test_load_all_warms_cache() {
    let dir = TempDir::new().unwrap();
    let (registry, config) = setup(&dir);
    train_acme(&registry, &config);

    let fresh = ModelRegistry::new(FsStore::new(dir.path()));
    let keys = fresh.load_all().unwrap();
    assert_eq!(keys.len(), 1);
    assert!(fresh.contains(&ModelKey::lead_scoring("acme")));
}

#[test]
fn test_unseen_category_scores_without_error() {
    let dir = TempDir::new().unwrap();
    let (registry, config) = setup(&dir);
    train_acme(&registry, &config);

    let batch = Ingestor::new()
        .ingest_csv_bytes("lead_id,source,score\n201,billboard,85\n".as_bytes())
        .unwrap();
    let predictions = scoring::predict(&registry, &config, "acme", &batch.frame);

    assert_eq!(predictions.len(), 1);
    assert_eq!(predictions[0].status, ReportStatus::Success);
    assert!(predictions[0].probability.is_some());
}

#[test]
fn test_untrained_tenant_gets_error_rows() {
    let dir = TempDir::new().unwrap();
    let (registry, config) = setup(&dir);

    let batch = Ingestor::new()
        .ingest_csv_bytes(SCORING_CSV.as_bytes())
        .unwrap();
    let predictions = scoring::predict(&registry, &config, "nobody", &batch.frame);

    assert_eq!(predictions.len(), 2);
    for p in &predictions {
        assert_eq!(p.status, ReportStatus::Error);
        assert!(p.message.as_deref().unwrap().contains("nobody"));
        assert!(p.probability.is_none());
    }
}

#[test]
fn test_too_few_rows_reports_insufficient_data() {
    let dir = TempDir::new().unwrap();
    let (registry, config) = setup(&dir);

    let small = "\
lead_id,score,converted
1,10,0
2,15,0
3,20,0
4,25,0
5,80,1
6,85,1
7,90,1
8,95,1
";
    let ingested = Ingestor::new().ingest_csv_bytes(small.as_bytes()).unwrap();
    let report = scoring::train(&registry, &config, "acme", &ingested.frame, "converted");

    assert_eq!(report.status, ReportStatus::Error);
    let message = report.message.unwrap();
    assert!(message.contains('8'), "message was: {message}");
    assert!(!registry.contains(&ModelKey::lead_scoring("acme")));
}

#[test]
fn test_missing_label_column_reports_error() {
    let dir = TempDir::new().unwrap();
    let (registry, config) = setup(&dir);

    let ingested = Ingestor::new()
        .ingest_csv_bytes(SCORING_CSV.as_bytes())
        .unwrap();
    let report = scoring::train(&registry, &config, "acme", &ingested.frame, "converted");

    assert_eq!(report.status, ReportStatus::Error);
    assert!(report.message.unwrap().contains("converted"));
}

#[test]
fn test_tenants_are_isolated() {
    let dir = TempDir::new().unwrap();
    let (registry, config) = setup(&dir);
    train_acme(&registry, &config);

    let batch = Ingestor::new()
        .ingest_csv_bytes(SCORING_CSV.as_bytes())
        .unwrap();
    let other = scoring::predict(&registry, &config, "globex", &batch.frame);
    assert!(other.iter().all(|p| p.status == ReportStatus::Error));

    let own = scoring::predict(&registry, &config, "acme", &batch.frame);
    assert!(own.iter().all(|p| p.status == ReportStatus::Success));
}

#[test]
fn test_retrain_replaces_model() {
    let dir = TempDir::new().unwrap();
    let (registry, config) = setup(&dir);

    let first = train_acme(&registry, &config);
    let second = train_acme(&registry, &config);
    assert_eq!(first.status, ReportStatus::Success);
    assert_eq!(second.status, ReportStatus::Success);

    // Same data and seed: the committed model scores identically.
    let batch = Ingestor::new()
        .ingest_csv_bytes(SCORING_CSV.as_bytes())
        .unwrap();
    let predictions = scoring::predict(&registry, &config, "acme", &batch.frame);
    assert!(predictions.iter().all(|p| p.status == ReportStatus::Success));
}

#[test]
fn test_ingest_is_idempotent() {
    let a = Ingestor::new()
        .ingest_csv_bytes(TRAINING_CSV.as_bytes())
        .unwrap();
    let b = Ingestor::new()
        .ingest_csv_bytes(TRAINING_CSV.as_bytes())
        .unwrap();
    assert_eq!(a.frame.rows(), b.frame.rows());
    assert_eq!(a.data_type, b.data_type);
    assert_eq!(a.record_count, b.record_count);
}
