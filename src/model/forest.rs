//! Random forest binary classifier
//!
//! Bootstrap-aggregated gini trees with class-balance weighting and a
//! fixed seed for reproducible fits. Hyperparameters follow the lead
//! scoring defaults (100 trees, depth 10) but stay adjustable through the
//! builder methods.

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::tree::{DecisionTree, TreeParams};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    n_estimators: usize,
    max_depth: usize,
    seed: u64,
    trees: Vec<DecisionTree>,
    feature_importances: Vec<f64>,
    n_features: usize,
}

impl RandomForest {
    pub fn new_classifier(n_estimators: usize) -> Self {
        Self {
            n_estimators,
            max_depth: 10,
            seed: 42,
            trees: Vec::new(),
            feature_importances: Vec::new(),
            n_features: 0,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Fit on a dense feature matrix and binary labels.
    ///
    /// Class-balance weighting (`n / (2 * n_c)`) counters label imbalance;
    /// both classes must be present.
    pub fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<()> {
        let n_rows = x.nrows();
        if n_rows == 0 || y.len() != n_rows {
            return Err(Error::DataFormat(format!(
                "feature matrix has {n_rows} rows but {} labels",
                y.len()
            )));
        }
        let positives = y.iter().filter(|&&l| l == 1).count();
        let negatives = n_rows - positives;
        if positives == 0 || negatives == 0 {
            return Err(Error::DataFormat(
                "target must contain both classes".to_string(),
            ));
        }

        let class_weights = [
            n_rows as f64 / (2.0 * negatives as f64),
            n_rows as f64 / (2.0 * positives as f64),
        ];
        let n_features = x.ncols();
        let mtry = (n_features as f64).sqrt().round().max(1.0) as usize;
        let params = TreeParams {
            max_depth: self.max_depth,
            min_samples_split: 2,
            mtry,
            class_weights,
        };

        let mut importances = vec![0.0; n_features];
        let mut trees = Vec::with_capacity(self.n_estimators);
        for t in 0..self.n_estimators {
            let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(t as u64));
            let indices: Vec<usize> = (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect();
            trees.push(DecisionTree::fit(
                x,
                y,
                &indices,
                &params,
                &mut rng,
                &mut importances,
            ));
        }

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for v in importances.iter_mut() {
                *v /= total;
            }
        }

        self.trees = trees;
        self.feature_importances = importances;
        self.n_features = n_features;
        Ok(())
    }

    /// Positive-class probability per row (tree-averaged leaf probability).
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        if self.trees.is_empty() {
            return Err(Error::DataFormat("forest is not fitted".to_string()));
        }
        if x.ncols() != self.n_features {
            return Err(Error::PreprocessingMismatch(format!(
                "expected {} features, got {}",
                self.n_features,
                x.ncols()
            )));
        }

        let mut probs = Vec::with_capacity(x.nrows());
        let mut row_buf = vec![0.0; self.n_features];
        for row in x.rows() {
            row_buf.clear();
            row_buf.extend(row.iter().copied());
            let sum: f64 = self
                .trees
                .iter()
                .map(|t| t.predict_proba_row(&row_buf))
                .sum();
            probs.push(sum / self.trees.len() as f64);
        }
        Ok(probs)
    }

    /// Hard labels at the 0.5 threshold.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<u8>> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(|p| u8::from(p >= 0.5))
            .collect())
    }

    /// Normalized gini importances, one per feature.
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    /// Two clusters: feature 0 near 0 -> class 0, near 1 -> class 1.
    fn separable(n_per_class: usize) -> (Array2<f64>, Vec<u8>) {
        let n = n_per_class * 2;
        let x = Array2::from_shape_fn((n, 2), |(r, c)| {
            let base = if r < n_per_class { 0.0 } else { 1.0 };
            match c {
                0 => base + (r % 5) as f64 * 0.02,
                _ => (r % 7) as f64, // noise feature
            }
        });
        let y = (0..n).map(|r| u8::from(r >= n_per_class)).collect();
        (x, y)
    }

    #[test]
    fn test_fit_predict_separable() {
        let (x, y) = separable(10);
        let mut forest = RandomForest::new_classifier(25);
        forest.fit(&x, &y).unwrap();

        let preds = forest.predict(&x).unwrap();
        assert_eq!(preds, y);
    }

    #[test]
    fn test_probabilities_in_unit_interval() {
        let (x, y) = separable(10);
        let mut forest = RandomForest::new_classifier(25);
        forest.fit(&x, &y).unwrap();

        for p in forest.predict_proba(&x).unwrap() {
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (x, y) = separable(8);
        let mut a = RandomForest::new_classifier(10).with_random_state(7);
        let mut b = RandomForest::new_classifier(10).with_random_state(7);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.predict_proba(&x).unwrap(), b.predict_proba(&x).unwrap());
    }

    #[test]
    fn test_single_class_rejected() {
        let x = Array2::zeros((4, 1));
        let mut forest = RandomForest::new_classifier(5);
        assert!(forest.fit(&x, &[1, 1, 1, 1]).is_err());
    }

    #[test]
    fn test_unfitted_predict_rejected() {
        let forest = RandomForest::new_classifier(5);
        assert!(forest.predict(&Array2::zeros((1, 1))).is_err());
    }

    #[test]
    fn test_importances_favor_signal_feature() {
        let (x, y) = separable(12);
        let mut forest = RandomForest::new_classifier(25);
        forest.fit(&x, &y).unwrap();

        let imp = forest.feature_importances();
        assert_eq!(imp.len(), 2);
        assert!(imp[0] > imp[1]);
        assert!((imp.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_serialized_forest_predicts_identically() {
        let (x, y) = separable(8);
        let mut forest = RandomForest::new_classifier(10);
        forest.fit(&x, &y).unwrap();

        let json = serde_json::to_string(&forest).unwrap();
        let restored: RandomForest = serde_json::from_str(&json).unwrap();
        assert_eq!(
            forest.predict_proba(&x).unwrap(),
            restored.predict_proba(&x).unwrap()
        );
    }

    #[test]
    fn test_wrong_feature_count_is_mismatch() {
        let (x, y) = separable(8);
        let mut forest = RandomForest::new_classifier(5);
        forest.fit(&x, &y).unwrap();
        let err = forest.predict(&Array2::zeros((2, 5))).unwrap_err();
        assert!(matches!(err, Error::PreprocessingMismatch(_)));
    }
}
