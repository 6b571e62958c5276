//! Gradient boosting on the logistic loss
//!
//! Boosted shallow regression trees fit to the gradient and hessian of the
//! log loss, with seeded row subsampling per round.

use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use super::decision_tree::{RegressionTree, SortedColumns, TreeParams};
use super::models::{
    check_training_data, check_width, from_margin, sigmoid, Prediction, TrainedModel, Trainer,
};
use crate::error::{HarnessError, Result};

/// Gradient Boosting configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradientBoostingConfig {
    /// Number of boosting rounds (trees)
    pub n_estimators: usize,
    /// Learning rate (shrinkage)
    pub learning_rate: f64,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Minimum samples per leaf
    pub min_samples_leaf: usize,
    /// Subsample ratio for each tree
    pub subsample: f64,
    /// L2 regularization on leaf values
    pub reg_lambda: f64,
    /// Random seed
    pub random_state: Option<u64>,
}

impl Default for GradientBoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 4,
            min_samples_leaf: 10,
            subsample: 0.8,
            reg_lambda: 1.0,
            random_state: Some(42),
        }
    }
}

/// Gradient Boosting Classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingClassifier {
    config: GradientBoostingConfig,
    pub threshold: f64,
    trees: Vec<RegressionTree>,
    initial_log_odds: f64,
    n_features: usize,
}

impl Default for GradientBoostingClassifier {
    fn default() -> Self {
        Self::new(GradientBoostingConfig::default())
    }
}

impl GradientBoostingClassifier {
    pub fn new(config: GradientBoostingConfig) -> Self {
        Self {
            config,
            threshold: 0.5,
            trees: Vec::new(),
            initial_log_odds: 0.0,
            n_features: 0,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn config(&self) -> &GradientBoostingConfig {
        &self.config
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Fit binary classification
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_training_data(x, y)?;
        if !(self.config.subsample > 0.0 && self.config.subsample <= 1.0) {
            return Err(HarnessError::TrainingError(format!(
                "subsample must be in (0, 1], got {}",
                self.config.subsample
            )));
        }
        let n_samples = x.nrows();

        // Clipped so that single-class data still yields a finite start
        let p = y.mean().unwrap_or(0.5).clamp(1e-6, 1.0 - 1e-6);
        self.initial_log_odds = (p / (1.0 - p)).ln();
        self.n_features = x.ncols();
        self.trees.clear();

        let mut log_odds = Array1::from_elem(n_samples, self.initial_log_odds);
        let mut rng = match self.config.random_state {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        let sorted = SortedColumns::new(x);
        let params = TreeParams {
            max_depth: self.config.max_depth,
            min_samples_leaf: self.config.min_samples_leaf,
            reg_lambda: self.config.reg_lambda,
        };

        let mut gradients = vec![0.0; n_samples];
        let mut hessians = vec![0.0; n_samples];
        for _ in 0..self.config.n_estimators {
            for i in 0..n_samples {
                let prob = sigmoid(log_odds[i]);
                gradients[i] = prob - y[i];
                hessians[i] = (prob * (1.0 - prob)).max(1e-16);
            }

            let in_sample = self.subsample_mask(n_samples, &mut rng);
            let tree = RegressionTree::fit(x, &sorted, &gradients, &hessians, &in_sample, &params);

            // Every row moves, not just the sampled ones
            for (i, row) in x.rows().into_iter().enumerate() {
                log_odds[i] += self.config.learning_rate * tree.predict_row(row);
            }
            self.trees.push(tree);
        }

        if !log_odds.iter().all(|v| v.is_finite()) {
            return Err(HarnessError::TrainingError("gradient boosting diverged".to_string()));
        }
        Ok(())
    }

    /// Log-odds for one encoded row
    pub fn decision_function(&self, row: ArrayView1<'_, f64>) -> Result<f64> {
        if self.trees.is_empty() && self.n_features == 0 {
            return Err(HarnessError::ModelNotReady("gradient boosting is not fitted".to_string()));
        }
        check_width(&row, self.n_features)?;
        Ok(self.trees.iter().fold(self.initial_log_odds, |acc, tree| {
            acc + self.config.learning_rate * tree.predict_row(row)
        }))
    }

    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> Result<Prediction> {
        Ok(from_margin(self.decision_function(row)?, self.threshold))
    }

    fn subsample_mask(&self, n: usize, rng: &mut Xoshiro256PlusPlus) -> Vec<bool> {
        if self.config.subsample >= 1.0 {
            return vec![true; n];
        }
        let sample_size = ((n as f64) * self.config.subsample).ceil() as usize;
        let mut mask = vec![false; n];
        for i in rand::seq::index::sample(rng, n, sample_size.min(n)) {
            mask[i] = true;
        }
        mask
    }
}

impl Trainer for GradientBoostingClassifier {
    type Model = TrainedModel;

    fn train(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<TrainedModel> {
        let mut model = self.clone();
        model.fit(x, y)?;
        Ok(TrainedModel::GradientBoosting(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_classification_data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_vec((100, 2), (0..200).map(|i| i as f64 * 0.1).collect())
            .unwrap();
        let y: Array1<f64> = x
            .rows()
            .into_iter()
            .map(|row| if row[0] + row[1] > 10.0 { 1.0 } else { 0.0 })
            .collect();
        (x, y)
    }

    fn accuracy(model: &GradientBoostingClassifier, x: &Array2<f64>, y: &Array1<f64>) -> f64 {
        let correct = x
            .rows()
            .into_iter()
            .zip(y.iter())
            .filter(|(row, &t)| model.predict_row(*row).unwrap().label == (t == 1.0))
            .count();
        correct as f64 / y.len() as f64
    }

    #[test]
    fn test_gradient_boosting_classifier() {
        let (x, y) = create_classification_data();
        let config = GradientBoostingConfig {
            n_estimators: 20,
            max_depth: 3,
            min_samples_leaf: 2,
            ..Default::default()
        };
        let mut model = GradientBoostingClassifier::new(config);
        model.fit(&x, &y).unwrap();

        assert_eq!(model.n_trees(), 20);
        let acc = accuracy(&model, &x, &y);
        assert!(acc > 0.9, "Accuracy ({}) should be above 90%", acc);
    }

    #[test]
    fn test_same_seed_same_model() {
        let (x, y) = create_classification_data();
        let config = GradientBoostingConfig { n_estimators: 5, ..Default::default() };

        let mut a = GradientBoostingClassifier::new(config.clone());
        let mut b = GradientBoostingClassifier::new(config);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();

        for row in x.rows() {
            assert_eq!(
                a.decision_function(row).unwrap().to_bits(),
                b.decision_function(row).unwrap().to_bits()
            );
        }
    }

    #[test]
    fn test_single_class_is_finite() {
        let x = Array2::from_shape_vec((4, 1), vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        let y = Array1::from_elem(4, 1.0);
        let mut model = GradientBoostingClassifier::new(GradientBoostingConfig {
            n_estimators: 3,
            ..Default::default()
        });
        model.fit(&x, &y).unwrap();
        let p = model.predict_row(x.row(0)).unwrap();
        assert!(p.probability.is_finite());
        assert!(p.label);
    }

    #[test]
    fn test_rejects_bad_subsample() {
        let (x, y) = create_classification_data();
        let mut model = GradientBoostingClassifier::new(GradientBoostingConfig {
            subsample: 0.0,
            ..Default::default()
        });
        assert!(model.fit(&x, &y).is_err());
    }
}
