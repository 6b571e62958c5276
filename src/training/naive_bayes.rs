//! Gaussian Naive Bayes for binary targets

use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::models::{
    check_training_data, check_width, from_margin, Prediction, TrainedModel, Trainer,
};
use crate::error::{HarnessError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NaiveBayesConfig {
    /// Fraction of the largest feature variance added to every variance
    pub var_smoothing: f64,
}

impl Default for NaiveBayesConfig {
    fn default() -> Self {
        Self { var_smoothing: 1e-9 }
    }
}

/// Per-class Gaussian parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ClassStats {
    prior: f64,
    means: Vec<f64>,
    variances: Vec<f64>,
}

/// Gaussian Naive Bayes Classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaussianNaiveBayes {
    config: NaiveBayesConfig,
    pub threshold: f64,
    /// Index 0 = negative class, 1 = positive class
    classes: Option<[ClassStats; 2]>,
}

impl Default for GaussianNaiveBayes {
    fn default() -> Self {
        Self::new(NaiveBayesConfig::default())
    }
}

impl GaussianNaiveBayes {
    pub fn new(config: NaiveBayesConfig) -> Self {
        Self {
            config,
            threshold: 0.5,
            classes: None,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Fit the classifier
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_training_data(x, y)?;
        let n_samples = x.nrows();
        let n_features = x.ncols();

        // Single-pass Welford's algorithm for mean and variance, per class
        let mut counts = [0usize; 2];
        let mut means = [vec![0.0; n_features], vec![0.0; n_features]];
        let mut m2 = [vec![0.0; n_features], vec![0.0; n_features]];
        for (row, &target) in x.rows().into_iter().zip(y.iter()) {
            let c = usize::from(target > 0.5);
            counts[c] += 1;
            let count = counts[c] as f64;
            for (j, &val) in row.iter().enumerate() {
                let delta = val - means[c][j];
                means[c][j] += delta / count;
                let delta2 = val - means[c][j];
                m2[c][j] += delta * delta2;
            }
        }

        if counts.iter().any(|&c| c == 0) {
            return Err(HarnessError::TrainingError(
                "naive bayes needs both classes in the training set".to_string(),
            ));
        }

        // Smoothing is relative to the largest overall feature variance
        let max_var = x
            .columns()
            .into_iter()
            .map(|col| col.var(0.0))
            .fold(0.0f64, f64::max);
        let epsilon = (self.config.var_smoothing * max_var).max(1e-12);

        let [mean0, mean1] = means;
        let [m2_0, m2_1] = m2;
        let stats = |mean: Vec<f64>, m2: Vec<f64>, count: usize| ClassStats {
            prior: count as f64 / n_samples as f64,
            variances: m2.iter().map(|&v| v / count as f64 + epsilon).collect(),
            means: mean,
        };
        self.classes = Some([stats(mean0, m2_0, counts[0]), stats(mean1, m2_1, counts[1])]);
        Ok(())
    }

    fn joint_log_likelihood(stats: &ClassStats, row: &ArrayView1<'_, f64>) -> f64 {
        row.iter()
            .zip(stats.means.iter())
            .zip(stats.variances.iter())
            .fold(stats.prior.ln(), |acc, ((&xi, &mean), &var)| {
                acc - 0.5 * ((xi - mean).powi(2) / var + var.ln() + (2.0 * PI).ln())
            })
    }

    /// Log posterior odds of the positive class
    pub fn decision_function(&self, row: ArrayView1<'_, f64>) -> Result<f64> {
        let [neg, pos] = self.classes.as_ref().ok_or_else(|| {
            HarnessError::ModelNotReady("naive bayes is not fitted".to_string())
        })?;
        check_width(&row, pos.means.len())?;
        Ok(Self::joint_log_likelihood(pos, &row) - Self::joint_log_likelihood(neg, &row))
    }

    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> Result<Prediction> {
        Ok(from_margin(self.decision_function(row)?, self.threshold))
    }
}

impl Trainer for GaussianNaiveBayes {
    type Model = TrainedModel;

    fn train(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<TrainedModel> {
        let mut model = self.clone();
        model.fit(x, y)?;
        Ok(TrainedModel::GaussianNaiveBayes(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_gaussian_nb_separates_clusters() {
        let x = array![
            [1.0, 2.0],
            [1.2, 1.8],
            [0.8, 2.2],
            [5.0, 6.0],
            [5.2, 5.8],
            [4.8, 6.2]
        ];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];

        let mut model = GaussianNaiveBayes::default();
        model.fit(&x, &y).unwrap();

        for (row, &target) in x.rows().into_iter().zip(y.iter()) {
            assert_eq!(model.predict_row(row).unwrap().label, target == 1.0);
        }
        let mid = model.predict_row(array![3.0, 4.0].view()).unwrap();
        assert!(mid.probability > 0.0 && mid.probability < 1.0);
    }

    #[test]
    fn test_constant_feature_does_not_blow_up() {
        let x = array![[1.0, 0.0], [1.0, 0.1], [1.0, 0.9], [1.0, 1.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];
        let mut model = GaussianNaiveBayes::default();
        model.fit(&x, &y).unwrap();
        let p = model.predict_row(x.row(3)).unwrap();
        assert!(p.probability.is_finite());
        assert!(p.label);
    }

    #[test]
    fn test_requires_both_classes() {
        let x = array![[1.0], [2.0]];
        let y = array![1.0, 1.0];
        let mut model = GaussianNaiveBayes::default();
        assert!(matches!(model.fit(&x, &y), Err(HarnessError::TrainingError(_))));
    }
}
