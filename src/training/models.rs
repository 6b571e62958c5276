//! Model traits and the built-in model enum

use super::gradient_boosting::GradientBoostingClassifier;
use super::linear_models::LogisticRegression;
use super::naive_bayes::GaussianNaiveBayes;
use crate::error::{HarnessError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Output of a binary classifier for one row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: bool,
    /// Raw model margin (log-odds for the built-in models)
    pub score: f64,
    /// Probability of the positive class
    pub probability: f64,
}

impl Prediction {
    pub fn confidence(&self) -> f64 {
        self.probability.max(1.0 - self.probability)
    }
}

/// A fitted model that scores encoded rows
pub trait Classifier: Send + Sync {
    fn predict_row(&self, row: ArrayView1<'_, f64>) -> Result<Prediction>;

    /// Row-wise prediction, order preserving
    fn predict(&self, x: &Array2<f64>) -> Result<Vec<Prediction>> {
        x.rows().into_iter().map(|row| self.predict_row(row)).collect()
    }
}

/// A named candidate's fitting capability
pub trait Trainer: Send + Sync {
    type Model: Classifier;

    /// Fit a fresh model on encoded features and 0/1 targets
    fn train(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<Self::Model>;
}

/// Models produced by the built-in trainers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TrainedModel {
    LogisticRegression(LogisticRegression),
    GradientBoosting(GradientBoostingClassifier),
    GaussianNaiveBayes(GaussianNaiveBayes),
}

impl TrainedModel {
    pub fn kind(&self) -> &'static str {
        match self {
            TrainedModel::LogisticRegression(_) => "logistic_regression",
            TrainedModel::GradientBoosting(_) => "gradient_boosting",
            TrainedModel::GaussianNaiveBayes(_) => "gaussian_naive_bayes",
        }
    }

    pub fn threshold(&self) -> f64 {
        match self {
            TrainedModel::LogisticRegression(m) => m.threshold,
            TrainedModel::GradientBoosting(m) => m.threshold,
            TrainedModel::GaussianNaiveBayes(m) => m.threshold,
        }
    }

    /// Same fitted model with a different decision threshold
    pub fn with_threshold(self, threshold: f64) -> Self {
        match self {
            TrainedModel::LogisticRegression(m) => {
                TrainedModel::LogisticRegression(m.with_threshold(threshold))
            }
            TrainedModel::GradientBoosting(m) => {
                TrainedModel::GradientBoosting(m.with_threshold(threshold))
            }
            TrainedModel::GaussianNaiveBayes(m) => {
                TrainedModel::GaussianNaiveBayes(m.with_threshold(threshold))
            }
        }
    }
}

impl Classifier for TrainedModel {
    fn predict_row(&self, row: ArrayView1<'_, f64>) -> Result<Prediction> {
        match self {
            TrainedModel::LogisticRegression(m) => m.predict_row(row),
            TrainedModel::GradientBoosting(m) => m.predict_row(row),
            TrainedModel::GaussianNaiveBayes(m) => m.predict_row(row),
        }
    }
}

/// Numerically stable logistic function
pub(crate) fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Build a prediction from a log-odds margin
pub(crate) fn from_margin(score: f64, threshold: f64) -> Prediction {
    let probability = sigmoid(score);
    Prediction {
        label: probability >= threshold,
        score,
        probability,
    }
}

pub(crate) fn check_width(row: &ArrayView1<'_, f64>, expected: usize) -> Result<()> {
    if row.len() != expected {
        return Err(HarnessError::ShapeError {
            expected: format!("{} features", expected),
            actual: format!("{} features", row.len()),
        });
    }
    Ok(())
}

/// Shared input checks for the built-in trainers
pub(crate) fn check_training_data(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(HarnessError::ShapeError {
            expected: format!("y length = {}", x.nrows()),
            actual: format!("y length = {}", y.len()),
        });
    }
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(HarnessError::TrainingError("empty training set".to_string()));
    }
    Ok(())
}
