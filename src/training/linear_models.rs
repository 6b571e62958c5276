//! Logistic regression

use super::models::{
    check_training_data, check_width, from_margin, sigmoid, Prediction, TrainedModel, Trainer,
};
use crate::error::{HarnessError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Hyper-parameters for [`LogisticRegression`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticConfig {
    /// L2 regularization strength
    pub alpha: f64,
    /// Maximum gradient descent iterations
    pub max_iter: usize,
    /// Stop when the gradient norm falls below this
    pub tol: f64,
    pub learning_rate: f64,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            alpha: 0.01,
            max_iter: 1000,
            tol: 1e-6,
            learning_rate: 0.1,
        }
    }
}

/// L2-regularized logistic regression fit by batch gradient descent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub config: LogisticConfig,
    /// Decision threshold on the positive-class probability
    pub threshold: f64,
    coefficients: Vec<f64>,
    intercept: f64,
    is_fitted: bool,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new(LogisticConfig::default())
    }
}

impl LogisticRegression {
    pub fn new(config: LogisticConfig) -> Self {
        Self {
            config,
            threshold: 0.5,
            coefficients: Vec::new(),
            intercept: 0.0,
            is_fitted: false,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Fit the model using gradient descent
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        check_training_data(x, y)?;
        let n_samples = x.nrows() as f64;

        let mut weights: Array1<f64> = Array1::zeros(x.ncols());
        let mut bias = 0.0;
        let lr = self.config.learning_rate;
        let alpha = self.config.alpha;

        for _ in 0..self.config.max_iter {
            let linear = x.dot(&weights) + bias;
            let predictions = linear.mapv(sigmoid);

            let errors = &predictions - y;
            let dw = (x.t().dot(&errors) / n_samples) + (alpha * &weights);
            let db = errors.mean().unwrap_or(0.0);

            let grad_norm = (dw.mapv(|v| v * v).sum() + db * db).sqrt();
            if grad_norm < self.config.tol {
                break;
            }

            weights = weights - lr * dw;
            bias -= lr * db;
        }

        if !bias.is_finite() || weights.iter().any(|w| !w.is_finite()) {
            return Err(HarnessError::TrainingError(
                "logistic regression diverged".to_string(),
            ));
        }

        self.coefficients = weights.to_vec();
        self.intercept = bias;
        self.is_fitted = true;
        Ok(self)
    }

    /// Log-odds for one encoded row
    pub fn decision_function(&self, row: ArrayView1<'_, f64>) -> Result<f64> {
        if !self.is_fitted {
            return Err(HarnessError::ModelNotReady(
                "logistic regression is not fitted".to_string(),
            ));
        }
        check_width(&row, self.coefficients.len())?;
        Ok(self
            .coefficients
            .iter()
            .zip(row.iter())
            .fold(self.intercept, |acc, (w, x)| acc + w * x))
    }

    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> Result<Prediction> {
        Ok(from_margin(self.decision_function(row)?, self.threshold))
    }
}

impl Trainer for LogisticRegression {
    type Model = TrainedModel;

    fn train(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<TrainedModel> {
        let mut model = self.clone();
        model.fit(x, y)?;
        Ok(TrainedModel::LogisticRegression(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn separable() -> (Array2<f64>, Array1<f64>) {
        let x = array![[0.0, 0.1], [0.1, 0.0], [0.2, 0.1], [0.9, 1.0], [1.0, 0.8], [0.8, 0.9]];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn test_logistic_regression_separates() {
        let (x, y) = separable();
        let mut model = LogisticRegression::new(LogisticConfig {
            alpha: 0.0,
            max_iter: 2000,
            learning_rate: 1.0,
            ..Default::default()
        });
        model.fit(&x, &y).unwrap();

        for (row, &target) in x.rows().into_iter().zip(y.iter()) {
            let p = model.predict_row(row).unwrap();
            assert_eq!(p.label, target == 1.0);
            assert!((0.0..=1.0).contains(&p.probability));
        }
    }

    #[test]
    fn test_unfitted_and_wrong_width() {
        let model = LogisticRegression::default();
        let row = array![0.0, 1.0];
        assert!(model.predict_row(row.view()).is_err());

        let (x, y) = separable();
        let mut model = LogisticRegression::default();
        model.fit(&x, &y).unwrap();
        let wide = array![0.0, 1.0, 2.0];
        assert!(matches!(
            model.predict_row(wide.view()),
            Err(HarnessError::ShapeError { .. })
        ));
    }

    #[test]
    fn test_shape_mismatch() {
        let (x, _) = separable();
        let y = array![0.0, 1.0];
        let mut model = LogisticRegression::default();
        assert!(model.fit(&x, &y).is_err());
    }

    #[test]
    fn test_trainer_wraps_model() {
        let (x, y) = separable();
        let trained = LogisticRegression::default().train(&x, &y).unwrap();
        assert_eq!(trained.kind(), "logistic_regression");
    }
}
