//! Model training module
//!
//! Provides candidate training and selection:
//! - `Trainer` / `Classifier` traits for pluggable candidates
//! - Built-in logistic regression, gradient boosting and Gaussian Naive Bayes
//! - A registry of named candidates in registration order
//! - Binary classification metrics (accuracy, AUC, F1, per-class precision/recall)
//! - `MultiModelTrainer`, which fits, isolates, evaluates and selects candidates

mod config;
mod engine;
mod evaluator;
mod models;
mod registry;
pub mod decision_tree;
pub mod gradient_boosting;
pub mod linear_models;
pub mod naive_bayes;

pub use config::TrainingConfig;
pub use engine::{CandidateResult, MultiModelTrainer, TrainingRun};
pub use evaluator::{BinaryMetrics, ConfusionMatrix, Evaluator};
pub use gradient_boosting::{GradientBoostingClassifier, GradientBoostingConfig};
pub use linear_models::{LogisticConfig, LogisticRegression};
pub use models::{Classifier, Prediction, TrainedModel, Trainer};
pub use naive_bayes::{GaussianNaiveBayes, NaiveBayesConfig};
pub use registry::{TrainerRegistry, GAUSSIAN_NAIVE_BAYES, GRADIENT_BOOSTING, LOGISTIC_REGRESSION};
