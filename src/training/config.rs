//! Hyper-parameters for the built-in candidates

use super::gradient_boosting::GradientBoostingConfig;
use super::linear_models::LogisticConfig;
use super::naive_bayes::NaiveBayesConfig;
use serde::{Deserialize, Serialize};

/// Per-candidate training configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub logistic: LogisticConfig,
    pub boosting: GradientBoostingConfig,
    pub naive_bayes: NaiveBayesConfig,
}

impl TrainingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set logistic regression parameters
    pub fn with_logistic(mut self, config: LogisticConfig) -> Self {
        self.logistic = config;
        self
    }

    /// Builder method to set gradient boosting parameters
    pub fn with_boosting(mut self, config: GradientBoostingConfig) -> Self {
        self.boosting = config;
        self
    }

    pub fn with_naive_bayes(mut self, config: NaiveBayesConfig) -> Self {
        self.naive_bayes = config;
        self
    }
}
