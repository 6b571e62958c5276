//! Experiment configuration

use crate::error::{HarnessError, Result};
use crate::inference::InferenceConfig;
use crate::preprocessing::RangePolicy;
use crate::training::TrainingConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One immutable value passed to every stage of an experiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Seed for the train/test split and seeded candidates
    pub seed: u64,

    /// Share of rows held out for evaluation, in (0, 1)
    pub test_fraction: f64,

    /// Keep at most this many rows after loading
    pub max_rows: Option<usize>,

    /// Rows summarized by the explorer
    pub explore_rows: usize,

    /// Train candidates concurrently
    pub parallel_candidates: bool,

    /// How min-max normalization treats values outside the fitted range
    pub range_policy: RangePolicy,

    pub training: TrainingConfig,
    pub inference: InferenceConfig,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            test_fraction: 0.2,
            max_rows: None,
            explore_rows: 1000,
            parallel_candidates: true,
            range_policy: RangePolicy::Clamp,
            training: TrainingConfig::default(),
            inference: InferenceConfig::default(),
        }
    }
}

impl ExperimentConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a JSON configuration; omitted keys keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            HarnessError::Load(format!("cannot read config '{}': {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|e| {
            HarnessError::Load(format!("invalid config '{}': {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(HarnessError::Validation(format!(
                "test_fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }
        if self.max_rows == Some(0) {
            return Err(HarnessError::Validation("max_rows must be positive".to_string()));
        }
        let threshold = self.inference.classification_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(HarnessError::Validation(format!(
                "classification_threshold must be in [0, 1], got {}",
                threshold
            )));
        }
        if self.training.boosting.n_estimators == 0 {
            return Err(HarnessError::Validation(
                "boosting.n_estimators must be positive".to_string(),
            ));
        }
        if !(self.training.boosting.subsample > 0.0 && self.training.boosting.subsample <= 1.0) {
            return Err(HarnessError::Validation(format!(
                "boosting.subsample must be in (0, 1], got {}",
                self.training.boosting.subsample
            )));
        }
        Ok(())
    }

    /// Builder method to set the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builder method to set the held-out fraction
    pub fn with_test_fraction(mut self, fraction: f64) -> Self {
        self.test_fraction = fraction;
        self
    }

    pub fn with_max_rows(mut self, max_rows: Option<usize>) -> Self {
        self.max_rows = max_rows;
        self
    }

    pub fn with_explore_rows(mut self, rows: usize) -> Self {
        self.explore_rows = rows;
        self
    }

    pub fn with_parallel_candidates(mut self, parallel: bool) -> Self {
        self.parallel_candidates = parallel;
        self
    }

    pub fn with_range_policy(mut self, policy: RangePolicy) -> Self {
        self.range_policy = policy;
        self
    }

    pub fn with_training(mut self, training: TrainingConfig) -> Self {
        self.training = training;
        self
    }

    pub fn with_inference(mut self, inference: InferenceConfig) -> Self {
        self.inference = inference;
        self
    }
}
