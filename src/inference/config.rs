//! Inference configuration

use serde::{Deserialize, Serialize};

/// Configuration for model inference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Threshold on the positive-class probability for the built-in models
    pub classification_threshold: f64,

    /// Input that ends an interactive session (case-insensitive)
    pub sentinel: String,

    /// Score batches on the rayon pool
    pub parallel_batch: bool,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            classification_threshold: 0.5,
            sentinel: "exit".to_string(),
            parallel_batch: true,
        }
    }
}

impl InferenceConfig {
    /// Create a new inference configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set classification threshold
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.classification_threshold = threshold;
        self
    }

    pub fn with_sentinel(mut self, sentinel: &str) -> Self {
        self.sentinel = sentinel.to_string();
        self
    }

    pub fn with_parallel_batch(mut self, parallel: bool) -> Self {
        self.parallel_batch = parallel;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = InferenceConfig::default();
        assert_eq!(config.classification_threshold, 0.5);
        assert_eq!(config.sentinel, "exit");
    }

    #[test]
    fn test_builder_pattern() {
        let config = InferenceConfig::new()
            .with_threshold(0.7)
            .with_sentinel("quit")
            .with_parallel_batch(false);

        assert_eq!(config.classification_threshold, 0.7);
        assert_eq!(config.sentinel, "quit");
        assert!(!config.parallel_batch);
    }
}
