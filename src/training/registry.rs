//! Named candidate trainers in registration order

use super::gradient_boosting::GradientBoostingClassifier;
use super::linear_models::LogisticRegression;
use super::models::{TrainedModel, Trainer};
use super::naive_bayes::GaussianNaiveBayes;
use super::TrainingConfig;
use crate::error::{HarnessError, Result};

pub const LOGISTIC_REGRESSION: &str = "Logistic Regression";
pub const GRADIENT_BOOSTING: &str = "Gradient Boosting";
pub const GAUSSIAN_NAIVE_BAYES: &str = "Gaussian Naive Bayes";

pub(crate) struct Candidate<M> {
    pub(crate) name: String,
    pub(crate) trainer: Box<dyn Trainer<Model = M>>,
}

/// Ordered set of uniquely named trainers producing models of type `M`
pub struct TrainerRegistry<M> {
    candidates: Vec<Candidate<M>>,
}

impl<M> Default for TrainerRegistry<M> {
    fn default() -> Self {
        Self { candidates: Vec::new() }
    }
}

impl<M> TrainerRegistry<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a candidate; names must be unique
    pub fn register<T>(&mut self, name: &str, trainer: T) -> Result<()>
    where
        T: Trainer<Model = M> + 'static,
    {
        if self.candidates.iter().any(|c| c.name == name) {
            return Err(HarnessError::Validation(format!(
                "candidate '{}' is already registered",
                name
            )));
        }
        self.candidates.push(Candidate {
            name: name.to_string(),
            trainer: Box::new(trainer),
        });
        Ok(())
    }

    /// Builder form of [`TrainerRegistry::register`]
    pub fn with<T>(mut self, name: &str, trainer: T) -> Result<Self>
    where
        T: Trainer<Model = M> + 'static,
    {
        self.register(name, trainer)?;
        Ok(self)
    }

    pub fn names(&self) -> Vec<&str> {
        self.candidates.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub(crate) fn candidates(&self) -> &[Candidate<M>] {
        &self.candidates
    }
}

impl TrainerRegistry<TrainedModel> {
    /// The three built-in candidates, seeded and thresholded from config
    pub fn default_candidates(config: &TrainingConfig, seed: u64, threshold: f64) -> Result<Self> {
        let mut boosting = config.boosting.clone();
        boosting.random_state = Some(seed);

        Self::new()
            .with(
                LOGISTIC_REGRESSION,
                LogisticRegression::new(config.logistic.clone()).with_threshold(threshold),
            )?
            .with(
                GRADIENT_BOOSTING,
                GradientBoostingClassifier::new(boosting).with_threshold(threshold),
            )?
            .with(
                GAUSSIAN_NAIVE_BAYES,
                GaussianNaiveBayes::new(config.naive_bayes.clone()).with_threshold(threshold),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_candidates_order() {
        let registry =
            TrainerRegistry::default_candidates(&TrainingConfig::default(), 42, 0.5).unwrap();
        assert_eq!(
            registry.names(),
            vec![LOGISTIC_REGRESSION, GRADIENT_BOOSTING, GAUSSIAN_NAIVE_BAYES]
        );
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = TrainerRegistry::new();
        registry.register("a", LogisticRegression::default()).unwrap();
        assert!(registry.register("a", GaussianNaiveBayes::default()).is_err());
        assert_eq!(registry.len(), 1);
    }
}
