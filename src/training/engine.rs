//! Multi-model training and selection
//!
//! Fits the encoding pipeline on the train partition, trains every
//! registered candidate on the encoded train set, scores each on the encoded
//! test set and selects the most accurate one.

use super::evaluator::{BinaryMetrics, Evaluator};
use super::models::{Classifier, Trainer};
use super::registry::{Candidate, TrainerRegistry};
use crate::data::Record;
use crate::error::{CandidateFailure, HarnessError, Result};
use crate::preprocessing::{EncodedSet, EncodingPipeline, FittedPipeline};
use ndarray::Array1;
use rayon::prelude::*;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// One successfully trained and evaluated candidate
#[derive(Debug, Clone)]
pub struct CandidateResult<M> {
    pub name: String,
    pub model: M,
    /// Accuracy on the test partition
    pub accuracy: f64,
    pub metrics: BinaryMetrics,
    pub training_time: Duration,
}

/// Outcome of [`MultiModelTrainer::run`]
#[derive(Debug, Clone)]
pub struct TrainingRun<M> {
    pub pipeline: FittedPipeline,
    /// Surviving candidates in registration order
    pub leaderboard: Vec<CandidateResult<M>>,
    /// Index of the selected candidate in `leaderboard`
    pub best_index: usize,
    pub failures: Vec<CandidateFailure>,
}

impl<M> TrainingRun<M> {
    pub fn best(&self) -> &CandidateResult<M> {
        &self.leaderboard[self.best_index]
    }

    /// Consume the run, keeping the fitted pipeline and the selected candidate
    pub fn into_best(mut self) -> (FittedPipeline, CandidateResult<M>) {
        let best = self.leaderboard.swap_remove(self.best_index);
        (self.pipeline, best)
    }
}

/// Trains every registered candidate and picks the best by test accuracy
pub struct MultiModelTrainer<M> {
    registry: TrainerRegistry<M>,
    parallel: bool,
}

impl<M> MultiModelTrainer<M>
where
    M: Classifier + Send,
{
    pub fn new(registry: TrainerRegistry<M>) -> Self {
        Self { registry, parallel: true }
    }

    /// Train candidates concurrently (results keep registration order)
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn registry(&self) -> &TrainerRegistry<M> {
        &self.registry
    }

    pub fn run(
        &self,
        pipeline: &EncodingPipeline,
        train: &[Record],
        test: &[Record],
    ) -> Result<TrainingRun<M>> {
        if self.registry.is_empty() {
            return Err(HarnessError::Validation("no candidates registered".to_string()));
        }
        if test.is_empty() {
            return Err(HarnessError::Validation("test partition is empty".to_string()));
        }

        let fitted = pipeline.fit(train)?;
        let train_set = fitted.encode(train)?;
        let test_set = fitted.encode(test)?;
        let targets = train_set.targets();
        info!(
            train_rows = train_set.len(),
            test_rows = test_set.len(),
            width = fitted.width(),
            candidates = self.registry.len(),
            "Encoded partitions"
        );

        let evaluate = |c: &Candidate<M>| evaluate_candidate(c, &train_set, &targets, &test_set);
        let outcomes: Vec<std::result::Result<CandidateResult<M>, CandidateFailure>> =
            if self.parallel {
                self.registry.candidates().par_iter().map(evaluate).collect()
            } else {
                self.registry.candidates().iter().map(evaluate).collect()
            };

        let mut leaderboard = Vec::new();
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(result) => {
                    info!(
                        candidate = %result.name,
                        accuracy = result.accuracy,
                        elapsed_ms = result.training_time.as_millis() as u64,
                        "Candidate evaluated"
                    );
                    leaderboard.push(result);
                }
                Err(failure) => {
                    warn!(candidate = %failure.name, reason = %failure.reason, "Candidate failed");
                    failures.push(failure);
                }
            }
        }

        if leaderboard.is_empty() {
            return Err(HarnessError::AllCandidatesFailed(failures));
        }

        let best_index = select_best(&leaderboard);
        info!(
            candidate = %leaderboard[best_index].name,
            accuracy = leaderboard[best_index].accuracy,
            "Selected model"
        );

        Ok(TrainingRun { pipeline: fitted, leaderboard, best_index, failures })
    }
}

/// Highest accuracy; the earliest registered candidate wins ties
fn select_best<M>(leaderboard: &[CandidateResult<M>]) -> usize {
    let mut best = 0;
    for (i, r) in leaderboard.iter().enumerate().skip(1) {
        if r.accuracy > leaderboard[best].accuracy {
            best = i;
        }
    }
    best
}

fn evaluate_candidate<M: Classifier>(
    candidate: &Candidate<M>,
    train: &EncodedSet,
    targets: &Array1<f64>,
    test: &EncodedSet,
) -> std::result::Result<CandidateResult<M>, CandidateFailure> {
    let start = Instant::now();
    let fail = |reason: String| CandidateFailure { name: candidate.name.clone(), reason };

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| -> Result<(M, BinaryMetrics)> {
        let model = candidate.trainer.train(&train.features, targets)?;
        let predictions = model.predict(&test.features)?;
        if predictions.len() != test.len() {
            return Err(HarnessError::ShapeError {
                expected: format!("{} predictions", test.len()),
                actual: format!("{} predictions", predictions.len()),
            });
        }
        let metrics = Evaluator::evaluate(&predictions, &test.labels)?;
        Ok((model, metrics))
    }));

    match outcome {
        Ok(Ok((model, metrics))) => {
            let accuracy = metrics
                .accuracy
                .ok_or_else(|| fail("accuracy is undefined".to_string()))?;
            Ok(CandidateResult {
                name: candidate.name.clone(),
                model,
                accuracy,
                metrics,
                training_time: start.elapsed(),
            })
        }
        Ok(Err(e)) => Err(fail(e.to_string())),
        Err(payload) => Err(fail(format!("panicked: {}", panic_message(payload.as_ref())))),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, accuracy: f64) -> CandidateResult<()> {
        CandidateResult {
            name: name.to_string(),
            model: (),
            accuracy,
            metrics: Evaluator::evaluate(&[], &[]).unwrap(),
            training_time: Duration::ZERO,
        }
    }

    #[test]
    fn test_select_best_prefers_earliest_on_tie() {
        let board = vec![result("a", 0.8), result("b", 0.9), result("c", 0.9)];
        assert_eq!(select_best(&board), 1);
        let board = vec![result("a", 0.7)];
        assert_eq!(select_best(&board), 0);
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
    }
}
