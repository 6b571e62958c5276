//! End-to-end experiment orchestration
//!
//! load → explore → split → fit pipeline and candidates → select → hand off
//! the winner as a [`ModelHandle`]. Each stage is also callable on its own so
//! the CLI can narrate progress between them.

use crate::config::ExperimentConfig;
use crate::data::{Dataset, DatasetSummary, Explorer, Partition, Splitter};
use crate::datasets::DatasetDescriptor;
use crate::error::{CandidateFailure, Result};
use crate::export::ModelArtifact;
use crate::inference::ModelHandle;
use crate::training::{
    BinaryMetrics, MultiModelTrainer, TrainedModel, TrainerRegistry, TrainingRun,
};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// One leaderboard row
#[derive(Debug, Clone)]
pub struct LeaderboardEntry {
    pub name: String,
    pub accuracy: f64,
    pub metrics: BinaryMetrics,
    pub training_time: Duration,
}

/// What an experiment produced
#[derive(Debug, Clone)]
pub struct ExperimentReport {
    pub summary: DatasetSummary,
    pub train_rows: usize,
    pub test_rows: usize,
    /// Surviving candidates in registration order
    pub leaderboard: Vec<LeaderboardEntry>,
    pub best_index: usize,
    pub failures: Vec<CandidateFailure>,
    /// The selected model, in the `Fit` state
    pub handle: ModelHandle,
}

impl ExperimentReport {
    pub fn best(&self) -> &LeaderboardEntry {
        &self.leaderboard[self.best_index]
    }
}

/// A dataset descriptor paired with one configuration
#[derive(Debug, Clone)]
pub struct Experiment {
    descriptor: DatasetDescriptor,
    config: ExperimentConfig,
}

impl Experiment {
    pub fn new(descriptor: DatasetDescriptor, config: ExperimentConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { descriptor, config })
    }

    pub fn descriptor(&self) -> &DatasetDescriptor {
        &self.descriptor
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    pub fn load(&self, path: impl AsRef<Path>) -> Result<Dataset> {
        self.descriptor
            .loader()
            .with_max_rows(self.config.max_rows)
            .load(path)
    }

    /// Summarize the first `explore_rows` records
    pub fn explore(&self, dataset: &Dataset) -> DatasetSummary {
        let n = dataset.len().min(self.config.explore_rows);
        Explorer::summarize(&dataset.records()[..n])
    }

    pub fn split(&self, dataset: &Dataset) -> Result<Partition> {
        let split = Splitter::split(dataset.len(), self.config.test_fraction, self.config.seed)?;
        info!(
            train = split.train_indices.len(),
            test = split.test_indices.len(),
            seed = self.config.seed,
            "Split dataset"
        );
        Ok(split.partition(dataset.records()))
    }

    /// Fit the encoding pipeline on `partition.train` and run every built-in
    /// candidate, scoring on `partition.test`
    pub fn train(&self, partition: &Partition) -> Result<TrainingRun<TrainedModel>> {
        let registry = TrainerRegistry::default_candidates(
            &self.config.training,
            self.config.seed,
            self.config.inference.classification_threshold,
        )?;
        let pipeline = self.descriptor.pipeline(self.config.range_policy);
        MultiModelTrainer::new(registry)
            .with_parallel(self.config.parallel_candidates)
            .run(&pipeline, &partition.train, &partition.test)
    }

    /// Turn a finished run into a report holding the selected model
    pub fn conclude(
        &self,
        summary: DatasetSummary,
        partition: &Partition,
        run: TrainingRun<TrainedModel>,
    ) -> ExperimentReport {
        let leaderboard = run
            .leaderboard
            .iter()
            .map(|r| LeaderboardEntry {
                name: r.name.clone(),
                accuracy: r.accuracy,
                metrics: r.metrics.clone(),
                training_time: r.training_time,
            })
            .collect();
        let best_index = run.best_index;
        let failures = run.failures.clone();

        let (pipeline, best) = run.into_best();
        let artifact = ModelArtifact::new(
            &self.descriptor.name,
            &best.name,
            best.metrics,
            pipeline,
            best.model,
        );

        ExperimentReport {
            summary,
            train_rows: partition.train.len(),
            test_rows: partition.test.len(),
            leaderboard,
            best_index,
            failures,
            handle: ModelHandle::fit(artifact),
        }
    }

    /// Run every stage on an already loaded dataset
    pub fn run_dataset(&self, dataset: &Dataset) -> Result<ExperimentReport> {
        let summary = self.explore(dataset);
        let partition = self.split(dataset)?;
        let run = self.train(&partition)?;
        Ok(self.conclude(summary, &partition, run))
    }

    pub fn run(&self, path: impl AsRef<Path>) -> Result<ExperimentReport> {
        let dataset = self.load(path)?;
        self.run_dataset(&dataset)
    }
}
