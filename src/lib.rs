//! Tabular harness - binary classification experiments on tabular data
//!
//! This crate provides the pieces of a leak-free train/evaluate/serve loop:
//! - Typed CSV loading, exploration and seeded train/test splitting
//! - An encoding pipeline fitted on the train partition only
//! - Several candidate classifiers trained, isolated and compared on the
//!   test partition, with the most accurate one selected
//! - Persistence of the fitted pipeline together with the selected model
//! - Batch and interactive prediction with the exact fitted encoding
//!
//! # Modules
//!
//! - [`data`] - Schema, records, loading, exploration, splitting
//! - [`preprocessing`] - Label rules and the encoding pipeline
//! - [`training`] - Candidates, registry, multi-model trainer, metrics
//! - [`export`] - Model artifact persistence
//! - [`inference`] - Prediction engine, model lifecycle, interactive sessions
//! - [`datasets`] - Built-in `income` and `bike` descriptors
//! - [`experiment`] - Stage-by-stage orchestration
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;
pub mod config;

// Core ML modules
pub mod data;
pub mod preprocessing;
pub mod training;
pub mod inference;
pub mod export;

// Orchestration
pub mod datasets;
pub mod experiment;
pub mod cli;

pub use error::{HarnessError, Result};

/// Prelude for common imports
pub mod prelude {
    pub use crate::config::ExperimentConfig;
    pub use crate::data::{
        Dataset, DatasetLoader, Explorer, FieldKind, FieldValue, Record, Schema, Splitter,
    };
    pub use crate::datasets::DatasetDescriptor;
    pub use crate::error::{HarnessError, Result};
    pub use crate::experiment::{Experiment, ExperimentReport};
    pub use crate::export::ModelArtifact;
    pub use crate::inference::{InferenceConfig, ModelHandle, PredictionEngine};
    pub use crate::preprocessing::{EncodingPipeline, FittedPipeline, LabelRule, RangePolicy};
    pub use crate::training::{
        BinaryMetrics, Classifier, Evaluator, MultiModelTrainer, Prediction, TrainedModel,
        Trainer, TrainerRegistry, TrainingConfig,
    };
}
