//! Inference module
//!
//! Serves predictions from a selected model:
//! - `PredictionEngine` pairs a fitted pipeline with a model, so raw records
//!   are always encoded exactly as during training
//! - Order-preserving batch prediction (sequential or on the rayon pool)
//! - `ModelHandle` tracks the unfit / fit / persisted / loaded lifecycle
//! - Line-oriented interactive sessions with per-dataset defaults

mod config;
mod engine;
mod handle;
mod interactive;

pub use config::InferenceConfig;
pub use engine::PredictionEngine;
pub use handle::ModelHandle;
pub use interactive::{parse_line, InputLine, InteractiveSession, SessionEnd, SessionSummary};
