//! Prediction engine over a fitted pipeline and model

use super::interactive::{parse_line, InputLine, InteractiveSession, SessionEnd, SessionSummary};
use crate::data::Record;
use crate::error::Result;
use crate::export::ModelArtifact;
use crate::preprocessing::FittedPipeline;
use crate::training::{Classifier, Prediction, TrainedModel};
use rayon::prelude::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Serves predictions with the exact encoding the model was trained on.
///
/// Only constructible from a fitted pipeline and model, so it is always
/// ready to predict.
pub struct PredictionEngine<M = TrainedModel> {
    pipeline: Arc<FittedPipeline>,
    model: Arc<M>,
    parallel_batch: bool,
}

impl<M> Clone for PredictionEngine<M> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
            model: Arc::clone(&self.model),
            parallel_batch: self.parallel_batch,
        }
    }
}

impl<M> std::fmt::Debug for PredictionEngine<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionEngine")
            .field("width", &self.pipeline.width())
            .field("parallel_batch", &self.parallel_batch)
            .finish()
    }
}

impl<M: Classifier> PredictionEngine<M> {
    pub fn new(pipeline: FittedPipeline, model: M) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            model: Arc::new(model),
            parallel_batch: true,
        }
    }

    pub fn with_parallel_batch(mut self, parallel: bool) -> Self {
        self.parallel_batch = parallel;
        self
    }

    pub fn from_artifact(artifact: ModelArtifact<M>) -> Self
    where
        M: Serialize + DeserializeOwned,
    {
        Self::new(artifact.pipeline, artifact.model)
    }

    /// Load a persisted artifact; a missing or unreadable file is a load error
    pub fn load(path: impl AsRef<Path>) -> Result<Self>
    where
        M: Serialize + DeserializeOwned,
    {
        ModelArtifact::load(path).map(Self::from_artifact)
    }

    pub fn pipeline(&self) -> &FittedPipeline {
        &self.pipeline
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn predict_one(&self, record: &Record) -> Result<Prediction> {
        let features = self.pipeline.encode_row(record)?;
        self.model.predict_row(features.view())
    }

    /// Order-preserving batch prediction
    pub fn predict_batch(&self, records: &[Record]) -> Result<Vec<Prediction>> {
        if self.parallel_batch {
            records.par_iter().map(|r| self.predict_one(r)).collect()
        } else {
            records.iter().map(|r| self.predict_one(r)).collect()
        }
    }

    /// Read one structured input per line from `input` until the sentinel or
    /// end of input, writing a prediction (or the parse error) for each.
    pub fn run_interactive<R: BufRead, W: Write>(
        &self,
        session: &InteractiveSession,
        mut input: R,
        mut output: W,
    ) -> Result<SessionSummary> {
        let mut summary = SessionSummary::default();
        let mut buf = Vec::new();
        loop {
            write!(output, "{}", session.prompt())?;
            output.flush()?;

            buf.clear();
            if input.read_until(b'\n', &mut buf)? == 0 {
                writeln!(output)?;
                summary.ended_by = SessionEnd::EndOfInput;
                break;
            }
            let line = match std::str::from_utf8(&buf) {
                Ok(line) => line,
                Err(e) => {
                    debug!(error = %e, "Rejected non UTF-8 interactive input");
                    writeln!(output, "error: input is not valid UTF-8: {}", e)?;
                    summary.errors += 1;
                    continue;
                }
            };

            let outcome = parse_line(session, line).and_then(|parsed| match parsed {
                InputLine::Exit => Ok(None),
                InputLine::Empty => Ok(Some(None)),
                InputLine::Values(values) => {
                    let record = session.record(values)?;
                    self.predict_one(&record).map(|p| Some(Some(p)))
                }
            });

            match outcome {
                Ok(None) => {
                    summary.ended_by = SessionEnd::Sentinel;
                    break;
                }
                Ok(Some(None)) => continue,
                Ok(Some(Some(prediction))) => {
                    writeln!(output, "{}", session.describe(&prediction))?;
                    summary.predictions += 1;
                }
                Err(e) => {
                    debug!(error = %e, "Rejected interactive input");
                    writeln!(output, "error: {}", e)?;
                    summary.errors += 1;
                }
            }
        }
        Ok(summary)
    }
}
