//! Lifecycle of the selected model

use super::engine::PredictionEngine;
use crate::error::{HarnessError, Result};
use crate::export::ModelArtifact;
use crate::training::{Classifier, TrainedModel};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Where a model is in its lifecycle.
///
/// `Unfit -> Fit -> Persisted -> Loaded`. Predictions are served only from
/// `Fit` and `Loaded`; every other state reports [`HarnessError::ModelNotReady`].
#[derive(Debug, Clone)]
pub enum ModelHandle<M = TrainedModel> {
    Unfit,
    Fit(Box<ModelArtifact<M>>),
    Persisted(PathBuf),
    Loaded(Box<ModelArtifact<M>>),
}

impl<M> Default for ModelHandle<M> {
    fn default() -> Self {
        ModelHandle::Unfit
    }
}

impl<M> ModelHandle<M>
where
    M: Classifier + Clone + Serialize + DeserializeOwned,
{
    pub fn fit(artifact: ModelArtifact<M>) -> Self {
        ModelHandle::Fit(Box::new(artifact))
    }

    /// Load straight from disk
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        ModelHandle::Persisted(path.as_ref().to_path_buf()).load()
    }

    pub fn state(&self) -> &'static str {
        match self {
            ModelHandle::Unfit => "unfit",
            ModelHandle::Fit(_) => "fit",
            ModelHandle::Persisted(_) => "persisted",
            ModelHandle::Loaded(_) => "loaded",
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ModelHandle::Fit(_) | ModelHandle::Loaded(_))
    }

    /// The in-memory artifact, if any
    pub fn artifact(&self) -> Option<&ModelArtifact<M>> {
        match self {
            ModelHandle::Fit(a) | ModelHandle::Loaded(a) => Some(a),
            _ => None,
        }
    }

    /// Write the in-memory model to `path`
    pub fn persist(self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match self {
            ModelHandle::Fit(artifact) | ModelHandle::Loaded(artifact) => {
                artifact.save(path)?;
                Ok(ModelHandle::Persisted(path.to_path_buf()))
            }
            other => Err(HarnessError::ModelNotReady(format!(
                "cannot persist a {} model",
                other.state()
            ))),
        }
    }

    /// Read a persisted model back into memory
    pub fn load(self) -> Result<Self> {
        match self {
            ModelHandle::Persisted(path) => {
                let artifact = ModelArtifact::load(&path)?;
                Ok(ModelHandle::Loaded(Box::new(artifact)))
            }
            loaded @ ModelHandle::Loaded(_) => Ok(loaded),
            other => Err(HarnessError::ModelNotReady(format!(
                "cannot load a {} model",
                other.state()
            ))),
        }
    }

    pub fn engine(&self) -> Result<PredictionEngine<M>> {
        match self.artifact() {
            Some(a) => Ok(PredictionEngine::new(a.pipeline.clone(), a.model.clone())),
            None => Err(HarnessError::ModelNotReady(format!(
                "model is {}; fit or load it first",
                self.state()
            ))),
        }
    }
}
