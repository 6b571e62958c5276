//! Model artifact persistence
//!
//! An artifact bundles the fitted encoding pipeline, the selected model and a
//! short report (dataset, candidate name, test metrics, feature names) into
//! one JSON document. Writes go to a sibling temporary file that is renamed
//! into place, so a reader never observes a partial artifact.

use crate::error::{HarnessError, Result};
use crate::preprocessing::FittedPipeline;
use crate::training::{BinaryMetrics, TrainedModel};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

pub const FORMAT_VERSION: u32 = 1;

/// Everything needed to serve predictions after a restart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact<M = TrainedModel> {
    pub format_version: u32,
    pub dataset: String,
    pub candidate: String,
    pub metrics: BinaryMetrics,
    pub feature_names: Vec<String>,
    pub pipeline: FittedPipeline,
    pub model: M,
}

impl<M> ModelArtifact<M>
where
    M: Serialize + DeserializeOwned,
{
    pub fn new(
        dataset: &str,
        candidate: &str,
        metrics: BinaryMetrics,
        pipeline: FittedPipeline,
        model: M,
    ) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            dataset: dataset.to_string(),
            candidate: candidate.to_string(),
            metrics,
            feature_names: pipeline.feature_names().to_vec(),
            pipeline,
            model,
        }
    }

    /// Write the artifact atomically to `path`
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let tmp = temp_path(path);

        let written = (|| -> Result<()> {
            let file = File::create(&tmp)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, self)?;
            writer.flush()?;
            writer
                .into_inner()
                .map_err(|e| HarnessError::Io(e.into_error()))?
                .sync_all()?;
            fs::rename(&tmp, path)?;
            Ok(())
        })();

        if written.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        written?;

        info!(path = %path.display(), candidate = %self.candidate, "Saved model artifact");
        Ok(())
    }

    /// Read an artifact written by [`ModelArtifact::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            HarnessError::Load(format!("cannot open model '{}': {}", path.display(), e))
        })?;
        let artifact: Self = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            HarnessError::Load(format!("cannot read model '{}': {}", path.display(), e))
        })?;

        if artifact.format_version != FORMAT_VERSION {
            return Err(HarnessError::Load(format!(
                "model '{}' has format version {}, expected {}",
                path.display(),
                artifact.format_version,
                FORMAT_VERSION
            )));
        }
        info!(path = %path.display(), candidate = %artifact.candidate, "Loaded model artifact");
        Ok(artifact)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}
