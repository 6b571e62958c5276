//! Built-in dataset descriptors
//!
//! A descriptor binds a schema, an encoding recipe, interactive defaults and
//! demo rows to one shared experiment core. `income` and `bike` ship with
//! the crate; [`lookup`] resolves them by name.

mod bike;
mod income;

use crate::data::{DatasetLoader, FieldValue, Record, Schema};
use crate::error::{HarnessError, Result};
use crate::inference::{InferenceConfig, InteractiveSession};
use crate::preprocessing::{EncodingPipeline, RangePolicy};
use std::collections::HashMap;
use std::sync::Arc;

/// Names accepted by [`lookup`]
pub const DATASET_NAMES: &[&str] = &["income", "bike"];

/// A named demo row, predicted after training
#[derive(Debug, Clone)]
pub struct DemoExample {
    pub title: String,
    pub values: Vec<(String, FieldValue)>,
}

impl DemoExample {
    pub fn new(title: &str, values: Vec<(&str, FieldValue)>) -> Self {
        Self {
            title: title.to_string(),
            values: values
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        }
    }
}

/// Everything the harness needs to run one dataset
#[derive(Debug, Clone)]
pub struct DatasetDescriptor {
    pub name: String,
    pub title: String,
    pub schema: Arc<Schema>,
    pub defaults: HashMap<String, FieldValue>,
    pub examples: Vec<DemoExample>,
    pub positive_name: String,
    pub negative_name: String,
    pipeline: fn(RangePolicy) -> EncodingPipeline,
}

impl DatasetDescriptor {
    /// Unfitted encoding recipe for this dataset
    pub fn pipeline(&self, policy: RangePolicy) -> EncodingPipeline {
        (self.pipeline)(policy)
    }

    pub fn loader(&self) -> DatasetLoader {
        DatasetLoader::new(Arc::clone(&self.schema))
    }

    /// Demo rows as full records, omitted fields taken from the defaults
    pub fn example_records(&self) -> Result<Vec<(String, Record)>> {
        self.examples
            .iter()
            .map(|example| {
                let record = Record::with_defaults(
                    Arc::clone(&self.schema),
                    &self.defaults,
                    example.values.iter().map(|(n, v)| (n.as_str(), v.clone())),
                )?;
                Ok((example.title.clone(), record))
            })
            .collect()
    }

    pub fn session(&self, config: &InferenceConfig) -> InteractiveSession {
        InteractiveSession::new(Arc::clone(&self.schema))
            .with_defaults(self.defaults.clone())
            .with_sentinel(&config.sentinel)
            .with_labels(&self.positive_name, &self.negative_name)
    }
}

/// Resolve a built-in descriptor by name
pub fn lookup(name: &str) -> Result<DatasetDescriptor> {
    match name.trim().to_ascii_lowercase().as_str() {
        "income" => income::descriptor(),
        "bike" => bike::descriptor(),
        other => Err(HarnessError::Validation(format!(
            "unknown dataset '{}', expected one of: {}",
            other,
            DATASET_NAMES.join(", ")
        ))),
    }
}

fn defaults(values: Vec<(&str, FieldValue)>) -> HashMap<String, FieldValue> {
    values
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

fn text(s: &str) -> FieldValue {
    FieldValue::Text(s.to_string())
}

fn num(v: f64) -> FieldValue {
    FieldValue::Number(v)
}
