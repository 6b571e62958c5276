//! Leak-free feature encoding
//!
//! Provides the encoding stage of an experiment:
//! - Label derivation from the raw target (`LabelRule`)
//! - Min-max normalization with an explicit out-of-range policy
//! - One-hot encoding with a first-appearance vocabulary
//! - Pass-through of numeric and boolean fields
//! - Fixed-order concatenation into one feature vector
//!
//! Every transform is fit on the train partition only and produces an
//! immutable [`TransformState`]; applying a state never mutates it.

mod encoder;
mod label;
mod pipeline;
mod scaler;

pub use encoder::OneHotEncoder;
pub use label::LabelRule;
pub use pipeline::{EncodedSet, EncodingPipeline, FittedPipeline};
pub use scaler::{MinMaxNormalizer, RangePolicy};

use crate::data::{FieldKind, Record, Schema};
use crate::error::{HarnessError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named encoding step that can be fit on training records
pub trait Transform: fmt::Debug + Send + Sync {
    /// Output name, referenced by the concatenation order
    fn name(&self) -> &str;

    /// Learn parameters from the train partition
    fn fit(&self, schema: &Schema, train: &[Record]) -> Result<TransformState>;
}

/// Fitted parameters of one transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransformState {
    MinMax {
        name: String,
        field: String,
        min: f64,
        max: f64,
        policy: RangePolicy,
    },
    OneHot {
        name: String,
        field: String,
        categories: Vec<String>,
    },
    PassThrough {
        name: String,
        field: String,
    },
}

impl TransformState {
    pub fn name(&self) -> &str {
        match self {
            TransformState::MinMax { name, .. }
            | TransformState::OneHot { name, .. }
            | TransformState::PassThrough { name, .. } => name,
        }
    }

    /// Number of values this state contributes to the feature vector
    pub fn width(&self) -> usize {
        match self {
            TransformState::OneHot { categories, .. } => categories.len(),
            TransformState::MinMax { .. } | TransformState::PassThrough { .. } => 1,
        }
    }

    /// Names of the produced feature columns
    pub fn feature_names(&self) -> Vec<String> {
        match self {
            TransformState::MinMax { name, .. } | TransformState::PassThrough { name, .. } => {
                vec![name.clone()]
            }
            TransformState::OneHot { name, categories, .. } => categories
                .iter()
                .map(|c| format!("{}={}", name, c))
                .collect(),
        }
    }

    /// Append the encoded values for `record` to `out`
    pub fn apply(&self, record: &Record, out: &mut Vec<f64>) -> Result<()> {
        match self {
            TransformState::MinMax { field, min, max, policy, .. } => {
                let x = numeric(record, field)?;
                out.push(scaler::normalize(x, *min, *max, *policy));
            }
            TransformState::OneHot { field, categories, .. } => {
                let key = record.field(field)?.key();
                let hit = categories.iter().position(|c| *c == key);
                out.extend((0..categories.len()).map(|i| if Some(i) == hit { 1.0 } else { 0.0 }));
            }
            TransformState::PassThrough { field, .. } => {
                out.push(numeric(record, field)?);
            }
        }
        Ok(())
    }
}

fn numeric(record: &Record, field: &str) -> Result<f64> {
    let value = record.field(field)?;
    value.as_f64().ok_or_else(|| {
        HarnessError::Validation(format!("field '{}' is not numeric: '{}'", field, value))
    })
}

/// Resolve `field` in `schema` and check its kind is one of `allowed`
pub(crate) fn expect_kind(
    schema: &Schema,
    field: &str,
    transform: &str,
    allowed: &[FieldKind],
) -> Result<()> {
    let def = schema
        .field(field)
        .ok_or_else(|| HarnessError::FeatureNotFound(field.to_string()))?;
    if !allowed.contains(&def.kind) {
        return Err(HarnessError::Validation(format!(
            "{} cannot be applied to {:?} field '{}'",
            transform, def.kind, field
        )));
    }
    if schema.target().name == field {
        return Err(HarnessError::Validation(format!(
            "target field '{}' cannot be used as a feature",
            field
        )));
    }
    Ok(())
}

/// Copies a numeric or boolean field as a single scalar (booleans as 0.0/1.0)
#[derive(Debug, Clone)]
pub struct PassThrough {
    name: String,
    field: String,
}

impl PassThrough {
    pub fn new(field: &str) -> Self {
        Self { name: field.to_string(), field: field.to_string() }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
}

impl Transform for PassThrough {
    fn name(&self) -> &str {
        &self.name
    }

    fn fit(&self, schema: &Schema, _train: &[Record]) -> Result<TransformState> {
        expect_kind(
            schema,
            &self.field,
            "pass-through",
            &[FieldKind::Numeric, FieldKind::Boolean],
        )?;
        Ok(TransformState::PassThrough {
            name: self.name.clone(),
            field: self.field.clone(),
        })
    }
}
