//! Min-max normalization

use super::{expect_kind, Transform, TransformState};
use crate::data::{FieldKind, Record, Schema};
use crate::error::{HarnessError, Result};
use serde::{Deserialize, Serialize};

/// How values outside the fitted `[min, max]` range are mapped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangePolicy {
    /// Clamp into [0, 1]
    #[default]
    Clamp,
    /// Linear extrapolation beyond [0, 1]
    Unclamped,
}

/// `(x - min) / (max - min)`; a zero-width range maps everything to 0.0
pub(crate) fn normalize(x: f64, min: f64, max: f64, policy: RangePolicy) -> f64 {
    let range = max - min;
    if range == 0.0 {
        return 0.0;
    }
    let scaled = (x - min) / range;
    match policy {
        RangePolicy::Clamp => scaled.clamp(0.0, 1.0),
        RangePolicy::Unclamped => scaled,
    }
}

/// Min-max normalizer for one numeric field
#[derive(Debug, Clone)]
pub struct MinMaxNormalizer {
    name: String,
    field: String,
    policy: RangePolicy,
}

impl MinMaxNormalizer {
    pub fn new(field: &str) -> Self {
        Self {
            name: field.to_string(),
            field: field.to_string(),
            policy: RangePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RangePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
}

impl Transform for MinMaxNormalizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn fit(&self, schema: &Schema, train: &[Record]) -> Result<TransformState> {
        expect_kind(schema, &self.field, "min-max normalization", &[FieldKind::Numeric])?;

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for record in train {
            let value = record.field(&self.field)?;
            let x = value.as_f64().ok_or_else(|| {
                HarnessError::Validation(format!(
                    "field '{}' is not numeric: '{}'",
                    self.field, value
                ))
            })?;
            min = min.min(x);
            max = max.max(x);
        }
        if !min.is_finite() || !max.is_finite() {
            return Err(HarnessError::Validation(format!(
                "cannot fit min-max on '{}' without training rows",
                self.field
            )));
        }

        Ok(TransformState::MinMax {
            name: self.name.clone(),
            field: self.field.clone(),
            min,
            max,
            policy: self.policy,
        })
    }
}
