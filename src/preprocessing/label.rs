//! Label derivation from the raw target

use crate::data::{parse_bool, FieldValue, Record};
use crate::error::{HarnessError, Result};
use serde::{Deserialize, Serialize};

/// Pure, stateless mapping from a raw target value to the binary label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelRule {
    /// Positive when the trimmed text form equals the given value
    Equals(String),
    /// Target is already binary: `0/1/true/false` or a boolean
    Binary,
}

impl LabelRule {
    pub fn equals(positive: &str) -> Self {
        LabelRule::Equals(positive.trim().to_string())
    }

    pub fn apply(&self, value: &FieldValue) -> Result<bool> {
        match self {
            LabelRule::Equals(positive) => Ok(value.key().trim() == positive.trim()),
            LabelRule::Binary => match value {
                FieldValue::Bool(b) => Ok(*b),
                FieldValue::Number(v) if *v == 0.0 => Ok(false),
                FieldValue::Number(v) if *v == 1.0 => Ok(true),
                FieldValue::Text(s) => parse_bool(s)
                    .ok_or_else(|| HarnessError::InvalidLabel(format!("'{}' is not binary", s))),
                other => Err(HarnessError::InvalidLabel(format!("'{}' is not binary", other))),
            },
        }
    }

    /// Label of a record's target field
    pub fn label(&self, record: &Record) -> Result<bool> {
        self.apply(record.target())
    }
}
