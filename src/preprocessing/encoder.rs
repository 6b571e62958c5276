//! One-hot encoding

use super::{expect_kind, Transform, TransformState};
use crate::data::{FieldKind, Record, Schema};
use crate::error::Result;
use std::collections::HashSet;

/// One-hot encoder over the canonical text form of a field.
///
/// The vocabulary is taken from the train partition in first-appearance
/// order. Categories never seen during fit encode as the all-zero vector.
#[derive(Debug, Clone)]
pub struct OneHotEncoder {
    name: String,
    field: String,
}

impl OneHotEncoder {
    pub fn new(field: &str) -> Self {
        Self { name: field.to_string(), field: field.to_string() }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
}

impl Transform for OneHotEncoder {
    fn name(&self) -> &str {
        &self.name
    }

    fn fit(&self, schema: &Schema, train: &[Record]) -> Result<TransformState> {
        expect_kind(
            schema,
            &self.field,
            "one-hot encoding",
            &[FieldKind::Categorical, FieldKind::Numeric, FieldKind::Boolean],
        )?;

        let mut seen = HashSet::new();
        let mut categories = Vec::new();
        for record in train {
            let key = record.field(&self.field)?.key();
            if seen.insert(key.clone()) {
                categories.push(key);
            }
        }

        Ok(TransformState::OneHot {
            name: self.name.clone(),
            field: self.field.clone(),
            categories,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FieldValue;
    use std::sync::Arc;

    fn schema() -> Arc<Schema> {
        Arc::new(
            Schema::builder()
                .categorical("color")
                .numeric("season")
                .target(FieldKind::Boolean, "y")
                .build()
                .unwrap(),
        )
    }

    fn record(schema: &Arc<Schema>, color: &str, season: f64) -> Record {
        Record::new(
            Arc::clone(schema),
            vec![
                FieldValue::Text(color.into()),
                FieldValue::Number(season),
                FieldValue::Bool(true),
            ],
        )
        .unwrap()
    }

    fn encode(state: &TransformState, record: &Record) -> Vec<f64> {
        let mut out = Vec::new();
        state.apply(record, &mut out).unwrap();
        out
    }

    #[test]
    fn test_vocabulary_in_first_appearance_order() {
        let schema = schema();
        let train = vec![
            record(&schema, "red", 1.0),
            record(&schema, "blue", 2.0),
            record(&schema, "red", 3.0),
            record(&schema, "green", 1.0),
        ];
        let state = OneHotEncoder::new("color").fit(&schema, &train).unwrap();
        assert_eq!(state.width(), 3);
        assert_eq!(
            state.feature_names(),
            vec!["color=red", "color=blue", "color=green"]
        );

        for r in &train {
            let v = encode(&state, r);
            assert_eq!(v.iter().filter(|&&x| x == 1.0).count(), 1);
            assert_eq!(v.iter().filter(|&&x| x == 0.0).count(), 2);
        }
        assert_eq!(encode(&state, &train[1]), vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_unseen_category_is_all_zero() {
        let schema = schema();
        let train = vec![record(&schema, "red", 1.0), record(&schema, "blue", 2.0)];
        let state = OneHotEncoder::new("color").fit(&schema, &train).unwrap();
        assert_eq!(encode(&state, &record(&schema, "purple", 1.0)), vec![0.0, 0.0]);
    }

    #[test]
    fn test_numeric_field_uses_canonical_text() {
        let schema = schema();
        let train = vec![record(&schema, "red", 3.0), record(&schema, "red", 1.0)];
        let state = OneHotEncoder::new("season").fit(&schema, &train).unwrap();
        assert_eq!(state.feature_names(), vec!["season=3", "season=1"]);
        assert_eq!(encode(&state, &record(&schema, "red", 1.0)), vec![0.0, 1.0]);
    }
}
