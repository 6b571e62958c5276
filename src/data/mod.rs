//! Typed tabular records
//!
//! Provides the row model shared by every stage of an experiment:
//! - An explicit ordinal → (name, kind) schema with one target column
//! - Immutable records holding one typed value per schema field
//! - CSV loading, descriptive exploration and seeded train/test splitting

mod explorer;
mod loader;
mod split;

pub use explorer::{DatasetSummary, Explorer, NumericSummary, TargetBucket};
pub use loader::{Dataset, DatasetLoader};
pub use split::{Partition, Split, Splitter, DEFAULT_TEST_FRACTION};

use crate::error::{HarnessError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Kind of a schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Numeric,
    Categorical,
    /// 0/1 or true/false
    Boolean,
}

/// A single typed cell
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Bool(bool),
}

impl FieldValue {
    /// Parse a raw (already trimmed) cell according to the declared kind
    pub fn parse(kind: FieldKind, raw: &str) -> std::result::Result<Self, String> {
        match kind {
            FieldKind::Numeric => match raw.parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(FieldValue::Number(v)),
                _ => Err(format!("'{}' is not a finite number", raw)),
            },
            FieldKind::Categorical => Ok(FieldValue::Text(raw.to_string())),
            FieldKind::Boolean => parse_bool(raw)
                .map(FieldValue::Bool)
                .ok_or_else(|| format!("'{}' is not a boolean (expected 0/1/true/false)", raw)),
        }
    }

    /// The zero value used when a field has no declared default
    pub fn zero(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Numeric => FieldValue::Number(0.0),
            FieldKind::Categorical => FieldValue::Text(String::new()),
            FieldKind::Boolean => FieldValue::Bool(false),
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Number(_) => FieldKind::Numeric,
            FieldValue::Text(_) => FieldKind::Categorical,
            FieldValue::Bool(_) => FieldKind::Boolean,
        }
    }

    /// Numeric view; booleans map to 0.0 / 1.0
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(v) => Some(*v),
            FieldValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            FieldValue::Text(_) => None,
        }
    }

    /// Canonical text form, used as a vocabulary key.
    ///
    /// Integral numbers drop the fractional part so that `3` and `3.0`
    /// name the same category.
    pub fn key(&self) -> String {
        match self {
            FieldValue::Number(v) => {
                if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
                    format!("{}", *v as i64)
                } else {
                    format!("{}", v)
                }
            }
            FieldValue::Text(s) => s.clone(),
            FieldValue::Bool(b) => b.to_string(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

/// One column of the schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub ordinal: usize,
    pub name: String,
    pub kind: FieldKind,
}

/// Explicit ordinal → (name, kind) table with one designated target column
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    fields: Vec<FieldDef>,
    index: HashMap<String, usize>,
    target: usize,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Validate and build a schema.
    ///
    /// Ordinals must cover `0..n` exactly once, names must be unique and the
    /// target must name one of the fields.
    pub fn new(mut fields: Vec<FieldDef>, target: &str) -> Result<Self> {
        if fields.is_empty() {
            return Err(HarnessError::Validation("schema has no fields".to_string()));
        }
        fields.sort_by_key(|f| f.ordinal);

        let mut index = HashMap::with_capacity(fields.len());
        for (i, field) in fields.iter().enumerate() {
            if field.ordinal != i {
                return Err(HarnessError::Validation(format!(
                    "schema ordinals must be contiguous from 0; found {} at position {}",
                    field.ordinal, i
                )));
            }
            if index.insert(field.name.clone(), i).is_some() {
                return Err(HarnessError::Validation(format!(
                    "duplicate field name '{}'",
                    field.name
                )));
            }
        }

        let target = *index
            .get(target)
            .ok_or_else(|| HarnessError::FeatureNotFound(target.to_string()))?;

        Ok(Self { fields, index, target })
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Number of columns a source row must carry
    pub fn column_count(&self) -> usize {
        self.fields.len()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.position(name).map(|i| &self.fields[i])
    }

    pub fn target(&self) -> &FieldDef {
        &self.fields[self.target]
    }

    pub(crate) fn target_position(&self) -> usize {
        self.target
    }

    /// Numeric fields other than the target
    pub fn numeric_fields(&self) -> impl Iterator<Item = &FieldDef> {
        let target = self.target;
        self.fields
            .iter()
            .enumerate()
            .filter(move |(i, f)| *i != target && f.kind == FieldKind::Numeric)
            .map(|(_, f)| f)
    }
}

/// Builder for [`Schema`], one call per column in ordinal order
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: Vec<FieldDef>,
    target: Option<String>,
}

impl SchemaBuilder {
    fn push(mut self, kind: FieldKind, name: &str) -> Self {
        let ordinal = self.fields.len();
        self.fields.push(FieldDef { ordinal, name: name.to_string(), kind });
        self
    }

    pub fn numeric(self, name: &str) -> Self {
        self.push(FieldKind::Numeric, name)
    }

    pub fn categorical(self, name: &str) -> Self {
        self.push(FieldKind::Categorical, name)
    }

    pub fn boolean(self, name: &str) -> Self {
        self.push(FieldKind::Boolean, name)
    }

    /// Add the raw target column
    pub fn target(mut self, kind: FieldKind, name: &str) -> Self {
        self.target = Some(name.to_string());
        self.push(kind, name)
    }

    pub fn build(self) -> Result<Schema> {
        let target = self
            .target
            .ok_or_else(|| HarnessError::Validation("schema has no target column".to_string()))?;
        Schema::new(self.fields, &target)
    }
}

/// One immutable source row
#[derive(Debug, Clone)]
pub struct Record {
    schema: Arc<Schema>,
    values: Vec<FieldValue>,
}

impl Record {
    /// Build a record from values in ordinal order
    pub fn new(schema: Arc<Schema>, values: Vec<FieldValue>) -> Result<Self> {
        if values.len() != schema.column_count() {
            return Err(HarnessError::ShapeError {
                expected: format!("{} fields", schema.column_count()),
                actual: format!("{} fields", values.len()),
            });
        }
        for (field, value) in schema.fields().iter().zip(values.iter()) {
            if field.kind != value.kind() {
                return Err(HarnessError::Validation(format!(
                    "field '{}' is {:?} but got {:?} value '{}'",
                    field.name,
                    field.kind,
                    value.kind(),
                    value
                )));
            }
        }
        Ok(Self { schema, values })
    }

    /// Build a record from named values, filling omitted fields from
    /// `defaults` and then from the kind's zero value. A field named twice
    /// is rejected.
    pub fn with_defaults<I, S>(
        schema: Arc<Schema>,
        defaults: &HashMap<String, FieldValue>,
        values: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (S, FieldValue)>,
        S: AsRef<str>,
    {
        let mut row: Vec<Option<FieldValue>> = vec![None; schema.column_count()];
        for (name, value) in values {
            let name = name.as_ref();
            let pos = schema
                .position(name)
                .ok_or_else(|| HarnessError::FeatureNotFound(name.to_string()))?;
            if row[pos].replace(value).is_some() {
                return Err(HarnessError::Validation(format!(
                    "field '{}' given more than once",
                    name
                )));
            }
        }

        let values = schema
            .fields()
            .iter()
            .zip(row)
            .map(|(field, value)| {
                value
                    .or_else(|| defaults.get(&field.name).cloned())
                    .unwrap_or_else(|| FieldValue::zero(field.kind))
            })
            .collect();

        Self::new(schema, values)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.schema.position(name).map(|i| &self.values[i])
    }

    /// Like [`Record::get`] but a missing field is an error
    pub fn field(&self, name: &str) -> Result<&FieldValue> {
        self.get(name)
            .ok_or_else(|| HarnessError::FeatureNotFound(name.to_string()))
    }

    /// The raw target value
    pub fn target(&self) -> &FieldValue {
        &self.values[self.schema.target_position()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Arc<Schema> {
        Arc::new(
            Schema::builder()
                .numeric("age")
                .categorical("city")
                .boolean("member")
                .target(FieldKind::Categorical, "label")
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_schema_rejects_gaps_and_duplicates() {
        let gap = vec![
            FieldDef { ordinal: 0, name: "a".into(), kind: FieldKind::Numeric },
            FieldDef { ordinal: 2, name: "b".into(), kind: FieldKind::Numeric },
        ];
        assert!(Schema::new(gap, "a").is_err());

        let dup = vec![
            FieldDef { ordinal: 0, name: "a".into(), kind: FieldKind::Numeric },
            FieldDef { ordinal: 1, name: "a".into(), kind: FieldKind::Numeric },
        ];
        assert!(Schema::new(dup, "a").is_err());
    }

    #[test]
    fn test_numeric_fields_exclude_target() {
        let schema = Schema::builder()
            .numeric("x")
            .target(FieldKind::Numeric, "y")
            .build()
            .unwrap();
        let names: Vec<_> = schema.numeric_fields().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["x"]);
    }

    #[test]
    fn test_record_kind_mismatch() {
        let values = vec![
            FieldValue::Text("oops".into()),
            FieldValue::Text("NYC".into()),
            FieldValue::Bool(true),
            FieldValue::Text("yes".into()),
        ];
        assert!(Record::new(schema(), values).is_err());
    }

    #[test]
    fn test_with_defaults_fills_omitted_fields() {
        let mut defaults = HashMap::new();
        defaults.insert("city".to_string(), FieldValue::Text("Paris".into()));

        let record = Record::with_defaults(
            schema(),
            &defaults,
            vec![("age", FieldValue::Number(31.0))],
        )
        .unwrap();

        assert_eq!(record.get("age"), Some(&FieldValue::Number(31.0)));
        assert_eq!(record.get("city"), Some(&FieldValue::Text("Paris".into())));
        assert_eq!(record.get("member"), Some(&FieldValue::Bool(false)));
        assert_eq!(record.target(), &FieldValue::Text(String::new()));
    }

    #[test]
    fn test_with_defaults_unknown_field() {
        let result = Record::with_defaults(
            schema(),
            &HashMap::new(),
            vec![("height", FieldValue::Number(1.8))],
        );
        assert!(matches!(result, Err(HarnessError::FeatureNotFound(_))));
    }

    #[test]
    fn test_with_defaults_rejects_repeated_field() {
        let result = Record::with_defaults(
            schema(),
            &HashMap::new(),
            vec![("age", FieldValue::Number(30.0)), ("age", FieldValue::Number(40.0))],
        );
        assert!(matches!(result, Err(HarnessError::Validation(_))));
    }

    #[test]
    fn test_value_parsing_and_keys() {
        assert_eq!(FieldValue::parse(FieldKind::Numeric, "3").unwrap().key(), "3");
        assert_eq!(FieldValue::parse(FieldKind::Numeric, "2.5").unwrap().key(), "2.5");
        assert_eq!(
            FieldValue::parse(FieldKind::Boolean, "TRUE").unwrap(),
            FieldValue::Bool(true)
        );
        assert!(FieldValue::parse(FieldKind::Boolean, "maybe").is_err());
        assert!(FieldValue::parse(FieldKind::Numeric, "?").is_err());
    }
}
