//! Line-oriented prediction sessions
//!
//! Each input line is either the sentinel, a JSON object such as
//! `{"age": 39, "workclass": "Private"}` or comma-separated pairs such as
//! `age=39, workclass=Private`. Fields left out take the session defaults.

use crate::data::{FieldKind, FieldValue, Record, Schema};
use crate::error::{HarnessError, Result};
use crate::training::Prediction;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionEnd {
    Sentinel,
    #[default]
    EndOfInput,
}

/// Counters reported when a session ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionSummary {
    pub predictions: usize,
    pub errors: usize,
    pub ended_by: SessionEnd,
}

/// Schema, defaults and labels for an interactive session
#[derive(Debug, Clone)]
pub struct InteractiveSession {
    schema: Arc<Schema>,
    defaults: HashMap<String, FieldValue>,
    sentinel: String,
    prompt: String,
    positive: String,
    negative: String,
}

impl InteractiveSession {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            defaults: HashMap::new(),
            sentinel: "exit".to_string(),
            prompt: "> ".to_string(),
            positive: "positive".to_string(),
            negative: "negative".to_string(),
        }
    }

    pub fn with_defaults(mut self, defaults: HashMap<String, FieldValue>) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_sentinel(mut self, sentinel: &str) -> Self {
        self.sentinel = sentinel.to_string();
        self
    }

    pub fn with_prompt(mut self, prompt: &str) -> Self {
        self.prompt = prompt.to_string();
        self
    }

    /// Display names for the positive and negative class
    pub fn with_labels(mut self, positive: &str, negative: &str) -> Self {
        self.positive = positive.to_string();
        self.negative = negative.to_string();
        self
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Display name of the predicted class
    pub fn label_name(&self, prediction: &Prediction) -> &str {
        if prediction.label {
            &self.positive
        } else {
            &self.negative
        }
    }

    /// Build a full record from parsed input, filling omitted fields
    pub fn record(&self, values: Vec<(String, FieldValue)>) -> Result<Record> {
        Record::with_defaults(Arc::clone(&self.schema), &self.defaults, values)
    }

    /// One-line rendering of a prediction
    pub fn describe(&self, prediction: &Prediction) -> String {
        format!(
            "prediction: {} | probability: {:.2}% | confidence: {:.2}%",
            self.label_name(prediction),
            prediction.probability * 100.0,
            prediction.confidence() * 100.0
        )
    }
}

/// A classified input line
#[derive(Debug, Clone, PartialEq)]
pub enum InputLine {
    Exit,
    Empty,
    Values(Vec<(String, FieldValue)>),
}

/// Parse one line of session input against the session schema
pub fn parse_line(session: &InteractiveSession, line: &str) -> Result<InputLine> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(InputLine::Empty);
    }
    if line.eq_ignore_ascii_case(&session.sentinel) {
        return Ok(InputLine::Exit);
    }

    let values = if line.starts_with('{') {
        parse_json(&session.schema, line)?
    } else {
        parse_pairs(&session.schema, line)?
    };
    Ok(InputLine::Values(values))
}

fn field_kind(schema: &Schema, name: &str) -> Result<FieldKind> {
    schema
        .field(name)
        .map(|f| f.kind)
        .ok_or_else(|| HarnessError::FeatureNotFound(name.to_string()))
}

fn parse_pairs(schema: &Schema, line: &str) -> Result<Vec<(String, FieldValue)>> {
    let mut values = Vec::new();
    for pair in line.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (name, raw) = pair.split_once('=').ok_or_else(|| {
            HarnessError::Validation(format!("expected name=value, got '{}'", pair))
        })?;
        let name = name.trim();
        let kind = field_kind(schema, name)?;
        let value = FieldValue::parse(kind, raw.trim())
            .map_err(|e| HarnessError::Validation(format!("field '{}': {}", name, e)))?;
        values.push((name.to_string(), value));
    }
    Ok(values)
}

fn parse_json(schema: &Schema, line: &str) -> Result<Vec<(String, FieldValue)>> {
    let object: serde_json::Map<String, Value> = serde_json::from_str(line)
        .map_err(|e| HarnessError::Validation(format!("invalid JSON object: {}", e)))?;

    object
        .into_iter()
        .map(|(name, raw)| {
            let kind = field_kind(schema, &name)?;
            let value = coerce_json(kind, &raw)
                .map_err(|e| HarnessError::Validation(format!("field '{}': {}", name, e)))?;
            Ok((name, value))
        })
        .collect()
}

fn coerce_json(kind: FieldKind, raw: &Value) -> std::result::Result<FieldValue, String> {
    match (kind, raw) {
        (_, Value::String(s)) => FieldValue::parse(kind, s.trim()),
        (FieldKind::Numeric, Value::Number(n)) => n
            .as_f64()
            .filter(|v| v.is_finite())
            .map(FieldValue::Number)
            .ok_or_else(|| format!("'{}' is not a finite number", n)),
        (FieldKind::Categorical, Value::Number(n)) => match n.as_f64() {
            Some(v) => Ok(FieldValue::Text(FieldValue::Number(v).key())),
            None => Ok(FieldValue::Text(n.to_string())),
        },
        (FieldKind::Boolean, Value::Bool(b)) => Ok(FieldValue::Bool(*b)),
        (FieldKind::Boolean, Value::Number(n)) => FieldValue::parse(kind, &n.to_string()),
        (_, other) => Err(format!("unsupported value {} for a {:?} field", other, kind)),
    }
}
