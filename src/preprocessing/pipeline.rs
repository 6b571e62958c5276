//! Encoding pipeline: fit once on train, apply everywhere

use super::{
    LabelRule, MinMaxNormalizer, OneHotEncoder, PassThrough, RangePolicy, Transform,
    TransformState,
};
use crate::data::Record;
use crate::error::{HarnessError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Ordered transforms plus label derivation, not yet fitted
#[derive(Debug)]
pub struct EncodingPipeline {
    label: LabelRule,
    transforms: Vec<Box<dyn Transform>>,
    order: Option<Vec<String>>,
}

impl EncodingPipeline {
    pub fn new(label: LabelRule) -> Self {
        Self {
            label,
            transforms: Vec::new(),
            order: None,
        }
    }

    pub fn with_transform(mut self, transform: impl Transform + 'static) -> Self {
        self.transforms.push(Box::new(transform));
        self
    }

    pub fn min_max(self, field: &str, policy: RangePolicy) -> Self {
        self.with_transform(MinMaxNormalizer::new(field).with_policy(policy))
    }

    pub fn one_hot(self, field: &str) -> Self {
        self.with_transform(OneHotEncoder::new(field))
    }

    pub fn pass_through(self, field: &str) -> Self {
        self.with_transform(PassThrough::new(field))
    }

    /// Declare the concatenation order by transform name.
    ///
    /// Without it, outputs are concatenated in declaration order.
    pub fn concat<S: AsRef<str>>(mut self, order: &[S]) -> Self {
        self.order = Some(order.iter().map(|s| s.as_ref().to_string()).collect());
        self
    }

    pub fn label_rule(&self) -> &LabelRule {
        &self.label
    }

    /// Fit every transform on `train` and freeze the result.
    ///
    /// Each call produces a new [`FittedPipeline`]; nothing from an earlier
    /// fit is reused.
    pub fn fit(&self, train: &[Record]) -> Result<FittedPipeline> {
        let first = train.first().ok_or_else(|| {
            HarnessError::Validation("cannot fit encoding pipeline on an empty partition".to_string())
        })?;
        let schema = first.schema();

        if self.transforms.is_empty() {
            return Err(HarnessError::Validation("encoding pipeline has no transforms".to_string()));
        }
        let mut names = HashSet::new();
        for t in &self.transforms {
            if !names.insert(t.name()) {
                return Err(HarnessError::Validation(format!(
                    "duplicate transform output '{}'",
                    t.name()
                )));
            }
        }

        let order: Vec<usize> = match &self.order {
            None => (0..self.transforms.len()).collect(),
            Some(order) => self.resolve_order(order)?,
        };

        for record in train {
            self.label.label(record)?;
        }

        let mut states = Vec::with_capacity(order.len());
        for &i in &order {
            states.push(self.transforms[i].fit(schema, train)?);
        }

        let fitted = FittedPipeline::new(self.label.clone(), states)?;
        debug!(
            transforms = fitted.states.len(),
            width = fitted.width,
            rows = train.len(),
            "Fitted encoding pipeline"
        );
        Ok(fitted)
    }

    fn resolve_order(&self, order: &[String]) -> Result<Vec<usize>> {
        let mut seen = HashSet::new();
        let mut resolved = Vec::with_capacity(order.len());
        for name in order {
            if !seen.insert(name.as_str()) {
                return Err(HarnessError::Validation(format!(
                    "'{}' appears twice in the concatenation order",
                    name
                )));
            }
            let idx = self
                .transforms
                .iter()
                .position(|t| t.name() == name)
                .ok_or_else(|| {
                    HarnessError::Validation(format!("concatenation names unknown output '{}'", name))
                })?;
            resolved.push(idx);
        }
        if let Some(missing) = self.transforms.iter().find(|t| !seen.contains(t.name())) {
            return Err(HarnessError::Validation(format!(
                "output '{}' is missing from the concatenation order",
                missing.name()
            )));
        }
        Ok(resolved)
    }
}

/// Encoded features with their derived labels
#[derive(Debug, Clone)]
pub struct EncodedSet {
    pub features: Array2<f64>,
    pub labels: Vec<bool>,
}

impl EncodedSet {
    /// Labels as 0.0 / 1.0 targets
    pub fn targets(&self) -> Array1<f64> {
        self.labels.iter().map(|&l| if l { 1.0 } else { 0.0 }).collect()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Immutable fitted encoding: label rule plus ordered transform states
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedPipeline {
    label: LabelRule,
    states: Vec<TransformState>,
    width: usize,
    feature_names: Vec<String>,
}

impl FittedPipeline {
    fn new(label: LabelRule, states: Vec<TransformState>) -> Result<Self> {
        let width: usize = states.iter().map(|s| s.width()).sum();
        if width == 0 {
            return Err(HarnessError::Validation(
                "encoding produced an empty feature vector".to_string(),
            ));
        }
        let feature_names = states.iter().flat_map(|s| s.feature_names()).collect();
        Ok(Self { label, states, width, feature_names })
    }

    /// Feature vector width fixed at fit
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn states(&self) -> &[TransformState] {
        &self.states
    }

    pub fn label_rule(&self) -> &LabelRule {
        &self.label
    }

    pub fn label(&self, record: &Record) -> Result<bool> {
        self.label.label(record)
    }

    fn encode_into(&self, record: &Record, out: &mut Vec<f64>) -> Result<()> {
        let start = out.len();
        for state in &self.states {
            state.apply(record, out)?;
        }
        let produced = out.len() - start;
        if produced != self.width {
            return Err(HarnessError::ShapeError {
                expected: format!("{} features", self.width),
                actual: format!("{} features", produced),
            });
        }
        Ok(())
    }

    /// Encode one record into a feature vector of the fitted width
    pub fn encode_row(&self, record: &Record) -> Result<Array1<f64>> {
        let mut out = Vec::with_capacity(self.width);
        self.encode_into(record, &mut out)?;
        Ok(Array1::from_vec(out))
    }

    /// Encode features only, one row per record
    pub fn encode_features(&self, records: &[Record]) -> Result<Array2<f64>> {
        let mut flat = Vec::with_capacity(records.len() * self.width);
        for record in records {
            self.encode_into(record, &mut flat)?;
        }
        Array2::from_shape_vec((records.len(), self.width), flat).map_err(|e| {
            HarnessError::ShapeError {
                expected: format!("{} x {}", records.len(), self.width),
                actual: e.to_string(),
            }
        })
    }

    /// Encode features and derive labels
    pub fn encode(&self, records: &[Record]) -> Result<EncodedSet> {
        let features = self.encode_features(records)?;
        let labels = records
            .iter()
            .map(|r| self.label(r))
            .collect::<Result<Vec<_>>>()?;
        Ok(EncodedSet { features, labels })
    }
}
