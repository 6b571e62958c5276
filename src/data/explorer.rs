//! Read-only descriptive statistics over a record slice

use super::Record;
use serde::Serialize;
use std::fmt;

/// Min/max/mean of one numeric field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub name: String,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// One distinct raw target value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetBucket {
    pub value: String,
    pub count: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub numeric: Vec<NumericSummary>,
    /// Target histogram in first-appearance order
    pub target: Vec<TargetBucket>,
}

/// Computes a [`DatasetSummary`]; never mutates its input
pub struct Explorer;

impl Explorer {
    pub fn summarize(records: &[Record]) -> DatasetSummary {
        let Some(first) = records.first() else {
            return DatasetSummary { rows: 0, numeric: Vec::new(), target: Vec::new() };
        };
        let schema = first.schema();

        let numeric = schema
            .numeric_fields()
            .map(|field| {
                let mut min = f64::INFINITY;
                let mut max = f64::NEG_INFINITY;
                let mut sum = 0.0;
                let mut n = 0usize;
                for value in records.iter().filter_map(|r| r.get(&field.name)?.as_f64()) {
                    min = min.min(value);
                    max = max.max(value);
                    sum += value;
                    n += 1;
                }
                NumericSummary {
                    name: field.name.clone(),
                    min,
                    max,
                    mean: if n > 0 { sum / n as f64 } else { f64::NAN },
                }
            })
            .collect();

        let mut target: Vec<TargetBucket> = Vec::new();
        for record in records {
            let key = record.target().key();
            match target.iter_mut().find(|b| b.value == key) {
                Some(bucket) => bucket.count += 1,
                None => target.push(TargetBucket { value: key, count: 1, percent: 0.0 }),
            }
        }
        let total = records.len() as f64;
        for bucket in &mut target {
            bucket.percent = bucket.count as f64 / total * 100.0;
        }

        DatasetSummary { rows: records.len(), numeric, target }
    }
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} rows", self.rows)?;
        for s in &self.numeric {
            writeln!(
                f,
                "  {:<20} min {:>12.3}  max {:>12.3}  mean {:>12.3}",
                s.name, s.min, s.max, s.mean
            )?;
        }
        for b in &self.target {
            writeln!(f, "  {:<20} {:>8}  {:>6.2}%", b.value, b.count, b.percent)?;
        }
        Ok(())
    }
}
