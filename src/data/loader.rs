//! CSV loading against an explicit schema

use super::{FieldValue, Record, Schema};
use crate::error::{HarnessError, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Records loaded from one source, in source order
#[derive(Debug, Clone)]
pub struct Dataset {
    schema: Arc<Schema>,
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(schema: Arc<Schema>, records: Vec<Record>) -> Self {
        Self { schema, records }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Keep only the first `n` rows
    pub fn truncate(&mut self, n: usize) {
        self.records.truncate(n);
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

/// Loader for headered comma-separated sources
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    schema: Arc<Schema>,
    delimiter: u8,
    max_rows: Option<usize>,
}

impl DatasetLoader {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            delimiter: b',',
            max_rows: None,
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Stop after `n` data rows
    pub fn with_max_rows(mut self, n: Option<usize>) -> Self {
        self.max_rows = n;
        self
    }

    /// Load a file from disk
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Dataset> {
        let path = path.as_ref();
        let start = Instant::now();
        let file = File::open(path).map_err(|e| {
            HarnessError::Load(format!("cannot open '{}': {}", path.display(), e))
        })?;
        let dataset = self.load_from_reader(file)?;
        info!(
            path = %path.display(),
            rows = dataset.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded dataset"
        );
        Ok(dataset)
    }

    /// Load from any reader; the first line is the header
    pub fn load_from_reader<R: Read>(&self, reader: R) -> Result<Dataset> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(self.delimiter)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let expected = self.schema.column_count();
        let headers = reader
            .headers()
            .map_err(|e| HarnessError::Load(format!("cannot read header: {}", e)))?;
        if headers.len() != expected {
            return Err(HarnessError::Load(format!(
                "header has {} columns, schema expects {}",
                headers.len(),
                expected
            )));
        }
        for (field, name) in self.schema.fields().iter().zip(headers.iter()) {
            if field.name != name {
                debug!(
                    ordinal = field.ordinal,
                    header = name,
                    field = %field.name,
                    "Header name differs from schema"
                );
            }
        }

        let mut records = Vec::new();
        for (i, row) in reader.records().enumerate() {
            if self.max_rows.is_some_and(|max| records.len() >= max) {
                break;
            }
            // Header is line 1
            let line = i + 2;
            let row = row.map_err(|e| HarnessError::Load(format!("row {}: {}", line, e)))?;
            if row.len() != expected {
                return Err(HarnessError::Load(format!(
                    "row {} has {} fields, expected {}",
                    line,
                    row.len(),
                    expected
                )));
            }

            let values = self
                .schema
                .fields()
                .iter()
                .zip(row.iter())
                .map(|(field, cell)| {
                    FieldValue::parse(field.kind, cell).map_err(|msg| {
                        HarnessError::Load(format!("row {}, field '{}': {}", line, field.name, msg))
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            records.push(Record::new(Arc::clone(&self.schema), values)?);
        }

        Ok(Dataset::new(Arc::clone(&self.schema), records))
    }
}
