use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::value::CellValue;

/// A named column of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<CellValue>,
}

/// Ordered, column-major table snapshot.
///
/// Every column has the same length and column names are unique. A dataset
/// is never mutated once built; combining datasets produces a new one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    row_count: usize,
}

impl Dataset {
    /// Build a dataset from ordered columns, checking the shape invariants.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let row_count = columns.first().map(|col| col.values.len()).unwrap_or(0);
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(Error::InvalidDataset(format!(
                    "duplicate column name: {}",
                    column.name
                )));
            }
            if column.values.len() != row_count {
                return Err(Error::InvalidDataset(format!(
                    "column '{}' has {} value(s), expected {}",
                    column.name,
                    column.values.len(),
                    row_count
                )));
            }
        }
        Ok(Self { columns, row_count })
    }

    /// Build a dataset from a header and row-major records.
    pub fn from_rows(header: &[String], rows: Vec<Vec<CellValue>>) -> Result<Self> {
        let mut columns = header
            .iter()
            .map(|name| Column {
                name: name.clone(),
                values: Vec::with_capacity(rows.len()),
            })
            .collect::<Vec<_>>();

        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != columns.len() {
                return Err(Error::InvalidDataset(format!(
                    "row {} has {} field(s), expected {}",
                    row_idx,
                    row.len(),
                    columns.len()
                )));
            }
            for (column, value) in columns.iter_mut().zip(row) {
                column.values.push(value);
            }
        }

        if header.is_empty() {
            return Ok(Self::default());
        }
        Self::new(columns)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|col| col.name.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|col| col.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn value(&self, column: &str, row: usize) -> Option<&CellValue> {
        self.column(column).and_then(|col| col.values.get(row))
    }

    /// First `n` rows rendered as text, for previews.
    pub fn head(&self, n: usize) -> Vec<Vec<String>> {
        (0..self.row_count.min(n))
            .map(|row| {
                self.columns
                    .iter()
                    .map(|col| col.values[row].to_string())
                    .collect()
            })
            .collect()
    }
}
