use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::info;

use etlcheck_core::{CellValue, Column, Dataset};

use crate::errors::{LoadError, LoadResult};
use crate::loader::DatasetLoader;

/// Loads a delimited file with a header row.
///
/// Column types are inferred over the whole column: integer, then float,
/// then boolean, otherwise text. Empty fields are nulls.
#[derive(Debug, Clone)]
pub struct CsvLoader {
    path: PathBuf,
}

impl CsvLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Parse delimited text from any reader.
    pub fn parse<R: Read>(&self, reader: R) -> LoadResult<Dataset> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut raw: Vec<Vec<String>> = vec![Vec::new(); header.len()];
        for record in reader.records() {
            let record = record?;
            for (column, field) in raw.iter_mut().zip(record.iter()) {
                column.push(field.to_string());
            }
        }

        let columns = header
            .into_iter()
            .zip(raw)
            .map(|(name, values)| Column {
                name,
                values: infer_column(&values),
            })
            .collect();
        Ok(Dataset::new(columns)?)
    }
}

#[async_trait]
impl DatasetLoader for CsvLoader {
    fn kind(&self) -> &'static str {
        "csv"
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn load(&self) -> LoadResult<Dataset> {
        let file = File::open(&self.path).map_err(|source| LoadError::Io {
            path: self.path.clone(),
            source,
        })?;
        let dataset = self.parse(file)?;
        info!(
            path = %self.path.display(),
            rows = dataset.row_count(),
            columns = dataset.columns().len(),
            "csv dataset loaded"
        );
        Ok(dataset)
    }
}

#[derive(Clone, Copy)]
enum Inferred {
    Int,
    Float,
    Bool,
    Text,
}

fn infer_column(values: &[String]) -> Vec<CellValue> {
    let present = values.iter().map(|v| v.trim()).filter(|v| !v.is_empty());
    let inferred = if present.clone().all(|v| v.parse::<i64>().is_ok()) {
        Inferred::Int
    } else if present.clone().all(|v| v.parse::<f64>().is_ok()) {
        Inferred::Float
    } else if present.clone().all(|v| parse_bool(v).is_some()) {
        Inferred::Bool
    } else {
        Inferred::Text
    };

    values
        .iter()
        .map(|raw| {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return CellValue::Null;
            }
            match inferred {
                Inferred::Int => trimmed.parse().map(CellValue::Int).ok(),
                Inferred::Float => trimmed.parse().map(CellValue::Float).ok(),
                Inferred::Bool => parse_bool(trimmed).map(CellValue::Bool),
                Inferred::Text => None,
            }
            .unwrap_or_else(|| CellValue::Text(raw.clone()))
        })
        .collect()
}

fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_types_per_column() {
        let input = "CustomerID,PurchaseAmount,Status,Vip\n1,100,Active,true\n2,,Inactive,false\n3,12.5,Pending,\n";
        let dataset = CsvLoader::new("inline.csv")
            .parse(input.as_bytes())
            .expect("parse");

        assert_eq!(dataset.row_count(), 3);
        assert_eq!(dataset.value("CustomerID", 2), Some(&CellValue::Int(3)));
        assert_eq!(dataset.value("PurchaseAmount", 0), Some(&CellValue::Float(100.0)));
        assert_eq!(dataset.value("PurchaseAmount", 1), Some(&CellValue::Null));
        assert_eq!(dataset.value("Status", 1), Some(&CellValue::from("Inactive")));
        assert_eq!(dataset.value("Vip", 0), Some(&CellValue::Bool(true)));
        assert_eq!(dataset.value("Vip", 2), Some(&CellValue::Null));
    }

    #[test]
    fn mixed_column_stays_text() {
        let dataset = CsvLoader::new("inline.csv")
            .parse("code\n1\nA2\n".as_bytes())
            .expect("parse");
        assert_eq!(dataset.value("code", 0), Some(&CellValue::from("1")));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = CsvLoader::new("inline.csv")
            .parse("a,b\n1,2\n3\n".as_bytes())
            .expect_err("ragged");
        assert!(matches!(err, LoadError::Csv(_)));
    }
}
