use anyhow::{Context, Result};
use etlcheck_core::CellValue;
use etlcheck_ingest::{CsvLoader, DatasetLoader, LoadError, PostgresLoader};
use std::{env, fs, path::PathBuf};

fn temp_csv(label: &str, content: &str) -> Result<PathBuf> {
    let dir = env::temp_dir().join(format!("etlcheck_ingest_{label}_{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir)?;
    let path = dir.join("customers.csv");
    fs::write(&path, content)?;
    Ok(path)
}

#[tokio::test]
async fn loads_customers_csv_from_disk() -> Result<()> {
    let path = temp_csv(
        "customers",
        "CustomerID,PurchaseAmount,Status\n1,100,Active\n2,0,Inactive\n3,50,Pending\n",
    )?;

    let dataset = CsvLoader::new(&path).load().await?;
    assert_eq!(
        dataset.column_names().collect::<Vec<_>>(),
        vec!["CustomerID", "PurchaseAmount", "Status"]
    );
    assert_eq!(dataset.row_count(), 3);
    assert_eq!(dataset.value("PurchaseAmount", 1), Some(&CellValue::Int(0)));

    if let Some(dir) = path.parent() {
        let _ = fs::remove_dir_all(dir);
    }
    Ok(())
}

#[tokio::test]
async fn missing_csv_is_an_io_error() {
    let path = env::temp_dir().join(format!("etlcheck_missing_{}.csv", uuid::Uuid::new_v4()));
    let err = CsvLoader::new(&path).load().await.expect_err("missing file");
    assert!(matches!(err, LoadError::Io { .. }));
}

#[tokio::test]
async fn loads_query_result_from_postgres() -> Result<()> {
    let Ok(db_url) = env::var("TEST_DATABASE_URL").or_else(|_| env::var("DATABASE_URL")) else {
        eprintln!("skipping: set TEST_DATABASE_URL or DATABASE_URL for integration tests");
        return Ok(());
    };

    let loader = PostgresLoader::new(
        db_url,
        "select * from (values (1::int4, 'Active'::text, 100.5::float8), (2, null, 0)) \
         as t(\"CustomerID\", \"Status\", \"PurchaseAmount\") order by 1",
    )?;
    let dataset = loader.load().await.context("loading query result")?;

    assert_eq!(dataset.row_count(), 2);
    assert_eq!(dataset.value("CustomerID", 1), Some(&CellValue::Int(2)));
    assert_eq!(dataset.value("Status", 1), Some(&CellValue::Null));
    assert_eq!(dataset.value("PurchaseAmount", 0), Some(&CellValue::Float(100.5)));
    Ok(())
}

#[tokio::test]
async fn empty_query_result_keeps_its_columns() -> Result<()> {
    let Ok(db_url) = env::var("TEST_DATABASE_URL").or_else(|_| env::var("DATABASE_URL")) else {
        eprintln!("skipping: set TEST_DATABASE_URL or DATABASE_URL for integration tests");
        return Ok(());
    };

    let loader = PostgresLoader::new(
        db_url,
        "select 1::int8 as \"CustomerID\", 'Active'::text as \"Status\" where false",
    )?;
    let dataset = loader.load().await.context("loading empty query result")?;

    assert_eq!(dataset.row_count(), 0);
    assert_eq!(
        dataset.column_names().collect::<Vec<_>>(),
        vec!["CustomerID", "Status"]
    );
    Ok(())
}
