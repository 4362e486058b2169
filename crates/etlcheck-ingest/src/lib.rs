//! Dataset loaders for etlcheck.
//!
//! Loading happens before any validation: failures surface as [`LoadError`]
//! and the run is aborted without partial results.

pub mod delimited;
pub mod errors;
pub mod loader;
pub mod postgres;

pub use delimited::CsvLoader;
pub use errors::{LoadError, LoadResult};
pub use loader::DatasetLoader;
pub use postgres::PostgresLoader;
