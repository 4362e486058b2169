//! Suite catalog and resource registries.
//!
//! The validation engine only depends on the capability traits defined in
//! [`store`]; [`FileCatalog`] and [`MemoryCatalog`] are the two bundled
//! implementations. Registration is check-then-act and assumes a single
//! writer per catalog for the duration of a run.

pub mod atomic;
pub mod catalog;
pub mod errors;
pub mod fs;
pub mod memory;
pub mod registry;
pub mod store;

pub use catalog::SuiteCatalog;
pub use errors::{CatalogError, CatalogResult};
pub use fs::FileCatalog;
pub use memory::MemoryCatalog;
pub use registry::{
    Registration, RegistryDocument, ensure_asset, ensure_batch_definition, ensure_source,
};
pub use store::{AssetRegistry, BatchRegistry, Catalog, Registry, SourceRegistry, SuiteStore};
