use std::collections::BTreeSet;

use etlcheck_core::{Asset, BatchDefinition, Suite};

use crate::errors::{CatalogError, CatalogResult};
use crate::registry::Registration;

/// Persistence for suites, addressed by name.
pub trait SuiteStore {
    /// Returns the persisted suite or [`CatalogError::SuiteNotFound`].
    fn get(&self, name: &str) -> CatalogResult<Suite>;

    /// Returns a fresh, empty suite. Nothing is persisted until `save`.
    fn create(&mut self, name: &str) -> CatalogResult<Suite> {
        Ok(Suite::new(name))
    }

    /// Persist the suite's current rule set, overwriting any previous one.
    fn save(&mut self, suite: &Suite) -> CatalogResult<()>;

    /// Names of every persisted suite, sorted.
    fn list_suites(&self) -> CatalogResult<Vec<String>>;
}

/// Registry of named data sources.
pub trait SourceRegistry {
    fn list_sources(&self) -> CatalogResult<BTreeSet<String>>;

    /// Registers the source; a second call with the same name is a no-op.
    fn add_source(&mut self, name: &str) -> CatalogResult<Registration>;
}

/// Registry of assets within data sources.
pub trait AssetRegistry {
    fn get_asset(&self, source: &str, name: &str) -> CatalogResult<Asset>;

    /// Registers the asset under an existing source.
    fn add_asset(&mut self, source: &str, name: &str) -> CatalogResult<Registration>;

    fn list_assets(&self, source: &str) -> CatalogResult<BTreeSet<String>>;
}

/// Registry of batch definitions within assets.
pub trait BatchRegistry {
    fn list_batch_definitions(&self, asset: &Asset) -> CatalogResult<BTreeSet<String>>;

    /// Registers a whole-dataset batch definition under an existing asset.
    fn add_batch_definition(&mut self, asset: &Asset, name: &str) -> CatalogResult<Registration>;

    fn get_batch_definition(&self, asset: &Asset, name: &str) -> CatalogResult<BatchDefinition> {
        if self.list_batch_definitions(asset)?.contains(name) {
            Ok(BatchDefinition::whole_dataset(&asset.name, name))
        } else {
            Err(CatalogError::BatchDefinitionNotFound {
                asset: asset.name.clone(),
                batch: name.to_string(),
            })
        }
    }
}

/// Every resource registry, as one handle.
pub trait Registry: SourceRegistry + AssetRegistry + BatchRegistry {}

impl<T: SourceRegistry + AssetRegistry + BatchRegistry + ?Sized> Registry for T {}

/// Suite store plus registries, as one handle.
pub trait Catalog: SuiteStore + Registry {}

impl<T: SuiteStore + Registry + ?Sized> Catalog for T {}
