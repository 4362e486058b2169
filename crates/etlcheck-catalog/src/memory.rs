use std::collections::{BTreeMap, BTreeSet};

use etlcheck_core::{Asset, BatchDefinition, Suite};

use crate::errors::{CatalogError, CatalogResult};
use crate::registry::{Registration, RegistryDocument};
use crate::store::{AssetRegistry, BatchRegistry, SourceRegistry, SuiteStore};

/// Process-local catalog, used by tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    suites: BTreeMap<String, Suite>,
    registry: RegistryDocument,
    saves: usize,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `save` calls observed so far.
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl SuiteStore for MemoryCatalog {
    fn get(&self, name: &str) -> CatalogResult<Suite> {
        self.suites
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::SuiteNotFound(name.to_string()))
    }

    fn save(&mut self, suite: &Suite) -> CatalogResult<()> {
        self.suites.insert(suite.name.clone(), suite.clone());
        self.saves += 1;
        Ok(())
    }

    fn list_suites(&self) -> CatalogResult<Vec<String>> {
        Ok(self.suites.keys().cloned().collect())
    }
}

impl SourceRegistry for MemoryCatalog {
    fn list_sources(&self) -> CatalogResult<BTreeSet<String>> {
        self.registry.list_sources()
    }

    fn add_source(&mut self, name: &str) -> CatalogResult<Registration> {
        self.registry.add_source(name)
    }
}

impl AssetRegistry for MemoryCatalog {
    fn get_asset(&self, source: &str, name: &str) -> CatalogResult<Asset> {
        self.registry.get_asset(source, name)
    }

    fn add_asset(&mut self, source: &str, name: &str) -> CatalogResult<Registration> {
        self.registry.add_asset(source, name)
    }

    fn list_assets(&self, source: &str) -> CatalogResult<BTreeSet<String>> {
        self.registry.list_assets(source)
    }
}

impl BatchRegistry for MemoryCatalog {
    fn list_batch_definitions(&self, asset: &Asset) -> CatalogResult<BTreeSet<String>> {
        self.registry.list_batch_definitions(asset)
    }

    fn add_batch_definition(&mut self, asset: &Asset, name: &str) -> CatalogResult<Registration> {
        self.registry.add_batch_definition(asset, name)
    }

    fn get_batch_definition(&self, asset: &Asset, name: &str) -> CatalogResult<BatchDefinition> {
        self.registry.get_batch_definition(asset, name)
    }
}
