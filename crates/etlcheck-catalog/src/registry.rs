use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::info;

use etlcheck_core::{Asset, BatchDefinition};

use crate::errors::{CatalogError, CatalogResult};
use crate::store::{AssetRegistry, BatchRegistry, SourceRegistry};

/// Result of an idempotent registration call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Registration {
    Created,
    AlreadyExists,
}

impl Registration {
    pub fn created(&self) -> bool {
        matches!(self, Registration::Created)
    }
}

/// Serializable source → asset → batch-definition tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryDocument {
    #[serde(default)]
    pub sources: BTreeMap<String, SourceEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceEntry {
    #[serde(default)]
    pub assets: BTreeMap<String, AssetEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetEntry {
    #[serde(default)]
    pub batch_definitions: BTreeMap<String, BatchDefinition>,
}

impl RegistryDocument {
    fn source(&self, name: &str) -> CatalogResult<&SourceEntry> {
        self.sources
            .get(name)
            .ok_or_else(|| CatalogError::SourceNotFound(name.to_string()))
    }

    fn asset_entry(&self, asset: &Asset) -> CatalogResult<&AssetEntry> {
        self.source(&asset.source_name)?
            .assets
            .get(&asset.name)
            .ok_or_else(|| asset_not_found(&asset.source_name, &asset.name))
    }
}

fn asset_not_found(source: &str, asset: &str) -> CatalogError {
    CatalogError::AssetNotFound {
        source_name: source.to_string(),
        asset: asset.to_string(),
    }
}

impl SourceRegistry for RegistryDocument {
    fn list_sources(&self) -> CatalogResult<BTreeSet<String>> {
        Ok(self.sources.keys().cloned().collect())
    }

    fn add_source(&mut self, name: &str) -> CatalogResult<Registration> {
        if self.sources.contains_key(name) {
            return Ok(Registration::AlreadyExists);
        }
        self.sources.insert(name.to_string(), SourceEntry::default());
        Ok(Registration::Created)
    }
}

impl AssetRegistry for RegistryDocument {
    fn get_asset(&self, source: &str, name: &str) -> CatalogResult<Asset> {
        if self.source(source)?.assets.contains_key(name) {
            Ok(Asset::new(source, name))
        } else {
            Err(asset_not_found(source, name))
        }
    }

    fn add_asset(&mut self, source: &str, name: &str) -> CatalogResult<Registration> {
        let entry = self
            .sources
            .get_mut(source)
            .ok_or_else(|| CatalogError::SourceNotFound(source.to_string()))?;
        if entry.assets.contains_key(name) {
            return Ok(Registration::AlreadyExists);
        }
        entry.assets.insert(name.to_string(), AssetEntry::default());
        Ok(Registration::Created)
    }

    fn list_assets(&self, source: &str) -> CatalogResult<BTreeSet<String>> {
        Ok(self.source(source)?.assets.keys().cloned().collect())
    }
}

impl BatchRegistry for RegistryDocument {
    fn list_batch_definitions(&self, asset: &Asset) -> CatalogResult<BTreeSet<String>> {
        Ok(self
            .asset_entry(asset)?
            .batch_definitions
            .keys()
            .cloned()
            .collect())
    }

    fn add_batch_definition(&mut self, asset: &Asset, name: &str) -> CatalogResult<Registration> {
        let entry = self
            .sources
            .get_mut(&asset.source_name)
            .ok_or_else(|| CatalogError::SourceNotFound(asset.source_name.clone()))?
            .assets
            .get_mut(&asset.name)
            .ok_or_else(|| asset_not_found(&asset.source_name, &asset.name))?;
        if entry.batch_definitions.contains_key(name) {
            return Ok(Registration::AlreadyExists);
        }
        entry.batch_definitions.insert(
            name.to_string(),
            BatchDefinition::whole_dataset(&asset.name, name),
        );
        Ok(Registration::Created)
    }

    fn get_batch_definition(&self, asset: &Asset, name: &str) -> CatalogResult<BatchDefinition> {
        self.asset_entry(asset)?
            .batch_definitions
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::BatchDefinitionNotFound {
                asset: asset.name.clone(),
                batch: name.to_string(),
            })
    }
}

/// Register the data source unless a source with that name is listed.
pub fn ensure_source<R>(registry: &mut R, name: &str) -> CatalogResult<Registration>
where
    R: SourceRegistry + ?Sized,
{
    let registration = if registry.list_sources()?.contains(name) {
        Registration::AlreadyExists
    } else {
        registry.add_source(name)?
    };
    info!(source = %name, ?registration, "data source registered");
    Ok(registration)
}

/// Register the asset unless it already resolves, then return it.
pub fn ensure_asset<R>(
    registry: &mut R,
    source: &str,
    name: &str,
) -> CatalogResult<(Asset, Registration)>
where
    R: AssetRegistry + ?Sized,
{
    let registration = match registry.get_asset(source, name) {
        Ok(_) => Registration::AlreadyExists,
        Err(CatalogError::AssetNotFound { .. }) => registry.add_asset(source, name)?,
        Err(err) => return Err(err),
    };
    info!(source = %source, asset = %name, ?registration, "data asset registered");
    Ok((registry.get_asset(source, name)?, registration))
}

/// Register the batch definition unless the asset already lists it.
pub fn ensure_batch_definition<R>(
    registry: &mut R,
    asset: &Asset,
    name: &str,
) -> CatalogResult<(BatchDefinition, Registration)>
where
    R: BatchRegistry + ?Sized,
{
    let registration = if registry.list_batch_definitions(asset)?.contains(name) {
        Registration::AlreadyExists
    } else {
        registry.add_batch_definition(asset, name)?
    };
    info!(asset = %asset.name, batch = %name, ?registration, "batch definition registered");
    Ok((registry.get_batch_definition(asset, name)?, registration))
}
