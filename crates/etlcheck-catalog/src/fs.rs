use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use etlcheck_core::{Asset, BatchDefinition, Suite};

use crate::atomic::write_json_atomic;
use crate::errors::{CatalogError, CatalogResult};
use crate::registry::{Registration, RegistryDocument};
use crate::store::{AssetRegistry, BatchRegistry, SourceRegistry, SuiteStore};

/// On-disk suite document; the fingerprint is informational and ignored on read.
#[derive(Serialize)]
struct SuiteDocument<'a> {
    #[serde(flatten)]
    suite: &'a Suite,
    fingerprint: String,
}

/// Catalog persisted as JSON documents under a root directory.
///
/// Layout: `suites/<name>.json` per suite and `sources.json` for the
/// source/asset/batch-definition registry.
#[derive(Debug, Clone)]
pub struct FileCatalog {
    root: PathBuf,
    registry: RegistryDocument,
}

impl FileCatalog {
    /// Open the catalog rooted at `root`, creating nothing until first write.
    pub fn open(root: impl Into<PathBuf>) -> CatalogResult<Self> {
        let root = root.into();
        let registry_path = root.join("sources.json");
        let registry = if registry_path.exists() {
            let content = std::fs::read_to_string(&registry_path)?;
            serde_json::from_str(&content)?
        } else {
            RegistryDocument::default()
        };
        debug!(root = %root.display(), "catalog opened");
        Ok(Self { root, registry })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn registry(&self) -> &RegistryDocument {
        &self.registry
    }

    fn suites_dir(&self) -> PathBuf {
        self.root.join("suites")
    }

    fn suite_path(&self, name: &str) -> CatalogResult<PathBuf> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.'))
            && !name.starts_with('.');
        if !valid {
            return Err(CatalogError::Invalid(format!("invalid suite name: '{name}'")));
        }
        Ok(self.suites_dir().join(format!("{name}.json")))
    }

    fn persist_registry(&self) -> CatalogResult<()> {
        write_json_atomic(&self.root.join("sources.json"), &self.registry)
    }

    fn persist_if_created(&self, registration: Registration) -> CatalogResult<Registration> {
        if registration.created() {
            self.persist_registry()?;
        }
        Ok(registration)
    }
}

impl SuiteStore for FileCatalog {
    fn get(&self, name: &str) -> CatalogResult<Suite> {
        let path = self.suite_path(name)?;
        if !path.exists() {
            return Err(CatalogError::SuiteNotFound(name.to_string()));
        }
        let content = std::fs::read_to_string(&path)?;
        let suite: Suite = serde_json::from_str(&content)?;
        if suite.name != name {
            return Err(CatalogError::Invalid(format!(
                "suite file {} holds suite '{}'",
                path.display(),
                suite.name
            )));
        }
        Ok(suite)
    }

    fn save(&mut self, suite: &Suite) -> CatalogResult<()> {
        let path = self.suite_path(&suite.name)?;
        let document = SuiteDocument {
            suite,
            fingerprint: suite.fingerprint(),
        };
        write_json_atomic(&path, &document)?;
        info!(suite = %suite.name, rules = suite.rules.len(), path = %path.display(), "suite saved");
        Ok(())
    }

    fn list_suites(&self) -> CatalogResult<Vec<String>> {
        let dir = self.suites_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

impl SourceRegistry for FileCatalog {
    fn list_sources(&self) -> CatalogResult<BTreeSet<String>> {
        self.registry.list_sources()
    }

    fn add_source(&mut self, name: &str) -> CatalogResult<Registration> {
        let registration = self.registry.add_source(name)?;
        self.persist_if_created(registration)
    }
}

impl AssetRegistry for FileCatalog {
    fn get_asset(&self, source: &str, name: &str) -> CatalogResult<Asset> {
        self.registry.get_asset(source, name)
    }

    fn add_asset(&mut self, source: &str, name: &str) -> CatalogResult<Registration> {
        let registration = self.registry.add_asset(source, name)?;
        self.persist_if_created(registration)
    }

    fn list_assets(&self, source: &str) -> CatalogResult<BTreeSet<String>> {
        self.registry.list_assets(source)
    }
}

impl BatchRegistry for FileCatalog {
    fn list_batch_definitions(&self, asset: &Asset) -> CatalogResult<BTreeSet<String>> {
        self.registry.list_batch_definitions(asset)
    }

    fn add_batch_definition(&mut self, asset: &Asset, name: &str) -> CatalogResult<Registration> {
        let registration = self.registry.add_batch_definition(asset, name)?;
        self.persist_if_created(registration)
    }

    fn get_batch_definition(&self, asset: &Asset, name: &str) -> CatalogResult<BatchDefinition> {
        self.registry.get_batch_definition(asset, name)
    }
}
