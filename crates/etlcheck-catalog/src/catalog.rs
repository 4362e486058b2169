use tracing::{info, warn};

use etlcheck_core::{Rule, Suite};

use crate::errors::{CatalogError, CatalogResult};
use crate::store::SuiteStore;

/// Loads, extends and persists suites on top of a [`SuiteStore`].
pub struct SuiteCatalog<'a, S: SuiteStore + ?Sized> {
    store: &'a mut S,
}

impl<'a, S: SuiteStore + ?Sized> SuiteCatalog<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    /// Returns the persisted suite, or a fresh empty one when none exists.
    pub fn get_or_create(&mut self, name: &str) -> CatalogResult<Suite> {
        match self.store.get(name) {
            Ok(suite) => {
                info!(suite = %name, rules = suite.rules.len(), "suite loaded");
                Ok(suite)
            }
            Err(CatalogError::SuiteNotFound(_)) => {
                info!(suite = %name, "suite not found, creating");
                self.store.create(name)
            }
            Err(err) => Err(err),
        }
    }

    /// Appends `rule` unless the suite already holds a rule of the same kind.
    pub fn add_rule_if_absent(&self, suite: &mut Suite, rule: Rule) -> bool {
        let kind = rule.kind;
        if suite.add_rule_if_absent(rule) {
            info!(suite = %suite.name, rule = %kind, "rule added");
            return true;
        }
        warn!(suite = %suite.name, rule = %kind, "rule of this kind already present, skipped");
        false
    }

    pub fn save(&mut self, suite: &Suite) -> CatalogResult<()> {
        self.store.save(suite)
    }
}
