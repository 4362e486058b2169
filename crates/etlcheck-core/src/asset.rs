use serde::{Deserialize, Serialize};

/// Named logical dataset binding within a registered data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub name: String,
    pub source_name: String,
}

impl Asset {
    pub fn new(source_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_name: source_name.into(),
        }
    }
}

/// How a batch definition materializes its asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatchStrategy {
    /// The asset's current full dataset as a single snapshot.
    #[default]
    WholeDataset,
}

/// Named materialization of an asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchDefinition {
    pub name: String,
    pub asset_name: String,
    #[serde(default)]
    pub strategy: BatchStrategy,
}

impl BatchDefinition {
    pub fn whole_dataset(asset_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            asset_name: asset_name.into(),
            strategy: BatchStrategy::WholeDataset,
        }
    }
}
