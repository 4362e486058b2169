use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use etlcheck_core::{
    ColumnMapping, RedactedConnection, Rule, redact_connection_string, status_purchase_amount_rule,
};
use etlcheck_validate::PipelineSettings;

/// Environment variable that overrides `connection_string`.
pub const CONNECTION_ENV: &str = "ETLCHECK_CONNECTION_STRING";

pub const REQUIRED_KEYS: &[&str] = &[
    "data_source_name",
    "data_asset_name",
    "connection_string",
    "db_query",
    "source_suite_name",
    "target_suite_name",
    "batch_definition_name",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("config root must be a table of keys")]
    NotATable,
    #[error("missing required configuration keys: {}", .0.join(", "))]
    MissingKeys(Vec<String>),
}

/// Run configuration document.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EtlConfig {
    pub data_source_name: String,
    pub data_asset_name: String,
    /// Database connection descriptor; `ETLCHECK_CONNECTION_STRING` overrides it.
    #[serde(default)]
    pub connection_string: String,
    pub db_query: String,
    pub source_suite_name: String,
    pub target_suite_name: String,
    pub batch_definition_name: String,
    #[serde(default = "default_csv_path")]
    pub csv_path: PathBuf,
    #[serde(default = "default_column_mapping")]
    pub column_mapping: ColumnMapping,
    #[serde(default = "default_source_rules")]
    pub source_rules: Vec<Rule>,
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
}

fn default_csv_path() -> PathBuf {
    PathBuf::from("customers.csv")
}

fn default_column_mapping() -> ColumnMapping {
    [("CustomerID", "CustomerID")].into_iter().collect()
}

fn default_source_rules() -> Vec<Rule> {
    vec![status_purchase_amount_rule()]
}

fn default_preview_rows() -> usize {
    5
}

/// Config as written to run artifacts, with the connection redacted.
#[derive(Debug, Serialize)]
pub struct ResolvedConfig<'a> {
    pub data_source_name: &'a str,
    pub data_asset_name: &'a str,
    pub connection: RedactedConnection,
    pub db_query: &'a str,
    pub source_suite_name: &'a str,
    pub target_suite_name: &'a str,
    pub batch_definition_name: &'a str,
    pub csv_path: &'a Path,
    pub column_mapping: &'a ColumnMapping,
    pub source_rules: &'a [Rule],
    pub preview_rows: usize,
}

impl EtlConfig {
    pub fn settings(&self) -> PipelineSettings {
        PipelineSettings::new(
            &self.data_source_name,
            &self.data_asset_name,
            &self.batch_definition_name,
            &self.source_suite_name,
            &self.target_suite_name,
        )
        .with_column_mapping(self.column_mapping.clone())
        .with_source_rules(self.source_rules.clone())
    }

    pub fn resolved(&self) -> ResolvedConfig<'_> {
        ResolvedConfig {
            data_source_name: &self.data_source_name,
            data_asset_name: &self.data_asset_name,
            connection: redact_connection_string(&self.connection_string),
            db_query: &self.db_query,
            source_suite_name: &self.source_suite_name,
            target_suite_name: &self.target_suite_name,
            batch_definition_name: &self.batch_definition_name,
            csv_path: &self.csv_path,
            column_mapping: &self.column_mapping,
            source_rules: &self.source_rules,
            preview_rows: self.preview_rows,
        }
    }
}

/// Read the config file; TOML when the extension is `.toml`, JSON otherwise.
pub fn load_config(path: &Path) -> Result<EtlConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let override_conn = std::env::var(CONNECTION_ENV).ok();
    parse_config(&content, is_toml, override_conn.as_deref())
}

pub fn parse_config(
    content: &str,
    is_toml: bool,
    connection_override: Option<&str>,
) -> Result<EtlConfig, ConfigError> {
    let connection_override = connection_override.filter(|conn| !conn.trim().is_empty());

    // Key checks run on a generic document; the typed parse below reads the
    // source text directly so `column_mapping` keeps its document order.
    let document: Value = if is_toml {
        serde_json::to_value(toml::from_str::<toml::Value>(content)?)?
    } else {
        serde_json::from_str(content)?
    };
    let table = document.as_object().ok_or(ConfigError::NotATable)?;

    let missing: Vec<String> = REQUIRED_KEYS
        .iter()
        .filter(|key| !(**key == "connection_string" && connection_override.is_some()))
        .filter(|key| match table.get(**key) {
            None | Some(Value::Null) => true,
            Some(Value::String(value)) => value.trim().is_empty(),
            Some(_) => false,
        })
        .map(|key| key.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ConfigError::MissingKeys(missing));
    }

    let mut config: EtlConfig = if is_toml {
        toml::from_str(content)?
    } else {
        serde_json::from_str(content)?
    };
    if let Some(conn) = connection_override {
        config.connection_string = conn.to_string();
    }
    Ok(config)
}
