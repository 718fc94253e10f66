//! Serializable pipeline configuration.
//!
//! One TOML file describes a deployment: where the universe, blacklist and
//! ticker map live, which secrets to read, which enrichment collaborators
//! exist, and which optional steps run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_UNIVERSE_URL: &str =
    "https://numerai-signals-public-data.s3-us-west-2.amazonaws.com/universe/latest.csv";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Complete configuration for one pipeline deployment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Published universe CSV.
    pub universe_url: String,

    /// Local universe CSV; when set it replaces `universe_url` (offline runs).
    pub universe_path: Option<PathBuf>,

    /// Newline-delimited blacklist of Bloomberg tickers.
    pub blacklist_path: PathBuf,

    /// Persisted ticker map.
    pub ticker_map_path: PathBuf,

    /// Run enrichment passes even when the universe brought no new tickers.
    pub enrich_existing: bool,

    /// Persist the map even when the run changed nothing.
    pub always_persist: bool,

    /// Compute everything, persist and export nothing.
    pub dry_run: bool,

    pub secrets: SecretNames,
    pub alerts: AlertConfig,
    pub vendor: VendorConfig,

    /// Universe list export. Absent means no export.
    pub export: Option<ExportConfig>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            universe_url: DEFAULT_UNIVERSE_URL.to_string(),
            universe_path: None,
            blacklist_path: PathBuf::from("numerai_blacklist.txt"),
            ticker_map_path: PathBuf::from("data/ticker_map.csv"),
            enrich_existing: false,
            always_persist: false,
            dry_run: false,
            secrets: SecretNames::default(),
            alerts: AlertConfig::default(),
            vendor: VendorConfig::default(),
            export: None,
        }
    }
}

impl PipelineConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.universe_path.is_none() && self.universe_url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "one of universe_url or universe_path is required".into(),
            ));
        }
        if self.alerts.channel.trim().is_empty() {
            return Err(ConfigError::Invalid("alerts.channel must not be empty".into()));
        }
        if let Some(export) = &self.export {
            if export.path.trim().is_empty() {
                return Err(ConfigError::Invalid("export.path must not be empty".into()));
            }
        }
        Ok(())
    }
}

/// Names of secrets, resolved through a secret source at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SecretNames {
    pub slack_token: String,
    pub eodhd_api_token: String,
}

impl Default for SecretNames {
    fn default() -> Self {
        Self {
            slack_token: "slack-token-alert-bot".into(),
            eodhd_api_token: "eodhd-api-token".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlertConfig {
    pub channel: String,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            channel: "#signals-alerts".into(),
        }
    }
}

/// Enrichment collaborators. A stage whose collaborator is absent is left
/// out of the plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VendorConfig {
    /// Vendor mapping tables used at onboarding, earliest wins.
    pub mapping_tables: Vec<PathBuf>,

    /// `bloomberg_ticker,country` reference table.
    pub country_table: Option<PathBuf>,

    /// `bloomberg_ticker,polygon_ticker` reference table.
    pub polygon_table: Option<PathBuf>,

    /// Enable the EODHD ISIN and fundamentals passes.
    pub eodhd: bool,

    pub eodhd_base_url: Option<String>,

    /// Legacy suffix → EODHD exchange code, on top of the built-in table.
    pub eodhd_suffix_overrides: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportConfig {
    /// Local directory standing in for the artifact bucket.
    pub root: PathBuf,

    /// Logical path of the universe list inside the store.
    #[serde(default = "default_export_path")]
    pub path: String,
}

fn default_export_path() -> String {
    "numerai-universe.txt".into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_uses_defaults() {
        let c = PipelineConfig::from_toml("").unwrap();
        assert_eq!(c, PipelineConfig::default());
        assert_eq!(c.universe_url, DEFAULT_UNIVERSE_URL);
        assert!(!c.enrich_existing);
        assert!(c.export.is_none());
    }

    #[test]
    fn full_config_parses() {
        let toml = r##"
            blacklist_path = "cfg/blacklist.txt"
            ticker_map_path = "cfg/map.csv"
            enrich_existing = true

            [alerts]
            channel = "#ops"

            [vendor]
            mapping_tables = ["a.csv", "b.csv"]
            country_table = "country.csv"
            eodhd = true
            eodhd_suffix_overrides = { T = "JP" }

            [export]
            root = "out"
        "##;
        let c = PipelineConfig::from_toml(toml).unwrap();
        assert!(c.enrich_existing);
        assert_eq!(c.alerts.channel, "#ops");
        assert_eq!(c.vendor.mapping_tables.len(), 2);
        assert_eq!(c.vendor.eodhd_suffix_overrides.get("T").map(String::as_str), Some("JP"));
        let export = c.export.unwrap();
        assert_eq!(export.path, "numerai-universe.txt");
        assert_eq!(c.secrets.slack_token, "slack-token-alert-bot");
    }

    #[test]
    fn blank_channel_is_invalid() {
        let err = PipelineConfig::from_toml("[alerts]\nchannel = \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unknown_type_is_parse_error() {
        let err = PipelineConfig::from_toml("enrich_existing = \"yes\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
