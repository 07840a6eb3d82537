//! Serializable run configuration.

use std::path::{Path, PathBuf};

use aurum_core::config::{AnalysisConfig, ConfigError};
use serde::{Deserialize, Serialize};

/// Content hash identifying a configuration.
pub type ConfigId = String;

/// Everything one `aurum analyze` invocation needs.
///
/// ```toml
/// output = "data.json"
/// data_dir = "bars"
///
/// [analysis]
/// symbol = "GC=F"
///
/// [analysis.scoring]
/// signal_threshold = 25
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunConfig {
    pub analysis: AnalysisConfig,

    /// Where the JSON report is written.
    pub output: PathBuf,

    /// Directory of `{symbol}_{timeframe}.csv` files; used instead of Yahoo when set.
    pub data_dir: Option<PathBuf>,

    /// Never make network requests.
    pub offline: bool,

    /// Generate synthetic bars for any primary series that cannot be loaded.
    pub synthetic: bool,

    /// Evaluate the analysis stages on the rayon pool.
    pub parallel: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            analysis: AnalysisConfig::default(),
            output: PathBuf::from("data.json"),
            data_dir: None,
            offline: false,
            synthetic: false,
            parallel: true,
        }
    }
}

impl RunConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::Invalid(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.analysis.validate()?;
        if self.output.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("output path must not be empty".into()));
        }
        if self.offline && self.data_dir.is_none() && !self.synthetic {
            return Err(ConfigError::Invalid(
                "offline runs need data_dir or synthetic".into(),
            ));
        }
        Ok(())
    }

    /// Deterministic BLAKE3 hash of the analysis parameters.
    ///
    /// Two runs with the same id and the same dataset hash produce the same report.
    pub fn config_id(&self) -> ConfigId {
        match serde_json::to_string(&self.analysis) {
            Ok(json) => blake3::hash(json.as_bytes()).to_hex().to_string(),
            Err(_) => String::new(),
        }
    }
}
