//! Analyzer configuration
//!
//! Thresholds, the default category mapping, classifier limits and alert
//! settings, loaded from TOML.
//!
//! # Resolution
//!
//! 1. An explicit path (`--config`, or the `SPENDLENS_CONFIG` environment variable)
//! 2. The user override at `~/.config/spendlens/config.toml`
//! 3. Defaults embedded in the binary (`config/default.toml`)
//!
//! A file only needs the sections it changes. A `[thresholds]` or
//! `[categories]` table replaces the default table entirely; `[classifier]`
//! and `[alerts]` keys override one at a time.
//!
//! ```toml
//! [thresholds]
//! "Food & Dining" = 650
//! "Travel" = "1500.00"
//!
//! [classifier]
//! timeout_secs = 45
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::alerts::AlertSettings;
use crate::categorize::ClassifierSettings;
use crate::error::{Error, Result};
use crate::models::{CategoryMapping, ThresholdTable};

/// Embedded default config
const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "SPENDLENS_CONFIG";

/// Where the active configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Embedded,
    File(PathBuf),
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Embedded => write!(f, "built-in defaults"),
            ConfigSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Immutable settings shared by every analysis request
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub thresholds: ThresholdTable,
    /// Default override mapping; request mappings are overlaid on it
    pub categories: CategoryMapping,
    pub classifier: ClassifierSettings,
    /// Labels suggested to model-backed classifiers
    pub category_hints: Vec<String>,
    pub alerts: AlertSettings,
    pub source: ConfigSource,
}

impl Default for AnalyzerConfig {
    /// Empty tables and default limits; no thresholds, no mapping
    fn default() -> Self {
        Self {
            thresholds: ThresholdTable::new(),
            categories: CategoryMapping::new(),
            classifier: ClassifierSettings::default(),
            category_hints: Vec::new(),
            alerts: AlertSettings::default(),
            source: ConfigSource::Embedded,
        }
    }
}

impl AnalyzerConfig {
    /// Resolve and load configuration
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let explicit = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from));

        if let Some(path) = explicit {
            return Self::from_file(&path);
        }

        if let Some(user_path) = default_config_path() {
            if user_path.exists() {
                return Self::from_file(&user_path);
            }
        }

        Self::embedded()
    }

    /// The built-in defaults
    pub fn embedded() -> Result<Self> {
        let mut config = Self::default();
        config.apply(parse_raw(DEFAULT_CONFIG)?)?;
        Ok(config)
    }

    /// Built-in defaults with `content` layered on top
    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config = Self::embedded()?;
        config.apply(parse_raw(content)?)?;
        Ok(config)
    }

    /// Load a config file layered on the built-in defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_toml(&content)?;
        config.source = ConfigSource::File(path.to_path_buf());
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    fn apply(&mut self, raw: RawConfig) -> Result<()> {
        if let Some(thresholds) = raw.thresholds {
            let mut table = ThresholdTable::new();
            for (category, value) in thresholds {
                let limit = value.to_decimal(&category)?;
                table.insert(category, limit)?;
            }
            self.thresholds = table;
        }

        if let Some(categories) = raw.categories {
            self.categories = categories
                .into_iter()
                .map(|(from, to)| (from.trim().to_string(), to.trim().to_string()))
                .collect();
        }

        if let Some(classifier) = raw.classifier {
            if let Some(secs) = classifier.timeout_secs {
                if secs == 0 {
                    return Err(Error::Config("classifier.timeout_secs must be > 0".into()));
                }
                self.classifier.timeout = Duration::from_secs(secs);
            }
            if let Some(retries) = classifier.max_retries {
                self.classifier.max_retries = retries;
            }
            if let Some(concurrency) = classifier.concurrency {
                if concurrency == 0 {
                    return Err(Error::Config("classifier.concurrency must be > 0".into()));
                }
                self.classifier.concurrency = concurrency;
            }
            if let Some(hints) = classifier.category_hints {
                self.category_hints = hints;
            }
        }

        if let Some(alerts) = raw.alerts {
            if let Some(negative) = alerts.debits_are_negative {
                self.alerts.debits_are_negative = negative;
            }
        }

        Ok(())
    }
}

/// Default user override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("spendlens").join("config.toml"))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    thresholds: Option<BTreeMap<String, RawLimit>>,
    categories: Option<BTreeMap<String, String>>,
    classifier: Option<RawClassifier>,
    alerts: Option<RawAlerts>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawClassifier {
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
    concurrency: Option<usize>,
    category_hints: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAlerts {
    debits_are_negative: Option<bool>,
}

/// A threshold written as an integer, a float or a decimal string
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawLimit {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl RawLimit {
    fn to_decimal(&self, category: &str) -> Result<Decimal> {
        let invalid = || Error::Config(format!("Invalid threshold for '{}'", category));
        match self {
            RawLimit::Integer(n) => Ok(Decimal::from(*n)),
            RawLimit::Float(f) => Decimal::try_from(*f).map_err(|_| invalid()),
            RawLimit::Text(s) => Decimal::from_str(s.trim()).map_err(|_| invalid()),
        }
    }
}

fn parse_raw(content: &str) -> Result<RawConfig> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))
}
