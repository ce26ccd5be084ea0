use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{Result, TrackerError};

const PLACEHOLDER_MARKER: &str = "YOUR_";

fn default_factory() -> String {
    "bogor".to_string()
}

fn default_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
    #[serde(default = "default_factory")]
    pub default_factory: String,
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub factories: BTreeMap<String, FactoryConfig>,
}

/// Source locations of one factory. Each location is an http(s) URL or a
/// local file path.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FactoryConfig {
    #[serde(default)]
    pub employees: String,
    #[serde(default)]
    pub submissions: String,
    #[serde(default)]
    pub submit: String,
    #[serde(default)]
    pub sheets: BTreeMap<String, String>,
}

/// A readable data set of a factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dataset {
    Employees,
    Submissions,
    Sheet(String),
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dataset::Employees => write!(f, "employees"),
            Dataset::Submissions => write!(f, "submissions"),
            Dataset::Sheet(sheet) => write!(f, "sheet '{sheet}'"),
        }
    }
}

/// The factory chosen for this invocation together with its sources.
#[derive(Debug, Clone)]
pub struct ResolvedFactory {
    pub key: String,
    pub sources: FactoryConfig,
}

impl TrackerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn factory_keys(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Picks the factory from an explicit key, else from a location path,
    /// else the configured default.
    pub fn resolve_factory(
        &self,
        explicit: Option<&str>,
        location: Option<&str>,
    ) -> Result<ResolvedFactory> {
        let key = match explicit {
            Some(key) => key.trim().to_lowercase(),
            None => match location.and_then(|loc| detect_factory(loc, &self.factory_keys())) {
                Some(key) => key,
                None => {
                    warn!(
                        default = %self.default_factory,
                        "factory not detected from location, using default"
                    );
                    self.default_factory.clone()
                }
            },
        };

        let sources = self
            .factories
            .get(&key)
            .cloned()
            .ok_or_else(|| TrackerError::UnknownFactory {
                factory: key.clone(),
                available: self.factory_keys().join(", "),
            })?;

        info!(factory = %key.to_uppercase(), "current factory");
        Ok(ResolvedFactory { key, sources })
    }
}

/// Finds a known factory named as a directory in `location`, e.g.
/// `/karawang/index.html`.
pub fn detect_factory(location: &str, known: &[&str]) -> Option<String> {
    let path = location.to_lowercase();
    known
        .iter()
        .map(|key| key.to_lowercase())
        .find(|key| path.contains(&format!("/{key}/")))
}

fn is_configured(location: &str) -> bool {
    let trimmed = location.trim();
    !trimmed.is_empty() && !trimmed.contains(PLACEHOLDER_MARKER)
}

impl ResolvedFactory {
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sources.sheets.keys().map(String::as_str).collect()
    }

    /// Where `dataset` is read from. Fails before any I/O when the location
    /// is unknown or left unset.
    pub fn location(&self, dataset: &Dataset) -> Result<&str> {
        let location = match dataset {
            Dataset::Employees => self.sources.employees.as_str(),
            Dataset::Submissions => self.sources.submissions.as_str(),
            Dataset::Sheet(sheet) => self
                .sources
                .sheets
                .get(sheet)
                .map(String::as_str)
                .ok_or_else(|| TrackerError::UnknownSheet {
                    sheet: sheet.clone(),
                    factory: self.key.clone(),
                    available: self.sheet_names().join(", "),
                })?,
        };
        self.require(location, &dataset.to_string())
    }

    pub fn submit_location(&self) -> Result<&str> {
        self.require(&self.sources.submit, "submit endpoint")
    }

    fn require<'a>(&self, location: &'a str, what: &str) -> Result<&'a str> {
        if is_configured(location) {
            Ok(location.trim())
        } else {
            Err(TrackerError::ConfigurationMissing {
                factory: self.key.clone(),
                what: what.to_string(),
            })
        }
    }
}
