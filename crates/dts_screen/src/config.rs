//! Optional YAML configuration
//!
//! Looked up at `--config <path>` or, when that flag is absent, at
//! `~/.dts_screen/config.yaml` if the file exists:
//!
//! ```yaml
//! engine: dts
//! driver: conda run -n smk snakemake
//! result_pattern: "*.res"
//! backend_args: -j 8
//! dts_args: -top topology.top -nt 4
//! resources:
//!   mem_mb: 4000
//!   runtime: 120
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use color_eyre::eyre::WrapErr;
use dts_screen_core::{BackendOptions, Resources};

/// A scalar YAML value kept as the text it will be written as
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(untagged)]
pub enum ConfigScalar {
    Integer(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl fmt::Display for ConfigScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigScalar::Integer(v) => write!(f, "{v}"),
            ConfigScalar::Float(v) => write!(f, "{v}"),
            ConfigScalar::Bool(v) => write!(f, "{v}"),
            ConfigScalar::Text(v) => f.write_str(v),
        }
    }
}

/// Settings read from config.yaml; every key is optional
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    pub engine: Option<String>,
    pub driver: Option<String>,
    pub result_pattern: Option<String>,
    pub backend_args: Option<String>,
    pub dts_args: Option<String>,
    pub resources: BTreeMap<String, ConfigScalar>,
}

impl ScreenConfig {
    /// Get the default config path (~/.dts_screen/config.yaml)
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".dts_screen").join("config.yaml"))
    }

    /// Load the config file
    pub fn load(path: &Path) -> color_eyre::Result<Self> {
        let content = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config {}", path.display()))?;
        serde_saphyr::from_str(&content)
            .wrap_err_with(|| format!("Failed to parse config {}", path.display()))
    }

    /// Load an explicit config, or the default one if it exists, or nothing
    pub fn resolve(explicit: Option<&Path>) -> color_eyre::Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => {
                tracing::debug!(path = %path.display(), "using default config");
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Backend commands with config overrides applied
    pub fn backend_options(&self) -> BackendOptions {
        let defaults = BackendOptions::default();
        BackendOptions {
            engine: self.engine.clone().unwrap_or(defaults.engine),
            driver: self.driver.clone().unwrap_or(defaults.driver),
            result_pattern: self.result_pattern.clone().unwrap_or(defaults.result_pattern),
        }
    }

    /// Config resources as text, ready to be overridden from the command line
    pub fn resources(&self) -> Resources {
        self.resources
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect()
    }
}

/// Parse `KEY=VALUE` pairs separated by commas (e.g. `mem_mb=4000,runtime=120`).
///
/// Items are split on the first `=`; items without one are skipped.
pub fn parse_resources(spec: &str) -> Resources {
    let mut resources = Resources::new();
    for item in spec.trim().split(',') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        match item.split_once('=') {
            Some((key, value)) => {
                resources.insert(key.trim().to_string(), value.trim().to_string());
            }
            None => tracing::warn!(item, "ignoring resource without '='"),
        }
    }
    resources
}
