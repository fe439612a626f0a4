// src/config.rs
//! Service configuration: `config/app.toml` (or `$ATLAS_CONFIG_PATH`), then
//! env overrides, then built-in defaults. Only the binaries call this; the
//! library itself never reads the environment.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::data::source::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT};
use crate::data::{CsvSource, HttpTimeouts, TopoJsonSource};
use crate::keys::AliasTable;
use crate::loader::DataLoader;
use crate::scene::SceneCatalog;

pub const DEFAULT_CONFIG_PATH: &str = "config/app.toml";
pub const DEFAULT_TABULAR_LOCATION: &str = "data/labor_gap_long.csv";
pub const DEFAULT_GEO_LOCATION: &str = "https://cdn.jsdelivr.net/npm/world-atlas@2/countries-110m.json";

pub const ENV_CONFIG_PATH: &str = "ATLAS_CONFIG_PATH";
pub const ENV_TABULAR_LOCATION: &str = "LABOR_DATA_LOCATION";
pub const ENV_GEO_LOCATION: &str = "WORLD_ATLAS_LOCATION";
pub const ENV_ALIASES_PATH: &str = "ALIASES_PATH";
pub const ENV_SCENES_PATH: &str = "SCENES_PATH";
pub const ENV_METRICS_ENABLED: &str = "METRICS_ENABLED";

fn default_tabular() -> String {
    DEFAULT_TABULAR_LOCATION.to_string()
}
fn default_geo() -> String {
    DEFAULT_GEO_LOCATION.to_string()
}
fn default_object() -> String {
    crate::data::geo::DEFAULT_OBJECT.to_string()
}
fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT.as_millis() as u64
}
fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT.as_millis() as u64
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DataConfig {
    /// File path or http(s) URL of the long-format CSV.
    #[serde(default = "default_tabular")]
    pub tabular: String,
    /// File path or http(s) URL of the world-atlas topology.
    #[serde(default = "default_geo")]
    pub geo: String,
    #[serde(default = "default_object")]
    pub geo_object: String,
    /// Applies to URL sources only.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl DataConfig {
    pub fn timeouts(&self) -> HttpTimeouts {
        HttpTimeouts {
            connect: Duration::from_millis(self.connect_timeout_ms),
            request: Duration::from_millis(self.request_timeout_ms),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            tabular: default_tabular(),
            geo: default_geo(),
            geo_object: default_object(),
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub data: DataConfig,
    /// Alias file (JSON or TOML); built-in seed when absent.
    #[serde(default)]
    pub aliases_path: Option<PathBuf>,
    /// Scene catalog TOML; built-in presets when absent.
    #[serde(default)]
    pub scenes_path: Option<PathBuf>,
    #[serde(default)]
    pub metrics_enabled: bool,
}

impl AppConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing app config toml")
    }

    /// Resolve using env var + fallbacks:
    /// 1) $ATLAS_CONFIG_PATH (must exist)
    /// 2) config/app.toml
    /// 3) defaults
    /// and then apply per-field env overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = match std::env::var(ENV_CONFIG_PATH) {
            Ok(p) => {
                let pb = PathBuf::from(p);
                if !pb.exists() {
                    return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
                }
                Self::load_from(&pb)?
            }
            Err(_) => {
                let pb = PathBuf::from(DEFAULT_CONFIG_PATH);
                if pb.exists() {
                    Self::load_from(&pb)?
                } else {
                    Self::default()
                }
            }
        };
        cfg.apply_env();
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading app config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    fn apply_env(&mut self) {
        let non_empty = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        if let Some(v) = non_empty(ENV_TABULAR_LOCATION) {
            self.data.tabular = v;
        }
        if let Some(v) = non_empty(ENV_GEO_LOCATION) {
            self.data.geo = v;
        }
        if let Some(v) = non_empty(ENV_ALIASES_PATH) {
            self.aliases_path = Some(PathBuf::from(v));
        }
        if let Some(v) = non_empty(ENV_SCENES_PATH) {
            self.scenes_path = Some(PathBuf::from(v));
        }
        if let Some(v) = non_empty(ENV_METRICS_ENABLED) {
            self.metrics_enabled = matches!(v.trim(), "1" | "true" | "yes");
        }
    }

    pub fn aliases(&self) -> Result<AliasTable> {
        match &self.aliases_path {
            Some(p) => AliasTable::load_from_file(p),
            None => Ok(AliasTable::default_seed()),
        }
    }

    pub fn scenes(&self) -> Result<SceneCatalog> {
        match &self.scenes_path {
            Some(p) => SceneCatalog::load_from_file(p),
            None => Ok(SceneCatalog::builtin()),
        }
    }

    /// Loader wired to the configured locations. Nothing is fetched yet.
    pub fn loader(&self) -> Result<DataLoader> {
        let timeouts = self.data.timeouts();
        let tabular = CsvSource::with_timeouts(&self.data.tabular, timeouts);
        let geo = TopoJsonSource::with_timeouts(&self.data.geo, timeouts)
            .with_object(self.data.geo_object.clone());
        Ok(DataLoader::new(
            Arc::new(tabular),
            Arc::new(geo),
            Arc::new(self.aliases()?),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = AppConfig::from_toml_str("[data]\ntabular = \"fixtures/x.csv\"\n").unwrap();
        assert_eq!(cfg.data.tabular, "fixtures/x.csv");
        assert_eq!(cfg.data.geo, DEFAULT_GEO_LOCATION);
        assert_eq!(cfg.data.geo_object, "countries");
        assert!(!cfg.metrics_enabled);
        assert!(cfg.scenes().unwrap().get(3).is_some());
        assert_eq!(cfg.data.timeouts(), HttpTimeouts::default());
    }

    #[test]
    fn http_timeouts_are_configurable() {
        let cfg = AppConfig::from_toml_str(
            "[data]\nconnect_timeout_ms = 250\nrequest_timeout_ms = 1500\n",
        )
        .unwrap();
        let t = cfg.data.timeouts();
        assert_eq!(t.connect, Duration::from_millis(250));
        assert_eq!(t.request, Duration::from_millis(1500));
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_fallbacks() {
        // Isolate CWD so a real config/ in the repo does not interfere
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        env::remove_var(ENV_CONFIG_PATH);
        env::remove_var(ENV_TABULAR_LOCATION);

        let cfg = AppConfig::load().unwrap();
        assert_eq!(cfg, AppConfig::default());

        let p = tmp.path().join("app.toml");
        fs::write(&p, "metrics_enabled = true\n[data]\ngeo = \"world.json\"\n").unwrap();
        env::set_var(ENV_CONFIG_PATH, p.display().to_string());
        env::set_var(ENV_TABULAR_LOCATION, "https://example.org/gap.csv");
        let cfg = AppConfig::load().unwrap();
        assert!(cfg.metrics_enabled);
        assert_eq!(cfg.data.geo, "world.json");
        assert_eq!(cfg.data.tabular, "https://example.org/gap.csv");

        env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml").display().to_string());
        assert!(AppConfig::load().is_err());

        env::remove_var(ENV_CONFIG_PATH);
        env::remove_var(ENV_TABULAR_LOCATION);
        env::set_current_dir(&old).unwrap();
    }
}
