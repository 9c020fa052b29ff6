use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::app::Theme;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    pub forecast: ForecastConfig,
    pub workers: WorkersConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub seed: u64,
    pub vendors: Vec<String>,
    pub start_month: NaiveDate,
    pub months: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    pub horizon: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkersConfig {
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    pub theme: Theme,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    pub fn default_config() -> Self {
        Self {
            data: DataConfig {
                seed: 42,
                vendors: [
                    "PT PMS",
                    "PT KARYA JAYA",
                    "PT MANDIRI SEJAHTERA",
                    "PT SUKSES BERSAMA",
                    "PT MAKMUR ABADI",
                    "PT MITRA USAHA",
                ]
                .iter()
                .map(|name| name.to_string())
                .collect(),
                start_month: NaiveDate::from_ymd_opt(2023, 6, 1).unwrap_or_default(),
                months: 3,
            },
            forecast: ForecastConfig { horizon: 3 },
            workers: WorkersConfig { count: 10 },
            ui: UiConfig { theme: Theme::Dark },
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("parse config TOML")?;
        config.validate().context("invalid configuration")?;
        Ok(config)
    }

    /// Vendor names become series keys, so each must be present and unique.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for vendor in &self.data.vendors {
            let name = vendor.trim();
            if name.is_empty() {
                bail!("data.vendors contains an empty name");
            }
            if name != vendor {
                bail!("vendor name {vendor:?} has surrounding whitespace");
            }
            if !seen.insert(name) {
                bail!("vendor {name} is listed more than once");
            }
        }
        Ok(())
    }

    pub fn to_toml_string(&self) -> Result<String> {
        let output = toml::to_string_pretty(self).context("render config TOML")?;
        Ok(output)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("read config at {}", path.display()))?;
        Self::from_toml_str(&contents)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default_config()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create config dir {}", parent.display()))?;
        }
        let contents = self.to_toml_string()?;
        fs::write(path, contents).with_context(|| format!("write config at {}", path.display()))?;
        Ok(())
    }
}
