use crate::core::dca::Frequency;
use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

/// Smallest periodic amount accepted for a plan.
pub const MIN_AMOUNT: f64 = 10.0;
/// Smallest future price accepted for a projection.
pub const MIN_FUTURE_PRICE: f64 = 10_000.0;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PlanConfig {
    pub start_date: NaiveDate,
    pub amount: f64,
    pub frequency: Frequency,
    /// Weekday index (0 = Monday) for weekly plans, day of month for monthly.
    #[serde(default)]
    pub day: Option<u32>,
}

impl Default for PlanConfig {
    fn default() -> Self {
        PlanConfig {
            start_date: NaiveDate::from_ymd_opt(2018, 1, 1).unwrap_or_default(),
            amount: 100.0,
            frequency: Frequency::Daily,
            day: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProjectionConfig {
    pub future_price: f64,
    pub future_date: NaiveDate,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        ProjectionConfig {
            future_price: 1_000_000.0,
            future_date: NaiveDate::from_ymd_opt(2030, 12, 31).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct YahooProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProvidersConfig {
    pub yahoo: Option<YahooProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            yahoo: Some(YahooProviderConfig {
                base_url: "https://query1.finance.yahoo.com".to_string(),
            }),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CacheConfig {
    pub ttl_hours: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig { ttl_hours: 12 }
    }
}

fn default_asset() -> String {
    "BTC-USD".to_string()
}

fn default_history_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2009, 1, 1).unwrap_or_default()
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default = "default_asset")]
    pub asset: String,
    #[serde(default = "default_history_start")]
    pub history_start: NaiveDate,
    #[serde(default)]
    pub plan: PlanConfig,
    #[serde(default)]
    pub projection: ProjectionConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            asset: default_asset(),
            history_start: default_history_start(),
            plan: PlanConfig::default(),
            projection: ProjectionConfig::default(),
            providers: ProvidersConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads the default config file, falling back to built-in defaults when
    /// it does not exist yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("xyz", "stackcalc", "stackcalc")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn yahoo_base_url(&self) -> &str {
        self.providers
            .yahoo
            .as_ref()
            .map_or("https://query1.finance.yahoo.com", |p| &p.base_url)
    }

    /// Checks the input floors a projection is allowed to run with.
    pub fn validate(&self) -> Result<()> {
        if self.asset.trim().is_empty() {
            bail!("Asset symbol must not be empty");
        }
        if !(self.plan.amount >= MIN_AMOUNT) {
            bail!(
                "Periodic amount must be at least {MIN_AMOUNT}, got {}",
                self.plan.amount
            );
        }
        if !(self.projection.future_price >= MIN_FUTURE_PRICE) {
            bail!(
                "Future price must be at least {MIN_FUTURE_PRICE}, got {}",
                self.projection.future_price
            );
        }
        Ok(())
    }
}
