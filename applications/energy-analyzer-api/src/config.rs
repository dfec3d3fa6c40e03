use crate::energy::{ConsumptionWindow, DEFAULT_COST_PER_KWH};
use anyhow::Context;
use energy_core::env::expand_env_placeholders;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Upper bound for `auth.jwt_expiry_hours` (one year).
pub const MAX_JWT_EXPIRY_HOURS: u64 = 24 * 365;

/// Upper bound for `devices.online_threshold_secs` (30 days).
pub const MAX_ONLINE_THRESHOLD_SECS: u64 = 30 * 24 * 3600;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Without a database section the API runs on the in-memory store.
    #[serde(default)]
    pub database: Option<DbConfig>,
    #[serde(default)]
    pub api: ApiConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub billing: BillingConfig,
    #[serde(default)]
    pub consumption: ConsumptionConfig,
    #[serde(default)]
    pub devices: DevicesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub port: u16,
}

fn default_api_host() -> String {
    "0.0.0.0".into()
}

fn default_api_port() -> u16 {
    5000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "default_jwt_expiry_hours")]
    pub jwt_expiry_hours: u64,
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
    /// When false, bearer tokens are validated if present but not demanded.
    #[serde(default = "default_auth_required")]
    pub required: bool,
}

fn default_jwt_expiry_hours() -> u64 {
    1
}

fn default_bcrypt_cost() -> u32 {
    10
}

fn default_auth_required() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    #[serde(default = "default_cost_per_kwh")]
    pub cost_per_kwh: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_cost_per_kwh() -> f64 {
    DEFAULT_COST_PER_KWH
}

fn default_currency() -> String {
    "USD".into()
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            cost_per_kwh: default_cost_per_kwh(),
            currency: default_currency(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsumptionConfig {
    #[serde(default)]
    pub window: ConsumptionWindow,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevicesConfig {
    /// A device is online while its latest reading is younger than this.
    #[serde(default = "default_online_threshold_secs")]
    pub online_threshold_secs: u64,
}

fn default_online_threshold_secs() -> u64 {
    60
}

impl Default for DevicesConfig {
    fn default() -> Self {
        Self {
            online_threshold_secs: default_online_threshold_secs(),
        }
    }
}

impl Config {
    /// Load YAML from disk, substitute $(VAR)/${VAR} with env vars, then parse.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_yaml(&raw)
    }

    /// Parse a YAML document, then apply env overrides and validate.
    ///
    /// Overrides: DATABASE_URL, JWT_SECRET, COST_PER_KWH, PORT.
    pub fn from_yaml(raw: &str) -> Result<Self, anyhow::Error> {
        let expanded = expand_env_placeholders(raw)?;
        let mut cfg: Self = serde_yaml::from_str(&expanded).context("failed to parse config YAML")?;

        if let Ok(url) = std::env::var("DATABASE_URL") {
            match cfg.database {
                Some(ref mut db) => db.url = url,
                None => {
                    cfg.database = Some(DbConfig {
                        url,
                        max_connections: default_max_connections(),
                    })
                }
            }
        }

        if let Ok(jwt_secret) = std::env::var("JWT_SECRET") {
            cfg.auth.jwt_secret = jwt_secret;
        }

        if let Ok(rate) = std::env::var("COST_PER_KWH") {
            cfg.billing.cost_per_kwh = rate
                .trim()
                .parse()
                .with_context(|| format!("COST_PER_KWH is not a number: {}", rate))?;
        }

        if let Ok(port) = std::env::var("PORT") {
            cfg.api.port = port
                .trim()
                .parse()
                .with_context(|| format!("PORT is not a valid port: {}", port))?;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        anyhow::ensure!(self.api.port != 0, "api.port cannot be 0");
        anyhow::ensure!(
            !self.auth.jwt_secret.trim().is_empty(),
            "auth.jwt_secret cannot be empty"
        );
        anyhow::ensure!(
            (1..=MAX_JWT_EXPIRY_HOURS).contains(&self.auth.jwt_expiry_hours),
            "auth.jwt_expiry_hours must be between 1 and {}",
            MAX_JWT_EXPIRY_HOURS
        );
        anyhow::ensure!(
            (4..=31).contains(&self.auth.bcrypt_cost),
            "auth.bcrypt_cost must be between 4 and 31"
        );
        anyhow::ensure!(
            self.billing.cost_per_kwh.is_finite() && self.billing.cost_per_kwh >= 0.0,
            "billing.cost_per_kwh must be a non-negative number"
        );
        anyhow::ensure!(
            self.devices.online_threshold_secs <= MAX_ONLINE_THRESHOLD_SECS,
            "devices.online_threshold_secs cannot exceed {}",
            MAX_ONLINE_THRESHOLD_SECS
        );
        if let Some(db) = &self.database {
            anyhow::ensure!(!db.url.is_empty(), "database.url cannot be empty");
            anyhow::ensure!(
                db.max_connections > 0,
                "database.max_connections must be at least 1"
            );
        }
        self.consumption
            .window
            .validate()
            .map_err(anyhow::Error::msg)?;
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}
