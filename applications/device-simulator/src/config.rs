use anyhow::Context;
use energy_core::env::expand_env_placeholders;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub backend: BackendConfig,
    pub device: DeviceConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub url: String,
    /// Credentials for `/api/auth/login`; both or neither.
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub name: String,
    #[serde(default = "default_location")]
    pub location: String,
    /// Reuse a registered device instead of creating a new one.
    pub id: Option<Uuid>,
}

fn default_location() -> String {
    "unknown".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(default = "default_voltage")]
    pub voltage: f64,
    #[serde(default)]
    pub watts: WattsRange,
}

fn default_interval_secs() -> u64 {
    10
}

fn default_count() -> u32 {
    60
}

fn default_voltage() -> f64 {
    230.0
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            count: default_count(),
            voltage: default_voltage(),
            watts: WattsRange::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WattsRange {
    pub min: f64,
    pub max: f64,
}

impl Default for WattsRange {
    fn default() -> Self {
        Self {
            min: 10.0,
            max: 2000.0,
        }
    }
}

impl Config {
    /// Load YAML from disk, substitute $(VAR)/${VAR} with env vars, then parse.
    /// Afterwards, if BACKEND_URL env is set, override `backend.url`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, anyhow::Error> {
        let expanded = expand_env_placeholders(raw)?;
        let mut cfg: Self = serde_yaml::from_str(&expanded).context("failed to parse config YAML")?;

        if let Ok(url) = std::env::var("BACKEND_URL") {
            cfg.backend.url = url;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        anyhow::ensure!(
            self.backend.url.starts_with("http://") || self.backend.url.starts_with("https://"),
            "backend.url must be an http(s) URL"
        );
        anyhow::ensure!(
            self.backend.email.is_some() == self.backend.password.is_some(),
            "backend.email and backend.password must be set together"
        );
        anyhow::ensure!(
            !self.device.name.trim().is_empty(),
            "device.name cannot be empty"
        );

        let sim = &self.simulation;
        anyhow::ensure!(sim.interval_secs > 0, "simulation.interval_secs must be at least 1");
        anyhow::ensure!(sim.count > 0, "simulation.count must be at least 1");
        anyhow::ensure!(
            sim.voltage.is_finite() && sim.voltage > 0.0,
            "simulation.voltage must be positive"
        );
        anyhow::ensure!(
            sim.watts.min.is_finite() && sim.watts.max.is_finite() && sim.watts.min <= sim.watts.max,
            "simulation.watts.min must not exceed simulation.watts.max"
        );
        Ok(())
    }

    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.backend.email, &self.backend.password) {
            (Some(email), Some(password)) => Some((email.as_str(), password.as_str())),
            _ => None,
        }
    }
}
