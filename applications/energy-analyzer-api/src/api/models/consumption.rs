use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::energy::{ConsumptionSummary, ConsumptionWindow, TimeRange};
use crate::services::{DeviceConsumption, FleetConsumption};

/// Pricing and range echoed back with every consumption response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumptionContext {
    pub window: ConsumptionWindow,
    #[serde(rename = "costPerKWh")]
    pub cost_per_kwh: f64,
    pub currency: String,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl ConsumptionContext {
    pub fn new(
        window: ConsumptionWindow,
        cost_per_kwh: f64,
        currency: &str,
        range: &TimeRange,
    ) -> Self {
        Self {
            window,
            cost_per_kwh,
            currency: currency.to_string(),
            from: range.from,
            to: range.to,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceConsumptionEntry {
    pub device_id: Uuid,
    #[serde(flatten)]
    pub summary: ConsumptionSummary,
}

impl From<DeviceConsumption> for DeviceConsumptionEntry {
    fn from(consumption: DeviceConsumption) -> Self {
        Self {
            device_id: consumption.device_id,
            summary: consumption.summary,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeviceConsumptionResponse {
    #[serde(flatten)]
    pub consumption: DeviceConsumptionEntry,
    #[serde(flatten)]
    pub context: ConsumptionContext,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetConsumptionResponse {
    pub devices: Vec<DeviceConsumptionEntry>,
    #[serde(rename = "totalEnergyKWh")]
    pub total_energy_kwh: f64,
    pub total_estimated_cost: f64,
    pub reading_count: usize,
    #[serde(flatten)]
    pub context: ConsumptionContext,
}

impl FleetConsumptionResponse {
    pub fn new(fleet: FleetConsumption, context: ConsumptionContext) -> Self {
        Self {
            devices: fleet.devices.into_iter().map(Into::into).collect(),
            total_energy_kwh: fleet.total_energy_kwh,
            total_estimated_cost: fleet.total_estimated_cost,
            reading_count: fleet.reading_count,
            context,
        }
    }
}
