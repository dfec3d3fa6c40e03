use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::config::{Config, MAX_ONLINE_THRESHOLD_SECS};
use crate::energy::{ConsumptionSummary, ConsumptionWindow, TimeRange};
use crate::error::{AppError, Result};
use crate::repositories::{Device, DeviceRegistry, Reading, ReadingStore};

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceConsumption {
    pub device_id: Uuid,
    pub summary: ConsumptionSummary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FleetConsumption {
    pub devices: Vec<DeviceConsumption>,
    pub total_energy_kwh: f64,
    pub total_estimated_cost: f64,
    pub reading_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceStatus {
    pub device: Device,
    pub latest: Option<Reading>,
    pub online: bool,
    pub last_seen_secs: Option<i64>,
}

/// Joins the reading store with the integrator using the configured rate and window.
#[derive(Clone)]
pub struct ConsumptionService {
    readings: Arc<dyn ReadingStore>,
    devices: Arc<dyn DeviceRegistry>,
    window: ConsumptionWindow,
    cost_per_kwh: f64,
    online_threshold: Duration,
}

impl ConsumptionService {
    pub fn new(
        readings: Arc<dyn ReadingStore>,
        devices: Arc<dyn DeviceRegistry>,
        config: &Config,
    ) -> Self {
        Self {
            readings,
            devices,
            window: config.consumption.window,
            cost_per_kwh: config.billing.cost_per_kwh,
            online_threshold: online_threshold(config.devices.online_threshold_secs),
        }
    }

    pub fn window(&self) -> ConsumptionWindow {
        self.window
    }

    pub fn cost_per_kwh(&self) -> f64 {
        self.cost_per_kwh
    }

    pub async fn device_consumption(
        &self,
        device_id: Uuid,
        range: &TimeRange,
    ) -> Result<DeviceConsumption> {
        self.require_device(device_id).await?;
        self.summarize_device(device_id, range).await
    }

    /// Per-device summaries for every registered device, newest device first.
    pub async fn fleet_consumption(&self, range: &TimeRange) -> Result<FleetConsumption> {
        let devices = self.devices.list().await?;

        let mut per_device = Vec::with_capacity(devices.len());
        let mut total_energy_kwh = 0.0;
        let mut reading_count = 0;
        for device in &devices {
            let consumption = self.summarize_device(device.id, range).await?;
            total_energy_kwh += consumption.summary.energy_kwh;
            reading_count += consumption.summary.reading_count;
            per_device.push(consumption);
        }

        Ok(FleetConsumption {
            devices: per_device,
            total_energy_kwh,
            total_estimated_cost: total_energy_kwh * self.cost_per_kwh,
            reading_count,
        })
    }

    pub async fn device_status(&self, device_id: Uuid) -> Result<DeviceStatus> {
        self.device_status_at(device_id, Utc::now()).await
    }

    pub async fn device_status_at(
        &self,
        device_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<DeviceStatus> {
        let device = self.require_device(device_id).await?;
        let latest = self.readings.latest(device_id).await?;

        let age = latest.as_ref().map(|r| now - r.timestamp);
        let online = age.is_some_and(|age| age < self.online_threshold);
        let last_seen_secs = age.map(|age| age.num_seconds().max(0));

        Ok(DeviceStatus {
            device,
            latest,
            online,
            last_seen_secs,
        })
    }

    async fn require_device(&self, device_id: Uuid) -> Result<Device> {
        self.devices
            .get(device_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Device {} not found", device_id)))
    }

    async fn summarize_device(
        &self,
        device_id: Uuid,
        range: &TimeRange,
    ) -> Result<DeviceConsumption> {
        let limit = match self.window {
            ConsumptionWindow::Full => None,
            ConsumptionWindow::Latest { count } => Some(count),
        };
        let readings = self.readings.query(device_id, range, limit).await?;
        let summary = self.window.summarize(&readings, range, self.cost_per_kwh);

        debug!(
            device_id = %device_id,
            readings = summary.reading_count,
            energy_kwh = summary.energy_kwh,
            "Computed consumption"
        );

        Ok(DeviceConsumption { device_id, summary })
    }
}

// Same cap as `Config::validate`.
fn online_threshold(secs: u64) -> Duration {
    Duration::seconds(secs.min(MAX_ONLINE_THRESHOLD_SECS) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{MemoryStore, NewDevice, NewReading};
    use chrono::TimeZone;

    const CONFIG: &str = "auth:\n  jwt_secret: test\n";

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
    }

    fn service_with(store: Arc<MemoryStore>, window: ConsumptionWindow) -> ConsumptionService {
        let mut config: Config = serde_yaml::from_str(CONFIG).unwrap();
        config.consumption.window = window;
        ConsumptionService::new(store.clone(), store, &config)
    }

    async fn device(store: &MemoryStore, name: &str) -> Device {
        DeviceRegistry::create(
            store,
            NewDevice {
                name: name.to_string(),
                location: "Lab".to_string(),
            },
        )
        .await
        .unwrap()
    }

    async fn record(store: &MemoryStore, device_id: Uuid, hours: i64, watts: f64) {
        store
            .insert(NewReading {
                device_id,
                timestamp: t0() + Duration::hours(hours),
                watts,
                voltage: None,
                current: None,
                energy: None,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_device_consumption_integrates_store_readings() {
        let store = Arc::new(MemoryStore::new());
        let meter = device(&store, "Meter").await;
        record(&store, meter.id, 2, 0.0).await;
        record(&store, meter.id, 0, 0.0).await;
        record(&store, meter.id, 1, 200.0).await;

        let service = service_with(store, ConsumptionWindow::Full);
        let result = service
            .device_consumption(meter.id, &TimeRange::unbounded())
            .await
            .unwrap();

        assert_eq!(result.summary.energy_kwh, 0.2);
        assert_eq!(result.summary.estimated_cost, 0.2 * 0.12);
        assert_eq!(result.summary.reading_count, 3);
    }

    #[tokio::test]
    async fn test_unknown_device_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let service = service_with(store, ConsumptionWindow::Full);
        let err = service
            .device_consumption(Uuid::new_v4(), &TimeRange::unbounded())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_latest_window_limits_integrated_readings() {
        let store = Arc::new(MemoryStore::new());
        let meter = device(&store, "Meter").await;
        for (hours, watts) in [(0, 1000.0), (1, 1000.0), (2, 100.0), (3, 100.0)] {
            record(&store, meter.id, hours, watts).await;
        }

        let service = service_with(store, ConsumptionWindow::Latest { count: 2 });
        let result = service
            .device_consumption(meter.id, &TimeRange::unbounded())
            .await
            .unwrap();

        assert_eq!(result.summary.reading_count, 2);
        assert_eq!(result.summary.energy_kwh, 0.1);
    }

    #[tokio::test]
    async fn test_fleet_totals_sum_devices() {
        let store = Arc::new(MemoryStore::new());
        let a = device(&store, "A").await;
        let b = device(&store, "B").await;
        let idle = device(&store, "Idle").await;
        record(&store, a.id, 0, 100.0).await;
        record(&store, a.id, 1, 100.0).await;
        record(&store, b.id, 0, 300.0).await;
        record(&store, b.id, 1, 300.0).await;

        let service = service_with(store, ConsumptionWindow::Full);
        let fleet = service
            .fleet_consumption(&TimeRange::unbounded())
            .await
            .unwrap();

        assert_eq!(fleet.devices.len(), 3);
        assert!((fleet.total_energy_kwh - 0.4).abs() < 1e-12);
        assert_eq!(fleet.total_estimated_cost, fleet.total_energy_kwh * 0.12);
        assert_eq!(fleet.reading_count, 4);

        let idle_summary = fleet
            .devices
            .iter()
            .find(|d| d.device_id == idle.id)
            .unwrap();
        assert_eq!(idle_summary.summary, ConsumptionSummary::empty());
    }

    #[tokio::test]
    async fn test_device_status_online_threshold() {
        let store = Arc::new(MemoryStore::new());
        let meter = device(&store, "Meter").await;
        let service = service_with(store.clone(), ConsumptionWindow::Full);

        let status = service.device_status_at(meter.id, t0()).await.unwrap();
        assert!(!status.online);
        assert!(status.latest.is_none());
        assert!(status.last_seen_secs.is_none());

        record(&store, meter.id, 0, 50.0).await;

        let fresh = service
            .device_status_at(meter.id, t0() + Duration::seconds(59))
            .await
            .unwrap();
        assert!(fresh.online);
        assert_eq!(fresh.last_seen_secs, Some(59));

        let stale = service
            .device_status_at(meter.id, t0() + Duration::seconds(60))
            .await
            .unwrap();
        assert!(!stale.online);
        assert_eq!(stale.latest.unwrap().watts, 50.0);
    }

    #[tokio::test]
    async fn test_oversized_online_threshold_is_clamped() {
        let store = Arc::new(MemoryStore::new());
        let meter = device(&store, "Meter").await;
        record(&store, meter.id, 0, 50.0).await;

        let mut config: Config = serde_yaml::from_str(CONFIG).unwrap();
        config.devices.online_threshold_secs = 10_000_000_000_000_000;
        let service = ConsumptionService::new(store.clone(), store, &config);

        let within = t0() + Duration::seconds(MAX_ONLINE_THRESHOLD_SECS as i64 - 1);
        assert!(service.device_status_at(meter.id, within).await.unwrap().online);

        let beyond = t0() + Duration::seconds(MAX_ONLINE_THRESHOLD_SECS as i64);
        assert!(!service.device_status_at(meter.id, beyond).await.unwrap().online);
    }
}
