use chrono::{DateTime, Utc};
use energy_core::RunningEnergy;
use rand::Rng;
use serde::Serialize;
use uuid::Uuid;

use crate::config::{SimulationConfig, WattsRange};

/// Body posted to `/api/readings`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatedReading {
    pub device_id: Uuid,
    pub watts: f64,
    pub voltage: f64,
    pub current: f64,
    /// Cumulative kWh since the simulation started.
    pub energy: f64,
    pub timestamp: DateTime<Utc>,
}

/// Produces random power draws and keeps a running trapezoidal energy total.
pub struct ReadingGenerator<R: Rng> {
    rng: R,
    device_id: Uuid,
    watts: WattsRange,
    voltage: f64,
    energy: RunningEnergy,
}

impl<R: Rng> ReadingGenerator<R> {
    pub fn new(rng: R, device_id: Uuid, sim: &SimulationConfig) -> Self {
        Self {
            rng,
            device_id,
            watts: sim.watts,
            voltage: sim.voltage,
            energy: RunningEnergy::new(),
        }
    }

    pub fn next_reading(&mut self, at: DateTime<Utc>) -> SimulatedReading {
        let raw = self.rng.gen_range(self.watts.min..=self.watts.max);
        self.reading_with(at, round2(raw))
    }

    fn reading_with(&mut self, at: DateTime<Utc>, watts: f64) -> SimulatedReading {
        let energy = self.energy.push(&(at, watts));

        SimulatedReading {
            device_id: self.device_id,
            watts,
            voltage: self.voltage,
            current: watts / self.voltage,
            energy,
            timestamp: at,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
