use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rate applied when the configuration does not name one (currency units per kWh).
pub const DEFAULT_COST_PER_KWH: f64 = 0.12;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;
const WH_PER_KWH: f64 = 1000.0;

/// A timestamped power measurement.
pub trait PowerSample {
    fn timestamp(&self) -> DateTime<Utc>;
    fn watts(&self) -> f64;
}

impl<S: PowerSample + ?Sized> PowerSample for &S {
    fn timestamp(&self) -> DateTime<Utc> {
        (**self).timestamp()
    }

    fn watts(&self) -> f64 {
        (**self).watts()
    }
}

impl PowerSample for (DateTime<Utc>, f64) {
    fn timestamp(&self) -> DateTime<Utc> {
        self.0
    }

    fn watts(&self) -> f64 {
        self.1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumptionSummary {
    #[serde(rename = "energyKWh")]
    pub energy_kwh: f64,
    pub estimated_cost: f64,
    pub reading_count: usize,
}

impl ConsumptionSummary {
    pub fn empty() -> Self {
        Self {
            energy_kwh: 0.0,
            estimated_cost: 0.0,
            reading_count: 0,
        }
    }
}

/// Inclusive time bounds; a missing side is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl TimeRange {
    pub fn new(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        Self { from, to }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.from.map_or(true, |from| ts >= from) && self.to.map_or(true, |to| ts <= to)
    }
}

/// Cumulative trapezoidal total, fed one sample at a time.
///
/// Pushing samples one by one ends on the same total [`summarize`] reports for
/// the whole sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningEnergy {
    energy_wh: f64,
    previous: Option<(DateTime<Utc>, f64)>,
}

impl RunningEnergy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `sample` and returns the total so far in kWh.
    ///
    /// A sample older than its predecessor adds nothing.
    pub fn push<S: PowerSample>(&mut self, sample: &S) -> f64 {
        let (ts, watts) = (sample.timestamp(), sample.watts());
        if let Some((prev_ts, prev_watts)) = self.previous {
            let dt_hours = (ts - prev_ts).num_milliseconds() as f64 / MILLIS_PER_HOUR;
            let avg_watts = (prev_watts + watts) / 2.0;
            self.energy_wh += avg_watts * dt_hours.max(0.0);
        }
        self.previous = Some((ts, watts));
        self.energy_kwh()
    }

    pub fn energy_kwh(&self) -> f64 {
        self.energy_wh / WH_PER_KWH
    }
}

/// Integrates `samples` in the order given using the trapezoidal rule.
///
/// Negative intervals (out-of-order input) contribute nothing. Watt values are
/// taken as-is, so negative readings reduce the total.
pub fn summarize<S: PowerSample>(samples: &[S], cost_per_kwh: f64) -> ConsumptionSummary {
    let mut total = RunningEnergy::new();
    for sample in samples {
        total.push(sample);
    }

    let energy_kwh = total.energy_kwh();
    ConsumptionSummary {
        energy_kwh,
        estimated_cost: energy_kwh * cost_per_kwh,
        reading_count: samples.len(),
    }
}

/// Keeps the samples inside `range` and orders them by timestamp.
///
/// The sort is stable: samples sharing a timestamp keep their relative order.
pub fn select_range<'a, S: PowerSample>(samples: &'a [S], range: &TimeRange) -> Vec<&'a S> {
    let mut selected: Vec<&S> = samples
        .iter()
        .filter(|s| range.contains(s.timestamp()))
        .collect();
    selected.sort_by_key(|s| s.timestamp());
    selected
}

/// Filters `samples` to `range`, stable-sorts them by timestamp, then integrates.
pub fn summarize_range<S: PowerSample>(
    samples: &[S],
    range: &TimeRange,
    cost_per_kwh: f64,
) -> ConsumptionSummary {
    summarize(&select_range(samples, range), cost_per_kwh)
}
