use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::energy::TimeRange;
use crate::error::{AppError, Result};
use crate::repositories::{NewReading, Reading};

/// Body of `POST /api/readings` as sent by devices.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingPayload {
    pub device_id: Option<String>,
    pub watts: Option<f64>,
    pub voltage: Option<f64>,
    pub current: Option<f64>,
    pub energy: Option<f64>,
    pub timestamp: Option<String>,
}

impl ReadingPayload {
    /// Validates the payload; a missing timestamp becomes `received_at`.
    pub fn into_new_reading(self, received_at: DateTime<Utc>) -> Result<NewReading> {
        let (device_id, watts) = match (self.device_id, self.watts) {
            (Some(device_id), Some(watts)) => (device_id, watts),
            _ => {
                return Err(AppError::Validation(
                    "deviceId and watts required".to_string(),
                ))
            }
        };

        let device_id = Uuid::parse_str(device_id.trim())
            .map_err(|_| AppError::Validation(format!("Invalid deviceId: {}", device_id)))?;

        if !watts.is_finite() {
            return Err(AppError::Validation("watts must be a finite number".to_string()));
        }
        for (field, value) in [
            ("voltage", self.voltage),
            ("current", self.current),
            ("energy", self.energy),
        ] {
            if value.is_some_and(|v| !v.is_finite()) {
                return Err(AppError::Validation(format!(
                    "{} must be a finite number",
                    field
                )));
            }
        }

        let timestamp = match self.timestamp {
            Some(raw) => parse_timestamp("timestamp", &raw)?,
            None => received_at,
        };

        Ok(NewReading {
            device_id,
            timestamp,
            watts,
            voltage: self.voltage,
            current: self.current,
            energy: self.energy,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ReadingCreatedResponse {
    pub success: bool,
    pub reading: Reading,
}

pub const MAX_READINGS_LIMIT: usize = 10_000;

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl RangeQuery {
    pub fn range(&self) -> Result<TimeRange> {
        let from = self
            .from
            .as_deref()
            .map(|s| parse_timestamp("from", s))
            .transpose()?;
        let to = self
            .to
            .as_deref()
            .map(|s| parse_timestamp("to", s))
            .transpose()?;
        Ok(TimeRange::new(from, to))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ReadingsQuery {
    #[serde(flatten)]
    pub range: RangeQuery,
    pub limit: Option<String>,
}

impl ReadingsQuery {
    pub fn limit(&self) -> Result<Option<usize>> {
        let Some(raw) = self.limit.as_deref() else {
            return Ok(None);
        };
        match raw.trim().parse::<usize>() {
            Ok(limit) if (1..=MAX_READINGS_LIMIT).contains(&limit) => Ok(Some(limit)),
            _ => Err(AppError::Validation(format!(
                "limit must be between 1 and {}",
                MAX_READINGS_LIMIT
            ))),
        }
    }
}

fn parse_timestamp(field: &str, raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| {
            AppError::Validation(format!("{} must be an RFC 3339 timestamp: {}", field, raw))
        })
}
