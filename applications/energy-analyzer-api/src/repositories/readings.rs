use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use uuid::Uuid;

use crate::db::DbPool;
use crate::energy::{PowerSample, TimeRange};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub id: Uuid,
    pub device_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub watts: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voltage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy: Option<f64>,
}

impl PowerSample for Reading {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn watts(&self) -> f64 {
        self.watts
    }
}

impl<'r> FromRow<'r, PgRow> for Reading {
    fn from_row(row: &'r PgRow) -> std::result::Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            device_id: row.try_get("device_id")?,
            timestamp: row.try_get("ts")?,
            watts: row.try_get("watts")?,
            voltage: row.try_get("voltage_v")?,
            current: row.try_get("current_a")?,
            energy: row.try_get("energy_kwh")?,
        })
    }
}

/// A validated reading that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReading {
    pub device_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub watts: f64,
    pub voltage: Option<f64>,
    pub current: Option<f64>,
    pub energy: Option<f64>,
}

impl NewReading {
    pub fn into_reading(self) -> Reading {
        Reading {
            id: Uuid::new_v4(),
            device_id: self.device_id,
            timestamp: self.timestamp,
            watts: self.watts,
            voltage: self.voltage,
            current: self.current,
            energy: self.energy,
        }
    }
}

#[async_trait]
pub trait ReadingStore: Send + Sync {
    async fn insert(&self, reading: NewReading) -> Result<Reading>;

    /// Readings of one device inside `range`, ascending by timestamp.
    /// With `limit`, only the most recent `limit` readings are kept.
    async fn query(
        &self,
        device_id: Uuid,
        range: &TimeRange,
        limit: Option<usize>,
    ) -> Result<Vec<Reading>>;

    async fn latest(&self, device_id: Uuid) -> Result<Option<Reading>>;
}

#[derive(Debug, Clone)]
pub struct PgReadingRepository {
    pool: DbPool,
}

impl PgReadingRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReadingStore for PgReadingRepository {
    async fn insert(&self, reading: NewReading) -> Result<Reading> {
        let reading = reading.into_reading();
        let stored = sqlx::query_as::<_, Reading>(
            r#"
            INSERT INTO readings (id, device_id, ts, watts, voltage_v, current_a, energy_kwh)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, device_id, ts, watts, voltage_v, current_a, energy_kwh
            "#,
        )
        .bind(reading.id)
        .bind(reading.device_id)
        .bind(reading.timestamp)
        .bind(reading.watts)
        .bind(reading.voltage)
        .bind(reading.current)
        .bind(reading.energy)
        .fetch_one(&self.pool)
        .await?;

        Ok(stored)
    }

    async fn query(
        &self,
        device_id: Uuid,
        range: &TimeRange,
        limit: Option<usize>,
    ) -> Result<Vec<Reading>> {
        let mut query = String::from(
            "SELECT id, device_id, ts, watts, voltage_v, current_a, energy_kwh \
             FROM readings WHERE device_id = $1",
        );
        let mut arg_index = 2;

        if range.from.is_some() {
            query.push_str(&format!(" AND ts >= ${}", arg_index));
            arg_index += 1;
        }

        if range.to.is_some() {
            query.push_str(&format!(" AND ts <= ${}", arg_index));
            arg_index += 1;
        }

        // Newest first when limited, so LIMIT keeps the most recent rows.
        if limit.is_some() {
            query.push_str(&format!(" ORDER BY ts DESC, seq DESC LIMIT ${}", arg_index));
        } else {
            query.push_str(" ORDER BY ts ASC, seq ASC");
        }

        let mut sql_query = sqlx::query_as::<_, Reading>(&query).bind(device_id);

        if let Some(from) = range.from {
            sql_query = sql_query.bind(from);
        }

        if let Some(to) = range.to {
            sql_query = sql_query.bind(to);
        }

        if let Some(limit) = limit {
            sql_query = sql_query.bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let mut readings = sql_query.fetch_all(&self.pool).await?;
        if limit.is_some() {
            readings.reverse();
        }

        Ok(readings)
    }

    async fn latest(&self, device_id: Uuid) -> Result<Option<Reading>> {
        let reading = sqlx::query_as::<_, Reading>(
            r#"
            SELECT id, device_id, ts, watts, voltage_v, current_a, energy_kwh
            FROM readings
            WHERE device_id = $1
            ORDER BY ts DESC, seq DESC
            LIMIT 1
            "#,
        )
        .bind(device_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_reading_serializes_camel_case_and_skips_missing_fields() {
        let reading = Reading {
            id: Uuid::nil(),
            device_id: Uuid::nil(),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            watts: 120.5,
            voltage: Some(230.0),
            current: None,
            energy: None,
        };

        let json = serde_json::to_value(&reading).unwrap();
        assert_eq!(json["deviceId"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["timestamp"], "2024-05-01T12:00:00Z");
        assert_eq!(json["watts"], 120.5);
        assert_eq!(json["voltage"], 230.0);
        assert!(json.get("current").is_none());
        assert!(json.get("energy").is_none());
    }

    #[test]
    fn test_into_reading_assigns_fresh_id() {
        let new = NewReading {
            device_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            watts: 42.0,
            voltage: None,
            current: None,
            energy: None,
        };

        let a = new.clone().into_reading();
        let b = new.into_reading();
        assert_ne!(a.id, b.id);
        assert_eq!(a.device_id, b.device_id);
        assert_eq!(a.watts, 42.0);
    }
}
