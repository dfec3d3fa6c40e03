use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::Result;

pub const DEFAULT_LOCATION: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewDevice {
    pub name: String,
    pub location: String,
}

impl NewDevice {
    pub fn into_device(self) -> Device {
        Device {
            id: Uuid::new_v4(),
            name: self.name,
            location: self.location,
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    async fn create(&self, device: NewDevice) -> Result<Device>;

    /// All devices, newest first.
    async fn list(&self) -> Result<Vec<Device>>;

    async fn get(&self, id: Uuid) -> Result<Option<Device>>;
}

#[derive(Debug, Clone)]
pub struct PgDeviceRepository {
    pool: DbPool,
}

impl PgDeviceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeviceRegistry for PgDeviceRepository {
    async fn create(&self, device: NewDevice) -> Result<Device> {
        let device = device.into_device();
        let stored = sqlx::query_as::<_, Device>(
            r#"
            INSERT INTO devices (id, name, location, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, location, created_at
            "#,
        )
        .bind(device.id)
        .bind(&device.name)
        .bind(&device.location)
        .bind(device.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(stored)
    }

    async fn list(&self) -> Result<Vec<Device>> {
        let devices = sqlx::query_as::<_, Device>(
            "SELECT id, name, location, created_at FROM devices ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(devices)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Device>> {
        let device = sqlx::query_as::<_, Device>(
            "SELECT id, name, location, created_at FROM devices WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(device)
    }
}
