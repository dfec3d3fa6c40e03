use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::devices::{Device, DeviceRegistry, NewDevice};
use super::readings::{NewReading, Reading, ReadingStore};
use super::users::{NewUser, User, UserStore, DUPLICATE_EMAIL};
use crate::energy::TimeRange;
use crate::error::{AppError, Result};

/// In-process store for running without Postgres and for HTTP tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    readings: RwLock<HashMap<Uuid, Vec<Reading>>>,
    devices: RwLock<Vec<Device>>,
    users: RwLock<Vec<User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReadingStore for MemoryStore {
    async fn insert(&self, reading: NewReading) -> Result<Reading> {
        let reading = reading.into_reading();
        self.readings
            .write()
            .await
            .entry(reading.device_id)
            .or_default()
            .push(reading.clone());
        Ok(reading)
    }

    async fn query(
        &self,
        device_id: Uuid,
        range: &TimeRange,
        limit: Option<usize>,
    ) -> Result<Vec<Reading>> {
        let guard = self.readings.read().await;
        let mut readings: Vec<Reading> = guard
            .get(&device_id)
            .map(|all| {
                all.iter()
                    .filter(|r| range.contains(r.timestamp))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        readings.sort_by_key(|r| r.timestamp);

        if let Some(limit) = limit {
            let skip = readings.len().saturating_sub(limit);
            readings.drain(..skip);
        }

        Ok(readings)
    }

    async fn latest(&self, device_id: Uuid) -> Result<Option<Reading>> {
        let guard = self.readings.read().await;
        // max_by_key keeps the last maximum, so the newest insert wins ties.
        let latest = guard
            .get(&device_id)
            .and_then(|all| all.iter().max_by_key(|r| r.timestamp).cloned());
        Ok(latest)
    }
}

#[async_trait]
impl DeviceRegistry for MemoryStore {
    async fn create(&self, device: NewDevice) -> Result<Device> {
        let device = device.into_device();
        self.devices.write().await.push(device.clone());
        Ok(device)
    }

    async fn list(&self) -> Result<Vec<Device>> {
        let guard = self.devices.read().await;
        let mut devices: Vec<Device> = guard.iter().rev().cloned().collect();
        devices.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(devices)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Device>> {
        let guard = self.devices.read().await;
        Ok(guard.iter().find(|d| d.id == id).cloned())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, user: NewUser) -> Result<User> {
        let mut guard = self.users.write().await;
        if guard
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(AppError::Validation(DUPLICATE_EMAIL.to_string()));
        }
        let user = user.into_user();
        guard.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let guard = self.users.read().await;
        Ok(guard
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn get(&self, id: Uuid) -> Result<Option<User>> {
        let guard = self.users.read().await;
        Ok(guard.iter().find(|u| u.id == id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn reading(device_id: Uuid, minutes: i64, watts: f64) -> NewReading {
        NewReading {
            device_id,
            timestamp: base() + Duration::minutes(minutes),
            watts,
            voltage: None,
            current: None,
            energy: None,
        }
    }

    #[tokio::test]
    async fn test_query_returns_ascending_within_range() {
        let store = MemoryStore::new();
        let device = Uuid::new_v4();
        for (minutes, watts) in [(30, 3.0), (0, 1.0), (60, 4.0), (10, 2.0)] {
            store.insert(reading(device, minutes, watts)).await.unwrap();
        }
        store.insert(reading(Uuid::new_v4(), 5, 99.0)).await.unwrap();

        let all = store.query(device, &TimeRange::unbounded(), None).await.unwrap();
        let watts: Vec<f64> = all.iter().map(|r| r.watts).collect();
        assert_eq!(watts, vec![1.0, 2.0, 3.0, 4.0]);

        let range = TimeRange::new(
            Some(base() + Duration::minutes(10)),
            Some(base() + Duration::minutes(30)),
        );
        let bounded = store.query(device, &range, None).await.unwrap();
        let watts: Vec<f64> = bounded.iter().map(|r| r.watts).collect();
        assert_eq!(watts, vec![2.0, 3.0]);
    }

    #[tokio::test]
    async fn test_query_limit_keeps_most_recent() {
        let store = MemoryStore::new();
        let device = Uuid::new_v4();
        for minutes in 0..5 {
            store
                .insert(reading(device, minutes, minutes as f64))
                .await
                .unwrap();
        }

        let recent = store
            .query(device, &TimeRange::unbounded(), Some(2))
            .await
            .unwrap();
        let watts: Vec<f64> = recent.iter().map(|r| r.watts).collect();
        assert_eq!(watts, vec![3.0, 4.0]);
    }

    #[tokio::test]
    async fn test_tied_timestamps_keep_insertion_order() {
        let store = MemoryStore::new();
        let device = Uuid::new_v4();
        for (minutes, watts) in [(0, 0.0), (60, 100.0), (60, 900.0), (90, 0.0)] {
            store.insert(reading(device, minutes, watts)).await.unwrap();
        }

        let all = store.query(device, &TimeRange::unbounded(), None).await.unwrap();
        let watts: Vec<f64> = all.iter().map(|r| r.watts).collect();
        assert_eq!(watts, vec![0.0, 100.0, 900.0, 0.0]);

        let windowed = store
            .query(device, &TimeRange::unbounded(), Some(10))
            .await
            .unwrap();
        assert_eq!(windowed, all);

        let tail = store
            .query(device, &TimeRange::unbounded(), Some(2))
            .await
            .unwrap();
        let watts: Vec<f64> = tail.iter().map(|r| r.watts).collect();
        assert_eq!(watts, vec![900.0, 0.0]);

        assert_eq!(store.latest(device).await.unwrap().unwrap().watts, 0.0);
    }

    #[tokio::test]
    async fn test_latest_and_unknown_device() {
        let store = MemoryStore::new();
        let device = Uuid::new_v4();
        assert!(store.latest(device).await.unwrap().is_none());

        store.insert(reading(device, 20, 2.0)).await.unwrap();
        store.insert(reading(device, 5, 1.0)).await.unwrap();
        let latest = store.latest(device).await.unwrap().unwrap();
        assert_eq!(latest.watts, 2.0);
    }

    #[tokio::test]
    async fn test_devices_listed_newest_first() {
        let store = MemoryStore::new();
        let first = DeviceRegistry::create(
            &store,
            NewDevice {
                name: "Fridge".into(),
                location: "Kitchen".into(),
            },
        )
        .await
        .unwrap();
        let second = DeviceRegistry::create(
            &store,
            NewDevice {
                name: "Heater".into(),
                location: "unknown".into(),
            },
        )
        .await
        .unwrap();

        let listed = DeviceRegistry::list(&store).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
        assert_eq!(
            DeviceRegistry::get(&store, first.id).await.unwrap(),
            Some(first)
        );
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected_case_insensitively() {
        let store = MemoryStore::new();
        let user = NewUser {
            name: "Asha".into(),
            email: "asha@example.com".into(),
            password_hash: "hash".into(),
        };
        UserStore::create(&store, user.clone()).await.unwrap();

        let duplicate = NewUser {
            email: "ASHA@example.com".into(),
            ..user
        };
        let err = UserStore::create(&store, duplicate).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg == DUPLICATE_EMAIL));

        let found = store.find_by_email("Asha@Example.com").await.unwrap();
        assert!(found.is_some());
    }
}
