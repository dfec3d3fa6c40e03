use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::repositories::devices::DEFAULT_LOCATION;
use crate::repositories::{Device, NewDevice, Reading};
use crate::services::DeviceStatus;

#[derive(Debug, Deserialize)]
pub struct CreateDeviceRequest {
    pub name: Option<String>,
    pub location: Option<String>,
}

impl CreateDeviceRequest {
    pub fn into_new_device(self) -> Result<NewDevice> {
        let name = self
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AppError::Validation("name required".to_string()))?;

        let location = self
            .location
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| DEFAULT_LOCATION.to_string());

        Ok(NewDevice { name, location })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatusResponse {
    pub device: Device,
    pub latest: Option<Reading>,
    pub online: bool,
    pub last_seen_secs: Option<i64>,
}

impl From<DeviceStatus> for DeviceStatusResponse {
    fn from(status: DeviceStatus) -> Self {
        Self {
            device: status.device,
            latest: status.latest,
            online: status.online,
            last_seen_secs: status.last_seen_secs,
        }
    }
}
