use axum::{
    extract::rejection::JsonRejection,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use tracing::info;

use super::{json_body, parse_id, AppState};
use crate::api::models::{CreateDeviceRequest, DeviceStatusResponse};
use crate::error::{AppError, Result};
use crate::repositories::Device;

/// POST /api/devices
pub async fn create_device(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateDeviceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Device>)> {
    let new_device = json_body(payload)?.into_new_device()?;
    let device = state.stores.devices.create(new_device).await?;
    info!(device_id = %device.id, name = %device.name, "Device registered");

    Ok((StatusCode::CREATED, Json(device)))
}

/// GET /api/devices
/// Newest first.
pub async fn list_devices(State(state): State<AppState>) -> Result<Json<Vec<Device>>> {
    let devices = state.stores.devices.list().await?;
    Ok(Json(devices))
}

/// GET /api/devices/{id}
pub async fn get_device(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Device>> {
    let id = parse_id(&id)?;
    let device = state
        .stores
        .devices
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Device {} not found", id)))?;

    Ok(Json(device))
}

/// GET /api/devices/{id}/status
pub async fn get_device_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeviceStatusResponse>> {
    let id = parse_id(&id)?;
    let status = state.consumption.device_status(id).await?;
    Ok(Json(status.into()))
}
