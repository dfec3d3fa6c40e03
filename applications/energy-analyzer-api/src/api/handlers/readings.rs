use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Path, Query, State},
    response::Json,
};
use chrono::Utc;
use tracing::debug;

use super::{json_body, parse_id, query_params, AppState};
use crate::api::models::{ReadingCreatedResponse, ReadingPayload, ReadingsQuery};
use crate::error::{AppError, Result};
use crate::repositories::Reading;

/// POST /api/readings
/// Device ingestion; unknown devices are rejected with 404.
pub async fn create_reading(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ReadingPayload>, JsonRejection>,
) -> Result<Json<ReadingCreatedResponse>> {
    let new_reading = json_body(payload)?.into_new_reading(Utc::now())?;

    if state.stores.devices.get(new_reading.device_id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "Device {} not found",
            new_reading.device_id
        )));
    }

    let reading = state.stores.readings.insert(new_reading).await?;
    debug!(
        device_id = %reading.device_id,
        watts = reading.watts,
        timestamp = %reading.timestamp,
        "Received reading"
    );

    Ok(Json(ReadingCreatedResponse {
        success: true,
        reading,
    }))
}

/// GET /api/readings/{device_id}?from&to&limit
/// Ascending by timestamp; `limit` keeps the most recent readings.
pub async fn list_readings(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    query: std::result::Result<Query<ReadingsQuery>, QueryRejection>,
) -> Result<Json<Vec<Reading>>> {
    let device_id = parse_id(&device_id)?;
    let params = query_params(query)?;
    let range = params.range.range()?;
    let limit = params.limit()?;

    if state.stores.devices.get(device_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Device {} not found", device_id)));
    }

    let readings = state
        .stores
        .readings
        .query(device_id, &range, limit)
        .await?;
    Ok(Json(readings))
}
