use axum::{
    extract::rejection::QueryRejection,
    extract::{Path, Query, State},
    response::Json,
};

use super::{parse_id, query_params, AppState};
use crate::api::models::{
    ConsumptionContext, DeviceConsumptionResponse, FleetConsumptionResponse, RangeQuery,
};
use crate::energy::TimeRange;
use crate::error::Result;

fn context(state: &AppState, range: &TimeRange) -> ConsumptionContext {
    ConsumptionContext::new(
        state.consumption.window(),
        state.consumption.cost_per_kwh(),
        &state.config.billing.currency,
        range,
    )
}

/// GET /api/consumption/{device_id}?from&to
pub async fn get_device_consumption(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    query: std::result::Result<Query<RangeQuery>, QueryRejection>,
) -> Result<Json<DeviceConsumptionResponse>> {
    let device_id = parse_id(&device_id)?;
    let range = query_params(query)?.range()?;

    let consumption = state
        .consumption
        .device_consumption(device_id, &range)
        .await?;

    Ok(Json(DeviceConsumptionResponse {
        consumption: consumption.into(),
        context: context(&state, &range),
    }))
}

/// GET /api/consumption?from&to
/// Totals across every registered device.
pub async fn get_fleet_consumption(
    State(state): State<AppState>,
    query: std::result::Result<Query<RangeQuery>, QueryRejection>,
) -> Result<Json<FleetConsumptionResponse>> {
    let range = query_params(query)?.range()?;
    let fleet = state.consumption.fleet_consumption(&range).await?;

    Ok(Json(FleetConsumptionResponse::new(
        fleet,
        context(&state, &range),
    )))
}
