pub mod auth;
pub mod consumption;
pub mod devices;
pub mod health;
pub mod readings;

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Json, Query},
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::repositories::Stores;
use crate::services::{AuthService, ConsumptionService};

#[derive(Clone)]
pub struct AppState {
    pub stores: Stores,
    pub auth: AuthService,
    pub consumption: ConsumptionService,
    pub config: Arc<Config>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(stores: Stores, config: Config) -> Self {
        let auth = AuthService::new(stores.users.clone(), config.auth.clone());
        let consumption =
            ConsumptionService::new(stores.readings.clone(), stores.devices.clone(), &config);
        Self {
            stores,
            auth,
            consumption,
            config: Arc::new(config),
            started_at: Utc::now(),
        }
    }
}

// Extractor rejections are reported through AppError so every 4xx has a JSON body.
pub(crate) fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

pub(crate) fn query_params<T>(query: std::result::Result<Query<T>, QueryRejection>) -> Result<T> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

pub(crate) fn parse_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::Validation(format!("Invalid id: {}", raw)))
}
