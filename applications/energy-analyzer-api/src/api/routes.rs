use axum::{
    extract::Request,
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::Level;

use super::handlers::{auth, consumption, devices, health, readings, AppState};
use super::middleware::authenticate;

pub fn create_router(state: AppState) -> Router {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/", get(health::banner))
        .route("/health", get(health::health))
        .route("/api/uptime", get(health::uptime))
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/login", post(auth::login))
        .route("/api/readings", post(readings::create_reading));

    // Bearer-protected routes
    let protected_routes = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route(
            "/api/devices",
            get(devices::list_devices).post(devices::create_device),
        )
        .route("/api/devices/{id}", get(devices::get_device))
        .route("/api/devices/{id}/status", get(devices::get_device_status))
        .route("/api/readings/{device_id}", get(readings::list_readings))
        .route("/api/consumption", get(consumption::get_fleet_consumption))
        .route(
            "/api/consumption/{device_id}",
            get(consumption::get_device_consumption),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(|request: &Request| {
                            tracing::span!(
                                Level::INFO,
                                "http_request",
                                method = %request.method(),
                                uri = %request.uri(),
                            )
                        })
                        .on_request(|_request: &Request, _span: &tracing::Span| {
                            tracing::event!(Level::DEBUG, "received request");
                        })
                        .on_response(
                            |response: &axum::response::Response,
                             latency: std::time::Duration,
                             _span: &tracing::Span| {
                                tracing::event!(
                                    Level::INFO,
                                    status = response.status().as_u16(),
                                    latency = ?latency,
                                    "request completed"
                                );
                            },
                        )
                        .on_failure(
                            |error: tower_http::classify::ServerErrorsFailureClass,
                             _latency: std::time::Duration,
                             _span: &tracing::Span| {
                                tracing::event!(Level::ERROR, error = %error, "request failed");
                            },
                        ),
                )
                .layer(CorsLayer::permissive()),
        )
}
