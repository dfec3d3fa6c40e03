use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{Result, SimError};
use crate::generator::SimulatedReading;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RegisteredDevice {
    pub id: Uuid,
    pub name: String,
    pub location: String,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

/// Thin client for the energy-analyzer-api endpoints the simulator needs.
pub struct BackendClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<()> {
        let response = self
            .http
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let body: LoginResponse = check(response).await?.json().await?;
        self.token = Some(body.token);
        Ok(())
    }

    pub async fn create_device(&self, name: &str, location: &str) -> Result<RegisteredDevice> {
        let mut request = self
            .http
            .post(self.url("/api/devices"))
            .json(&json!({ "name": name, "location": location }));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let device = check(request.send().await?).await?.json().await?;
        Ok(device)
    }

    pub async fn post_reading(&self, reading: &SimulatedReading) -> Result<()> {
        let response = self
            .http
            .post(self.url("/api/readings"))
            .json(reading)
            .send()
            .await?;
        let body: Value = check(response).await?.json().await?;
        if body.get("success") != Some(&Value::Bool(true)) {
            return Err(SimError::Response(body.to_string()));
        }
        Ok(())
    }
}

// Non-2xx responses carry {"error": msg}; surface it.
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(text);
    Err(SimError::Backend {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };
    use chrono::Utc;

    const DEVICE_ID: &str = "6f1c1b8e-3f7a-4a57-9a4e-2f1d9b1c0a11";

    async fn login(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        if body["password"] == "right" {
            (StatusCode::OK, Json(json!({ "token": "tok", "expiresIn": 3600 })))
        } else {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Invalid credentials" })),
            )
        }
    }

    async fn devices(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        if headers.get("authorization").and_then(|h| h.to_str().ok()) != Some("Bearer tok") {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Missing bearer token" })),
            );
        }
        (
            StatusCode::CREATED,
            Json(json!({
                "id": DEVICE_ID,
                "name": body["name"],
                "location": body["location"],
                "createdAt": "2024-01-01T00:00:00Z"
            })),
        )
    }

    async fn readings(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        if body["watts"].is_number() {
            (StatusCode::OK, Json(json!({ "success": true, "reading": body })))
        } else {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "deviceId and watts required" })),
            )
        }
    }

    async fn spawn_backend() -> String {
        let app = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/devices", post(devices))
            .route("/api/readings", post(readings));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/", addr)
    }

    fn reading(device_id: Uuid) -> SimulatedReading {
        SimulatedReading {
            device_id,
            watts: 230.0,
            voltage: 230.0,
            current: 1.0,
            energy: 0.0,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_login_create_device_and_post_reading() {
        let mut client = BackendClient::new(&spawn_backend().await);
        client.login("sim@example.com", "right").await.unwrap();

        let device = client.create_device("blue_bulb", "living-room").await.unwrap();
        assert_eq!(device.id, Uuid::parse_str(DEVICE_ID).unwrap());
        assert_eq!(device.name, "blue_bulb");
        assert_eq!(device.location, "living-room");

        client.post_reading(&reading(device.id)).await.unwrap();
    }

    #[tokio::test]
    async fn test_backend_errors_carry_message() {
        let mut client = BackendClient::new(&spawn_backend().await);

        let err = client.create_device("blue_bulb", "x").await.unwrap_err();
        assert!(matches!(err, SimError::Backend { status: 401, .. }));

        let err = client.login("sim@example.com", "wrong").await.unwrap_err();
        match err {
            SimError::Backend { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid credentials");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
