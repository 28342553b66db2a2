use crate::service::room_service::{RoomService, ServiceResult};
use async_trait::async_trait;
use pairroom_core::{NewRoom, RoomId, RoomRecord};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, error, warn};

/// `RoomService` over the backend's `/api/rooms` REST endpoints.
pub struct HttpRoomService {
    client: Client,
    base_url: String,
}

impl HttpRoomService {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(base_url: impl Into<String>) -> reqwest::Result<Self> {
        Self::with_timeout(base_url, Self::DEFAULT_TIMEOUT)
    }

    /// Every request, body included, is abandoned after `timeout`.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn rooms_url(&self) -> String {
        format!("{}/api/rooms", self.base_url.trim_end_matches('/'))
    }

    fn room_url(&self, room_id: &RoomId) -> String {
        format!("{}/{}", self.rooms_url(), room_id)
    }

    async fn execute(&self, request: RequestBuilder, token: &str) -> ServiceResult<Value> {
        if token.is_empty() {
            return ServiceResult::unauthorized();
        }

        let response = match request.bearer_auth(token).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                error!("Room service request timed out: {}", e);
                return ServiceResult::failure("Server did not respond in time");
            }
            Err(e) => {
                error!("Room service request failed: {}", e);
                return ServiceResult::failure("Failed to connect to server");
            }
        };

        let status = response.status();
        debug!("Room service responded {}", status);
        if status == StatusCode::UNAUTHORIZED {
            return ServiceResult::unauthorized();
        }

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("application/json"));
        if !is_json {
            if status.is_success() {
                return ServiceResult::ok(Value::Null);
            }
            warn!("Room service returned non-JSON response: {}", status);
            return ServiceResult::failure(format!(
                "Server returned non-JSON response: {}",
                status.as_u16()
            ))
            .with_status(status.as_u16());
        }

        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                warn!("Room service sent unreadable JSON: {}", e);
                return ServiceResult::failure(format!("Invalid response body: {}", e))
                    .with_status(status.as_u16());
            }
        };

        if !status.is_success() {
            let message = body
                .get("msg")
                .and_then(Value::as_str)
                .map(str::to_owned)
                .unwrap_or_else(|| format!("Error: {}", status.as_u16()));
            return ServiceResult::failure(message).with_status(status.as_u16());
        }

        ServiceResult::ok(body)
    }
}

fn decode<T: DeserializeOwned>(result: ServiceResult<Value>) -> ServiceResult<T> {
    if !result.success {
        return ServiceResult {
            success: false,
            data: None,
            message: result.message,
            status: result.status,
        };
    }
    match result.data.map(serde_json::from_value::<T>) {
        Some(Ok(data)) => ServiceResult::ok(data),
        Some(Err(e)) => ServiceResult::failure(format!("Unexpected response: {}", e)),
        None => ServiceResult::failure("Empty response"),
    }
}

#[async_trait]
impl RoomService for HttpRoomService {
    async fn fetch_room(&self, room_id: &RoomId, token: &str) -> ServiceResult<RoomRecord> {
        debug!("Fetching room {}", room_id);
        decode(
            self.execute(self.client.get(self.room_url(room_id)), token)
                .await,
        )
    }

    async fn create_room(&self, room: &NewRoom, token: &str) -> ServiceResult<RoomRecord> {
        decode(
            self.execute(self.client.post(self.rooms_url()).json(room), token)
                .await,
        )
    }

    async fn delete_room(&self, room_id: &RoomId, token: &str) -> ServiceResult<()> {
        self.execute(self.client.delete(self.room_url(room_id)), token)
            .await
            .map(|_| ())
    }

    async fn update_room_code(
        &self,
        room_id: &RoomId,
        code: &str,
        token: &str,
    ) -> ServiceResult<()> {
        let url = format!("{}/code", self.room_url(room_id));
        self.execute(self.client.put(url).json(&json!({ "code": code })), token)
            .await
            .map(|_| ())
    }
}
