use async_trait::async_trait;
use pairroom_core::{NewRoom, RoomId, RoomRecord};

/// Outcome of a room REST call. Failures are values, never errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub status: Option<u16>,
}

impl<T> ServiceResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            status: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn unauthorized() -> Self {
        Self::failure("Authentication required").with_status(401)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(401)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ServiceResult<U> {
        ServiceResult {
            success: self.success,
            data: self.data.map(f),
            message: self.message,
            status: self.status,
        }
    }
}

/// Room persistence collaborator.
#[async_trait]
pub trait RoomService: Send + Sync {
    async fn fetch_room(&self, room_id: &RoomId, token: &str) -> ServiceResult<RoomRecord>;

    async fn create_room(&self, room: &NewRoom, token: &str) -> ServiceResult<RoomRecord>;

    async fn delete_room(&self, room_id: &RoomId, token: &str) -> ServiceResult<()>;

    async fn update_room_code(&self, room_id: &RoomId, code: &str, token: &str)
    -> ServiceResult<()>;
}
