use async_trait::async_trait;
use pairroom_client::{RoomService, ServiceResult};
use pairroom_core::{NewRoom, RoomId, RoomRecord};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Room REST collaborator with canned answers.
#[derive(Clone)]
pub struct MockRoomService {
    inner: Arc<RoomServiceInner>,
}

struct RoomServiceInner {
    fetch: Mutex<ServiceResult<RoomRecord>>,
    delete: Mutex<ServiceResult<()>>,
    saved: Mutex<Vec<String>>,
    deletes: Mutex<Vec<RoomId>>,
    stall_fetch: AtomicBool,
    stall_writes: AtomicBool,
}

impl MockRoomService {
    pub fn new() -> Self {
        Self::with_fetch(ServiceResult::ok(RoomRecord {
            id: RoomId::from("room-1"),
            name: "Pairing".to_string(),
            description: "Warm-up kata".to_string(),
            language: Some("rust".to_string()),
            code: Some("fn main() {}".to_string()),
        }))
    }

    pub fn with_fetch(fetch: ServiceResult<RoomRecord>) -> Self {
        Self {
            inner: Arc::new(RoomServiceInner {
                fetch: Mutex::new(fetch),
                delete: Mutex::new(ServiceResult::ok(())),
                saved: Mutex::new(Vec::new()),
                deletes: Mutex::new(Vec::new()),
                stall_fetch: AtomicBool::new(false),
                stall_writes: AtomicBool::new(false),
            }),
        }
    }

    pub fn set_delete_result(&self, result: ServiceResult<()>) {
        *self.inner.delete.lock().unwrap() = result;
    }

    /// `fetch_room` never resolves.
    pub fn stall_fetch(&self) {
        self.inner.stall_fetch.store(true, Ordering::SeqCst);
    }

    /// `update_room_code` and `delete_room` record the call, then never resolve.
    pub fn stall_writes(&self) {
        self.inner.stall_writes.store(true, Ordering::SeqCst);
    }

    async fn maybe_stall(flag: &AtomicBool) {
        if flag.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
    }

    /// Code bodies persisted through `update_room_code`, in order.
    pub fn saved_code(&self) -> Vec<String> {
        self.inner.saved.lock().unwrap().clone()
    }

    pub fn delete_calls(&self) -> usize {
        self.inner.deletes.lock().unwrap().len()
    }
}

#[async_trait]
impl RoomService for MockRoomService {
    async fn fetch_room(&self, _room_id: &RoomId, _token: &str) -> ServiceResult<RoomRecord> {
        Self::maybe_stall(&self.inner.stall_fetch).await;
        self.inner.fetch.lock().unwrap().clone()
    }

    async fn create_room(&self, room: &NewRoom, _token: &str) -> ServiceResult<RoomRecord> {
        ServiceResult::ok(RoomRecord {
            id: RoomId::from("created"),
            name: room.name.clone(),
            description: room.description.clone(),
            language: Some(room.language.clone()),
            code: None,
        })
    }

    async fn delete_room(&self, room_id: &RoomId, _token: &str) -> ServiceResult<()> {
        self.inner.deletes.lock().unwrap().push(room_id.clone());
        Self::maybe_stall(&self.inner.stall_writes).await;
        self.inner.delete.lock().unwrap().clone()
    }

    async fn update_room_code(
        &self,
        _room_id: &RoomId,
        code: &str,
        _token: &str,
    ) -> ServiceResult<()> {
        self.inner.saved.lock().unwrap().push(code.to_string());
        Self::maybe_stall(&self.inner.stall_writes).await;
        ServiceResult::ok(())
    }
}
