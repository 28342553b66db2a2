mod http_room_service;
mod room_service;

pub use http_room_service::HttpRoomService;
pub use room_service::{RoomService, ServiceResult};
