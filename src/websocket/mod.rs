pub mod handler;
pub mod messages;
pub mod rooms;

pub use handler::handle_websocket;
pub use rooms::{ConnectionId, Rooms};
