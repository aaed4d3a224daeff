//! API layer - HTTP and WebSocket entry points.

pub mod broadcast;
pub mod connections;
pub(crate) mod dto;
pub mod http;
pub mod websocket;

pub use broadcast::{Scope, SessionBroadcaster};
pub use connections::ConnectionManager;
