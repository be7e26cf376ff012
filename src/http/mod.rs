//! HTTP surface: health, match listing and the WebSocket upgrade

pub mod routes;

pub use routes::build_router;
