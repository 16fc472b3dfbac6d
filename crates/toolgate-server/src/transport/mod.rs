//! Transports
//!
//! One axum router serves every transport: request/response HTTP,
//! persistent WebSocket connections, and the SSE push stream. All three
//! hand their envelopes to the same dispatcher.

pub mod http;
pub mod ws;

pub use http::build_router;
