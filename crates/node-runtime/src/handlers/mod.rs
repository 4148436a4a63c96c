//! # HTTP Handlers
//!
//! Inbound side of the peer protocol.

pub mod routes;

pub use routes::{router, AppState, ForwardParams};
