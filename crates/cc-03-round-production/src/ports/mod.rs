//! Ports layer for round production.

pub mod inbound;
pub mod outbound;
