//! Cross-crate integration tests.

pub mod network;

mod cluster;
mod http;
mod scenarios;
