//! # Round Production Subsystem (cc-03)
//!
//! Produces and accepts the two consensus artifacts of a round and keeps the
//! resulting chain.
//!
//! ## Purpose
//!
//! - **Ping**: once per round each ready node mines and signs an attestation
//!   referencing the current head, pools it and gossips it.
//! - **Tick**: after `tick_period + tick_period_margin` a node bundles the
//!   pooled pings into a tick, mines and signs it, appends it and gossips it.
//!   Whichever valid tick lands first closes the round everywhere.
//!
//! ## Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Service: RoundSynchronizer                         │
//! │  - ping loop / tick loop                            │
//! │  - receive_ping / receive_tick                      │
//! └─────────────────────────────────────────────────────┘
//!                         │
//! ┌─────────────────────────────────────────────────────┐
//! │  Ports                                              │
//! │  - Inbound: RoundApi                                │
//! │  - Outbound: ReadinessProbe, ArtifactBroadcaster    │
//! └─────────────────────────────────────────────────────┘
//!                         │
//! ┌─────────────────────────────────────────────────────┐
//! │  Domain                                             │
//! │  - Clockchain (chain + ping pool)                   │
//! │  - RoundStage state machine                         │
//! │  - Validator, ping/tick mining                      │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Critical Invariants
//!
//! 1. **Linkage**: every appended tick's `prev_tick` equals the head it was
//!    appended to; the check and the append are one critical section.
//! 2. **One ping per signer per round** in the pool. A gossiped ping
//!    replaces the signer's earlier one; the own ping is refused if one is
//!    already pooled under our address.
//! 3. **Pool reset**: the pool is cleared in the same critical section that
//!    appends a tick, and nowhere else.
//! 4. **Own artifacts are validated** before they are pooled, appended or
//!    broadcast.

pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use config::RoundConfig;
pub use domain::*;
pub use error::{Result, RoundError};
pub use ports::inbound::{RoundApi, RoundStatus};
pub use ports::outbound::{ArtifactBroadcaster, ReadinessProbe};
pub use service::RoundSynchronizer;
