//! # Shared Types Crate
//!
//! Domain records exchanged between clockchain nodes and between the
//! subsystems of a single node.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every record that crosses a subsystem or
//!   network boundary is defined here.
//! - **Canonical Encoding**: signatures, proof-of-work digests and duplicate
//!   fingerprints are all computed over [`canonical_bytes`], so two nodes
//!   always agree on what was signed.
//! - **Injectable Time**: loops never read the wall clock or sleep directly;
//!   they go through [`TimeSource`] and [`Sleeper`].

pub mod encoding;
pub mod entities;
pub mod errors;
pub mod time;

pub use encoding::*;
pub use entities::*;
pub use errors::*;
pub use time::*;
