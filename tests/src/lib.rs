//! # Clockchain Test Suite
//!
//! Unified test crate for behaviour that spans crates.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── network.rs     # in-memory network of routers (test harness)
//!     ├── scenarios.rs   # end-to-end scenarios per component
//!     ├── cluster.rs     # three nodes joining and closing a round
//!     └── http.rs        # two nodes over real sockets
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p cc-tests
//! cargo test -p cc-tests integration::cluster
//! ```

pub mod integration;
