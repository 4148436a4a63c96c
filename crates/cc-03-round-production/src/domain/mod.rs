//! Domain layer for round production.

pub mod clockchain;
pub mod mining;
pub mod stage;
pub mod validation;

pub use clockchain::{Clockchain, PingPool};
pub use mining::{mine_ping, mine_tick};
pub use stage::{RoundStage, RoundState};
pub use validation::{ValidationError, Validator};
