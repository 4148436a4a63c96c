//! Round stage state machine.
//!
//! ```text
//! CollectingPing ──(own ping pooled at height h)──► CollectingTick { h }
//!       ▲                                                  │
//!       └──────────(any tick committed / round stale)──────┘
//! ```

use std::fmt;

use parking_lot::Mutex;

/// Where this node is within the current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundStage {
    /// No own ping in the pool yet.
    CollectingPing,
    /// Own ping pooled while the chain had `since_height` ticks.
    CollectingTick { since_height: usize },
    /// Reserved for a voting stage. Never entered.
    Vote,
    /// Reserved for a selection stage. Never entered.
    Select,
}

impl RoundStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoundStage::CollectingPing => "collecting_ping",
            RoundStage::CollectingTick { .. } => "collecting_tick",
            RoundStage::Vote => "vote",
            RoundStage::Select => "select",
        }
    }
}

impl fmt::Display for RoundStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared handle on the current stage.
#[derive(Debug)]
pub struct RoundState {
    stage: Mutex<RoundStage>,
}

impl Default for RoundState {
    fn default() -> Self {
        Self::new()
    }
}

impl RoundState {
    pub fn new() -> Self {
        Self {
            stage: Mutex::new(RoundStage::CollectingPing),
        }
    }

    pub fn stage(&self) -> RoundStage {
        *self.stage.lock()
    }

    /// True while this node's ping for the current round is pooled.
    pub fn added_ping(&self) -> bool {
        matches!(self.stage(), RoundStage::CollectingTick { .. })
    }

    /// Height the own ping was pooled at, if any.
    pub fn collecting_tick_since(&self) -> Option<usize> {
        match self.stage() {
            RoundStage::CollectingTick { since_height } => Some(since_height),
            _ => None,
        }
    }

    pub fn ping_added(&self, since_height: usize) {
        *self.stage.lock() = RoundStage::CollectingTick { since_height };
    }

    /// Back to collecting pings for the next round.
    pub fn close_round(&self) {
        *self.stage.lock() = RoundStage::CollectingPing;
    }

    /// Close the round only if the own ping is still the one pooled at
    /// `since_height`. Returns whether the stage changed.
    ///
    /// A tick attempt that outlived its round must not reset a newer round
    /// that already has our ping.
    pub fn close_round_if(&self, since_height: usize) -> bool {
        let mut stage = self.stage.lock();
        if *stage == (RoundStage::CollectingTick { since_height }) {
            *stage = RoundStage::CollectingPing;
            true
        } else {
            false
        }
    }
}
