//! Construction of own pings and ticks.
//!
//! Both artifacts are mined over the same canonical body that is then
//! signed, so a verifier re-encodes the body once and checks both.
//! These calls are CPU-bound; the service runs them on a blocking thread.

use shared_crypto::{Credentials, ProofOfWork};
use shared_types::{Ping, PingBody, Tick, TickBody, TickRef};

use crate::error::{Result, RoundError};

/// Mine and sign a ping for `reference`.
pub fn mine_ping(
    credentials: &Credentials,
    pow: &ProofOfWork,
    timestamp: u64,
    reference: TickRef,
) -> Result<Ping> {
    let pubkey = credentials.pubkey_hex();
    let solution = pow
        .solve(|nonce| {
            PingBody {
                pubkey,
                timestamp,
                reference: &reference,
                nonce,
            }
            .encode()
        })
        .ok_or(RoundError::MiningExhausted)?;

    let mut ping = Ping {
        pubkey: pubkey.to_string(),
        timestamp,
        reference,
        nonce: solution.nonce,
        signature: String::new(),
    };
    ping.signature = credentials.sign_hex(&ping.body().encode());
    Ok(ping)
}

/// Mine and sign a tick bundling `list` on top of `prev_tick`.
pub fn mine_tick(
    credentials: &Credentials,
    pow: &ProofOfWork,
    list: Vec<Ping>,
    prev_tick: TickRef,
) -> Result<Tick> {
    let pubkey = credentials.pubkey_hex();
    let solution = pow
        .solve(|nonce| {
            TickBody {
                list: &list,
                pubkey,
                prev_tick: &prev_tick,
                nonce,
            }
            .encode()
        })
        .ok_or(RoundError::MiningExhausted)?;

    let mut tick = Tick {
        list,
        pubkey: pubkey.to_string(),
        prev_tick,
        nonce: solution.nonce,
        signature: String::new(),
        this_tick: TickRef::from_digest(&solution.digest),
    };
    tick.signature = credentials.sign_hex(&tick.body().encode());
    Ok(tick)
}
