//! Per-address challenge token bookkeeping.

use dashmap::DashMap;
use std::net::SocketAddr;

/// Issues and consumes anti-spoofing challenge tokens, one per client
/// address.
///
/// The map is sharded, so clients on distinct addresses never contend on a
/// single lock, and `consume` removes its entry atomically: a token can be
/// redeemed at most once, and a concurrent issue/consume pair for the same
/// address never observes a half-written token. Issuing again for the same
/// address silently replaces the previous token. Unconsumed tokens are kept
/// until replaced; a client that requests challenges and never queries grows
/// the map by one entry per address.
#[derive(Default)]
pub struct ChallengeStore {
    tokens: DashMap<SocketAddr, u32>,
}

impl ChallengeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates a fresh token for `addr`, replacing any outstanding one.
    pub fn issue(&self, addr: SocketAddr) -> u32 {
        let token = rand::random::<u32>();
        self.tokens.insert(addr, token);
        token
    }

    /// Atomically looks up and removes the token for `addr`.
    ///
    /// Returns `None` if the address never requested a challenge or already
    /// redeemed it.
    pub fn consume(&self, addr: &SocketAddr) -> Option<u32> {
        self.tokens.remove(addr).map(|(_, token)| token)
    }

    /// Number of outstanding tokens.
    pub fn outstanding(&self) -> usize {
        self.tokens.len()
    }
}
