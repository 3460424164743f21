//! Route lock state.

use std::time::Duration;

use rp_core::Timestamp;

/// Proof of holding a route lock.  Tokens are unique per route, so a token
/// from a lock that was broken for staleness no longer matches.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct LockToken(pub(crate) u64);

/// Exclusive right to read-then-mutate one route.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum RouteLock {
    #[default]
    Unlocked,
    Locked { since: Timestamp, token: LockToken },
}

impl RouteLock {
    pub fn is_locked(self) -> bool {
        matches!(self, RouteLock::Locked { .. })
    }

    /// `true` if locked for at least `ttl` as of `now`.
    pub fn is_stale(self, now: Timestamp, ttl: Duration) -> bool {
        match self {
            RouteLock::Unlocked          => false,
            RouteLock::Locked { since, .. } => now.since(since) >= ttl,
        }
    }

    pub fn holds(self, token: LockToken) -> bool {
        matches!(self, RouteLock::Locked { token: t, .. } if t == token)
    }
}
