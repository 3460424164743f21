//! `RequestQueue`: waiting requests in arrival order.
//!
//! `BTreeSet<(Timestamp, RequestId)>` gives oldest-first iteration with the
//! request id as a deterministic tie-break for identical timestamps.
//!
//! # Claims
//!
//! A search pass claims a request before evaluating it and releases the
//! claim when done.  Concurrent passes skip claimed requests, so one request
//! is never matched twice.

use std::collections::{BTreeSet, HashMap, HashSet};

use rp_core::{RequestId, Timestamp};

#[derive(Default, Debug)]
pub struct RequestQueue {
    order:   BTreeSet<(Timestamp, RequestId)>,
    at:      HashMap<RequestId, Timestamp>,
    claimed: HashSet<RequestId>,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue `id`.  Re-pushing an id already queued is a no-op.
    pub fn push(&mut self, id: RequestId, requested_at: Timestamp) {
        if self.at.insert(id, requested_at).is_none() {
            self.order.insert((requested_at, id));
        }
    }

    /// Remove `id` (matched or cancelled).  Returns `false` if not queued.
    pub fn remove(&mut self, id: RequestId) -> bool {
        self.claimed.remove(&id);
        match self.at.remove(&id) {
            Some(t) => self.order.remove(&(t, id)),
            None    => false,
        }
    }

    /// Snapshot of queued ids, oldest first, including claimed ones.
    pub fn oldest_first(&self) -> Vec<RequestId> {
        self.order.iter().map(|&(_, id)| id).collect()
    }

    /// Claim `id` for evaluation.  Fails if it is not queued or already
    /// claimed by another pass.
    pub fn try_claim(&mut self, id: RequestId) -> bool {
        self.at.contains_key(&id) && self.claimed.insert(id)
    }

    pub fn release(&mut self, id: RequestId) {
        self.claimed.remove(&id);
    }

    pub fn is_claimed(&self, id: RequestId) -> bool {
        self.claimed.contains(&id)
    }

    pub fn contains(&self, id: RequestId) -> bool {
        self.at.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
