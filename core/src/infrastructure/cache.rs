// Copyright (c) 2026 servermgr contributors
// SPDX-License-Identifier: MIT

//! Single-entry TTL cache for the merged server directory.

use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

struct Entry<T> {
    value: T,
    expires_at: Instant,
}

/// One expiring slot. The whole entry is replaced atomically on refresh,
/// never partially updated, and a failed refresh leaves the previous entry
/// untouched.
///
/// The slot mutex is held across the populate call, so concurrent misses on
/// the same cell are serialized: after expiry the populating closure runs
/// once and every waiter observes its result.
pub struct TtlCell<T> {
    slot: Mutex<Option<Entry<T>>>,
}

impl<T: Clone> TtlCell<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Return the unexpired value, or run `populate` and store its result
    /// with a fresh TTL. A populate error propagates without touching the
    /// stored entry.
    pub async fn get_or_populate<F, Fut, E>(&self, ttl: Duration, populate: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut slot = self.slot.lock().await;

        if let Some(entry) = slot.as_ref() {
            if entry.expires_at > Instant::now() {
                return Ok(entry.value.clone());
            }
        }

        let value = populate().await?;
        *slot = Some(Entry {
            value: value.clone(),
            expires_at: Instant::now() + ttl,
        });
        Ok(value)
    }

    /// Drop the stored entry, forcing the next read to repopulate.
    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
    }
}

impl<T: Clone> Default for TtlCell<T> {
    fn default() -> Self {
        Self::new()
    }
}
