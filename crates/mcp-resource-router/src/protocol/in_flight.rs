//! Cancellation tokens of requests currently being served, keyed by the
//! session that sent them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;

use crate::types::RequestId;

/// Request ids are only unique within one client, so the key carries the
/// session as well.
type Key = (Option<String>, RequestId);

#[derive(Debug, Default)]
struct Table {
    next_generation: u64,
    entries: HashMap<Key, Vec<(u64, CancellationToken)>>,
}

/// Shared table of in-flight requests.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    table: Arc<Mutex<Table>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `token` for `(session, id)`. The entry lives until the
    /// returned guard is dropped, including when the request future is
    /// dropped before completion.
    pub fn track(&self, session: Option<&str>, id: RequestId, token: CancellationToken) -> InFlightGuard {
        let key = (session.map(str::to_string), id);
        let mut table = lock(&self.table);
        let generation = table.next_generation;
        table.next_generation += 1;
        table
            .entries
            .entry(key.clone())
            .or_default()
            .push((generation, token));

        InFlightGuard {
            table: self.table.clone(),
            key,
            generation,
        }
    }

    /// Cancel every in-flight request `id` sent under `session`. Returns
    /// whether any was found.
    pub fn cancel(&self, session: Option<&str>, id: &RequestId) -> bool {
        let key = (session.map(str::to_string), id.clone());
        match lock(&self.table).entries.get(&key) {
            Some(tokens) => {
                for (_, token) in tokens {
                    token.cancel();
                }
                true
            }
            None => false,
        }
    }

    /// Number of tracked requests.
    pub fn len(&self) -> usize {
        lock(&self.table).entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Removes its entry from the table on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    table: Arc<Mutex<Table>>,
    key: Key,
    generation: u64,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut table = lock(&self.table);
        if let Some(tokens) = table.entries.get_mut(&self.key) {
            tokens.retain(|(generation, _)| *generation != self.generation);
            if tokens.is_empty() {
                table.entries.remove(&self.key);
            }
        }
    }
}

/// The table holds no invariant a panicking holder could break halfway.
fn lock(table: &Mutex<Table>) -> MutexGuard<'_, Table> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}
