//! Keyed timers on host-driven virtual time.
//!
//! Everything in this crate that "waits" is a deadline in one of these queues. The host
//! advances time explicitly, so no timer ever blocks and tests are deterministic.

use core::time::Duration;
use std::collections::BTreeMap;
use std::hash::Hash;

use ahash::AHashMap;

#[derive(Debug)]
pub struct Timers<K> {
    queue: BTreeMap<(Duration, u64), K>,
    by_key: AHashMap<K, (Duration, u64)>,
    next_seq: u64,
}

impl<K> Default for Timers<K> {
    fn default() -> Self {
        Self {
            queue: BTreeMap::new(),
            by_key: AHashMap::default(),
            next_seq: 0,
        }
    }
}

impl<K: Clone + Eq + Hash> Timers<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms `key` to fire at `due`. A pending timer with the same key is cancelled.
    ///
    /// Returns `true` if a pending timer was replaced.
    pub fn schedule(&mut self, key: K, due: Duration) -> bool {
        let replaced = self.cancel(&key);
        let slot = (due, self.next_seq);
        self.next_seq += 1;
        self.queue.insert(slot, key.clone());
        self.by_key.insert(key, slot);
        replaced
    }

    pub fn cancel(&mut self, key: &K) -> bool {
        match self.by_key.remove(key) {
            Some(slot) => {
                self.queue.remove(&slot);
                true
            }
            None => false,
        }
    }

    pub fn is_scheduled(&self, key: &K) -> bool {
        self.by_key.contains_key(key)
    }

    pub fn due_at(&self, key: &K) -> Option<Duration> {
        self.by_key.get(key).map(|&(due, _)| due)
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.queue.keys().next().map(|&(due, _)| due)
    }

    /// Removes and returns the earliest timer if it is due at `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<(Duration, K)> {
        let (&(due, seq), _) = self.queue.iter().next()?;
        if due > now {
            return None;
        }
        let key = self.queue.remove(&(due, seq))?;
        self.by_key.remove(&key);
        Some((due, key))
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
