//! Loading-state bookkeeping.
//!
//! # Design
//! Each dispatcher key maps to the number of requests currently in flight
//! for it, so a key stays loading until its last request ends. A boolean
//! per key would let the first of two concurrent requests clear the flag
//! while its sibling is still pending.
//!
//! Both stores keep their state inside a `tokio::sync::watch` channel. The
//! channel's write lock serializes every counter update, and UI code can
//! `subscribe()` to be woken on changes.

use std::collections::HashMap;

use tokio::sync::watch;

/// Per-key in-flight counters.
pub type LoaderSnapshot = HashMap<String, usize>;

#[derive(Debug)]
pub struct LoaderState {
    tx: watch::Sender<LoaderSnapshot>,
}

impl Default for LoaderState {
    fn default() -> Self {
        Self::new()
    }
}

impl LoaderState {
    pub fn new() -> Self {
        Self {
            tx: watch::Sender::new(LoaderSnapshot::new()),
        }
    }

    pub fn mark_start(&self, key: &str) {
        self.tx.send_modify(|state| {
            *state.entry(key.to_string()).or_insert(0) += 1;
        });
    }

    /// Unmatched ends are ignored rather than underflowing.
    pub fn mark_end(&self, key: &str) {
        self.tx.send_if_modified(|state| {
            let Some(count) = state.get_mut(key) else {
                log::warn!("loader end for {key} without a matching start");
                return false;
            };
            // Zero counts are never stored.
            *count -= 1;
            if *count == 0 {
                state.remove(key);
            }
            true
        });
    }

    pub fn is_loading(&self, key: &str) -> bool {
        self.in_flight(key) > 0
    }

    pub fn in_flight(&self, key: &str) -> usize {
        self.tx.borrow().get(key).copied().unwrap_or(0)
    }

    pub fn snapshot(&self) -> LoaderSnapshot {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LoaderSnapshot> {
        self.tx.subscribe()
    }
}

/// Process-wide flag covering every outbound call, keyed or not.
#[derive(Debug)]
pub struct GlobalLoader {
    tx: watch::Sender<usize>,
}

impl Default for GlobalLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl GlobalLoader {
    pub fn new() -> Self {
        Self {
            tx: watch::Sender::new(0),
        }
    }

    pub fn begin(&self) {
        self.tx.send_modify(|count| *count += 1);
    }

    pub fn finish(&self) {
        self.tx.send_if_modified(|count| {
            if *count == 0 {
                log::warn!("global loader finish without a matching begin");
                return false;
            }
            *count -= 1;
            true
        });
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight() > 0
    }

    pub fn in_flight(&self) -> usize {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.tx.subscribe()
    }
}
