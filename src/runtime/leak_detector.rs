//! Process-wide allocation counters, reported by `tether --leak-detector`.
//!
//! These are shared by every connection in the process; per-connection
//! registry accounting lives in [`Registry`](crate::runtime::registry::Registry).
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeakStats {
    pub refs_created: usize,
    pub refs_released: usize,
    pub tables: usize,
    pub closures: usize,
    pub states: usize,
}

impl LeakStats {
    /// Registry references created but not yet released.
    pub fn refs_outstanding(&self) -> usize {
        self.refs_created.saturating_sub(self.refs_released)
    }
}

static REFS_CREATED: AtomicUsize = AtomicUsize::new(0);
static REFS_RELEASED: AtomicUsize = AtomicUsize::new(0);
static TABLES: AtomicUsize = AtomicUsize::new(0);
static CLOSURES: AtomicUsize = AtomicUsize::new(0);
static STATES: AtomicUsize = AtomicUsize::new(0);

pub fn record_ref() {
    REFS_CREATED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_unref() {
    REFS_RELEASED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_table() {
    TABLES.fetch_add(1, Ordering::Relaxed);
}

pub fn record_closure() {
    CLOSURES.fetch_add(1, Ordering::Relaxed);
}

pub fn record_state() {
    STATES.fetch_add(1, Ordering::Relaxed);
}

pub fn snapshot() -> LeakStats {
    LeakStats {
        refs_created: REFS_CREATED.load(Ordering::Relaxed),
        refs_released: REFS_RELEASED.load(Ordering::Relaxed),
        tables: TABLES.load(Ordering::Relaxed),
        closures: CLOSURES.load(Ordering::Relaxed),
        states: STATES.load(Ordering::Relaxed),
    }
}
