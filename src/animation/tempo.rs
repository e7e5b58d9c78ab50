//! Tempo sources: how long to wait between two steps

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Default delay between steps in milliseconds
pub const DEFAULT_STEP_DELAY_MS: u64 = 500;

/// Provides the delay before the next step
///
/// Read on every tick, so a change takes effect on the very next step.
#[cfg_attr(test, mockall::automock)]
pub trait TempoSource: Send {
    /// Delay in milliseconds
    fn delay_ms(&self) -> u64;
}

/// A constant delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedTempo(pub u64);

impl Default for FixedTempo {
    fn default() -> Self {
        Self(DEFAULT_STEP_DELAY_MS)
    }
}

impl TempoSource for FixedTempo {
    fn delay_ms(&self) -> u64 {
        self.0
    }
}

/// A delay that can be changed from elsewhere, e.g. a speed slider
#[derive(Debug, Clone)]
pub struct SharedTempo(Arc<AtomicU64>);

impl SharedTempo {
    pub fn new(delay_ms: u64) -> Self {
        Self(Arc::new(AtomicU64::new(delay_ms)))
    }

    /// Change the delay for all clones of this handle
    pub fn set(&self, delay_ms: u64) {
        self.0.store(delay_ms, Ordering::Relaxed);
    }
}

impl Default for SharedTempo {
    fn default() -> Self {
        Self::new(DEFAULT_STEP_DELAY_MS)
    }
}

impl TempoSource for SharedTempo {
    fn delay_ms(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}
