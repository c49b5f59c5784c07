// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction so session TTL logic is deterministic under test.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of "now", expressed as seconds since the Unix epoch.
pub trait Clock: Clone + Send + Sync + 'static {
    fn now(&self) -> f64;
}

/// Real wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64()
    }
}

/// Clock with a manually advanced time, for deterministic TTL tests.
#[derive(Debug, Clone)]
pub struct FakeClock {
    micros: Arc<AtomicU64>,
}

impl FakeClock {
    pub fn new(seconds: f64) -> Self {
        Self {
            micros: Arc::new(AtomicU64::new((seconds * 1_000_000.0) as u64)),
        }
    }

    pub fn advance(&self, seconds: f64) {
        self.micros
            .fetch_add((seconds * 1_000_000.0) as u64, Ordering::SeqCst);
    }

    pub fn set(&self, seconds: f64) {
        self.micros
            .store((seconds * 1_000_000.0) as u64, Ordering::SeqCst);
    }
}

impl Clock for FakeClock {
    fn now(&self) -> f64 {
        self.micros.load(Ordering::SeqCst) as f64 / 1_000_000.0
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
