//! Memory introspection feeding the engine's scaling and skip policy.

use parking_lot::Mutex;
use sysinfo::System;

/// Reports memory conditions for concurrency scaling and skip decisions.
///
/// The engine only reads two numbers; keeping them behind a trait lets
/// tests inject fixed readings instead of the host's real state.
pub trait MemoryGauge: Send + Sync {
    /// Bytes of memory currently available.
    fn available(&self) -> u64;

    /// Bytes of memory currently in use.
    fn used(&self) -> u64;
}

/// Gauge backed by the host's real memory counters.
pub struct SystemMemoryGauge {
    system: Mutex<System>,
}

impl SystemMemoryGauge {
    /// Creates a gauge reading the host's memory state.
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for SystemMemoryGauge {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGauge for SystemMemoryGauge {
    fn available(&self) -> u64 {
        let mut system = self.system.lock();
        system.refresh_memory();
        system.available_memory()
    }

    fn used(&self) -> u64 {
        let mut system = self.system.lock();
        system.refresh_memory();
        system.used_memory()
    }
}

/// Gauge with fixed readings, for tests and callers that manage memory
/// budgets themselves.
#[derive(Debug, Clone, Copy)]
pub struct FixedMemoryGauge {
    /// Reported available bytes.
    pub available: u64,
    /// Reported used bytes.
    pub used: u64,
}

impl MemoryGauge for FixedMemoryGauge {
    fn available(&self) -> u64 {
        self.available
    }

    fn used(&self) -> u64 {
        self.used
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_gauge_reports_something() {
        let gauge = SystemMemoryGauge::new();
        // On any real host at least one of these is non-zero.
        assert!(gauge.available() > 0 || gauge.used() > 0);
    }

    #[test]
    fn fixed_gauge_reports_what_it_was_given() {
        let gauge = FixedMemoryGauge {
            available: 42,
            used: 7,
        };
        assert_eq!(gauge.available(), 42);
        assert_eq!(gauge.used(), 7);
    }
}
