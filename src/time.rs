//! Coarse millisecond time base.
//!
//! A free-running millisecond interrupt is the third and least demanding
//! interrupt source in the system; it exists only so foreground code can
//! pace itself coarsely (animation hold times and the like) and plays no
//! part in the scan timing. The counter wraps after ~49.7 days; elapsed
//! times are computed with wrapping arithmetic so the wrap is harmless.

use core::sync::atomic::{AtomicU32, Ordering};

/// Millisecond tick counter shared between the tick interrupt and
/// foreground code.
pub struct Millis {
    ticks: AtomicU32,
}

impl Millis {
    /// Start counting from zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ticks: AtomicU32::new(0),
        }
    }

    /// Handle one millisecond-tick interrupt.
    pub fn on_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    /// Milliseconds since startup, modulo 2^32.
    #[must_use]
    pub fn now(&self) -> u32 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Spin until at least `ms` milliseconds have elapsed.
    pub fn delay_ms(&self, ms: u32) {
        let start = self.now();
        while self.now().wrapping_sub(start) < ms {
            core::hint::spin_loop();
        }
    }
}

impl Default for Millis {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn test_counts_ticks() {
        let millis = Millis::new();
        assert_eq!(millis.now(), 0);
        for _ in 0..250 {
            millis.on_tick();
        }
        assert_eq!(millis.now(), 250);
    }

    #[test]
    fn test_elapsed_survives_wrap() {
        let millis = Millis::new();
        millis.ticks.store(u32::MAX, Ordering::Relaxed);
        let start = millis.now();
        millis.on_tick();
        millis.on_tick();
        assert_eq!(millis.now().wrapping_sub(start), 2);
    }

    #[test]
    fn test_zero_delay_returns_immediately() {
        let millis = Millis::new();
        millis.delay_ms(0);
    }
}
