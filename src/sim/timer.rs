//! Periodic activities driven by elapsed time
//!
//! Stand-in for host interval timers. The engine owns one per activity and
//! feeds them wall time, so rescheduling and cancellation stay inside the
//! simulation and can never leave a duplicate running.

/// A repeating activity with a fixed period
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeriodicTimer {
    period_ms: f64,
    elapsed_ms: f64,
    active: bool,
}

impl PeriodicTimer {
    /// Timer that is not scheduled
    pub const fn idle() -> Self {
        Self {
            period_ms: 0.0,
            elapsed_ms: 0.0,
            active: false,
        }
    }

    /// Install a fresh schedule, replacing any previous one.
    /// The first firing is one full period from now.
    pub fn schedule(&mut self, period_ms: u32) {
        self.period_ms = f64::from(period_ms.max(1));
        self.elapsed_ms = 0.0;
        self.active = true;
    }

    /// Stop the timer. Returns `true` only if it was running.
    pub fn cancel(&mut self) -> bool {
        let was_active = self.active;
        self.active = false;
        self.elapsed_ms = 0.0;
        was_active
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Current period (0 if never scheduled)
    pub fn period_ms(&self) -> f64 {
        self.period_ms
    }

    /// Time until the next firing, `None` when cancelled
    pub fn remaining_ms(&self) -> Option<f64> {
        self.active
            .then(|| (self.period_ms - self.elapsed_ms).max(0.0))
    }

    /// Let time pass without firing
    pub fn elapse(&mut self, ms: f64) {
        if self.active {
            self.elapsed_ms += ms;
        }
    }

    /// Consume one due firing, if any
    pub fn take_due(&mut self) -> bool {
        if self.active && self.elapsed_ms >= self.period_ms {
            self.elapsed_ms -= self.period_ms;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_never_fires() {
        let mut t = PeriodicTimer::idle();
        t.elapse(10_000.0);
        assert!(!t.take_due());
        assert_eq!(t.remaining_ms(), None);
    }

    #[test]
    fn test_fires_each_period() {
        let mut t = PeriodicTimer::idle();
        t.schedule(16);
        t.elapse(15.0);
        assert!(!t.take_due());
        t.elapse(1.0);
        assert!(t.take_due());
        assert!(!t.take_due());
        assert_eq!(t.remaining_ms(), Some(16.0));
    }

    #[test]
    fn test_reschedule_resets_phase() {
        let mut t = PeriodicTimer::idle();
        t.schedule(2500);
        t.elapse(2400.0);
        t.schedule(2300);
        assert_eq!(t.remaining_ms(), Some(2300.0));
        assert_eq!(t.period_ms(), 2300.0);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut t = PeriodicTimer::idle();
        t.schedule(100);
        assert!(t.cancel());
        assert!(!t.cancel());
        assert!(!t.is_active());
    }

    #[test]
    fn test_zero_period_clamped() {
        let mut t = PeriodicTimer::idle();
        t.schedule(0);
        assert_eq!(t.period_ms(), 1.0);
    }
}
