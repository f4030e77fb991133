//! Day/night flag flipped on a fixed interval of host-reported time.
//!
//! The scheduler owns no OS timer. The host calls [`TimeOfDayScheduler::advance`]
//! from its own loop, so tests drive it with whatever elapsed values they like.

use tracing::debug;

/// Shortest accepted period; anything below (or non-finite) is raised to it.
pub const MIN_PERIOD_SECS: f64 = 1.0;

#[derive(Clone, Debug)]
pub struct TimeOfDayScheduler {
    is_daytime: bool,
    period_secs: f64,
    running: bool,
    phase_secs: f64,
    /// Bumped on every `start`; identifies the installed timer in logs.
    generation: u64,
}

impl TimeOfDayScheduler {
    pub fn new(is_daytime: bool, period_secs: f64) -> Self {
        Self {
            is_daytime,
            period_secs: if period_secs.is_finite() {
                period_secs.max(MIN_PERIOD_SECS)
            } else {
                600.0
            },
            running: false,
            phase_secs: 0.0,
            generation: 0,
        }
    }

    pub fn is_daytime(&self) -> bool {
        self.is_daytime
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Replaces any running timer; the new one starts a fresh phase.
    pub fn start(&mut self) {
        if self.running {
            debug!(generation = self.generation, "replacing running day/night timer");
        }
        self.generation += 1;
        self.running = true;
        self.phase_secs = 0.0;
        debug!(generation = self.generation, period = self.period_secs, "day/night timer started");
    }

    pub fn stop(&mut self) {
        if self.running {
            debug!(generation = self.generation, "day/night timer stopped");
        }
        self.running = false;
        self.phase_secs = 0.0;
    }

    pub fn toggle(&mut self) -> bool {
        self.is_daytime = !self.is_daytime;
        self.is_daytime
    }

    pub fn set(&mut self, is_daytime: bool) {
        self.is_daytime = is_daytime;
    }

    /// Feeds elapsed time to the running timer. Returns how many times the
    /// flag flipped (zero while stopped).
    pub fn advance(&mut self, elapsed_secs: f64) -> u32 {
        if !self.running || !(elapsed_secs > 0.0) {
            return 0;
        }
        self.phase_secs += elapsed_secs;
        let whole = (self.phase_secs / self.period_secs).floor();
        if whole < 1.0 {
            return 0;
        }
        self.phase_secs -= whole * self.period_secs;
        if self.phase_secs < 0.0 || !self.phase_secs.is_finite() {
            self.phase_secs = 0.0;
        }
        if whole % 2.0 == 1.0 {
            self.is_daytime = !self.is_daytime;
        }
        let flips = whole.min(u32::MAX as f64) as u32;
        debug!(flips, is_daytime = self.is_daytime, "time of day changed");
        flips
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopped_timer_never_flips() {
        let mut t = TimeOfDayScheduler::new(true, 10.0);
        assert_eq!(t.advance(100.0), 0);
        assert!(t.is_daytime());
        t.stop();
        t.stop();
        assert!(!t.is_running());
    }

    #[test]
    fn running_timer_flips_each_period() {
        let mut t = TimeOfDayScheduler::new(true, 10.0);
        t.start();
        assert_eq!(t.advance(9.0), 0);
        assert_eq!(t.advance(1.0), 1);
        assert!(!t.is_daytime());
        assert_eq!(t.advance(25.0), 2);
        assert!(!t.is_daytime());
    }

    #[test]
    fn restart_replaces_the_old_phase() {
        let mut t = TimeOfDayScheduler::new(true, 10.0);
        t.start();
        t.advance(8.0);
        t.start();
        assert_eq!(t.advance(8.0), 0);
        assert!(t.is_daytime());
        assert_eq!(t.advance(2.0), 1);
    }

    #[test]
    fn tiny_periods_are_floored() {
        let mut t = TimeOfDayScheduler::new(true, 1e-9);
        t.start();
        assert_eq!(t.advance(0.5), 0);
        assert_eq!(t.advance(0.5), 1);
        assert_eq!(t.advance(7.0 * 24.0 * 3600.0), 604_800);
        assert!(!t.is_daytime());
    }

    #[test]
    fn manual_toggle_and_set() {
        let mut t = TimeOfDayScheduler::new(true, 10.0);
        assert!(!t.toggle());
        t.set(true);
        assert!(t.is_daytime());
    }
}
