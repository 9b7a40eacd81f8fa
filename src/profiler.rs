// primus/src/profiler.rs
//
//! Per-worker timing breakdown.
//!
//! A worker cycles through a fixed list of named states; `tick` credits the
//! time since the previous tick to the current state and advances. Every
//! five seconds, when the cycle is back at state zero, one profiling line
//! is emitted with the frame rate and the per-state percentages.

use std::fmt::Write;
use std::time::Instant;

const REPORT_PERIOD_SECONDS: f64 = 5.0;

pub struct Profiler {
    name: &'static str,
    state_names: &'static [&'static str],
    state: usize,
    state_time: Vec<f64>,
    prev_timestamp: Instant,
    print_timestamp: Instant,
    nframes: u32,
}

impl Profiler {
    pub fn new(name: &'static str, state_names: &'static [&'static str]) -> Profiler {
        let now = Instant::now();
        Profiler {
            name,
            state_names,
            state: 0,
            state_time: vec![0.0; state_names.len()],
            prev_timestamp: now,
            print_timestamp: now,
            nframes: 0,
        }
    }

    pub fn tick(&mut self, state_reset: bool) {
        let now = Instant::now();
        if state_reset {
            self.state = 0;
        }
        self.state_time[self.state] += now.duration_since(self.prev_timestamp).as_secs_f64();
        self.state = (self.state + 1) % self.state_names.len();
        self.prev_timestamp = now;
        if self.state == 0 {
            self.nframes += 1;
        }
        let period = now.duration_since(self.print_timestamp).as_secs_f64();
        if self.state != 0 || period < REPORT_PERIOD_SECONDS {
            return;
        }
        let mut breakdown = String::new();
        for (i, state_name) in self.state_names.iter().enumerate() {
            let _ = write!(
                breakdown,
                ", {:.1}% {}",
                100.0 * self.state_time[i] / period,
                state_name
            );
        }
        info!(
            "{}: {:.1} fps{}",
            self.name,
            f64::from(self.nframes) / period,
            breakdown
        );
        self.print_timestamp = now;
        self.nframes = 0;
        for slot in &mut self.state_time {
            *slot = 0.0;
        }
    }

    #[cfg(test)]
    fn state(&self) -> usize {
        self.state
    }

    #[cfg(test)]
    fn frames(&self) -> u32 {
        self.nframes
    }
}

#[cfg(test)]
mod tests {
    use super::Profiler;

    static STATES: [&str; 3] = ["app", "map", "wait"];

    #[test]
    fn states_advance_and_wrap() {
        let mut profiler = Profiler::new("test", &STATES);
        assert_eq!(profiler.state(), 0);
        profiler.tick(true);
        assert_eq!(profiler.state(), 1);
        profiler.tick(false);
        assert_eq!(profiler.state(), 2);
        profiler.tick(false);
        assert_eq!(profiler.state(), 0);
        assert_eq!(profiler.frames(), 1);
    }

    #[test]
    fn reset_returns_to_first_state() {
        let mut profiler = Profiler::new("test", &STATES);
        profiler.tick(true);
        profiler.tick(false);
        // A reset mid-cycle abandons the frame in progress.
        profiler.tick(true);
        assert_eq!(profiler.frames(), 0);
        assert_eq!(profiler.state(), 1);
    }
}
