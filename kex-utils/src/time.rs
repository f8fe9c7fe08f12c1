use std::time::{Duration, Instant};

/// A wall-clock budget measured from the moment it was created.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    budget: Duration,
}

impl Deadline {
    pub fn new(budget: Duration) -> Self {
        Self {
            start: Instant::now(),
            budget,
        }
    }

    /// Negative or NaN budgets are empty, budgets too large for a `Duration` never expire.
    pub fn from_secs_f64(secs: f64) -> Self {
        let secs = if secs.is_nan() { 0.0 } else { secs.max(0.0) };
        Self::new(Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX))
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn remaining(&self) -> Duration {
        self.budget.saturating_sub(self.start.elapsed())
    }

    pub fn remaining_secs(&self) -> f64 {
        self.remaining().as_secs_f64()
    }

    pub fn expired(&self) -> bool {
        self.start.elapsed() >= self.budget
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }
}
