use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Tracks the two resources a run can exhaust: a dollar budget and a
/// wall-clock deadline (spec sections 3, 4.4, 5). `None` in `budget_usd`
/// means "unbounded" — every connector is affordable and `exhausted`
/// never fires on cost grounds.
pub struct BudgetTracker {
    remaining_usd: Mutex<Option<f64>>,
    deadline: Instant,
}

impl BudgetTracker {
    pub fn new(budget_usd: Option<f64>, run_timeout: Duration) -> Self {
        Self {
            remaining_usd: Mutex::new(budget_usd),
            deadline: Instant::now() + run_timeout,
        }
    }

    /// Deduct `amount` from the remaining budget. A no-op when unbounded.
    pub fn spend(&self, amount: f64) {
        let mut remaining = self.remaining_usd.lock().expect("budget mutex poisoned");
        if let Some(r) = remaining.as_mut() {
            *r -= amount;
        }
    }

    pub fn remaining_usd(&self) -> Option<f64> {
        *self.remaining_usd.lock().expect("budget mutex poisoned")
    }

    /// True once a bounded budget has been spent down to zero or below.
    pub fn exhausted(&self) -> bool {
        self.remaining_usd().map(|r| r <= 0.0).unwrap_or(false)
    }

    /// Time left until the global run deadline. Zero once it has passed.
    pub fn time_remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn deadline_elapsed(&self) -> bool {
        self.time_remaining().is_zero()
    }
}
