use std::net::IpAddr;
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Writes one client has spent in its current second.
#[derive(Debug, Clone, Copy)]
struct WriteBudget {
    opened: Instant,
    spent: u32,
}

impl WriteBudget {
    fn open(at: Instant) -> Self {
        Self { opened: at, spent: 0 }
    }

    fn expired(&self, at: Instant, window: Duration) -> bool {
        at.saturating_duration_since(self.opened) >= window
    }

    fn retry_after(&self, at: Instant, window: Duration) -> Duration {
        window.saturating_sub(at.saturating_duration_since(self.opened))
    }
}

/// Per-client budget for mutating requests (operations, registrations,
/// reference data edits). Reads are never limited.
pub struct WriteLimiter {
    budgets: DashMap<IpAddr, WriteBudget>,
    per_window: u32,
    window: Duration,
}

impl WriteLimiter {
    pub fn new(per_window: u32, window: Duration) -> Self {
        Self {
            budgets: DashMap::new(),
            per_window,
            window,
        }
    }

    /// `per_second` writes per client.
    pub fn per_second(per_second: u32) -> Self {
        Self::new(per_second, Duration::from_secs(1))
    }

    /// Spend one write for `ip`, or return how long it must wait.
    pub fn check(&self, ip: IpAddr) -> Result<(), Duration> {
        self.check_at(ip, Instant::now())
    }

    fn check_at(&self, ip: IpAddr, at: Instant) -> Result<(), Duration> {
        let mut budget = self.budgets.entry(ip).or_insert_with(|| WriteBudget::open(at));
        if budget.expired(at, self.window) {
            *budget = WriteBudget::open(at);
        }
        if budget.spent >= self.per_window {
            return Err(budget.retry_after(at, self.window));
        }
        budget.spent += 1;
        Ok(())
    }

    /// Forget clients that have not written for two windows. Returns how
    /// many were dropped.
    pub fn forget_idle(&self) -> usize {
        self.forget_idle_at(Instant::now())
    }

    fn forget_idle_at(&self, at: Instant) -> usize {
        let before = self.budgets.len();
        self.budgets
            .retain(|_, budget| !budget.expired(at, self.window * 2));
        before.saturating_sub(self.budgets.len())
    }
}
