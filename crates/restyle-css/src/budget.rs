//! Cooperative time budget for a resolution pass.

use std::time::{Duration, Instant};

/// Polled by the resolver at every element boundary.
pub trait TimeBudget {
    /// `true` once the pass should stop.
    fn expired(&self) -> bool;
}

/// Never expires.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unlimited;

impl TimeBudget for Unlimited {
    fn expired(&self) -> bool {
        false
    }
}

/// Expires at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// A deadline `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
        }
    }

    pub fn at(at: Instant) -> Self {
        Self { at }
    }

    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }
}

impl TimeBudget for Deadline {
    fn expired(&self) -> bool {
        Instant::now() >= self.at
    }
}

/// The budget for an optional configured limit.
pub fn from_limit(limit: Option<Duration>) -> Box<dyn TimeBudget> {
    match limit {
        Some(budget) => Box::new(Deadline::after(budget)),
        None => Box::new(Unlimited),
    }
}
