use serde::{Deserialize, Serialize};
use tracing::debug;

/// Budget of emitter mass.
///
/// Only `spent` is stored; `available` is always `capacity - spent`, so
/// `available + spent == capacity` holds after every call. Both mutators take
/// `&mut self`, which makes each one a single critical section for its caller.
#[derive(Clone, Debug)]
pub struct MassLedger {
    capacity: f64,
    spent: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct MassSnapshot {
    pub capacity: f64,
    pub available: f64,
    pub spent: f64,
}

impl MassLedger {
    pub fn new(capacity: f64) -> Self {
        assert!(
            capacity.is_finite() && capacity >= 0.0,
            "capacity must be non-negative and finite"
        );
        Self {
            capacity,
            spent: 0.0,
        }
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn available(&self) -> f64 {
        self.capacity - self.spent
    }

    pub fn spent(&self) -> f64 {
        self.spent
    }

    /// Reserve `amount` if it fits. Returns `false` and leaves the ledger
    /// untouched when `amount` exceeds what is available.
    ///
    /// Negative or non-finite amounts are refused as well; accepting them
    /// would push `available` above `capacity`.
    pub fn try_spend(&mut self, amount: f64) -> bool {
        if !(amount.is_finite() && amount >= 0.0) || amount > self.available() {
            debug!(amount, available = self.available(), "mass spend refused");
            return false;
        }
        self.spent = (self.spent + amount).min(self.capacity);
        debug!(amount, available = self.available(), "mass spent");
        true
    }

    /// Return `amount` to the budget. Saturates at full capacity; the caller
    /// is responsible for refunding only what it spent.
    pub fn refund(&mut self, amount: f64) {
        if !(amount.is_finite() && amount >= 0.0) {
            debug!(amount, "ignoring invalid refund");
            return;
        }
        self.spent = (self.spent - amount).max(0.0);
        debug!(amount, available = self.available(), "mass refunded");
    }

    pub fn snapshot(&self) -> MassSnapshot {
        MassSnapshot {
            capacity: self.capacity,
            available: self.available(),
            spent: self.spent,
        }
    }
}
