//! Stamina pool: a bounded resource with passive regen and exhaustion hysteresis.
//!
//! Two consumption paths exist:
//! - [`StaminaPool::try_consume`] is an all-or-nothing gate for discrete abilities
//!   (dash, dive, air jumps).
//! - [`StaminaPool::force_consume`] drains whatever is left, for continuous costs
//!   such as sprinting, so the drain never flickers on and off at the boundary.
//!
//! Once the pool hits zero it is exhausted and stays exhausted until passive regen
//! brings it back to the recovery threshold.
//!
//! Observers registered on a pool behind a [`StaminaHandle`] run after the write
//! lock is released, so a callback may read the handle it observes.

use crossbeam_channel::{Receiver, Sender, TrySendError};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use super::constants::stamina as consts;
use crate::config::StaminaConfig;

/// Payload of a stamina change notification.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct StaminaChanged {
    pub current: f32,
    pub max: f32,
    pub exhausted: bool,
}

type Observer = Arc<dyn Fn(StaminaChanged) + Send + Sync>;

pub struct StaminaPool {
    current: f32,
    max: f32,
    regen_per_second: f32,
    recovery_threshold: f32,
    exhausted: bool,
    observers: Vec<Observer>,
    subscribers: Vec<Sender<StaminaChanged>>,
    /// Set while a handle's write guard is alive; observers run when it drops.
    deferred: Option<Vec<StaminaChanged>>,
}

impl StaminaPool {
    /// Creates a full pool.
    pub fn new(config: StaminaConfig) -> Self {
        let max = config.max.max(consts::EPSILON);
        Self {
            current: max,
            max,
            regen_per_second: config.regen_per_second.max(0.0),
            recovery_threshold: config.recovery_threshold.clamp(0.0, max),
            exhausted: false,
            observers: Vec::new(),
            subscribers: Vec::new(),
            deferred: None,
        }
    }

    /// Wraps the pool in a shared handle.
    pub fn into_handle(self) -> StaminaHandle {
        StaminaHandle(Arc::new(RwLock::new(self)))
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn recovery_threshold(&self) -> f32 {
        self.recovery_threshold
    }

    /// Current value in 0..=1.
    pub fn normalized(&self) -> f32 {
        self.current / self.max
    }

    /// Registers a synchronous observer, invoked on every actual value change.
    pub fn on_change<F>(&mut self, observer: F)
    where
        F: Fn(StaminaChanged) + Send + Sync + 'static,
    {
        self.observers.push(Arc::new(observer));
    }

    /// Returns a channel receiving change notifications.
    ///
    /// The channel holds at most `SUBSCRIBER_CAPACITY` undelivered events; further
    /// events are dropped until the receiver drains it. Dropped receivers are pruned
    /// on the next notification.
    pub fn subscribe(&mut self) -> Receiver<StaminaChanged> {
        let (tx, rx) = crossbeam_channel::bounded(consts::SUBSCRIBER_CAPACITY);
        self.subscribers.push(tx);
        rx
    }

    /// Passive regen for one step, then the exhaustion recovery check against the
    /// post-regen value.
    pub fn tick(&mut self, dt: f32) {
        let old = self.current;
        self.current = (self.current + self.regen_per_second * dt.max(0.0)).min(self.max);

        if self.exhausted && self.current >= self.recovery_threshold {
            self.exhausted = false;
            tracing::info!(
                current = self.current,
                threshold = self.recovery_threshold,
                "stamina recovered from exhaustion"
            );
        }

        if (self.current - old).abs() > consts::EPSILON {
            self.notify();
        }
    }

    /// Subtracts `amount` if the pool is not exhausted and holds at least `amount`.
    /// Negative and NaN amounts are rejected.
    pub fn try_consume(&mut self, amount: f32) -> bool {
        if amount.is_nan() || amount < 0.0 {
            tracing::debug!(amount, "stamina consumption rejected: invalid amount");
            return false;
        }
        if self.exhausted {
            tracing::debug!(amount, "stamina consumption rejected: exhausted");
            return false;
        }
        if self.current < amount {
            tracing::debug!(
                amount,
                current = self.current,
                max = self.max,
                "stamina consumption rejected: insufficient"
            );
            return false;
        }

        self.current -= amount;
        if self.current <= 0.0 {
            self.current = 0.0;
            self.exhausted = true;
            tracing::warn!("stamina exhausted");
        }
        self.notify();
        true
    }

    /// Drains up to `amount`, clamped at zero. Never fails; a no-op while exhausted.
    /// Negative and NaN amounts drain nothing.
    pub fn force_consume(&mut self, amount: f32) {
        if self.exhausted {
            return;
        }

        let old = self.current;
        // f32::max maps NaN to 0.0
        self.current = (self.current - amount.max(0.0)).max(0.0);

        if self.current <= 0.0 {
            self.exhausted = true;
            tracing::warn!("stamina exhausted");
        }

        if (self.current - old).abs() > consts::EPSILON {
            self.notify();
        }
    }

    /// Adds `amount`, clamped to max. Does not touch the exhaustion flag.
    pub fn restore(&mut self, amount: f32) {
        let old = self.current;
        self.current = (self.current + amount.max(0.0)).min(self.max);
        if (self.current - old).abs() > consts::EPSILON {
            tracing::debug!(amount, current = self.current, "stamina restored");
            self.notify();
        }
    }

    /// Refills the pool and clears exhaustion (episode restart).
    pub fn refill(&mut self) {
        let old = self.current;
        self.current = self.max;
        self.exhausted = false;
        if (self.current - old).abs() > consts::EPSILON {
            self.notify();
        }
    }

    fn notify(&mut self) {
        let event = StaminaChanged {
            current: self.current,
            max: self.max,
            exhausted: self.exhausted,
        };

        self.subscribers.retain(|tx| match tx.try_send(event) {
            Ok(()) | Err(TrySendError::Full(_)) => true,
            Err(TrySendError::Disconnected(_)) => false,
        });

        match &mut self.deferred {
            Some(pending) => pending.push(event),
            None => {
                for observer in &self.observers {
                    observer(event);
                }
            }
        }
    }
}

impl fmt::Debug for StaminaPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaminaPool")
            .field("current", &self.current)
            .field("max", &self.max)
            .field("regen_per_second", &self.regen_per_second)
            .field("recovery_threshold", &self.recovery_threshold)
            .field("exhausted", &self.exhausted)
            .field("observers", &self.observers.len())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

/// Shared handle: the controller writes, UI observers read.
#[derive(Debug, Clone)]
pub struct StaminaHandle(Arc<RwLock<StaminaPool>>);

impl StaminaHandle {
    pub fn read(&self) -> RwLockReadGuard<'_, StaminaPool> {
        self.0.read()
    }

    /// Exclusive access. Change notifications raised through the guard reach
    /// observers once the guard drops and the lock is free again.
    pub fn write(&self) -> StaminaWriteGuard<'_> {
        let mut guard = self.0.write();
        guard.deferred = Some(Vec::new());
        StaminaWriteGuard { guard }
    }
}

pub struct StaminaWriteGuard<'a> {
    guard: RwLockWriteGuard<'a, StaminaPool>,
}

impl Deref for StaminaWriteGuard<'_> {
    type Target = StaminaPool;

    fn deref(&self) -> &StaminaPool {
        &self.guard
    }
}

impl DerefMut for StaminaWriteGuard<'_> {
    fn deref_mut(&mut self) -> &mut StaminaPool {
        &mut self.guard
    }
}

impl Drop for StaminaWriteGuard<'_> {
    fn drop(&mut self) {
        let events = self.guard.deferred.take().unwrap_or_default();
        if events.is_empty() || self.guard.observers.is_empty() {
            return;
        }
        let observers = self.guard.observers.clone();
        RwLockWriteGuard::unlocked(&mut self.guard, || {
            for event in events {
                for observer in &observers {
                    observer(event);
                }
            }
        });
    }
}
