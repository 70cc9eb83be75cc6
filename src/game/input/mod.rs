//! Abstract control input.
//!
//! The locomotion controller reads everything through [`InputSource`] and never
//! knows whether a device or a policy is behind it. Edge-triggered flags
//! (dash/dive "just pressed") are true for exactly one read after the edge.

pub mod agent;
pub mod device;

use nalgebra::Vector2;
use thiserror::Error;

pub use agent::{AgentAction, AgentInputProvider};
pub use device::{DeviceInputProvider, DeviceState};

/// Capability interface implemented once per control scheme.
///
/// Level accessors are pure reads. The `*_pressed` accessors consume the pending
/// edge, so a second read without a new press returns false.
pub trait InputSource: Send + Sync {
    /// Planar movement intent: x = strafe, y = forward. Not normalized.
    fn movement(&self) -> Vector2<f32>;
    /// Signed yaw intent, nominally -1..=1.
    fn rotation(&self) -> f32;
    fn jump_held(&self) -> bool;
    fn sprint_held(&self) -> bool;
    fn dash_pressed(&self) -> bool;
    fn dive_pressed(&self) -> bool;
}

/// Per-tick sample of the level inputs plus the dive edge.
///
/// Dash is not part of the tick snapshot: it is latched by the per-frame poll
/// so eligibility is checked when the press happens.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InputSnapshot {
    pub movement: Vector2<f32>,
    pub rotation: f32,
    pub jump_held: bool,
    pub sprint_held: bool,
    pub dive_pressed: bool,
}

impl InputSnapshot {
    pub fn sample(source: &dyn InputSource) -> Self {
        Self {
            movement: source.movement(),
            sprint_held: source.sprint_held(),
            jump_held: source.jump_held(),
            dive_pressed: source.dive_pressed(),
            rotation: source.rotation(),
        }
    }
}

/// Set-on-edge, clear-on-read latch.
///
/// `observe` may run many times between reads; a rising edge stays pending until
/// `take` returns it.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeLatch {
    pending: bool,
    was_down: bool,
}

impl EdgeLatch {
    /// Feed the current level; a false -> true transition arms the latch.
    pub fn observe(&mut self, down: bool) {
        if down && !self.was_down {
            self.pending = true;
        }
        self.was_down = down;
    }

    /// Arm the latch directly (decision outputs are already edges).
    pub fn trigger(&mut self) {
        self.pending = true;
    }

    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn clear(&mut self) {
        self.pending = false;
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("{kind} action buffer too short: expected at least {expected}, got {got}")]
    ActionShape {
        kind: &'static str,
        expected: usize,
        got: usize,
    },
}
