//! Human device adapter.
//!
//! A device poller calls [`DeviceInputProvider::poll`] as often as it likes (render
//! frames, OS events); the simulation reads through [`InputSource`] at the fixed
//! tick rate. Dash/dive presses are accumulated between reads so a press that
//! lands between two ticks is never lost, and cleared on the first read.

use nalgebra::Vector2;
use parking_lot::Mutex;
use serde::Deserialize;
use std::sync::Arc;

use super::{EdgeLatch, InputSource};

/// Raw device levels for one poll. Buttons are "is down" levels, not edges.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct DeviceState {
    pub movement: [f32; 2],
    pub rotation: f32,
    pub jump: bool,
    pub sprint: bool,
    pub dash: bool,
    pub dive: bool,
}

#[derive(Debug, Default)]
struct DeviceInputData {
    levels: DeviceState,
    dash: EdgeLatch,
    dive: EdgeLatch,
}

/// Cloneable handle; clones share the same latches.
#[derive(Debug, Clone, Default)]
pub struct DeviceInputProvider {
    data: Arc<Mutex<DeviceInputData>>,
}

impl DeviceInputProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the device state observed by one poll.
    pub fn poll(&self, state: &DeviceState) {
        let mut data = self.data.lock();
        data.levels = *state;
        data.dash.observe(state.dash);
        data.dive.observe(state.dive);
    }

    /// Drop any pending edges (e.g. when focus is lost).
    pub fn clear_edges(&self) {
        let mut data = self.data.lock();
        data.dash.clear();
        data.dive.clear();
    }
}

impl InputSource for DeviceInputProvider {
    fn movement(&self) -> Vector2<f32> {
        let [x, y] = self.data.lock().levels.movement;
        Vector2::new(x, y)
    }

    fn rotation(&self) -> f32 {
        self.data.lock().levels.rotation
    }

    fn jump_held(&self) -> bool {
        self.data.lock().levels.jump
    }

    fn sprint_held(&self) -> bool {
        self.data.lock().levels.sprint
    }

    fn dash_pressed(&self) -> bool {
        self.data.lock().dash.take()
    }

    fn dive_pressed(&self) -> bool {
        self.data.lock().dive.take()
    }
}
