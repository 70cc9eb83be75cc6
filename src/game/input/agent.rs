//! Autonomous-control adapter.
//!
//! An external decision process (e.g. an RL policy) writes one action per decision
//! step. Levels hold until the next decision; dash/dive are one-shot edges that
//! the controller consumes on read.

use nalgebra::Vector2;
use parking_lot::Mutex;
use std::sync::Arc;

use super::{EdgeLatch, InputError, InputSource};

/// Number of continuous action components: move x, move z, rotate.
pub const CONTINUOUS_ACTIONS: usize = 3;

/// One decision-step action.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct AgentAction {
    pub movement: [f32; 2],
    pub rotation: f32,
    pub jump: bool,
    pub sprint: bool,
    pub dash: bool,
    pub dive: bool,
}

#[derive(Debug, Default)]
struct AgentInputData {
    movement: Vector2<f32>,
    rotation: f32,
    jump_held: bool,
    sprint_held: bool,
    dash: EdgeLatch,
    dive: EdgeLatch,
    decisions: u64,
}

/// Cloneable handle: the policy keeps one clone, the character rig another.
#[derive(Debug, Clone, Default)]
pub struct AgentInputProvider {
    data: Arc<Mutex<AgentInputData>>,
}

impl AgentInputProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one decision. Replaces levels; arms dash/dive edges when requested.
    pub fn set_action(&self, action: AgentAction) {
        let mut data = self.data.lock();
        data.movement = Vector2::new(action.movement[0], action.movement[1]);
        data.rotation = action.rotation;
        data.jump_held = action.jump;
        data.sprint_held = action.sprint;
        if action.dash {
            data.dash.trigger();
        }
        if action.dive {
            data.dive.trigger();
        }
        data.decisions += 1;
    }

    /// Map raw policy buffers onto an action.
    ///
    /// `continuous` = [move_x, move_z, rotate]; `discrete` = [jump, sprint, dash, dive]
    /// as 0/1 values. Missing trailing discrete branches count as 0, so a policy with
    /// only a jump branch works unchanged.
    pub fn apply_decision(&self, continuous: &[f32], discrete: &[i32]) -> Result<(), InputError> {
        if continuous.len() < CONTINUOUS_ACTIONS {
            return Err(InputError::ActionShape {
                kind: "continuous",
                expected: CONTINUOUS_ACTIONS,
                got: continuous.len(),
            });
        }
        let branch = |i: usize| discrete.get(i).copied().unwrap_or(0) == 1;
        self.set_action(AgentAction {
            movement: [continuous[0], continuous[1]],
            rotation: continuous[2],
            jump: branch(0),
            sprint: branch(1),
            dash: branch(2),
            dive: branch(3),
        });
        Ok(())
    }

    /// Number of decisions applied so far.
    pub fn decisions(&self) -> u64 {
        self.data.lock().decisions
    }
}

impl InputSource for AgentInputProvider {
    fn movement(&self) -> Vector2<f32> {
        self.data.lock().movement
    }

    fn rotation(&self) -> f32 {
        self.data.lock().rotation
    }

    fn jump_held(&self) -> bool {
        self.data.lock().jump_held
    }

    fn sprint_held(&self) -> bool {
        self.data.lock().sprint_held
    }

    fn dash_pressed(&self) -> bool {
        self.data.lock().dash.take()
    }

    fn dive_pressed(&self) -> bool {
        self.data.lock().dive.take()
    }
}
