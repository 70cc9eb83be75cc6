//! A controlled character: body, ground sensor, stamina, input and controller,
//! assembled explicitly by [`CharacterRigBuilder`].

use rapier3d::prelude::RigidBodyHandle;
use std::sync::Arc;
use thiserror::Error;

use super::ground::GroundSensor;
use super::input::InputSource;
use super::locomotion::{LocomotionController, TickOutcome};
use super::physics::PhysicsWorld;
use super::stamina::StaminaHandle;
use crate::config::{ConfigError, MovementConfig};

#[derive(Debug, Error)]
pub enum RigError {
    #[error("character rig is missing its {0}")]
    MissingCollaborator(&'static str),
    #[error("body {0:?} does not exist in the physics world")]
    BodyNotInWorld(RigidBodyHandle),
    #[error("body {0:?} already belongs to character {1}")]
    BodyInUse(RigidBodyHandle, uuid::Uuid),
    #[error(transparent)]
    InvalidTuning(#[from] ConfigError),
}

pub struct CharacterRig {
    body: RigidBodyHandle,
    ground: GroundSensor,
    stamina: StaminaHandle,
    input: Arc<dyn InputSource>,
    controller: LocomotionController,
}

impl CharacterRig {
    pub fn builder(movement: MovementConfig) -> CharacterRigBuilder {
        CharacterRigBuilder {
            movement,
            body: None,
            ground: None,
            stamina: None,
            input: None,
        }
    }

    pub fn body(&self) -> RigidBodyHandle {
        self.body
    }

    pub fn stamina(&self) -> &StaminaHandle {
        &self.stamina
    }

    pub fn controller(&self) -> &LocomotionController {
        &self.controller
    }

    pub fn ground_sensor(&self) -> &GroundSensor {
        &self.ground
    }

    /// Per-frame dash poll.
    pub fn poll_frame(&mut self) {
        let stamina = self.stamina.read();
        self.controller.poll_frame(self.input.as_ref(), &stamina);
    }

    /// Ground sense, stamina regen and the controller tick, then writes the body back.
    /// Returns None when the body has left the physics world.
    pub fn fixed_tick(&mut self, world: &mut PhysicsWorld, dt: f32) -> Option<TickOutcome> {
        let grounded = self.ground.is_grounded(world);
        let Some(mut state) = world.read_body(self.body) else {
            tracing::warn!(body = ?self.body, "character body missing; skipping tick");
            return None;
        };

        let outcome = {
            let mut stamina = self.stamina.write();
            stamina.tick(dt);
            self.controller.fixed_tick(
                &mut state,
                grounded,
                self.input.as_ref(),
                &mut stamina,
                world.gravity.y,
                dt,
            )
        };

        world.write_body(self.body, &state);
        Some(outcome)
    }

    /// Clears controller state and refills stamina.
    pub fn reset(&mut self) {
        self.controller.reset();
        self.stamina.write().refill();
    }
}

impl std::fmt::Debug for CharacterRig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CharacterRig")
            .field("body", &self.body)
            .field("ground", &self.ground)
            .field("controller", &self.controller)
            .finish_non_exhaustive()
    }
}

pub struct CharacterRigBuilder {
    movement: MovementConfig,
    body: Option<RigidBodyHandle>,
    ground: Option<GroundSensor>,
    stamina: Option<StaminaHandle>,
    input: Option<Arc<dyn InputSource>>,
}

impl CharacterRigBuilder {
    pub fn body(mut self, body: RigidBodyHandle) -> Self {
        self.body = Some(body);
        self
    }

    pub fn ground_sensor(mut self, sensor: GroundSensor) -> Self {
        self.ground = Some(sensor);
        self
    }

    pub fn stamina(mut self, stamina: StaminaHandle) -> Self {
        self.stamina = Some(stamina);
        self
    }

    pub fn input(mut self, input: Arc<dyn InputSource>) -> Self {
        self.input = Some(input);
        self
    }

    pub fn build(self) -> Result<CharacterRig, RigError> {
        let result = self.assemble();
        if let Err(e) = &result {
            tracing::error!(error = %e, "refusing to build character rig");
        }
        result
    }

    fn assemble(self) -> Result<CharacterRig, RigError> {
        let body = self.body.ok_or(RigError::MissingCollaborator("body"))?;
        let input = self.input.ok_or(RigError::MissingCollaborator("input source"))?;
        let stamina = self.stamina.ok_or(RigError::MissingCollaborator("stamina pool"))?;
        let mut ground = self
            .ground
            .ok_or(RigError::MissingCollaborator("ground sensor"))?;
        self.movement.validate()?;

        // A sensor without a reference probes from the rig's own body.
        if ground.reference().is_none() {
            ground.set_reference(body);
        }

        Ok(CharacterRig {
            body,
            ground,
            stamina,
            input,
            controller: LocomotionController::new(self.movement),
        })
    }
}
