//! Fixed-step driver owning the physics world and every character rig.
//!
//! Per frame: every rig polls its dash request, then the frame time is folded into
//! an accumulator and drained in fixed ticks (capped per frame).
//! Per tick: ground sense -> stamina regen -> controller -> write body -> physics
//! step -> trigger events.

use rapier3d::prelude::{ColliderHandle, RigidBodyHandle};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use super::character::{CharacterRig, RigError};
use super::ground::GroundSensor;
use super::input::InputSource;
use super::locomotion::TickOutcome;
use super::observation::Observation;
use super::physics::PhysicsWorld;
use super::stamina::{StaminaHandle, StaminaPool};
use crate::config::{ConfigError, SimulationConfig};

pub type CharacterId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerPhase {
    Entered,
    Exited,
}

/// A character crossed the boundary of a registered trigger zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerEvent {
    pub character: CharacterId,
    pub zone: String,
    pub phase: TriggerPhase,
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("unknown character {0}")]
    UnknownCharacter(CharacterId),
    #[error(transparent)]
    Rig(#[from] RigError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub struct Simulation {
    config: SimulationConfig,
    physics: PhysicsWorld,
    characters: BTreeMap<CharacterId, CharacterRig>,
    body_to_character: HashMap<RigidBodyHandle, CharacterId>,
    last_outcomes: HashMap<CharacterId, TickOutcome>,
    accumulator: f32,
    tick: u64,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        let mut physics = PhysicsWorld::new();
        physics.set_gravity(config.physics.gravity);
        Ok(Self {
            config,
            physics,
            characters: BTreeMap::new(),
            body_to_character: HashMap::new(),
            last_outcomes: HashMap::new(),
            accumulator: 0.0,
            tick: 0,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.physics
    }

    /// Fixed ticks run so far
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn add_floor(&mut self, top_y: f32, half_extent: f32) -> RigidBodyHandle {
        self.physics.add_floor(top_y, half_extent)
    }

    pub fn add_static_box(
        &mut self,
        position: [f32; 3],
        half_extents: [f32; 3],
    ) -> RigidBodyHandle {
        self.physics.add_static_box(position, half_extents)
    }

    pub fn add_trigger(
        &mut self,
        name: impl Into<String>,
        position: [f32; 3],
        half_extents: [f32; 3],
    ) -> ColliderHandle {
        self.physics.add_trigger(name, position, half_extents)
    }

    /// Creates a body, a ground sensor and a full stamina pool for `input` and attaches the rig.
    pub fn spawn_character(
        &mut self,
        input: Arc<dyn InputSource>,
        position: [f32; 3],
    ) -> Result<CharacterId, SimulationError> {
        let body = self.physics.add_character(position, &self.config.character);
        let rig = CharacterRig::builder(self.config.movement)
            .body(body)
            .ground_sensor(
                GroundSensor::new(self.config.ground.check_distance).with_reference(body),
            )
            .stamina(StaminaPool::new(self.config.stamina).into_handle())
            .input(input)
            .build();

        match rig {
            Ok(rig) => self.attach(rig),
            Err(e) => {
                self.physics.remove_body(body);
                Err(e.into())
            }
        }
    }

    /// Registers an externally assembled rig.
    pub fn attach(&mut self, rig: CharacterRig) -> Result<CharacterId, SimulationError> {
        let body = rig.body();
        if !self.physics.has_body(body) {
            let err = RigError::BodyNotInWorld(body);
            tracing::error!(error = %err, "refusing to attach character rig");
            return Err(err.into());
        }
        if let Some(owner) = self.body_to_character.get(&body) {
            let err = RigError::BodyInUse(body, *owner);
            tracing::error!(error = %err, "refusing to attach character rig");
            return Err(err.into());
        }

        let id = Uuid::new_v4();
        self.body_to_character.insert(body, id);
        self.characters.insert(id, rig);
        tracing::info!(character = %id, "character attached");
        Ok(id)
    }

    /// Detaches a character and removes its body from the world
    pub fn remove_character(&mut self, id: CharacterId) -> bool {
        let Some(rig) = self.characters.remove(&id) else {
            return false;
        };
        self.body_to_character.remove(&rig.body());
        self.last_outcomes.remove(&id);
        self.physics.remove_body(rig.body());
        true
    }

    pub fn character_ids(&self) -> impl Iterator<Item = CharacterId> + '_ {
        self.characters.keys().copied()
    }

    pub fn character(&self, id: CharacterId) -> Option<&CharacterRig> {
        self.characters.get(&id)
    }

    pub fn stamina(&self, id: CharacterId) -> Result<StaminaHandle, SimulationError> {
        self.rig(id).map(|rig| rig.stamina().clone())
    }

    /// Outcome of the most recent fixed tick for this character
    pub fn last_outcome(&self, id: CharacterId) -> Option<TickOutcome> {
        self.last_outcomes.get(&id).copied()
    }

    /// Per-frame input poll for every rig
    pub fn poll_frame(&mut self) {
        for rig in self.characters.values_mut() {
            rig.poll_frame();
        }
    }

    /// Advances by one variable-length frame and returns the trigger events it produced.
    pub fn advance(&mut self, frame_dt: f32) -> Vec<TriggerEvent> {
        self.poll_frame();

        let timestep = self.config.physics.timestep;
        self.accumulator += frame_dt.max(0.0);

        let mut events = Vec::new();
        let mut ticks = 0;
        while self.accumulator >= timestep && ticks < self.config.physics.max_ticks_per_frame {
            events.extend(self.fixed_tick());
            self.accumulator -= timestep;
            ticks += 1;
        }

        if self.accumulator >= timestep {
            let backlog = self.accumulator;
            self.accumulator = backlog.rem_euclid(timestep);
            tracing::debug!(backlog, ticks, "frame exceeded tick budget; dropping backlog");
        }
        events
    }

    /// Runs exactly one fixed tick.
    pub fn fixed_tick(&mut self) -> Vec<TriggerEvent> {
        let dt = self.config.physics.timestep;

        // Raycasts must see geometry added since the last step.
        self.physics.update_queries();

        for (id, rig) in self.characters.iter_mut() {
            let Some(outcome) = rig.fixed_tick(&mut self.physics, dt) else {
                continue;
            };
            if outcome.dashed || outcome.dived || outcome.jumped {
                tracing::trace!(
                    character = %id,
                    tick = self.tick,
                    dashed = outcome.dashed,
                    dived = outcome.dived,
                    jumped = outcome.jumped,
                    "ability used"
                );
            }
            self.last_outcomes.insert(*id, outcome);
        }

        self.physics.step(dt);
        self.tick += 1;

        self.collect_trigger_events()
    }

    /// Read-only snapshot for a decision step.
    pub fn observe(&self, id: CharacterId) -> Result<Observation, SimulationError> {
        let rig = self.rig(id)?;
        let body = self
            .physics
            .read_body(rig.body())
            .ok_or(SimulationError::Rig(RigError::BodyNotInWorld(rig.body())))?;
        let grounded = rig.ground_sensor().is_grounded(&self.physics);
        let stamina = rig.stamina().read().normalized();
        Ok(Observation::from_body(&body, self.config.arena_origin, grounded, stamina))
    }

    /// Episode restart: teleports to `position` facing +Z, clears controller state,
    /// refills stamina.
    pub fn reset_character(
        &mut self,
        id: CharacterId,
        position: [f32; 3],
    ) -> Result<(), SimulationError> {
        let rig = self
            .characters
            .get_mut(&id)
            .ok_or(SimulationError::UnknownCharacter(id))?;
        if !self.physics.teleport(rig.body(), position, 0.0) {
            return Err(RigError::BodyNotInWorld(rig.body()).into());
        }
        rig.reset();
        self.last_outcomes.remove(&id);
        tracing::debug!(character = %id, ?position, "character reset");
        Ok(())
    }

    fn rig(&self, id: CharacterId) -> Result<&CharacterRig, SimulationError> {
        self.characters
            .get(&id)
            .ok_or(SimulationError::UnknownCharacter(id))
    }

    fn collect_trigger_events(&self) -> Vec<TriggerEvent> {
        let mut events = Vec::new();
        for event in self.physics.drain_collision_events() {
            if !event.sensor() {
                continue;
            }
            let (a, b) = (event.collider1(), event.collider2());
            let phase = if event.started() {
                TriggerPhase::Entered
            } else {
                TriggerPhase::Exited
            };

            match self
                .resolve_trigger(a, b)
                .or_else(|| self.resolve_trigger(b, a))
            {
                Some((character, zone)) => events.push(TriggerEvent {
                    character,
                    zone,
                    phase,
                }),
                None => tracing::debug!(
                    ?a,
                    ?b,
                    ?phase,
                    "ignoring intersection with unrecognized identity"
                ),
            }
        }
        events
    }

    fn resolve_trigger(
        &self,
        zone: ColliderHandle,
        other: ColliderHandle,
    ) -> Option<(CharacterId, String)> {
        let name = self.physics.trigger_zone(zone)?;
        let body = self.physics.collider_body(other)?;
        let character = self.body_to_character.get(&body)?;
        Some((*character, name.to_string()))
    }
}
