use crossbeam_channel::{Receiver, Sender};
use nalgebra::{UnitQuaternion, Vector3};
use rapier3d::prelude::*;
use std::collections::HashMap;

use super::constants::physics as consts;
use crate::config::CharacterConfig;

// Characters don't collide with each other, only with static geometry and trigger volumes.
const GROUP_STATIC: Group = Group::GROUP_1; // Floors, walls, obstacles
const GROUP_CHARACTER: Group = Group::GROUP_2; // Controlled characters
const GROUP_TRIGGER: Group = Group::GROUP_3; // Named sensor volumes

/// Snapshot of a character body, read from and written back to rapier once per tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    pub position: Vector3<f32>,
    /// Heading around +Y in radians; 0 faces +Z.
    pub yaw: f32,
    pub linvel: Vector3<f32>,
    pub angvel: Vector3<f32>,
    pub mass: f32,
}

impl BodyState {
    pub fn at_rest(position: Vector3<f32>, mass: f32) -> Self {
        Self {
            position,
            yaw: 0.0,
            linvel: Vector3::zeros(),
            angvel: Vector3::zeros(),
            mass,
        }
    }

    pub fn facing(&self) -> UnitQuaternion<f32> {
        UnitQuaternion::from_axis_angle(&Vector3::y_axis(), self.yaw)
    }

    /// World-space forward (+Z rotated by yaw).
    pub fn forward(&self) -> Vector3<f32> {
        self.facing() * Vector3::z()
    }

    /// Rotates a direction from the character's local frame into world space.
    pub fn to_world(&self, local: Vector3<f32>) -> Vector3<f32> {
        self.facing() * local
    }
}

/// Extracts yaw from a body rotation via its forward vector.
pub fn yaw_from_rotation(rotation: &UnitQuaternion<f32>) -> f32 {
    let forward = rotation * Vector3::z();
    forward.x.atan2(forward.z)
}

pub fn wrap_angle_signed_pi(angle: f32) -> f32 {
    let two_pi = std::f32::consts::TAU;
    ((angle + std::f32::consts::PI).rem_euclid(two_pi)) - std::f32::consts::PI
}

/// Forwards rapier collision events into a channel drained after each step.
struct CollisionEventCollector {
    sender: Sender<CollisionEvent>,
}

impl EventHandler for CollisionEventCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        // Receiver lives as long as the world; a failed send only happens during drop.
        let _ = self.sender.send(event);
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

/// Wrapper around the Rapier3D world the characters live in.
pub struct PhysicsWorld {
    pub gravity: Vector<Real>,
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub integration_parameters: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub query_pipeline: QueryPipeline,

    /// Sensor colliders registered as named trigger zones
    pub trigger_zones: HashMap<ColliderHandle, String>,
    events: CollisionEventCollector,
    event_receiver: Receiver<CollisionEvent>,
}

impl PhysicsWorld {
    /// Creates a new physics world with default gravity
    pub fn new() -> Self {
        let (sender, event_receiver) = crossbeam_channel::unbounded();
        Self {
            gravity: vector![0.0, -consts::DEFAULT_GRAVITY, 0.0],
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            trigger_zones: HashMap::new(),
            events: CollisionEventCollector { sender },
            event_receiver,
        }
    }

    /// Sets the gravity magnitude (applied along -Y)
    pub fn set_gravity(&mut self, gravity_y: f32) {
        self.gravity = vector![0.0, -gravity_y, 0.0];
    }

    /// Steps the physics simulation forward by dt seconds
    pub fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &self.events,
        );
    }

    /// Refreshes the scene queries so raycasts see colliders added since the last step
    pub fn update_queries(&mut self) {
        self.query_pipeline.update(&self.collider_set);
    }

    /// Adds a fixed box centered at `position`
    pub fn add_static_box(
        &mut self,
        position: [f32; 3],
        half_extents: [f32; 3],
    ) -> RigidBodyHandle {
        let body = RigidBodyBuilder::fixed()
            .translation(vector![position[0], position[1], position[2]])
            .build();
        let handle = self.rigid_body_set.insert(body);

        let [hx, hy, hz] = half_extents;
        let collider = ColliderBuilder::cuboid(hx, hy, hz)
            .collision_groups(InteractionGroups::new(GROUP_STATIC, Group::ALL))
            .build();
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);

        handle
    }

    /// Adds a square floor slab whose top surface sits at `top_y`
    pub fn add_floor(&mut self, top_y: f32, half_extent: f32) -> RigidBodyHandle {
        self.add_static_box([0.0, top_y - 0.5, 0.0], [half_extent, 0.5, half_extent])
    }

    /// Adds a named sensor volume; characters entering it produce collision events
    pub fn add_trigger(
        &mut self,
        name: impl Into<String>,
        position: [f32; 3],
        half_extents: [f32; 3],
    ) -> ColliderHandle {
        let [hx, hy, hz] = half_extents;
        let collider = ColliderBuilder::cuboid(hx, hy, hz)
            .translation(vector![position[0], position[1], position[2]])
            .sensor(true)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .collision_groups(InteractionGroups::new(GROUP_TRIGGER, GROUP_CHARACTER))
            .build();
        let handle = self.collider_set.insert(collider);
        self.trigger_zones.insert(handle, name.into());
        handle
    }

    /// Name of a registered trigger zone
    pub fn trigger_zone(&self, collider: ColliderHandle) -> Option<&str> {
        self.trigger_zones.get(&collider).map(String::as_str)
    }

    /// Body a collider is attached to
    pub fn collider_body(&self, collider: ColliderHandle) -> Option<RigidBodyHandle> {
        self.collider_set.get(collider)?.parent()
    }

    /// Adds a dynamic capsule for a controlled character.
    /// Rotations are locked: yaw is written explicitly each tick and never simulated.
    pub fn add_character(
        &mut self,
        position: [f32; 3],
        config: &CharacterConfig,
    ) -> RigidBodyHandle {
        let body = RigidBodyBuilder::dynamic()
            .translation(vector![position[0], position[1], position[2]])
            .lock_rotations()
            .can_sleep(false)
            .ccd_enabled(true)
            .build();
        let body_handle = self.rigid_body_set.insert(body);

        // Capsule half-height is the cylinder part; total height = 2*half_height + 2*radius
        let half_height = (config.height - 2.0 * config.radius).max(0.0) / 2.0;
        let collider = ColliderBuilder::capsule_y(half_height, config.radius)
            .mass(config.mass)
            .friction(0.0)
            .friction_combine_rule(CoefficientCombineRule::Min)
            .collision_groups(InteractionGroups::new(
                GROUP_CHARACTER,
                GROUP_STATIC | GROUP_TRIGGER,
            ))
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        self.collider_set
            .insert_with_parent(collider, body_handle, &mut self.rigid_body_set);

        body_handle
    }

    /// Removes a body and its colliders
    pub fn remove_body(&mut self, handle: RigidBodyHandle) -> bool {
        self.rigid_body_set
            .remove(
                handle,
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true,
            )
            .is_some()
    }

    pub fn has_body(&self, handle: RigidBodyHandle) -> bool {
        self.rigid_body_set.contains(handle)
    }

    /// Gets the position of a rigid body
    pub fn get_position(&self, handle: RigidBodyHandle) -> Option<[f32; 3]> {
        self.rigid_body_set.get(handle).map(|body| {
            let pos = body.translation();
            [pos.x, pos.y, pos.z]
        })
    }

    /// Gets the velocity of a rigid body
    pub fn get_velocity(&self, handle: RigidBodyHandle) -> Option<[f32; 3]> {
        self.rigid_body_set.get(handle).map(|body| {
            let vel = body.linvel();
            [vel.x, vel.y, vel.z]
        })
    }

    /// Reads the state the locomotion controller works on
    pub fn read_body(&self, handle: RigidBodyHandle) -> Option<BodyState> {
        let body = self.rigid_body_set.get(handle)?;
        Some(BodyState {
            position: *body.translation(),
            yaw: yaw_from_rotation(body.rotation()),
            linvel: *body.linvel(),
            angvel: *body.angvel(),
            mass: body.mass(),
        })
    }

    /// Writes velocities and heading back. Position stays owned by the solver.
    pub fn write_body(&mut self, handle: RigidBodyHandle, state: &BodyState) -> bool {
        let Some(body) = self.rigid_body_set.get_mut(handle) else {
            return false;
        };
        body.set_linvel(state.linvel, true);
        body.set_angvel(state.angvel, true);
        body.set_rotation(state.facing(), true);
        true
    }

    /// Moves a body to `position` facing `yaw`, with all velocity cleared
    pub fn teleport(&mut self, handle: RigidBodyHandle, position: [f32; 3], yaw: f32) -> bool {
        let Some(body) = self.rigid_body_set.get_mut(handle) else {
            return false;
        };
        body.set_translation(vector![position[0], position[1], position[2]], true);
        body.set_rotation(UnitQuaternion::from_axis_angle(&Vector3::y_axis(), yaw), true);
        body.set_linvel(Vector3::zeros(), true);
        body.set_angvel(Vector3::zeros(), true);
        true
    }

    /// Casts a ray downward from a position against solid static geometry.
    /// Returns (hit_distance, hit_y) if ground is found within max_distance
    pub fn raycast_down(
        &self,
        origin: [f32; 3],
        max_distance: f32,
        exclude_body: Option<RigidBodyHandle>,
    ) -> Option<(f32, f32)> {
        let ray = Ray::new(
            point![origin[0], origin[1], origin[2]],
            vector![0.0, -1.0, 0.0],
        );

        let mut filter = QueryFilter::default()
            .exclude_sensors()
            .groups(InteractionGroups::new(GROUP_CHARACTER, GROUP_STATIC));
        if let Some(body_handle) = exclude_body {
            filter = filter.exclude_rigid_body(body_handle);
        }

        let (_, hit) = self.query_pipeline.cast_ray(
            &self.rigid_body_set,
            &self.collider_set,
            &ray,
            max_distance,
            true, // solid
            filter,
        )?;
        let hit_point = ray.point_at(hit);
        Some((hit, hit_point.y))
    }

    /// Collision events produced since the last drain
    pub fn drain_collision_events(&self) -> Vec<CollisionEvent> {
        self.event_receiver.try_iter().collect()
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}
