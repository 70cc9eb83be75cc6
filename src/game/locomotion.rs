//! Movement/resource state machine.
//!
//! Once per fixed tick the controller reads input, resolves at most one burst
//! (dash or dive), otherwise walks/sprints and jumps, then applies fast-fall and
//! yaw. It works on a [`BodyState`] value; the caller reads the body from the
//! physics world beforehand and writes it back afterwards.
//!
//! Ability requests are never queued: a request that cannot execute in the tick
//! it is seen is dropped.

use nalgebra::{Vector2, Vector3};

use super::constants::{movement as consts, physics as physics_consts};
use super::input::{InputSnapshot, InputSource};
use super::physics::{wrap_angle_signed_pi, BodyState};
use super::stamina::StaminaPool;
use crate::config::MovementConfig;

/// What happened during one controller tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct TickOutcome {
    pub grounded: bool,
    pub sprinting: bool,
    pub dashed: bool,
    pub dived: bool,
    pub jumped: bool,
    /// A dash/dive overrode normal control this tick
    pub burst_active: bool,
}

#[derive(Debug, Clone)]
pub struct LocomotionController {
    config: MovementConfig,
    dash_active: f32,
    dash_cooldown: f32,
    jumps_remaining: u32,
    jumped_this_ground: bool,
    dash_requested: bool,
    /// Rate state of the horizontal smoothing (XZ)
    smoothing_velocity: Vector2<f32>,
}

impl LocomotionController {
    pub fn new(config: MovementConfig) -> Self {
        Self {
            jumps_remaining: config.max_jumps,
            config,
            dash_active: 0.0,
            dash_cooldown: 0.0,
            jumped_this_ground: false,
            dash_requested: false,
            smoothing_velocity: Vector2::zeros(),
        }
    }

    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    /// Seconds left in the current burst
    pub fn dash_active(&self) -> f32 {
        self.dash_active
    }

    /// Seconds until the next burst may start
    pub fn dash_cooldown(&self) -> f32 {
        self.dash_cooldown
    }

    pub fn jumps_remaining(&self) -> u32 {
        self.jumps_remaining
    }

    pub fn dash_requested(&self) -> bool {
        self.dash_requested
    }

    /// Back to the freshly-constructed state (episode restart).
    pub fn reset(&mut self) {
        *self = Self::new(self.config);
    }

    /// Dash eligibility at this instant.
    pub fn can_dash_now(&self, stamina: &StaminaPool) -> bool {
        self.dash_cooldown <= 0.0
            && self.dash_active <= 0.0
            && !stamina.is_exhausted()
            && stamina.current() >= self.config.dash_cost
    }

    /// Per-frame poll: latches a dash request only if the dash is executable now.
    /// The press is consumed either way.
    pub fn poll_frame(&mut self, input: &dyn InputSource, stamina: &StaminaPool) -> bool {
        if input.dash_pressed() && self.can_dash_now(stamina) {
            self.dash_requested = true;
        }
        self.dash_requested
    }

    /// Runs one fixed tick against `body`.
    ///
    /// `gravity_y` is the signed world gravity along Y (negative pulls down).
    pub fn fixed_tick(
        &mut self,
        body: &mut BodyState,
        grounded: bool,
        input: &dyn InputSource,
        stamina: &mut StaminaPool,
        gravity_y: f32,
        dt: f32,
    ) -> TickOutcome {
        let mut outcome = TickOutcome {
            grounded,
            ..TickOutcome::default()
        };

        self.dash_cooldown = (self.dash_cooldown - dt).max(0.0);
        self.dash_active = (self.dash_active - dt).max(0.0);

        if grounded {
            self.jumps_remaining = self.config.max_jumps;
            self.jumped_this_ground = false;
        }

        let snapshot = InputSnapshot::sample(input);
        let intent = Vector3::new(snapshot.movement.x, 0.0, snapshot.movement.y);

        if std::mem::take(&mut self.dash_requested)
            && self.burst_ready()
            && stamina.try_consume(self.config.dash_cost)
        {
            let direction = if intent.norm_squared() < consts::MOVE_DEADZONE_SQ {
                body.forward()
            } else {
                body.to_world(intent.normalize())
            };
            body.linvel.x = direction.x * self.config.dash_speed;
            body.linvel.z = direction.z * self.config.dash_speed;
            self.start_burst();
            outcome.dashed = true;
            tracing::debug!(speed = self.config.dash_speed, "dash started");
        }

        if snapshot.dive_pressed
            && self.burst_ready()
            && stamina.try_consume(self.config.dive_cost)
        {
            let local = Vector3::new(
                snapshot.movement.x,
                -self.config.dive_down_multiplier,
                snapshot.movement.y,
            );
            // Zero only when both the intent and the down multiplier are zero.
            let direction = body.to_world(
                local
                    .try_normalize(physics_consts::EPSILON)
                    .unwrap_or_else(Vector3::zeros),
            );
            body.linvel = direction * self.config.dive_speed;
            self.start_burst();
            outcome.dived = true;
            tracing::debug!(speed = self.config.dive_speed, "dive started");
        }

        if self.dash_active > 0.0 && self.config.disable_control_during_burst {
            outcome.burst_active = true;
            self.apply_fast_fall(body, gravity_y, dt);
            self.apply_rotation(body, snapshot.rotation, dt);
            return outcome;
        }

        let moving = snapshot.movement.norm_squared() > consts::MOVE_DEADZONE_SQ;
        let mut speed = self.config.walk_speed;
        if snapshot.sprint_held && moving && !stamina.is_exhausted() && stamina.current() > 0.0 {
            stamina.force_consume(self.config.sprint_drain_per_second * dt);
            speed *= self.config.sprint_multiplier;
            outcome.sprinting = true;
        }

        let desired = body.to_world(intent) * speed;
        let smoothed = smooth_damp(
            Vector2::new(body.linvel.x, body.linvel.z),
            Vector2::new(desired.x, desired.z),
            &mut self.smoothing_velocity,
            self.config.smooth_time,
            dt,
        );
        body.linvel.x = smoothed.x;
        body.linvel.z = smoothed.y;

        if snapshot.jump_held && !self.jumped_this_ground && self.jumps_remaining > 0 {
            let air_jump = self.jumps_remaining < self.config.max_jumps;
            let affordable = !(air_jump && self.config.double_jump_cost > 0.0)
                || stamina.try_consume(self.config.double_jump_cost);
            if affordable {
                body.linvel.y = self.config.jump_strength / body.mass.max(physics_consts::EPSILON);
                self.jumps_remaining -= 1;
                self.jumped_this_ground = true;
                outcome.jumped = true;
                tracing::debug!(air_jump, remaining = self.jumps_remaining, "jump");
            }
        }
        if !snapshot.jump_held {
            self.jumped_this_ground = false;
        }

        self.apply_fast_fall(body, gravity_y, dt);
        self.apply_rotation(body, snapshot.rotation, dt);
        outcome
    }

    fn burst_ready(&self) -> bool {
        self.dash_cooldown <= 0.0 && self.dash_active <= 0.0
    }

    fn start_burst(&mut self) {
        self.dash_active = self.config.dash_duration;
        self.dash_cooldown = self.config.dash_cooldown;
    }

    fn apply_fast_fall(&self, body: &mut BodyState, gravity_y: f32, dt: f32) {
        if body.linvel.y < 0.0 {
            body.linvel.y += gravity_y * (self.config.fall_multiplier - 1.0) * dt;
        }
    }

    fn apply_rotation(&self, body: &mut BodyState, rotation: f32, dt: f32) {
        if rotation.abs() > consts::ROTATION_DEADZONE {
            let delta = self.config.rotation_speed.to_radians() * rotation * dt;
            body.yaw = wrap_angle_signed_pi(body.yaw + delta);
        }
    }
}

/// Critically damped spring toward `target`, never overshooting it.
///
/// `velocity` is the spring's rate state and must persist between calls.
pub fn smooth_damp(
    current: Vector2<f32>,
    target: Vector2<f32>,
    velocity: &mut Vector2<f32>,
    smooth_time: f32,
    dt: f32,
) -> Vector2<f32> {
    if dt <= 0.0 {
        return current;
    }
    let smooth_time = smooth_time.max(1.0e-4);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*velocity + change * omega) * dt;
    *velocity = (*velocity - temp * omega) * decay;
    let mut output = target + (change + temp) * decay;

    if (target - current).dot(&(output - target)) > 0.0 {
        output = target;
        *velocity = Vector2::zeros();
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StaminaConfig;
    use crate::game::input::{AgentAction, AgentInputProvider};

    const DT: f32 = 1.0 / 50.0;
    const GRAVITY_Y: f32 = -9.81;

    fn controller() -> LocomotionController {
        LocomotionController::new(MovementConfig::default())
    }

    fn stamina() -> StaminaPool {
        StaminaPool::new(StaminaConfig::default())
    }

    fn body() -> BodyState {
        BodyState::at_rest(Vector3::new(0.0, 1.0, 0.0), 1.0)
    }

    fn act(agent: &AgentInputProvider, action: AgentAction) {
        agent.set_action(action);
    }

    fn forward() -> AgentAction {
        AgentAction {
            movement: [0.0, 1.0],
            ..AgentAction::default()
        }
    }

    #[test]
    fn test_smooth_damp_converges_without_overshoot() {
        let mut rate = Vector2::zeros();
        let target = Vector2::new(6.0, 0.0);
        let mut value = Vector2::zeros();
        for _ in 0..100 {
            value = smooth_damp(value, target, &mut rate, 0.08, DT);
            assert!(value.x <= 6.0 + 1e-4);
        }
        assert!((value - target).norm() < 1e-3);
    }

    #[test]
    fn test_smooth_damp_zero_dt_is_identity() {
        let mut rate = Vector2::new(1.0, 1.0);
        let v = smooth_damp(Vector2::new(2.0, 3.0), Vector2::zeros(), &mut rate, 0.08, 0.0);
        assert_eq!(v, Vector2::new(2.0, 3.0));
    }

    #[test]
    fn test_walk_accelerates_along_facing() {
        let mut c = controller();
        let mut s = stamina();
        let agent = AgentInputProvider::new();
        act(&agent, forward());
        let mut b = body();

        for _ in 0..50 {
            c.fixed_tick(&mut b, true, &agent, &mut s, GRAVITY_Y, DT);
        }
        assert!((b.linvel.z - 6.0).abs() < 0.05, "vz {}", b.linvel.z);
        assert!(b.linvel.x.abs() < 1e-4);
    }

    #[test]
    fn test_walk_respects_yaw() {
        let mut c = controller();
        let mut s = stamina();
        let agent = AgentInputProvider::new();
        act(&agent, forward());
        let mut b = body();
        b.yaw = std::f32::consts::FRAC_PI_2;

        for _ in 0..50 {
            c.fixed_tick(&mut b, true, &agent, &mut s, GRAVITY_Y, DT);
        }
        assert!((b.linvel.x - 6.0).abs() < 0.05, "vx {}", b.linvel.x);
        assert!(b.linvel.z.abs() < 0.05);
    }

    #[test]
    fn test_smoothing_never_touches_vertical_velocity() {
        let mut c = controller();
        let mut s = stamina();
        let agent = AgentInputProvider::new();
        act(&agent, forward());

        let mut b = body();
        b.linvel.y = 2.5;
        c.fixed_tick(&mut b, true, &agent, &mut s, GRAVITY_Y, DT);
        assert_eq!(b.linvel.y, 2.5);

        // Falling: only fast-fall changes Y.
        let mut b = body();
        b.linvel.y = -1.0;
        c.fixed_tick(&mut b, false, &agent, &mut s, GRAVITY_Y, DT);
        let expected = -1.0 + GRAVITY_Y * 2.0 * DT;
        assert!((b.linvel.y - expected).abs() < 1e-5);
    }

    #[test]
    fn test_sprint_drains_and_speeds_up() {
        let mut c = controller();
        let mut s = stamina();
        let agent = AgentInputProvider::new();
        act(
            &agent,
            AgentAction {
                sprint: true,
                ..forward()
            },
        );
        let mut b = body();

        let outcome = c.fixed_tick(&mut b, true, &agent, &mut s, GRAVITY_Y, DT);
        assert!(outcome.sprinting);
        assert!((s.current() - (100.0 - 40.0 * DT)).abs() < 1e-4);

        for _ in 0..50 {
            c.fixed_tick(&mut b, true, &agent, &mut s, GRAVITY_Y, DT);
        }
        assert!(b.linvel.z > 6.5, "sprint speed {}", b.linvel.z);
    }

    #[test]
    fn test_sprint_needs_movement() {
        let mut c = controller();
        let mut s = stamina();
        let agent = AgentInputProvider::new();
        act(
            &agent,
            AgentAction {
                sprint: true,
                ..AgentAction::default()
            },
        );
        let mut b = body();
        let outcome = c.fixed_tick(&mut b, true, &agent, &mut s, GRAVITY_Y, DT);
        assert!(!outcome.sprinting);
        assert_eq!(s.current(), 100.0);
    }

    #[test]
    fn test_sprint_stops_while_exhausted() {
        let mut c = controller();
        let mut s = stamina();
        s.force_consume(100.0);
        let agent = AgentInputProvider::new();
        act(
            &agent,
            AgentAction {
                sprint: true,
                ..forward()
            },
        );
        let mut b = body();
        let outcome = c.fixed_tick(&mut b, true, &agent, &mut s, GRAVITY_Y, DT);
        assert!(!outcome.sprinting);
    }

    #[test]
    fn test_dash_succeeds_once_then_rejects_without_state_change() {
        let mut c = controller();
        let mut s = stamina();
        let agent = AgentInputProvider::new();
        let mut b = body();

        act(
            &agent,
            AgentAction {
                dash: true,
                ..AgentAction::default()
            },
        );
        assert!(c.poll_frame(&agent, &s));
        let outcome = c.fixed_tick(&mut b, true, &agent, &mut s, GRAVITY_Y, DT);
        assert!(outcome.dashed);
        assert!(outcome.burst_active);
        assert_eq!(s.current(), 70.0);
        assert_eq!(c.dash_active(), 0.18);
        assert_eq!(c.dash_cooldown(), 1.0);
        // No intent: dash along the current facing.
        assert!((b.linvel.z - 18.0).abs() < 1e-4);

        // Requested again one tick later: still cooling down.
        act(
            &agent,
            AgentAction {
                dash: true,
                ..AgentAction::default()
            },
        );
        assert!(!c.poll_frame(&agent, &s));
        let before = s.current();
        let outcome = c.fixed_tick(&mut b, true, &agent, &mut s, GRAVITY_Y, DT);
        assert!(!outcome.dashed);
        assert_eq!(s.current(), before);
        assert!((c.dash_cooldown() - (1.0 - DT)).abs() < 1e-6);
    }

    #[test]
    fn test_dash_budget_scenario() {
        // max 100, dash cost 30: three dashes fit, the fourth is refused.
        let mut c = controller();
        let mut s = StaminaPool::new(StaminaConfig {
            regen_per_second: 0.0,
            ..StaminaConfig::default()
        });
        let agent = AgentInputProvider::new();
        let mut b = body();
        let mut dashes = 0;

        for _ in 0..4 {
            act(
                &agent,
                AgentAction {
                    dash: true,
                    ..AgentAction::default()
                },
            );
            c.poll_frame(&agent, &s);
            if c.fixed_tick(&mut b, true, &agent, &mut s, GRAVITY_Y, DT).dashed {
                dashes += 1;
            }
            // Wait out the cooldown.
            for _ in 0..60 {
                c.fixed_tick(&mut b, true, &agent, &mut s, GRAVITY_Y, DT);
            }
        }

        assert_eq!(dashes, 3);
        assert!((s.current() - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_dash_request_not_latched_when_unaffordable() {
        let mut c = controller();
        let mut s = stamina();
        s.force_consume(80.0);
        let agent = AgentInputProvider::new();
        act(
            &agent,
            AgentAction {
                dash: true,
                ..AgentAction::default()
            },
        );
        assert!(!c.poll_frame(&agent, &s));
        // The press was consumed; restoring stamina does not resurrect it.
        s.restore(50.0);
        assert!(!c.poll_frame(&agent, &s));
    }

    #[test]
    fn test_dash_follows_intent_and_keeps_vertical() {
        let mut c = controller();
        let mut s = stamina();
        let agent = AgentInputProvider::new();
        act(
            &agent,
            AgentAction {
                movement: [1.0, 0.0],
                dash: true,
                ..AgentAction::default()
            },
        );
        let mut b = body();
        b.linvel.y = 3.0;
        c.poll_frame(&agent, &s);
        c.fixed_tick(&mut b, false, &agent, &mut s, GRAVITY_Y, DT);
        assert!((b.linvel.x - 18.0).abs() < 1e-4);
        assert!(b.linvel.z.abs() < 1e-4);
        assert_eq!(b.linvel.y, 3.0);
    }

    #[test]
    fn test_burst_blocks_walk_and_jump() {
        let mut c = controller();
        let mut s = stamina();
        let agent = AgentInputProvider::new();
        let mut b = body();
        act(
            &agent,
            AgentAction {
                dash: true,
                ..AgentAction::default()
            },
        );
        c.poll_frame(&agent, &s);
        c.fixed_tick(&mut b, true, &agent, &mut s, GRAVITY_Y, DT);

        act(
            &agent,
            AgentAction {
                movement: [0.0, -1.0],
                jump: true,
                ..AgentAction::default()
            },
        );
        let outcome = c.fixed_tick(&mut b, true, &agent, &mut s, GRAVITY_Y, DT);
        assert!(outcome.burst_active);
        assert!(!outcome.jumped);
        assert!((b.linvel.z - 18.0).abs() < 1e-4);
    }

    #[test]
    fn test_burst_with_control_enabled_allows_steering() {
        let mut c = LocomotionController::new(MovementConfig {
            disable_control_during_burst: false,
            ..MovementConfig::default()
        });
        let mut s = stamina();
        let agent = AgentInputProvider::new();
        let mut b = body();
        act(
            &agent,
            AgentAction {
                dash: true,
                ..AgentAction::default()
            },
        );
        c.poll_frame(&agent, &s);
        let outcome = c.fixed_tick(&mut b, true, &agent, &mut s, GRAVITY_Y, DT);
        assert!(outcome.dashed);
        assert!(!outcome.burst_active);
        // Smoothing already pulls the burst back toward the (zero) intent.
        assert!(b.linvel.z < 18.0);
    }

    #[test]
    fn test_dive_points_down_and_forward() {
        let mut c = controller();
        let mut s = stamina();
        let agent = AgentInputProvider::new();
        act(
            &agent,
            AgentAction {
                movement: [0.0, 1.0],
                dive: true,
                ..AgentAction::default()
            },
        );
        let mut b = body();
        let outcome = c.fixed_tick(&mut b, false, &agent, &mut s, GRAVITY_Y, DT);
        assert!(outcome.dived);
        assert_eq!(s.current(), 90.0);

        let norm = (1.0_f32 + 1.2 * 1.2).sqrt();
        let expected_z = 14.0 / norm;
        let expected_y = -14.0 * 1.2 / norm;
        assert!((b.linvel.z - expected_z).abs() < 1e-3);
        // Fast-fall is applied on top during the burst.
        let fast_fall = GRAVITY_Y * 2.0 * DT;
        assert!((b.linvel.y - (expected_y + fast_fall)).abs() < 1e-3);
    }

    #[test]
    fn test_dive_shares_burst_cooldown() {
        let mut c = controller();
        let mut s = stamina();
        let agent = AgentInputProvider::new();
        let mut b = body();
        act(
            &agent,
            AgentAction {
                dash: true,
                ..AgentAction::default()
            },
        );
        c.poll_frame(&agent, &s);
        c.fixed_tick(&mut b, true, &agent, &mut s, GRAVITY_Y, DT);

        act(
            &agent,
            AgentAction {
                dive: true,
                ..AgentAction::default()
            },
        );
        let outcome = c.fixed_tick(&mut b, true, &agent, &mut s, GRAVITY_Y, DT);
        assert!(!outcome.dived);
        assert_eq!(s.current(), 70.0);
    }

    #[test]
    fn test_one_jump_per_held_press() {
        let mut c = controller();
        let mut s = stamina();
        let agent = AgentInputProvider::new();
        act(
            &agent,
            AgentAction {
                jump: true,
                ..AgentAction::default()
            },
        );
        let mut b = body();

        let first = c.fixed_tick(&mut b, true, &agent, &mut s, GRAVITY_Y, DT);
        assert!(first.jumped);
        assert_eq!(b.linvel.y, 4.5);
        assert_eq!(c.jumps_remaining(), 1);

        // Airborne with jump still held: no second jump.
        for _ in 0..10 {
            let outcome = c.fixed_tick(&mut b, false, &agent, &mut s, GRAVITY_Y, DT);
            assert!(!outcome.jumped);
        }
        assert_eq!(c.jumps_remaining(), 1);
        assert_eq!(s.current(), 100.0);
    }

    #[test]
    fn test_air_jump_costs_stamina() {
        let mut c = controller();
        let mut s = stamina();
        let agent = AgentInputProvider::new();
        let mut b = body();

        act(
            &agent,
            AgentAction {
                jump: true,
                ..AgentAction::default()
            },
        );
        c.fixed_tick(&mut b, true, &agent, &mut s, GRAVITY_Y, DT);

        act(&agent, AgentAction::default());
        c.fixed_tick(&mut b, false, &agent, &mut s, GRAVITY_Y, DT);

        b.linvel.y = -2.0;
        act(
            &agent,
            AgentAction {
                jump: true,
                ..AgentAction::default()
            },
        );
        let outcome = c.fixed_tick(&mut b, false, &agent, &mut s, GRAVITY_Y, DT);
        assert!(outcome.jumped);
        // Vertical velocity is zeroed before the impulse.
        assert_eq!(b.linvel.y, 4.5);
        assert_eq!(s.current(), 92.0);
        assert_eq!(c.jumps_remaining(), 0);

        // Out of jumps until landing.
        act(&agent, AgentAction::default());
        c.fixed_tick(&mut b, false, &agent, &mut s, GRAVITY_Y, DT);
        act(
            &agent,
            AgentAction {
                jump: true,
                ..AgentAction::default()
            },
        );
        assert!(!c.fixed_tick(&mut b, false, &agent, &mut s, GRAVITY_Y, DT).jumped);
    }

    #[test]
    fn test_air_jump_refused_while_exhausted() {
        let mut c = controller();
        let mut s = stamina();
        let agent = AgentInputProvider::new();
        let mut b = body();
        act(
            &agent,
            AgentAction {
                jump: true,
                ..AgentAction::default()
            },
        );
        c.fixed_tick(&mut b, true, &agent, &mut s, GRAVITY_Y, DT);
        act(&agent, AgentAction::default());
        c.fixed_tick(&mut b, false, &agent, &mut s, GRAVITY_Y, DT);

        s.force_consume(100.0);
        act(
            &agent,
            AgentAction {
                jump: true,
                ..AgentAction::default()
            },
        );
        assert!(!c.fixed_tick(&mut b, false, &agent, &mut s, GRAVITY_Y, DT).jumped);
        assert_eq!(c.jumps_remaining(), 1);
    }

    #[test]
    fn test_jump_impulse_scales_with_mass() {
        let mut c = controller();
        let mut s = stamina();
        let agent = AgentInputProvider::new();
        act(
            &agent,
            AgentAction {
                jump: true,
                ..AgentAction::default()
            },
        );
        let mut b = BodyState::at_rest(Vector3::zeros(), 2.0);
        c.fixed_tick(&mut b, true, &agent, &mut s, GRAVITY_Y, DT);
        assert_eq!(b.linvel.y, 2.25);
    }

    #[test]
    fn test_landing_resets_jumps_and_latch() {
        let mut c = controller();
        let mut s = stamina();
        let agent = AgentInputProvider::new();
        let mut b = body();
        act(
            &agent,
            AgentAction {
                jump: true,
                ..AgentAction::default()
            },
        );
        c.fixed_tick(&mut b, true, &agent, &mut s, GRAVITY_Y, DT);
        c.fixed_tick(&mut b, false, &agent, &mut s, GRAVITY_Y, DT);
        assert_eq!(c.jumps_remaining(), 1);

        // Landing with jump still held re-arms a full set of jumps.
        let outcome = c.fixed_tick(&mut b, true, &agent, &mut s, GRAVITY_Y, DT);
        assert!(outcome.jumped);
        assert_eq!(c.jumps_remaining(), 1);
        assert_eq!(s.current(), 100.0);
    }

    #[test]
    fn test_rotation_turns_at_configured_rate() {
        let mut c = controller();
        let mut s = stamina();
        let agent = AgentInputProvider::new();
        act(
            &agent,
            AgentAction {
                rotation: 1.0,
                ..AgentAction::default()
            },
        );
        let mut b = body();
        c.fixed_tick(&mut b, true, &agent, &mut s, GRAVITY_Y, DT);
        assert!((b.yaw - 220.0_f32.to_radians() * DT).abs() < 1e-6);

        act(
            &agent,
            AgentAction {
                rotation: 0.005,
                ..AgentAction::default()
            },
        );
        let yaw = b.yaw;
        c.fixed_tick(&mut b, true, &agent, &mut s, GRAVITY_Y, DT);
        assert_eq!(b.yaw, yaw);
    }

    #[test]
    fn test_timers_floor_at_zero() {
        let mut c = controller();
        let mut s = stamina();
        let agent = AgentInputProvider::new();
        let mut b = body();
        act(
            &agent,
            AgentAction {
                dash: true,
                ..AgentAction::default()
            },
        );
        c.poll_frame(&agent, &s);
        c.fixed_tick(&mut b, true, &agent, &mut s, GRAVITY_Y, DT);
        for _ in 0..200 {
            c.fixed_tick(&mut b, true, &agent, &mut s, GRAVITY_Y, DT);
        }
        assert_eq!(c.dash_active(), 0.0);
        assert_eq!(c.dash_cooldown(), 0.0);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut c = controller();
        let mut s = stamina();
        let agent = AgentInputProvider::new();
        let mut b = body();
        act(
            &agent,
            AgentAction {
                dash: true,
                jump: true,
                ..AgentAction::default()
            },
        );
        c.poll_frame(&agent, &s);
        c.fixed_tick(&mut b, false, &agent, &mut s, GRAVITY_Y, DT);
        c.reset();
        assert_eq!(c.dash_active(), 0.0);
        assert_eq!(c.dash_cooldown(), 0.0);
        assert_eq!(c.jumps_remaining(), 2);
        assert!(!c.dash_requested());
    }
}
