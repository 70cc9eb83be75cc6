//! Default tuning values for the physics world, the character body and its abilities.
//! Config sections fall back to these when a field is omitted.

/// Physics constants
pub mod physics {
    /// Gravity magnitude in m/s² (applied along -Y)
    pub const DEFAULT_GRAVITY: f32 = 9.81;

    /// Fixed timestep for the simulation (50 Hz)
    pub const TIMESTEP: f32 = 1.0 / 50.0;

    /// Upper bound on fixed ticks run for one variable-length frame
    pub const MAX_TICKS_PER_FRAME: u32 = 8;

    /// Small epsilon for float comparisons
    pub const EPSILON: f32 = 0.001;
}

/// Character body defaults
pub mod character {
    /// Capsule radius
    pub const RADIUS: f32 = 0.5;

    /// Capsule total height
    pub const HEIGHT: f32 = 2.0;

    /// Rigid body mass (kg)
    pub const MASS: f32 = 1.0;

    /// Downward probe length measured from the body center
    pub const GROUND_CHECK_DISTANCE: f32 = 1.2;
}

/// Locomotion and ability defaults
pub mod movement {
    pub const WALK_SPEED: f32 = 6.0;

    /// Time constant of the horizontal velocity smoothing (seconds)
    pub const SMOOTH_TIME: f32 = 0.08;

    pub const SPRINT_MULTIPLIER: f32 = 2.0;
    pub const SPRINT_DRAIN_PER_SECOND: f32 = 40.0;

    pub const JUMP_STRENGTH: f32 = 4.5;
    pub const MAX_JUMPS: u32 = 2;
    pub const DOUBLE_JUMP_COST: f32 = 8.0;

    pub const DASH_SPEED: f32 = 18.0;
    pub const DASH_DURATION: f32 = 0.18;
    pub const DASH_COOLDOWN: f32 = 1.0;
    pub const DASH_COST: f32 = 30.0;

    pub const DIVE_SPEED: f32 = 14.0;
    /// Downward component of the dive direction before normalization
    pub const DIVE_DOWN_MULTIPLIER: f32 = 1.2;
    pub const DIVE_COST: f32 = 10.0;

    pub const FALL_MULTIPLIER: f32 = 3.0;

    /// Yaw rate in degrees/second at full rotation intent
    pub const ROTATION_SPEED: f32 = 220.0;

    /// Movement intents with a squared length below this count as "no input"
    pub const MOVE_DEADZONE_SQ: f32 = 0.01;

    /// Rotation intents with a magnitude at or below this are ignored
    pub const ROTATION_DEADZONE: f32 = 0.01;
}

/// Stamina defaults
pub mod stamina {
    pub const MAX: f32 = 100.0;
    pub const REGEN_PER_SECOND: f32 = 15.0;

    /// Value the pool must regenerate to before leaving exhaustion
    pub const RECOVERY_THRESHOLD: f32 = 20.0;

    /// Changes smaller than this do not notify observers
    pub const EPSILON: f32 = 1.0e-5;

    /// Undelivered notifications buffered per channel subscriber
    pub const SUBSCRIBER_CAPACITY: usize = 64;
}
