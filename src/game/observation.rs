use serde::Serialize;

use super::physics::BodyState;

/// Number of features produced by [`Observation::to_features`].
pub const FEATURE_COUNT: usize = 11;

/// Read-only per-decision snapshot of one character.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Observation {
    /// Position relative to the arena origin
    pub position: [f32; 3],
    pub forward: [f32; 3],
    pub velocity: [f32; 3],
    pub grounded: bool,
    /// Stamina in 0..=1
    pub stamina: f32,
}

impl Observation {
    pub fn from_body(
        body: &BodyState,
        arena_origin: [f32; 3],
        grounded: bool,
        stamina: f32,
    ) -> Self {
        let forward = body.forward();
        Self {
            position: [
                body.position.x - arena_origin[0],
                body.position.y - arena_origin[1],
                body.position.z - arena_origin[2],
            ],
            forward: [forward.x, forward.y, forward.z],
            velocity: [body.linvel.x, body.linvel.y, body.linvel.z],
            grounded,
            stamina,
        }
    }

    /// Flat feature vector: position, forward, velocity, grounded (0/1), stamina.
    pub fn to_features(&self) -> Vec<f32> {
        let mut features = Vec::with_capacity(FEATURE_COUNT);
        features.extend_from_slice(&self.position);
        features.extend_from_slice(&self.forward);
        features.extend_from_slice(&self.velocity);
        features.push(if self.grounded { 1.0 } else { 0.0 });
        features.push(self.stamina);
        features
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn test_position_is_relative_to_arena_origin() {
        let body = BodyState::at_rest(Vector3::new(12.0, 1.0, -3.0), 1.0);
        let obs = Observation::from_body(&body, [10.0, 0.0, -4.0], true, 0.5);
        assert_eq!(obs.position, [2.0, 1.0, 1.0]);
        assert_eq!(obs.forward, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_features_layout() {
        let mut body = BodyState::at_rest(Vector3::new(1.0, 2.0, 3.0), 1.0);
        body.linvel = Vector3::new(4.0, 5.0, 6.0);
        let features = Observation::from_body(&body, [0.0; 3], false, 0.25).to_features();
        assert_eq!(features.len(), FEATURE_COUNT);
        assert_eq!(&features[0..3], &[1.0, 2.0, 3.0]);
        assert_eq!(&features[6..9], &[4.0, 5.0, 6.0]);
        assert_eq!(features[9], 0.0);
        assert_eq!(features[10], 0.25);
    }

    #[test]
    fn test_serializes_to_json() {
        let body = BodyState::at_rest(Vector3::zeros(), 1.0);
        let obs = Observation::from_body(&body, [0.0; 3], true, 1.0);
        let json = serde_json::to_value(obs).unwrap();
        assert_eq!(json["grounded"], true);
        assert_eq!(json["stamina"], 1.0);
        assert_eq!(json["forward"][2], 1.0);
    }
}
