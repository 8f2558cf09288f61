//! Planner input types

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{UnitQuaternion, Vector2, Vector5};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TYPES
// ---------------------------------------------------------------------------

/// One stage of the differential state, `[x, vx, y, vy, aux]`.
///
/// `aux` is owned by the solver's model and is never estimated externally.
pub type StateVector = Vector5<f64>;

/// One stage of the control, `[vx_cmd, vy_cmd]`.
pub type ControlVector = Vector2<f64>;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The estimated state of the robot, as produced by odometry.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EstimatedState {
    /// Position in the world frame.
    ///
    /// Units: meters
    pub position_m: Vector2<f64>,

    /// Body frame velocity.
    ///
    /// Units: meters/second
    pub velocity_ms: Vector2<f64>,
}

/// The commanded short term goal.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalPose {
    /// Target position in the world frame.
    ///
    /// Units: meters
    pub position_m: Vector2<f64>,

    /// Target attitude in the world frame.
    pub attitude_q: UnitQuaternion<f64>,
}

/// A known obstacle.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Position in the world frame.
    ///
    /// Units: meters
    pub position_m: Vector2<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl EstimatedState {
    pub fn new(position_m: Vector2<f64>, velocity_ms: Vector2<f64>) -> Self {
        Self {
            position_m,
            velocity_ms,
        }
    }

    /// Build an estimate from the first four channels of a predicted state.
    pub fn from_state_vector(x: &StateVector) -> Self {
        Self::new(Vector2::new(x[0], x[2]), Vector2::new(x[1], x[3]))
    }
}

impl GoalPose {
    pub fn new(position_m: Vector2<f64>, attitude_q: UnitQuaternion<f64>) -> Self {
        Self {
            position_m,
            attitude_q,
        }
    }

    /// A goal at the given position with no particular attitude.
    pub fn from_position(x_m: f64, y_m: f64) -> Self {
        Self::new(Vector2::new(x_m, y_m), UnitQuaternion::identity())
    }
}

impl Obstacle {
    pub fn new(x_m: f64, y_m: f64) -> Self {
        Self {
            position_m: Vector2::new(x_m, y_m),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_from_state_vector() {
        let state = EstimatedState::from_state_vector(&StateVector::new(1.0, 0.2, -3.0, 0.4, 7.0));

        assert_eq!(state.position_m, Vector2::new(1.0, -3.0));
        assert_eq!(state.velocity_ms, Vector2::new(0.2, 0.4));
    }
}
