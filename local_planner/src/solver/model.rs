//! Velocity tracking prediction model
//!
//! Each axis is a position integrating a velocity which follows the
//! commanded velocity with a first order lag. Discretised with explicit Euler.
//! The auxiliary channel is carried through unchanged.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Matrix5, Matrix5x2};

use crate::types::{ControlVector, StateVector};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Copy, Clone)]
pub struct VelocityModel {
    /// Stage period
    dt_s: f64,

    /// Fraction of the velocity error removed in one stage
    alpha: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl VelocityModel {
    pub fn new(stage_period_s: f64, vel_time_const_s: f64) -> Self {
        Self {
            dt_s: stage_period_s,
            alpha: stage_period_s / vel_time_const_s,
        }
    }

    /// Propagate a state by one stage.
    pub fn step(&self, x: &StateVector, u: &ControlVector) -> StateVector {
        StateVector::new(
            x[0] + self.dt_s * x[1],
            x[1] + self.alpha * (u[0] - x[1]),
            x[2] + self.dt_s * x[3],
            x[3] + self.alpha * (u[1] - x[3]),
            x[4]
        )
    }

    /// Partial derivative of `step` with respect to the state.
    pub fn state_jacobian(&self) -> Matrix5<f64> {
        let dt = self.dt_s;
        let a = 1.0 - self.alpha;

        Matrix5::new(
            1.0, dt,  0.0, 0.0, 0.0,
            0.0, a,   0.0, 0.0, 0.0,
            0.0, 0.0, 1.0, dt,  0.0,
            0.0, 0.0, 0.0, a,   0.0,
            0.0, 0.0, 0.0, 0.0, 1.0
        )
    }

    /// Partial derivative of `step` with respect to the control.
    pub fn control_jacobian(&self) -> Matrix5x2<f64> {
        let b = self.alpha;

        Matrix5x2::new(
            0.0, 0.0,
            b,   0.0,
            0.0, 0.0,
            0.0, b,
            0.0, 0.0
        )
    }

    /// Simulate from `x0` under `controls`, overwriting `states` with the
    /// `controls.len() + 1` resulting states.
    pub fn simulate(
        &self,
        x0: &StateVector,
        controls: &[ControlVector],
        states: &mut Vec<StateVector>
    ) {
        states.clear();
        states.push(*x0);

        for u in controls {
            let next = self.step(&states[states.len() - 1], u);
            states.push(next);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_step_matches_jacobians() {
        let model = VelocityModel::new(0.1, 0.2);
        let x = StateVector::new(1.0, 0.2, -1.0, -0.3, 0.7);
        let u = ControlVector::new(0.5, -0.5);

        let linear = model.state_jacobian() * x + model.control_jacobian() * u;
        let stepped = model.step(&x, &u);

        for i in 0..5 {
            assert!((linear[i] - stepped[i]).abs() < 1e-12);
        }
        assert_eq!(stepped[4], 0.7);
    }

    #[test]
    fn test_simulate_constant_command() {
        let model = VelocityModel::new(0.1, 0.2);
        let controls = vec![ControlVector::new(0.5, 0.0); 50];
        let mut states = Vec::new();

        model.simulate(&StateVector::zeros(), &controls, &mut states);

        assert_eq!(states.len(), 51);

        // Velocity converges on the command and position keeps increasing
        assert!((states[50][1] - 0.5).abs() < 1e-6);
        for k in 0..50 {
            assert!(states[k + 1][0] >= states[k][0]);
            assert_eq!(states[k][2], 0.0);
        }
    }
}
