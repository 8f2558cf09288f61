//! # Cycle input builder
//!
//! Turns the estimated state and the short term goal into the initial state
//! and reference vectors for one solve.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::DVector;
use serde::Serialize;

// Internal
use crate::params::Dims;
use crate::types::{EstimatedState, GoalPose, StateVector};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Everything which changes between two solves, apart from the obstacles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleInput {
    /// Initial state, `[x, vx, y, vy, 0]`
    pub x0: StateVector,

    /// One reference per control stage, each `NY` long
    pub references: Vec<DVector<f64>>,

    /// Terminal reference, `[x, 0, y, 0]`
    pub terminal_reference: DVector<f64>,
}

/// Builds the `CycleInput` for the configured horizon.
#[derive(Debug, Clone)]
pub struct CycleInputBuilder {
    dims: Dims,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CycleInputBuilder {
    pub fn new(dims: Dims) -> Self {
        Self { dims }
    }

    /// Build the initial state and references.
    ///
    /// The same goal is tracked on every stage, all other outputs are driven
    /// towards zero. Non-finite values are passed through untouched.
    pub fn build(&self, state: &EstimatedState, goal: &GoalPose) -> CycleInput {
        let x0 = StateVector::new(
            state.position_m[0],
            state.velocity_ms[0],
            state.position_m[1],
            state.velocity_ms[1],
            0.0
        );

        let mut stage_ref = DVector::zeros(self.dims.ny);
        stage_ref[0] = goal.position_m[0];
        stage_ref[1] = goal.position_m[1];

        let mut terminal_reference = DVector::zeros(self.dims.nyn);
        terminal_reference[0] = goal.position_m[0];
        terminal_reference[2] = goal.position_m[1];

        CycleInput {
            x0,
            references: vec![stage_ref; self.dims.n],
            terminal_reference,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::params::PlannerParams;
    use nalgebra::Vector2;

    #[test]
    fn test_build() {
        let builder = CycleInputBuilder::new(PlannerParams::default().dims());

        let state = EstimatedState::new(Vector2::new(1.0, -2.0), Vector2::new(0.3, 0.4));
        let goal = GoalPose::from_position(5.0, 7.0);

        let input = builder.build(&state, &goal);

        assert_eq!(input.x0, StateVector::new(1.0, 0.3, -2.0, 0.4, 0.0));

        assert_eq!(input.references.len(), 20);
        for r in input.references.iter() {
            assert_eq!(r.len(), 12);
            assert_eq!(r[0], 5.0);
            assert_eq!(r[1], 7.0);
            assert!(r.iter().skip(2).all(|&v| v == 0.0));
        }

        assert_eq!(
            input.terminal_reference,
            DVector::from_vec(vec![5.0, 0.0, 7.0, 0.0])
        );
    }

    #[test]
    fn test_nan_passes_through() {
        let builder = CycleInputBuilder::new(PlannerParams::default().dims());

        let state = EstimatedState::new(Vector2::new(std::f64::NAN, 0.0), Vector2::zeros());
        let input = builder.build(&state, &GoalPose::from_position(1.0, 1.0));

        assert!(input.x0[0].is_nan());
    }
}
