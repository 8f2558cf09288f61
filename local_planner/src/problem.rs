//! # Problem configuration
//!
//! The static half of the optimal control problem: cost weights and the
//! per-stage bounds on the controls and on the obstacle distance rows. It is
//! built once from the parameters and never changes afterwards.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::info;
use nalgebra::{DMatrix, DVector, Vector2};
use serde::Serialize;

// Internal
use crate::params::{Dims, PlannerParams, NUM_TRACKED_OUTPUTS};
use util::maths::fmt_row;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Weights and bounds of the optimal control problem.
#[derive(Debug, Clone, Serialize)]
pub struct ProblemConfig {
    /// Dimensions of the problem
    pub dims: Dims,

    /// Stage cost weight, `W`. Diagonal, `NY x NY`.
    pub stage_weight: DMatrix<f64>,

    /// Terminal cost weight, `WN`. Diagonal, `NYN x NYN`.
    pub terminal_weight: DMatrix<f64>,

    /// Bounds for each of the `N` control stages.
    pub stage_bounds: Vec<StageBounds>,
}

/// Bounds applying to a single stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageBounds {
    /// Lower bound on each control.
    ///
    /// Units: meters/second
    pub control_min: Vector2<f64>,

    /// Upper bound on each control.
    ///
    /// Units: meters/second
    pub control_max: Vector2<f64>,

    /// Lower bound of each obstacle distance row.
    ///
    /// Units: meters
    pub obstacle_min: DVector<f64>,

    /// Upper bound of each obstacle distance row.
    ///
    /// Units: meters
    pub obstacle_max: DVector<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ProblemConfig {
    /// Build the weights and bounds for every stage of the horizon.
    ///
    /// The first `NUM_TRACKED_OUTPUTS` stage outputs carry the stage weight,
    /// the obstacle distance outputs which follow them are uncosted.
    pub fn initialize(params: &PlannerParams) -> Self {
        let dims = params.dims();

        let stage_diag = DVector::from_fn(dims.ny, |i, _| {
            if i < NUM_TRACKED_OUTPUTS {
                params.stage_weight
            }
            else {
                0.0
            }
        });
        let terminal_diag = DVector::from_element(dims.nyn, params.terminal_weight);

        let max = params.max_vel_cmd_ms;
        let stage = StageBounds {
            control_min: Vector2::new(-max, -max),
            control_max: Vector2::new(max, max),
            obstacle_min: DVector::from_element(dims.num_slots, params.min_obstacle_dist_m),
            obstacle_max: DVector::from_element(dims.num_slots, params.max_obstacle_dist_m),
        };

        Self {
            dims,
            stage_weight: DMatrix::from_diagonal(&stage_diag),
            terminal_weight: DMatrix::from_diagonal(&terminal_diag),
            stage_bounds: vec![stage; dims.n],
        }
    }

    /// Log a human readable summary of the weights and bounds.
    pub fn log_summary(&self) {
        let stage_diag = self.stage_weight.diagonal();
        let terminal_diag = self.terminal_weight.diagonal();

        info!("Local planner W matrix diagonal:");
        info!("    {}", fmt_row(stage_diag.as_slice()));
        info!("Local planner WN matrix diagonal:");
        info!("    {}", fmt_row(terminal_diag.as_slice()));

        if let Some(b) = self.stage_bounds.first() {
            info!("Local planner control lower bounds:");
            info!("    {}", fmt_row(b.control_min.as_slice()));
            info!("Local planner control upper bounds:");
            info!("    {}", fmt_row(b.control_max.as_slice()));
            info!("Local planner obstacle distance bounds:");
            info!("    {} / {}", fmt_row(b.obstacle_min.as_slice()), fmt_row(b.obstacle_max.as_slice()));
        }
    }
}
