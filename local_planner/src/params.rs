//! Local planner parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of differential states, `[x, vx, y, vy, aux]`.
pub const NX: usize = 5;

/// Number of controls, `[vx_cmd, vy_cmd]`.
pub const NU: usize = 2;

/// Number of costed stage outputs, `[x, y, vx, vy, ux, uy]`. The obstacle
/// distance outputs follow these in the stage output vector.
pub const NUM_TRACKED_OUTPUTS: usize = 6;

/// Number of terminal outputs, `[x, vx, y, vy]`.
pub const NYN: usize = 4;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the local planner.
///
/// All values are fixed once the planner has been built. Any field missing
/// from a parameter file takes its value from `PlannerParams::default()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerParams {

    // ---- HORIZON ----

    /// Number of prediction stages, `N`.
    pub horizon_len: usize,

    /// Duration of one prediction stage.
    ///
    /// Units: seconds
    pub stage_period_s: f64,

    /// Time constant of the velocity response to a velocity command.
    ///
    /// Units: seconds
    pub vel_time_const_s: f64,

    // ---- COST ----

    /// Weight applied to each of the tracked stage outputs.
    pub stage_weight: f64,

    /// Weight applied to each of the terminal outputs.
    pub terminal_weight: f64,

    // ---- CONSTRAINTS ----

    /// Symmetric bound on each velocity command axis.
    ///
    /// Units: meters/second
    pub max_vel_cmd_ms: f64,

    /// Number of obstacle slots per stage.
    pub num_obstacle_slots: usize,

    /// Minimum tolerated distance to an obstacle.
    ///
    /// Units: meters
    pub min_obstacle_dist_m: f64,

    /// Upper bound on the obstacle distance rows. Only there so that the rows
    /// are two-sided, never expected to be reached.
    ///
    /// Units: meters
    pub max_obstacle_dist_m: f64,

    /// Position used to fill empty obstacle slots.
    ///
    /// Units: meters
    pub obstacle_sentinel_m: [f64; 2],

    // ---- ITERATION ----

    /// KKT residual under which the iteration is considered converged.
    pub kkt_threshold: f64,

    /// Maximum number of feedback steps per cycle, `K`.
    pub max_iterations: usize,

    /// Diagnostic output level
    pub verbosity: Verbosity,

    // ---- CONDENSING SOLVER ----

    /// Weight on the squared slack of a relaxed obstacle row. The rows are
    /// only relaxed when the constrained QP is infeasible.
    pub obstacle_penalty: f64,

    /// Absolute tolerance of the QP solver.
    pub qp_eps_abs: f64,

    /// Relative tolerance of the QP solver.
    pub qp_eps_rel: f64,

    /// Maximum number of QP solver iterations per feedback step.
    pub qp_max_iter: u32,
}

/// Number of rows and columns of each part of the optimisation problem.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct Dims {
    /// Number of stages
    pub n: usize,

    /// Number of differential states
    pub nx: usize,

    /// Number of controls
    pub nu: usize,

    /// Number of stage outputs
    pub ny: usize,

    /// Number of terminal outputs
    pub nyn: usize,

    /// Number of online data values per stage (two per obstacle slot)
    pub nod: usize,

    /// Number of obstacle slots
    pub num_slots: usize,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// How much the planner reports about each cycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verbosity {
    /// Nothing per cycle
    Quiet,

    /// Solve time and iteration count
    Verbose,

    /// Everything in `Verbose` plus the predicted states, controls and the
    /// terminal reference
    Dump,
}

/// Reasons a parameter set is rejected.
#[derive(Debug, thiserror::Error)]
pub enum ParamsError {
    #[error("The horizon must contain at least one stage")]
    EmptyHorizon,

    #[error("Expected {0} to be positive, found {1}")]
    NotPositive(&'static str, f64),

    #[error("Expected {0} to be a non-negative weight, found {1}")]
    NegativeWeight(&'static str, f64),

    #[error("Obstacle distance bounds are inverted: [{0}, {1}]")]
    InvertedObstacleBounds(f64, f64),

    #[error("The iteration cap must allow at least one feedback step")]
    ZeroIterationCap,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for PlannerParams {
    fn default() -> Self {
        Self {
            horizon_len: 20,
            stage_period_s: 0.1,
            vel_time_const_s: 0.2,
            stage_weight: 100.0,
            terminal_weight: 1000.0,
            max_vel_cmd_ms: 0.5,
            num_obstacle_slots: 6,
            min_obstacle_dist_m: 0.25,
            max_obstacle_dist_m: 10000.0,
            obstacle_sentinel_m: [100.0, 100.0],
            kkt_threshold: 1e-4,
            max_iterations: 10,
            verbosity: Verbosity::Quiet,
            obstacle_penalty: 1e4,
            qp_eps_abs: 1e-9,
            qp_eps_rel: 1e-9,
            qp_max_iter: 10000,
        }
    }
}

impl PlannerParams {
    /// Check the parameters describe a well-formed problem.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.horizon_len == 0 {
            return Err(ParamsError::EmptyHorizon)
        }

        for &(name, value) in [
            ("stage_period_s", self.stage_period_s),
            ("vel_time_const_s", self.vel_time_const_s),
            ("max_vel_cmd_ms", self.max_vel_cmd_ms),
            ("kkt_threshold", self.kkt_threshold),
            ("obstacle_penalty", self.obstacle_penalty),
            ("qp_eps_abs", self.qp_eps_abs),
            ("qp_eps_rel", self.qp_eps_rel),
            ("qp_max_iter", self.qp_max_iter as f64),
        ].iter() {
            // Also rejects NaN
            if !(value > 0.0) {
                return Err(ParamsError::NotPositive(name, value))
            }
        }

        for &(name, value) in [
            ("stage_weight", self.stage_weight),
            ("terminal_weight", self.terminal_weight),
        ].iter() {
            if !(value >= 0.0) || !value.is_finite() {
                return Err(ParamsError::NegativeWeight(name, value))
            }
        }

        if !(self.min_obstacle_dist_m < self.max_obstacle_dist_m) {
            return Err(ParamsError::InvertedObstacleBounds(
                self.min_obstacle_dist_m,
                self.max_obstacle_dist_m
            ))
        }

        if self.max_iterations == 0 {
            return Err(ParamsError::ZeroIterationCap)
        }

        Ok(())
    }

    /// Get the problem dimensions described by these parameters.
    pub fn dims(&self) -> Dims {
        Dims {
            n: self.horizon_len,
            nx: NX,
            nu: NU,
            ny: NUM_TRACKED_OUTPUTS + self.num_obstacle_slots,
            nyn: NYN,
            nod: 2 * self.num_obstacle_slots,
            num_slots: self.num_obstacle_slots,
        }
    }
}
