//! # Local planner library.
//!
//! Nonlinear model predictive local planner solved with real-time
//! iterations. Each control cycle the planner takes the estimated state, the
//! short term goal and the known obstacles, and produces a position and
//! velocity trajectory over a fixed horizon, warm started from the previous
//! cycle's solution.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

/// Cycle input builder - initial state and references for one solve
pub mod cycle_input;

/// Online data refresher - obstacle slots for every stage
pub mod online_data;

/// Planner parameters and problem dimensions
pub mod params;

/// Top level planner module
pub mod planner;

/// Problem configuration - weights and bounds
pub mod problem;

/// RTI iteration driver
pub mod rti;

/// Solver interface and the in-tree condensing solver
pub mod solver;

/// Trajectory extractor
pub mod trajectory;

/// Input and output data types
pub mod types;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use params::PlannerParams;
pub use planner::{InputData, LocalPlanner, PlannerError};
pub use rti::{SolveReport, SolveStatus};
pub use trajectory::OutputTrajectory;
pub use types::{EstimatedState, GoalPose, Obstacle};
