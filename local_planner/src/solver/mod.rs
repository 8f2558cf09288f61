//! # Solver interface
//!
//! The RTI driver only ever talks to the optimiser through the `QpSolver`
//! trait: one call to load the cycle's data, then alternating `prepare`
//! (linearise and condense around the current trajectory) and `feedback`
//! (solve the condensed QP, apply the step, report the KKT residual and
//! whether the obstacle rows had to be relaxed).
//!
//! Every solver owns a `Workspace` holding the problem, the references and
//! the warm-started trajectory, so that all implementations share the same
//! loading and reset behaviour.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod condensing;
mod model;
mod workspace;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use condensing::CondensingSolver;
pub use model::VelocityModel;
pub use workspace::Workspace;

use crate::cycle_input::CycleInput;
use crate::online_data::OnlineData;
use crate::params::PlannerParams;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A real-time iteration capable optimiser.
pub trait QpSolver {
    /// Build the solver around a freshly initialised workspace.
    fn from_workspace(params: &PlannerParams, workspace: Workspace) -> Result<Self, SolverError>
    where
        Self: Sized;

    fn workspace(&self) -> &Workspace;

    fn workspace_mut(&mut self) -> &mut Workspace;

    /// Linearise around the current trajectory and condense the QP.
    fn prepare(&mut self) -> Result<(), SolverError>;

    /// Solve the condensed QP and apply the correction to the trajectory.
    fn feedback(&mut self) -> Result<FeedbackStep, SolverError>;

    /// Copy this cycle's initial state, references and online data into the
    /// workspace. The trajectory is left as it is to warm start the solve.
    fn load_cycle(
        &mut self,
        input: &CycleInput,
        online_data: &OnlineData
    ) -> Result<(), SolverError> {
        self.workspace_mut().load_cycle(input, online_data)
    }

    /// Zero the trajectory, references and initial state.
    fn reset_warm_start(&mut self) {
        self.workspace_mut().reset()
    }
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Result of one feedback step.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FeedbackStep {
    /// KKT residual of the trajectory the step was computed from
    pub residual: f64,

    /// True if the obstacle rows could not all be met and were softened
    pub relaxed: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors raised by a solver.
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("Expected {expected} {what}, found {found}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize
    },

    #[error("The condensed QP contains non-finite values")]
    NonFiniteQp,

    #[error("Feedback requested without a preceding preparation step")]
    NotPrepared,

    #[error("Could not set up the QP solver: {0}")]
    QpSetup(String),

    #[error("The QP solver failed: {0}")]
    QpFailed(&'static str),
}
