//! # RTI iteration driver
//!
//! Runs one real-time iteration solve: load the cycle into the solver, do a
//! preparation step, then alternate feedback and preparation until the KKT
//! residual drops below the threshold or the iteration cap is reached.
//!
//! The predicted trajectory is left in the solver's workspace at the end of
//! the solve, so the next call starts from it.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;
use std::time::Instant;

// Internal
use crate::cycle_input::CycleInput;
use crate::online_data::OnlineData;
use crate::params::PlannerParams;
use crate::solver::{QpSolver, SolverError};
use crate::types::{ControlVector, StateVector};
use util::time::std_duration_to_micros;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RtiDriver {
    kkt_threshold: f64,
    max_iterations: usize,
}

/// Monitoring quantities of a single solve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolveReport {
    pub status: SolveStatus,

    /// Number of feedback steps performed
    pub iterations: usize,

    /// Time from the first preparation to the end of the loop
    ///
    /// Units: microseconds
    pub solve_time_us: u64,

    /// Residual returned by the last feedback step
    pub final_residual: f64,

    /// Residual after every feedback step, in order
    pub residuals: Vec<f64>,

    /// Number of feedback steps whose obstacle rows had to be relaxed
    pub relaxed_iterations: usize,
}

/// Result of a solve.
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    /// Predicted states, `N + 1` stages
    pub states: Vec<StateVector>,

    /// Predicted controls, `N` stages
    pub controls: Vec<ControlVector>,

    pub report: SolveReport,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum SolveStatus {
    /// The residual dropped below the KKT threshold
    Converged,

    /// The iteration cap was reached first. The trajectory is still usable.
    IterationCapReached,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RtiDriver {
    pub fn new(params: &PlannerParams) -> Self {
        Self {
            kkt_threshold: params.kkt_threshold,
            max_iterations: params.max_iterations,
        }
    }

    /// Solve the cycle described by `input` and `online_data`.
    ///
    /// The solver's trajectory from the previous call is used as the initial
    /// guess. Fails only if the solver itself fails.
    pub fn solve<S: QpSolver>(
        &self,
        solver: &mut S,
        input: &CycleInput,
        online_data: &OnlineData
    ) -> Result<SolveOutcome, SolverError> {
        solver.load_cycle(input, online_data)?;

        let start = Instant::now();
        let mut residuals = Vec::with_capacity(self.max_iterations);
        let mut status = SolveStatus::IterationCapReached;
        let mut relaxed_iterations = 0;

        solver.prepare()?;

        for iter in 0..self.max_iterations {
            let step = solver.feedback()?;
            residuals.push(step.residual);
            if step.relaxed {
                relaxed_iterations += 1;
            }

            trace!(
                "RTI iteration {}: KKT residual {:.3e}{}",
                iter + 1,
                step.residual,
                if step.relaxed { " (relaxed)" } else { "" }
            );

            if step.residual < self.kkt_threshold {
                status = SolveStatus::Converged;
                break;
            }

            solver.prepare()?;
        }

        let solve_time_us = std_duration_to_micros(start.elapsed());

        let ws = solver.workspace();
        Ok(SolveOutcome {
            states: ws.states.clone(),
            controls: ws.controls.clone(),
            report: SolveReport {
                status,
                iterations: residuals.len(),
                solve_time_us,
                final_residual: residuals.last().copied().unwrap_or(std::f64::NAN),
                residuals,
                relaxed_iterations,
            },
        })
    }
}
