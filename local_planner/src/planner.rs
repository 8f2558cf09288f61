//! # Local planner
//!
//! Ties the cycle input builder, online data refresher, RTI driver and
//! trajectory extractor together around an owned solver.
//!
//! Usage follows the other control modules:
//!  1. `init` (or `new`) once, which configures the problem and zeroes the
//!     warm start.
//!  2. `set_command_pose` whenever a new short term goal is issued.
//!  3. `proc` every control cycle with the latest state estimate and
//!     obstacles.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

// Internal
use crate::cycle_input::CycleInputBuilder;
use crate::online_data::OnlineDataRefresher;
use crate::params::{ParamsError, PlannerParams, Verbosity};
use crate::problem::ProblemConfig;
use crate::rti::{RtiDriver, SolveOutcome, SolveReport, SolveStatus};
use crate::solver::{CondensingSolver, QpSolver, SolverError, Workspace};
use crate::trajectory::{self, OutputTrajectory};
use crate::types::{EstimatedState, GoalPose, Obstacle};
use util::{maths::fmt_row, params};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

pub struct LocalPlanner<S: QpSolver = CondensingSolver> {
    params: PlannerParams,

    input_builder: CycleInputBuilder,
    refresher: OnlineDataRefresher,
    driver: RtiDriver,
    solver: S,

    /// Short term goal, set by `set_command_pose`
    goal: Option<GoalPose>,

    /// Report of the last completed cycle
    last_report: Option<SolveReport>,
}

/// Input data for one planning cycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputData {
    /// Current estimate of the robot's state
    pub state: EstimatedState,

    /// Obstacles known this cycle
    pub obstacles: Vec<Obstacle>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Potential errors that can occur during processing of the module.
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(params::LoadError),

    #[error("Invalid parameters: {0}")]
    InvalidParams(#[from] ParamsError),

    /// Attempted to plan before any goal was commanded.
    #[error("No command pose has been set")]
    NoGoal,

    #[error("Solver error: {0}")]
    SolverError(#[from] SolverError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LocalPlanner<CondensingSolver> {
    /// Initialise the planner with the in-tree solver.
    ///
    /// Expected init data is a path to the parameter file, relative to the
    /// params directory.
    pub fn init(params_path: &str) -> Result<Self, PlannerError> {
        let params: PlannerParams = match params::load(params_path) {
            Ok(p) => p,
            Err(e) => return Err(PlannerError::ParamLoadError(e))
        };

        Self::new(params)
    }
}

impl<S: QpSolver> LocalPlanner<S> {
    /// Build the planner from already loaded parameters.
    pub fn new(params: PlannerParams) -> Result<Self, PlannerError> {
        params.validate()?;

        let problem = ProblemConfig::initialize(&params);
        problem.log_summary();

        let refresher = OnlineDataRefresher::new(&params);
        let workspace = Workspace::new(problem, refresher.sentinel());
        let solver = S::from_workspace(&params, workspace)?;

        Ok(Self {
            input_builder: CycleInputBuilder::new(params.dims()),
            refresher,
            driver: RtiDriver::new(&params),
            solver,
            goal: None,
            last_report: None,
            params,
        })
    }

    /// Set the short term goal tracked by every following cycle.
    pub fn set_command_pose(&mut self, goal: GoalPose) {
        let q = goal.attitude_q.quaternion();

        info!(
            "Short term goal set: position ({:.3}, {:.3}), attitude [{:.3}, {:.3}, {:.3}, {:.3}]",
            goal.position_m[0], goal.position_m[1], q.w, q.i, q.j, q.k
        );

        self.goal = Some(goal);
    }

    /// Discard the warm start, zeroing the predicted trajectory.
    pub fn reset_warm_start(&mut self) {
        self.solver.reset_warm_start();
    }

    pub fn params(&self) -> &PlannerParams {
        &self.params
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    pub fn last_report(&self) -> Option<&SolveReport> {
        self.last_report.as_ref()
    }

    /// Process one planning cycle.
    ///
    /// Processing involves:
    ///  1. Building the initial state and references from the estimate and
    ///     the goal.
    ///  1. Filling the obstacle slots.
    ///  1. Running the RTI loop, warm started from the previous cycle.
    ///  1. Extracting the trajectory of stages `1..=N`.
    ///
    /// Hitting the iteration cap is not an error, the report's status says so.
    pub fn proc(
        &mut self,
        input: &InputData
    ) -> Result<(OutputTrajectory, SolveReport), PlannerError> {
        let goal = self.goal.ok_or(PlannerError::NoGoal)?;

        let cycle_input = self.input_builder.build(&input.state, &goal);
        let online_data = self.refresher.refresh(&input.obstacles, &input.state.position_m);

        let outcome = self.driver.solve(&mut self.solver, &cycle_input, &online_data)?;

        self.log_outcome(&outcome);

        let traj = trajectory::extract(&outcome.states);
        self.last_report = Some(outcome.report.clone());

        Ok((traj, outcome.report))
    }

    fn log_outcome(&self, outcome: &SolveOutcome) {
        let report = &outcome.report;

        if report.status == SolveStatus::IterationCapReached {
            warn!(
                "RTI did not converge in {} iterations, final KKT residual {:.3e}",
                report.iterations, report.final_residual
            );
        }

        if report.relaxed_iterations > 0 {
            warn!(
                "Obstacle constraints relaxed in {} of {} iterations, the plan may violate the minimum distance",
                report.relaxed_iterations, report.iterations
            );
        }

        if self.params.verbosity == Verbosity::Quiet {
            return;
        }

        info!(
            "Local planner solve: {} us, {} iterations, KKT residual {:.3e}",
            report.solve_time_us, report.iterations, report.final_residual
        );

        if self.params.verbosity == Verbosity::Dump {
            debug!("Differential variables:");
            for x in outcome.states.iter() {
                debug!("    {}", fmt_row(x.as_slice()));
            }
            debug!("Control variables:");
            for u in outcome.controls.iter() {
                debug!("    {}", fmt_row(u.as_slice()));
            }
            debug!("Terminal reference:");
            debug!(
                "    {}",
                fmt_row(self.solver.workspace().terminal_reference.as_slice())
            );
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::Vector2;

    fn planner() -> LocalPlanner {
        LocalPlanner::new(PlannerParams::default()).unwrap()
    }

    fn at_origin(obstacles: Vec<Obstacle>) -> InputData {
        InputData {
            state: EstimatedState::default(),
            obstacles,
        }
    }

    #[test]
    fn test_requires_goal() {
        let mut p = planner();

        assert!(matches!(p.proc(&at_origin(vec![])), Err(PlannerError::NoGoal)));
        assert!(p.last_report().is_none());
    }

    #[test]
    fn test_rejects_invalid_params() {
        let mut params = PlannerParams::default();
        params.horizon_len = 0;

        assert!(matches!(
            LocalPlanner::<CondensingSolver>::new(params),
            Err(PlannerError::InvalidParams(ParamsError::EmptyHorizon))
        ));
    }

    #[test]
    fn test_straight_line_to_goal() {
        let mut p = planner();
        p.set_command_pose(GoalPose::from_position(5.0, 0.0));

        let (traj, report) = p.proc(&at_origin(vec![])).unwrap();

        assert!(report.iterations <= p.params().max_iterations);
        assert_eq!(report.status, SolveStatus::Converged);
        assert_eq!(traj.num_stages(), 20);

        let mut last_x = 0.0;
        for i in 0..traj.num_stages() {
            let pos = traj.position(i).unwrap();
            assert!(pos[0] >= last_x);
            assert!(pos[0] <= 5.0);
            assert!(pos[1].abs() < 1e-6);
            last_x = pos[0];
        }
        assert!(last_x > 0.5);

        for u in p.solver().workspace().controls.iter() {
            assert!(u[0].abs() <= 0.5 && u[1].abs() <= 0.5);
        }
    }

    #[test]
    fn test_warm_start_residual() {
        let mut p = planner();
        p.set_command_pose(GoalPose::from_position(5.0, 0.0));

        let (_, cold) = p.proc(&at_origin(vec![])).unwrap();
        let (_, warm) = p.proc(&at_origin(vec![])).unwrap();

        assert!(warm.residuals[0] <= cold.residuals[0]);
        assert!(warm.iterations <= cold.iterations);

        // Resetting gives the cold start back
        p.reset_warm_start();
        let (_, reset) = p.proc(&at_origin(vec![])).unwrap();
        assert!((reset.residuals[0] - cold.residuals[0]).abs() <= 1e-9 * cold.residuals[0]);
    }

    /// Smallest distance to any obstacle over output stages `0..N-1`, which
    /// are predicted stages `1..N`.
    fn min_dist(traj: &OutputTrajectory, obstacles: &[Obstacle]) -> f64 {
        (0..traj.num_stages() - 1)
            .flat_map(|i| {
                let p = traj.position(i).unwrap();
                obstacles.iter().map(move |o| (p - o.position_m).norm())
            })
            .fold(std::f64::INFINITY, f64::min)
    }

    #[test]
    fn test_obstacle_avoidance() {
        let min_allowed = PlannerParams::default().min_obstacle_dist_m - 1e-6;

        // Head on, off axis, and a cluster around the straight line path
        let scenarios = vec![
            vec![Obstacle::new(0.6, 0.0)],
            vec![Obstacle::new(0.6, 0.05)],
            vec![Obstacle::new(0.7, -0.15)],
            vec![
                Obstacle::new(0.6, 0.0),
                Obstacle::new(0.6, 0.05),
                Obstacle::new(0.4, 0.1),
                Obstacle::new(0.8, -0.1),
            ],
        ];

        let mut free = planner();
        free.set_command_pose(GoalPose::from_position(5.0, 0.0));
        let (free_traj, _) = free.proc(&at_origin(vec![])).unwrap();

        for obstacles in scenarios {
            let mut p = planner();
            p.set_command_pose(GoalPose::from_position(5.0, 0.0));

            let (traj, report) = p.proc(&at_origin(obstacles.clone())).unwrap();

            assert_eq!(report.relaxed_iterations, 0);
            assert!(report.iterations <= p.params().max_iterations);
            assert!(min_dist(&traj, &obstacles) >= min_allowed);

            // The free path runs through the obstacles
            assert!(min_dist(&free_traj, &obstacles) < min_allowed);
        }
    }

    #[test]
    fn test_closed_loop_head_on() {
        let min_allowed = PlannerParams::default().min_obstacle_dist_m - 1e-6;
        let obstacles = vec![Obstacle::new(1.5, 0.0)];

        let mut p = planner();
        p.set_command_pose(GoalPose::from_position(3.0, 0.0));

        let mut input = at_origin(obstacles.clone());
        let mut last_x = 0.0;

        for _ in 0..60 {
            let (traj, report) = p.proc(&input).unwrap();

            assert_eq!(report.relaxed_iterations, 0);
            assert!(min_dist(&traj, &obstacles) >= min_allowed);

            input.state = EstimatedState::from_state_vector(&p.solver().workspace().states[1]);
            assert!((input.state.position_m - obstacles[0].position_m).norm() >= min_allowed);

            last_x = input.state.position_m[0];
        }

        // The robot closes in and stops short of the obstacle
        assert!(last_x > 1.0);
        assert!(last_x <= 1.25 + 1e-6);
    }

    #[test]
    fn test_non_finite_state() {
        let mut p = planner();
        p.set_command_pose(GoalPose::from_position(5.0, 0.0));

        let input = InputData {
            state: EstimatedState::new(Vector2::new(std::f64::NAN, 0.0), Vector2::zeros()),
            obstacles: vec![],
        };

        assert!(matches!(
            p.proc(&input),
            Err(PlannerError::SolverError(SolverError::NonFiniteQp))
        ));
    }

    #[test]
    fn test_report_serialises() {
        let mut p = planner();
        p.set_command_pose(GoalPose::from_position(1.0, 1.0));

        let (traj, report) = p.proc(&at_origin(vec![])).unwrap();

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["iterations"], serde_json::json!(report.iterations));
        assert_eq!(json["status"], serde_json::json!("Converged"));
        assert!(serde_json::to_string(&traj).is_ok());
        assert_eq!(p.last_report(), Some(&report));
    }
}
