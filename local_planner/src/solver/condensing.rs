//! # Condensing solver
//!
//! Single shooting Gauss-Newton solver for the velocity tracking model.
//!
//! The decision variables are the stacked controls `U = [u_0, ..., u_{N-1}]`.
//! Preparation simulates the current controls forward, builds the state
//! sensitivities `S_k = dx_k/dU` and from them the Gauss-Newton Hessian and
//! gradient of the least squares cost, together with the linearised obstacle
//! distance rows of every stage.
//!
//! Feedback solves the condensed QP with OSQP, the control bounds and the
//! obstacle rows both entering as hard constraints. The OSQP problem is kept
//! between iterations and cycles so that every solve is warm started from the
//! last one. If the obstacle rows cannot all be met the QP is solved again
//! with one slack per row, penalised by `obstacle_penalty`, and the step is
//! reported as relaxed.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{log_enabled, trace, warn, Level::Trace};
use nalgebra::{DMatrix, DVector, Vector2};
use osqp::{CscMatrix, Problem, Settings, Status};
use std::borrow::Cow;

// Internal
use super::{FeedbackStep, QpSolver, SolverError, VelocityModel, Workspace};
use crate::params::{PlannerParams, NUM_TRACKED_OUTPUTS};
use crate::types::{ControlVector, StateVector};
use util::maths::clamp;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Distances below this are treated as coincident and given no gradient.
const MIN_DISTANCE_FOR_GRADIENT_M: f64 = 1e-9;

/// Obstacle rows whose Jacobian norm is below this do not depend on the
/// controls and are left unbounded.
const MIN_ROW_JACOBIAN_NORM: f64 = 1e-12;

/// A constraint row within this of one of its bounds counts as active.
const ACTIVE_ROW_TOLERANCE: f64 = 1e-6;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The in-tree RTI solver.
pub struct CondensingSolver {
    workspace: Workspace,
    model: VelocityModel,

    /// Weight of the obstacle row slacks when the QP has to be relaxed
    obstacle_penalty: f64,

    settings: Settings,

    /// OSQP problem of the hard constrained QP, kept for warm starting
    problem: Option<Problem>,

    /// QP built by the last preparation, consumed by the next feedback
    qp: Option<CondensedQp>,
}

/// The condensed QP in the control step `d`:
///
/// ```text
/// min 0.5 d'Hd + g'd
/// s.t. lower <= [I; J] d <= upper
/// ```
///
/// The first `nv` constraint rows bound the step so the controls stay within
/// their limits, the remaining ones are the linearised obstacle distances of
/// every stage and slot.
struct CondensedQp {
    hessian: DMatrix<f64>,
    gradient: DVector<f64>,
    obstacle_jacobian: DMatrix<f64>,
    lower: DVector<f64>,
    upper: DVector<f64>,
}

/// Primal and dual solution of a condensed QP.
struct QpSolution {
    step: DVector<f64>,
    duals: DVector<f64>,
}

/// Value and Jacobians of the stage output vector.
struct StageOutput {
    y: DVector<f64>,
    dy_dx: DMatrix<f64>,
    dy_du: DMatrix<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl QpSolver for CondensingSolver {
    fn from_workspace(params: &PlannerParams, workspace: Workspace) -> Result<Self, SolverError> {
        let settings = Settings::default()
            .verbose(log_enabled!(Trace))
            .polish(true)
            .eps_abs(params.qp_eps_abs)
            .eps_rel(params.qp_eps_rel)
            .max_iter(params.qp_max_iter);

        Ok(Self {
            workspace,
            model: VelocityModel::new(params.stage_period_s, params.vel_time_const_s),
            obstacle_penalty: params.obstacle_penalty,
            settings,
            problem: None,
            qp: None,
        })
    }

    fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    fn workspace_mut(&mut self) -> &mut Workspace {
        &mut self.workspace
    }

    fn prepare(&mut self) -> Result<(), SolverError> {
        let ws = &mut self.workspace;
        let dims = ws.dims();
        let (n, nx, nu) = (dims.n, dims.nx, dims.nu);
        let nv = n * nu;
        let slots = dims.num_slots;

        self.model.simulate(&ws.x0, &ws.controls, &mut ws.states);

        // ---- SENSITIVITIES ----

        let a = DMatrix::from_column_slice(nx, nx, self.model.state_jacobian().as_slice());
        let b = self.model.control_jacobian();

        let mut sens: Vec<DMatrix<f64>> = Vec::with_capacity(n + 1);
        sens.push(DMatrix::zeros(nx, nv));
        for k in 0..n {
            let mut next = &a * &sens[k];
            for r in 0..nx {
                for m in 0..nu {
                    next[(r, k * nu + m)] += b[(r, m)];
                }
            }
            sens.push(next);
        }

        // ---- STAGE COST AND OBSTACLE ROWS ----

        let mut hessian = DMatrix::zeros(nv, nv);
        let mut gradient = DVector::zeros(nv);
        let mut obstacle_jacobian = DMatrix::zeros(n * slots, nv);
        let mut lower = DVector::zeros(nv + n * slots);
        let mut upper = DVector::zeros(nv + n * slots);
        let stage_diag = ws.problem.stage_weight.diagonal();

        for k in 0..n {
            let obstacles = ws.online_data.stage(k).unwrap_or(&[]);
            let out = stage_output(&ws.states[k], &ws.controls[k], obstacles);

            for i in 0..dims.ny {
                if stage_diag[i] == 0.0 {
                    continue;
                }
                let row = row_jacobian(&out.dy_dx, Some(&out.dy_du), i, &sens[k], k, nu);
                let residual = out.y[i] - ws.references[k][i];
                accumulate(&mut hessian, &mut gradient, &row, stage_diag[i], residual);
            }

            let bounds = &ws.problem.stage_bounds[k];

            for m in 0..nu {
                lower[k * nu + m] = bounds.control_min[m] - ws.controls[k][m];
                upper[k * nu + m] = bounds.control_max[m] - ws.controls[k][m];
            }

            for j in 0..obstacles.len().min(slots) {
                let i = NUM_TRACKED_OUTPUTS + j;
                let r = k * slots + j;
                let row = row_jacobian(&out.dy_dx, Some(&out.dy_du), i, &sens[k], k, nu);

                if row.norm() < MIN_ROW_JACOBIAN_NORM {
                    lower[nv + r] = std::f64::NEG_INFINITY;
                    upper[nv + r] = std::f64::INFINITY;
                }
                else {
                    lower[nv + r] = bounds.obstacle_min[j] - out.y[i];
                    upper[nv + r] = bounds.obstacle_max[j] - out.y[i];
                }
                obstacle_jacobian.set_row(r, &row.transpose());
            }

            for j in obstacles.len()..slots {
                lower[nv + k * slots + j] = std::f64::NEG_INFINITY;
                upper[nv + k * slots + j] = std::f64::INFINITY;
            }
        }

        // ---- TERMINAL COST ----

        // The terminal outputs are the first four states, [x, vx, y, vy]
        let terminal_diag = ws.problem.terminal_weight.diagonal();
        let terminal_dy_dx = DMatrix::from_fn(dims.nyn, nx, |r, c| if r == c { 1.0 } else { 0.0 });
        for i in 0..dims.nyn {
            if terminal_diag[i] == 0.0 {
                continue;
            }
            let row = row_jacobian(&terminal_dy_dx, None, i, &sens[n], n, nu);
            let residual = ws.states[n][i] - ws.terminal_reference[i];
            accumulate(&mut hessian, &mut gradient, &row, terminal_diag[i], residual);
        }

        if !hessian.iter().all(|v| v.is_finite())
            || !gradient.iter().all(|v| v.is_finite())
            || !obstacle_jacobian.iter().all(|v| v.is_finite())
            || lower.iter().chain(upper.iter()).any(|v| v.is_nan())
        {
            self.qp = None;
            return Err(SolverError::NonFiniteQp);
        }

        trace!(
            "Prepared QP: {} variables, {} constraint rows",
            nv,
            lower.len()
        );

        self.qp = Some(CondensedQp {
            hessian,
            gradient,
            obstacle_jacobian,
            lower,
            upper,
        });

        Ok(())
    }

    fn feedback(&mut self) -> Result<FeedbackStep, SolverError> {
        let qp = self.qp.take().ok_or(SolverError::NotPrepared)?;

        let (solution, relaxed) = match self.solve_hard(&qp)? {
            Some(s) => (s, false),
            None => {
                warn!("Obstacle constraints infeasible, solving with relaxed rows");
                (self.solve_relaxed(&qp)?, true)
            }
        };

        let residual = kkt_residual(&qp, &solution);

        // Apply the full step, clamping away any round-off outside the bounds
        let step = &solution.step;
        let ws = &mut self.workspace;
        let nu = ws.dims().nu;
        for (k, u) in ws.controls.iter_mut().enumerate() {
            let bounds = &ws.problem.stage_bounds[k];
            for m in 0..nu {
                u[m] = clamp(u[m] + step[k * nu + m], bounds.control_min[m], bounds.control_max[m]);
            }
        }
        self.model.simulate(&ws.x0, &ws.controls, &mut ws.states);

        Ok(FeedbackStep { residual, relaxed })
    }

    /// Zero the trajectory and drop the OSQP warm start with it.
    fn reset_warm_start(&mut self) {
        self.workspace.reset();
        self.problem = None;
        self.qp = None;
    }
}

impl CondensingSolver {
    /// Solve the hard constrained QP, returning `None` if it is infeasible.
    ///
    /// The first call sets the OSQP problem up, later ones update its cost,
    /// constraint matrix and bounds in place.
    fn solve_hard(&mut self, qp: &CondensedQp) -> Result<Option<QpSolution>, SolverError> {
        let a = constraint_matrix(qp);

        // The Hessian only depends on the model and weights, so P is set once
        let mut problem = match self.problem.take() {
            Some(mut p) => {
                p.update_lin_cost(qp.gradient.as_slice());
                p.update_A(to_csc(&a, false));
                p.update_bounds(qp.lower.as_slice(), qp.upper.as_slice());
                p
            }
            None => Problem::new(
                to_csc(&qp.hessian, true),
                qp.gradient.as_slice(),
                to_csc(&a, false),
                qp.lower.as_slice(),
                qp.upper.as_slice(),
                &self.settings
            )
            .map_err(|e| SolverError::QpSetup(format!("{:?}", e)))?,
        };

        let nv = qp.gradient.len();
        let solution = match problem.solve() {
            Status::Solved(s) | Status::SolvedInaccurate(s) | Status::MaxIterationsReached(s) => {
                Ok(Some(QpSolution {
                    step: DVector::from_column_slice(&s.x()[..nv]),
                    duals: DVector::from_column_slice(s.y()),
                }))
            }
            Status::PrimalInfeasible(_) | Status::PrimalInfeasibleInaccurate(_) => Ok(None),
            _ => Err(SolverError::QpFailed("the hard constrained QP could not be solved")),
        };

        self.problem = Some(problem);

        solution
    }

    /// Solve the QP with every obstacle row softened by a nonnegative slack
    /// `s`, penalised by `0.5 rho s's`:
    ///
    /// ```text
    /// min 0.5 d'Hd + g'd + 0.5 rho s's
    /// s.t. box_lo <= d <= box_hi
    ///      obs_lo <= J d + s <= obs_hi
    ///      0 <= s
    /// ```
    fn solve_relaxed(&self, qp: &CondensedQp) -> Result<QpSolution, SolverError> {
        let nv = qp.gradient.len();
        let m = qp.obstacle_jacobian.nrows();

        let mut p = DMatrix::zeros(nv + m, nv + m);
        p.slice_mut((0, 0), (nv, nv)).copy_from(&qp.hessian);
        p.slice_mut((nv, nv), (m, m)).fill_diagonal(self.obstacle_penalty);

        let mut q = DVector::zeros(nv + m);
        q.rows_mut(0, nv).copy_from(&qp.gradient);

        let mut a = DMatrix::zeros(nv + 2 * m, nv + m);
        a.slice_mut((0, 0), (nv, nv)).fill_with_identity();
        a.slice_mut((nv, 0), (m, nv)).copy_from(&qp.obstacle_jacobian);
        a.slice_mut((nv, nv), (m, m)).fill_with_identity();
        a.slice_mut((nv + m, nv), (m, m)).fill_with_identity();

        let mut l = DVector::zeros(nv + 2 * m);
        let mut u = DVector::from_element(nv + 2 * m, std::f64::INFINITY);
        l.rows_mut(0, nv + m).copy_from(&qp.lower);
        u.rows_mut(0, nv + m).copy_from(&qp.upper);

        let mut problem = Problem::new(
            to_csc(&p, true),
            q.as_slice(),
            to_csc(&a, false),
            l.as_slice(),
            u.as_slice(),
            &self.settings
        )
        .map_err(|e| SolverError::QpSetup(format!("{:?}", e)))?;

        let solution = match problem.solve() {
            Status::Solved(s) | Status::SolvedInaccurate(s) | Status::MaxIterationsReached(s) => {
                Ok(QpSolution {
                    step: DVector::from_column_slice(&s.x()[..nv]),
                    duals: DVector::from_column_slice(&s.y()[..nv + m]),
                })
            }
            _ => Err(SolverError::QpFailed("the relaxed QP could not be solved")),
        };

        solution
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------
/// Stage outputs `[x, y, vx, vy, ux, uy, d_1, ..., d_m]` and their Jacobians,
/// `d_j` being the distance to obstacle slot `j`.
fn stage_output(x: &StateVector, u: &ControlVector, obstacles: &[Vector2<f64>]) -> StageOutput {
    let ny = NUM_TRACKED_OUTPUTS + obstacles.len();
    let mut y = DVector::zeros(ny);
    let mut dy_dx = DMatrix::zeros(ny, x.len());
    let mut dy_du = DMatrix::zeros(ny, u.len());

    // Rows 0-3 pick [x, y, vx, vy] out of [x, vx, y, vy, aux]
    for (row, col) in [(0, 0), (1, 2), (2, 1), (3, 3)].iter() {
        y[*row] = x[*col];
        dy_dx[(*row, *col)] = 1.0;
    }
    for m in 0..2 {
        y[4 + m] = u[m];
        dy_du[(4 + m, m)] = 1.0;
    }

    let position = Vector2::new(x[0], x[2]);
    for (j, obs) in obstacles.iter().enumerate() {
        let i = NUM_TRACKED_OUTPUTS + j;
        let delta = position - obs;
        let dist = delta.norm();

        y[i] = dist;
        if dist > MIN_DISTANCE_FOR_GRADIENT_M {
            dy_dx[(i, 0)] = delta[0] / dist;
            dy_dx[(i, 2)] = delta[1] / dist;
        }
    }

    StageOutput { y, dy_dx, dy_du }
}

/// Jacobian of output row `i` of stage `k` with respect to the stacked
/// controls.
fn row_jacobian(
    dy_dx: &DMatrix<f64>,
    dy_du: Option<&DMatrix<f64>>,
    i: usize,
    sens: &DMatrix<f64>,
    k: usize,
    nu: usize
) -> DVector<f64> {
    let nv = sens.ncols();
    let mut row = DVector::zeros(nv);

    for j in 0..dy_dx.ncols() {
        let c = dy_dx[(i, j)];
        if c != 0.0 {
            for col in 0..nv {
                row[col] += c * sens[(j, col)];
            }
        }
    }

    if let Some(dy_du) = dy_du {
        for m in 0..nu {
            row[k * nu + m] += dy_du[(i, m)];
        }
    }

    row
}

/// Add one weighted least squares row to the Gauss-Newton Hessian and
/// gradient.
fn accumulate(
    hessian: &mut DMatrix<f64>,
    gradient: &mut DVector<f64>,
    row: &DVector<f64>,
    weight: f64,
    residual: f64
) {
    let nv = row.len();

    for r in 0..nv {
        if row[r] == 0.0 {
            continue;
        }
        gradient[r] += weight * residual * row[r];
        for c in 0..nv {
            hessian[(r, c)] += weight * row[r] * row[c];
        }
    }
}


/// Constraint matrix `[I; J]` of the hard constrained QP.
fn constraint_matrix(qp: &CondensedQp) -> DMatrix<f64> {
    let nv = qp.gradient.len();
    let m = qp.obstacle_jacobian.nrows();

    let mut a = DMatrix::zeros(nv + m, nv);
    a.slice_mut((0, 0), (nv, nv)).fill_with_identity();
    a.slice_mut((nv, 0), (m, nv)).copy_from(&qp.obstacle_jacobian);

    a
}

/// Compressed column copy of `m`, zeros included so that the sparsity
/// pattern only depends on the shape. With `upper_only` set only the upper
/// triangle is stored.
fn to_csc(m: &DMatrix<f64>, upper_only: bool) -> CscMatrix<'static> {
    let mut indptr = Vec::with_capacity(m.ncols() + 1);
    let mut indices = Vec::new();
    let mut data = Vec::new();

    indptr.push(0);
    for c in 0..m.ncols() {
        let rows = if upper_only { (c + 1).min(m.nrows()) } else { m.nrows() };
        for r in 0..rows {
            indices.push(r);
            data.push(m[(r, c)]);
        }
        indptr.push(indices.len());
    }

    CscMatrix {
        nrows: m.nrows(),
        ncols: m.ncols(),
        indptr: Cow::Owned(indptr),
        indices: Cow::Owned(indices),
        data: Cow::Owned(data),
    }
}

/// KKT residual of the linearisation point: `|g'd|` plus the complementarity
/// of every constraint row active at the step.
fn kkt_residual(qp: &CondensedQp, solution: &QpSolution) -> f64 {
    let rows = constraint_matrix(qp) * &solution.step;
    let mut residual = qp.gradient.dot(&solution.step).abs();

    for (i, y) in solution.duals.iter().enumerate() {
        let bound = if *y > 0.0 { qp.upper[i] } else { qp.lower[i] };
        if bound.is_finite() && (rows[i] - bound).abs() <= ACTIVE_ROW_TOLERANCE {
            residual += (y * bound).abs();
        }
    }

    residual
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cycle_input::CycleInputBuilder;
    use crate::online_data::OnlineDataRefresher;
    use crate::problem::ProblemConfig;
    use crate::types::{EstimatedState, GoalPose, Obstacle};

    fn solver(params: &PlannerParams) -> CondensingSolver {
        let ws = Workspace::new(
            ProblemConfig::initialize(params),
            OnlineDataRefresher::new(params).sentinel()
        );
        CondensingSolver::from_workspace(params, ws).unwrap()
    }

    fn load_from(
        solver: &mut CondensingSolver,
        params: &PlannerParams,
        state: EstimatedState,
        goal: (f64, f64),
        obstacles: &[Obstacle]
    ) {
        let input = CycleInputBuilder::new(params.dims())
            .build(&state, &GoalPose::from_position(goal.0, goal.1));
        let od = OnlineDataRefresher::new(params).refresh(obstacles, &state.position_m);
        solver.load_cycle(&input, &od).unwrap();
    }

    fn load(solver: &mut CondensingSolver, params: &PlannerParams, goal: (f64, f64), obstacles: &[Obstacle]) {
        load_from(solver, params, EstimatedState::default(), goal, obstacles);
    }

    /// Smallest distance to any obstacle over the stages the controls can
    /// move, `2..N`.
    fn min_controlled_dist(s: &CondensingSolver, obstacles: &[Obstacle]) -> f64 {
        let states = &s.workspace().states;
        states[2..states.len() - 1]
            .iter()
            .flat_map(|x| {
                obstacles
                    .iter()
                    .map(move |o| (Vector2::new(x[0], x[2]) - o.position_m).norm())
            })
            .fold(std::f64::INFINITY, f64::min)
    }

    #[test]
    fn test_feedback_requires_prepare() {
        let params = PlannerParams::default();
        let mut s = solver(&params);

        assert!(matches!(s.feedback(), Err(SolverError::NotPrepared)));

        s.prepare().unwrap();
        s.feedback().unwrap();
        assert!(matches!(s.feedback(), Err(SolverError::NotPrepared)));
    }

    #[test]
    fn test_uncontrolled_rows_are_unbounded() {
        let params = PlannerParams::default();
        let mut s = solver(&params);
        load(&mut s, &params, (5.0, 0.0), &[Obstacle::new(0.1, 0.0)]);

        s.prepare().unwrap();

        // Stages 0 and 1 do not depend on the controls
        let qp = s.qp.as_ref().unwrap();
        let nv = qp.gradient.len();
        let slots = params.num_obstacle_slots;
        for r in 0..2 * slots {
            assert!(qp.lower[nv + r].is_infinite() && qp.upper[nv + r].is_infinite());
        }
        assert!(qp.lower[nv + 2 * slots].is_finite());
    }

    #[test]
    fn test_second_iteration_converges() {
        let params = PlannerParams::default();
        let mut s = solver(&params);
        load(&mut s, &params, (5.0, 0.0), &[]);

        s.prepare().unwrap();
        let first = s.feedback().unwrap();
        s.prepare().unwrap();
        let second = s.feedback().unwrap();

        assert!(first.residual > 1.0);
        assert!(second.residual < params.kkt_threshold);
        assert!(!first.relaxed && !second.relaxed);

        // Far from the goal the first command saturates
        assert!((s.workspace().controls[0][0] - 0.5).abs() < 1e-6);
        assert!(s.workspace().controls.iter().all(|u| u[1].abs() < 1e-9));
    }

    #[test]
    fn test_obstacle_rows_are_hard() {
        let params = PlannerParams::default();
        let scenarios = vec![
            vec![Obstacle::new(0.6, 0.0)],
            vec![Obstacle::new(0.6, 0.05)],
            vec![
                Obstacle::new(0.6, 0.0),
                Obstacle::new(0.6, 0.05),
                Obstacle::new(0.4, 0.1),
                Obstacle::new(0.8, -0.1),
            ],
        ];

        for obstacles in scenarios.iter() {
            let mut s = solver(&params);
            load(&mut s, &params, (5.0, 0.0), obstacles);

            for _ in 0..params.max_iterations {
                s.prepare().unwrap();
                let step = s.feedback().unwrap();
                assert!(!step.relaxed);
                assert!(
                    min_controlled_dist(&s, obstacles)
                        >= params.min_obstacle_dist_m - 1e-6
                );
            }
        }
    }

    #[test]
    fn test_infeasible_rows_are_relaxed() {
        let params = PlannerParams::default();
        let mut s = solver(&params);

        // Moving too fast to stop short of the obstacle by stage 2
        let state = EstimatedState::new(Vector2::zeros(), Vector2::new(2.0, 0.0));
        load_from(&mut s, &params, state, (5.0, 0.0), &[Obstacle::new(0.5, 0.0)]);

        s.prepare().unwrap();
        let step = s.feedback().unwrap();

        assert!(step.relaxed);
        assert!(step.residual.is_finite());
        assert!(s
            .workspace()
            .controls
            .iter()
            .all(|u| u[0].abs() <= 0.5 && u[1].abs() <= 0.5));
    }

    #[test]
    fn test_reset_drops_warm_start() {
        let params = PlannerParams::default();
        let obstacles = [Obstacle::new(0.6, 0.05)];

        let mut cold = solver(&params);
        load(&mut cold, &params, (5.0, 0.0), &obstacles);
        cold.prepare().unwrap();
        let first = cold.feedback().unwrap();

        let mut s = solver(&params);
        load(&mut s, &params, (5.0, 0.0), &obstacles);
        s.prepare().unwrap();
        s.feedback().unwrap();
        s.prepare().unwrap();
        s.feedback().unwrap();

        s.reset_warm_start();
        assert!(s.problem.is_none());

        load(&mut s, &params, (5.0, 0.0), &obstacles);
        s.prepare().unwrap();
        let again = s.feedback().unwrap();

        assert_eq!(again, first);
    }

    #[test]
    fn test_csc_keeps_zero_entries() {
        let m = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 2.0]);

        let full = to_csc(&m, false);
        assert_eq!(full.indptr.as_ref(), &[0, 2, 4]);
        assert_eq!(full.data.as_ref(), &[1.0, 0.0, 0.0, 2.0]);

        let upper = to_csc(&m, true);
        assert_eq!(upper.indptr.as_ref(), &[0, 1, 3]);
        assert_eq!(upper.indices.as_ref(), &[0, 0, 1]);
    }

    #[test]
    fn test_non_finite_state_is_rejected() {
        let params = PlannerParams::default();
        let mut s = solver(&params);
        load(&mut s, &params, (5.0, 0.0), &[]);
        s.workspace_mut().x0[0] = std::f64::NAN;

        assert!(matches!(s.prepare(), Err(SolverError::NonFiniteQp)));
    }
}
