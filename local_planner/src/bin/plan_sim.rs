//! # Planner Simulation
//!
//! Runs the local planner in closed loop without a robot. Each cycle the
//! simulated robot moves to the first predicted stage of the plan, until it
//! is within tolerance of the goal or the cycle limit is reached. Every
//! cycle is archived in the session.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use color_eyre::{eyre::WrapErr, Result};
use log::{info, warn};
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use local_planner::{
    EstimatedState, GoalPose, InputData, LocalPlanner, Obstacle, OutputTrajectory, SolveReport,
    SolveStatus,
};
use util::{
    logger::{logger_init, LevelFilter},
    maths::norm,
    session::{self, Session},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Scenario simulated by this binary.
#[derive(Debug, Clone, Deserialize)]
struct SimParams {
    start_position_m: [f64; 2],
    goal_position_m: [f64; 2],
    obstacles_m: Vec<[f64; 2]>,

    max_cycles: usize,

    /// Distance to the goal under which the simulation stops
    ///
    /// Units: meters
    goal_tolerance_m: f64,
}

/// Archived record of one cycle.
#[derive(Debug, Clone, Serialize)]
struct CycleRecord {
    cycle: usize,
    sim_time_s: f64,
    state: EstimatedState,
    trajectory: OutputTrajectory,
    report: SolveReport,
}

// ---------------------------------------------------------------------------
// MAIN
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("plan_sim", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    info!("Local Planner Simulation\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let sim_params: SimParams =
        util::params::load("plan_sim.toml").wrap_err("Could not load simulation params")?;

    let mut planner =
        LocalPlanner::init("local_planner.toml").wrap_err("Failed to initialise the planner")?;

    let stage_period_s = planner.params().stage_period_s;

    // ---- SCENARIO ----

    let goal = GoalPose::from_position(sim_params.goal_position_m[0], sim_params.goal_position_m[1]);
    planner.set_command_pose(goal);

    let mut input = InputData {
        state: EstimatedState::new(
            Vector2::new(sim_params.start_position_m[0], sim_params.start_position_m[1]),
            Vector2::zeros()
        ),
        obstacles: sim_params
            .obstacles_m
            .iter()
            .map(|o| Obstacle::new(o[0], o[1]))
            .collect(),
    };

    // ---- MAIN LOOP ----

    let mut num_capped = 0;
    let mut reached = false;

    for cycle in 0..sim_params.max_cycles {
        let (trajectory, report) = planner
            .proc(&input)
            .wrap_err_with(|| format!("Planning failed in cycle {}", cycle))?;

        if report.status == SolveStatus::IterationCapReached {
            num_capped += 1;
        }

        session.save(
            format!("cycles/cycle_{:04}.json", cycle),
            CycleRecord {
                cycle,
                sim_time_s: cycle as f64 * stage_period_s,
                state: input.state,
                trajectory: trajectory.clone(),
                report,
            },
        );

        // Move the robot to the first predicted stage
        match planner.solver().workspace().states.get(1) {
            Some(x) => input.state = EstimatedState::from_state_vector(x),
            None => {
                warn!("Planner returned an empty trajectory, stopping");
                break;
            }
        }

        let dist_m = norm(input.state.position_m.as_slice(), goal.position_m.as_slice())
            .unwrap_or(std::f64::INFINITY);

        if dist_m < sim_params.goal_tolerance_m {
            info!(
                "Goal reached after {} cycles ({:.2} s simulated, {:.2} s elapsed)",
                cycle + 1,
                (cycle + 1) as f64 * stage_period_s,
                session::get_elapsed_seconds()
            );
            reached = true;
            break;
        }
    }

    if !reached {
        warn!("Goal not reached within {} cycles", sim_params.max_cycles);
    }
    if num_capped > 0 {
        warn!("{} cycles hit the RTI iteration cap", num_capped);
    }

    info!("Final state: {:?}", input.state);

    // ---- SHUTDOWN ----

    session.exit();

    Ok(())
}
