//! # RTI Cycle Benchmark

use criterion::{criterion_group, criterion_main, Criterion};

use local_planner::{
    EstimatedState, GoalPose, InputData, LocalPlanner, Obstacle, PlannerParams,
};

fn rti_cycle_benchmark(c: &mut Criterion) {
    // ---- Build the planner ----

    let params = PlannerParams::default();
    let goal = GoalPose::from_position(5.0, 0.5);

    let free_input = InputData {
        state: EstimatedState::default(),
        obstacles: vec![],
    };
    let blocked_input = InputData {
        state: EstimatedState::default(),
        obstacles: vec![
            Obstacle::new(0.6, 0.05),
            Obstacle::new(1.0, -0.4),
            Obstacle::new(0.8, 0.6),
        ],
    };

    // Cold start, the warm start is discarded before every cycle
    let mut planner: LocalPlanner = LocalPlanner::new(params.clone()).unwrap();
    planner.set_command_pose(goal);

    c.bench_function("LocalPlanner::proc::cold", |b| {
        b.iter(|| {
            planner.reset_warm_start();
            planner.proc(&free_input).unwrap()
        })
    });

    // Warm start from the previous identical cycle
    let mut planner: LocalPlanner = LocalPlanner::new(params.clone()).unwrap();
    planner.set_command_pose(goal);
    planner.proc(&free_input).unwrap();

    c.bench_function("LocalPlanner::proc::warm", |b| {
        b.iter(|| planner.proc(&free_input).unwrap())
    });

    // Cold start with active obstacle rows
    let mut planner: LocalPlanner = LocalPlanner::new(params).unwrap();
    planner.set_command_pose(goal);

    c.bench_function("LocalPlanner::proc::obstacles", |b| {
        b.iter(|| {
            planner.reset_warm_start();
            planner.proc(&blocked_input).unwrap()
        })
    });
}

criterion_group!(benches, rti_cycle_benchmark);
criterion_main!(benches);
