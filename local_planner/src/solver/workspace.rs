//! Solver owned working memory

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::info;
use nalgebra::DVector;
use serde::Serialize;

// Internal
use super::SolverError;
use crate::cycle_input::CycleInput;
use crate::online_data::OnlineData;
use crate::params::Dims;
use crate::problem::ProblemConfig;
use crate::types::{ControlVector, StateVector};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Everything a solver reads and writes during one cycle.
///
/// The references are copies, so nothing the caller holds aliases the
/// trajectory buffers.
#[derive(Debug, Clone, Serialize)]
pub struct Workspace {
    /// Weights and bounds, fixed at initialisation
    pub problem: ProblemConfig,

    /// Number of cycles loaded since the workspace was created
    pub cycle: u64,

    /// Initial state of the current cycle
    pub x0: StateVector,

    /// Predicted states, `N + 1` stages. Persists between cycles.
    pub states: Vec<StateVector>,

    /// Predicted controls, `N` stages. Persists between cycles.
    pub controls: Vec<ControlVector>,

    /// Stage references, `N` vectors of `NY`
    pub references: Vec<DVector<f64>>,

    /// Terminal reference, `NYN`
    pub terminal_reference: DVector<f64>,

    /// Obstacle slots, `N + 1` stages
    pub online_data: OnlineData,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Workspace {
    /// Create a workspace with a zeroed trajectory and references.
    pub fn new(problem: ProblemConfig, online_data: OnlineData) -> Self {
        let dims = problem.dims;

        let mut ws = Self {
            problem,
            cycle: 0,
            x0: StateVector::zeros(),
            states: vec![StateVector::zeros(); dims.n + 1],
            controls: vec![ControlVector::zeros(); dims.n],
            references: vec![DVector::zeros(dims.ny); dims.n],
            terminal_reference: DVector::zeros(dims.nyn),
            online_data,
        };
        ws.reset();

        ws
    }

    pub fn dims(&self) -> Dims {
        self.problem.dims
    }

    /// Zero the trajectory, references and initial state.
    pub fn reset(&mut self) {
        let dims = self.dims();

        self.x0.fill(0.0);
        self.states.iter_mut().for_each(|x| x.fill(0.0));
        self.controls.iter_mut().for_each(|u| u.fill(0.0));
        self.references.iter_mut().for_each(|y| y.fill(0.0));
        self.terminal_reference.fill(0.0);

        info!(
            "Solver workspace reset - NY: {} NYN: {} NX: {} NU: {} N: {} NOD: {}",
            dims.ny, dims.nyn, dims.nx, dims.nu, dims.n, dims.nod
        );
    }

    /// Copy the cycle's data in, checking it matches the problem dimensions.
    pub fn load_cycle(
        &mut self,
        input: &CycleInput,
        online_data: &OnlineData
    ) -> Result<(), SolverError> {
        let dims = self.dims();

        check_dim("stage references", dims.n, input.references.len())?;
        for r in input.references.iter() {
            check_dim("stage reference values", dims.ny, r.len())?;
        }
        check_dim("terminal reference values", dims.nyn, input.terminal_reference.len())?;
        check_dim("online data stages", dims.n + 1, online_data.num_stages())?;
        for stage in online_data.iter() {
            check_dim("obstacle slots", dims.num_slots, stage.len())?;
        }

        self.x0 = input.x0;
        for (dst, src) in self.references.iter_mut().zip(input.references.iter()) {
            dst.copy_from(src);
        }
        self.terminal_reference.copy_from(&input.terminal_reference);
        self.online_data = online_data.clone();
        self.cycle += 1;

        Ok(())
    }
}

fn check_dim(what: &'static str, expected: usize, found: usize) -> Result<(), SolverError> {
    if expected == found {
        Ok(())
    }
    else {
        Err(SolverError::DimensionMismatch { what, expected, found })
    }
}
