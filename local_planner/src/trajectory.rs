//! # Trajectory extractor
//!
//! Maps the predicted states into the planner's output, positions and
//! velocities of stages `1..=N`. Stage 0 is the current state and is skipped.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector2;
use serde::Serialize;

// Internal
use crate::types::StateVector;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Planned trajectory laid out contiguously by stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutputTrajectory {
    /// `[x_1, y_1, x_2, y_2, ...]`
    ///
    /// Units: meters
    pub positions: Vec<f64>,

    /// `[vx_1, vy_1, vx_2, vy_2, ...]`
    ///
    /// Units: meters/second
    pub velocities: Vec<f64>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TrajectoryError {
    #[error("The {0} buffer holds {1} values but {2} are required")]
    BufferTooShort(&'static str, usize, usize),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl OutputTrajectory {
    pub fn num_stages(&self) -> usize {
        self.positions.len() / 2
    }

    /// Position of output stage `i`, which is predicted stage `i + 1`.
    pub fn position(&self, i: usize) -> Option<Vector2<f64>> {
        pair(&self.positions, i)
    }

    /// Velocity of output stage `i`, which is predicted stage `i + 1`.
    pub fn velocity(&self, i: usize) -> Option<Vector2<f64>> {
        pair(&self.velocities, i)
    }
}

/// Extract the output trajectory from `N + 1` predicted states.
pub fn extract(states: &[StateVector]) -> OutputTrajectory {
    let len = 2 * states.len().saturating_sub(1);
    let mut traj = OutputTrajectory {
        positions: vec![0.0; len],
        velocities: vec![0.0; len],
    };

    fill(states, &mut traj.positions, &mut traj.velocities);

    traj
}

/// Extract into caller provided buffers, each of which must hold at least
/// `2N` values. Values past `2N` are left untouched.
pub fn extract_into(
    states: &[StateVector],
    positions: &mut [f64],
    velocities: &mut [f64]
) -> Result<(), TrajectoryError> {
    let required = 2 * states.len().saturating_sub(1);

    if positions.len() < required {
        return Err(TrajectoryError::BufferTooShort("position", positions.len(), required))
    }
    if velocities.len() < required {
        return Err(TrajectoryError::BufferTooShort("velocity", velocities.len(), required))
    }

    fill(states, positions, velocities);

    Ok(())
}

/// Copy stages `1..=N` into buffers already known to hold `2N` values.
fn fill(states: &[StateVector], positions: &mut [f64], velocities: &mut [f64]) {
    for (i, x) in states.iter().skip(1).enumerate() {
        positions[2 * i] = x[0];
        positions[2 * i + 1] = x[2];
        velocities[2 * i] = x[1];
        velocities[2 * i + 1] = x[3];
    }
}

fn pair(values: &[f64], i: usize) -> Option<Vector2<f64>> {
    match (values.get(2 * i), values.get(2 * i + 1)) {
        (Some(a), Some(b)) => Some(Vector2::new(*a, *b)),
        _ => None
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn states() -> Vec<StateVector> {
        (0..4)
            .map(|i| {
                let i = i as f64;
                StateVector::new(i, 10.0 + i, 20.0 + i, 30.0 + i, 99.0)
            })
            .collect()
    }

    #[test]
    fn test_extract() {
        let traj = extract(&states());

        assert_eq!(traj.num_stages(), 3);
        assert_eq!(traj.positions, vec![1.0, 21.0, 2.0, 22.0, 3.0, 23.0]);
        assert_eq!(traj.velocities, vec![11.0, 31.0, 12.0, 32.0, 13.0, 33.0]);

        assert_eq!(traj.position(1), Some(Vector2::new(2.0, 22.0)));
        assert_eq!(traj.velocity(2), Some(Vector2::new(13.0, 33.0)));
        assert_eq!(traj.position(3), None);
    }

    #[test]
    fn test_extract_into() {
        let mut pos = [-1.0; 8];
        let mut vel = [-1.0; 6];

        extract_into(&states(), &mut pos, &mut vel).unwrap();

        assert_eq!(pos, [1.0, 21.0, 2.0, 22.0, 3.0, 23.0, -1.0, -1.0]);
        assert_eq!(vel, [11.0, 31.0, 12.0, 32.0, 13.0, 33.0]);
    }

    #[test]
    fn test_extract_into_short_buffer() {
        let mut pos = [0.0; 6];
        let mut vel = [0.0; 5];

        match extract_into(&states(), &mut pos, &mut vel) {
            Err(TrajectoryError::BufferTooShort("velocity", 5, 6)) => (),
            r => panic!("Expected a short velocity buffer error, got {:?}", r)
        }
    }

    #[test]
    fn test_extract_empty() {
        let traj = extract(&[]);

        assert_eq!(traj.num_stages(), 0);
        assert!(traj.positions.is_empty());
    }
}
