//! # Online data refresher
//!
//! Fills the per-stage obstacle slots handed to the solver each cycle. Slots
//! without an obstacle hold a sentinel position far outside the operating
//! area, so that their distance row never becomes active.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{trace, warn};
use nalgebra::Vector2;
use serde::Serialize;
use std::cmp::Ordering;

// Internal
use crate::params::PlannerParams;
use crate::types::Obstacle;
use util::maths::fmt_row;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Obstacle positions for every state stage of the horizon (`N + 1` rows).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OnlineData {
    stages: Vec<Vec<Vector2<f64>>>,
}

/// Builds the online data from the current obstacle set.
#[derive(Debug, Clone)]
pub struct OnlineDataRefresher {
    num_stages: usize,
    num_slots: usize,
    sentinel_m: Vector2<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl OnlineData {
    /// Online data with the same slots repeated on every stage.
    pub fn repeated(num_stages: usize, slots: Vec<Vector2<f64>>) -> Self {
        Self {
            stages: vec![slots; num_stages],
        }
    }

    pub fn num_stages(&self) -> usize {
        self.stages.len()
    }

    /// Number of slots on the first stage, or zero if there are no stages.
    pub fn num_slots(&self) -> usize {
        self.stages.first().map(|s| s.len()).unwrap_or(0)
    }

    /// The obstacle slots of the given stage.
    pub fn stage(&self, index: usize) -> Option<&[Vector2<f64>]> {
        self.stages.get(index).map(|s| s.as_slice())
    }

    /// The given stage flattened to `[x1, y1, x2, y2, ...]`, as laid out in
    /// the solver's online data row.
    pub fn stage_row(&self, index: usize) -> Option<Vec<f64>> {
        self.stage(index)
            .map(|s| s.iter().flat_map(|p| vec![p[0], p[1]]).collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = &[Vector2<f64>]> {
        self.stages.iter().map(|s| s.as_slice())
    }
}

impl OnlineDataRefresher {
    pub fn new(params: &PlannerParams) -> Self {
        Self {
            num_stages: params.horizon_len + 1,
            num_slots: params.num_obstacle_slots,
            sentinel_m: Vector2::new(
                params.obstacle_sentinel_m[0],
                params.obstacle_sentinel_m[1]
            ),
        }
    }

    /// Online data with every slot of every stage set to the sentinel.
    pub fn sentinel(&self) -> OnlineData {
        OnlineData::repeated(self.num_stages, vec![self.sentinel_m; self.num_slots])
    }

    /// Build the online data for this cycle.
    ///
    /// Obstacles are not predicted, so every stage receives the same slots.
    /// If there are more obstacles than slots the ones nearest to
    /// `robot_position_m` are kept and the rest dropped.
    pub fn refresh(
        &self,
        obstacles: &[Obstacle],
        robot_position_m: &Vector2<f64>
    ) -> OnlineData {
        let mut selected: Vec<&Obstacle> = obstacles.iter().collect();

        if selected.len() > self.num_slots {
            warn!(
                "{} obstacles given but only {} slots available, keeping the nearest",
                selected.len(),
                self.num_slots
            );

            selected.sort_by(|a, b| {
                let da = (a.position_m - robot_position_m).norm_squared();
                let db = (b.position_m - robot_position_m).norm_squared();
                da.partial_cmp(&db).unwrap_or(Ordering::Equal)
            });
            selected.truncate(self.num_slots);
        }

        let mut slots = vec![self.sentinel_m; self.num_slots];
        for (slot, obs) in slots.iter_mut().zip(selected.iter()) {
            *slot = obs.position_m;
        }

        let data = OnlineData::repeated(self.num_stages, slots);

        if let Some(row) = data.stage_row(0) {
            trace!("Online data row: {}", fmt_row(&row));
        }

        data
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_empty_obstacles_are_sentinel() {
        let params = PlannerParams::default();
        let refresher = OnlineDataRefresher::new(&params);

        let data = refresher.refresh(&[], &Vector2::zeros());

        assert_eq!(data.num_stages(), 21);
        assert_eq!(data.num_slots(), 6);
        for stage in data.iter() {
            for slot in stage {
                assert_eq!(*slot, Vector2::new(100.0, 100.0));
            }
        }
        assert_eq!(data, refresher.sentinel());
    }

    #[test]
    fn test_partial_fill() {
        let refresher = OnlineDataRefresher::new(&PlannerParams::default());

        let data = refresher.refresh(
            &[Obstacle::new(1.0, 2.0), Obstacle::new(-3.0, 0.5)],
            &Vector2::zeros()
        );

        for stage in data.iter() {
            assert_eq!(stage[0], Vector2::new(1.0, 2.0));
            assert_eq!(stage[1], Vector2::new(-3.0, 0.5));
            for slot in &stage[2..] {
                assert_eq!(*slot, Vector2::new(100.0, 100.0));
            }
        }

        assert_eq!(
            data.stage_row(0).unwrap(),
            vec![1.0, 2.0, -3.0, 0.5, 100.0, 100.0, 100.0, 100.0, 100.0, 100.0, 100.0, 100.0]
        );
    }

    #[test]
    fn test_overflow_keeps_nearest() {
        let refresher = OnlineDataRefresher::new(&PlannerParams::default());

        // Eight obstacles at distances 8, 1, 7, 2, 6, 3, 5, 4 from the robot
        let robot = Vector2::new(1.0, 1.0);
        let obstacles: Vec<Obstacle> = [8.0, 1.0, 7.0, 2.0, 6.0, 3.0, 5.0, 4.0]
            .iter()
            .map(|d| Obstacle::new(1.0 + d, 1.0))
            .collect();

        let data = refresher.refresh(&obstacles, &robot);
        let stage = data.stage(3).unwrap();

        assert_eq!(stage.len(), 6);
        let mut kept: Vec<f64> = stage.iter().map(|p| p[0] - 1.0).collect();
        kept.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(kept, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }
}
