//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Return the euclidian norm (distance between) of two points.
///
/// If the points do not have the same number of dimentions then `None` is
/// returned.
pub fn norm<T>(point_0: &[T], point_1: &[T]) -> Option<T>
where
    T: Float + std::ops::AddAssign
{
    // Check that the dimentions match
    if point_0.len() != point_1.len() {
        return None;
    }

    let mut sum = T::zero();

    for (a, b) in point_0.iter().zip(point_1.iter()) {
        sum += (*a - *b).powi(2);
    }

    Some(sum.sqrt())
}

/// Clamp a value into `[min, max]`.
///
/// NaN is returned unchanged.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: Float
{
    if value > max {
        max
    }
    else if value < min {
        min
    }
    else {
        value
    }
}

/// Format a slice of values as a single space separated row, as used in
/// diagnostic printouts of matrices and trajectories.
pub fn fmt_row<T>(values: &[T]) -> String
where
    T: std::fmt::Display
{
    values
        .iter()
        .map(|v| format!("{}", v))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_norm() {
        assert_eq!(norm(&[0f64, 0f64], &[3f64, 4f64]), Some(5f64));
        assert_eq!(norm(&[1f64], &[1f64, 2f64]), None);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(0.7f64, -0.5, 0.5), 0.5);
        assert_eq!(clamp(-0.7f64, -0.5, 0.5), -0.5);
        assert_eq!(clamp(0.1f64, -0.5, 0.5), 0.1);
        assert!(clamp(std::f64::NAN, -0.5, 0.5).is_nan());
    }

    #[test]
    fn test_fmt_row() {
        assert_eq!(fmt_row(&[100.0, 0.0, 1.5]), "100 0 1.5");
        assert_eq!(fmt_row::<f64>(&[]), "");
    }
}
