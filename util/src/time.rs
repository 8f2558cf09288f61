//! General time utility functions

use chrono;

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}

/// Convert a std duration into whole microseconds, saturating at `u64::MAX`.
pub fn std_duration_to_micros(duration: std::time::Duration) -> u64 {
    let micros = duration.as_micros();

    if micros > u64::MAX as u128 {
        u64::MAX
    }
    else {
        micros as u64
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_duration_conversions() {
        assert_eq!(
            duration_to_seconds(chrono::Duration::milliseconds(1500)),
            Some(1.5)
        );
        assert_eq!(
            std_duration_to_micros(std::time::Duration::from_millis(3)),
            3000
        );
    }
}
