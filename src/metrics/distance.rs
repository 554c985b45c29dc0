//! Sequential distance between consecutive same-day positions

use crate::types::Position;

/// Decimal places kept for distances and movement totals.
pub const DISTANCE_DECIMALS: i32 = 4;

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Euclidean step from `previous` to `current`, rounded to 4 places.
///
/// Zero when either position is missing.
pub fn step_distance(previous: Option<Position>, current: Option<Position>) -> f64 {
    match (previous, current) {
        (Some(a), Some(b)) => round_to((b.x - a.x).hypot(b.y - a.y), DISTANCE_DECIMALS),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_four_five() {
        let d = step_distance(Some(Position::new(0.0, 0.0)), Some(Position::new(3.0, 4.0)));
        assert_eq!(d, 5.0);
    }

    #[test]
    fn test_rounded_to_four_places() {
        let d = step_distance(Some(Position::new(0.0, 0.0)), Some(Position::new(1.0, 1.0)));
        assert_eq!(d, 1.4142);
    }

    #[test]
    fn test_missing_position_is_zero() {
        assert_eq!(step_distance(None, Some(Position::new(3.0, 4.0))), 0.0);
        assert_eq!(step_distance(Some(Position::new(3.0, 4.0)), None), 0.0);
        assert_eq!(step_distance(None, None), 0.0);
    }

    #[test]
    fn test_never_negative() {
        let d = step_distance(Some(Position::new(5.0, 5.0)), Some(Position::new(-1.0, -3.0)));
        assert!(d > 0.0);
        assert_eq!(d, 10.0);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(2.345_67, 1), 2.3);
        assert_eq!(round_to(2.35, 0), 2.0);
        assert_eq!(round_to(0.000_05, 4), 0.0001);
    }
}
