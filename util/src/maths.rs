//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Convert an angle in radians into degrees.
pub fn rad_to_deg<T>(angle_rad: T) -> T
where
    T: Float,
{
    angle_rad * T::from(180.0 / std::f64::consts::PI).unwrap()
}

/// Convert an angle in degrees into radians.
pub fn deg_to_rad<T>(angle_deg: T) -> T
where
    T: Float,
{
    angle_deg * T::from(std::f64::consts::PI / 180.0).unwrap()
}

/// Wrap an angle in degrees into the range [0, 360).
pub fn wrap_360<T>(angle_deg: T) -> T
where
    T: Float,
{
    let full_turn = T::from(360.0).unwrap();

    let mut wrapped = angle_deg % full_turn;
    if wrapped < T::from(0.0).unwrap() {
        wrapped = wrapped + full_turn;
    }

    wrapped
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_rad_deg_conversion() {
        assert_eq!(rad_to_deg(std::f64::consts::PI), 180.0);
        assert_eq!(deg_to_rad(180.0), std::f64::consts::PI);
        assert_eq!(rad_to_deg(0.0), 0.0);
    }

    #[test]
    fn test_wrap_360() {
        assert_eq!(wrap_360(0f64), 0f64);
        assert_eq!(wrap_360(359f64), 359f64);
        assert_eq!(wrap_360(360f64), 0f64);
        assert_eq!(wrap_360(-90f64), 270f64);
        assert_eq!(wrap_360(450f64), 90f64);
    }
}
