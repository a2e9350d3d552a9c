//! # Quaternion and attitude types
//!
//! Pure quaternion algebra used to express device attitudes and to derive the
//! relative orientation between the two motion sources. All functions here are
//! stateless.
//!
//! All operations assume unit-norm quaternions. No function in this module
//! renormalizes its inputs or outputs, keeping quaternions normalized is the
//! caller's responsibility.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A rotation expressed as a quaternion with components (x, y, z, w).
///
/// `w` is the scalar part. Consumers assume unit norm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

/// An attitude, i.e. an orientation against some reference frame.
///
/// The pitch/roll/yaw angles are a convenience projection of the quaternion.
/// The quaternion is authoritative, consumers needing exact composition must
/// use it rather than the angles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Attitude {
    /// Pitch angle in radians
    pub pitch_rad: f64,

    /// Roll angle in radians
    pub roll_rad: f64,

    /// Yaw angle in radians
    pub yaw_rad: f64,

    /// The quaternion this attitude was derived from
    pub quat: Quaternion,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Quaternion {
    /// The identity quaternion, representing no rotation.
    pub const IDENTITY: Quaternion = Quaternion {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    pub fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Quaternion { x, y, z, w }
    }

    /// Return the norm (magnitude) of the quaternion.
    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt()
    }

    /// True if all four components are zero.
    ///
    /// A zero quaternion represents no valid rotation and is rejected by the
    /// sample decoder.
    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0 && self.w == 0.0
    }

    /// Return the conjugate of the quaternion.
    ///
    /// For a unit-norm quaternion the conjugate is its inverse rotation. This
    /// does not hold for non-unit quaternions, which are not checked for.
    pub fn conjugate(&self) -> Quaternion {
        Quaternion {
            x: -self.x,
            y: -self.y,
            z: -self.z,
            w: self.w,
        }
    }

    /// Return the Hamilton product `self * rhs`.
    ///
    /// Quaternion multiplication is non-commutative, `a.multiply(&b)` is in
    /// general not equal to `b.multiply(&a)`, so operand order must be
    /// preserved by callers.
    pub fn multiply(&self, rhs: &Quaternion) -> Quaternion {
        Quaternion {
            x: self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            y: self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            z: self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
            w: self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        }
    }
}

impl Attitude {
    /// Derive an attitude from a quaternion using the aerospace
    /// (ZYX-intrinsic) Euler convention.
    ///
    /// The pitch `asin` argument is clamped to [-1, 1] before conversion so
    /// that gimbal-lock configurations (±90° pitch) saturate at ±π/2 instead
    /// of producing a NaN.
    pub fn from_quat(quat: Quaternion) -> Self {
        let Quaternion { x, y, z, w } = quat;

        let roll_rad = (2.0 * (w * x + y * z)).atan2(1.0 - 2.0 * (x * x + y * y));
        let pitch_rad = (2.0 * (w * y - z * x)).clamp(-1.0, 1.0).asin();
        let yaw_rad = (2.0 * (w * z + x * y)).atan2(1.0 - 2.0 * (y * y + z * z));

        Attitude {
            pitch_rad,
            roll_rad,
            yaw_rad,
            quat,
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2};

    const TOL: f64 = 1e-12;

    /// A unit quaternion with no special structure.
    fn arbitrary_unit() -> Quaternion {
        let q = Quaternion::new(0.3, -0.2, 0.6, 0.7);
        let n = q.norm();
        Quaternion::new(q.x / n, q.y / n, q.z / n, q.w / n)
    }

    #[test]
    fn test_multiply_by_conjugate_is_identity() {
        let q = arbitrary_unit();
        let p = q.multiply(&q.conjugate());

        assert!((p.x - 0.0).abs() < TOL);
        assert!((p.y - 0.0).abs() < TOL);
        assert!((p.z - 0.0).abs() < TOL);
        assert!((p.w - 1.0).abs() < TOL);
    }

    #[test]
    fn test_multiply_is_non_commutative() {
        // 90 degrees about Z and 90 degrees about X
        let q1 = Quaternion::new(0.0, 0.0, FRAC_1_SQRT_2, FRAC_1_SQRT_2);
        let q2 = Quaternion::new(FRAC_1_SQRT_2, 0.0, 0.0, FRAC_1_SQRT_2);

        let ab = q1.multiply(&q2);
        let ba = q2.multiply(&q1);

        assert!(
            (ab.x - ba.x).abs() > TOL
                || (ab.y - ba.y).abs() > TOL
                || (ab.z - ba.z).abs() > TOL
                || (ab.w - ba.w).abs() > TOL
        );
    }

    #[test]
    fn test_identity_euler_is_zero() {
        let att = Attitude::from_quat(Quaternion::IDENTITY);

        assert_eq!(att.pitch_rad, 0.0);
        assert_eq!(att.roll_rad, 0.0);
        assert_eq!(att.yaw_rad, 0.0);
    }

    #[test]
    fn test_gimbal_lock_saturates() {
        // w = y = 1/sqrt(2) makes the pitch asin argument marginally exceed
        // 1.0 in floating point, which must clamp to +pi/2 rather than NaN
        let q = Quaternion::new(0.0, FRAC_1_SQRT_2, 0.0, FRAC_1_SQRT_2);
        let att = Attitude::from_quat(q);

        assert!(att.pitch_rad.is_finite());
        assert_eq!(att.pitch_rad, FRAC_PI_2);
    }

    #[test]
    fn test_yaw_quarter_turn() {
        // 90 degrees about Z
        let q = Quaternion::new(0.0, 0.0, FRAC_1_SQRT_2, FRAC_1_SQRT_2);
        let att = Attitude::from_quat(q);

        assert!((att.yaw_rad - FRAC_PI_2).abs() < TOL);
        assert!(att.pitch_rad.abs() < TOL);
        assert!(att.roll_rad.abs() < TOL);
    }
}
