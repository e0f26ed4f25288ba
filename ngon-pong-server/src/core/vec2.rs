//! 2D Vector
//!
//! Double-precision 2D vector shared by the authoritative simulation and any
//! client-side predictor. Values are immutable; every operation returns a new
//! vector.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use serde::{Serialize, Deserialize};

/// Tolerance for equality and root-finding comparisons.
pub const EPS: f64 = 1e-9;

/// Looser tolerance for near-tangent or degenerate geometry.
pub const FAT_EPS: f64 = 1e-5;

/// Check whether `x` is within [`EPS`] of `n`.
#[inline]
pub fn is_nearly(x: f64, n: f64) -> bool {
    (x - n).abs() < EPS
}

/// 2D vector with `f64` components.
#[derive(Clone, Copy, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// X component
    pub x: f64,
    /// Y component
    pub y: f64,
}

impl Vec2 {
    /// Zero vector
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Unit vector pointing up in screen space (-Y).
    pub const UP: Self = Self { x: 0.0, y: -1.0 };

    /// Create a new vector.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector at `angle` radians from +X.
    #[inline]
    pub fn from_angle(angle: f64) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    /// Add another vector.
    #[inline]
    pub fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }

    /// Subtract another vector.
    #[inline]
    pub fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }

    /// Scale by a scalar.
    #[inline]
    pub fn scale(self, scalar: f64) -> Self {
        Self::new(self.x * scalar, self.y * scalar)
    }

    /// Dot product with another vector.
    #[inline]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// 2D cross product (z-component).
    #[inline]
    pub fn cross(self, other: Self) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Squared length (avoids sqrt - prefer this for comparisons).
    #[inline]
    pub fn length_squared(self) -> f64 {
        self.dot(self)
    }

    /// Length (magnitude).
    #[inline]
    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Distance to another point.
    #[inline]
    pub fn distance(self, other: Self) -> f64 {
        self.sub(other).length()
    }

    /// Normalize to unit length.
    /// Returns ZERO if length is zero.
    #[inline]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len == 0.0 || !len.is_finite() {
            return Self::ZERO;
        }
        Self::new(self.x / len, self.y / len)
    }

    /// Rotate counter-clockwise (in math orientation) by `angle` radians.
    #[inline]
    pub fn rotate(self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    /// Rotate 90 degrees: (x, y) -> (-y, x).
    #[inline]
    pub fn perpendicular(self) -> Self {
        Self::new(-self.y, self.x)
    }

    /// Angle of this vector from +X, in radians.
    #[inline]
    pub fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }

    /// Angle of the direction pointing from `self` to `other`.
    #[inline]
    pub fn angle_to(self, other: Self) -> f64 {
        other.sub(self).angle()
    }

    /// Negate both components.
    #[inline]
    pub fn negate(self) -> Self {
        Self::new(-self.x, -self.y)
    }

    /// Linear interpolation between two vectors.
    #[inline]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        self.add(other.sub(self).scale(t))
    }

    /// Both components finite.
    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Equality within [`EPS`] per component.
impl PartialEq for Vec2 {
    fn eq(&self, other: &Self) -> bool {
        is_nearly(self.x, other.x) && is_nearly(self.y, other.y)
    }
}

// Operator overloads for ergonomics
impl Add for Vec2 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Vec2::add(self, rhs)
    }
}

impl Sub for Vec2 {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Vec2::sub(self, rhs)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: f64) -> Self {
        self.scale(rhs)
    }
}

impl Neg for Vec2 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        self.negate()
    }
}

impl fmt::Debug for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vec2({:.6}, {:.6})", self.x, self.y)
    }
}

impl fmt::Display for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_vec2_add_sub() {
        let a = Vec2::new(3.0, 4.0);
        let b = Vec2::new(1.0, 2.0);
        assert_eq!(a + b, Vec2::new(4.0, 6.0));
        assert_eq!(a - b, Vec2::new(2.0, 2.0));
        assert_eq!(-a, Vec2::new(-3.0, -4.0));
    }

    #[test]
    fn test_vec2_scale_dot() {
        let v = Vec2::new(2.0, 3.0);
        assert_eq!(v * 2.0, Vec2::new(4.0, 6.0));
        // 2*4 + 3*5 = 23
        assert!(is_nearly(v.dot(Vec2::new(4.0, 5.0)), 23.0));
    }

    #[test]
    fn test_vec2_length() {
        let v = Vec2::new(3.0, 4.0);
        assert!(is_nearly(v.length_squared(), 25.0));
        assert!(is_nearly(v.length(), 5.0));
    }

    #[test]
    fn test_vec2_normalize() {
        assert_eq!(Vec2::new(3.0, 4.0).normalize(), Vec2::new(0.6, 0.8));

        // Zero vector normalizes to zero
        assert_eq!(Vec2::ZERO.normalize(), Vec2::ZERO);
    }

    #[test]
    fn test_vec2_rotate_and_perpendicular() {
        let v = Vec2::new(1.0, 0.0);
        assert_eq!(v.rotate(FRAC_PI_2), Vec2::new(0.0, 1.0));
        assert_eq!(v.rotate(PI), Vec2::new(-1.0, 0.0));
        assert_eq!(v.perpendicular(), Vec2::new(0.0, 1.0));
        assert!(is_nearly(v.dot(v.perpendicular()), 0.0));
    }

    #[test]
    fn test_vec2_angle_to() {
        let a = Vec2::new(1.0, 1.0);
        let b = Vec2::new(1.0, 5.0);
        assert!(is_nearly(a.angle_to(b), FRAC_PI_2));
        assert!(is_nearly(b.angle_to(a), -FRAC_PI_2));
    }

    #[test]
    fn test_vec2_epsilon_equality() {
        let a = Vec2::new(1.0, 1.0);
        assert_eq!(a, Vec2::new(1.0 + EPS / 2.0, 1.0));
        assert_ne!(a, Vec2::new(1.0 + FAT_EPS, 1.0));
    }
}
