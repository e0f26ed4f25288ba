//! Scalar Root Solver
//!
//! Closed-form quadratic solver used by every time-of-impact query.
//! Roots are always returned in ascending order, so callers take the
//! first root as the earliest time.

use super::vec2::{is_nearly, EPS};

/// Up to two real roots, ascending. Stored inline (no allocation).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Roots {
    values: [f64; 2],
    len: usize,
}

impl Roots {
    /// No real roots.
    pub const NONE: Self = Self { values: [0.0; 2], len: 0 };

    /// A single (possibly repeated) root.
    #[inline]
    pub const fn one(root: f64) -> Self {
        Self { values: [root, root], len: 1 }
    }

    /// Two roots; ordered ascending on construction.
    #[inline]
    pub fn two(a: f64, b: f64) -> Self {
        let values = if a <= b { [a, b] } else { [b, a] };
        Self { values, len: 2 }
    }

    /// Roots as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.values[..self.len]
    }

    /// Earliest root.
    #[inline]
    pub fn first(&self) -> Option<f64> {
        self.as_slice().first().copied()
    }

    /// Latest root.
    #[inline]
    pub fn last(&self) -> Option<f64> {
        self.as_slice().last().copied()
    }

    /// Number of roots (0, 1 or 2).
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// No real roots.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Solve `a·t² + b·t + c = 0` for real `t`.
///
/// - `a ≈ 0` and `b ≈ 0`: no roots.
/// - `a ≈ 0`: the linear root `-c/b`.
/// - Discriminant below `-EPS`: no roots.
/// - Discriminant in `[-EPS, 0)`: treated as tangency, single root `-b/(2a)`.
/// - Otherwise both roots, ascending.
pub fn solve_quadratic(a: f64, b: f64, c: f64) -> Roots {
    if is_nearly(a, 0.0) {
        if is_nearly(b, 0.0) {
            return Roots::NONE;
        }
        return Roots::one(-c / b);
    }

    let disc = b * b - 4.0 * a * c;
    if disc < -EPS {
        return Roots::NONE;
    }
    if disc < 0.0 {
        return Roots::one(-b / (2.0 * a));
    }

    let sqrt_disc = disc.sqrt();
    // Ascending regardless of the sign of `a`.
    Roots::two((-b - sqrt_disc) / (2.0 * a), (-b + sqrt_disc) / (2.0 * a))
}
