//! Fixed point coordinates with 5 fractional bits.
//!
//! All geometry handed to the [`Outline`](crate::outline::Outline) is
//! expressed in these units: one integer pixel is
//! [`POLY_BASE_SIZE`](crate::POLY_BASE_SIZE) steps, so a coordinate can be
//! placed on a 1/32 pixel grid without any floating point in the rasterizer
//! itself.

use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use crate::POLY_BASE_SIZE;

/// A signed coordinate with 5 fractional bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Q5(i32);

impl Q5 {
    /// Wrap an already-scaled raw value.
    pub fn from_raw(v: i32) -> Self {
        Q5(v)
    }

    /// The underlying raw value, 32 units per pixel.
    pub fn raw(self) -> i32 {
        self.0
    }

    /// Truncate to whole pixels, rounding toward zero.
    pub fn to_int(self) -> i32 {
        self.0 / POLY_BASE_SIZE
    }

    pub fn to_f32(self) -> f32 {
        self.0 as f32 / POLY_BASE_SIZE as f32
    }
}

impl From<i32> for Q5 {
    fn from(v: i32) -> Self {
        Q5(v * POLY_BASE_SIZE)
    }
}

impl From<f32> for Q5 {
    /// Truncates toward zero, like the integer conversion.
    fn from(v: f32) -> Self {
        Q5((v * POLY_BASE_SIZE as f32) as i32)
    }
}

impl Add for Q5 {
    type Output = Q5;
    fn add(self, rhs: Q5) -> Q5 {
        Q5(self.0 + rhs.0)
    }
}

impl AddAssign for Q5 {
    fn add_assign(&mut self, rhs: Q5) {
        self.0 += rhs.0;
    }
}

impl Sub for Q5 {
    type Output = Q5;
    fn sub(self, rhs: Q5) -> Q5 {
        Q5(self.0 - rhs.0)
    }
}

impl SubAssign for Q5 {
    fn sub_assign(&mut self, rhs: Q5) {
        self.0 -= rhs.0;
    }
}

impl Neg for Q5 {
    type Output = Q5;
    fn neg(self) -> Q5 {
        Q5(-self.0)
    }
}

impl Mul<i32> for Q5 {
    type Output = Q5;
    fn mul(self, rhs: i32) -> Q5 {
        Q5(self.0 * rhs)
    }
}
