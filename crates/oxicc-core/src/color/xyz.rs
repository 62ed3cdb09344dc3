//! CIE XYZ tristimulus values
//!
//! The XYZ connection space is relative to a perfect diffuser, Y = 1.0.
//! Measured data (cd/m², flare-affected) is also carried in this type before
//! it is normalized.

use std::ops::{Add, Mul, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Xyz {
    pub x: f64,
    /// Luminance
    pub y: f64,
    pub z: f64,
}

impl Xyz {
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub const fn from_array(arr: [f64; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }

    #[inline]
    pub const fn to_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    #[inline]
    pub fn scale(&self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }

    /// Per-channel quotient `self / white`; a zero channel in `white` yields 1.
    ///
    /// This is the von Kries style white scaling used between media-relative
    /// and absolute PCS values.
    pub fn ratio(&self, white: &Xyz) -> [f64; 3] {
        let div = |a: f64, b: f64| if b != 0.0 { a / b } else { 1.0 };
        [div(self.x, white.x), div(self.y, white.y), div(self.z, white.z)]
    }

    /// Per-channel product with a scale triple
    #[inline]
    pub fn scale_by(&self, scale: [f64; 3]) -> Self {
        Self::new(self.x * scale[0], self.y * scale[1], self.z * scale[2])
    }

    /// Chromaticity (x, y); black gives (0, 0)
    pub fn chromaticity(&self) -> (f64, f64) {
        let sum = self.x + self.y + self.z;
        if sum > 0.0 {
            (self.x / sum, self.y / sum)
        } else {
            (0.0, 0.0)
        }
    }

    #[inline]
    pub fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        (self.x - other.x).abs() < epsilon
            && (self.y - other.y).abs() < epsilon
            && (self.z - other.z).abs() < epsilon
    }
}

impl From<[f64; 3]> for Xyz {
    fn from(arr: [f64; 3]) -> Self {
        Self::from_array(arr)
    }
}

impl Add for Xyz {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Xyz {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Xyz {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        self.scale(rhs)
    }
}
