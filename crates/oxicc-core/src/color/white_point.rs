//! Standard illuminants
//!
//! XYZ with Y = 1.0. `D50` is the value ICC headers and `wtpt` tags encode, so
//! it is given to four decimals to survive s15Fixed16 exactly.

use crate::color::Xyz;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WhitePoint {
    pub name: &'static str,
    pub xyz: Xyz,
}

impl WhitePoint {
    pub const fn new(name: &'static str, x: f64, y: f64, z: f64) -> Self {
        Self {
            name,
            xyz: Xyz::new(x, y, z),
        }
    }
}

/// Illuminant for a `meas` standard illuminant code, when it is one we carry
pub fn from_measurement_code(code: u32) -> Option<WhitePoint> {
    match code {
        1 => Some(D50),
        2 => Some(D65),
        6 => Some(A),
        _ => None,
    }
}

/// PCS illuminant (0xF6D6, 0x10000, 0xD32D)
pub const D50: WhitePoint = WhitePoint::new("D50", 0.9642, 1.0, 0.8249);

pub const D65: WhitePoint = WhitePoint::new("D65", 0.9505, 1.0, 1.0890);

pub const A: WhitePoint = WhitePoint::new("A", 1.0985, 1.0, 0.3558);
