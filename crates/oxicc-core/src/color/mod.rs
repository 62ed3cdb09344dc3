//! Color space types and conversions
//!
//! CIE XYZ and CIELAB values as used at the profile connection space, plus the
//! standard illuminants. The PCS encodings of these values live in
//! [`crate::icc::pcs`].

pub mod lab;
pub mod white_point;
pub mod xyz;

pub use lab::{Lab, delta_e_2000};
pub use white_point::{A, D50, D65, WhitePoint};
pub use xyz::Xyz;
