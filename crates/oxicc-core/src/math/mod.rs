//! Mathematical operations for color management
//!
//! - 3x3 matrix operations for colorant and MBB matrix stages
//! - Chromatic adaptation and the `chad` tag
//! - ICC parametric curve evaluation

pub mod chromatic_adaptation;
pub mod matrix;
pub mod parametric;

pub use chromatic_adaptation::{
    ChromaticAdaptationMethod, adapt_xyz, adaptation_matrix, bradford_matrix, chad_matrix,
    chad_tag,
};
pub use matrix::Matrix3x3;
pub use parametric::{ParametricCurve, ParametricCurveType};
