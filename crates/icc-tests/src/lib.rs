//! # icc-tests
//!
//! Cross-CMS parity and interchange testing for oxicc.
//!
//! - Parity: the same transform through oxicc and a reference CMS, scored
//!   with CIEDE2000
//! - Interchange: profiles written by one implementation and read by another
//! - Fixtures: in-memory profiles, so nothing depends on a corpus on disk
//!
//! ## Reference Implementations
//!
//! - **lcms2**: industry standard, full ICC support
//! - **qcms**: Firefox's CMS (pure Rust), matrix/TRC profiles

pub mod accuracy;
pub mod fixtures;
pub mod parity;
pub mod patterns;
pub mod reference;

pub use accuracy::{DeltaEStats, compare_lab, compare_rgb_buffers};
pub use parity::{ParityResult, ParityTest, ReferenceCms};
pub use patterns::TestPattern;
