//! # oxicc - ICC profiles in Rust
//!
//! Read, inspect, validate, edit and write ICC color profiles, and chain them
//! into color transforms.
//!
//! ## Layout
//!
//! - [`icc`]: binary codec, tag model, tag-type registry, validation and the
//!   profile fingerprint
//! - [`clut`]: multidimensional lookup tables and their interpolation
//! - [`pipeline`]: per-profile transform stages and the chaining CMM
//! - [`builder`]: CLUT-based input profiles from measured data
//! - [`color`], [`math`]: colorimetry and 3×3 matrix helpers
//!
//! ## Quick Start
//!
//! ```no_run
//! use oxicc_core::icc::{IccProfile, RenderingIntent};
//! use oxicc_core::pipeline::{Cmm, CmmConfig};
//!
//! let camera = IccProfile::open("camera.icc")?;
//! let display = IccProfile::open("display.icc")?;
//!
//! let cmm = Cmm::from_profiles(
//!     &[&camera, &display],
//!     &[RenderingIntent::Perceptual],
//!     &CmmConfig::default(),
//! )?;
//!
//! let mut rgb = [0.0; 3];
//! cmm.apply(&mut rgb, &[1.0, 0.5, 0.25]);
//! # Ok::<(), oxicc_core::Error>(())
//! ```

pub mod builder;
pub mod clut;
pub mod color;
pub mod error;
pub mod icc;
pub mod math;
pub mod pipeline;

pub use builder::{BlackScaler, ClutInputProfileBuilder};
pub use clut::{Clut, ClutPrecision, Interpolation};
pub use color::{D50, Lab, Xyz};
pub use error::{Error, Result};
pub use icc::{
    ColorSpace, IccError, IccProfile, ProfileClass, ReadOptions, RenderingIntent, TagData,
    TagRegistry, TagSignature, ValidationReport, ValidationStatus, WriteOptions,
};
pub use pipeline::{Cmm, CmmBuilder, CmmConfig};

/// Version of oxicc
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_profile_to_cmm() {
        let mut gray = IccProfile::new(ProfileClass::Display, ColorSpace::Gray, ColorSpace::Lab);
        gray.attach_tag(
            TagSignature::GRAY_TRC,
            TagData::Curve(icc::tags::CurveData::gamma(1.0)),
        );
        let bytes = gray.to_bytes(&WriteOptions::default()).unwrap();
        let back = IccProfile::from_bytes(&bytes).unwrap();

        let cmm = Cmm::from_profiles(&[&back], &[], &CmmConfig::default()).unwrap();
        let mut lab = [0.0; 3];
        cmm.apply(&mut lab, &[1.0]);
        assert!((lab[0] - 100.0).abs() < 1e-6, "{:?}", lab);
    }
}
