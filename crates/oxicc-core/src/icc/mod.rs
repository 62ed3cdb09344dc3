//! ICC Profile codec
//!
//! Native reading and writing of ICC profiles according to ICC.1:2022.
//!
//! # Structure
//!
//! An ICC profile consists of:
//! 1. A 128-byte header
//! 2. A tag table listing all tags
//! 3. Tag data (entries may share one tag)
//!
//! Tag bodies decode into [`TagData`]; the type signature of each body is
//! resolved through a [`TagRegistry`], so applications can add or override
//! tag types without touching this crate.
//!
//! # Example
//!
//! ```ignore
//! use oxicc_core::icc::{IccProfile, TagSignature};
//!
//! let profile = IccProfile::open("display.icc")?;
//! if profile.is_matrix_shaper() {
//!     println!("{:?}", profile.red_colorant());
//! }
//! let (status, report) = profile.validate();
//! ```

pub mod error;
pub mod header;
pub mod io;
pub mod md5;
pub mod pcs;
pub mod profile;
pub mod registry;
pub mod tags;
pub mod types;
pub mod validate;

pub use error::IccError;
pub use header::{ColorSpace, IccHeader, ProfileClass, ProfileVersion, RenderingIntent};
pub use io::{IccReader, IccWriter};
pub use pcs::PcsEncoding;
pub use profile::{IccProfile, ReadOptions, TagEntry, VersionPolicy, WriteOptions};
pub use registry::{TagFactory, TagRegistry};
pub use tags::{CustomTag, SharedTag, Tag, TagData};
pub use types::{
    DateTimeNumber, S15Fixed16, TagSignature, TypeSignature, U1Fixed15, U8Fixed8, U16Fixed16,
    XyzNumber,
};
pub use validate::{Finding, ValidationReport, ValidationStatus};
