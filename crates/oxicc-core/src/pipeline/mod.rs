//! Color transform pipeline
//!
//! Profiles become [`Xform`] stages (matrix/TRC, gray TRC, LUT or
//! multi-process element), and a [`Cmm`] chains them.
//!
//! # Pipeline Architecture
//!
//! ```text
//! device -> [Xform] -> hop -> [Xform] -> hop -> ... -> device or PCS
//! ```
//!
//! Each stage consumes and produces values in its own encoding: device
//! values in [0, 1], PCS values in whatever normalization the underlying tag
//! uses. The [`PcsHop`] between two stages decodes, applies absolute
//! colorimetric scaling, converts Lab/XYZ and re-encodes, all in one step.

mod batch;
mod cmm;
mod context;
mod xform;

pub use batch::{Sample, transform_f32, transform_u8, transform_u16};
pub use cmm::{Cmm, CmmBuilder, PcsHop, media_white};
pub use context::CmmConfig;
pub use xform::{Direction, Xform, XformKind, float_tag, lut_tag};
