//! PCS value encodings
//!
//! LUT-based tags carry PCS values as normalized [0, 1] numbers whose meaning
//! depends on the tag type and profile version. The CMM works in actual units
//! (L* 0..100, a*/b* around 0, XYZ with Y = 1) and converts at stage
//! boundaries through [`PcsEncoding`].

use super::header::ColorSpace;
use crate::color::{Lab, Xyz};

/// v2 Lab stores 100.0 at 0xFF00 rather than 0xFFFF
const LAB_V2_SCALE: f64 = 65535.0 / 65280.0;
/// u1Fixed15: 1.0 is 0x8000
const XYZ16_SCALE: f64 = 65535.0 / 32768.0;

/// How a stage expects PCS values to be represented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcsEncoding {
    /// v4 Lab, normalized (mAB/mBA, mft1)
    LabV4,
    /// Legacy v2 Lab, normalized (mft2)
    LabV2,
    /// u1Fixed15 XYZ, normalized
    Xyz16,
    /// Lab in actual units (MPE, matrix/TRC, chain ends)
    LabFloat,
    /// XYZ in actual units
    XyzFloat,
}

impl PcsEncoding {
    /// Connection space the encoding belongs to
    pub fn space(self) -> ColorSpace {
        match self {
            Self::LabV4 | Self::LabV2 | Self::LabFloat => ColorSpace::Lab,
            Self::Xyz16 | Self::XyzFloat => ColorSpace::Xyz,
        }
    }

    /// Actual-unit encoding for a PCS space
    pub fn float_for(space: ColorSpace) -> Self {
        match space {
            ColorSpace::Xyz => Self::XyzFloat,
            _ => Self::LabFloat,
        }
    }

    /// Normalized encoding used by integer LUT tags
    ///
    /// `legacy_lab` selects the v2 Lab scaling of `mft2`.
    pub fn for_lut(space: ColorSpace, legacy_lab: bool) -> Self {
        match (space, legacy_lab) {
            (ColorSpace::Xyz, _) => Self::Xyz16,
            (_, true) => Self::LabV2,
            (_, false) => Self::LabV4,
        }
    }

    /// Convert an encoded triple to actual units
    #[inline]
    pub fn to_actual(self, v: [f64; 3]) -> [f64; 3] {
        match self {
            Self::LabV4 => [v[0] * 100.0, v[1] * 255.0 - 128.0, v[2] * 255.0 - 128.0],
            Self::LabV2 => [
                v[0] * LAB_V2_SCALE * 100.0,
                v[1] * LAB_V2_SCALE * 255.0 - 128.0,
                v[2] * LAB_V2_SCALE * 255.0 - 128.0,
            ],
            Self::Xyz16 => [v[0] * XYZ16_SCALE, v[1] * XYZ16_SCALE, v[2] * XYZ16_SCALE],
            Self::LabFloat | Self::XyzFloat => v,
        }
    }

    /// Convert an actual-unit triple to this encoding
    #[inline]
    pub fn from_actual(self, v: [f64; 3]) -> [f64; 3] {
        match self {
            Self::LabV4 => [v[0] / 100.0, (v[1] + 128.0) / 255.0, (v[2] + 128.0) / 255.0],
            Self::LabV2 => [
                v[0] / 100.0 / LAB_V2_SCALE,
                (v[1] + 128.0) / 255.0 / LAB_V2_SCALE,
                (v[2] + 128.0) / 255.0 / LAB_V2_SCALE,
            ],
            Self::Xyz16 => [v[0] / XYZ16_SCALE, v[1] / XYZ16_SCALE, v[2] / XYZ16_SCALE],
            Self::LabFloat | Self::XyzFloat => v,
        }
    }
}

/// Actual-unit Lab (D50) to XYZ
#[inline]
pub fn lab_to_xyz(v: [f64; 3]) -> [f64; 3] {
    Lab::from_array(v).to_xyz().to_array()
}

/// Actual-unit XYZ to Lab (D50)
#[inline]
pub fn xyz_to_lab(v: [f64; 3]) -> [f64; 3] {
    Lab::from_xyz(Xyz::from_array(v)).to_array()
}

/// Decode a raw 16-bit PCS triple (as stored in `clrt`/`ncl2`) to actual units
pub fn decode_pcs16(raw: [u16; 3], encoding: PcsEncoding) -> [f64; 3] {
    encoding.to_actual(raw.map(|v| v as f64 / 65535.0))
}
