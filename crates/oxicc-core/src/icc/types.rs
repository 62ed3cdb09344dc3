//! ICC Profile Basic Types
//!
//! Signatures, fixed-point numbers and the small composite records shared by
//! the header and the tag types. Decoding is exact; encoding rounds half up.

use std::fmt;

use crate::color::Xyz;

/// Render a 4-byte signature as text.
///
/// Printable ASCII signatures come back as their four characters (trailing
/// spaces included); anything else is shown as hex.
pub fn signature_string(sig: u32) -> String {
    let bytes = sig.to_be_bytes();
    if bytes.iter().all(|b| (0x20..0x7f).contains(b)) {
        bytes.iter().map(|&b| b as char).collect()
    } else {
        format!("0x{:08X}", sig)
    }
}

/// ICC Tag Signature (4-byte ASCII code)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagSignature(pub u32);

impl TagSignature {
    /// Create from 4 ASCII characters
    pub const fn from_bytes(b: [u8; 4]) -> Self {
        Self(u32::from_be_bytes(b))
    }

    // Common tag signatures
    pub const A2B0: Self = Self::from_bytes(*b"A2B0");
    pub const A2B1: Self = Self::from_bytes(*b"A2B1");
    pub const A2B2: Self = Self::from_bytes(*b"A2B2");
    pub const B2A0: Self = Self::from_bytes(*b"B2A0");
    pub const B2A1: Self = Self::from_bytes(*b"B2A1");
    pub const B2A2: Self = Self::from_bytes(*b"B2A2");
    pub const D2B0: Self = Self::from_bytes(*b"D2B0");
    pub const D2B1: Self = Self::from_bytes(*b"D2B1");
    pub const D2B2: Self = Self::from_bytes(*b"D2B2");
    pub const D2B3: Self = Self::from_bytes(*b"D2B3");
    pub const B2D0: Self = Self::from_bytes(*b"B2D0");
    pub const B2D1: Self = Self::from_bytes(*b"B2D1");
    pub const B2D2: Self = Self::from_bytes(*b"B2D2");
    pub const B2D3: Self = Self::from_bytes(*b"B2D3");
    pub const BLUE_COLORANT: Self = Self::from_bytes(*b"bXYZ");
    pub const BLUE_TRC: Self = Self::from_bytes(*b"bTRC");
    pub const CALIBRATION_DATE: Self = Self::from_bytes(*b"calt");
    pub const CHAD: Self = Self::from_bytes(*b"chad");
    pub const CHAR_TARGET: Self = Self::from_bytes(*b"targ");
    pub const COLORANT_TABLE: Self = Self::from_bytes(*b"clrt");
    pub const COLORANT_TABLE_OUT: Self = Self::from_bytes(*b"clot");
    pub const COPYRIGHT: Self = Self::from_bytes(*b"cprt");
    pub const DESC: Self = Self::from_bytes(*b"desc");
    pub const DMDD: Self = Self::from_bytes(*b"dmdd");
    pub const DMND: Self = Self::from_bytes(*b"dmnd");
    pub const GAMUT: Self = Self::from_bytes(*b"gamt");
    pub const GRAY_TRC: Self = Self::from_bytes(*b"kTRC");
    pub const GREEN_COLORANT: Self = Self::from_bytes(*b"gXYZ");
    pub const GREEN_TRC: Self = Self::from_bytes(*b"gTRC");
    pub const LUMINANCE: Self = Self::from_bytes(*b"lumi");
    pub const MEASUREMENT: Self = Self::from_bytes(*b"meas");
    pub const MEDIA_WHITE: Self = Self::from_bytes(*b"wtpt");
    pub const MEDIA_BLACK: Self = Self::from_bytes(*b"bkpt");
    pub const NAMED_COLOR2: Self = Self::from_bytes(*b"ncl2");
    pub const PREVIEW0: Self = Self::from_bytes(*b"pre0");
    pub const PREVIEW1: Self = Self::from_bytes(*b"pre1");
    pub const PREVIEW2: Self = Self::from_bytes(*b"pre2");
    pub const PROFILE_SEQUENCE: Self = Self::from_bytes(*b"pseq");
    pub const RED_COLORANT: Self = Self::from_bytes(*b"rXYZ");
    pub const RED_TRC: Self = Self::from_bytes(*b"rTRC");
    pub const TECH: Self = Self::from_bytes(*b"tech");
    pub const VIEW_COND_DESC: Self = Self::from_bytes(*b"vued");
    pub const VIEW_COND: Self = Self::from_bytes(*b"view");
}

impl fmt::Display for TagSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&signature_string(self.0))
    }
}

/// Type signatures for ICC tag data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeSignature(pub u32);

impl TypeSignature {
    pub const fn from_bytes(b: [u8; 4]) -> Self {
        Self(u32::from_be_bytes(b))
    }

    pub const XYZ: Self = Self::from_bytes(*b"XYZ ");
    pub const CURVE: Self = Self::from_bytes(*b"curv");
    pub const PARA: Self = Self::from_bytes(*b"para");
    pub const TEXT: Self = Self::from_bytes(*b"text");
    pub const DESC: Self = Self::from_bytes(*b"desc");
    pub const MLUC: Self = Self::from_bytes(*b"mluc");
    pub const LUT8: Self = Self::from_bytes(*b"mft1");
    pub const LUT16: Self = Self::from_bytes(*b"mft2");
    pub const LUTA2B: Self = Self::from_bytes(*b"mAB ");
    pub const LUTB2A: Self = Self::from_bytes(*b"mBA ");
    pub const MPET: Self = Self::from_bytes(*b"mpet");
    pub const SF32: Self = Self::from_bytes(*b"sf32");
    pub const UF32: Self = Self::from_bytes(*b"uf32");
    pub const SIG: Self = Self::from_bytes(*b"sig ");
    pub const DTIM: Self = Self::from_bytes(*b"dtim");
    pub const MEAS: Self = Self::from_bytes(*b"meas");
    pub const CLRT: Self = Self::from_bytes(*b"clrt");
    pub const NCL2: Self = Self::from_bytes(*b"ncl2");
}

impl fmt::Display for TypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&signature_string(self.0))
    }
}

/// Round half up and saturate into `[lo, hi]`.
#[inline]
fn encode_fixed(val: f64, scale: f64, lo: f64, hi: f64) -> f64 {
    if val.is_nan() {
        return 0.0;
    }
    (val * scale + 0.5).floor().clamp(lo, hi)
}

/// s15Fixed16Number - 16.16 fixed point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct S15Fixed16(pub i32);

impl S15Fixed16 {
    /// Create from raw i32 value
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// Encode a float, rounding half up
    pub fn from_f64(val: f64) -> Self {
        Self(encode_fixed(val, 65536.0, i32::MIN as f64, i32::MAX as f64) as i32)
    }

    /// Convert to f64
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / 65536.0
    }
}

/// u16Fixed16Number - unsigned 16.16 fixed point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct U16Fixed16(pub u32);

impl U16Fixed16 {
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn from_f64(val: f64) -> Self {
        Self(encode_fixed(val, 65536.0, 0.0, u32::MAX as f64) as u32)
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / 65536.0
    }
}

/// u8Fixed8Number - unsigned 8.8 fixed point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct U8Fixed8(pub u16);

impl U8Fixed8 {
    pub fn from_f64(val: f64) -> Self {
        Self(encode_fixed(val, 256.0, 0.0, u16::MAX as f64) as u16)
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / 256.0
    }
}

/// u1Fixed15Number - the 16-bit XYZ PCS encoding (0x8000 is 1.0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct U1Fixed15(pub u16);

impl U1Fixed15 {
    pub fn from_f64(val: f64) -> Self {
        Self(encode_fixed(val, 32768.0, 0.0, u16::MAX as f64) as u16)
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / 32768.0
    }
}

/// Normalize an 8-bit value to [0, 1]
#[inline]
pub fn u8_to_unit(v: u8) -> f64 {
    v as f64 / 255.0
}

/// Quantize a [0, 1] value to 8 bits, rounding half up
#[inline]
pub fn unit_to_u8(v: f64) -> u8 {
    encode_fixed(v, 255.0, 0.0, 255.0) as u8
}

/// Normalize a 16-bit value to [0, 1]
#[inline]
pub fn u16_to_unit(v: u16) -> f64 {
    v as f64 / 65535.0
}

/// Quantize a [0, 1] value to 16 bits, rounding half up
#[inline]
pub fn unit_to_u16(v: f64) -> u16 {
    encode_fixed(v, 65535.0, 0.0, 65535.0) as u16
}

/// XYZNumber - ICC XYZ value (3 × s15Fixed16)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct XyzNumber {
    pub x: S15Fixed16,
    pub y: S15Fixed16,
    pub z: S15Fixed16,
}

impl XyzNumber {
    /// Encode a float XYZ triple
    pub fn from_xyz(xyz: Xyz) -> Self {
        Self {
            x: S15Fixed16::from_f64(xyz.x),
            y: S15Fixed16::from_f64(xyz.y),
            z: S15Fixed16::from_f64(xyz.z),
        }
    }

    /// Convert to Xyz color type
    pub fn to_xyz(&self) -> Xyz {
        Xyz::new(self.x.to_f64(), self.y.to_f64(), self.z.to_f64())
    }
}

/// dateTimeNumber - ICC date/time (UTC)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateTimeNumber {
    pub year: u16,
    pub month: u16,
    pub day: u16,
    pub hour: u16,
    pub minute: u16,
    pub second: u16,
}

impl DateTimeNumber {
    /// Build from seconds since the Unix epoch
    pub fn from_unix_seconds(secs: u64) -> Self {
        let days = (secs / 86_400) as i64;
        let rem = secs % 86_400;

        // civil-from-days, proleptic Gregorian
        let z = days + 719_468;
        let era = z.div_euclid(146_097);
        let doe = z.rem_euclid(146_097);
        let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
        let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
        let mp = (5 * doy + 2) / 153;
        let day = doy - (153 * mp + 2) / 5 + 1;
        let month = if mp < 10 { mp + 3 } else { mp - 9 };
        let year = yoe + era * 400 + i64::from(month <= 2);

        Self {
            year: year.clamp(0, u16::MAX as i64) as u16,
            month: month as u16,
            day: day as u16,
            hour: (rem / 3600) as u16,
            minute: (rem % 3600 / 60) as u16,
            second: (rem % 60) as u16,
        }
    }

    /// Current UTC time; the epoch if the system clock is before 1970
    pub fn now() -> Self {
        let secs = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self::from_unix_seconds(secs)
    }
}

impl fmt::Display for DateTimeNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}
