//! ICC Profile Header
//!
//! The ICC profile header is exactly 128 bytes and contains basic profile information.
//! See ICC.1:2022 Section 7.2.

use std::fmt;

use super::error::IccError;
use super::io::{IccReader, IccWriter};
use super::types::{DateTimeNumber, XyzNumber};
use crate::color::D50;

/// Profile file signature - must be 'acsp' (0x61637370)
pub const PROFILE_SIGNATURE: u32 = 0x61637370;

/// Minimum valid profile size (header only)
pub const MIN_PROFILE_SIZE: usize = 128;

/// Byte ranges that are zeroed before computing the profile ID
pub const FLAGS_RANGE: std::ops::Range<usize> = 44..48;
pub const INTENT_RANGE: std::ops::Range<usize> = 64..68;
pub const PROFILE_ID_RANGE: std::ops::Range<usize> = 84..100;

/// ICC Profile Header (128 bytes)
#[derive(Debug, Clone, PartialEq)]
pub struct IccHeader {
    /// Profile size in bytes
    pub size: u32,
    /// Preferred CMM type signature
    pub cmm_type: u32,
    /// Profile version (major.minor.bugfix)
    pub version: ProfileVersion,
    /// Device class (display, input, output, etc.)
    pub device_class: ProfileClass,
    /// Color space of data (RGB, CMYK, etc.)
    pub color_space: ColorSpace,
    /// Profile connection space (XYZ or Lab)
    pub pcs: ColorSpace,
    /// Date and time profile was created
    pub creation_date: DateTimeNumber,
    /// Primary platform signature
    pub platform: u32,
    /// Profile flags
    pub flags: u32,
    /// Device manufacturer signature
    pub manufacturer: u32,
    /// Device model signature
    pub model: u32,
    /// Device attributes
    pub attributes: u64,
    /// Rendering intent as stored; out-of-range values are reported by validation
    pub rendering_intent: u32,
    /// PCS illuminant (should be D50)
    pub illuminant: XyzNumber,
    /// Profile creator signature
    pub creator: u32,
    /// Profile ID (MD5 hash, or zero)
    pub profile_id: [u8; 16],
    /// Bytes 100..128, kept verbatim
    pub reserved: [u8; 28],
}

impl IccHeader {
    /// Fresh v4.3 header with a D50 illuminant and the current date
    pub fn new(device_class: ProfileClass, color_space: ColorSpace, pcs: ColorSpace) -> Self {
        Self {
            size: MIN_PROFILE_SIZE as u32 + 4,
            cmm_type: 0,
            version: ProfileVersion::V4_3,
            device_class,
            color_space,
            pcs,
            creation_date: DateTimeNumber::now(),
            platform: 0,
            flags: 0,
            manufacturer: 0,
            model: 0,
            attributes: 0,
            rendering_intent: RenderingIntent::Perceptual.to_u32(),
            illuminant: XyzNumber::from_xyz(D50.xyz),
            creator: 0,
            profile_id: [0; 16],
            reserved: [0; 28],
        }
    }

    /// Read the 128-byte header at the reader's current position
    pub fn read(rd: &mut IccReader<'_>) -> Result<Self, IccError> {
        let available = rd.remaining() as usize;
        if available < MIN_PROFILE_SIZE {
            return Err(IccError::TooSmall {
                expected: MIN_PROFILE_SIZE,
                actual: available,
            });
        }

        let size = rd.read_u32()?;
        let cmm_type = rd.read_u32()?;
        let version = ProfileVersion::from_u32(rd.read_u32()?);
        let device_class = ProfileClass::from_u32(rd.read_u32()?)?;
        let color_space = ColorSpace::from_u32(rd.read_u32()?)?;
        let pcs = ColorSpace::from_u32(rd.read_u32()?)?;
        let creation_date = rd.read_datetime()?;

        let signature = rd.read_sig()?;
        if signature != PROFILE_SIGNATURE {
            return Err(IccError::InvalidSignature(signature));
        }

        Ok(Self {
            size,
            cmm_type,
            version,
            device_class,
            color_space,
            pcs,
            creation_date,
            platform: rd.read_u32()?,
            flags: rd.read_u32()?,
            manufacturer: rd.read_u32()?,
            model: rd.read_u32()?,
            attributes: rd.read_u64()?,
            rendering_intent: rd.read_u32()?,
            illuminant: rd.read_xyz()?,
            creator: rd.read_u32()?,
            profile_id: rd.read_array()?,
            reserved: rd.read_array()?,
        })
    }

    /// Write all 128 bytes
    pub fn write(&self, wr: &mut IccWriter<'_>) -> Result<(), IccError> {
        wr.write_u32(self.size)?;
        wr.write_u32(self.cmm_type)?;
        wr.write_u32(self.version.to_u32())?;
        wr.write_sig(self.device_class.to_u32())?;
        wr.write_sig(self.color_space.to_u32())?;
        wr.write_sig(self.pcs.to_u32())?;
        wr.write_datetime(&self.creation_date)?;
        wr.write_sig(PROFILE_SIGNATURE)?;
        wr.write_u32(self.platform)?;
        wr.write_u32(self.flags)?;
        wr.write_u32(self.manufacturer)?;
        wr.write_u32(self.model)?;
        wr.write_u64(self.attributes)?;
        wr.write_u32(self.rendering_intent)?;
        wr.write_xyz(&self.illuminant)?;
        wr.write_u32(self.creator)?;
        wr.write_bytes(&self.profile_id)?;
        wr.write_bytes(&self.reserved)
    }

    /// Check the declared size against the available data
    pub fn validate(&self, data_len: usize) -> Result<(), IccError> {
        if self.size as usize > data_len {
            return Err(IccError::SizeMismatch {
                header_size: self.size,
                actual_size: data_len,
            });
        }
        Ok(())
    }

    /// Decoded rendering intent, if in range
    pub fn intent(&self) -> Result<RenderingIntent, IccError> {
        RenderingIntent::from_u32(self.rendering_intent)
    }

    /// Check if this is a matrix/TRC profile class and space
    pub fn is_matrix_shaper(&self) -> bool {
        matches!(
            self.device_class,
            ProfileClass::Display | ProfileClass::Input | ProfileClass::Output
        ) && matches!(self.color_space, ColorSpace::Rgb | ColorSpace::Gray)
    }

    /// Whether the profile ID field holds anything
    pub fn has_profile_id(&self) -> bool {
        self.profile_id.iter().any(|&b| b != 0)
    }
}

/// ICC Profile Version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct ProfileVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl ProfileVersion {
    pub const V2_1: Self = Self::new(2, 1, 0);
    pub const V4_3: Self = Self::new(4, 3, 0);

    pub const fn new(major: u8, minor: u8, patch: u8) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Decode header bytes 8..12 (major, minor.bugfix nibbles, reserved)
    pub fn from_u32(raw: u32) -> Self {
        let b = raw.to_be_bytes();
        Self {
            major: b[0],
            minor: b[1] >> 4,
            patch: b[1] & 0x0F,
        }
    }

    pub fn to_u32(&self) -> u32 {
        u32::from_be_bytes([self.major, (self.minor << 4) | (self.patch & 0x0F), 0, 0])
    }

    /// Check if version is at least the specified version
    pub fn at_least(&self, major: u8, minor: u8) -> bool {
        self.major > major || (self.major == major && self.minor >= minor)
    }

    /// Check if this is a v4 profile
    pub fn is_v4(&self) -> bool {
        self.major == 4
    }

    /// Check if this is a v2 profile
    pub fn is_v2(&self) -> bool {
        self.major == 2
    }
}

impl fmt::Display for ProfileVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// ICC Profile Class (Device Class)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileClass {
    /// Input device (scanner, camera)
    Input,
    /// Display device (monitor)
    Display,
    /// Output device (printer)
    Output,
    /// Device link
    DeviceLink,
    /// Color space conversion
    ColorSpace,
    /// Abstract profile
    Abstract,
    /// Named color profile
    NamedColor,
}

impl ProfileClass {
    pub fn from_u32(val: u32) -> Result<Self, IccError> {
        match &val.to_be_bytes() {
            b"scnr" => Ok(Self::Input),
            b"mntr" => Ok(Self::Display),
            b"prtr" => Ok(Self::Output),
            b"link" => Ok(Self::DeviceLink),
            b"spac" => Ok(Self::ColorSpace),
            b"abst" => Ok(Self::Abstract),
            b"nmcl" => Ok(Self::NamedColor),
            _ => Err(IccError::InvalidProfileClass(val)),
        }
    }

    pub fn to_u32(&self) -> u32 {
        match self {
            Self::Input => u32::from_be_bytes(*b"scnr"),
            Self::Display => u32::from_be_bytes(*b"mntr"),
            Self::Output => u32::from_be_bytes(*b"prtr"),
            Self::DeviceLink => u32::from_be_bytes(*b"link"),
            Self::ColorSpace => u32::from_be_bytes(*b"spac"),
            Self::Abstract => u32::from_be_bytes(*b"abst"),
            Self::NamedColor => u32::from_be_bytes(*b"nmcl"),
        }
    }
}

/// ICC Color Space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    /// XYZ
    Xyz,
    /// Lab
    Lab,
    /// Luv
    Luv,
    /// YCbCr
    YCbCr,
    /// Yxy
    Yxy,
    /// RGB
    Rgb,
    /// Grayscale
    Gray,
    /// HSV
    Hsv,
    /// HLS
    Hls,
    /// CMYK
    Cmyk,
    /// CMY
    Cmy,
    /// 2 color
    Color2,
    /// 3 color
    Color3,
    /// 4 color
    Color4,
    /// 5 color
    Color5,
    /// 6 color
    Color6,
    /// 7 color
    Color7,
    /// 8 color
    Color8,
    /// 9 color
    Color9,
    /// 10 color
    Color10,
    /// 11 color
    Color11,
    /// 12 color
    Color12,
    /// 13 color
    Color13,
    /// 14 color
    Color14,
    /// 15 color
    Color15,
}

impl ColorSpace {
    pub fn from_u32(val: u32) -> Result<Self, IccError> {
        match &val.to_be_bytes() {
            b"XYZ " => Ok(Self::Xyz),
            b"Lab " => Ok(Self::Lab),
            b"Luv " => Ok(Self::Luv),
            b"YCbr" => Ok(Self::YCbCr),
            b"Yxy " => Ok(Self::Yxy),
            b"RGB " => Ok(Self::Rgb),
            b"GRAY" => Ok(Self::Gray),
            b"HSV " => Ok(Self::Hsv),
            b"HLS " => Ok(Self::Hls),
            b"CMYK" => Ok(Self::Cmyk),
            b"CMY " => Ok(Self::Cmy),
            b"2CLR" => Ok(Self::Color2),
            b"3CLR" => Ok(Self::Color3),
            b"4CLR" => Ok(Self::Color4),
            b"5CLR" => Ok(Self::Color5),
            b"6CLR" => Ok(Self::Color6),
            b"7CLR" => Ok(Self::Color7),
            b"8CLR" => Ok(Self::Color8),
            b"9CLR" => Ok(Self::Color9),
            b"ACLR" => Ok(Self::Color10),
            b"BCLR" => Ok(Self::Color11),
            b"CCLR" => Ok(Self::Color12),
            b"DCLR" => Ok(Self::Color13),
            b"ECLR" => Ok(Self::Color14),
            b"FCLR" => Ok(Self::Color15),
            _ => Err(IccError::InvalidColorSpace(val)),
        }
    }

    pub fn to_u32(&self) -> u32 {
        match self {
            Self::Xyz => u32::from_be_bytes(*b"XYZ "),
            Self::Lab => u32::from_be_bytes(*b"Lab "),
            Self::Luv => u32::from_be_bytes(*b"Luv "),
            Self::YCbCr => u32::from_be_bytes(*b"YCbr"),
            Self::Yxy => u32::from_be_bytes(*b"Yxy "),
            Self::Rgb => u32::from_be_bytes(*b"RGB "),
            Self::Gray => u32::from_be_bytes(*b"GRAY"),
            Self::Hsv => u32::from_be_bytes(*b"HSV "),
            Self::Hls => u32::from_be_bytes(*b"HLS "),
            Self::Cmyk => u32::from_be_bytes(*b"CMYK"),
            Self::Cmy => u32::from_be_bytes(*b"CMY "),
            Self::Color2 => u32::from_be_bytes(*b"2CLR"),
            Self::Color3 => u32::from_be_bytes(*b"3CLR"),
            Self::Color4 => u32::from_be_bytes(*b"4CLR"),
            Self::Color5 => u32::from_be_bytes(*b"5CLR"),
            Self::Color6 => u32::from_be_bytes(*b"6CLR"),
            Self::Color7 => u32::from_be_bytes(*b"7CLR"),
            Self::Color8 => u32::from_be_bytes(*b"8CLR"),
            Self::Color9 => u32::from_be_bytes(*b"9CLR"),
            Self::Color10 => u32::from_be_bytes(*b"ACLR"),
            Self::Color11 => u32::from_be_bytes(*b"BCLR"),
            Self::Color12 => u32::from_be_bytes(*b"CCLR"),
            Self::Color13 => u32::from_be_bytes(*b"DCLR"),
            Self::Color14 => u32::from_be_bytes(*b"ECLR"),
            Self::Color15 => u32::from_be_bytes(*b"FCLR"),
        }
    }

    /// Get number of channels for this color space
    pub fn channels(&self) -> usize {
        match self {
            Self::Gray => 1,
            Self::Color2 => 2,
            Self::Xyz
            | Self::Lab
            | Self::Luv
            | Self::YCbCr
            | Self::Yxy
            | Self::Rgb
            | Self::Hsv
            | Self::Hls
            | Self::Cmy
            | Self::Color3 => 3,
            Self::Cmyk | Self::Color4 => 4,
            Self::Color5 => 5,
            Self::Color6 => 6,
            Self::Color7 => 7,
            Self::Color8 => 8,
            Self::Color9 => 9,
            Self::Color10 => 10,
            Self::Color11 => 11,
            Self::Color12 => 12,
            Self::Color13 => 13,
            Self::Color14 => 14,
            Self::Color15 => 15,
        }
    }

    /// XYZ or Lab
    pub fn is_pcs(&self) -> bool {
        matches!(self, Self::Xyz | Self::Lab)
    }
}

/// ICC Rendering Intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderingIntent {
    /// Perceptual - best for photographs
    #[default]
    Perceptual,
    /// Relative colorimetric - preserves in-gamut colors
    RelativeColorimetric,
    /// Saturation - maintains saturation
    Saturation,
    /// Absolute colorimetric - preserves white point
    AbsoluteColorimetric,
}

impl RenderingIntent {
    pub fn from_u32(val: u32) -> Result<Self, IccError> {
        match val {
            0 => Ok(Self::Perceptual),
            1 => Ok(Self::RelativeColorimetric),
            2 => Ok(Self::Saturation),
            3 => Ok(Self::AbsoluteColorimetric),
            _ => Err(IccError::InvalidRenderingIntent(val)),
        }
    }

    pub fn to_u32(&self) -> u32 {
        match self {
            Self::Perceptual => 0,
            Self::RelativeColorimetric => 1,
            Self::Saturation => 2,
            Self::AbsoluteColorimetric => 3,
        }
    }
}
