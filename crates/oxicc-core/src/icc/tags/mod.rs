//! ICC Tag Types
//!
//! Every tag in a profile is an 8-byte type header (type signature plus a
//! reserved word) followed by a type-specific body. [`TagData`] is the closed
//! set of body types this crate understands, plus two escape hatches: an
//! application-registered [`CustomTag`] and raw [`TagData::Unknown`] bytes.

pub mod curves;
pub mod lut;
pub mod misc;
pub mod mpe;
pub mod named;
pub mod text;
pub mod xyz;

use std::any::Any;
use std::borrow::Cow;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

pub use curves::{CurveData, LutCurve, ParametricCurveData};
pub use lut::{Lut8Data, Lut16Data, Mbb, MbbMatrix, identity_table};
pub use misc::{Colorant, ColorantTableData, MeasurementData};
pub use mpe::{CurveSegment, MpeData, MpeElement, MpeElementKind, SegmentedCurve};
pub use named::{NamedColor, NamedColor2Data};
pub use text::{MlucData, MlucRecord, TextDescriptionData};
pub use xyz::XyzTagData;

use super::error::IccError;
use super::header::IccHeader;
use super::io::{IccReader, IccWriter};
use super::registry::TagRegistry;
use super::types::{
    DateTimeNumber, S15Fixed16, TagSignature, TypeSignature, U16Fixed16, signature_string,
};
use super::validate::ValidationReport;
use crate::color::Xyz;

/// Application-defined tag type
///
/// Register a factory producing it with
/// [`TagRegistry::register`](super::registry::TagRegistry::register); the
/// reader then calls [`read`](Self::read) on a fresh instance.
pub trait CustomTag: fmt::Debug {
    fn type_signature(&self) -> TypeSignature;

    /// Fill from a body of `size` bytes (after the 8-byte type header)
    fn read(&mut self, rd: &mut IccReader<'_>, size: usize) -> Result<(), IccError>;

    /// Write the body (the type header is written by the caller)
    fn write(&self, wr: &mut IccWriter<'_>) -> Result<(), IccError>;

    fn describe(&self) -> String {
        format!("custom tag type '{}'", self.type_signature())
    }

    fn validate(&self, _sig: TagSignature, _header: &IccHeader, _report: &mut ValidationReport) {}

    fn clone_box(&self) -> Box<dyn CustomTag>;

    fn as_any(&self) -> &dyn Any;
}

impl Clone for Box<dyn CustomTag> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Decoded tag body
#[derive(Debug, Clone)]
pub enum TagData {
    /// XYZ values
    Xyz(XyzTagData),
    /// Curve (TRC)
    Curve(CurveData),
    /// Parametric curve
    ParametricCurve(ParametricCurveData),
    /// Plain ASCII text
    Text(String),
    /// v2 profile description
    TextDescription(TextDescriptionData),
    /// Multi-localized Unicode
    MultiLocalizedUnicode(MlucData),
    /// LUT 8-bit
    Lut8(Lut8Data),
    /// LUT 16-bit
    Lut16(Lut16Data),
    /// LUT A to B
    LutAToB(Mbb),
    /// LUT B to A
    LutBToA(Mbb),
    /// Multi-process element pipeline
    MultiProcessElement(MpeData),
    /// s15Fixed16 array (e.g. the `chad` matrix)
    S15Fixed16Array(Vec<S15Fixed16>),
    /// u16Fixed16 array
    U16Fixed16Array(Vec<U16Fixed16>),
    /// Signature
    Signature(u32),
    /// Date and time
    DateTime(DateTimeNumber),
    /// Measurement conditions
    Measurement(MeasurementData),
    /// Colorant table
    ColorantTable(ColorantTableData),
    /// Named color list
    NamedColor2(NamedColor2Data),
    /// Application-registered type
    Custom(Box<dyn CustomTag>),
    /// Unknown type, body kept verbatim
    Unknown { type_sig: u32, data: Vec<u8> },
}

impl TagData {
    /// Empty body for a built-in type, ready for [`read`](Self::read)
    pub fn empty(sig: TypeSignature) -> Option<Self> {
        Some(match sig {
            TypeSignature::XYZ => TagData::Xyz(XyzTagData::default()),
            TypeSignature::CURVE => TagData::Curve(CurveData::default()),
            TypeSignature::PARA => TagData::ParametricCurve(ParametricCurveData::default()),
            TypeSignature::TEXT => TagData::Text(String::new()),
            TypeSignature::DESC => TagData::TextDescription(TextDescriptionData::default()),
            TypeSignature::MLUC => TagData::MultiLocalizedUnicode(MlucData::default()),
            TypeSignature::LUT8 => TagData::Lut8(Lut8Data {
                matrix: crate::math::Matrix3x3::identity(),
                input_tables: Vec::new(),
                clut: placeholder_clut()?,
                output_tables: Vec::new(),
            }),
            TypeSignature::LUT16 => TagData::Lut16(Lut16Data {
                matrix: crate::math::Matrix3x3::identity(),
                input_tables: Vec::new(),
                clut: placeholder_clut()?,
                output_tables: Vec::new(),
            }),
            TypeSignature::LUTA2B => TagData::LutAToB(Mbb::new(3, 3, false)),
            TypeSignature::LUTB2A => TagData::LutBToA(Mbb::new(3, 3, true)),
            TypeSignature::MPET => TagData::MultiProcessElement(MpeData::default()),
            TypeSignature::SF32 => TagData::S15Fixed16Array(Vec::new()),
            TypeSignature::UF32 => TagData::U16Fixed16Array(Vec::new()),
            TypeSignature::SIG => TagData::Signature(0),
            TypeSignature::DTIM => TagData::DateTime(DateTimeNumber::default()),
            TypeSignature::MEAS => TagData::Measurement(MeasurementData::default()),
            TypeSignature::CLRT => TagData::ColorantTable(ColorantTableData::default()),
            TypeSignature::NCL2 => TagData::NamedColor2(NamedColor2Data::default()),
            _ => return None,
        })
    }

    /// Type signature written in the tag header
    pub fn type_signature(&self) -> TypeSignature {
        match self {
            TagData::Xyz(_) => TypeSignature::XYZ,
            TagData::Curve(_) => TypeSignature::CURVE,
            TagData::ParametricCurve(_) => TypeSignature::PARA,
            TagData::Text(_) => TypeSignature::TEXT,
            TagData::TextDescription(_) => TypeSignature::DESC,
            TagData::MultiLocalizedUnicode(_) => TypeSignature::MLUC,
            TagData::Lut8(_) => TypeSignature::LUT8,
            TagData::Lut16(_) => TypeSignature::LUT16,
            TagData::LutAToB(_) => TypeSignature::LUTA2B,
            TagData::LutBToA(_) => TypeSignature::LUTB2A,
            TagData::MultiProcessElement(_) => TypeSignature::MPET,
            TagData::S15Fixed16Array(_) => TypeSignature::SF32,
            TagData::U16Fixed16Array(_) => TypeSignature::UF32,
            TagData::Signature(_) => TypeSignature::SIG,
            TagData::DateTime(_) => TypeSignature::DTIM,
            TagData::Measurement(_) => TypeSignature::MEAS,
            TagData::ColorantTable(_) => TypeSignature::CLRT,
            TagData::NamedColor2(_) => TypeSignature::NCL2,
            TagData::Custom(c) => c.type_signature(),
            TagData::Unknown { type_sig, .. } => TypeSignature(*type_sig),
        }
    }

    /// Fill from a body of `size` bytes; the reader sits just past the type header
    pub fn read(&mut self, rd: &mut IccReader<'_>, size: usize) -> Result<(), IccError> {
        match self {
            TagData::Xyz(v) => *v = XyzTagData::read(rd, size)?,
            TagData::Curve(v) => *v = CurveData::read(rd)?,
            TagData::ParametricCurve(v) => *v = ParametricCurveData::read(rd)?,
            TagData::Text(v) => *v = text::read_text(rd, size)?,
            TagData::TextDescription(v) => *v = TextDescriptionData::read(rd, size)?,
            TagData::MultiLocalizedUnicode(v) => *v = MlucData::read(rd, size)?,
            TagData::Lut8(v) => *v = Lut8Data::read(rd)?,
            TagData::Lut16(v) => *v = Lut16Data::read(rd)?,
            TagData::LutAToB(v) => *v = Mbb::read_mab(rd, size, false)?,
            TagData::LutBToA(v) => *v = Mbb::read_mab(rd, size, true)?,
            TagData::MultiProcessElement(v) => *v = MpeData::read(rd, size)?,
            TagData::S15Fixed16Array(_) | TagData::U16Fixed16Array(_) if size % 4 != 0 => {
                return Err(IccError::CorruptedData(format!(
                    "fixed-point array body of {} bytes is not a multiple of 4",
                    size
                )));
            }
            TagData::S15Fixed16Array(v) => {
                *v = (0..size / 4)
                    .map(|_| rd.read_s15f16())
                    .collect::<Result<_, _>>()?;
            }
            TagData::U16Fixed16Array(v) => {
                *v = (0..size / 4)
                    .map(|_| rd.read_u16f16())
                    .collect::<Result<_, _>>()?;
            }
            TagData::Signature(v) => *v = rd.read_sig()?,
            TagData::DateTime(v) => *v = rd.read_datetime()?,
            TagData::Measurement(v) => *v = MeasurementData::read(rd)?,
            TagData::ColorantTable(v) => *v = ColorantTableData::read(rd)?,
            TagData::NamedColor2(v) => *v = NamedColor2Data::read(rd)?,
            TagData::Custom(c) => c.read(rd, size)?,
            TagData::Unknown { data, .. } => *data = rd.read_bytes(size)?,
        }
        Ok(())
    }

    /// Write the body; the type header must already be written
    pub fn write(&self, wr: &mut IccWriter<'_>) -> Result<(), IccError> {
        match self {
            TagData::Xyz(v) => v.write(wr),
            TagData::Curve(v) => v.write(wr),
            TagData::ParametricCurve(v) => v.write(wr),
            TagData::Text(v) => text::write_text(wr, v),
            TagData::TextDescription(v) => v.write(wr),
            TagData::MultiLocalizedUnicode(v) => v.write(wr),
            TagData::Lut8(v) => v.write(wr),
            TagData::Lut16(v) => v.write(wr),
            TagData::LutAToB(v) | TagData::LutBToA(v) => v.write_mab(wr),
            TagData::MultiProcessElement(v) => v.write(wr),
            TagData::S15Fixed16Array(v) => v.iter().try_for_each(|&x| wr.write_s15f16(x)),
            TagData::U16Fixed16Array(v) => v.iter().try_for_each(|&x| wr.write_u16f16(x)),
            TagData::Signature(v) => wr.write_sig(*v),
            TagData::DateTime(v) => wr.write_datetime(v),
            TagData::Measurement(v) => v.write(wr),
            TagData::ColorantTable(v) => v.write(wr),
            TagData::NamedColor2(v) => v.write(wr),
            TagData::Custom(c) => c.write(wr),
            TagData::Unknown { data, .. } => wr.write_bytes(data),
        }
    }

    /// Human-readable dump of the body
    pub fn describe(&self) -> String {
        match self {
            TagData::Xyz(v) => v.describe(),
            TagData::Curve(v) => v.describe(),
            TagData::ParametricCurve(v) => v.describe(),
            TagData::Text(v) => v.clone(),
            TagData::TextDescription(v) => v.ascii.clone(),
            TagData::MultiLocalizedUnicode(v) => v.describe(),
            TagData::Lut8(v) => format!("lut8 {}", v.to_mbb(false).describe()),
            TagData::Lut16(v) => format!("lut16 {}", v.to_mbb(false).describe()),
            TagData::LutAToB(v) => format!("A to B {}", v.describe()),
            TagData::LutBToA(v) => format!("B to A {}", v.describe()),
            TagData::MultiProcessElement(v) => v.describe(),
            TagData::S15Fixed16Array(v) => {
                let values: Vec<String> = v.iter().map(|x| format!("{:.6}", x.to_f64())).collect();
                values.join(" ")
            }
            TagData::U16Fixed16Array(v) => {
                let values: Vec<String> = v.iter().map(|x| format!("{:.6}", x.to_f64())).collect();
                values.join(" ")
            }
            TagData::Signature(v) => format!("'{}'", signature_string(*v)),
            TagData::DateTime(v) => v.to_string(),
            TagData::Measurement(v) => v.describe(),
            TagData::ColorantTable(v) => v.describe(),
            TagData::NamedColor2(v) => v.describe(),
            TagData::Custom(c) => c.describe(),
            TagData::Unknown { type_sig, data } => format!(
                "unknown type '{}', {} bytes",
                signature_string(*type_sig),
                data.len()
            ),
        }
    }

    /// Type-internal consistency checks
    pub fn validate(&self, sig: TagSignature, header: &IccHeader, report: &mut ValidationReport) {
        let channels = header.color_space.channels();
        match self {
            TagData::Xyz(v) => v.validate(sig, report),
            TagData::Curve(v) => v.validate(Some(sig), report),
            TagData::ParametricCurve(v) => v.validate(Some(sig), report),
            TagData::Text(v) => {
                if !v.is_ascii() {
                    report.warning(Some(sig), "text tag holds non-ASCII characters");
                }
            }
            TagData::TextDescription(v) => {
                if v.ascii.is_empty() {
                    report.warning(Some(sig), "empty description");
                }
            }
            TagData::MultiLocalizedUnicode(v) => {
                if v.records.is_empty() {
                    report.warning(Some(sig), "localized text without records");
                }
            }
            TagData::Lut8(v) => v.to_mbb(false).validate(sig, report),
            TagData::Lut16(v) => v.to_mbb(false).validate(sig, report),
            TagData::LutAToB(v) | TagData::LutBToA(v) => v.validate(sig, report),
            TagData::MultiProcessElement(v) => v.validate(sig, report),
            TagData::S15Fixed16Array(v) => {
                if sig == TagSignature::CHAD && v.len() != 9 {
                    report.non_compliant(
                        Some(sig),
                        format!("adaptation matrix with {} values", v.len()),
                    );
                }
            }
            TagData::Measurement(v) => v.validate(sig, report),
            TagData::ColorantTable(v) => v.validate(sig, channels, report),
            TagData::NamedColor2(v) => v.validate(sig, channels, report),
            TagData::Custom(c) => c.validate(sig, header, report),
            TagData::Unknown { type_sig, .. } => report.warning(
                Some(sig),
                format!("unrecognized tag type '{}'", signature_string(*type_sig)),
            ),
            TagData::U16Fixed16Array(_) | TagData::Signature(_) | TagData::DateTime(_) => {}
        }
    }

    /// Get as XYZ data
    pub fn as_xyz(&self) -> Option<&XyzTagData> {
        match self {
            TagData::Xyz(data) => Some(data),
            _ => None,
        }
    }

    /// First XYZ value
    pub fn xyz_value(&self) -> Option<Xyz> {
        self.as_xyz().and_then(XyzTagData::to_xyz)
    }

    /// Get as curve data
    pub fn as_curve(&self) -> Option<&CurveData> {
        match self {
            TagData::Curve(data) => Some(data),
            _ => None,
        }
    }

    /// Get as parametric curve
    pub fn as_parametric_curve(&self) -> Option<&ParametricCurveData> {
        match self {
            TagData::ParametricCurve(data) => Some(data),
            _ => None,
        }
    }

    /// Either curve type as an embedded-curve value
    pub fn as_lut_curve(&self) -> Option<LutCurve> {
        match self {
            TagData::Curve(c) => Some(LutCurve::Curve(c.clone())),
            TagData::ParametricCurve(p) => Some(LutCurve::Parametric(p.clone())),
            _ => None,
        }
    }

    /// Text of `text`, `desc` or `mluc` (English preferred)
    pub fn as_text(&self) -> Option<&str> {
        match self {
            TagData::Text(s) => Some(s),
            TagData::TextDescription(d) => Some(&d.ascii),
            TagData::MultiLocalizedUnicode(m) => m.text(),
            _ => None,
        }
    }

    /// Any lut type in the common model
    ///
    /// The legacy types keep their matrix only when `input_is_xyz`.
    pub fn as_mbb(&self, input_is_xyz: bool) -> Option<Cow<'_, Mbb>> {
        match self {
            TagData::Lut8(l) => Some(Cow::Owned(l.to_mbb(input_is_xyz))),
            TagData::Lut16(l) => Some(Cow::Owned(l.to_mbb(input_is_xyz))),
            TagData::LutAToB(m) | TagData::LutBToA(m) => Some(Cow::Borrowed(m)),
            _ => None,
        }
    }

    pub fn as_mpe(&self) -> Option<&MpeData> {
        match self {
            TagData::MultiProcessElement(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_s15_array(&self) -> Option<&[S15Fixed16]> {
        match self {
            TagData::S15Fixed16Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_named_colors(&self) -> Option<&NamedColor2Data> {
        match self {
            TagData::NamedColor2(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_colorant_table(&self) -> Option<&ColorantTableData> {
        match self {
            TagData::ColorantTable(v) => Some(v),
            _ => None,
        }
    }

    /// Downcast a custom tag to its concrete type
    pub fn as_custom<T: CustomTag + 'static>(&self) -> Option<&T> {
        match self {
            TagData::Custom(c) => c.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, TagData::Unknown { .. })
    }
}

fn placeholder_clut() -> Option<crate::clut::Clut> {
    crate::clut::Clut::new(&[2], 1, crate::clut::ClutPrecision::U16).ok()
}

/// A tag: the reserved header word plus its decoded body
#[derive(Debug, Clone)]
pub struct Tag {
    pub reserved: u32,
    pub data: TagData,
}

/// A tag that several directory entries may point at
pub type SharedTag = Rc<RefCell<Tag>>;

impl Tag {
    pub fn new(data: TagData) -> Self {
        Self { reserved: 0, data }
    }

    pub fn shared(self) -> SharedTag {
        Rc::new(RefCell::new(self))
    }

    pub fn type_signature(&self) -> TypeSignature {
        self.data.type_signature()
    }

    /// Read a complete tag of `size` bytes; the body type comes from `registry`
    pub fn read(
        rd: &mut IccReader<'_>,
        size: usize,
        registry: &TagRegistry,
    ) -> Result<Self, IccError> {
        if size < 8 {
            return Err(IccError::CorruptedData(format!(
                "tag of {} bytes has no room for its type header",
                size
            )));
        }
        let type_sig = TypeSignature(rd.read_sig()?);
        let reserved = rd.read_u32()?;
        let mut data = registry.create(type_sig);
        data.read(rd, size - 8)?;
        Ok(Self { reserved, data })
    }

    /// Write the type header and body
    pub fn write(&self, wr: &mut IccWriter<'_>) -> Result<(), IccError> {
        wr.write_sig(self.type_signature().0)?;
        wr.write_u32(self.reserved)?;
        self.data.write(wr)
    }
}

impl From<TagData> for Tag {
    fn from(data: TagData) -> Self {
        Tag::new(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read_tag(bytes: &[u8]) -> Result<Tag, IccError> {
        let mut cur = Cursor::new(bytes.to_vec());
        let mut rd = IccReader::new(&mut cur)?;
        Tag::read(&mut rd, bytes.len(), TagRegistry::standard())
    }

    fn write_tag(tag: &Tag) -> Vec<u8> {
        let mut cur = Cursor::new(Vec::new());
        {
            let mut wr = IccWriter::new(&mut cur).unwrap();
            tag.write(&mut wr).unwrap();
        }
        cur.into_inner()
    }

    #[test]
    fn test_read_unknown_type() {
        let data = b"zzzz\0\0\0\x07abcd";
        let tag = read_tag(data).unwrap();
        assert!(tag.data.is_unknown());
        assert_eq!(tag.reserved, 7);
        assert_eq!(tag.type_signature(), TypeSignature::from_bytes(*b"zzzz"));
        // kept verbatim
        assert_eq!(write_tag(&tag), data);
    }

    #[test]
    fn test_tag_too_small() {
        assert!(read_tag(b"XYZ ").is_err());
    }

    #[test]
    fn test_sf32_chad() {
        let mut data = b"sf32\0\0\0\0".to_vec();
        for v in [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0] {
            data.extend_from_slice(&S15Fixed16::from_f64(v).0.to_be_bytes());
        }
        let tag = read_tag(&data).unwrap();
        assert_eq!(tag.data.as_s15_array().map(|v| v.len()), Some(9));
        assert_eq!(write_tag(&tag), data);
    }

    #[test]
    fn test_fixed_arrays_reject_partial_values() {
        for sig in [b"sf32", b"uf32"] {
            let mut data = sig.to_vec();
            data.extend_from_slice(&[0; 4]);
            data.extend_from_slice(&0x0001_0000u32.to_be_bytes());
            data.extend_from_slice(&[0xAB, 0xCD]);
            assert!(
                matches!(read_tag(&data), Err(IccError::CorruptedData(_))),
                "{:?}",
                sig
            );
            data.extend_from_slice(&[0, 0]);
            assert_eq!(write_tag(&read_tag(&data).unwrap()), data);
        }
    }

    #[test]
    fn test_text_accessor() {
        let tag = read_tag(b"text\0\0\0\0Copyright\0").unwrap();
        assert_eq!(tag.data.as_text(), Some("Copyright"));
        let mluc = TagData::MultiLocalizedUnicode(MlucData::english("Display"));
        assert_eq!(mluc.as_text(), Some("Display"));
    }

    #[test]
    fn test_every_builtin_has_an_empty_body() {
        for sig in [
            TypeSignature::XYZ,
            TypeSignature::CURVE,
            TypeSignature::PARA,
            TypeSignature::TEXT,
            TypeSignature::DESC,
            TypeSignature::MLUC,
            TypeSignature::LUT8,
            TypeSignature::LUT16,
            TypeSignature::LUTA2B,
            TypeSignature::LUTB2A,
            TypeSignature::MPET,
            TypeSignature::SF32,
            TypeSignature::UF32,
            TypeSignature::SIG,
            TypeSignature::DTIM,
            TypeSignature::MEAS,
            TypeSignature::CLRT,
            TypeSignature::NCL2,
        ] {
            let empty = TagData::empty(sig).unwrap();
            assert_eq!(empty.type_signature(), sig);
        }
    }

    #[test]
    fn test_as_mbb_for_legacy_lut() {
        let lut = Lut16Data::new(
            vec![identity_table(2); 3],
            crate::clut::Clut::new(&[2, 2, 2], 3, crate::clut::ClutPrecision::U16).unwrap(),
            vec![identity_table(2); 3],
        )
        .unwrap();
        let data = TagData::Lut16(lut);
        let mbb = data.as_mbb(true).unwrap();
        assert!(mbb.input_matrix);
        assert!(mbb.matrix.is_some());
        assert!(data.as_mbb(false).unwrap().matrix.is_none());
    }

    #[test]
    fn test_shared_tag_identity() {
        let a = Tag::new(TagData::Signature(0x6D6E7472)).shared();
        let b = Rc::clone(&a);
        assert!(Rc::ptr_eq(&a, &b));
        b.borrow_mut().reserved = 1;
        assert_eq!(a.borrow().reserved, 1);
    }
}
