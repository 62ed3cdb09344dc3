//! XYZ Tag Type
//!
//! The XYZType contains an array of XYZ values. Used for colorant tags,
//! white point, black point, etc.
//!
//! See ICC.1:2022 Section 10.31

use crate::color::Xyz;
use crate::icc::error::IccError;
use crate::icc::io::{IccReader, IccWriter};
use crate::icc::types::{TagSignature, XyzNumber};
use crate::icc::validate::ValidationReport;

/// XYZ tag data - contains one or more XYZ values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XyzTagData {
    /// XYZ values stored in the tag
    pub values: Vec<XyzNumber>,
}

impl XyzTagData {
    pub fn new(xyz: Xyz) -> Self {
        Self {
            values: vec![XyzNumber::from_xyz(xyz)],
        }
    }

    /// Read `size` payload bytes; trailing bytes short of a full triple are skipped
    pub fn read(rd: &mut IccReader<'_>, size: usize) -> Result<Self, IccError> {
        let count = size / 12;
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(rd.read_xyz()?);
        }
        rd.skip((size % 12) as u64)?;
        Ok(Self { values })
    }

    pub fn write(&self, wr: &mut IccWriter<'_>) -> Result<(), IccError> {
        for v in &self.values {
            wr.write_xyz(v)?;
        }
        Ok(())
    }

    /// Get the first XYZ value (most common case)
    pub fn first(&self) -> Option<&XyzNumber> {
        self.values.first()
    }

    /// Get the first XYZ value as Xyz color type
    pub fn to_xyz(&self) -> Option<Xyz> {
        self.values.first().map(|v| v.to_xyz())
    }

    pub(crate) fn validate(&self, sig: TagSignature, report: &mut ValidationReport) {
        if self.values.is_empty() {
            report.non_compliant(Some(sig), "XYZ tag holds no values");
            return;
        }
        if self.values.len() > 1 && is_single_valued(sig) {
            report.warning(
                Some(sig),
                format!("{} XYZ values where one is expected", self.values.len()),
            );
        }
        for v in &self.values {
            let xyz = v.to_xyz();
            if xyz.x < 0.0 || xyz.y < 0.0 || xyz.z < 0.0 {
                report.warning(Some(sig), format!("negative XYZ value {:?}", xyz));
            }
        }
    }

    pub fn describe(&self) -> String {
        self.values
            .iter()
            .map(|v| {
                let xyz = v.to_xyz();
                format!("X={:.4} Y={:.4} Z={:.4}", xyz.x, xyz.y, xyz.z)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn is_single_valued(sig: TagSignature) -> bool {
    matches!(
        sig,
        TagSignature::MEDIA_WHITE
            | TagSignature::MEDIA_BLACK
            | TagSignature::RED_COLORANT
            | TagSignature::GREEN_COLORANT
            | TagSignature::BLUE_COLORANT
            | TagSignature::LUMINANCE
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icc::types::S15Fixed16;
    use std::io::Cursor;

    fn read_payload(bytes: &[u8]) -> Result<XyzTagData, IccError> {
        let mut cur = Cursor::new(bytes.to_vec());
        let mut rd = IccReader::new(&mut cur)?;
        XyzTagData::read(&mut rd, bytes.len())
    }

    #[test]
    fn test_read_xyz_tag() {
        // D50 white point
        let data = [
            0x00, 0x00, 0xF6, 0xD6, // X
            0x00, 0x01, 0x00, 0x00, // Y
            0x00, 0x00, 0xD3, 0x2D, // Z
        ];

        let xyz = read_payload(&data).unwrap();
        assert_eq!(xyz.values.len(), 1);
        let v = xyz.to_xyz().unwrap();
        assert!((v.x - 0.9642).abs() < 0.0001);
        assert!((v.y - 1.0).abs() < 0.0001);
        assert!((v.z - 0.8249).abs() < 0.0001);
    }

    #[test]
    fn test_read_multiple_xyz() {
        let mut data = Vec::new();
        for raw in [0x10000i32, 0x8000, 0x4000, 0x2000, 0x1000, 0x0800] {
            data.extend_from_slice(&raw.to_be_bytes());
        }

        let xyz = read_payload(&data).unwrap();
        assert_eq!(xyz.values.len(), 2);
        assert_eq!(xyz.values[1].x, S15Fixed16(0x2000));
    }

    #[test]
    fn test_write_matches_read() {
        let tag = XyzTagData::new(Xyz::new(0.9642, 1.0, 0.8249));
        let mut cur = Cursor::new(Vec::new());
        {
            let mut wr = IccWriter::new(&mut cur).unwrap();
            tag.write(&mut wr).unwrap();
        }
        let bytes = cur.into_inner();
        assert_eq!(
            bytes,
            [0, 0, 0xF6, 0xD6, 0, 1, 0, 0, 0, 0, 0xD3, 0x2D]
        );
        assert_eq!(read_payload(&bytes).unwrap(), tag);
    }

    #[test]
    fn test_validate_multi_value_white() {
        let tag = XyzTagData {
            values: vec![XyzNumber::default(); 2],
        };
        let mut report = ValidationReport::default();
        tag.validate(TagSignature::MEDIA_WHITE, &mut report);
        assert_eq!(report.findings().len(), 1);
    }
}
