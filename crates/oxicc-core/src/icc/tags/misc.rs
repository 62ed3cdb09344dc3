//! Small fixed-layout tag types: measurement (`meas`) and colorant table (`clrt`)
//!
//! See ICC.1:2022 Sections 10.4 (clrt) and 10.14 (meas)

use crate::color::white_point::from_measurement_code;
use crate::icc::error::IccError;
use crate::icc::io::{IccReader, IccWriter};
use crate::icc::pcs::{PcsEncoding, decode_pcs16};
use crate::icc::types::{TagSignature, U16Fixed16, XyzNumber};
use crate::icc::validate::ValidationReport;

use super::text::{read_fixed_ascii, write_fixed_ascii};

/// Measurement conditions (`meas`)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasurementData {
    /// 0 unknown, 1 CIE 1931, 2 CIE 1964
    pub observer: u32,
    pub backing: XyzNumber,
    /// 0 unknown, 1 0/45 or 45/0, 2 0/d or d/0
    pub geometry: u32,
    pub flare: U16Fixed16,
    /// Standard illuminant code (1 = D50, 2 = D65, ...)
    pub illuminant: u32,
}

impl MeasurementData {
    pub fn read(rd: &mut IccReader<'_>) -> Result<Self, IccError> {
        Ok(Self {
            observer: rd.read_u32()?,
            backing: rd.read_xyz()?,
            geometry: rd.read_u32()?,
            flare: rd.read_u16f16()?,
            illuminant: rd.read_u32()?,
        })
    }

    pub fn write(&self, wr: &mut IccWriter<'_>) -> Result<(), IccError> {
        wr.write_u32(self.observer)?;
        wr.write_xyz(&self.backing)?;
        wr.write_u32(self.geometry)?;
        wr.write_u16f16(self.flare)?;
        wr.write_u32(self.illuminant)
    }

    pub(crate) fn validate(&self, sig: TagSignature, report: &mut ValidationReport) {
        if self.observer > 2 {
            report.non_compliant(Some(sig), format!("unknown observer {}", self.observer));
        }
        if self.geometry > 2 {
            report.non_compliant(Some(sig), format!("unknown geometry {}", self.geometry));
        }
        if self.illuminant > 8 {
            report.non_compliant(
                Some(sig),
                format!("unknown standard illuminant {}", self.illuminant),
            );
        }
    }

    pub fn describe(&self) -> String {
        let backing = self.backing.to_xyz();
        let illuminant = match from_measurement_code(self.illuminant) {
            Some(wp) => wp.name.to_string(),
            None => self.illuminant.to_string(),
        };
        format!(
            "observer {}, geometry {}, flare {:.3}, illuminant {}, backing X={:.4} Y={:.4} Z={:.4}",
            self.observer,
            self.geometry,
            self.flare.to_f64(),
            illuminant,
            backing.x,
            backing.y,
            backing.z
        )
    }
}

/// One named colorant with its PCS value
#[derive(Debug, Clone, PartialEq)]
pub struct Colorant {
    pub name: String,
    /// 16-bit PCS value in the profile's PCS encoding
    pub pcs: [u16; 3],
}

/// Colorant table (`clrt`)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorantTableData {
    pub colorants: Vec<Colorant>,
}

impl ColorantTableData {
    pub fn read(rd: &mut IccReader<'_>) -> Result<Self, IccError> {
        let count = rd.read_u32()? as usize;
        // 38 bytes per entry
        if count as u64 * 38 > rd.remaining() {
            return Err(IccError::CorruptedData(format!(
                "colorant table lists {} entries",
                count
            )));
        }
        let mut colorants = Vec::with_capacity(count);
        for _ in 0..count {
            let name = read_fixed_ascii(rd, 32)?;
            let pcs = [rd.read_u16()?, rd.read_u16()?, rd.read_u16()?];
            colorants.push(Colorant { name, pcs });
        }
        Ok(Self { colorants })
    }

    pub fn write(&self, wr: &mut IccWriter<'_>) -> Result<(), IccError> {
        wr.write_u32(self.colorants.len() as u32)?;
        for c in &self.colorants {
            write_fixed_ascii(wr, &c.name, 32)?;
            wr.write_u16_slice(&c.pcs)?;
        }
        Ok(())
    }

    pub(crate) fn validate(&self, sig: TagSignature, channels: usize, report: &mut ValidationReport) {
        if sig == TagSignature::COLORANT_TABLE && channels != 0 && self.colorants.len() != channels {
            report.warning(
                Some(sig),
                format!(
                    "{} colorants for a {}-channel color space",
                    self.colorants.len(),
                    channels
                ),
            );
        }
    }

    pub fn describe(&self) -> String {
        self.colorants
            .iter()
            .map(|c| format!("{}: {:04X} {:04X} {:04X}", c.name, c.pcs[0], c.pcs[1], c.pcs[2]))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// PCS value of colorant `index` in actual units
    pub fn pcs_value(&self, index: usize, encoding: PcsEncoding) -> Option<[f64; 3]> {
        self.colorants.get(index).map(|c| decode_pcs16(c.pcs, encoding))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode<F>(f: F) -> Vec<u8>
    where
        F: FnOnce(&mut IccWriter<'_>) -> Result<(), IccError>,
    {
        let mut cur = Cursor::new(Vec::new());
        {
            let mut wr = IccWriter::new(&mut cur).unwrap();
            f(&mut wr).unwrap();
        }
        cur.into_inner()
    }

    #[test]
    fn test_measurement_layout() {
        let meas = MeasurementData {
            observer: 1,
            backing: XyzNumber::default(),
            geometry: 1,
            flare: U16Fixed16::from_f64(0.01),
            illuminant: 1,
        };
        let bytes = encode(|wr| meas.write(wr));
        assert_eq!(bytes.len(), 28);

        let mut cur = Cursor::new(bytes);
        let mut rd = IccReader::new(&mut cur).unwrap();
        assert_eq!(MeasurementData::read(&mut rd).unwrap(), meas);
    }

    #[test]
    fn test_measurement_validation() {
        let meas = MeasurementData {
            observer: 7,
            ..Default::default()
        };
        let mut report = ValidationReport::default();
        meas.validate(TagSignature::MEASUREMENT, &mut report);
        assert_eq!(report.findings().len(), 1);
    }

    #[test]
    fn test_colorant_table() {
        let table = ColorantTableData {
            colorants: vec![
                Colorant {
                    name: "Red".to_string(),
                    pcs: [0x8000, 0xC000, 0xB000],
                },
                Colorant {
                    name: "Green".to_string(),
                    pcs: [0x8800, 0x4000, 0xB000],
                },
            ],
        };
        let bytes = encode(|wr| table.write(wr));
        assert_eq!(bytes.len(), 4 + 2 * 38);

        let mut cur = Cursor::new(bytes);
        let mut rd = IccReader::new(&mut cur).unwrap();
        let back = ColorantTableData::read(&mut rd).unwrap();
        assert_eq!(back, table);
        assert!(back.describe().starts_with("Red: 8000 C000 B000"));
        let lab = back.pcs_value(0, PcsEncoding::LabV4).unwrap();
        assert!((lab[0] - 50.0).abs() < 0.01);
    }

    #[test]
    fn test_colorant_table_count_overflow() {
        let mut cur = Cursor::new(vec![0xFF, 0xFF, 0xFF, 0xFF]);
        let mut rd = IccReader::new(&mut cur).unwrap();
        assert!(ColorantTableData::read(&mut rd).is_err());
    }
}
