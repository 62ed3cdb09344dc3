//! Named color list (`ncl2`)
//!
//! See ICC.1:2022 Section 10.17

use crate::icc::error::IccError;
use crate::icc::io::{IccReader, IccWriter};
use crate::icc::types::TagSignature;
use crate::icc::validate::ValidationReport;

use super::text::{read_fixed_ascii, write_fixed_ascii};

/// One entry of a named color list
#[derive(Debug, Clone, PartialEq)]
pub struct NamedColor {
    /// Root name; the full name is prefix + root + suffix
    pub root: String,
    /// 16-bit PCS value
    pub pcs: [u16; 3],
    /// Device coordinates, one per device channel (may be empty)
    pub device: Vec<u16>,
}

/// Named color list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedColor2Data {
    pub vendor_flags: u32,
    pub prefix: String,
    pub suffix: String,
    pub device_coords: u32,
    pub colors: Vec<NamedColor>,
}

impl NamedColor2Data {
    pub fn read(rd: &mut IccReader<'_>) -> Result<Self, IccError> {
        let vendor_flags = rd.read_u32()?;
        let count = rd.read_u32()? as u64;
        let device_coords = rd.read_u32()?;
        let prefix = read_fixed_ascii(rd, 32)?;
        let suffix = read_fixed_ascii(rd, 32)?;

        let entry_size = 32 + 6 + 2 * device_coords as u64;
        if count.saturating_mul(entry_size) > rd.remaining() {
            return Err(IccError::CorruptedData(format!(
                "named color list of {} entries does not fit",
                count
            )));
        }

        let mut colors = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let root = read_fixed_ascii(rd, 32)?;
            let pcs = [rd.read_u16()?, rd.read_u16()?, rd.read_u16()?];
            let device = rd.read_u16_vec(device_coords as usize)?;
            colors.push(NamedColor { root, pcs, device });
        }
        Ok(Self {
            vendor_flags,
            prefix,
            suffix,
            device_coords,
            colors,
        })
    }

    pub fn write(&self, wr: &mut IccWriter<'_>) -> Result<(), IccError> {
        wr.write_u32(self.vendor_flags)?;
        wr.write_u32(self.colors.len() as u32)?;
        wr.write_u32(self.device_coords)?;
        write_fixed_ascii(wr, &self.prefix, 32)?;
        write_fixed_ascii(wr, &self.suffix, 32)?;
        for color in &self.colors {
            write_fixed_ascii(wr, &color.root, 32)?;
            wr.write_u16_slice(&color.pcs)?;
            for i in 0..self.device_coords as usize {
                wr.write_u16(color.device.get(i).copied().unwrap_or(0))?;
            }
        }
        Ok(())
    }

    /// Full name of entry `index`
    pub fn name(&self, index: usize) -> Option<String> {
        self.colors
            .get(index)
            .map(|c| format!("{}{}{}", self.prefix, c.root, self.suffix))
    }

    /// Index of the entry whose full name matches `name`
    pub fn find(&self, name: &str) -> Option<usize> {
        (0..self.colors.len()).find(|&i| self.name(i).as_deref() == Some(name))
    }

    pub(crate) fn validate(&self, sig: TagSignature, channels: usize, report: &mut ValidationReport) {
        if self.device_coords != 0 && channels != 0 && self.device_coords as usize != channels {
            report.non_compliant(
                Some(sig),
                format!(
                    "{} device coordinates for a {}-channel color space",
                    self.device_coords, channels
                ),
            );
        }
        if self
            .colors
            .iter()
            .any(|c| c.device.len() != self.device_coords as usize)
        {
            report.warning(Some(sig), "entry with a mismatched device coordinate count");
        }
    }

    pub fn describe(&self) -> String {
        let mut out = format!(
            "{} named colors, {} device coordinates",
            self.colors.len(),
            self.device_coords
        );
        for i in 0..self.colors.len().min(16) {
            if let Some(name) = self.name(i) {
                out.push('\n');
                out.push_str(&name);
            }
        }
        out
    }
}
