//! LUT-based Tag Types
//!
//! All four lut tag types share one evaluation model, [`Mbb`]: optional
//! curve sets, a 3×3 matrix with offsets and a CLUT, applied in a fixed order.
//!
//! - lutAToBType (mAB): A curves → CLUT → M curves → Matrix → B curves
//! - lutBToAType (mBA): B curves → Matrix → M curves → CLUT → A curves
//! - lut8Type (mft1) and lut16Type (mft2) are the legacy forms, read into
//!   their own structs and converted with `to_mbb`
//!
//! See ICC.1:2022 Sections 10.10-10.13

use crate::clut::{Clut, ClutPrecision, Interpolation, MAX_CLUT_INPUTS};
use crate::icc::error::IccError;
use crate::icc::io::{IccReader, IccWriter};
use crate::icc::types::{S15Fixed16, TagSignature};
use crate::icc::validate::ValidationReport;
use crate::math::Matrix3x3;

use super::curves::{CurveData, LutCurve};

/// Largest channel count a lut stage may carry
pub const MAX_CHANNELS: usize = MAX_CLUT_INPUTS;

/// 3×3 matrix plus offset column
#[derive(Debug, Clone, PartialEq)]
pub struct MbbMatrix {
    pub matrix: Matrix3x3,
    pub offset: [f64; 3],
}

impl MbbMatrix {
    pub fn new(matrix: Matrix3x3) -> Self {
        Self {
            matrix,
            offset: [0.0; 3],
        }
    }

    /// Nine row-major s15Fixed16 values, then three offsets when `with_offset`
    fn read(rd: &mut IccReader<'_>, with_offset: bool) -> Result<Self, IccError> {
        let mut m = [0.0; 9];
        for v in m.iter_mut() {
            *v = rd.read_s15f16()?.to_f64();
        }
        let mut offset = [0.0; 3];
        if with_offset {
            for v in offset.iter_mut() {
                *v = rd.read_s15f16()?.to_f64();
            }
        }
        Ok(Self {
            matrix: Matrix3x3::from_row_major(&m),
            offset,
        })
    }

    fn write(&self, wr: &mut IccWriter<'_>, with_offset: bool) -> Result<(), IccError> {
        for v in self.matrix.to_row_major() {
            wr.write_s15f16(S15Fixed16::from_f64(v))?;
        }
        if with_offset {
            for v in self.offset {
                wr.write_s15f16(S15Fixed16::from_f64(v))?;
            }
        }
        Ok(())
    }

    #[inline]
    fn apply(&self, v: &mut [f64]) {
        let r = self.matrix.multiply_vec([v[0], v[1], v[2]]);
        for i in 0..3 {
            v[i] = r[i] + self.offset[i];
        }
    }
}

/// Multi-block lut: the common model behind mft1, mft2, mAB and mBA
#[derive(Debug, Clone, PartialEq)]
pub struct Mbb {
    pub input_channels: usize,
    pub output_channels: usize,
    /// Stage order: `false` is A → CLUT → M → Matrix → B (mAB),
    /// `true` is B → Matrix → M → CLUT → A (mBA and the legacy types)
    pub input_matrix: bool,
    pub b_curves: Option<Vec<LutCurve>>,
    pub matrix: Option<MbbMatrix>,
    pub m_curves: Option<Vec<LutCurve>>,
    pub clut: Option<Clut>,
    pub a_curves: Option<Vec<LutCurve>>,
}

impl Mbb {
    /// Empty lut; with no stages it passes values through
    pub fn new(input_channels: usize, output_channels: usize, input_matrix: bool) -> Self {
        Self {
            input_channels,
            output_channels,
            input_matrix,
            b_curves: None,
            matrix: None,
            m_curves: None,
            clut: None,
            a_curves: None,
        }
    }

    /// Channel counts of the (A, M, B) curve sets
    fn curve_counts(&self) -> (usize, usize, usize) {
        if self.input_matrix {
            (self.output_channels, self.input_channels, self.input_channels)
        } else {
            (self.input_channels, self.output_channels, self.output_channels)
        }
    }

    /// Read an `mAB `/`mBA ` body of `size` bytes
    ///
    /// Element offsets are relative to the tag start, 8 bytes before the
    /// reader's position.
    pub fn read_mab(
        rd: &mut IccReader<'_>,
        size: usize,
        input_matrix: bool,
    ) -> Result<Self, IccError> {
        let tag_start = rd.tell().saturating_sub(8);
        let end = rd.tell() + size as u64;
        let input_channels = rd.read_u8()? as usize;
        let output_channels = rd.read_u8()? as usize;
        rd.skip(2)?;
        check_channel_count(input_channels, output_channels)?;

        let mut offsets = [0u64; 5];
        for off in offsets.iter_mut() {
            *off = rd.read_u32()? as u64;
            if *off != 0 && tag_start + *off >= end {
                return Err(IccError::CorruptedData(format!(
                    "lut element offset {} outside tag",
                    off
                )));
            }
        }
        let [b_off, matrix_off, m_off, clut_off, a_off] = offsets;

        let mut mbb = Self::new(input_channels, output_channels, input_matrix);
        let (a_count, m_count, b_count) = mbb.curve_counts();

        if b_off != 0 {
            rd.seek(tag_start + b_off)?;
            mbb.b_curves = Some(read_curve_set(rd, b_count, tag_start)?);
        }
        if matrix_off != 0 {
            rd.seek(tag_start + matrix_off)?;
            mbb.matrix = Some(MbbMatrix::read(rd, true)?);
        }
        if m_off != 0 {
            rd.seek(tag_start + m_off)?;
            mbb.m_curves = Some(read_curve_set(rd, m_count, tag_start)?);
        }
        if clut_off != 0 {
            rd.seek(tag_start + clut_off)?;
            mbb.clut = Some(Clut::read_mab(rd, input_channels, output_channels)?);
        }
        if a_off != 0 {
            rd.seek(tag_start + a_off)?;
            mbb.a_curves = Some(read_curve_set(rd, a_count, tag_start)?);
        }

        rd.seek(end)?;
        Ok(mbb)
    }

    /// Write an `mAB `/`mBA ` body
    ///
    /// Stages go out in the order B, matrix, M, CLUT, A, each on a 4-byte
    /// boundary; their offsets are patched into the header afterwards.
    pub fn write_mab(&self, wr: &mut IccWriter<'_>) -> Result<(), IccError> {
        self.check_channels()?;
        if let Some(clut) = &self.clut {
            if !clut.fits_mab() {
                return Err(IccError::InvalidClut(
                    "grid too large for an mAB/mBA CLUT".to_string(),
                ));
            }
        }

        let tag_start = wr.tell().saturating_sub(8);
        wr.write_u8(self.input_channels as u8)?;
        wr.write_u8(self.output_channels as u8)?;
        wr.write_u16(0)?;
        let table = wr.tell();
        for _ in 0..5 {
            wr.write_u32(0)?;
        }

        let mut offsets = [0u32; 5];
        if let Some(curves) = &self.b_curves {
            offsets[0] = stage_offset(wr, tag_start)?;
            write_curve_set(wr, curves)?;
        }
        if let Some(matrix) = &self.matrix {
            offsets[1] = stage_offset(wr, tag_start)?;
            matrix.write(wr, true)?;
        }
        if let Some(curves) = &self.m_curves {
            offsets[2] = stage_offset(wr, tag_start)?;
            write_curve_set(wr, curves)?;
        }
        if let Some(clut) = &self.clut {
            offsets[3] = stage_offset(wr, tag_start)?;
            clut.write_mab(wr)?;
        }
        if let Some(curves) = &self.a_curves {
            offsets[4] = stage_offset(wr, tag_start)?;
            write_curve_set(wr, curves)?;
        }

        for (i, &off) in offsets.iter().enumerate() {
            if off != 0 {
                wr.patch_u32(table + 4 * i as u64, off)?;
            }
        }
        Ok(())
    }

    /// Verify that every stage agrees with its neighbours on channel count
    pub fn check_channels(&self) -> Result<(), IccError> {
        check_channel_count(self.input_channels, self.output_channels)?;
        let (a_count, m_count, b_count) = self.curve_counts();

        let sets = [
            ("A curves", &self.a_curves, a_count),
            ("M curves", &self.m_curves, m_count),
            ("B curves", &self.b_curves, b_count),
        ];
        for (stage, curves, expected) in sets {
            if let Some(c) = curves {
                if c.len() != expected {
                    return Err(IccError::ChannelMismatch {
                        stage,
                        expected,
                        actual: c.len(),
                    });
                }
            }
        }

        if self.matrix.is_some() {
            let side = if self.input_matrix {
                self.input_channels
            } else {
                self.output_channels
            };
            if side != 3 {
                return Err(IccError::ChannelMismatch {
                    stage: "matrix",
                    expected: 3,
                    actual: side,
                });
            }
        }

        match &self.clut {
            Some(clut) => {
                if clut.input_channels() != self.input_channels {
                    return Err(IccError::ChannelMismatch {
                        stage: "CLUT input",
                        expected: self.input_channels,
                        actual: clut.input_channels(),
                    });
                }
                if clut.output_channels() != self.output_channels {
                    return Err(IccError::ChannelMismatch {
                        stage: "CLUT output",
                        expected: self.output_channels,
                        actual: clut.output_channels(),
                    });
                }
            }
            None if self.input_channels != self.output_channels => {
                return Err(IccError::ChannelMismatch {
                    stage: "lut without CLUT",
                    expected: self.input_channels,
                    actual: self.output_channels,
                });
            }
            None => {}
        }
        Ok(())
    }

    /// Evaluate one pixel of normalized values
    ///
    /// `src` must hold `input_channels` values and `dst` room for
    /// `output_channels`. Assumes [`check_channels`](Self::check_channels) passed.
    pub fn apply(&self, dst: &mut [f64], src: &[f64], interpolation: Interpolation) {
        let n_in = self.input_channels.min(MAX_CHANNELS);
        let n_out = self.output_channels.min(MAX_CHANNELS);
        let mut a = [0.0f64; MAX_CHANNELS];
        let mut b = [0.0f64; MAX_CHANNELS];
        for (d, s) in a.iter_mut().zip(src).take(n_in) {
            *d = *s;
        }

        let result: &[f64] = if self.input_matrix {
            apply_curves(self.b_curves.as_deref(), &mut a[..n_in]);
            if let Some(m) = &self.matrix {
                m.apply(&mut a);
            }
            apply_curves(self.m_curves.as_deref(), &mut a[..n_in]);
            let cur = match &self.clut {
                Some(clut) => {
                    clut.interpolate(&mut b[..n_out], &a[..n_in], interpolation);
                    &mut b
                }
                None => &mut a,
            };
            apply_curves(self.a_curves.as_deref(), &mut cur[..n_out]);
            &cur[..]
        } else {
            apply_curves(self.a_curves.as_deref(), &mut a[..n_in]);
            let cur = match &self.clut {
                Some(clut) => {
                    clut.interpolate(&mut b[..n_out], &a[..n_in], interpolation);
                    &mut b
                }
                None => &mut a,
            };
            apply_curves(self.m_curves.as_deref(), &mut cur[..n_out]);
            if let Some(m) = &self.matrix {
                m.apply(cur);
            }
            apply_curves(self.b_curves.as_deref(), &mut cur[..n_out]);
            &cur[..]
        };

        for (d, s) in dst.iter_mut().zip(&result[..n_out]) {
            *d = *s;
        }
    }

    pub(crate) fn validate(&self, sig: TagSignature, report: &mut ValidationReport) {
        if let Err(e) = self.check_channels() {
            report.critical(Some(sig), e.to_string());
            return;
        }
        for curves in [&self.a_curves, &self.m_curves, &self.b_curves]
            .into_iter()
            .flatten()
        {
            for c in curves {
                c.validate(Some(sig), report);
            }
        }
    }

    pub fn describe(&self) -> String {
        let mut stages = Vec::new();
        let curves = |name: &str, c: &Option<Vec<LutCurve>>| {
            c.as_ref().map(|c| {
                let identity = c.iter().all(LutCurve::is_identity);
                format!(
                    "{} curves ({}{})",
                    name,
                    c.len(),
                    if identity { ", identity" } else { "" }
                )
            })
        };
        let matrix = self.matrix.as_ref().map(|_| "matrix".to_string());
        let clut = self.clut.as_ref().map(|c| {
            let grid: Vec<String> = c.grid_points().iter().map(|g| g.to_string()).collect();
            format!("CLUT {} ({:?})", grid.join("x"), c.precision())
        });
        if self.input_matrix {
            stages.extend([
                curves("B", &self.b_curves),
                matrix,
                curves("M", &self.m_curves),
                clut,
                curves("A", &self.a_curves),
            ]);
        } else {
            stages.extend([
                curves("A", &self.a_curves),
                clut,
                curves("M", &self.m_curves),
                matrix,
                curves("B", &self.b_curves),
            ]);
        }
        let stages: Vec<String> = stages.into_iter().flatten().collect();
        format!(
            "{} -> {} channels: {}",
            self.input_channels,
            self.output_channels,
            if stages.is_empty() {
                "pass-through".to_string()
            } else {
                stages.join(" -> ")
            }
        )
    }
}

#[inline]
fn apply_curves(curves: Option<&[LutCurve]>, values: &mut [f64]) {
    let Some(curves) = curves else { return };
    if curves.iter().all(LutCurve::is_identity) {
        return;
    }
    for (v, c) in values.iter_mut().zip(curves) {
        *v = c.eval(*v);
    }
}

fn check_channel_count(input: usize, output: usize) -> Result<(), IccError> {
    for (what, n) in [("input", input), ("output", output)] {
        if n == 0 || n > MAX_CHANNELS {
            return Err(IccError::CorruptedData(format!(
                "lut with {} {} channels",
                n, what
            )));
        }
    }
    Ok(())
}

fn read_curve_set(
    rd: &mut IccReader<'_>,
    count: usize,
    tag_start: u64,
) -> Result<Vec<LutCurve>, IccError> {
    let mut curves = Vec::with_capacity(count);
    for _ in 0..count {
        curves.push(LutCurve::read(rd)?);
        // Curves are padded to 4 bytes; the last one may omit its padding
        let rel = rd.tell() - tag_start;
        let padded = rd.tell() + (4 - rel % 4) % 4;
        rd.seek(padded.min(rd.len()))?;
    }
    Ok(curves)
}

fn write_curve_set(wr: &mut IccWriter<'_>, curves: &[LutCurve]) -> Result<(), IccError> {
    for c in curves {
        c.write(wr)?;
        wr.align(4)?;
    }
    Ok(())
}

fn stage_offset(wr: &mut IccWriter<'_>, tag_start: u64) -> Result<u32, IccError> {
    wr.align(4)?;
    u32::try_from(wr.tell() - tag_start)
        .map_err(|_| IccError::CorruptedData("lut tag exceeds 4 GiB".to_string()))
}

/// 8-bit legacy lut (mft1)
#[derive(Debug, Clone, PartialEq)]
pub struct Lut8Data {
    /// Applied only when the input space is XYZ
    pub matrix: Matrix3x3,
    /// One 256-entry table per input channel
    pub input_tables: Vec<Vec<u8>>,
    pub clut: Clut,
    /// One 256-entry table per output channel
    pub output_tables: Vec<Vec<u8>>,
}

impl Lut8Data {
    pub fn input_channels(&self) -> usize {
        self.input_tables.len()
    }

    pub fn output_channels(&self) -> usize {
        self.output_tables.len()
    }

    pub fn read(rd: &mut IccReader<'_>) -> Result<Self, IccError> {
        let input_channels = rd.read_u8()? as usize;
        let output_channels = rd.read_u8()? as usize;
        let grid_points = rd.read_u8()? as usize;
        rd.skip(1)?;
        check_channel_count(input_channels, output_channels)?;
        let matrix = MbbMatrix::read(rd, false)?.matrix;

        let mut input_tables = Vec::with_capacity(input_channels);
        for _ in 0..input_channels {
            input_tables.push(rd.read_bytes(256)?);
        }
        let clut = Clut::read_values(
            rd,
            &vec![grid_points; input_channels],
            output_channels,
            ClutPrecision::U8,
        )?;
        let mut output_tables = Vec::with_capacity(output_channels);
        for _ in 0..output_channels {
            output_tables.push(rd.read_bytes(256)?);
        }

        Ok(Self {
            matrix,
            input_tables,
            clut,
            output_tables,
        })
    }

    pub fn write(&self, wr: &mut IccWriter<'_>) -> Result<(), IccError> {
        let grid = uniform_grid(&self.clut)?;
        wr.write_u8(self.input_channels() as u8)?;
        wr.write_u8(self.output_channels() as u8)?;
        wr.write_u8(grid)?;
        wr.write_u8(0)?;
        MbbMatrix::new(self.matrix).write(wr, false)?;
        for t in &self.input_tables {
            wr.write_bytes(&fixed_table(t, 256))?;
        }
        self.clut.write_values(wr, ClutPrecision::U8)?;
        for t in &self.output_tables {
            wr.write_bytes(&fixed_table(t, 256))?;
        }
        Ok(())
    }

    /// Convert to the common model; tables widen to 16 bits (×257)
    pub fn to_mbb(&self, input_is_xyz: bool) -> Mbb {
        let widen = |t: &Vec<u8>| -> LutCurve {
            CurveData::Table(t.iter().map(|&v| v as u16 * 257).collect()).into()
        };
        let mut clut = self.clut.clone();
        clut.set_precision(ClutPrecision::U16);
        Mbb {
            input_channels: self.input_channels(),
            output_channels: self.output_channels(),
            input_matrix: true,
            b_curves: Some(self.input_tables.iter().map(widen).collect()),
            matrix: input_is_xyz.then(|| MbbMatrix::new(self.matrix)),
            m_curves: None,
            clut: Some(clut),
            a_curves: Some(self.output_tables.iter().map(widen).collect()),
        }
    }
}

/// 16-bit legacy lut (mft2)
#[derive(Debug, Clone, PartialEq)]
pub struct Lut16Data {
    /// Applied only when the input space is XYZ
    pub matrix: Matrix3x3,
    pub input_tables: Vec<Vec<u16>>,
    pub clut: Clut,
    pub output_tables: Vec<Vec<u16>>,
}

impl Lut16Data {
    pub fn new(
        input_tables: Vec<Vec<u16>>,
        clut: Clut,
        output_tables: Vec<Vec<u16>>,
    ) -> Result<Self, IccError> {
        let lut = Self {
            matrix: Matrix3x3::identity(),
            input_tables,
            clut,
            output_tables,
        };
        lut.to_mbb(false).check_channels()?;
        Ok(lut)
    }

    pub fn input_channels(&self) -> usize {
        self.input_tables.len()
    }

    pub fn output_channels(&self) -> usize {
        self.output_tables.len()
    }

    pub fn read(rd: &mut IccReader<'_>) -> Result<Self, IccError> {
        let input_channels = rd.read_u8()? as usize;
        let output_channels = rd.read_u8()? as usize;
        let grid_points = rd.read_u8()? as usize;
        rd.skip(1)?;
        check_channel_count(input_channels, output_channels)?;
        let matrix = MbbMatrix::read(rd, false)?.matrix;

        let input_entries = rd.read_u16()? as usize;
        let output_entries = rd.read_u16()? as usize;
        if input_entries < 2 || output_entries < 2 {
            return Err(IccError::CorruptedData(format!(
                "lut16 tables of {} and {} entries",
                input_entries, output_entries
            )));
        }

        let mut input_tables = Vec::with_capacity(input_channels);
        for _ in 0..input_channels {
            input_tables.push(rd.read_u16_vec(input_entries)?);
        }
        let clut = Clut::read_values(
            rd,
            &vec![grid_points; input_channels],
            output_channels,
            ClutPrecision::U16,
        )?;
        let mut output_tables = Vec::with_capacity(output_channels);
        for _ in 0..output_channels {
            output_tables.push(rd.read_u16_vec(output_entries)?);
        }

        Ok(Self {
            matrix,
            input_tables,
            clut,
            output_tables,
        })
    }

    pub fn write(&self, wr: &mut IccWriter<'_>) -> Result<(), IccError> {
        let grid = uniform_grid(&self.clut)?;
        let input_entries = self.input_tables.first().map_or(2, Vec::len);
        let output_entries = self.output_tables.first().map_or(2, Vec::len);
        if self.input_tables.iter().any(|t| t.len() != input_entries)
            || self.output_tables.iter().any(|t| t.len() != output_entries)
        {
            return Err(IccError::CorruptedData(
                "lut16 tables of differing lengths".to_string(),
            ));
        }

        wr.write_u8(self.input_channels() as u8)?;
        wr.write_u8(self.output_channels() as u8)?;
        wr.write_u8(grid)?;
        wr.write_u8(0)?;
        MbbMatrix::new(self.matrix).write(wr, false)?;
        wr.write_u16(input_entries as u16)?;
        wr.write_u16(output_entries as u16)?;
        for t in &self.input_tables {
            wr.write_u16_slice(t)?;
        }
        self.clut.write_values(wr, ClutPrecision::U16)?;
        for t in &self.output_tables {
            wr.write_u16_slice(t)?;
        }
        Ok(())
    }

    /// Convert to the common model
    pub fn to_mbb(&self, input_is_xyz: bool) -> Mbb {
        let table = |t: &Vec<u16>| -> LutCurve { CurveData::Table(t.clone()).into() };
        Mbb {
            input_channels: self.input_channels(),
            output_channels: self.output_channels(),
            input_matrix: true,
            b_curves: Some(self.input_tables.iter().map(table).collect()),
            matrix: input_is_xyz.then(|| MbbMatrix::new(self.matrix)),
            m_curves: None,
            clut: Some(self.clut.clone()),
            a_curves: Some(self.output_tables.iter().map(table).collect()),
        }
    }
}

/// Linear ramp of `entries` 16-bit values
pub fn identity_table(entries: usize) -> Vec<u16> {
    let max = entries.saturating_sub(1).max(1) as f64;
    (0..entries)
        .map(|i| (i as f64 / max * 65535.0 + 0.5).floor() as u16)
        .collect()
}

/// Legacy luts use the same grid size on every dimension
fn uniform_grid(clut: &Clut) -> Result<u8, IccError> {
    let grid = clut.grid_points();
    let first = grid.first().copied().unwrap_or(0);
    if grid.iter().any(|&g| g != first) {
        return Err(IccError::InvalidClut(
            "legacy lut needs a uniform grid".to_string(),
        ));
    }
    u8::try_from(first).map_err(|_| IccError::InvalidClut(format!("grid of {} points", first)))
}

fn fixed_table(t: &[u8], len: usize) -> Vec<u8> {
    let mut out = t.to_vec();
    out.resize(len, t.last().copied().unwrap_or(0));
    out
}
