//! Multi-process element tag (`mpet`)
//!
//! A float pipeline of curve-set, matrix and CLUT elements, used by the
//! D2Bx/B2Dx tags. Values flow unbounded between elements; only CLUT lookups
//! clamp their inputs.
//!
//! See ICC.1:2022 Sections 10.16 and 11

use crate::clut::{Clut, Interpolation};
use crate::icc::error::IccError;
use crate::icc::io::{IccReader, IccWriter};
use crate::icc::types::{TagSignature, signature_string};
use crate::icc::validate::ValidationReport;

use super::lut::MAX_CHANNELS;

const SIG_CURVE_SET: u32 = u32::from_be_bytes(*b"cvst");
const SIG_MATRIX: u32 = u32::from_be_bytes(*b"matf");
const SIG_CLUT: u32 = u32::from_be_bytes(*b"clut");
const SIG_SEGMENTED_CURVE: u32 = u32::from_be_bytes(*b"curf");
const SIG_FORMULA_SEGMENT: u32 = u32::from_be_bytes(*b"parf");
const SIG_SAMPLED_SEGMENT: u32 = u32::from_be_bytes(*b"samf");

/// One piece of a segmented curve
#[derive(Debug, Clone, PartialEq)]
pub enum CurveSegment {
    /// Function type 0: (a·X + b)^γ + c, params γ a b c
    /// Function type 1: a·log10(b·X^γ + c) + d, params γ a b c d
    /// Function type 2: a·b^(c·X + d) + e, params a b c d e
    Formula { function_type: u16, params: Vec<f32> },
    /// Samples at equal steps; the point at the segment start comes from the
    /// previous segment
    Sampled(Vec<f32>),
}

impl CurveSegment {
    fn read(rd: &mut IccReader<'_>) -> Result<Self, IccError> {
        let sig = rd.read_sig()?;
        rd.skip(4)?;
        match sig {
            SIG_FORMULA_SEGMENT => {
                let function_type = rd.read_u16()?;
                rd.skip(2)?;
                let count = match function_type {
                    0 => 4,
                    1 | 2 => 5,
                    t => {
                        return Err(IccError::InvalidCurve(format!(
                            "formula segment of type {}",
                            t
                        )));
                    }
                };
                Ok(CurveSegment::Formula {
                    function_type,
                    params: rd.read_f32_vec(count)?,
                })
            }
            SIG_SAMPLED_SEGMENT => {
                let count = rd.read_u32()? as usize;
                Ok(CurveSegment::Sampled(rd.read_f32_vec(count)?))
            }
            other => Err(IccError::InvalidCurve(format!(
                "curve segment '{}'",
                signature_string(other)
            ))),
        }
    }

    fn write(&self, wr: &mut IccWriter<'_>) -> Result<(), IccError> {
        match self {
            CurveSegment::Formula {
                function_type,
                params,
            } => {
                wr.write_sig(SIG_FORMULA_SEGMENT)?;
                wr.write_u32(0)?;
                wr.write_u16(*function_type)?;
                wr.write_u16(0)?;
                wr.write_f32_slice(params)
            }
            CurveSegment::Sampled(samples) => {
                wr.write_sig(SIG_SAMPLED_SEGMENT)?;
                wr.write_u32(0)?;
                wr.write_u32(samples.len() as u32)?;
                wr.write_f32_slice(samples)
            }
        }
    }

    fn eval_formula(function_type: u16, p: &[f32], x: f64) -> f64 {
        let p = |i: usize| p.get(i).copied().unwrap_or(0.0) as f64;
        match function_type {
            0 => (p(1) * x + p(2)).max(0.0).powf(p(0)) + p(3),
            1 => p(1) * (p(2) * x.max(0.0).powf(p(0)) + p(3)).max(f64::MIN_POSITIVE).log10() + p(4),
            2 => p(0) * p(1).powf(p(2) * x + p(3)) + p(4),
            _ => x,
        }
    }
}

/// Segmented curve (`curf`): breakpoints split the real line into segments
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentedCurve {
    /// Segment i covers (breakpoints[i-1], breakpoints[i]]
    pub breakpoints: Vec<f32>,
    pub segments: Vec<CurveSegment>,
}

impl SegmentedCurve {
    fn read(rd: &mut IccReader<'_>) -> Result<Self, IccError> {
        let sig = rd.read_sig()?;
        if sig != SIG_SEGMENTED_CURVE {
            return Err(IccError::InvalidCurve(format!(
                "expected segmented curve, found '{}'",
                signature_string(sig)
            )));
        }
        rd.skip(4)?;
        let count = rd.read_u16()? as usize;
        rd.skip(2)?;
        if count == 0 {
            return Err(IccError::InvalidCurve(
                "segmented curve without segments".to_string(),
            ));
        }
        let breakpoints = rd.read_f32_vec(count - 1)?;
        let mut segments = Vec::with_capacity(count);
        for _ in 0..count {
            segments.push(CurveSegment::read(rd)?);
        }
        Ok(Self {
            breakpoints,
            segments,
        })
    }

    fn write(&self, wr: &mut IccWriter<'_>) -> Result<(), IccError> {
        wr.write_sig(SIG_SEGMENTED_CURVE)?;
        wr.write_u32(0)?;
        wr.write_u16(self.segments.len() as u16)?;
        wr.write_u16(0)?;
        wr.write_f32_slice(&self.breakpoints)?;
        for s in &self.segments {
            s.write(wr)?;
        }
        Ok(())
    }

    /// Evaluate at `x`
    pub fn eval(&self, x: f64) -> f64 {
        let idx = self
            .breakpoints
            .iter()
            .position(|&b| x <= b as f64)
            .unwrap_or(self.breakpoints.len())
            .min(self.segments.len().saturating_sub(1));
        self.eval_segment(idx, x)
    }

    fn eval_segment(&self, idx: usize, x: f64) -> f64 {
        match &self.segments[idx] {
            CurveSegment::Formula {
                function_type,
                params,
            } => CurveSegment::eval_formula(*function_type, params, x),
            CurveSegment::Sampled(samples) => {
                if samples.is_empty() {
                    return x;
                }
                // Sampled segments need finite bounds, so never the first one
                let (Some(&start), Some(&end)) = (
                    idx.checked_sub(1).and_then(|i| self.breakpoints.get(i)),
                    self.breakpoints.get(idx),
                ) else {
                    return samples[0] as f64;
                };
                let (start, end) = (start as f64, end as f64);
                let first = self.eval_segment(idx - 1, start);
                let n = samples.len();
                let pos = if end > start {
                    ((x - start) / (end - start) * n as f64).clamp(0.0, n as f64)
                } else {
                    n as f64
                };
                let i = (pos.floor() as usize).min(n - 1);
                let frac = pos - i as f64;
                let lo = if i == 0 { first } else { samples[i - 1] as f64 };
                let hi = samples[i] as f64;
                lo + frac * (hi - lo)
            }
        }
    }
}

/// Kind-specific body of a processing element
#[derive(Debug, Clone, PartialEq)]
pub enum MpeElementKind {
    /// One segmented curve per channel
    CurveSet(Vec<SegmentedCurve>),
    /// Row-major output×input coefficients, then one offset per output
    Matrix { matrix: Vec<f32>, offsets: Vec<f32> },
    /// Float CLUT
    Clut(Clut),
    /// Element type this library does not evaluate; kept as raw bytes
    Unknown { sig: u32, data: Vec<u8> },
}

/// One processing element with its channel counts
#[derive(Debug, Clone, PartialEq)]
pub struct MpeElement {
    pub input_channels: usize,
    pub output_channels: usize,
    pub kind: MpeElementKind,
}

impl MpeElement {
    pub fn curve_set(curves: Vec<SegmentedCurve>) -> Self {
        Self {
            input_channels: curves.len(),
            output_channels: curves.len(),
            kind: MpeElementKind::CurveSet(curves),
        }
    }

    pub fn matrix(input_channels: usize, matrix: Vec<f32>, offsets: Vec<f32>) -> Self {
        Self {
            input_channels,
            output_channels: offsets.len(),
            kind: MpeElementKind::Matrix { matrix, offsets },
        }
    }

    pub fn clut(clut: Clut) -> Self {
        Self {
            input_channels: clut.input_channels(),
            output_channels: clut.output_channels(),
            kind: MpeElementKind::Clut(clut),
        }
    }

    fn signature(&self) -> u32 {
        match &self.kind {
            MpeElementKind::CurveSet(_) => SIG_CURVE_SET,
            MpeElementKind::Matrix { .. } => SIG_MATRIX,
            MpeElementKind::Clut(_) => SIG_CLUT,
            MpeElementKind::Unknown { sig, .. } => *sig,
        }
    }

    /// Read an element of `size` bytes starting at its signature
    fn read(rd: &mut IccReader<'_>, size: usize) -> Result<Self, IccError> {
        let start = rd.tell();
        let sig = rd.read_sig()?;
        rd.skip(4)?;
        let input_channels = rd.read_u16()? as usize;
        let output_channels = rd.read_u16()? as usize;

        let kind = match sig {
            SIG_CURVE_SET => {
                if input_channels != output_channels {
                    return Err(IccError::ChannelMismatch {
                        stage: "curve set element",
                        expected: input_channels,
                        actual: output_channels,
                    });
                }
                // Position table of (offset, size) pairs relative to the element
                let mut positions = Vec::with_capacity(input_channels);
                for _ in 0..input_channels {
                    positions.push((rd.read_u32()? as u64, rd.read_u32()?));
                }
                let mut curves = Vec::with_capacity(input_channels);
                for (offset, _) in positions {
                    rd.seek(start + offset)?;
                    curves.push(SegmentedCurve::read(rd)?);
                }
                MpeElementKind::CurveSet(curves)
            }
            SIG_MATRIX => {
                let matrix = rd.read_f32_vec(input_channels * output_channels)?;
                let offsets = rd.read_f32_vec(output_channels)?;
                MpeElementKind::Matrix { matrix, offsets }
            }
            SIG_CLUT => {
                MpeElementKind::Clut(Clut::read_float(rd, input_channels, output_channels)?)
            }
            _ => MpeElementKind::Unknown {
                sig,
                data: rd.read_bytes(size.saturating_sub(12))?,
            },
        };
        Ok(Self {
            input_channels,
            output_channels,
            kind,
        })
    }

    fn write(&self, wr: &mut IccWriter<'_>) -> Result<(), IccError> {
        let start = wr.tell();
        wr.write_sig(self.signature())?;
        wr.write_u32(0)?;
        wr.write_u16(self.input_channels as u16)?;
        wr.write_u16(self.output_channels as u16)?;

        match &self.kind {
            MpeElementKind::CurveSet(curves) => {
                let table = wr.tell();
                for _ in curves {
                    wr.write_u32(0)?;
                    wr.write_u32(0)?;
                }
                for (i, curve) in curves.iter().enumerate() {
                    wr.align(4)?;
                    let at = wr.tell();
                    curve.write(wr)?;
                    let entry = table + 8 * i as u64;
                    wr.patch_u32(entry, (at - start) as u32)?;
                    wr.patch_u32(entry + 4, (wr.tell() - at) as u32)?;
                }
                Ok(())
            }
            MpeElementKind::Matrix { matrix, offsets } => {
                wr.write_f32_slice(matrix)?;
                wr.write_f32_slice(offsets)
            }
            MpeElementKind::Clut(clut) => clut.write_float(wr),
            MpeElementKind::Unknown { data, .. } => wr.write_bytes(data),
        }
    }

    fn check(&self) -> Result<(), IccError> {
        if self.input_channels == 0
            || self.output_channels == 0
            || self.input_channels > MAX_CHANNELS
            || self.output_channels > MAX_CHANNELS
        {
            return Err(IccError::CorruptedData(format!(
                "element with {} inputs and {} outputs",
                self.input_channels, self.output_channels
            )));
        }
        let mismatch = |stage, expected, actual| IccError::ChannelMismatch {
            stage,
            expected,
            actual,
        };
        match &self.kind {
            MpeElementKind::CurveSet(curves) if curves.len() != self.input_channels => {
                Err(mismatch("curve set element", self.input_channels, curves.len()))
            }
            MpeElementKind::Matrix { matrix, offsets }
                if matrix.len() != self.input_channels * self.output_channels
                    || offsets.len() != self.output_channels =>
            {
                Err(mismatch(
                    "matrix element",
                    self.input_channels * self.output_channels,
                    matrix.len(),
                ))
            }
            MpeElementKind::Clut(clut)
                if clut.input_channels() != self.input_channels
                    || clut.output_channels() != self.output_channels =>
            {
                Err(mismatch(
                    "CLUT element",
                    self.input_channels,
                    clut.input_channels(),
                ))
            }
            _ => Ok(()),
        }
    }

    fn apply(&self, dst: &mut [f64], src: &[f64], interpolation: Interpolation) {
        match &self.kind {
            MpeElementKind::CurveSet(curves) => {
                for ((d, s), c) in dst.iter_mut().zip(src).zip(curves) {
                    *d = c.eval(*s);
                }
            }
            MpeElementKind::Matrix { matrix, offsets } => {
                let n_in = self.input_channels;
                for (o, d) in dst.iter_mut().take(self.output_channels).enumerate() {
                    let row = &matrix[o * n_in..(o + 1) * n_in];
                    *d = row
                        .iter()
                        .zip(src)
                        .map(|(&m, &s)| m as f64 * s)
                        .sum::<f64>()
                        + offsets[o] as f64;
                }
            }
            MpeElementKind::Clut(clut) => clut.interpolate(dst, src, interpolation),
            MpeElementKind::Unknown { .. } => {
                // Pass through what lines up, zero the rest
                for (i, d) in dst.iter_mut().take(self.output_channels).enumerate() {
                    *d = src.get(i).copied().unwrap_or(0.0);
                }
            }
        }
    }

    pub fn describe(&self) -> String {
        let what = match &self.kind {
            MpeElementKind::CurveSet(c) => format!("curve set of {}", c.len()),
            MpeElementKind::Matrix { .. } => "matrix".to_string(),
            MpeElementKind::Clut(c) => {
                let grid: Vec<String> = c.grid_points().iter().map(|g| g.to_string()).collect();
                format!("CLUT {}", grid.join("x"))
            }
            MpeElementKind::Unknown { sig, data } => {
                format!("unknown '{}' ({} bytes)", signature_string(*sig), data.len())
            }
        };
        format!(
            "{} ({} -> {})",
            what, self.input_channels, self.output_channels
        )
    }
}

/// Multi-process element tag body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MpeData {
    pub input_channels: usize,
    pub output_channels: usize,
    pub elements: Vec<MpeElement>,
}

impl MpeData {
    pub fn new(input_channels: usize, output_channels: usize) -> Self {
        Self {
            input_channels,
            output_channels,
            elements: Vec::new(),
        }
    }

    /// Read an `mpet` body of `size` bytes
    ///
    /// The position table holds (offset, size) pairs relative to the tag
    /// start, 8 bytes before the reader's position.
    pub fn read(rd: &mut IccReader<'_>, size: usize) -> Result<Self, IccError> {
        let tag_start = rd.tell().saturating_sub(8);
        let end = rd.tell() + size as u64;
        let input_channels = rd.read_u16()? as usize;
        let output_channels = rd.read_u16()? as usize;
        let count = rd.read_u32()? as u64;
        if count == 0 || count * 8 > end.saturating_sub(rd.tell()) {
            return Err(IccError::CorruptedData(format!(
                "multi-process element tag with {} elements",
                count
            )));
        }

        let mut positions = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let offset = rd.read_u32()? as u64;
            let size = rd.read_u32()? as u64;
            if tag_start + offset + size > end {
                return Err(IccError::CorruptedData(
                    "processing element outside tag".to_string(),
                ));
            }
            positions.push((offset, size as usize));
        }

        let mut elements = Vec::with_capacity(positions.len());
        for (offset, size) in positions {
            rd.seek(tag_start + offset)?;
            elements.push(MpeElement::read(rd, size)?);
        }
        rd.seek(end)?;

        let mpe = Self {
            input_channels,
            output_channels,
            elements,
        };
        mpe.check_channels()?;
        Ok(mpe)
    }

    pub fn write(&self, wr: &mut IccWriter<'_>) -> Result<(), IccError> {
        self.check_channels()?;
        let tag_start = wr.tell().saturating_sub(8);
        wr.write_u16(self.input_channels as u16)?;
        wr.write_u16(self.output_channels as u16)?;
        wr.write_u32(self.elements.len() as u32)?;
        let table = wr.tell();
        for _ in &self.elements {
            wr.write_u32(0)?;
            wr.write_u32(0)?;
        }
        for (i, element) in self.elements.iter().enumerate() {
            wr.align(4)?;
            let at = wr.tell();
            element.write(wr)?;
            let entry = table + 8 * i as u64;
            wr.patch_u32(entry, (at - tag_start) as u32)?;
            wr.patch_u32(entry + 4, (wr.tell() - at) as u32)?;
        }
        Ok(())
    }

    /// Element chain must connect the declared input and output counts
    pub fn check_channels(&self) -> Result<(), IccError> {
        if self.elements.is_empty() {
            return Err(IccError::CorruptedData(
                "multi-process element tag without elements".to_string(),
            ));
        }
        let mut channels = self.input_channels;
        for element in &self.elements {
            element.check()?;
            if element.input_channels != channels {
                return Err(IccError::ChannelMismatch {
                    stage: "processing element",
                    expected: channels,
                    actual: element.input_channels,
                });
            }
            channels = element.output_channels;
        }
        if channels != self.output_channels {
            return Err(IccError::ChannelMismatch {
                stage: "multi-process element output",
                expected: self.output_channels,
                actual: channels,
            });
        }
        Ok(())
    }

    /// Evaluate one pixel, alternating between two scratch buffers
    pub fn apply(&self, dst: &mut [f64], src: &[f64], interpolation: Interpolation) {
        let mut bufs = [[0.0f64; MAX_CHANNELS]; 2];
        let n_in = self.input_channels.min(MAX_CHANNELS);
        for (d, s) in bufs[0].iter_mut().zip(src).take(n_in) {
            *d = *s;
        }

        let mut cur = 0;
        for element in &self.elements {
            let [a, b] = &mut bufs;
            let (from, to) = if cur == 0 { (a, b) } else { (b, a) };
            element.apply(to, &from[..element.input_channels.min(MAX_CHANNELS)], interpolation);
            cur ^= 1;
        }

        let n_out = self.output_channels.min(MAX_CHANNELS);
        for (d, s) in dst.iter_mut().zip(&bufs[cur][..n_out]) {
            *d = *s;
        }
    }

    pub(crate) fn validate(&self, sig: TagSignature, report: &mut ValidationReport) {
        if let Err(e) = self.check_channels() {
            report.critical(Some(sig), e.to_string());
        }
        for element in &self.elements {
            if let MpeElementKind::Unknown { sig: esig, .. } = &element.kind {
                report.warning(
                    Some(sig),
                    format!(
                        "unknown processing element '{}' is passed through",
                        signature_string(*esig)
                    ),
                );
            }
        }
    }

    pub fn describe(&self) -> String {
        let mut out = format!(
            "{} -> {} channels, {} elements",
            self.input_channels,
            self.output_channels,
            self.elements.len()
        );
        for element in &self.elements {
            out.push_str("\n  ");
            out.push_str(&element.describe());
        }
        out
    }
}
