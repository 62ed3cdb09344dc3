//! Curve Tag Types
//!
//! ICC profiles use curves for tone reproduction (TRC).
//! Two main types:
//! - curv: Simple gamma or lookup table
//! - para: Parametric curves with formula
//!
//! Raw field values are kept so a decoded curve re-encodes to the same bytes.
//!
//! See ICC.1:2022 Sections 10.6 (curv) and 10.18 (para)

use crate::icc::error::IccError;
use crate::icc::io::{IccReader, IccWriter};
use crate::icc::types::{S15Fixed16, TagSignature, TypeSignature, U8Fixed8};
use crate::icc::validate::ValidationReport;
use crate::math::{ParametricCurve, ParametricCurveType};

/// Curve tag data (curv type)
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CurveData {
    /// Identity curve (count = 0)
    #[default]
    Identity,
    /// Simple gamma (count = 1, value is u8Fixed8)
    Gamma(U8Fixed8),
    /// Lookup table (count > 1, values are u16)
    Table(Vec<u16>),
}

impl CurveData {
    /// Gamma curve from a float exponent
    pub fn gamma(g: f64) -> Self {
        CurveData::Gamma(U8Fixed8::from_f64(g))
    }

    /// Read the body (after type signature and reserved bytes)
    pub fn read(rd: &mut IccReader<'_>) -> Result<Self, IccError> {
        let count = rd.read_u32()? as usize;
        match count {
            0 => Ok(CurveData::Identity),
            1 => Ok(CurveData::Gamma(rd.read_u8f8()?)),
            _ => Ok(CurveData::Table(rd.read_u16_vec(count)?)),
        }
    }

    pub fn write(&self, wr: &mut IccWriter<'_>) -> Result<(), IccError> {
        match self {
            CurveData::Identity => wr.write_u32(0),
            CurveData::Gamma(g) => {
                wr.write_u32(1)?;
                wr.write_u8f8(*g)
            }
            CurveData::Table(table) => {
                wr.write_u32(table.len() as u32)?;
                wr.write_u16_slice(table)
            }
        }
    }

    /// Evaluate the curve at a given input (0.0 to 1.0)
    ///
    /// The identity curve returns its input untouched, without clamping.
    pub fn eval(&self, x: f64) -> f64 {
        if let CurveData::Identity = self {
            return x;
        }
        let x = if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) };

        match self {
            CurveData::Identity => x,
            CurveData::Gamma(g) => x.powf(g.to_f64()),
            CurveData::Table(table) => {
                if table.is_empty() {
                    return x;
                }
                if table.len() == 1 {
                    return table[0] as f64 / 65535.0;
                }

                // Linear interpolation in the table
                let pos = x * (table.len() - 1) as f64;
                let idx = pos.floor() as usize;
                let frac = pos - idx as f64;

                if idx >= table.len() - 1 {
                    return table[table.len() - 1] as f64 / 65535.0;
                }

                let v0 = table[idx] as f64;
                let v1 = table[idx + 1] as f64;
                (v0 + frac * (v1 - v0)) / 65535.0
            }
        }
    }

    /// Evaluate the inverse curve (for encoding)
    pub fn eval_inverse(&self, y: f64) -> f64 {
        if let CurveData::Identity = self {
            return y;
        }
        let y = y.clamp(0.0, 1.0);

        match self {
            CurveData::Identity => y,
            CurveData::Gamma(g) => {
                let g = g.to_f64();
                if g == 0.0 {
                    return y;
                }
                y.powf(1.0 / g)
            }
            CurveData::Table(table) => {
                if table.len() < 2 {
                    return y;
                }
                let target = y * 65535.0;

                // First entry at or above the target
                let lo = table.partition_point(|&v| (v as f64) < target);
                if lo == 0 {
                    return 0.0;
                }
                if lo >= table.len() {
                    return 1.0;
                }

                let v0 = table[lo - 1] as f64;
                let v1 = table[lo] as f64;
                let t = if v1 > v0 { (target - v0) / (v1 - v0) } else { 0.0 };
                ((lo - 1) as f64 + t) / (table.len() - 1) as f64
            }
        }
    }

    /// Check if this is a linear (identity) curve
    pub fn is_linear(&self) -> bool {
        match self {
            CurveData::Identity => true,
            CurveData::Gamma(g) => g.0 == 0x0100,
            CurveData::Table(table) => {
                let n = table.len();
                n >= 2
                    && table.iter().enumerate().all(|(i, &v)| {
                        let expected = (i as f64 / (n - 1) as f64 * 65535.0).round() as i32;
                        (v as i32 - expected).abs() <= 1
                    })
            }
        }
    }

    /// Gamma exponent, when the curve is a pure power law
    pub fn gamma_value(&self) -> Option<f64> {
        match self {
            CurveData::Identity => Some(1.0),
            CurveData::Gamma(g) => Some(g.to_f64()),
            CurveData::Table(_) => None,
        }
    }

    pub(crate) fn validate(&self, sig: Option<TagSignature>, report: &mut ValidationReport) {
        match self {
            CurveData::Gamma(g) if g.0 == 0 => {
                report.warning(sig, "curve gamma is zero");
            }
            CurveData::Table(table) => {
                let rising = table.windows(2).all(|w| w[0] <= w[1]);
                let falling = table.windows(2).all(|w| w[0] >= w[1]);
                if !rising && !falling {
                    report.warning(sig, "curve table is not monotonic");
                }
            }
            _ => {}
        }
    }

    pub fn describe(&self) -> String {
        match self {
            CurveData::Identity => "identity".to_string(),
            CurveData::Gamma(g) => format!("gamma {:.4}", g.to_f64()),
            CurveData::Table(t) => format!(
                "table of {} entries ({} .. {})",
                t.len(),
                t.first().copied().unwrap_or(0),
                t.last().copied().unwrap_or(0)
            ),
        }
    }
}

/// Parametric curve data (para type)
#[derive(Debug, Clone, PartialEq)]
pub struct ParametricCurveData {
    /// ICC function type (0..=4)
    pub function_type: u16,
    /// Parameters as stored
    pub params: Vec<S15Fixed16>,
}

impl Default for ParametricCurveData {
    fn default() -> Self {
        Self {
            function_type: 0,
            params: vec![S15Fixed16::from_f64(1.0)],
        }
    }
}

impl ParametricCurveData {
    /// Encode a float curve
    pub fn from_curve(curve: &ParametricCurve) -> Self {
        Self {
            function_type: curve.curve_type.to_icc(),
            params: curve.params().into_iter().map(S15Fixed16::from_f64).collect(),
        }
    }

    /// Read the body (after type signature and reserved bytes)
    pub fn read(rd: &mut IccReader<'_>) -> Result<Self, IccError> {
        let function_type = rd.read_u16()?;
        rd.skip(2)?;
        let curve_type = ParametricCurveType::from_icc(function_type).ok_or_else(|| {
            IccError::InvalidCurve(format!("unknown parametric function type {}", function_type))
        })?;

        let mut params = Vec::with_capacity(curve_type.param_count());
        for _ in 0..curve_type.param_count() {
            params.push(rd.read_s15f16()?);
        }
        Ok(Self {
            function_type,
            params,
        })
    }

    pub fn write(&self, wr: &mut IccWriter<'_>) -> Result<(), IccError> {
        wr.write_u16(self.function_type)?;
        wr.write_u16(0)?;
        for &p in &self.params {
            wr.write_s15f16(p)?;
        }
        Ok(())
    }

    /// Decoded float curve
    pub fn curve(&self) -> Result<ParametricCurve, IccError> {
        let curve_type = ParametricCurveType::from_icc(self.function_type).ok_or_else(|| {
            IccError::InvalidCurve(format!(
                "unknown parametric function type {}",
                self.function_type
            ))
        })?;
        let params: Vec<f64> = self.params.iter().map(|p| p.to_f64()).collect();
        ParametricCurve::from_params(curve_type, &params).ok_or_else(|| {
            IccError::InvalidCurve(format!(
                "function type {} needs {} parameters, got {}",
                self.function_type,
                curve_type.param_count(),
                params.len()
            ))
        })
    }

    /// Evaluate the curve at a given input; an undecodable curve passes input through
    pub fn eval(&self, x: f64) -> f64 {
        match self.curve() {
            Ok(c) => c.eval(x),
            Err(_) => x,
        }
    }

    pub fn eval_inverse(&self, y: f64) -> f64 {
        match self.curve() {
            Ok(c) => c.eval_inverse(y),
            Err(_) => y,
        }
    }

    pub(crate) fn validate(&self, sig: Option<TagSignature>, report: &mut ValidationReport) {
        match self.curve() {
            Ok(c) => {
                if c.g == 0.0 {
                    report.warning(sig, "parametric curve gamma is zero");
                }
            }
            Err(e) => report.non_compliant(sig, e.to_string()),
        }
    }

    pub fn describe(&self) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| format!("{:.5}", p.to_f64()))
            .collect();
        format!(
            "parametric type {} [{}]",
            self.function_type,
            params.join(", ")
        )
    }
}

/// A curve embedded in a lut tag (`mAB `, `mBA `): either `curv` or `para`
#[derive(Debug, Clone, PartialEq)]
pub enum LutCurve {
    Curve(CurveData),
    Parametric(ParametricCurveData),
}

impl Default for LutCurve {
    fn default() -> Self {
        LutCurve::Curve(CurveData::Identity)
    }
}

impl LutCurve {
    /// Read a complete embedded curve including its type header
    pub fn read(rd: &mut IccReader<'_>) -> Result<Self, IccError> {
        let sig = TypeSignature(rd.read_sig()?);
        rd.skip(4)?;
        match sig {
            TypeSignature::CURVE => Ok(LutCurve::Curve(CurveData::read(rd)?)),
            TypeSignature::PARA => Ok(LutCurve::Parametric(ParametricCurveData::read(rd)?)),
            other => Err(IccError::InvalidCurve(format!(
                "embedded curve of type '{}'",
                other
            ))),
        }
    }

    pub fn write(&self, wr: &mut IccWriter<'_>) -> Result<(), IccError> {
        match self {
            LutCurve::Curve(c) => {
                wr.write_sig(TypeSignature::CURVE.0)?;
                wr.write_u32(0)?;
                c.write(wr)
            }
            LutCurve::Parametric(p) => {
                wr.write_sig(TypeSignature::PARA.0)?;
                wr.write_u32(0)?;
                p.write(wr)
            }
        }
    }

    /// Identity curves are the only ones a stage may skip
    pub fn is_identity(&self) -> bool {
        matches!(self, LutCurve::Curve(CurveData::Identity))
    }

    /// Evaluate; non-identity curves clamp input and output to [0, 1]
    #[inline]
    pub fn eval(&self, x: f64) -> f64 {
        match self {
            LutCurve::Curve(CurveData::Identity) => x,
            LutCurve::Curve(c) => c.eval(x),
            LutCurve::Parametric(p) => {
                let y = p.eval(x);
                if y.is_nan() { 0.0 } else { y.clamp(0.0, 1.0) }
            }
        }
    }

    pub fn eval_inverse(&self, y: f64) -> f64 {
        match self {
            LutCurve::Curve(c) => c.eval_inverse(y),
            LutCurve::Parametric(p) => p.eval_inverse(y),
        }
    }

    pub(crate) fn validate(&self, sig: Option<TagSignature>, report: &mut ValidationReport) {
        match self {
            LutCurve::Curve(c) => c.validate(sig, report),
            LutCurve::Parametric(p) => p.validate(sig, report),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            LutCurve::Curve(c) => c.describe(),
            LutCurve::Parametric(p) => p.describe(),
        }
    }
}

impl From<CurveData> for LutCurve {
    fn from(c: CurveData) -> Self {
        LutCurve::Curve(c)
    }
}

impl From<ParametricCurveData> for LutCurve {
    fn from(p: ParametricCurveData) -> Self {
        LutCurve::Parametric(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reader_over(bytes: &[u8]) -> Cursor<Vec<u8>> {
        Cursor::new(bytes.to_vec())
    }

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
    fn test_curve_identity() {
        let mut cur = reader_over(&[0, 0, 0, 0]);
        let mut rd = IccReader::new(&mut cur).unwrap();
        let curve = CurveData::read(&mut rd).unwrap();
        assert_eq!(curve, CurveData::Identity);
        assert_eq!(curve.eval(0.5), 0.5);
        // Identity never clamps
        assert_eq!(curve.eval(1.5), 1.5);
    }

    #[test]
    fn test_curve_gamma() {
        // gamma 2.2 ~ 0x0233
        let mut cur = reader_over(&[0, 0, 0, 1, 0x02, 0x33]);
        let mut rd = IccReader::new(&mut cur).unwrap();
        let curve = CurveData::read(&mut rd).unwrap();
        let g = curve.gamma_value().unwrap();
        assert!((g - 2.2).abs() < 0.01);
        assert!((curve.eval(0.5) - 0.5f64.powf(g)).abs() < 1e-12);
        assert!((curve.eval_inverse(curve.eval(0.3)) - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_curve_table() {
        let curve = CurveData::Table(vec![0, 32768, 65535]);
        assert!((curve.eval(0.0) - 0.0).abs() < 1e-9);
        assert!((curve.eval(0.5) - 32768.0 / 65535.0).abs() < 1e-9);
        assert!((curve.eval(1.0) - 1.0).abs() < 1e-9);
        assert!((curve.eval(-1.0) - 0.0).abs() < 1e-9);
        assert!((curve.eval_inverse(32768.0 / 65535.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_curve_table_bytes_preserved() {
        let curve = CurveData::Table(vec![0, 1000, 40000, 65535]);
        let bytes = encode(|wr| curve.write(wr));
        assert_eq!(bytes.len(), 4 + 8);
        let mut cur = reader_over(&bytes);
        let mut rd = IccReader::new(&mut cur).unwrap();
        assert_eq!(CurveData::read(&mut rd).unwrap(), curve);
    }

    #[test]
    fn test_is_linear() {
        assert!(CurveData::Identity.is_linear());
        assert!(CurveData::gamma(1.0).is_linear());
        assert!(CurveData::Table(vec![0, 32768, 65535]).is_linear());
        assert!(!CurveData::Table(vec![0, 10000, 65535]).is_linear());
    }

    #[test]
    fn test_parametric_type0() {
        let bytes = [
            0x00, 0x00, 0x00, 0x00, // function type 0, reserved
            0x00, 0x02, 0x33, 0x33, // gamma ~2.2
        ];
        let mut cur = reader_over(&bytes);
        let mut rd = IccReader::new(&mut cur).unwrap();
        let para = ParametricCurveData::read(&mut rd).unwrap();
        assert_eq!(para.function_type, 0);
        assert_eq!(para.params.len(), 1);
        assert!((para.eval(0.5) - 0.5f64.powf(2.2)).abs() < 1e-3);
        assert_eq!(encode(|wr| para.write(wr)), bytes);
    }

    #[test]
    fn test_parametric_srgb() {
        let para = ParametricCurveData::from_curve(&ParametricCurve::srgb());
        assert_eq!(para.function_type, 3);
        assert_eq!(para.params.len(), 5);
        assert!((para.eval(1.0) - 1.0).abs() < 1e-3);
        assert!(para.eval(0.02) < 0.01);
    }

    #[test]
    fn test_parametric_unknown_type() {
        let bytes = [0x00, 0x09, 0x00, 0x00];
        let mut cur = reader_over(&bytes);
        let mut rd = IccReader::new(&mut cur).unwrap();
        assert!(matches!(
            ParametricCurveData::read(&mut rd),
            Err(IccError::InvalidCurve(_))
        ));
    }

    #[test]
    fn test_lut_curve_header() {
        let curve = LutCurve::Curve(CurveData::gamma(1.8));
        let bytes = encode(|wr| curve.write(wr));
        assert_eq!(&bytes[..4], b"curv");
        let mut cur = reader_over(&bytes);
        let mut rd = IccReader::new(&mut cur).unwrap();
        assert_eq!(LutCurve::read(&mut rd).unwrap(), curve);
    }

    #[test]
    fn test_lut_curve_parametric_clamps_output() {
        // Type 2 with c offset pushes the curve above 1
        let para = ParametricCurveData {
            function_type: 2,
            params: [1.0, 1.0, 0.0, 0.5]
                .iter()
                .map(|&v| S15Fixed16::from_f64(v))
                .collect(),
        };
        let curve = LutCurve::Parametric(para);
        assert_eq!(curve.eval(1.0), 1.0);
        assert!(!curve.is_identity());
        assert!(LutCurve::default().is_identity());
    }

    #[test]
    fn test_non_monotonic_table_warns() {
        let mut report = ValidationReport::default();
        CurveData::Table(vec![0, 50000, 20000, 65535]).validate(None, &mut report);
        assert_eq!(report.findings().len(), 1);
    }
}
