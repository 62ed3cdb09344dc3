//! Interleaved buffer transforms
//!
//! Integer buffers hold device values scaled to the full sample range. When
//! a chain end is a PCS, integer samples use the v4 16-bit PCS encodings
//! (Lab or XYZ) normalized to [0, 1]; float buffers carry actual PCS units.

use multiversion::multiversion;

use crate::error::{Error, Result};
use crate::icc::PcsEncoding;
use crate::icc::tags::lut::MAX_CHANNELS;

use super::cmm::Cmm;

/// A buffer sample type
pub trait Sample: Copy {
    /// Whether PCS values need normalizing into the sample range
    const NORMALIZED: bool;

    fn to_f64(self) -> f64;
    fn from_f64(v: f64) -> Self;
}

impl Sample for u8 {
    const NORMALIZED: bool = true;

    #[inline(always)]
    fn to_f64(self) -> f64 {
        self as f64 / 255.0
    }

    #[inline(always)]
    fn from_f64(v: f64) -> Self {
        (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
    }
}

impl Sample for u16 {
    const NORMALIZED: bool = true;

    #[inline(always)]
    fn to_f64(self) -> f64 {
        self as f64 / 65535.0
    }

    #[inline(always)]
    fn from_f64(v: f64) -> Self {
        (v.clamp(0.0, 1.0) * 65535.0 + 0.5) as u16
    }
}

impl Sample for f32 {
    const NORMALIZED: bool = false;

    #[inline(always)]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline(always)]
    fn from_f64(v: f64) -> Self {
        v as f32
    }
}

#[multiversion(targets("x86_64+avx2", "x86_64+sse4.1", "aarch64+neon",))]
fn run_batch<S: Sample>(
    cmm: &Cmm,
    src: &[S],
    dst: &mut [S],
    pcs_in: Option<PcsEncoding>,
    pcs_out: Option<PcsEncoding>,
) {
    let n_in = cmm.input_channels();
    let n_out = cmm.output_channels();
    let mut input = [0.0f64; MAX_CHANNELS];
    let mut output = [0.0f64; MAX_CHANNELS];

    for (s, d) in src.chunks_exact(n_in).zip(dst.chunks_exact_mut(n_out)) {
        for (v, x) in input.iter_mut().zip(s) {
            *v = x.to_f64();
        }
        if let Some(enc) = pcs_in {
            let actual = enc.to_actual([input[0], input[1], input[2]]);
            input[..3].copy_from_slice(&actual);
        }

        cmm.apply(&mut output[..n_out], &input[..n_in]);

        if let Some(enc) = pcs_out {
            let encoded = enc.from_actual([output[0], output[1], output[2]]);
            output[..3].copy_from_slice(&encoded);
        }
        for (x, v) in d.iter_mut().zip(&output[..n_out]) {
            *x = S::from_f64(*v);
        }
    }
}

fn transform_buffer<S: Sample>(cmm: &Cmm, src: &[S], dst: &mut [S]) -> Result<()> {
    let n_in = cmm.input_channels();
    let n_out = cmm.output_channels();
    if n_in == 0 || n_out == 0 || n_in > MAX_CHANNELS || n_out > MAX_CHANNELS {
        return Err(Error::EmptyPipeline);
    }
    if src.len() % n_in != 0 {
        return Err(Error::BufferSize {
            expected: src.len() / n_in * n_in,
            actual: src.len(),
        });
    }
    let expected = src.len() / n_in * n_out;
    if dst.len() != expected {
        return Err(Error::BufferSize {
            expected,
            actual: dst.len(),
        });
    }

    let (pcs_in, pcs_out) = if S::NORMALIZED {
        let ends = cmm.pcs_ends();
        (
            ends.0.map(|e| PcsEncoding::for_lut(e.space(), false)),
            ends.1.map(|e| PcsEncoding::for_lut(e.space(), false)),
        )
    } else {
        (None, None)
    };

    tracing::trace!(pixels = src.len() / n_in, n_in, n_out, "batch transform");
    run_batch(cmm, src, dst, pcs_in, pcs_out);
    Ok(())
}

/// Transform interleaved 8-bit pixels
pub fn transform_u8(cmm: &Cmm, src: &[u8], dst: &mut [u8]) -> Result<()> {
    transform_buffer(cmm, src, dst)
}

/// Transform interleaved 16-bit pixels
pub fn transform_u16(cmm: &Cmm, src: &[u16], dst: &mut [u16]) -> Result<()> {
    transform_buffer(cmm, src, dst)
}

/// Transform interleaved float pixels; PCS ends are in actual units
pub fn transform_f32(cmm: &Cmm, src: &[f32], dst: &mut [f32]) -> Result<()> {
    transform_buffer(cmm, src, dst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icc::tags::{CurveData, XyzTagData};
    use crate::icc::{ColorSpace, IccProfile, ProfileClass, TagData, TagSignature};
    use crate::color::Xyz;
    use crate::pipeline::CmmConfig;

    fn gray(gamma: f64) -> IccProfile {
        let mut p = IccProfile::new(ProfileClass::Display, ColorSpace::Gray, ColorSpace::Xyz);
        p.attach_tag(TagSignature::GRAY_TRC, TagData::Curve(CurveData::gamma(gamma)));
        p
    }

    fn rgb_linear() -> IccProfile {
        let mut p = IccProfile::new(ProfileClass::Display, ColorSpace::Rgb, ColorSpace::Xyz);
        p.attach_tag(
            TagSignature::RED_COLORANT,
            TagData::Xyz(XyzTagData::new(Xyz::new(0.4361, 0.2225, 0.0139))),
        );
        p.attach_tag(
            TagSignature::GREEN_COLORANT,
            TagData::Xyz(XyzTagData::new(Xyz::new(0.3851, 0.7169, 0.0971))),
        );
        p.attach_tag(
            TagSignature::BLUE_COLORANT,
            TagData::Xyz(XyzTagData::new(Xyz::new(0.1431, 0.0606, 0.7141))),
        );
        let trc = p.attach_tag(TagSignature::RED_TRC, TagData::Curve(CurveData::gamma(1.0)));
        p.attach_shared(TagSignature::GREEN_TRC, trc.clone());
        p.attach_shared(TagSignature::BLUE_TRC, trc);
        p
    }

    #[test]
    fn test_u8_identity() {
        let rgb = rgb_linear();
        let cmm = Cmm::from_profiles(&[&rgb, &rgb], &[], &CmmConfig::default()).unwrap();
        let src: Vec<u8> = (0..=255u8).flat_map(|v| [v, 255 - v, v / 2]).collect();
        let mut dst = vec![0u8; src.len()];
        transform_u8(&cmm, &src, &mut dst).unwrap();
        assert_eq!(src, dst);
    }

    #[test]
    fn test_u16_gray_to_xyz() {
        let g = gray(1.0);
        let cmm = Cmm::from_profiles(&[&g], &[], &CmmConfig::default()).unwrap();
        let mut dst = [0u16; 3];
        transform_u16(&cmm, &[65535], &mut dst).unwrap();
        // Y = 1.0 encodes as 0x8000 in u1Fixed15
        assert!((dst[1] as i32 - 0x8000).abs() <= 1, "{:?}", dst);
    }

    #[test]
    fn test_f32_actual_units() {
        let g = gray(1.0);
        let cmm = Cmm::from_profiles(&[&g], &[], &CmmConfig::default()).unwrap();
        let mut dst = [0f32; 6];
        transform_f32(&cmm, &[0.5, 1.0], &mut dst).unwrap();
        assert!((dst[1] - 0.5).abs() < 1e-5);
        assert!((dst[4] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_buffer_sizes() {
        let rgb = rgb_linear();
        let g = gray(1.0);
        let cmm = Cmm::from_profiles(&[&rgb, &g], &[], &CmmConfig::default()).unwrap();
        let mut dst = [0u8; 2];
        assert!(matches!(
            transform_u8(&cmm, &[1, 2, 3, 4], &mut dst),
            Err(Error::BufferSize { expected: 3, actual: 4 })
        ));
        assert!(matches!(
            transform_u8(&cmm, &[1, 2, 3], &mut dst),
            Err(Error::BufferSize { expected: 1, actual: 2 })
        ));
        let mut one = [0u8; 1];
        transform_u8(&cmm, &[255, 255, 255], &mut one).unwrap();
        assert_eq!(one[0], 255);
    }
}
