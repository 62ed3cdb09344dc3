//! Profile-derived pipeline stages
//!
//! An [`Xform`] is one profile used in one direction: matrix/TRC, gray TRC,
//! a LUT in the common MBB model, or a multi-process element chain. It
//! records the PCS encoding expected at each side so the CMM can place a
//! single conversion between neighbours.

use std::borrow::Cow;

use crate::clut::Interpolation;
use crate::color::D50;
use crate::error::{Error, Result};
use crate::icc::pcs::{lab_to_xyz, xyz_to_lab};
use crate::icc::tags::{LutCurve, Mbb, MpeData};
use crate::icc::{
    ColorSpace, IccError, IccProfile, PcsEncoding, ProfileClass, RenderingIntent, TagData,
    TagSignature,
};
use crate::math::Matrix3x3;

use super::context::CmmConfig;

/// Which way a profile is traversed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// A2Bx / D2Bx, or the forward matrix/TRC
    DeviceToPcs,
    /// B2Ax / B2Dx, or the inverted matrix/TRC
    PcsToDevice,
}

/// Stage implementation
#[derive(Debug, Clone)]
pub enum XformKind {
    /// RGB matrix/TRC; `matrix` maps linear RGB to XYZ
    MatrixTrc {
        matrix: Matrix3x3,
        inverse: Matrix3x3,
        curves: [LutCurve; 3],
    },
    /// Gray TRC against the D50 white
    GrayTrc(LutCurve),
    /// `mft1`, `mft2`, `mAB ` or `mBA `
    Mbb(Mbb),
    /// `mpet`
    Mpe(MpeData),
}

/// One profile in a CMM chain
#[derive(Debug, Clone)]
pub struct Xform {
    pub kind: XformKind,
    pub source: ColorSpace,
    pub destination: ColorSpace,
    pub direction: Direction,
    /// Intent the stage was built for
    pub intent: RenderingIntent,
    pub interpolation: Interpolation,
    /// Encoding of PCS inputs, None for device inputs
    pub input_encoding: Option<PcsEncoding>,
    /// Encoding of PCS outputs, None for device outputs
    pub output_encoding: Option<PcsEncoding>,
    /// Media white over D50 per XYZ channel, for absolute colorimetric
    pub absolute_scale: Option<[f64; 3]>,
    /// Tag the stage was built from; None for matrix/TRC
    pub tag: Option<TagSignature>,
}

const A2B: [TagSignature; 3] = [TagSignature::A2B0, TagSignature::A2B1, TagSignature::A2B2];
const B2A: [TagSignature; 3] = [TagSignature::B2A0, TagSignature::B2A1, TagSignature::B2A2];
const D2B: [TagSignature; 4] = [
    TagSignature::D2B0,
    TagSignature::D2B1,
    TagSignature::D2B2,
    TagSignature::D2B3,
];
const B2D: [TagSignature; 4] = [
    TagSignature::B2D0,
    TagSignature::B2D1,
    TagSignature::B2D2,
    TagSignature::B2D3,
];

/// `A2Bx`/`B2Ax` tag serving an intent
pub fn lut_tag(direction: Direction, intent: RenderingIntent) -> TagSignature {
    let table = match direction {
        Direction::DeviceToPcs => &A2B,
        Direction::PcsToDevice => &B2A,
    };
    match intent {
        RenderingIntent::Perceptual => table[0],
        RenderingIntent::RelativeColorimetric | RenderingIntent::AbsoluteColorimetric => table[1],
        RenderingIntent::Saturation => table[2],
    }
}

/// `D2Bx`/`B2Dx` tag serving an intent
pub fn float_tag(direction: Direction, intent: RenderingIntent) -> TagSignature {
    let table = match direction {
        Direction::DeviceToPcs => &D2B,
        Direction::PcsToDevice => &B2D,
    };
    table[intent.to_u32() as usize]
}

impl Xform {
    /// Build the stage for `profile` traversed in `direction`
    pub fn from_profile(
        profile: &IccProfile,
        direction: Direction,
        intent: RenderingIntent,
        config: &CmmConfig,
    ) -> Result<Self> {
        let header = &profile.header;
        let link_like = matches!(
            header.device_class,
            ProfileClass::DeviceLink | ProfileClass::Abstract
        );
        // Links and abstract profiles only run forward
        let direction = if link_like {
            Direction::DeviceToPcs
        } else {
            direction
        };
        let (source, destination) = match direction {
            Direction::DeviceToPcs => (header.color_space, header.pcs),
            Direction::PcsToDevice => (header.pcs, header.color_space),
        };

        let mut candidates: Vec<TagSignature> = Vec::with_capacity(4);
        if config.use_float_tags {
            candidates.push(float_tag(direction, intent));
        }
        candidates.push(lut_tag(direction, intent));
        if config.intent_fallback || link_like {
            if config.use_float_tags {
                candidates.push(float_tag(direction, RenderingIntent::Perceptual));
            }
            candidates.push(lut_tag(direction, RenderingIntent::Perceptual));
        }
        candidates.dedup();

        let absolute_scale = if intent == RenderingIntent::AbsoluteColorimetric && !link_like {
            profile
                .media_white_point()
                .map(|w| w.ratio(&D50.xyz))
        } else {
            None
        };

        let mut xform = Self {
            kind: XformKind::GrayTrc(LutCurve::default()),
            source,
            destination,
            direction,
            intent,
            interpolation: config.interpolation,
            input_encoding: None,
            output_encoding: None,
            absolute_scale,
            tag: None,
        };

        for (i, &sig) in candidates.iter().enumerate() {
            let Some(shared) = profile.get_tag(sig) else {
                continue;
            };
            if i > 0 {
                tracing::warn!(tag = %sig, ?intent, "intent tag missing, falling back");
            }
            // D2B3/B2D3 already carry absolute PCS values
            if sig == D2B[3] || sig == B2D[3] {
                xform.absolute_scale = None;
            }
            let tag = shared.borrow();
            xform.set_lut(sig, &tag.data)?;
            tracing::trace!(tag = %sig, ?direction, "built LUT stage");
            return Ok(xform);
        }

        let has_luts = match direction {
            Direction::DeviceToPcs => A2B.iter().chain(&D2B).any(|&s| profile.has_tag(s)),
            Direction::PcsToDevice => B2A.iter().chain(&B2D).any(|&s| profile.has_tag(s)),
        };
        if !link_like && profile.is_matrix_shaper() && (config.intent_fallback || !has_luts) {
            if has_luts {
                tracing::warn!(?intent, "no LUT for intent, using matrix/TRC");
            }
            xform.set_matrix_trc(profile)?;
            return Ok(xform);
        }

        Err(Error::MissingTransform {
            intent,
            detail: format!(
                "none of {} present in {:?} profile",
                candidates
                    .iter()
                    .map(|s| format!("'{}'", s))
                    .collect::<Vec<_>>()
                    .join(", "),
                header.device_class
            ),
        })
    }

    fn set_lut(&mut self, sig: TagSignature, data: &TagData) -> Result<()> {
        let (inputs, outputs, legacy) = match data {
            TagData::MultiProcessElement(mpe) => {
                mpe.check_channels()?;
                self.input_encoding = self.source.is_pcs().then(|| PcsEncoding::float_for(self.source));
                self.output_encoding = self
                    .destination
                    .is_pcs()
                    .then(|| PcsEncoding::float_for(self.destination));
                self.kind = XformKind::Mpe(mpe.clone());
                (mpe.input_channels, mpe.output_channels, false)
            }
            other => {
                let mbb = other
                    .as_mbb(self.source == ColorSpace::Xyz)
                    .map(Cow::into_owned)
                    .ok_or_else(|| {
                        Error::Transform(format!(
                            "tag '{}' has type '{}', not a transform",
                            sig,
                            other.type_signature()
                        ))
                    })?;
                mbb.check_channels()?;
                let legacy = matches!(other, TagData::Lut16(_));
                let channels = (mbb.input_channels, mbb.output_channels);
                self.kind = XformKind::Mbb(mbb);
                (channels.0, channels.1, legacy)
            }
        };

        if let XformKind::Mbb(_) = self.kind {
            self.input_encoding = self
                .source
                .is_pcs()
                .then(|| PcsEncoding::for_lut(self.source, legacy));
            self.output_encoding = self
                .destination
                .is_pcs()
                .then(|| PcsEncoding::for_lut(self.destination, legacy));
        }

        if inputs != self.source.channels() {
            return Err(IccError::ChannelMismatch {
                stage: "transform input",
                expected: self.source.channels(),
                actual: inputs,
            }
            .into());
        }
        if outputs != self.destination.channels() {
            return Err(IccError::ChannelMismatch {
                stage: "transform output",
                expected: self.destination.channels(),
                actual: outputs,
            }
            .into());
        }
        self.tag = Some(sig);
        Ok(())
    }

    fn set_matrix_trc(&mut self, profile: &IccProfile) -> Result<()> {
        let pcs_side = match self.direction {
            Direction::DeviceToPcs => &mut self.destination,
            Direction::PcsToDevice => &mut self.source,
        };

        if profile.header.color_space == ColorSpace::Gray {
            let curve = profile
                .gray_trc()
                .ok_or_else(|| Error::Transform("gray profile without kTRC".to_string()))?;
            let encoding = PcsEncoding::float_for(*pcs_side);
            self.kind = XformKind::GrayTrc(curve);
            self.set_float_encoding(encoding);
            return Ok(());
        }

        // Colorant matrix output is always XYZ
        *pcs_side = ColorSpace::Xyz;
        let (red, green, blue) = match (
            profile.red_colorant(),
            profile.green_colorant(),
            profile.blue_colorant(),
        ) {
            (Some(r), Some(g), Some(b)) => (r, g, b),
            _ => return Err(Error::Transform("incomplete colorant tags".to_string())),
        };
        let matrix = Matrix3x3::from_columns(red, green, blue);
        let inverse = matrix
            .inverse()
            .ok_or_else(|| Error::Transform("colorant matrix is singular".to_string()))?;
        let curves = match (profile.red_trc(), profile.green_trc(), profile.blue_trc()) {
            (Some(r), Some(g), Some(b)) => [r, g, b],
            _ => return Err(Error::Transform("incomplete TRC tags".to_string())),
        };
        self.kind = XformKind::MatrixTrc {
            matrix,
            inverse,
            curves,
        };
        self.set_float_encoding(PcsEncoding::XyzFloat);
        tracing::trace!(direction = ?self.direction, "built matrix/TRC stage");
        Ok(())
    }

    fn set_float_encoding(&mut self, encoding: PcsEncoding) {
        match self.direction {
            Direction::DeviceToPcs => self.output_encoding = Some(encoding),
            Direction::PcsToDevice => self.input_encoding = Some(encoding),
        }
    }

    pub fn input_channels(&self) -> usize {
        match &self.kind {
            XformKind::Mbb(m) => m.input_channels,
            XformKind::Mpe(m) => m.input_channels,
            _ => self.source.channels(),
        }
    }

    pub fn output_channels(&self) -> usize {
        match &self.kind {
            XformKind::Mbb(m) => m.output_channels,
            XformKind::Mpe(m) => m.output_channels,
            _ => self.destination.channels(),
        }
    }

    /// Evaluate one pixel in this stage's own encodings
    pub fn apply(&self, dst: &mut [f64], src: &[f64]) {
        match &self.kind {
            XformKind::MatrixTrc {
                matrix,
                inverse,
                curves,
            } => match self.direction {
                Direction::DeviceToPcs => {
                    let linear = [0, 1, 2].map(|i| curves[i].eval(src[i].clamp(0.0, 1.0)));
                    dst[..3].copy_from_slice(&matrix.multiply_vec(linear));
                }
                Direction::PcsToDevice => {
                    let linear = inverse.multiply_vec([src[0], src[1], src[2]]);
                    for i in 0..3 {
                        dst[i] = curves[i].eval_inverse(linear[i].clamp(0.0, 1.0));
                    }
                }
            },
            XformKind::GrayTrc(curve) => match self.direction {
                Direction::DeviceToPcs => {
                    let y = curve.eval(src[0].clamp(0.0, 1.0));
                    let xyz = D50.xyz.scale(y).to_array();
                    let out = if self.destination == ColorSpace::Lab {
                        xyz_to_lab(xyz)
                    } else {
                        xyz
                    };
                    dst[..3].copy_from_slice(&out);
                }
                Direction::PcsToDevice => {
                    let y = if self.source == ColorSpace::Lab {
                        lab_to_xyz([src[0], src[1], src[2]])[1]
                    } else {
                        src[1]
                    };
                    dst[0] = curve.eval_inverse(y.clamp(0.0, 1.0));
                }
            },
            XformKind::Mbb(m) => m.apply(dst, src, self.interpolation),
            XformKind::Mpe(m) => m.apply(dst, src, self.interpolation),
        }
    }

    pub fn describe(&self) -> String {
        let kind = match &self.kind {
            XformKind::MatrixTrc { .. } => "matrix/TRC".to_string(),
            XformKind::GrayTrc(_) => "gray TRC".to_string(),
            XformKind::Mbb(m) => format!("lut {}", m.describe()),
            XformKind::Mpe(m) => format!("mpe {}", m.describe()),
        };
        let tag = self
            .tag
            .map(|t| format!(" from '{}'", t))
            .unwrap_or_default();
        format!(
            "{:?} -> {:?} ({:?}, {:?}){}: {}",
            self.source, self.destination, self.direction, self.intent, tag, kind
        )
    }
}
