//! Profile chains
//!
//! A [`Cmm`] is an ordered list of [`Xform`]s plus the PCS conversions
//! between them. Every boundary where a PCS value crosses from one encoding
//! to another gets exactly one [`PcsHop`]; boundaries whose encodings already
//! agree get none.

use crate::color::Xyz;
use crate::error::{Error, Result};
use crate::icc::pcs::{lab_to_xyz, xyz_to_lab};
use crate::icc::tags::lut::MAX_CHANNELS;
use crate::icc::{ColorSpace, IccProfile, PcsEncoding, ProfileClass, RenderingIntent};

use super::context::CmmConfig;
use super::xform::{Direction, Xform};

/// Conversion of a PCS triple between two stage encodings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PcsHop {
    pub from: PcsEncoding,
    pub to: PcsEncoding,
    /// Per-channel XYZ factors (absolute colorimetric)
    pub scale: Option<[f64; 3]>,
}

impl PcsHop {
    /// None when the encodings agree and nothing needs scaling
    pub fn between(from: PcsEncoding, to: PcsEncoding, scale: Option<[f64; 3]>) -> Option<Self> {
        let scale = scale.filter(|s| s.iter().any(|&f| (f - 1.0).abs() > 1e-12));
        if from == to && scale.is_none() {
            return None;
        }
        Some(Self { from, to, scale })
    }

    /// Convert the first three values of `v` in place
    #[inline]
    pub fn apply(&self, v: &mut [f64]) {
        let from_space = self.from.space();
        let to_space = self.to.space();
        let mut x = self.from.to_actual([v[0], v[1], v[2]]);

        match self.scale {
            Some(s) => {
                if from_space == ColorSpace::Lab {
                    x = lab_to_xyz(x);
                }
                for (c, f) in x.iter_mut().zip(s) {
                    *c *= f;
                }
                if to_space == ColorSpace::Lab {
                    x = xyz_to_lab(x);
                }
            }
            None if from_space != to_space => {
                x = match from_space {
                    ColorSpace::Lab => lab_to_xyz(x),
                    _ => xyz_to_lab(x),
                };
            }
            None => {}
        }

        v[..3].copy_from_slice(&self.to.from_actual(x));
    }
}

/// Compiled profile chain
#[derive(Debug, Clone)]
pub struct Cmm {
    xforms: Vec<Xform>,
    /// One slot per boundary, including both chain ends
    hops: Vec<Option<PcsHop>>,
    config: CmmConfig,
}

fn output_scale(x: &Xform) -> Option<[f64; 3]> {
    match x.direction {
        Direction::DeviceToPcs => x.absolute_scale,
        Direction::PcsToDevice => None,
    }
}

fn input_scale(x: &Xform) -> Option<[f64; 3]> {
    match x.direction {
        Direction::PcsToDevice => x.absolute_scale.map(|s| s.map(|f| 1.0 / f)),
        Direction::DeviceToPcs => None,
    }
}

fn combine(a: Option<[f64; 3]>, b: Option<[f64; 3]>) -> Option<[f64; 3]> {
    match (a, b) {
        (Some(a), Some(b)) => Some([a[0] * b[0], a[1] * b[1], a[2] * b[2]]),
        (a, None) => a,
        (None, b) => b,
    }
}

fn clamp_pcs(v: &mut [f64], encoding: PcsEncoding) {
    match encoding.space() {
        ColorSpace::Lab => {
            v[0] = v[0].clamp(0.0, 100.0);
            v[1] = v[1].clamp(-128.0, 127.0);
            v[2] = v[2].clamp(-128.0, 127.0);
        }
        _ => {
            for c in &mut v[..3] {
                *c = c.clamp(0.0, 65535.0 / 32768.0);
            }
        }
    }
}

fn compatible(from: ColorSpace, to: ColorSpace) -> bool {
    from == to || (from.is_pcs() && to.is_pcs())
}

impl Cmm {
    /// Chain `profiles`, taking `intents[i]` for profile `i`
    ///
    /// A shorter intent list repeats its last entry; an empty one means
    /// perceptual throughout.
    pub fn from_profiles(
        profiles: &[&IccProfile],
        intents: &[RenderingIntent],
        config: &CmmConfig,
    ) -> Result<Self> {
        let mut builder = CmmBuilder::new(*config);
        for (i, profile) in profiles.iter().enumerate() {
            let intent = intents
                .get(i)
                .or_else(|| intents.last())
                .copied()
                .unwrap_or_default();
            builder = builder.add_profile(profile, intent);
        }
        builder.build()
    }

    pub fn builder<'a>(config: CmmConfig) -> CmmBuilder<'a> {
        CmmBuilder::new(config)
    }

    fn from_xforms(xforms: Vec<Xform>, config: CmmConfig) -> Result<Self> {
        let (Some(first), Some(last)) = (xforms.first(), xforms.last()) else {
            return Err(Error::EmptyPipeline);
        };

        let mut hops = Vec::with_capacity(xforms.len() + 1);
        hops.push(first.input_encoding.and_then(|enc| {
            PcsHop::between(PcsEncoding::float_for(enc.space()), enc, input_scale(first))
        }));
        for pair in xforms.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if !compatible(prev.destination, next.source) {
                return Err(Error::IncompatibleColorSpace {
                    from: prev.destination,
                    to: next.source,
                });
            }
            let hop = match (prev.output_encoding, next.input_encoding) {
                (Some(from), Some(to)) => {
                    PcsHop::between(from, to, combine(output_scale(prev), input_scale(next)))
                }
                _ => None,
            };
            hops.push(hop);
        }
        hops.push(last.output_encoding.and_then(|enc| {
            PcsHop::between(enc, PcsEncoding::float_for(enc.space()), output_scale(last))
        }));

        tracing::debug!(
            stages = xforms.len(),
            hops = hops.iter().flatten().count(),
            input = ?first.source,
            output = ?last.destination,
            "built CMM"
        );
        for x in &xforms {
            tracing::trace!("{}", x.describe());
        }
        Ok(Self {
            xforms,
            hops,
            config,
        })
    }

    /// Transform one pixel
    ///
    /// Device values are normalized to [0, 1]; PCS values at the chain ends
    /// are in actual units. Out-of-range inputs are clamped. Extra `dst`
    /// slots are left untouched.
    pub fn apply(&self, dst: &mut [f64], src: &[f64]) {
        let (Some(first), Some(last)) = (self.xforms.first(), self.xforms.last()) else {
            return;
        };
        let mut a = [0.0f64; MAX_CHANNELS];
        let mut b = [0.0f64; MAX_CHANNELS];
        let n_in = first.input_channels().min(MAX_CHANNELS);
        for (d, s) in a.iter_mut().zip(src).take(n_in) {
            *d = *s;
        }
        match first.input_encoding {
            Some(enc) => clamp_pcs(&mut a, PcsEncoding::float_for(enc.space())),
            None => {
                for v in &mut a[..n_in] {
                    *v = v.clamp(0.0, 1.0);
                }
            }
        }
        if let Some(hop) = &self.hops[0] {
            hop.apply(&mut a);
        }

        let (mut cur, mut next) = (&mut a, &mut b);
        for (i, x) in self.xforms.iter().enumerate() {
            let n_in = x.input_channels().min(MAX_CHANNELS);
            let n_out = x.output_channels().min(MAX_CHANNELS);
            x.apply(&mut next[..n_out], &cur[..n_in]);
            std::mem::swap(&mut cur, &mut next);
            if let Some(hop) = &self.hops[i + 1] {
                hop.apply(&mut cur[..]);
            }
        }

        let n_out = last.output_channels().min(MAX_CHANNELS);
        if self.config.clamp_output && last.output_encoding.is_none() {
            for v in &mut cur[..n_out] {
                *v = v.clamp(0.0, 1.0);
            }
        }
        for (d, s) in dst.iter_mut().zip(&cur[..n_out]) {
            *d = *s;
        }
    }

    pub fn xforms(&self) -> &[Xform] {
        &self.xforms
    }

    pub fn hops(&self) -> &[Option<PcsHop>] {
        &self.hops
    }

    pub fn config(&self) -> &CmmConfig {
        &self.config
    }

    pub fn input_channels(&self) -> usize {
        self.xforms.first().map_or(0, Xform::input_channels)
    }

    pub fn output_channels(&self) -> usize {
        self.xforms.last().map_or(0, Xform::output_channels)
    }

    /// Encodings of the chain ends that are PCS values, as (input, output)
    pub fn pcs_ends(&self) -> (Option<PcsEncoding>, Option<PcsEncoding>) {
        (
            self.xforms.first().and_then(|x| x.input_encoding),
            self.xforms.last().and_then(|x| x.output_encoding),
        )
    }

    pub fn input_space(&self) -> Option<ColorSpace> {
        self.xforms.first().map(|x| x.source)
    }

    pub fn output_space(&self) -> Option<ColorSpace> {
        self.xforms.last().map(|x| x.destination)
    }

    /// One line per stage and per PCS conversion
    pub fn describe(&self) -> String {
        let mut lines = Vec::new();
        for (i, x) in self.xforms.iter().enumerate() {
            if let Some(hop) = &self.hops[i] {
                lines.push(format!("  hop {:?} -> {:?}", hop.from, hop.to));
            }
            lines.push(format!("{}: {}", i, x.describe()));
        }
        if let Some(Some(hop)) = self.hops.last() {
            lines.push(format!("  hop {:?} -> {:?}", hop.from, hop.to));
        }
        lines.join("\n")
    }
}

struct Pending<'a> {
    profile: &'a IccProfile,
    intent: RenderingIntent,
    direction: Option<Direction>,
}

/// Incremental [`Cmm`] construction
///
/// Profiles are only turned into stages by [`build`](Self::build), which
/// either returns the whole chain or an error.
pub struct CmmBuilder<'a> {
    config: CmmConfig,
    pending: Vec<Pending<'a>>,
}

impl<'a> CmmBuilder<'a> {
    pub fn new(config: CmmConfig) -> Self {
        Self {
            config,
            pending: Vec::new(),
        }
    }

    /// Append a profile; its direction follows from the running color space
    pub fn add_profile(self, profile: &'a IccProfile, intent: RenderingIntent) -> Self {
        self.add_profile_with(profile, intent, None)
    }

    /// Append a profile, optionally forcing its direction
    pub fn add_profile_with(
        mut self,
        profile: &'a IccProfile,
        intent: RenderingIntent,
        direction: Option<Direction>,
    ) -> Self {
        self.pending.push(Pending {
            profile,
            intent,
            direction,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn build(self) -> Result<Cmm> {
        let mut xforms: Vec<Xform> = Vec::with_capacity(self.pending.len());
        let mut running: Option<ColorSpace> = None;

        for p in &self.pending {
            let class = p.profile.header.device_class;
            let link_like = matches!(class, ProfileClass::DeviceLink | ProfileClass::Abstract);
            let direction = p.direction.unwrap_or(match running {
                Some(space) if space.is_pcs() && !link_like => Direction::PcsToDevice,
                _ => Direction::DeviceToPcs,
            });
            let xform = Xform::from_profile(p.profile, direction, p.intent, &self.config)?;
            if let Some(space) = running {
                if !compatible(space, xform.source) {
                    return Err(Error::IncompatibleColorSpace {
                        from: space,
                        to: xform.source,
                    });
                }
            }
            running = Some(xform.destination);
            xforms.push(xform);
        }

        Cmm::from_xforms(xforms, self.config)
    }
}

/// Media white of an absolute colorimetric stage, if it has one
pub fn media_white(x: &Xform) -> Option<Xyz> {
    x.absolute_scale.map(|s| crate::color::D50.xyz.scale_by(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clut::{Clut, ClutPrecision};
    use crate::color::D50;
    use crate::icc::tags::{CurveData, Lut16Data, XyzTagData, identity_table};
    use crate::icc::{IccError, TagData, TagSignature};

    fn gray_profile(gamma: f64) -> IccProfile {
        let mut p = IccProfile::new(ProfileClass::Display, ColorSpace::Gray, ColorSpace::Xyz);
        p.attach_tag(TagSignature::GRAY_TRC, TagData::Curve(CurveData::gamma(gamma)));
        p
    }

    fn srgb_like() -> IccProfile {
        let mut p = IccProfile::new(ProfileClass::Display, ColorSpace::Rgb, ColorSpace::Xyz);
        let colorants = [
            (TagSignature::RED_COLORANT, Xyz::new(0.4361, 0.2225, 0.0139)),
            (TagSignature::GREEN_COLORANT, Xyz::new(0.3851, 0.7169, 0.0971)),
            (TagSignature::BLUE_COLORANT, Xyz::new(0.1431, 0.0606, 0.7141)),
        ];
        for (sig, xyz) in colorants {
            p.attach_tag(sig, TagData::Xyz(XyzTagData::new(xyz)));
        }
        let trc = p.attach_tag(TagSignature::RED_TRC, TagData::Curve(CurveData::gamma(2.2)));
        p.attach_shared(TagSignature::GREEN_TRC, trc.clone());
        p.attach_shared(TagSignature::BLUE_TRC, trc);
        p
    }

    fn identity_link() -> IccProfile {
        let mut clut = Clut::new(&[2, 2, 2], 3, ClutPrecision::U16).unwrap();
        clut.iterate(|coord, values| {
            for (v, &c) in values.iter_mut().zip(coord) {
                *v = c as f64;
            }
        });
        let lut =
            Lut16Data::new(vec![identity_table(2); 3], clut, vec![identity_table(2); 3]).unwrap();
        let mut p = IccProfile::new(ProfileClass::DeviceLink, ColorSpace::Rgb, ColorSpace::Rgb);
        p.attach_tag(TagSignature::A2B0, TagData::Lut16(lut));
        p
    }

    #[test]
    fn test_gray_roundtrip() {
        let gray = gray_profile(2.2);
        let cmm = Cmm::from_profiles(&[&gray, &gray], &[], &CmmConfig::default()).unwrap();
        assert_eq!(cmm.xforms()[1].direction, Direction::PcsToDevice);
        // XyzFloat on both sides of the middle boundary
        assert!(cmm.hops().iter().all(Option::is_none));

        let mut out = [0.0];
        for v in [0.0, 0.3, 0.75, 1.0] {
            cmm.apply(&mut out, &[v]);
            assert!((out[0] - v).abs() < 1e-6, "{} -> {}", v, out[0]);
        }
    }

    #[test]
    fn test_rgb_roundtrip_and_white() {
        let rgb = srgb_like();
        let cmm = Cmm::from_profiles(
            &[&rgb, &rgb],
            &[RenderingIntent::RelativeColorimetric],
            &CmmConfig::default(),
        )
        .unwrap();
        let mut out = [0.0; 3];
        cmm.apply(&mut out, &[0.2, 0.5, 0.9]);
        for (o, e) in out.iter().zip([0.2, 0.5, 0.9]) {
            assert!((o - e).abs() < 1e-6, "{:?}", out);
        }

        let to_pcs = Cmm::from_profiles(&[&rgb], &[], &CmmConfig::default()).unwrap();
        assert_eq!(to_pcs.output_space(), Some(ColorSpace::Xyz));
        to_pcs.apply(&mut out, &[1.0, 1.0, 1.0]);
        assert!(Xyz::from_array(out).approx_eq(&D50.xyz, 1e-3), "{:?}", out);
    }

    #[test]
    fn test_clamps_inputs() {
        let rgb = srgb_like();
        let cmm = Cmm::from_profiles(&[&rgb, &rgb], &[], &CmmConfig::default()).unwrap();
        let mut out = [0.0; 3];
        cmm.apply(&mut out, &[-0.5, 1.5, 0.5]);
        assert!(out[0].abs() < 1e-6 && (out[1] - 1.0).abs() < 1e-6, "{:?}", out);
    }

    #[test]
    fn test_pcs_hop() {
        let hop = PcsHop::between(PcsEncoding::XyzFloat, PcsEncoding::LabV4, None).unwrap();
        let mut v = D50.xyz.to_array();
        hop.apply(&mut v);
        assert!((v[0] - 1.0).abs() < 1e-9);
        assert!((v[1] - 128.0 / 255.0).abs() < 1e-9, "{:?}", v);

        assert!(PcsHop::between(PcsEncoding::LabV2, PcsEncoding::LabV2, None).is_none());
        assert!(PcsHop::between(PcsEncoding::LabV2, PcsEncoding::LabV2, Some([1.0; 3])).is_none());

        let scaled = PcsHop::between(PcsEncoding::XyzFloat, PcsEncoding::XyzFloat, Some([0.5; 3]))
            .unwrap();
        let mut v = [0.4, 0.6, 0.8];
        scaled.apply(&mut v);
        assert_eq!(v, [0.2, 0.3, 0.4]);
    }

    #[test]
    fn test_device_link_alone() {
        let link = identity_link();
        let cmm = Cmm::from_profiles(&[&link], &[], &CmmConfig::default()).unwrap();
        assert_eq!(cmm.input_channels(), 3);
        let mut out = [0.0; 3];
        cmm.apply(&mut out, &[0.2, 0.4, 0.6]);
        for (o, e) in out.iter().zip([0.2, 0.4, 0.6]) {
            assert!((o - e).abs() < 1e-9, "{:?}", out);
        }
    }

    #[test]
    fn test_incompatible_spaces() {
        let gray = gray_profile(1.0);
        let link = identity_link();
        let err = Cmm::from_profiles(&[&gray, &link], &[], &CmmConfig::default());
        assert!(matches!(
            err,
            Err(Error::IncompatibleColorSpace {
                from: ColorSpace::Xyz,
                to: ColorSpace::Rgb
            })
        ));
    }

    #[test]
    fn test_empty_chain() {
        assert!(matches!(
            Cmm::from_profiles(&[], &[], &CmmConfig::default()),
            Err(Error::EmptyPipeline)
        ));
    }

    #[test]
    fn test_channel_mismatch_propagates() {
        let mut cmyk = IccProfile::new(ProfileClass::Output, ColorSpace::Cmyk, ColorSpace::Lab);
        let link = identity_link();
        let shared = link.get_tag(TagSignature::A2B0).unwrap();
        cmyk.attach_shared(TagSignature::A2B0, shared);
        let err = Cmm::builder(CmmConfig::default())
            .add_profile(&cmyk, RenderingIntent::Perceptual)
            .build();
        assert!(matches!(err, Err(Error::Icc(IccError::ChannelMismatch { .. }))));
    }

    #[test]
    fn test_absolute_intent_scales_pcs() {
        let mut gray = gray_profile(1.0);
        gray.attach_tag(
            TagSignature::MEDIA_WHITE,
            TagData::Xyz(XyzTagData::new(D50.xyz.scale(0.8))),
        );
        let cmm = Cmm::builder(CmmConfig::default())
            .add_profile(&gray, RenderingIntent::AbsoluteColorimetric)
            .build()
            .unwrap();
        let mut out = [0.0; 3];
        cmm.apply(&mut out, &[1.0]);
        assert!((out[1] - 0.8).abs() < 1e-3, "{:?}", out);
        assert!(media_white(&cmm.xforms()[0]).is_some());

        // Relative round trip through an absolute pair is unchanged
        let pair = Cmm::from_profiles(
            &[&gray, &gray],
            &[RenderingIntent::AbsoluteColorimetric],
            &CmmConfig::default(),
        )
        .unwrap();
        let mut g = [0.0];
        pair.apply(&mut g, &[0.6]);
        assert!((g[0] - 0.6).abs() < 1e-6, "{:?}", g);
    }

    #[test]
    fn test_forced_direction() {
        let gray = gray_profile(1.0);
        let cmm = Cmm::builder(CmmConfig::default())
            .add_profile_with(&gray, RenderingIntent::Perceptual, Some(Direction::PcsToDevice))
            .build()
            .unwrap();
        assert_eq!(cmm.input_space(), Some(ColorSpace::Xyz));
        let mut out = [0.0];
        cmm.apply(&mut out, &[0.5 * D50.xyz.x, 0.5, 0.5 * D50.xyz.z]);
        assert!((out[0] - 0.5).abs() < 1e-9);
        assert!(cmm.describe().contains("gray TRC"));
    }
}
