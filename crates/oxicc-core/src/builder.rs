//! CLUT-based input profiles from measurements
//!
//! [`ClutInputProfileBuilder`] turns an `n×n×n` grid of measured XYZ values
//! (one per RGB grid node, red varying slowest) into an RGB→Lab input
//! profile with colorimetric and perceptual `A2Bx` tables.

use crate::clut::{Clut, ClutPrecision};
use crate::color::{D50, Xyz};
use crate::error::{Error, Result};
use crate::icc::pcs::{lab_to_xyz, xyz_to_lab};
use crate::icc::tags::{Lut16Data, MlucData, XyzTagData, identity_table};
use crate::icc::{
    ColorSpace, IccError, IccProfile, PcsEncoding, ProfileClass, RenderingIntent, TagData,
    TagSignature, ValidationStatus,
};
use crate::math::{Matrix3x3, bradford_matrix, chad_tag};

/// Perceptual reference medium black, relative to D50
pub const PRMG_BLACK: Xyz = Xyz::new(0.00336, 0.0034731, 0.00287);

const SHAPER_ENTRIES: usize = 4096;

/// Rescales colorimetric PCS values for the perceptual intent
///
/// Each XYZ channel is mapped linearly so that the colorimetric media black
/// lands on the perceptual reference medium black and the media white stays
/// on D50.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlackScaler {
    src_black: [f64; 3],
    src_white: [f64; 3],
    dst_black: [f64; 3],
    dst_white: [f64; 3],
}

impl BlackScaler {
    /// `media_black` is relative to D50, as stored in a colorimetric table
    pub fn new(media_black: Xyz) -> Self {
        Self {
            src_black: media_black.to_array(),
            src_white: D50.xyz.to_array(),
            dst_black: PRMG_BLACK.to_array(),
            dst_white: D50.xyz.to_array(),
        }
    }

    pub fn scale(&self, xyz: [f64; 3]) -> [f64; 3] {
        let mut out = [0.0; 3];
        for i in 0..3 {
            let src_range = self.src_white[i] - self.src_black[i];
            let dst_range = self.dst_white[i] - self.dst_black[i];
            out[i] = if src_range.abs() > 1e-12 {
                self.dst_black[i] + (xyz[i] - self.src_black[i]) * dst_range / src_range
            } else {
                xyz[i]
            };
        }
        out
    }

    /// Rescale one node of a table holding PCS values in `encoding`
    pub fn apply(&self, values: &mut [f64], encoding: PcsEncoding) {
        let actual = encoding.to_actual([values[0], values[1], values[2]]);
        let xyz = match encoding.space() {
            ColorSpace::Lab => lab_to_xyz(actual),
            _ => actual,
        };
        let scaled = self.scale(xyz);
        let back = match encoding.space() {
            ColorSpace::Lab => xyz_to_lab(scaled),
            _ => scaled,
        };
        let encoded = encoding.from_actual(back);
        for (v, e) in values.iter_mut().zip(encoded) {
            *v = e.clamp(0.0, 1.0);
        }
    }
}

/// Builder for an RGB input profile from a measured XYZ grid
#[derive(Debug, Clone)]
pub struct ClutInputProfileBuilder {
    grid_points: usize,
    measurements: Vec<Xyz>,
    flare: Xyz,
    illuminant: Xyz,
    shaper_gamma: f64,
    description: String,
    copyright: String,
}

impl ClutInputProfileBuilder {
    /// `measurements` holds `grid_points³` XYZ values, red slowest
    pub fn new(grid_points: usize, measurements: Vec<Xyz>) -> Self {
        Self {
            grid_points,
            measurements,
            flare: Xyz::new(0.0, 0.0, 0.0),
            illuminant: D50.xyz,
            shaper_gamma: 1.0,
            description: String::new(),
            copyright: String::new(),
        }
    }

    /// Flare subtracted from every measurement
    pub fn with_flare(mut self, flare: Xyz) -> Self {
        self.flare = flare;
        self
    }

    /// Scene illuminant; measurements are normalized by its Y
    pub fn with_illuminant(mut self, illuminant: Xyz) -> Self {
        self.illuminant = illuminant;
        self
    }

    /// Grid node `i` sits at device value `(i / (n - 1))^gamma`
    pub fn with_shaper_gamma(mut self, gamma: f64) -> Self {
        self.shaper_gamma = gamma;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_copyright(mut self, copyright: impl Into<String>) -> Self {
        self.copyright = copyright.into();
        self
    }

    fn check(&self) -> Result<()> {
        let n = self.grid_points;
        if !(2..=255).contains(&n) {
            return Err(IccError::InvalidClut(format!("{} grid points", n)).into());
        }
        let expected = n * n * n;
        if self.measurements.len() != expected {
            return Err(Error::BufferSize {
                expected,
                actual: self.measurements.len(),
            });
        }
        if self.illuminant.y <= 0.0 {
            return Err(Error::Transform("illuminant Y must be positive".to_string()));
        }
        if !(self.shaper_gamma.is_finite() && self.shaper_gamma > 0.0) {
            return Err(IccError::InvalidCurve(format!("shaper gamma {}", self.shaper_gamma)).into());
        }
        Ok(())
    }

    /// Adaptation from the normalized illuminant to D50
    pub fn adaptation(&self) -> Matrix3x3 {
        let normalized = self.illuminant.scale(1.0 / self.illuminant.y);
        bradford_matrix(normalized, D50.xyz)
    }

    fn adapt(&self, cat: &Matrix3x3, measured: Xyz) -> Xyz {
        cat.apply_xyz((measured - self.flare).scale(1.0 / self.illuminant.y))
    }

    fn shaper_table(&self) -> Vec<u16> {
        if (self.shaper_gamma - 1.0).abs() < 1e-12 {
            return identity_table(2);
        }
        let inv = 1.0 / self.shaper_gamma;
        (0..SHAPER_ENTRIES)
            .map(|i| {
                let x = i as f64 / (SHAPER_ENTRIES - 1) as f64;
                (x.powf(inv) * 65535.0 + 0.5).floor() as u16
            })
            .collect()
    }

    /// Relative colorimetric table: adapted XYZ scaled to D50 white, legacy Lab
    fn colorimetric_lut(&self, cat: &Matrix3x3, white: Xyz) -> Result<Lut16Data> {
        let n = self.grid_points;
        let relative = D50.xyz.ratio(&white);
        let mut clut = Clut::new(&[n, n, n], 3, ClutPrecision::U16)?;
        clut.iterate(|coord, values| {
            let index = (coord[0] * n + coord[1]) * n + coord[2];
            let xyz = self.adapt(cat, self.measurements[index]).scale_by(relative).to_array();
            let encoded = PcsEncoding::LabV2.from_actual(xyz_to_lab(xyz));
            for (v, e) in values.iter_mut().zip(encoded) {
                *v = e.clamp(0.0, 1.0);
            }
        });
        let lut = Lut16Data::new(
            vec![self.shaper_table(); 3],
            clut,
            vec![identity_table(2); 3],
        )?;
        Ok(lut)
    }

    pub fn build(&self) -> Result<IccProfile> {
        self.check()?;
        let n = self.grid_points;

        let mut profile = IccProfile::new(ProfileClass::Input, ColorSpace::Rgb, ColorSpace::Lab);
        profile.header.rendering_intent = RenderingIntent::RelativeColorimetric as u32;

        profile.attach_tag(
            TagSignature::DESC,
            TagData::MultiLocalizedUnicode(MlucData::english(self.description.clone())),
        );
        profile.attach_tag(
            TagSignature::COPYRIGHT,
            TagData::MultiLocalizedUnicode(MlucData::english(self.copyright.clone())),
        );

        let cat = self.adaptation();
        let white = self.adapt(&cat, self.measurements[n * n * n - 1]);
        let black = self.adapt(&cat, self.measurements[0]);
        if white.x <= 0.0 || white.y <= 0.0 || white.z <= 0.0 {
            return Err(Error::Transform(format!("measured white {:?} is not positive", white)));
        }
        profile.attach_tag(TagSignature::MEDIA_WHITE, TagData::Xyz(XyzTagData::new(white)));
        profile.attach_tag(TagSignature::MEDIA_BLACK, TagData::Xyz(XyzTagData::new(black)));
        profile.attach_tag(TagSignature::CHAD, chad_tag(&cat));

        let colorimetric = self.colorimetric_lut(&cat, white)?;
        let a2b1 = profile.attach_tag(TagSignature::A2B1, TagData::Lut16(colorimetric.clone()));
        profile.attach_shared(TagSignature::A2B2, a2b1);

        let scaler = BlackScaler::new(black.scale_by(D50.xyz.ratio(&white)));
        let mut perceptual = colorimetric;
        perceptual
            .clut
            .iterate(|_, values| scaler.apply(values, PcsEncoding::LabV2));
        profile.attach_tag(TagSignature::A2B0, TagData::Lut16(perceptual));

        let (status, report) = profile.validate();
        match status {
            ValidationStatus::Ok => {}
            _ => tracing::warn!(%status, "input profile validation:\n{}", report),
        }
        tracing::debug!(grid = n, tags = profile.tag_count(), "built CLUT input profile");
        Ok(profile)
    }
}
