//! Profiles built with oxicc for cross-checking
//!
//! Every fixture is constructed in memory, so the tests need no corpus on
//! disk. `*_bytes` variants serialize with default write options for handing
//! to the reference CMMs.

use oxicc_core::color::{D50, Xyz};
use oxicc_core::icc::tags::{CurveData, MlucData, ParametricCurveData, XyzTagData};
use oxicc_core::math::ParametricCurve;
use oxicc_core::math::matrix::SRGB_TO_XYZ_D50;
use oxicc_core::{
    ClutInputProfileBuilder, ColorSpace, IccProfile, ProfileClass, TagData, TagSignature,
    WriteOptions,
};

fn describe(profile: &mut IccProfile, text: &str) {
    profile.attach_tag(
        TagSignature::DESC,
        TagData::MultiLocalizedUnicode(MlucData::english(text)),
    );
    profile.attach_tag(
        TagSignature::COPYRIGHT,
        TagData::MultiLocalizedUnicode(MlucData::english("No copyright, use freely")),
    );
    profile.attach_tag(TagSignature::MEDIA_WHITE, TagData::Xyz(XyzTagData::new(D50.xyz)));
}

fn rgb_profile(trc: TagData, text: &str) -> IccProfile {
    let mut p = IccProfile::new(ProfileClass::Display, ColorSpace::Rgb, ColorSpace::Xyz);
    describe(&mut p, text);
    let m = SRGB_TO_XYZ_D50.to_row_major();
    let colorants = [
        TagSignature::RED_COLORANT,
        TagSignature::GREEN_COLORANT,
        TagSignature::BLUE_COLORANT,
    ];
    for (i, sig) in colorants.into_iter().enumerate() {
        let column = Xyz::new(m[i], m[3 + i], m[6 + i]);
        p.attach_tag(sig, TagData::Xyz(XyzTagData::new(column)));
    }
    let shared = p.attach_tag(TagSignature::RED_TRC, trc);
    p.attach_shared(TagSignature::GREEN_TRC, shared.clone());
    p.attach_shared(TagSignature::BLUE_TRC, shared);
    p
}

/// sRGB primaries with the sRGB parametric curve
pub fn srgb_profile() -> IccProfile {
    let curve = ParametricCurveData::from_curve(&ParametricCurve::srgb());
    rgb_profile(TagData::ParametricCurve(curve), "oxicc sRGB")
}

/// sRGB primaries with a pure gamma `curv`
pub fn gamma_rgb_profile(gamma: f64) -> IccProfile {
    rgb_profile(
        TagData::Curve(CurveData::gamma(gamma)),
        &format!("oxicc gamma {}", gamma),
    )
}

pub fn gray_profile(gamma: f64) -> IccProfile {
    let mut p = IccProfile::new(ProfileClass::Display, ColorSpace::Gray, ColorSpace::Xyz);
    describe(&mut p, "oxicc gray");
    p.attach_tag(TagSignature::GRAY_TRC, TagData::Curve(CurveData::gamma(gamma)));
    p
}

/// sRGB measured on a `grid³` lattice, as a LUT-based input profile
pub fn clut_input_profile(grid: usize) -> anyhow::Result<IccProfile> {
    let curve = ParametricCurve::srgb();
    let step = |i: usize| curve.eval(i as f64 / (grid - 1) as f64);
    let mut measurements = Vec::with_capacity(grid * grid * grid);
    for r in 0..grid {
        for g in 0..grid {
            for b in 0..grid {
                let xyz = SRGB_TO_XYZ_D50.multiply_vec([step(r), step(g), step(b)]);
                measurements.push(Xyz::from_array(xyz));
            }
        }
    }
    let profile = ClutInputProfileBuilder::new(grid, measurements)
        .with_description("oxicc sRGB scanner")
        .with_copyright("No copyright, use freely")
        .build()?;
    Ok(profile)
}

/// Serialize with default options
pub fn to_bytes(profile: &mut IccProfile) -> anyhow::Result<Vec<u8>> {
    Ok(profile.to_bytes(&WriteOptions::default())?)
}
