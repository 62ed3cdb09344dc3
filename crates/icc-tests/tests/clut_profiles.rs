//! CLUT input profiles from measured grids
//!
//! The measurements are synthesized from the sRGB model, so the relative
//! colorimetric table can be checked against the closed form.

use icc_tests::accuracy::srgb8_to_lab;
use icc_tests::compare_lab;
use icc_tests::fixtures::{self, to_bytes};
use icc_tests::patterns::{TestPattern, generate_u8};
use oxicc_core::clut::Interpolation;
use oxicc_core::color::{D65, Xyz};
use oxicc_core::icc::tags::TagData;
use oxicc_core::math::ParametricCurve;
use oxicc_core::math::matrix::SRGB_TO_XYZ_D50;
use oxicc_core::pipeline::{Cmm, CmmConfig};
use oxicc_core::{
    ClutInputProfileBuilder, IccProfile, RenderingIntent, TagSignature, ValidationStatus,
};

fn lab_of(cmm: &Cmm, pixels: &[u8]) -> Vec<[f64; 3]> {
    pixels
        .chunks_exact(3)
        .map(|c| {
            let mut lab = [0.0; 3];
            cmm.apply(&mut lab, &[c[0], c[1], c[2]].map(|v| v as f64 / 255.0));
            lab
        })
        .collect()
}

#[test]
fn test_relative_matches_model() {
    let profile = fixtures::clut_input_profile(33).unwrap();
    let pixels = generate_u8(TestPattern::Random(5), 3, 3000);
    let expected: Vec<[f64; 3]> = pixels
        .chunks_exact(3)
        .map(|c| srgb8_to_lab([c[0], c[1], c[2]]).to_array())
        .collect();

    for interpolation in [Interpolation::Tetrahedral, Interpolation::Trilinear] {
        let config = CmmConfig::default().with_interpolation(interpolation);
        let cmm =
            Cmm::from_profiles(&[&profile], &[RenderingIntent::RelativeColorimetric], &config)
                .unwrap();
        let stats = compare_lab(&expected, &lab_of(&cmm, &pixels));
        eprintln!("{:?}: {}", interpolation, stats);
        assert!(stats.is_good(), "{:?}: {}", interpolation, stats);
    }
}

#[test]
fn test_saturation_shares_colorimetric() {
    let mut profile = fixtures::clut_input_profile(9).unwrap();
    let bytes = to_bytes(&mut profile).unwrap();
    let back = IccProfile::from_bytes(&bytes).unwrap();
    assert!(back.are_shared(TagSignature::A2B1, TagSignature::A2B2));

    let pixels = generate_u8(TestPattern::Lattice(5), 3, 0);
    let build = |intent| Cmm::from_profiles(&[&back], &[intent], &CmmConfig::default()).unwrap();
    let rel = lab_of(&build(RenderingIntent::RelativeColorimetric), &pixels);
    let sat = lab_of(&build(RenderingIntent::Saturation), &pixels);
    assert_eq!(rel, sat);
}

#[test]
fn test_perceptual_lifts_black_only() {
    let profile = fixtures::clut_input_profile(9).unwrap();
    let rel = Cmm::from_profiles(
        &[&profile],
        &[RenderingIntent::RelativeColorimetric],
        &CmmConfig::default(),
    )
    .unwrap();
    let per =
        Cmm::from_profiles(&[&profile], &[RenderingIntent::Perceptual], &CmmConfig::default())
            .unwrap();

    let black = lab_of(&per, &[0, 0, 0])[0];
    assert!(black[0] > 2.5 && black[0] < 3.5, "{:?}", black);
    assert!(lab_of(&rel, &[0, 0, 0])[0][0] < 0.1);

    let white_rel = lab_of(&rel, &[255, 255, 255])[0];
    let white_per = lab_of(&per, &[255, 255, 255])[0];
    assert!((white_rel[0] - white_per[0]).abs() < 0.05);
}

#[test]
fn test_flare_and_illuminant() {
    let grid = 5;
    let curve = ParametricCurve::srgb();
    let step = |i: usize| curve.eval(i as f64 / (grid - 1) as f64);
    let flare = Xyz::new(0.5, 0.5, 0.5);
    let mut measurements = Vec::new();
    for r in 0..grid {
        for g in 0..grid {
            for b in 0..grid {
                let xyz = SRGB_TO_XYZ_D50.multiply_vec([step(r), step(g), step(b)]);
                // measured under D65 at 100 cd/m², plus flare
                let scaled = Xyz::from_array(xyz).scale(100.0);
                measurements.push(Xyz::new(
                    scaled.x + flare.x,
                    scaled.y + flare.y,
                    scaled.z + flare.z,
                ));
            }
        }
    }

    let profile = ClutInputProfileBuilder::new(grid, measurements)
        .with_flare(flare)
        .with_illuminant(D65.xyz.scale(100.0))
        .with_description("flare test")
        .build()
        .unwrap();

    let black = profile.media_black_point().unwrap();
    assert!(black.y.abs() < 1e-3, "{:?}", black);
    assert!(profile.with_tag(TagSignature::CHAD, |t| match t {
        TagData::S15Fixed16Array(v) => Some(v.len() == 9),
        _ => None,
    }) == Some(true));

    let (status, report) = profile.validate();
    assert!(status <= ValidationStatus::Warning, "{}", report);

    // relative colorimetric white is D50 whatever the illuminant
    let cmm = Cmm::from_profiles(
        &[&profile],
        &[RenderingIntent::RelativeColorimetric],
        &CmmConfig::default(),
    )
    .unwrap();
    let white = lab_of(&cmm, &[255, 255, 255])[0];
    assert!((white[0] - 100.0).abs() < 0.05, "{:?}", white);
    assert!(white[1].abs() < 0.2 && white[2].abs() < 0.2, "{:?}", white);
}

#[test]
fn test_shaper_gamma() {
    let grid = 9;
    let gamma = 2.2;
    let mut measurements = Vec::new();
    // node i sits at device value (i / (n - 1))^gamma
    let device = |i: usize| (i as f64 / (grid - 1) as f64).powf(gamma);
    let linear = |v: f64| ParametricCurve::srgb().eval(v);
    for r in 0..grid {
        for g in 0..grid {
            for b in 0..grid {
                let rgb = [device(r), device(g), device(b)].map(linear);
                measurements.push(Xyz::from_array(SRGB_TO_XYZ_D50.multiply_vec(rgb)));
            }
        }
    }
    let profile = ClutInputProfileBuilder::new(grid, measurements)
        .with_shaper_gamma(gamma)
        .build()
        .unwrap();
    let cmm = Cmm::from_profiles(
        &[&profile],
        &[RenderingIntent::RelativeColorimetric],
        &CmmConfig::default(),
    )
    .unwrap();

    let pixels = generate_u8(TestPattern::Grayscale, 3, 64);
    let expected: Vec<[f64; 3]> = pixels
        .chunks_exact(3)
        .map(|c| srgb8_to_lab([c[0], c[1], c[2]]).to_array())
        .collect();
    let stats = compare_lab(&expected, &lab_of(&cmm, &pixels));
    eprintln!("shaper gamma {}: {}", gamma, stats);
    assert!(stats.is_acceptable(), "{}", stats);
}
