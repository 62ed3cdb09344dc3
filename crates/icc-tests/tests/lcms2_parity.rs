//! lcms2 parity tests
//!
//! Profiles are built with oxicc, serialized, and handed to lcms2, so each
//! test also checks that lcms2 accepts what we write.

use icc_tests::fixtures::{self, to_bytes};
use icc_tests::patterns::{TestPattern, generate_u8, generate_unit};
use icc_tests::reference;
use icc_tests::{ParityTest, ReferenceCms, compare_lab};
use oxicc_core::color::{Lab, Xyz};
use oxicc_core::pipeline::{self, Cmm, CmmConfig};
use oxicc_core::{RenderingIntent, ValidationStatus};

#[test]
fn test_srgb_identity() {
    let mut a = fixtures::srgb_profile();
    let mut b = fixtures::srgb_profile();
    let pixels = generate_u8(TestPattern::Lattice(16), 3, 0);

    let result = ParityTest::new("sRGB identity", ReferenceCms::Lcms2)
        .run(&mut a, &mut b, &pixels)
        .unwrap();
    eprintln!("{}", result);
    assert!(result.max_diff <= 1, "{}", result);
}

#[test]
fn test_gamma_to_srgb() {
    let pixels = generate_u8(TestPattern::Random(7), 3, 4096);
    for gamma in [1.0, 1.8, 2.2] {
        let mut src = fixtures::gamma_rgb_profile(gamma);
        let mut dst = fixtures::srgb_profile();
        let result = ParityTest::new(format!("gamma {} -> sRGB", gamma), ReferenceCms::Lcms2)
            .with_intent(RenderingIntent::RelativeColorimetric)
            .run(&mut src, &mut dst, &pixels)
            .unwrap();
        eprintln!("{}", result);
        assert!(result.delta_e.is_excellent(), "{}", result);
        assert!(result.max_diff <= 2, "{}", result);
    }
}

#[test]
fn test_srgb_to_lab() {
    let mut srgb = fixtures::srgb_profile();
    let bytes = to_bytes(&mut srgb).unwrap();
    let unit = generate_unit(TestPattern::Lattice(9), 3, 0);
    let rgb: Vec<[f64; 3]> = unit.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect();

    let theirs =
        reference::lcms2_rgb_to_lab(&bytes, RenderingIntent::RelativeColorimetric, &rgb).unwrap();

    let cmm = Cmm::from_profiles(
        &[&srgb],
        &[RenderingIntent::RelativeColorimetric],
        &CmmConfig::default(),
    )
    .unwrap();
    let ours: Vec<[f64; 3]> = rgb
        .iter()
        .map(|px| {
            let mut xyz = [0.0; 3];
            cmm.apply(&mut xyz, px);
            Lab::from_xyz(Xyz::from_array(xyz)).to_array()
        })
        .collect();

    let stats = compare_lab(&theirs, &ours);
    eprintln!("sRGB -> Lab: {}", stats);
    assert!(stats.max < 0.1, "{}", stats);
}

#[test]
fn test_clut_input_profile_to_lab() {
    let mut profile = fixtures::clut_input_profile(17).unwrap();
    let (status, report) = profile.validate();
    assert!(status <= ValidationStatus::Warning, "{}", report);
    let bytes = to_bytes(&mut profile).unwrap();

    let unit = generate_unit(TestPattern::Random(99), 3, 2000);
    let rgb: Vec<[f64; 3]> = unit.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect();

    for intent in [RenderingIntent::RelativeColorimetric, RenderingIntent::Perceptual] {
        let theirs = reference::lcms2_rgb_to_lab(&bytes, intent, &rgb).unwrap();
        let cmm = Cmm::from_profiles(&[&profile], &[intent], &CmmConfig::default()).unwrap();
        let ours: Vec<[f64; 3]> = rgb
            .iter()
            .map(|px| {
                let mut lab = [0.0; 3];
                cmm.apply(&mut lab, px);
                lab
            })
            .collect();

        let stats = compare_lab(&theirs, &ours);
        eprintln!("CLUT input {:?}: {}", intent, stats);
        assert!(stats.is_excellent(), "{:?}: {}", intent, stats);
    }
}

#[test]
fn test_gray_to_gray() {
    let mut src = fixtures::gray_profile(2.2);
    let mut dst = fixtures::gray_profile(1.0);
    let src_bytes = to_bytes(&mut src).unwrap();
    let dst_bytes = to_bytes(&mut dst).unwrap();
    let pixels: Vec<u8> = (0..=255).collect();

    let theirs = reference::lcms2_gray8(&src_bytes, &dst_bytes, &pixels).unwrap();
    let cmm = Cmm::from_profiles(&[&src, &dst], &[], &CmmConfig::default()).unwrap();
    let mut ours = vec![0u8; pixels.len()];
    pipeline::transform_u8(&cmm, &pixels, &mut ours).unwrap();

    let diff = icc_tests::accuracy::max_channel_diff(&theirs, &ours);
    assert!(diff <= 1, "gray max diff {}", diff);
}
