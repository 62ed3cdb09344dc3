//! Profile interchange
//!
//! Bytes written by lcms2 are read by oxicc and the other way round; a
//! rewritten profile must still transform the same.

use icc_tests::fixtures::{self, to_bytes};
use icc_tests::patterns::{TestPattern, generate_u8};
use icc_tests::reference;
use oxicc_core::icc::ProfileVersion;
use oxicc_core::pipeline::{self, Cmm, CmmConfig};
use oxicc_core::{
    ColorSpace, IccProfile, RenderingIntent, TagSignature, ValidationStatus, WriteOptions,
};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

#[test]
fn test_read_lcms2_srgb() {
    let bytes = reference::lcms2_builtin("srgb").unwrap();
    let profile = IccProfile::from_bytes(&bytes).unwrap();

    assert_eq!(profile.header.color_space, ColorSpace::Rgb);
    assert!(profile.is_matrix_shaper());
    let (status, report) = profile.validate();
    eprintln!("{}\n{}", profile.describe(), report);
    assert!(status <= ValidationStatus::Warning, "{}", report);

    let red = profile.red_colorant().unwrap();
    assert!((red.x - 0.4361).abs() < 1e-3, "{:?}", red);
}

#[test]
fn test_lcms2_srgb_rewrite_transforms_same() {
    let original = reference::lcms2_builtin("srgb").unwrap();
    let mut profile = IccProfile::from_bytes(&original).unwrap();
    let rewritten = profile.to_bytes(&WriteOptions::default()).unwrap();

    let mut ours = fixtures::gamma_rgb_profile(2.2);
    let target = to_bytes(&mut ours).unwrap();
    let pixels = generate_u8(TestPattern::Random(11), 3, 2048);

    let a = reference::lcms2_rgb8(&original, &target, RenderingIntent::Perceptual, &pixels).unwrap();
    let b =
        reference::lcms2_rgb8(&rewritten, &target, RenderingIntent::Perceptual, &pixels).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_lcms2_reads_our_profiles() {
    let mut srgb = fixtures::srgb_profile();
    let bytes = to_bytes(&mut srgb).unwrap();
    let lcms = lcms2::Profile::new_icc(&bytes).unwrap();
    assert_eq!(lcms.color_space(), lcms2::ColorSpaceSignature::RgbData);

    // lcms2 re-serializes; the colorants must survive both trips
    let again = lcms.icc().unwrap();
    let back = IccProfile::from_bytes(&again).unwrap();
    let (ours, theirs) = (srgb.green_colorant().unwrap(), back.green_colorant().unwrap());
    assert!(ours.approx_eq(&theirs, 1e-4), "{:?} vs {:?}", ours, theirs);
}

#[test]
fn test_lab_identity_profile() {
    let bytes = reference::lcms2_builtin("lab4").unwrap();
    let lab = IccProfile::from_bytes(&bytes).unwrap();
    assert_eq!(lab.header.color_space, ColorSpace::Lab);

    let srgb = fixtures::srgb_profile();
    let direct = Cmm::from_profiles(&[&srgb], &[], &CmmConfig::default()).unwrap();
    let through = Cmm::from_profiles(&[&srgb, &lab], &[], &CmmConfig::default()).unwrap();
    assert_eq!(through.output_space(), Some(ColorSpace::Lab));

    let mut xyz = [0.0; 3];
    let mut out = [0.0; 3];
    for px in [[1.0, 1.0, 1.0], [0.5, 0.2, 0.8], [0.0, 0.0, 0.0]] {
        direct.apply(&mut xyz, &px);
        through.apply(&mut out, &px);
        let expected = oxicc_core::Lab::from_xyz(oxicc_core::Xyz::from_array(xyz));
        assert!((out[0] - expected.l).abs() < 0.05, "{:?} vs {:?}", out, expected);
        assert!((out[1] - expected.a).abs() < 0.1, "{:?} vs {:?}", out, expected);
        assert!((out[2] - expected.b).abs() < 0.1, "{:?} vs {:?}", out, expected);
    }
}

#[test]
fn test_profile_id_and_fingerprint() {
    let mut profile = fixtures::srgb_profile();
    let bytes = to_bytes(&mut profile).unwrap();
    let back = IccProfile::from_bytes(&bytes).unwrap();
    assert_eq!(back.header.profile_id, back.compute_fingerprint().unwrap());

    let (status, report) = back.validate();
    assert!(status <= ValidationStatus::Warning, "{}", report);

    let mut v2 = back;
    let v2_bytes = v2
        .to_bytes(&WriteOptions::default().with_version(ProfileVersion::V2_1))
        .unwrap();
    assert!(v2_bytes[84..100].iter().all(|&b| b == 0));
}

#[test]
fn test_shared_trc_roundtrip() {
    let mut profile = fixtures::srgb_profile();
    let bytes = to_bytes(&mut profile).unwrap();
    let back = IccProfile::from_bytes(&bytes).unwrap();
    assert!(back.are_shared(TagSignature::RED_TRC, TagSignature::GREEN_TRC));
    assert!(back.are_shared(TagSignature::GREEN_TRC, TagSignature::BLUE_TRC));

    let mut back = back;
    let again = back.to_bytes(&WriteOptions::default()).unwrap();
    assert_eq!(bytes, again);
}

#[test]
fn test_mutated_bytes_never_panic() {
    let mut profile = fixtures::clut_input_profile(5).unwrap();
    let bytes = to_bytes(&mut profile).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(0x1cc);
    let mut parsed = 0;

    for _ in 0..500 {
        let mut data = bytes.clone();
        for _ in 0..rng.gen_range(1..8) {
            let i = rng.gen_range(0..data.len());
            data[i] = rng.r#gen();
        }
        if rng.gen_bool(0.2) {
            data.truncate(rng.gen_range(0..data.len()));
        }

        let Ok(p) = IccProfile::from_bytes(&data) else {
            continue;
        };
        parsed += 1;
        let _ = p.validate();
        let _ = p.describe();
        if let Ok(cmm) = Cmm::from_profiles(&[&p], &[], &CmmConfig::default()) {
            let n_in = cmm.input_channels();
            let src = vec![128u8; n_in * 4];
            let mut dst = vec![0u8; cmm.output_channels() * 4];
            let _ = pipeline::transform_u8(&cmm, &src, &mut dst);
        }
    }
    eprintln!("{} of 500 mutated profiles parsed", parsed);
}
