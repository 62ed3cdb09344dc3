//! Reference CMS wrappers
//!
//! Thin helpers that run the same transform through lcms2 or qcms from raw
//! profile bytes.

use anyhow::{Context, Result};
use lcms2::{CIExyY, GlobalContext, Intent, PixelFormat, Profile, Transform};

use oxicc_core::RenderingIntent;

pub fn lcms2_intent(intent: RenderingIntent) -> Intent {
    match intent {
        RenderingIntent::Perceptual => Intent::Perceptual,
        RenderingIntent::RelativeColorimetric => Intent::RelativeColorimetric,
        RenderingIntent::Saturation => Intent::Saturation,
        RenderingIntent::AbsoluteColorimetric => Intent::AbsoluteColorimetric,
    }
}

fn d50_xyy() -> CIExyY {
    CIExyY {
        x: 0.3457,
        y: 0.3585,
        Y: 1.0,
    }
}

/// RGB8 → RGB8 through lcms2
pub fn lcms2_rgb8(
    src_icc: &[u8],
    dst_icc: &[u8],
    intent: RenderingIntent,
    pixels: &[u8],
) -> Result<Vec<u8>> {
    let src = Profile::new_icc(src_icc).context("lcms2 rejected source profile")?;
    let dst = Profile::new_icc(dst_icc).context("lcms2 rejected destination profile")?;
    let transform = Transform::new(
        &src,
        PixelFormat::RGB_8,
        &dst,
        PixelFormat::RGB_8,
        lcms2_intent(intent),
    )
    .context("lcms2 transform")?;

    let src_px: Vec<[u8; 3]> = pixels.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect();
    let mut dst_px = vec![[0u8; 3]; src_px.len()];
    transform.transform_pixels(&src_px, &mut dst_px);
    Ok(dst_px.into_iter().flatten().collect())
}

/// RGB in [0, 1] → D50 Lab through lcms2
pub fn lcms2_rgb_to_lab(
    src_icc: &[u8],
    intent: RenderingIntent,
    rgb: &[[f64; 3]],
) -> Result<Vec<[f64; 3]>> {
    let src = Profile::new_icc(src_icc).context("lcms2 rejected source profile")?;
    let lab = Profile::new_lab4_context(GlobalContext::new(), &d50_xyy())
        .context("lcms2 Lab profile")?;
    let transform = Transform::<[f64; 3], [f64; 3]>::new(
        &src,
        PixelFormat::RGB_DBL,
        &lab,
        PixelFormat::Lab_DBL,
        lcms2_intent(intent),
    )
    .context("lcms2 transform")?;

    let mut out = vec![[0.0f64; 3]; rgb.len()];
    transform.transform_pixels(rgb, &mut out);
    Ok(out)
}

/// Gray8 → Gray8 through lcms2
pub fn lcms2_gray8(src_icc: &[u8], dst_icc: &[u8], pixels: &[u8]) -> Result<Vec<u8>> {
    let src = Profile::new_icc(src_icc).context("lcms2 rejected source profile")?;
    let dst = Profile::new_icc(dst_icc).context("lcms2 rejected destination profile")?;
    let transform = Transform::new(
        &src,
        PixelFormat::GRAY_8,
        &dst,
        PixelFormat::GRAY_8,
        Intent::Perceptual,
    )
    .context("lcms2 transform")?;

    let mut out = vec![0u8; pixels.len()];
    transform.transform_pixels(pixels, &mut out);
    Ok(out)
}

/// Serialize one of lcms2's built-in profiles
pub fn lcms2_builtin(name: &str) -> Result<Vec<u8>> {
    let profile = match name {
        "srgb" => Profile::new_srgb(),
        "lab4" => Profile::new_lab4_context(GlobalContext::new(), &d50_xyy())
            .context("lcms2 Lab profile")?,
        "xyz" => Profile::new_xyz(),
        other => anyhow::bail!("no lcms2 built-in named {}", other),
    };
    profile.icc().context("lcms2 serialization")
}

/// RGB8 → RGB8 through qcms
pub fn qcms_rgb8(src_icc: &[u8], dst_icc: &[u8], pixels: &[u8]) -> Result<Vec<u8>> {
    let src = qcms::Profile::new_from_slice(src_icc, false).context("qcms rejected source")?;
    let dst =
        qcms::Profile::new_from_slice(dst_icc, false).context("qcms rejected destination")?;
    let transform = qcms::Transform::new(&src, &dst, qcms::DataType::RGB8, qcms::Intent::Perceptual)
        .context("qcms transform")?;
    let mut data = pixels.to_vec();
    transform.apply(&mut data);
    Ok(data)
}
