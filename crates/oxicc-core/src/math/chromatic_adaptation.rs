//! Chromatic Adaptation Transforms
//!
//! Matrices that map XYZ under one white to XYZ under another, and the `chad`
//! tag that records the adaptation a profile applied to reach the D50 PCS.
//!
//! References:
//! - ICC.1:2022 Annex E
//! - Lindbloom: http://www.brucelindbloom.com/index.html?Eqn_ChromAdapt.html

use crate::color::Xyz;
use crate::icc::tags::TagData;
use crate::icc::types::S15Fixed16;
use crate::math::Matrix3x3;

/// Chromatic adaptation method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChromaticAdaptationMethod {
    /// Bradford adaptation (ICC default, recommended)
    #[default]
    Bradford,
    /// Von Kries adaptation
    VonKries,
    /// XYZ Scaling
    XyzScaling,
}

impl ChromaticAdaptationMethod {
    /// Cone response matrix (XYZ → LMS)
    pub fn cone_matrix(self) -> Matrix3x3 {
        match self {
            Self::Bradford => BRADFORD_XYZ_TO_LMS,
            Self::VonKries => VON_KRIES_XYZ_TO_LMS,
            Self::XyzScaling => Matrix3x3::identity(),
        }
    }
}

const BRADFORD_XYZ_TO_LMS: Matrix3x3 = Matrix3x3::new([
    [0.8951000, 0.2664000, -0.1614000],
    [-0.7502000, 1.7135000, 0.0367000],
    [0.0389000, -0.0685000, 1.0296000],
]);

const VON_KRIES_XYZ_TO_LMS: Matrix3x3 = Matrix3x3::new([
    [0.4002400, 0.7076000, -0.0808100],
    [-0.2263000, 1.1653200, 0.0457000],
    [0.0000000, 0.0000000, 0.9182200],
]);

/// Matrix M such that `XYZ_dst = M × XYZ_src` for the given source and
/// destination whites.
///
/// Cone responses of zero leave the corresponding channel unscaled.
pub fn adaptation_matrix(src_white: Xyz, dst_white: Xyz, method: ChromaticAdaptationMethod) -> Matrix3x3 {
    let m_a = method.cone_matrix();
    let Some(m_a_inv) = m_a.inverse() else {
        return Matrix3x3::identity();
    };

    let src_lms = m_a.multiply_vec(src_white.to_array());
    let dst_lms = m_a.multiply_vec(dst_white.to_array());
    let ratio = |i: usize| {
        if src_lms[i].abs() > 1e-10 {
            dst_lms[i] / src_lms[i]
        } else {
            1.0
        }
    };
    let scale = Matrix3x3::diagonal(ratio(0), ratio(1), ratio(2));

    m_a_inv.multiply(&scale.multiply(&m_a))
}

/// Bradford matrix between two whites
#[inline]
pub fn bradford_matrix(src_white: Xyz, dst_white: Xyz) -> Matrix3x3 {
    adaptation_matrix(src_white, dst_white, ChromaticAdaptationMethod::Bradford)
}

/// Adapt an XYZ color from one white point to another
#[inline]
pub fn adapt_xyz(xyz: Xyz, src_white: Xyz, dst_white: Xyz, method: ChromaticAdaptationMethod) -> Xyz {
    adaptation_matrix(src_white, dst_white, method).apply_xyz(xyz)
}

/// `chad` tag payload: the nine matrix entries, row major, as `sf32`
pub fn chad_tag(matrix: &Matrix3x3) -> TagData {
    TagData::S15Fixed16Array(
        matrix
            .to_row_major()
            .iter()
            .map(|&v| S15Fixed16::from_f64(v))
            .collect(),
    )
}

/// Recover the matrix from a `chad` payload; None unless it is `sf32` with nine entries
pub fn chad_matrix(data: &TagData) -> Option<Matrix3x3> {
    match data {
        TagData::S15Fixed16Array(values) if values.len() == 9 => {
            let mut v = [0.0; 9];
            for (dst, src) in v.iter_mut().zip(values) {
                *dst = src.to_f64();
            }
            Some(Matrix3x3::from_row_major(&v))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{A, D50, D65};

    const D65_TO_D50_BRADFORD: Matrix3x3 = Matrix3x3::new([
        [1.0478112, 0.0228866, -0.0501270],
        [0.0295424, 0.9904844, -0.0170491],
        [-0.0092345, 0.0150436, 0.7521316],
    ]);

    #[test]
    fn test_identity_adaptation() {
        let matrix = bradford_matrix(D65.xyz, D65.xyz);
        assert!(matrix.is_identity(1e-6));
    }

    #[test]
    fn test_d65_to_d50() {
        let computed = bradford_matrix(D65.xyz, D50.xyz);
        assert!(
            computed.approx_eq(&D65_TO_D50_BRADFORD, 1e-3),
            "D65→D50 matrix mismatch: computed={:?} expected={:?}",
            computed,
            D65_TO_D50_BRADFORD
        );
    }

    #[test]
    fn test_white_maps_to_white() {
        for method in [
            ChromaticAdaptationMethod::Bradford,
            ChromaticAdaptationMethod::VonKries,
            ChromaticAdaptationMethod::XyzScaling,
        ] {
            let adapted = adapt_xyz(A.xyz, A.xyz, D50.xyz, method);
            assert!(
                adapted.approx_eq(&D50.xyz, 1e-9),
                "{:?}: {:?} vs {:?}",
                method,
                adapted,
                D50.xyz
            );
        }
    }

    #[test]
    fn test_roundtrip() {
        let m1 = bradford_matrix(D65.xyz, D50.xyz);
        let m2 = bradford_matrix(D50.xyz, D65.xyz);
        assert!(m1.multiply(&m2).is_identity(1e-9));
    }

    #[test]
    fn test_chad_tag() {
        let m = bradford_matrix(D65.xyz, D50.xyz);
        let tag = chad_tag(&m);
        match &tag {
            TagData::S15Fixed16Array(v) => assert_eq!(v.len(), 9),
            other => panic!("unexpected payload {:?}", other),
        }
        let back = chad_matrix(&tag).unwrap();
        assert!(back.approx_eq(&m, 1.0 / 65536.0));
        assert!(chad_matrix(&TagData::S15Fixed16Array(vec![])).is_none());
    }
}
