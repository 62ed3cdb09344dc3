//! Accuracy measurement using perceptual color difference metrics
//!
//! CIEDE2000 is the primary metric. RGB buffers are compared after mapping
//! through the sRGB primaries to D50 Lab, which is close enough for ranking
//! differences between two CMMs on the same data.

use oxicc_core::color::{Lab, Xyz, delta_e_2000};
use oxicc_core::math::matrix::SRGB_TO_XYZ_D50;

/// Statistics from a deltaE comparison
#[derive(Debug, Clone)]
pub struct DeltaEStats {
    pub mean: f64,
    pub max: f64,
    /// 95th percentile deltaE
    pub p95: f64,
    pub count: usize,
}

impl DeltaEStats {
    /// Every difference below 1.0
    pub fn is_excellent(&self) -> bool {
        self.max < 1.0
    }

    pub fn is_good(&self) -> bool {
        self.max < 2.0
    }

    pub fn is_acceptable(&self) -> bool {
        self.max < 3.5
    }

    fn from_samples(mut delta_es: Vec<f64>) -> Self {
        delta_es.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let count = delta_es.len();
        let mean = if count == 0 {
            0.0
        } else {
            delta_es.iter().sum::<f64>() / count as f64
        };
        let max = delta_es.last().copied().unwrap_or(0.0);
        let p95 = delta_es
            .get((count as f64 * 0.95) as usize)
            .copied()
            .unwrap_or(max);
        Self {
            mean,
            max,
            p95,
            count,
        }
    }
}

impl std::fmt::Display for DeltaEStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "dE2000 mean {:.4} p95 {:.4} max {:.4} over {}",
            self.mean, self.p95, self.max, self.count
        )
    }
}

fn decode_srgb(v: f64) -> f64 {
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

/// 8-bit sRGB to D50 Lab
pub fn srgb8_to_lab(rgb: [u8; 3]) -> Lab {
    let linear = rgb.map(|c| decode_srgb(c as f64 / 255.0));
    Lab::from_xyz(Xyz::from_array(SRGB_TO_XYZ_D50.multiply_vec(linear)))
}

/// Compare two RGB8 buffers through sRGB-interpreted Lab
pub fn compare_rgb_buffers(reference: &[u8], result: &[u8]) -> DeltaEStats {
    assert_eq!(reference.len(), result.len());
    assert_eq!(reference.len() % 3, 0);

    let samples = reference
        .chunks_exact(3)
        .zip(result.chunks_exact(3))
        .map(|(a, b)| {
            delta_e_2000(
                srgb8_to_lab([a[0], a[1], a[2]]),
                srgb8_to_lab([b[0], b[1], b[2]]),
            )
        })
        .collect();
    DeltaEStats::from_samples(samples)
}

/// Compare two lists of Lab triples
pub fn compare_lab(reference: &[[f64; 3]], result: &[[f64; 3]]) -> DeltaEStats {
    assert_eq!(reference.len(), result.len());
    let samples = reference
        .iter()
        .zip(result)
        .map(|(a, b)| delta_e_2000(Lab::from_array(*a), Lab::from_array(*b)))
        .collect();
    DeltaEStats::from_samples(samples)
}

/// Largest per-channel difference between two integer buffers
pub fn max_channel_diff<T: Copy + Into<i64>>(a: &[T], b: &[T]) -> i64 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| (x.into() - y.into()).abs())
        .max()
        .unwrap_or(0)
}
