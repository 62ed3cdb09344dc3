//! Test pattern generation

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Test pattern types
#[derive(Debug, Clone, Copy)]
pub enum TestPattern {
    /// Every corner of the device cube
    Corners,
    /// Equal channels ramping from 0 to full
    Grayscale,
    /// A regular lattice with `n` steps per channel
    Lattice(usize),
    /// Random samples with seed
    Random(u64),
    /// Saturated colors near gamut boundary
    GamutBoundary,
}

/// Interleaved 8-bit samples with `channels` components per pixel
pub fn generate_u8(pattern: TestPattern, channels: usize, pixels: usize) -> Vec<u8> {
    generate_unit(pattern, channels, pixels)
        .into_iter()
        .map(|v| (v * 255.0 + 0.5) as u8)
        .collect()
}

/// Interleaved 16-bit samples
pub fn generate_u16(pattern: TestPattern, channels: usize, pixels: usize) -> Vec<u16> {
    generate_unit(pattern, channels, pixels)
        .into_iter()
        .map(|v| (v * 65535.0 + 0.5) as u16)
        .collect()
}

/// Interleaved samples in [0, 1]
///
/// Lattice patterns ignore `pixels` and produce the full lattice.
pub fn generate_unit(pattern: TestPattern, channels: usize, pixels: usize) -> Vec<f64> {
    match pattern {
        TestPattern::Corners => {
            let count = 1usize << channels;
            (0..count.max(pixels))
                .flat_map(|i| (0..channels).map(move |c| (((i % count) >> c) & 1) as f64))
                .collect()
        }
        TestPattern::Grayscale => {
            let denom = pixels.saturating_sub(1).max(1) as f64;
            (0..pixels)
                .flat_map(|i| std::iter::repeat_n(i as f64 / denom, channels))
                .collect()
        }
        TestPattern::Lattice(steps) => {
            let steps = steps.max(2);
            let total = steps.pow(channels as u32);
            let mut out = Vec::with_capacity(total * channels);
            for mut i in 0..total {
                let start = out.len();
                for _ in 0..channels {
                    out.push((i % steps) as f64 / (steps - 1) as f64);
                    i /= steps;
                }
                // first channel varies slowest
                out[start..].reverse();
            }
            out
        }
        TestPattern::Random(seed) => {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            (0..pixels * channels).map(|_| rng.r#gen::<f64>()).collect()
        }
        TestPattern::GamutBoundary => {
            let colors: [[f64; 3]; 8] = [
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 1.0],
                [1.0, 1.0, 0.0],
                [1.0, 0.0, 1.0],
                [0.0, 1.0, 1.0],
                [1.0, 0.5, 0.0],
                [0.5, 0.0, 1.0],
            ];
            (0..pixels)
                .flat_map(|i| (0..channels).map(move |c| colors[i % 8][c % 3]))
                .collect()
        }
    }
}

/// Random Lab samples inside L 0..100, a/b -100..100
pub fn random_lab(seed: u64, count: usize) -> Vec<[f64; 3]> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            [
                rng.gen_range(0.0..100.0),
                rng.gen_range(-100.0..100.0),
                rng.gen_range(-100.0..100.0),
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corners() {
        let data = generate_u8(TestPattern::Corners, 3, 8);
        assert_eq!(data.len(), 24);
        assert_eq!(&data[..3], &[0, 0, 0]);
        assert_eq!(&data[21..], &[255, 255, 255]);
    }

    #[test]
    fn test_lattice_order() {
        let data = generate_unit(TestPattern::Lattice(2), 3, 0);
        assert_eq!(data.len(), 24);
        // second pixel only moves the last channel
        assert_eq!(&data[3..6], &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_random_deterministic() {
        let a = generate_u16(TestPattern::Random(42), 4, 10);
        let b = generate_u16(TestPattern::Random(42), 4, 10);
        assert_eq!(a, b);
        assert_eq!(random_lab(7, 3), random_lab(7, 3));
    }
}
