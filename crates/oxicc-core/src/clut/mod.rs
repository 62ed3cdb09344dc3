//! Multi-dimensional color lookup tables
//!
//! A [`Clut`] is a regular grid over 1 to 15 input dimensions. Node values
//! live in one flat arena; a stride table maps grid coordinates to offsets,
//! with the last input dimension varying fastest (the ICC storage order).
//!
//! Integer-backed tables (`mft1`, `mft2`, `mAB `/`mBA ` CLUTs) hold normalized
//! values (`v / 255`, `v / 65535`); float tables (`mpet` CLUT elements) hold
//! the stored values unchanged.

pub mod interp;

use crate::icc::error::IccError;
use crate::icc::io::{IccReader, IccWriter};
use crate::icc::types::{u8_to_unit, u16_to_unit, unit_to_u8, unit_to_u16};

use interp::Cell;

/// Maximum number of input dimensions
pub const MAX_CLUT_INPUTS: usize = 15;

/// Interpolation used for 3-input grids; other dimensions are always multilinear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    #[default]
    Tetrahedral,
    Trilinear,
}

/// Storage precision, remembered for re-serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClutPrecision {
    U8,
    U16,
    F32,
}

impl ClutPrecision {
    fn bytes(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::F32 => 4,
        }
    }
}

/// N-dimensional lookup table
#[derive(Debug, Clone, PartialEq)]
pub struct Clut {
    grid_points: Vec<usize>,
    output_channels: usize,
    strides: Vec<usize>,
    data: Vec<f64>,
    precision: ClutPrecision,
}

impl Clut {
    /// Zero-filled table
    pub fn new(
        grid_points: &[usize],
        output_channels: usize,
        precision: ClutPrecision,
    ) -> Result<Self, IccError> {
        let len = checked_len(grid_points, output_channels)?;
        Self::from_data(grid_points, output_channels, precision, vec![0.0; len])
    }

    /// Table over existing node values in storage order
    pub fn from_data(
        grid_points: &[usize],
        output_channels: usize,
        precision: ClutPrecision,
        data: Vec<f64>,
    ) -> Result<Self, IccError> {
        let len = checked_len(grid_points, output_channels)?;
        if data.len() != len {
            return Err(IccError::InvalidClut(format!(
                "expected {} values, got {}",
                len,
                data.len()
            )));
        }

        let mut strides = vec![0; grid_points.len()];
        let mut stride = output_channels;
        for (d, &g) in grid_points.iter().enumerate().rev() {
            strides[d] = stride;
            stride *= g;
        }

        Ok(Self {
            grid_points: grid_points.to_vec(),
            output_channels,
            strides,
            data,
            precision,
        })
    }

    pub fn input_channels(&self) -> usize {
        self.grid_points.len()
    }

    pub fn output_channels(&self) -> usize {
        self.output_channels
    }

    pub fn grid_points(&self) -> &[usize] {
        &self.grid_points
    }

    pub fn precision(&self) -> ClutPrecision {
        self.precision
    }

    pub fn set_precision(&mut self, precision: ClutPrecision) {
        self.precision = precision;
    }

    /// Number of grid nodes
    pub fn node_count(&self) -> usize {
        self.data.len() / self.output_channels
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Flat offset of the first output of the node at `coord`
    ///
    /// Coordinates beyond the grid are clamped to the last node.
    pub fn index_of(&self, coord: &[usize]) -> usize {
        coord
            .iter()
            .zip(self.grid_points.iter().zip(&self.strides))
            .map(|(&c, (&g, &s))| c.min(g - 1) * s)
            .sum()
    }

    pub fn node(&self, coord: &[usize]) -> &[f64] {
        let i = self.index_of(coord);
        &self.data[i..i + self.output_channels]
    }

    pub fn node_mut(&mut self, coord: &[usize]) -> &mut [f64] {
        let i = self.index_of(coord);
        &mut self.data[i..i + self.output_channels]
    }

    /// Interpolate `input` (normalized, clamped to [0, 1]) into `out`.
    ///
    /// Missing inputs read as 0; only the first `output_channels` outputs
    /// are written.
    pub fn interpolate(&self, out: &mut [f64], input: &[f64], interpolation: Interpolation) {
        let n_out = self.output_channels.min(out.len());
        let out = &mut out[..n_out];

        if self.grid_points.len() == 3 {
            let cells = [0, 1, 2].map(|d| {
                Cell::locate(
                    input.get(d).copied().unwrap_or(0.0),
                    self.grid_points[d],
                    self.strides[d],
                )
            });
            match interpolation {
                Interpolation::Tetrahedral => interp::tetrahedral(&self.data, &cells, out),
                Interpolation::Trilinear => interp::trilinear(&self.data, &cells, out),
            }
        } else {
            let mut cells = [Cell {
                offset: 0,
                step: 0,
                frac: 0.0,
            }; MAX_CLUT_INPUTS];
            for (d, cell) in cells.iter_mut().enumerate().take(self.grid_points.len()) {
                *cell = Cell::locate(
                    input.get(d).copied().unwrap_or(0.0),
                    self.grid_points[d],
                    self.strides[d],
                );
            }
            interp::multilinear(&self.data, &cells[..self.grid_points.len()], out);
        }
    }

    /// Visit every node once, in storage order, with its coordinate and values
    pub fn iterate<F>(&mut self, mut f: F)
    where
        F: FnMut(&[usize], &mut [f64]),
    {
        let dims = self.grid_points.len();
        let mut coord = vec![0usize; dims];
        for node in self.data.chunks_exact_mut(self.output_channels) {
            f(&coord, node);
            // Odometer increment, last dimension fastest
            for d in (0..dims).rev() {
                coord[d] += 1;
                if coord[d] < self.grid_points[d] {
                    break;
                }
                coord[d] = 0;
            }
        }
    }

    /// Whether every grid dimension fits the 8-bit grid-point field of `mAB `
    pub fn fits_mab(&self) -> bool {
        self.grid_points.iter().all(|&g| g <= 255)
    }

    /// Read an `mAB `/`mBA ` CLUT: 16 grid bytes, precision byte, 3 pad bytes, data
    pub fn read_mab(
        rd: &mut IccReader<'_>,
        input_channels: usize,
        output_channels: usize,
    ) -> Result<Self, IccError> {
        if input_channels == 0 || input_channels > MAX_CLUT_INPUTS {
            return Err(IccError::InvalidClut(format!(
                "{} input channels",
                input_channels
            )));
        }
        let grid_bytes: [u8; 16] = rd.read_array()?;
        let precision = match rd.read_u8()? {
            1 => ClutPrecision::U8,
            2 => ClutPrecision::U16,
            p => {
                return Err(IccError::CorruptedData(format!(
                    "CLUT precision byte {}",
                    p
                )));
            }
        };
        rd.skip(3)?;

        let grid: Vec<usize> = grid_bytes[..input_channels]
            .iter()
            .map(|&g| g as usize)
            .collect();
        Self::read_values(rd, &grid, output_channels, precision)
    }

    /// Write in `mAB `/`mBA ` layout
    pub fn write_mab(&self, wr: &mut IccWriter<'_>) -> Result<(), IccError> {
        let mut grid_bytes = [0u8; 16];
        for (dst, &g) in grid_bytes.iter_mut().zip(&self.grid_points) {
            *dst = u8::try_from(g)
                .map_err(|_| IccError::InvalidClut(format!("grid of {} points", g)))?;
        }
        wr.write_bytes(&grid_bytes)?;
        let precision = match self.precision {
            ClutPrecision::U8 => ClutPrecision::U8,
            _ => ClutPrecision::U16,
        };
        wr.write_u8(precision.bytes() as u8)?;
        wr.write_bytes(&[0; 3])?;
        self.write_values(wr, precision)
    }

    /// Read an `mpet` CLUT element body: 16 grid bytes then float32 data
    pub fn read_float(
        rd: &mut IccReader<'_>,
        input_channels: usize,
        output_channels: usize,
    ) -> Result<Self, IccError> {
        if input_channels == 0 || input_channels > MAX_CLUT_INPUTS {
            return Err(IccError::InvalidClut(format!(
                "{} input channels",
                input_channels
            )));
        }
        let grid_bytes: [u8; 16] = rd.read_array()?;
        let grid: Vec<usize> = grid_bytes[..input_channels]
            .iter()
            .map(|&g| g as usize)
            .collect();
        Self::read_values(rd, &grid, output_channels, ClutPrecision::F32)
    }

    pub fn write_float(&self, wr: &mut IccWriter<'_>) -> Result<(), IccError> {
        let mut grid_bytes = [0u8; 16];
        for (dst, &g) in grid_bytes.iter_mut().zip(&self.grid_points) {
            *dst = u8::try_from(g)
                .map_err(|_| IccError::InvalidClut(format!("grid of {} points", g)))?;
        }
        wr.write_bytes(&grid_bytes)?;
        self.write_values(wr, ClutPrecision::F32)
    }

    /// Read node values of the given geometry and precision
    pub fn read_values(
        rd: &mut IccReader<'_>,
        grid_points: &[usize],
        output_channels: usize,
        precision: ClutPrecision,
    ) -> Result<Self, IccError> {
        let len = checked_len(grid_points, output_channels)?;
        let data = match precision {
            ClutPrecision::U8 => rd.read_bytes(len)?.into_iter().map(u8_to_unit).collect(),
            ClutPrecision::U16 => rd
                .read_u16_vec(len)?
                .into_iter()
                .map(u16_to_unit)
                .collect(),
            ClutPrecision::F32 => rd.read_f32_vec(len)?.into_iter().map(f64::from).collect(),
        };
        Self::from_data(grid_points, output_channels, precision, data)
    }

    /// Write node values at `precision`
    pub fn write_values(
        &self,
        wr: &mut IccWriter<'_>,
        precision: ClutPrecision,
    ) -> Result<(), IccError> {
        match precision {
            ClutPrecision::U8 => {
                let bytes: Vec<u8> = self.data.iter().map(|&v| unit_to_u8(v)).collect();
                wr.write_bytes(&bytes)
            }
            ClutPrecision::U16 => {
                for &v in &self.data {
                    wr.write_u16(unit_to_u16(v))?;
                }
                Ok(())
            }
            ClutPrecision::F32 => {
                for &v in &self.data {
                    wr.write_f32(v as f32)?;
                }
                Ok(())
            }
        }
    }

    /// Geometry problems, if any
    pub fn check(&self) -> Result<(), IccError> {
        checked_len(&self.grid_points, self.output_channels).map(|_| ())
    }
}

/// Number of stored values, rejecting degenerate or overflowing geometry
fn checked_len(grid_points: &[usize], output_channels: usize) -> Result<usize, IccError> {
    if grid_points.is_empty() || grid_points.len() > MAX_CLUT_INPUTS {
        return Err(IccError::InvalidClut(format!(
            "{} input dimensions (1..={} allowed)",
            grid_points.len(),
            MAX_CLUT_INPUTS
        )));
    }
    if output_channels == 0 {
        return Err(IccError::InvalidClut("no output channels".to_string()));
    }
    if let Some(d) = grid_points.iter().position(|&g| g < 2) {
        return Err(IccError::InvalidClut(format!(
            "dimension {} has {} grid points",
            d, grid_points[d]
        )));
    }
    grid_points
        .iter()
        .try_fold(output_channels, |acc, &g| acc.checked_mul(g))
        .ok_or_else(|| IccError::InvalidClut("grid size overflows".to_string()))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    /// Grid whose node values equal their normalized coordinates
    fn identity_clut(grid: usize, dims: usize) -> Clut {
        let mut clut = Clut::new(&vec![grid; dims], dims, ClutPrecision::U16).unwrap();
        clut.iterate(|coord, values| {
            for (v, &c) in values.iter_mut().zip(coord) {
                *v = c as f64 / (grid - 1) as f64;
            }
        });
        clut
    }

    #[test]
    fn test_rejects_degenerate_geometry() {
        assert!(Clut::new(&[], 3, ClutPrecision::U16).is_err());
        assert!(Clut::new(&[2, 1, 2], 3, ClutPrecision::U16).is_err());
        assert!(Clut::new(&[2; 16], 3, ClutPrecision::U16).is_err());
        assert!(Clut::new(&[2, 2], 0, ClutPrecision::U16).is_err());
        assert!(Clut::from_data(&[2, 2], 1, ClutPrecision::F32, vec![0.0; 3]).is_err());
    }

    #[test]
    fn test_index_order_last_dimension_fastest() {
        let clut = Clut::new(&[2, 3, 4], 2, ClutPrecision::U8).unwrap();
        assert_eq!(clut.index_of(&[0, 0, 1]), 2);
        assert_eq!(clut.index_of(&[0, 1, 0]), 8);
        assert_eq!(clut.index_of(&[1, 0, 0]), 24);
        assert_eq!(clut.node_count(), 24);
    }

    #[test]
    fn test_iterate_visits_every_node_in_order() {
        let mut clut = Clut::new(&[3, 2], 1, ClutPrecision::F32).unwrap();
        let mut seen = Vec::new();
        let mut counter = 0.0;
        clut.iterate(|coord, values| {
            seen.push(coord.to_vec());
            values[0] = counter;
            counter += 1.0;
        });
        assert_eq!(
            seen,
            vec![
                vec![0, 0],
                vec![0, 1],
                vec![1, 0],
                vec![1, 1],
                vec![2, 0],
                vec![2, 1]
            ]
        );
        assert_eq!(clut.data(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(clut.node(&[2, 0]), &[4.0]);
    }

    #[test]
    fn test_identity_law_3d() {
        let clut = identity_clut(5, 3);
        let inputs = [
            [0.0, 0.0, 0.0],
            [1.0, 1.0, 1.0],
            [0.5, 0.5, 0.5],
            [0.25, 0.5, 0.75],
            [0.9, 0.1, 0.33],
            [0.33, 0.33, 0.7],
        ];
        for input in inputs {
            for interp in [Interpolation::Tetrahedral, Interpolation::Trilinear] {
                let mut out = [0.0; 3];
                clut.interpolate(&mut out, &input, interp);
                for c in 0..3 {
                    assert!(
                        (out[c] - input[c]).abs() < 1e-12,
                        "{:?} identity failed: {:?} -> {:?}",
                        interp,
                        input,
                        out
                    );
                }
            }
        }
    }

    #[test]
    fn test_identity_law_multilinear() {
        for dims in [1, 2, 4] {
            let clut = identity_clut(3, dims);
            let input: Vec<f64> = (0..dims).map(|d| 0.1 + 0.2 * d as f64).collect();
            let mut out = vec![0.0; dims];
            clut.interpolate(&mut out, &input, Interpolation::Tetrahedral);
            for d in 0..dims {
                assert!((out[d] - input[d]).abs() < 1e-12, "{} dims: {:?}", dims, out);
            }
        }
    }

    #[test]
    fn test_corner_scenario() {
        let mut clut = Clut::new(&[2, 2, 2], 2, ClutPrecision::F32).unwrap();
        clut.iterate(|coord, values| {
            let v = match coord {
                [0, 0, 0] => 0.0,
                [1, 1, 1] => 100.0,
                _ => 50.0,
            };
            values.fill(v);
        });

        let mut out = [0.0; 2];
        clut.interpolate(&mut out, &[0.5, 0.5, 0.5], Interpolation::Tetrahedral);
        assert_eq!(out, [50.0, 50.0]);
        clut.interpolate(&mut out, &[0.5, 0.5, 0.5], Interpolation::Trilinear);
        assert_eq!(out, [50.0, 50.0]);
    }

    #[test]
    fn test_clamping_matches_boundary() {
        let mut clut = identity_clut(3, 3);
        clut.node_mut(&[2, 2, 2]).copy_from_slice(&[0.7, 0.8, 0.9]);

        let mut inside = [0.0; 3];
        let mut outside = [0.0; 3];
        clut.interpolate(&mut inside, &[1.0, 1.0, 1.0], Interpolation::Tetrahedral);
        clut.interpolate(&mut outside, &[1.2, 1.0001, 7.0], Interpolation::Tetrahedral);
        assert_eq!(inside, [0.7, 0.8, 0.9]);
        assert_eq!(inside, outside);

        clut.interpolate(&mut inside, &[0.0, 0.0, 0.0], Interpolation::Trilinear);
        clut.interpolate(&mut outside, &[-0.5, -1e-9, 0.0], Interpolation::Trilinear);
        assert_eq!(inside, outside);
    }

    #[test]
    fn test_continuity_across_cells() {
        // Random-ish values; a point on a shared face is approached from both sides
        let mut clut = Clut::new(&[3, 3, 3], 1, ClutPrecision::F32).unwrap();
        let mut seed = 7u32;
        clut.iterate(|_, v| {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            v[0] = (seed >> 16) as f64 / 65536.0;
        });

        for interp in [Interpolation::Tetrahedral, Interpolation::Trilinear] {
            let mut a = [0.0];
            let mut b = [0.0];
            clut.interpolate(&mut a, &[0.5 - 1e-12, 0.3, 0.8], interp);
            clut.interpolate(&mut b, &[0.5 + 1e-12, 0.3, 0.8], interp);
            assert!((a[0] - b[0]).abs() < 1e-9, "{:?}: {} vs {}", interp, a[0], b[0]);
        }
    }

    #[test]
    fn test_tie_break_is_by_channel_index() {
        // Only the walk x→y→z reaches (1,0,0) then (1,1,0)
        let mut clut = Clut::new(&[2, 2, 2], 1, ClutPrecision::F32).unwrap();
        clut.node_mut(&[1, 0, 0])[0] = 1.0;
        clut.node_mut(&[1, 1, 0])[0] = 2.0;
        clut.node_mut(&[1, 1, 1])[0] = 3.0;

        let mut out = [0.0];
        clut.interpolate(&mut out, &[0.4, 0.4, 0.4], Interpolation::Tetrahedral);
        assert!((out[0] - 1.2).abs() < 1e-12, "{}", out[0]);
    }

    #[test]
    fn test_mab_codec() {
        let mut clut = identity_clut(3, 3);
        clut.set_precision(ClutPrecision::U8);

        let mut cur = Cursor::new(Vec::new());
        {
            let mut wr = IccWriter::new(&mut cur).unwrap();
            clut.write_mab(&mut wr).unwrap();
        }
        let bytes = cur.into_inner();
        assert_eq!(&bytes[..4], &[3, 3, 3, 0]);
        assert_eq!(bytes[16], 1);
        assert_eq!(bytes.len(), 20 + 27 * 3);

        let mut src = Cursor::new(&bytes[..]);
        let mut rd = IccReader::new(&mut src).unwrap();
        let back = Clut::read_mab(&mut rd, 3, 3).unwrap();
        assert_eq!(back.grid_points(), &[3, 3, 3]);
        assert_eq!(back.precision(), ClutPrecision::U8);
        for (a, b) in back.data().iter().zip(clut.data()) {
            assert!((a - b).abs() < 1.0 / 255.0);
        }
    }

    #[test]
    fn test_mab_codec_rejects_truncation() {
        let mut bytes = vec![0u8; 20];
        bytes[..3].copy_from_slice(&[2, 2, 2]);
        bytes[16] = 2;
        let mut src = Cursor::new(&bytes[..]);
        let mut rd = IccReader::new(&mut src).unwrap();
        assert!(matches!(
            Clut::read_mab(&mut rd, 3, 3),
            Err(IccError::Truncated { .. })
        ));
    }

    #[test]
    fn test_float_codec_is_exact() {
        let mut clut = Clut::new(&[2, 2], 2, ClutPrecision::F32).unwrap();
        clut.data_mut()
            .copy_from_slice(&[0.0, -1.5, 0.25, 2.0, 0.125, 1.0, 3.5, -0.75]);

        let mut cur = Cursor::new(Vec::new());
        {
            let mut wr = IccWriter::new(&mut cur).unwrap();
            clut.write_float(&mut wr).unwrap();
        }
        cur.set_position(0);
        let mut rd = IccReader::new(&mut cur).unwrap();
        let back = Clut::read_float(&mut rd, 2, 2).unwrap();
        assert_eq!(back, clut);
    }
}
