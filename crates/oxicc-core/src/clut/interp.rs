//! Interpolation kernels over a flat CLUT arena
//!
//! All kernels receive the per-dimension cell origin (`base`, already a flat
//! offset), the per-dimension step to the upper neighbour (`step`, zero at the
//! last grid point) and the fractional position inside the cell.

/// Linear interpolation between two values
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

/// Lookup in a 1D table with linear interpolation; input clamped to [0, 1]
pub fn lut1d_interp(lut: &[f64], input: f64) -> f64 {
    match lut.len() {
        0 => input,
        1 => lut[0],
        n => {
            let max_idx = (n - 1) as f64;
            let pos = (clamp_unit(input) * max_idx).clamp(0.0, max_idx);
            let i0 = pos.floor() as usize;
            let i1 = (i0 + 1).min(n - 1);
            lerp(lut[i0], lut[i1], pos - i0 as f64)
        }
    }
}

/// Clamp to [0, 1]; NaN maps to 0
#[inline]
pub fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

/// Cell of one input dimension: lower index, step to upper node, fraction
#[derive(Debug, Clone, Copy)]
pub(crate) struct Cell {
    pub offset: usize,
    pub step: usize,
    pub frac: f64,
}

impl Cell {
    /// Locate `v` on a dimension with `grid` points and flat `stride`
    #[inline]
    pub(crate) fn locate(v: f64, grid: usize, stride: usize) -> Self {
        let max_idx = grid - 1;
        let pos = clamp_unit(v) * max_idx as f64;
        let i0 = (pos.floor() as usize).min(max_idx);
        let i1 = (i0 + 1).min(max_idx);
        Self {
            offset: i0 * stride,
            step: (i1 - i0) * stride,
            frac: pos - i0 as f64,
        }
    }
}

/// Tetrahedral interpolation in a 3D cell
///
/// The cube is split into six tetrahedra by the ordering of the fractions.
/// Ties are broken by input-channel index: with `>=` comparisons, an equal
/// fraction on a lower channel is walked first.
pub(crate) fn tetrahedral(data: &[f64], cells: &[Cell; 3], out: &mut [f64]) {
    let [x, y, z] = cells;
    let (fx, fy, fz) = (x.frac, y.frac, z.frac);

    // Axis walk order, largest fraction first
    let order: [usize; 3] = if fx >= fy {
        if fy >= fz {
            [0, 1, 2]
        } else if fx >= fz {
            [0, 2, 1]
        } else {
            [2, 0, 1]
        }
    } else if fx >= fz {
        [1, 0, 2]
    } else if fy >= fz {
        [1, 2, 0]
    } else {
        [2, 1, 0]
    };

    let base = x.offset + y.offset + z.offset;
    let p1 = base + cells[order[0]].step;
    let p2 = p1 + cells[order[1]].step;
    let p3 = p2 + cells[order[2]].step;
    let (f1, f2, f3) = (
        cells[order[0]].frac,
        cells[order[1]].frac,
        cells[order[2]].frac,
    );

    for (k, o) in out.iter_mut().enumerate() {
        let c0 = data[base + k];
        let c1 = data[p1 + k];
        let c2 = data[p2 + k];
        let c3 = data[p3 + k];
        *o = c0 + f1 * (c1 - c0) + f2 * (c2 - c1) + f3 * (c3 - c2);
    }
}

/// Trilinear interpolation in a 3D cell
pub(crate) fn trilinear(data: &[f64], cells: &[Cell; 3], out: &mut [f64]) {
    let [x, y, z] = cells;
    let base = x.offset + y.offset + z.offset;
    let (dx, dy, dz) = (x.step, y.step, z.step);

    for (k, o) in out.iter_mut().enumerate() {
        let at = |off: usize| data[base + off + k];
        let c00 = lerp(at(0), at(dz), z.frac);
        let c01 = lerp(at(dy), at(dy + dz), z.frac);
        let c10 = lerp(at(dx), at(dx + dz), z.frac);
        let c11 = lerp(at(dx + dy), at(dx + dy + dz), z.frac);
        let c0 = lerp(c00, c01, y.frac);
        let c1 = lerp(c10, c11, y.frac);
        *o = lerp(c0, c1, x.frac);
    }
}

/// Multilinear interpolation over all 2^N corners of an N-dimensional cell
pub(crate) fn multilinear(data: &[f64], cells: &[Cell], out: &mut [f64]) {
    out.iter_mut().for_each(|o| *o = 0.0);
    let base: usize = cells.iter().map(|c| c.offset).sum();

    for corner in 0..(1usize << cells.len()) {
        let mut weight = 1.0;
        let mut offset = base;
        for (d, cell) in cells.iter().enumerate() {
            if corner & (1 << d) != 0 {
                weight *= cell.frac;
                offset += cell.step;
            } else {
                weight *= 1.0 - cell.frac;
            }
        }
        if weight == 0.0 {
            continue;
        }
        for (k, o) in out.iter_mut().enumerate() {
            *o += weight * data[offset + k];
        }
    }
}
