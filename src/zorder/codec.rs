//! Address <-> coefficient conversion.

use super::dilate::Address;
use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView2};

/// Coarse cell id plus the per-axis hierarchical offsets of one address.
///
/// Each `coords[i]` lies in `[0, 2^resl)` for the resolution the address was
/// decoded at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coeffs<I, const D: usize> {
    /// Resolution-independent coarse cell.
    pub cell: I,
    /// Per-axis offset inside the cell.
    pub coords: [I; D],
}

impl<I: Address, const D: usize> Coeffs<I, D> {
    /// Create from a cell id and per-axis offsets.
    pub fn new(cell: I, coords: [I; D]) -> Self {
        Self { cell, coords }
    }
}

/// Split `index` into cell id and per-axis offsets.
///
/// `index` must have been produced at `resl` with the same `D`; decoding at any
/// other resolution yields coefficients with no meaning.
#[inline]
pub fn decode<I: Address, const D: usize>(index: I, resl: u32) -> Coeffs<I, D> {
    let nbits = (D as u32).saturating_mul(resl);
    let hier = index & I::low_mask(nbits);
    let mut coords = [I::zero(); D];
    for (j, c) in coords.iter_mut().enumerate() {
        *c = hier.shr_bits(j as u32).undilate::<D>();
    }
    Coeffs {
        cell: index.shr_bits(nbits),
        coords,
    }
}

/// Inverse of [`decode`].
#[inline]
pub fn encode<I: Address, const D: usize>(coeffs: &Coeffs<I, D>, resl: u32) -> I {
    let nbits = (D as u32).saturating_mul(resl);
    let mut index = I::zero();
    for (j, &c) in coeffs.coords.iter().enumerate() {
        index = index | c.dilate::<D>().shl_bits(j as u32);
    }
    index | coeffs.cell.shl_bits(nbits)
}

fn check_width<I: Address, const D: usize>(resl: u32) -> Result<()> {
    if D as u64 * resl as u64 > I::BITS as u64 {
        return Err(Error::AddressWidthExceeded {
            dim: D as u32,
            resl,
            cell_bits: 0,
            width: I::BITS,
        });
    }
    Ok(())
}

/// Decode a batch of addresses into an `n x (D + 1)` array.
///
/// Column 0 holds the cell id, columns `1..=D` the per-axis offsets.
pub fn decode_coefficients<I: Address, const D: usize>(
    indices: &[I],
    resl: u32,
) -> Result<Array2<I>> {
    check_width::<I, D>(resl)?;
    let mut out = Array2::<I>::zeros((indices.len(), D + 1));
    for (mut row, &index) in out.rows_mut().into_iter().zip(indices) {
        let c = decode::<I, D>(index, resl);
        row[0] = c.cell;
        for j in 0..D {
            row[j + 1] = c.coords[j];
        }
    }
    Ok(out)
}

/// Encode an `n x (D + 1)` coefficient array back into addresses.
pub fn encode_coefficients<I: Address, const D: usize>(
    coeffs: ArrayView2<'_, I>,
    resl: u32,
) -> Result<Vec<I>> {
    check_width::<I, D>(resl)?;
    if coeffs.ncols() != D + 1 {
        return Err(Error::ShapeMismatch {
            expected: format!("{} columns", D + 1),
            actual: format!("{} columns", coeffs.ncols()),
        });
    }
    Ok(coeffs
        .rows()
        .into_iter()
        .map(|row| {
            let mut c = Coeffs::new(row[0], [I::zero(); D]);
            for j in 0..D {
                c.coords[j] = row[j + 1];
            }
            encode::<I, D>(&c, resl)
        })
        .collect())
}
