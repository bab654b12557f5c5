//! Uniform Cartesian grid hierarchy.
//!
//! The box `[lb, ub)` is split into `bs[0] x .. x bs[D-1]` coarse cells; each
//! resolution halves every cell along every axis, so one address has `2^D`
//! children. A sample is the center of its sub-cell:
//!
//! ```text
//! x_i = lb_i + width_i * (cell_i + (offset_i + 0.5) / 2^resl)
//! ```
//!
//! Coarse cells are numbered row-major with axis 0 fastest.

use super::traits::{resolve_max_resl, Hierarchy};
use crate::error::{Error, Result};
use crate::transform::{Real, Vector};
use crate::zorder::{decode, Address};
use core::marker::PhantomData;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Construction parameters for a [`CartHier`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CartHierConfig {
    /// Lower bound per axis.
    pub lb: Vec<f64>,
    /// Upper bound per axis.
    pub ub: Vec<f64>,
    /// Coarse cells per axis.
    pub bs: Vec<u64>,
    /// Deepest resolution; `None` uses everything the address word allows.
    pub max_resl: Option<u32>,
}

impl CartHierConfig {
    /// Create a configuration.
    pub fn new(lb: Vec<f64>, ub: Vec<f64>, bs: Vec<u64>) -> Self {
        Self {
            lb,
            ub,
            bs,
            max_resl: None,
        }
    }

    /// Cap the deepest resolution.
    pub fn with_max_resl(mut self, max_resl: u32) -> Self {
        self.max_resl = Some(max_resl);
        self
    }

    /// Number of axes described.
    pub fn dim(&self) -> usize {
        self.lb.len()
    }

    /// Build the lattice.
    pub fn build<const D: usize, F: Real, I: Address>(&self) -> Result<CartHier<D, F, I>> {
        for len in [self.lb.len(), self.ub.len(), self.bs.len()] {
            if len != D {
                return Err(Error::DimensionMismatch {
                    expected: D,
                    found: len,
                });
            }
        }
        let mut lb = [F::zero(); D];
        let mut ub = [F::zero(); D];
        let mut bs = [0u64; D];
        for i in 0..D {
            lb[i] = F::from_f64_lossy(self.lb[i]);
            ub[i] = F::from_f64_lossy(self.ub[i]);
            bs[i] = self.bs[i];
        }
        CartHier::with_max_resl(lb, ub, bs, self.max_resl)
    }
}

/// Hierarchical uniform grid over a `D`-dimensional box.
#[derive(Debug, Clone, PartialEq)]
pub struct CartHier<const D: usize, F = f64, I = u64> {
    lb: [F; D],
    ub: [F; D],
    bs: [u64; D],
    cell_width: [F; D],
    bs_pref_prod: [u64; D],
    ncell: u64,
    max_resl: u32,
    _index: PhantomData<I>,
}

impl<const D: usize, F: Real, I: Address> CartHier<D, F, I> {
    /// Grid over `[lb, ub)` with `bs[i]` coarse cells along axis `i`.
    pub fn new(lb: [F; D], ub: [F; D], bs: [u64; D]) -> Result<Self> {
        Self::with_max_resl(lb, ub, bs, None)
    }

    /// As [`CartHier::new`], capping the deepest resolution.
    pub fn with_max_resl(
        lb: [F; D],
        ub: [F; D],
        bs: [u64; D],
        max_resl: Option<u32>,
    ) -> Result<Self> {
        if D == 0 {
            return Err(Error::InvalidParameter {
                name: "dim",
                message: "grid needs at least one axis".into(),
            });
        }
        let mut cell_width = [F::zero(); D];
        let mut bs_pref_prod = [0u64; D];
        let mut ncell = 1u64;
        for i in 0..D {
            if !(lb[i] < ub[i]) || !lb[i].is_finite() || !ub[i].is_finite() {
                return Err(Error::InvalidParameter {
                    name: "lb/ub",
                    message: format!("axis {i}: bounds {:?}..{:?} are empty", lb[i], ub[i]),
                });
            }
            if bs[i] == 0 {
                return Err(Error::InvalidParameter {
                    name: "bs",
                    message: format!("axis {i} has zero cells"),
                });
            }
            bs_pref_prod[i] = ncell;
            ncell = ncell.checked_mul(bs[i]).ok_or_else(|| Error::InvalidParameter {
                name: "bs",
                message: format!("cell count overflows at axis {i}"),
            })?;
            cell_width[i] = (ub[i] - lb[i]) / F::from_f64_lossy(bs[i] as f64);
        }
        let max_resl = resolve_max_resl::<I>(ncell, D as u32, max_resl)?;
        Ok(Self {
            lb,
            ub,
            bs,
            cell_width,
            bs_pref_prod,
            ncell,
            max_resl,
            _index: PhantomData,
        })
    }

    /// Lower bounds.
    pub fn lb(&self) -> &[F; D] {
        &self.lb
    }

    /// Upper bounds.
    pub fn ub(&self) -> &[F; D] {
        &self.ub
    }

    /// Coarse cells per axis.
    pub fn bs(&self) -> &[u64; D] {
        &self.bs
    }

    /// Coarse cell width per axis.
    pub fn cell_width(&self) -> &[F; D] {
        &self.cell_width
    }

    /// Per-axis grid coordinates of a coarse cell.
    pub fn cell_coords(&self, cell: u64) -> [u64; D] {
        let mut out = [0u64; D];
        for i in 0..D {
            out[i] = (cell / self.bs_pref_prod[i]) % self.bs[i];
        }
        out
    }
}

impl<const D: usize, F: Real, I: Address> Hierarchy for CartHier<D, F, I> {
    type Index = I;
    type Value = Vector<F, D>;

    const FULL_DIM: u32 = D as u32;

    fn ncell(&self) -> I {
        I::from_u64_truncating(self.ncell)
    }

    fn max_resl(&self) -> u32 {
        self.max_resl
    }

    fn get_value(&self, resl: u32, index: I) -> Option<Vector<F, D>> {
        if resl > self.max_resl {
            return None;
        }
        let cell = self.cell_index_of(resl, index).to_u64_lossless();
        if cell >= self.ncell {
            return None;
        }
        let coeffs = decode::<I, D>(index, resl);
        let scale = 0.5f64.powi(resl as i32);
        let grid = self.cell_coords(cell);
        let mut out = [F::zero(); D];
        for i in 0..D {
            let frac = (coeffs.coords[i].to_u64_lossless() as f64 + 0.5) * scale;
            out[i] = self.lb[i] + self.cell_width[i] * F::from_f64_lossy(grid[i] as f64 + frac);
        }
        Some(Vector(out))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::zorder::{encode, Coeffs};
    use proptest::prelude::*;

    #[test]
    fn test_size_and_cells() {
        let h = CartHier::<3, f64>::new([0.0; 3], [10.0, 20.0, 30.0], [1, 2, 3]).unwrap();
        assert_eq!(h.ncell(), 6);
        assert_eq!(h.size(0), 6);
        assert_eq!(h.size(1), 48);
        assert_eq!(h.size(2), 384);
        assert_eq!(h.cell_coords(5), [0, 1, 2]);
        assert_eq!(h.cell_width(), &[10.0, 10.0, 10.0]);
        // 3 cell bits leave 61 bits for 3 axes.
        assert_eq!(h.max_resl(), 20);
    }

    #[test]
    fn test_resl0_centers() {
        let h = CartHier::<2, f64>::new([-1.0, 0.0], [1.0, 4.0], [2, 2]).unwrap();
        let v: Vec<_> = (0..4).map(|i| h.get_value(0, i).unwrap().0).collect();
        assert_eq!(v, vec![[-0.5, 1.0], [0.5, 1.0], [-0.5, 3.0], [0.5, 3.0]]);
        assert!(h.get_value(0, 4).is_none());
    }

    #[test]
    fn test_children_subdivide_parent() {
        let h = CartHier::<2, f64>::new([0.0, 0.0], [1.0, 1.0], [1, 1]).unwrap();
        let parent = h.get_value(0, 0).unwrap().0;
        let kids: Vec<_> = (h.child_of_begin(0)..h.child_of_end(0))
            .map(|c| h.get_value(1, c).unwrap().0)
            .collect();
        assert_eq!(kids, vec![[0.25, 0.25], [0.75, 0.25], [0.25, 0.75], [0.75, 0.75]]);
        let mean = kids.iter().fold([0.0, 0.0], |a, k| [a[0] + k[0] / 4.0, a[1] + k[1] / 4.0]);
        assert_eq!(mean, parent);
    }

    #[test]
    fn test_rejects_bad_params() {
        assert!(CartHier::<2, f64>::new([0.0, 1.0], [1.0, 1.0], [1, 1]).is_err());
        assert!(CartHier::<2, f64>::new([0.0, 0.0], [1.0, 1.0], [1, 0]).is_err());
        assert!(CartHier::<1, f64>::new([f64::NAN], [1.0], [1]).is_err());
        let err = CartHier::<6, f64>::with_max_resl([0.0; 6], [1.0; 6], [4; 6], Some(10))
            .unwrap_err();
        assert!(matches!(err, Error::AddressWidthExceeded { .. }));
    }

    #[test]
    fn test_config_build() {
        let cfg = CartHierConfig::new(vec![0.0; 3], vec![1.0; 3], vec![2, 2, 2]).with_max_resl(5);
        let h = cfg.build::<3, f32, u64>().unwrap();
        assert_eq!(h.max_resl(), 5);
        assert_eq!(h.ncell(), 8);
        let err = cfg.build::<2, f32, u64>().unwrap_err();
        assert_eq!(err, Error::DimensionMismatch { expected: 2, found: 3 });
    }

    #[test]
    fn test_u32_addresses() {
        let h = CartHier::<3, f32, u32>::new([0.0; 3], [1.0; 3], [3, 3, 3]).unwrap();
        // 27 cells -> 5 bits, 27 bits left -> 9 levels.
        assert_eq!(h.max_resl(), 9);
        assert_eq!(h.size(9), 27 << 27);
        let last = h.size(9) - 1;
        let v = h.get_value(9, last).unwrap().0;
        assert!(v.iter().all(|&x| x > 0.99 && x < 1.0));
    }

    proptest! {
        #[test]
        fn values_stay_inside_their_cell(
            resl in 0u32..8,
            cell in 0u64..24,
            raw in proptest::array::uniform3(any::<u64>()),
        ) {
            let h = CartHier::<3, f64>::new([-5.0, 0.0, 2.0], [5.0, 1.0, 3.0], [4, 3, 2]).unwrap();
            let coords = raw.map(|c| c & ((1u64 << resl) - 1));
            let index = encode(&Coeffs::<u64, 3>::new(cell, coords), resl);
            let v = h.get_value(resl, index).unwrap().0;
            let grid = h.cell_coords(cell);
            for i in 0..3 {
                let lo = h.lb()[i] + h.cell_width()[i] * grid[i] as f64;
                prop_assert!(v[i] > lo && v[i] < lo + h.cell_width()[i]);
            }
            // The parent's sample is the center of the children's samples.
            if resl > 0 {
                let p = h.get_value(resl - 1, h.parent_of(index)).unwrap().0;
                for i in 0..3 {
                    let half = h.cell_width()[i] * 0.5f64.powi(resl as i32 + 1);
                    prop_assert!((v[i] - p[i]).abs() - half < 1e-9);
                }
            }
        }
    }
}
