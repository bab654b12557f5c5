//! Rotations about a single fixed axis.
//!
//! Angles in `[lb, ub)` degrees are split into `ncell` coarse cells, each
//! halved per resolution (fan-out 2). The sample at a sub-cell center is the
//! rotation by that angle about `axis`.

use super::traits::{resolve_max_resl, Hierarchy};
use crate::error::{Error, Result};
use crate::transform::{normalized, Real, Rotation, Xform};
use crate::zorder::Address;
use core::marker::PhantomData;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Construction parameters for a [`RotHier`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RotHierConfig {
    /// Lower angle bound, degrees.
    pub lb: f64,
    /// Upper angle bound, degrees.
    pub ub: f64,
    /// Coarse angular cells.
    pub ncell: u64,
    /// Rotation axis (normalized on build).
    pub axis: [f64; 3],
    /// Deepest resolution; `None` uses everything the address word allows.
    pub max_resl: Option<u32>,
}

impl RotHierConfig {
    /// `ncell` cells over `[lb, ub)` degrees about +Z.
    pub fn new(lb: f64, ub: f64, ncell: u64) -> Self {
        Self {
            lb,
            ub,
            ncell,
            axis: [0.0, 0.0, 1.0],
            max_resl: None,
        }
    }

    /// Pick the cell count so coarse cells are at most `cell_width` degrees wide.
    pub fn from_cell_width(lb: f64, ub: f64, cell_width: f64) -> Result<Self> {
        if !(cell_width > 0.0) || !cell_width.is_finite() {
            return Err(Error::InvalidParameter {
                name: "cell_width",
                message: format!("{cell_width} is not a positive width"),
            });
        }
        let ncell = ((ub - lb) / cell_width).ceil().max(1.0) as u64;
        Ok(Self::new(lb, ub, ncell))
    }

    /// Rotate about `axis` instead of +Z.
    pub fn with_axis(mut self, axis: [f64; 3]) -> Self {
        self.axis = axis;
        self
    }

    /// Cap the deepest resolution.
    pub fn with_max_resl(mut self, max_resl: u32) -> Self {
        self.max_resl = Some(max_resl);
        self
    }

    /// Build the lattice.
    pub fn build<F: Real, I: Address>(&self) -> Result<RotHier<F, I>> {
        RotHier::with_max_resl(
            F::from_f64_lossy(self.lb),
            F::from_f64_lossy(self.ub),
            self.ncell,
            self.axis.map(F::from_f64_lossy),
            self.max_resl,
        )
    }
}

/// Hierarchy of rotations about one axis.
#[derive(Debug, Clone, PartialEq)]
pub struct RotHier<F = f64, I = u64> {
    lb: F,
    ub: F,
    cell_width: F,
    ncell: u64,
    axis: [F; 3],
    max_resl: u32,
    _index: PhantomData<I>,
}

impl<F: Real, I: Address> RotHier<F, I> {
    /// `ncell` cells over `[lb, ub)` degrees about `axis`.
    pub fn new(lb: F, ub: F, ncell: u64, axis: [F; 3]) -> Result<Self> {
        Self::with_max_resl(lb, ub, ncell, axis, None)
    }

    /// As [`RotHier::new`], capping the deepest resolution.
    pub fn with_max_resl(
        lb: F,
        ub: F,
        ncell: u64,
        axis: [F; 3],
        max_resl: Option<u32>,
    ) -> Result<Self> {
        check_range("lb/ub", lb, ub)?;
        let axis = normalized(axis)?;
        let max_resl = resolve_max_resl::<I>(ncell, 1, max_resl)?;
        Ok(Self {
            lb,
            ub,
            cell_width: (ub - lb) / F::from_f64_lossy(ncell as f64),
            ncell,
            axis,
            max_resl,
            _index: PhantomData,
        })
    }

    /// Lower angle bound, degrees.
    pub fn lb(&self) -> F {
        self.lb
    }

    /// Upper angle bound, degrees.
    pub fn ub(&self) -> F {
        self.ub
    }

    /// Coarse cell width, degrees.
    pub fn cell_width(&self) -> F {
        self.cell_width
    }

    /// Unit rotation axis.
    pub fn axis(&self) -> [F; 3] {
        self.axis
    }

    /// Angle in degrees sampled by `index` at `resl`, if it is a valid address.
    pub fn angle_of(&self, resl: u32, index: I) -> Option<F> {
        if resl > self.max_resl {
            return None;
        }
        let cell = self.cell_index_of(resl, index).to_u64_lossless();
        if cell >= self.ncell {
            return None;
        }
        let hier = self.hier_index_of(resl, index).to_u64_lossless();
        Some(axis_sample(self.lb, self.cell_width, cell, hier, resl))
    }
}

impl<F: Real, I: Address> Hierarchy for RotHier<F, I> {
    type Index = I;
    type Value = Rotation<F>;

    const FULL_DIM: u32 = 1;

    fn ncell(&self) -> I {
        I::from_u64_truncating(self.ncell)
    }

    fn max_resl(&self) -> u32 {
        self.max_resl
    }

    fn get_value(&self, resl: u32, index: I) -> Option<Rotation<F>> {
        let angle = self.angle_of(resl, index)?;
        Some(Rotation::from_axis_angle(self.axis, angle.to_radians()))
    }
}

/// Sample coordinate along one uniformly split axis.
pub(crate) fn axis_sample<F: Real>(lb: F, width: F, cell: u64, offset: u64, resl: u32) -> F {
    let frac = (offset as f64 + 0.5) * 0.5f64.powi(resl as i32);
    lb + width * F::from_f64_lossy(cell as f64 + frac)
}

pub(crate) fn check_range<F: Real>(name: &'static str, lb: F, ub: F) -> Result<()> {
    if !(lb < ub) || !lb.is_finite() || !ub.is_finite() {
        return Err(Error::InvalidParameter {
            name,
            message: format!("range {:?}..{:?} is empty", lb, ub),
        });
    }
    Ok(())
}

/// Lifts a rotation lattice to homogeneous 4x4 values.
///
/// Addressing is unchanged; only the value type differs.
#[derive(Debug, Clone, PartialEq)]
pub struct Homogeneous<H>(pub H);

impl<F, H> Hierarchy for Homogeneous<H>
where
    F: Real,
    H: Hierarchy<Value = Rotation<F>>,
{
    type Index = H::Index;
    type Value = Xform<F>;

    const FULL_DIM: u32 = H::FULL_DIM;

    fn ncell(&self) -> H::Index {
        self.0.ncell()
    }

    fn max_resl(&self) -> u32 {
        self.0.max_resl()
    }

    fn get_value(&self, resl: u32, index: H::Index) -> Option<Xform<F>> {
        self.0.get_value(resl, index).map(|r| r.to_homogeneous())
    }

    fn size(&self, resl: u32) -> H::Index {
        self.0.size(resl)
    }

    fn parent_of(&self, index: H::Index) -> H::Index {
        self.0.parent_of(index)
    }

    fn child_of_begin(&self, index: H::Index) -> H::Index {
        self.0.child_of_begin(index)
    }

    fn child_of_end(&self, index: H::Index) -> H::Index {
        self.0.child_of_end(index)
    }
}
