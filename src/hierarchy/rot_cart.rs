//! Screw motions: slide along an axis while spinning about it.
//!
//! Two interleaved axes per level (fan-out 4): axis 0 is the translation along
//! `axis`, axis 1 the rotation angle about it. Coarse cells are numbered with
//! the translation cell fastest.

use super::rot::{axis_sample, check_range};
use super::traits::{resolve_max_resl, Hierarchy};
use crate::error::{Error, Result};
use crate::transform::{normalized, Real, Rotation, Xform};
use crate::zorder::{decode, Address};
use core::marker::PhantomData;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Construction parameters for a [`RotCart1Hier`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RotCart1HierConfig {
    /// Lower translation bound along the axis.
    pub cart_lb: f64,
    /// Upper translation bound along the axis.
    pub cart_ub: f64,
    /// Coarse translation cells.
    pub cart_ncell: u64,
    /// Lower angle bound, degrees.
    pub rot_lb: f64,
    /// Upper angle bound, degrees.
    pub rot_ub: f64,
    /// Coarse angular cells.
    pub rot_ncell: u64,
    /// Shared slide/spin axis.
    pub axis: [f64; 3],
    /// Deepest resolution; `None` uses everything the address word allows.
    pub max_resl: Option<u32>,
}

impl RotCart1HierConfig {
    /// Slide over `[cart_lb, cart_ub)` and spin over `[rot_lb, rot_ub)` degrees about +Z.
    pub fn new(
        cart_lb: f64,
        cart_ub: f64,
        cart_ncell: u64,
        rot_lb: f64,
        rot_ub: f64,
        rot_ncell: u64,
    ) -> Self {
        Self {
            cart_lb,
            cart_ub,
            cart_ncell,
            rot_lb,
            rot_ub,
            rot_ncell,
            axis: [0.0, 0.0, 1.0],
            max_resl: None,
        }
    }

    /// Use `axis` instead of +Z.
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
    pub fn build<F: Real, I: Address>(&self) -> Result<RotCart1Hier<F, I>> {
        let f = F::from_f64_lossy;
        RotCart1Hier::with_max_resl(
            (f(self.cart_lb), f(self.cart_ub), self.cart_ncell),
            (f(self.rot_lb), f(self.rot_ub), self.rot_ncell),
            self.axis.map(f),
            self.max_resl,
        )
    }
}

/// Hierarchy of screw motions about one axis.
#[derive(Debug, Clone, PartialEq)]
pub struct RotCart1Hier<F = f64, I = u64> {
    cart_lb: F,
    cart_ub: F,
    cart_ncell: u64,
    cart_cell_width: F,
    rot_lb: F,
    rot_ub: F,
    rot_ncell: u64,
    rot_cell_width: F,
    axis: [F; 3],
    ncell: u64,
    max_resl: u32,
    _index: PhantomData<I>,
}

impl<F: Real, I: Address> RotCart1Hier<F, I> {
    /// `(lb, ub, ncell)` for the slide and for the spin (degrees), about `axis`.
    pub fn new(cart: (F, F, u64), rot: (F, F, u64), axis: [F; 3]) -> Result<Self> {
        Self::with_max_resl(cart, rot, axis, None)
    }

    /// As [`RotCart1Hier::new`], capping the deepest resolution.
    pub fn with_max_resl(
        cart: (F, F, u64),
        rot: (F, F, u64),
        axis: [F; 3],
        max_resl: Option<u32>,
    ) -> Result<Self> {
        let (cart_lb, cart_ub, cart_ncell) = cart;
        let (rot_lb, rot_ub, rot_ncell) = rot;
        check_range("cart_lb/cart_ub", cart_lb, cart_ub)?;
        check_range("rot_lb/rot_ub", rot_lb, rot_ub)?;
        if cart_ncell == 0 || rot_ncell == 0 {
            return Err(Error::InvalidParameter {
                name: "ncell",
                message: format!("cell counts {cart_ncell} x {rot_ncell} must be positive"),
            });
        }
        let ncell = cart_ncell
            .checked_mul(rot_ncell)
            .ok_or_else(|| Error::InvalidParameter {
                name: "ncell",
                message: format!("{cart_ncell} x {rot_ncell} cells overflow"),
            })?;
        let axis = normalized(axis)?;
        let max_resl = resolve_max_resl::<I>(ncell, 2, max_resl)?;
        Ok(Self {
            cart_lb,
            cart_ub,
            cart_ncell,
            cart_cell_width: (cart_ub - cart_lb) / F::from_f64_lossy(cart_ncell as f64),
            rot_lb,
            rot_ub,
            rot_ncell,
            rot_cell_width: (rot_ub - rot_lb) / F::from_f64_lossy(rot_ncell as f64),
            axis,
            ncell,
            max_resl,
            _index: PhantomData,
        })
    }

    /// Translation bounds along the axis.
    pub fn cart_bounds(&self) -> (F, F) {
        (self.cart_lb, self.cart_ub)
    }

    /// Angle bounds, degrees.
    pub fn rot_bounds(&self) -> (F, F) {
        (self.rot_lb, self.rot_ub)
    }

    /// Coarse cells as `(translation, rotation)`.
    pub fn cell_counts(&self) -> (u64, u64) {
        (self.cart_ncell, self.rot_ncell)
    }

    /// Coarse cell widths as `(translation, degrees)`.
    pub fn cell_widths(&self) -> (F, F) {
        (self.cart_cell_width, self.rot_cell_width)
    }

    /// Unit slide/spin axis.
    pub fn axis(&self) -> [F; 3] {
        self.axis
    }

    /// `(offset along axis, angle in degrees)` sampled by `index` at `resl`.
    pub fn screw_of(&self, resl: u32, index: I) -> Option<(F, F)> {
        if resl > self.max_resl {
            return None;
        }
        let cell = self.cell_index_of(resl, index).to_u64_lossless();
        if cell >= self.ncell {
            return None;
        }
        let c = decode::<I, 2>(index, resl);
        let shift = axis_sample(
            self.cart_lb,
            self.cart_cell_width,
            cell % self.cart_ncell,
            c.coords[0].to_u64_lossless(),
            resl,
        );
        let angle = axis_sample(
            self.rot_lb,
            self.rot_cell_width,
            cell / self.cart_ncell,
            c.coords[1].to_u64_lossless(),
            resl,
        );
        Some((shift, angle))
    }
}

impl<F: Real, I: Address> Hierarchy for RotCart1Hier<F, I> {
    type Index = I;
    type Value = Xform<F>;

    const FULL_DIM: u32 = 2;

    fn ncell(&self) -> I {
        I::from_u64_truncating(self.ncell)
    }

    fn max_resl(&self) -> u32 {
        self.max_resl
    }

    fn get_value(&self, resl: u32, index: I) -> Option<Xform<F>> {
        let (shift, angle) = self.screw_of(resl, index)?;
        let rot = Rotation::from_axis_angle(self.axis, angle.to_radians());
        let [x, y, z] = self.axis;
        Some(Xform::from_parts(&rot, [x * shift, y * shift, z * shift]))
    }
}
