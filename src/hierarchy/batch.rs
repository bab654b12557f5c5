//! Element-wise operations over slices of addresses.

use super::traits::Hierarchy;
use crate::error::Result;
use crate::transform::{stack, Transform};
use ndarray::ArrayD;

/// Batch forms of the [`Hierarchy`] operations, available on every lattice.
pub trait BatchOps: Hierarchy {
    /// Resolve many addresses at once.
    ///
    /// Returns a validity mask over the full input and the values of the valid
    /// addresses only, in input order.
    fn get_xforms(
        &self,
        resl: u32,
        indices: &[Self::Index],
    ) -> Result<(Vec<bool>, Vec<Self::Value>)> {
        self.check_resl(resl)?;
        let mut mask = Vec::with_capacity(indices.len());
        let mut values = Vec::with_capacity(indices.len());
        for &index in indices {
            match self.get_value(resl, index) {
                Some(v) => {
                    mask.push(true);
                    values.push(v);
                }
                None => mask.push(false),
            }
        }
        tracing::trace!(resl, n = indices.len(), nvalid = values.len(), "get_xforms");
        Ok((mask, values))
    }

    /// As [`BatchOps::get_xforms`], stacking values into `[n_valid, ..item_shape]`.
    fn get_xforms_array(
        &self,
        resl: u32,
        indices: &[Self::Index],
    ) -> Result<(Vec<bool>, ArrayD<<Self::Value as Transform>::Scalar>)> {
        let (mask, values) = self.get_xforms(resl, indices)?;
        Ok((mask, stack(&values)?))
    }

    /// Coarse cell of each address.
    fn cell_indices_of(&self, resl: u32, indices: &[Self::Index]) -> Vec<Self::Index> {
        indices.iter().map(|&i| self.cell_index_of(resl, i)).collect()
    }

    /// In-cell offset of each address.
    fn hier_indices_of(&self, resl: u32, indices: &[Self::Index]) -> Vec<Self::Index> {
        indices.iter().map(|&i| self.hier_index_of(resl, i)).collect()
    }

    /// Parent of each address.
    fn parents_of(&self, indices: &[Self::Index]) -> Vec<Self::Index> {
        indices.iter().map(|&i| self.parent_of(i)).collect()
    }

    /// First child of each address.
    fn children_begin_of(&self, indices: &[Self::Index]) -> Vec<Self::Index> {
        indices.iter().map(|&i| self.child_of_begin(i)).collect()
    }

    /// One past the last child of each address.
    fn children_end_of(&self, indices: &[Self::Index]) -> Vec<Self::Index> {
        indices.iter().map(|&i| self.child_of_end(i)).collect()
    }
}

impl<H: Hierarchy + ?Sized> BatchOps for H {}
