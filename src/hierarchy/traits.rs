//! The addressing contract a lattice provides.

use crate::error::{Error, Result};
use crate::transform::Transform;
use crate::zorder::Address;
use num_traits::{Bounded, One};

/// A multi-resolution lattice addressed by Z-order hierarchical indices.
///
/// Resolution `R` has `size(R) = ncell << (FULL_DIM * R)` addresses. Every
/// address at `R + 1` has exactly one parent at `R`, and the children of `a`
/// are the contiguous range `[child_of_begin(a), child_of_end(a))`. The
/// default methods implement this for the standard layout (the low
/// `FULL_DIM` bits pick the child); implementors only supply the cell count,
/// the deepest supported resolution and [`Hierarchy::get_value`].
///
/// Some addresses inside `[0, size(R))` correspond to no real sample (a
/// cell outside the physical domain, say). `get_value` returns `None` for
/// those; they are not errors.
///
/// All methods are read-only, so one handle can be shared across threads.
pub trait Hierarchy: Sync {
    /// Address word.
    type Index: Address;
    /// Value an address resolves to.
    type Value: Transform;

    /// Number of interleaved axes per level; fan-out is `2^FULL_DIM`.
    const FULL_DIM: u32;

    /// Number of coarse cells (the size at resolution 0).
    fn ncell(&self) -> Self::Index;

    /// Deepest resolution whose addresses fit the address word.
    fn max_resl(&self) -> u32;

    /// Resolve `index` at `resl` to a value, `None` if it names no sample.
    fn get_value(&self, resl: u32, index: Self::Index) -> Option<Self::Value>;

    /// Number of addresses at `resl`.
    ///
    /// Past the address word this saturates at `Index::max_value()`, so sizes
    /// never shrink as `resl` grows. Only resolutions up to `max_resl()` are
    /// addressable.
    fn size(&self, resl: u32) -> Self::Index {
        let shift = Self::FULL_DIM.saturating_mul(resl);
        let ncell = self.ncell();
        if ncell.bit_len().saturating_add(shift) > Self::Index::BITS {
            return Self::Index::max_value();
        }
        ncell.shl_bits(shift)
    }

    /// Children per parent.
    fn fanout(&self) -> u64 {
        1u64 << Self::FULL_DIM
    }

    /// Parent one resolution up.
    fn parent_of(&self, index: Self::Index) -> Self::Index {
        index.shr_bits(Self::FULL_DIM)
    }

    /// First child one resolution down.
    fn child_of_begin(&self, index: Self::Index) -> Self::Index {
        index.shl_bits(Self::FULL_DIM)
    }

    /// One past the last child one resolution down.
    fn child_of_end(&self, index: Self::Index) -> Self::Index {
        (index + Self::Index::one()).shl_bits(Self::FULL_DIM)
    }

    /// Coarse cell id of an address at `resl`.
    fn cell_index_of(&self, resl: u32, index: Self::Index) -> Self::Index {
        index.shr_bits(Self::FULL_DIM.saturating_mul(resl))
    }

    /// Interleaved offset of an address inside its cell at `resl`.
    fn hier_index_of(&self, resl: u32, index: Self::Index) -> Self::Index {
        index & Self::Index::low_mask(Self::FULL_DIM.saturating_mul(resl))
    }

    /// Fail unless `resl <= max_resl()`.
    fn check_resl(&self, resl: u32) -> Result<()> {
        let max_resl = self.max_resl();
        if resl > max_resl {
            return Err(Error::ResolutionOutOfRange { resl, max_resl });
        }
        Ok(())
    }

    /// Fail unless `index < size(resl)`.
    fn check_index(&self, resl: u32, index: Self::Index) -> Result<()> {
        let size = self.size(resl);
        if index >= size {
            return Err(Error::IndexOutOfBounds {
                index: index.to_u64_lossless(),
                size: size.to_u64_lossless(),
                resl,
            });
        }
        Ok(())
    }
}

/// Deepest resolution for `ncell` cells of `full_dim` axes in an `I` word.
///
/// With `requested`, checks that it fits and returns it; otherwise returns the
/// largest resolution that fits. A zero cell count is rejected.
pub(crate) fn resolve_max_resl<I: Address>(
    ncell: u64,
    full_dim: u32,
    requested: Option<u32>,
) -> Result<u32> {
    if ncell == 0 {
        return Err(Error::InvalidParameter {
            name: "ncell",
            message: "lattice needs at least one cell".into(),
        });
    }
    let cell_bits = ncell.bit_len();
    if cell_bits > I::BITS {
        return Err(Error::AddressWidthExceeded {
            dim: full_dim,
            resl: 0,
            cell_bits,
            width: I::BITS,
        });
    }
    let capacity = (I::BITS - cell_bits) / full_dim.max(1);
    match requested {
        Some(resl) if resl > capacity => Err(Error::AddressWidthExceeded {
            dim: full_dim,
            resl,
            cell_bits,
            width: I::BITS,
        }),
        Some(resl) => Ok(resl),
        None => Ok(capacity),
    }
}
