//! In-memory lattice for exercising callers of [`Hierarchy`].

use super::traits::{resolve_max_resl, Hierarchy};
use crate::error::Result;
use crate::transform::Vector;

/// A lattice whose value is the address itself.
///
/// With `invalid_every(k)`, every address with `index % k == k - 1` resolves
/// to nothing, which lets tests check that callers drop invalid samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubHier<const D: u32> {
    ncell: u64,
    max_resl: u32,
    invalid_every: Option<u64>,
}

impl<const D: u32> StubHier<D> {
    /// `ncell` coarse cells, as deep as a `u64` allows.
    pub fn new(ncell: u64) -> Result<Self> {
        Ok(Self {
            ncell,
            max_resl: resolve_max_resl::<u64>(ncell, D, None)?,
            invalid_every: None,
        })
    }

    /// Cap the deepest resolution.
    pub fn with_max_resl(mut self, max_resl: u32) -> Result<Self> {
        self.max_resl = resolve_max_resl::<u64>(self.ncell, D, Some(max_resl))?;
        Ok(self)
    }

    /// Invalidate every `k`-th address (`k = 0` disables).
    pub fn invalid_every(mut self, k: u64) -> Self {
        self.invalid_every = (k > 0).then_some(k);
        self
    }

    fn is_valid(&self, index: u64) -> bool {
        match self.invalid_every {
            Some(k) => index % k != k - 1,
            None => true,
        }
    }
}

impl<const D: u32> Hierarchy for StubHier<D> {
    type Index = u64;
    type Value = Vector<f64, 1>;

    const FULL_DIM: u32 = D;

    fn ncell(&self) -> u64 {
        self.ncell
    }

    fn max_resl(&self) -> u32 {
        self.max_resl
    }

    fn get_value(&self, resl: u32, index: u64) -> Option<Vector<f64, 1>> {
        if resl > self.max_resl || index >= self.size(resl) || !self.is_valid(index) {
            return None;
        }
        Some(Vector([index as f64]))
    }
}
