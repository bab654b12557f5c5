//! Beam expansion: keep the best-scoring samples and step one level down.
//!
//! Given scored addresses at resolution `R`, the expander
//!
//! 1. drops samples carrying the "null" sentinel score,
//! 2. checks every remaining address against `size(R)` and that `R + 1` is
//!    within the lattice,
//! 3. partially selects the top `nkeep` by score,
//! 4. enumerates the children of each kept address at `R + 1` and keeps the
//!    ones the lattice resolves.
//!
//! ```text
//! scores @ R:    5.0   9.0   1.0   7.0          nkeep = 2
//!                 a     b     c     d
//!                       │           │
//!                       ▼           ▼
//! children @ R+1: [b0 b1 b2 b3] [d0 d1 d2 d3]   (invalid ones dropped)
//! ```
//!
//! Output is parent-major in selection order; children of one parent are in
//! address order. Selection is unstable: which of several equal scores is kept
//! is unspecified, and NaN scores rank below everything else.

mod select;

pub(crate) use select::rank_desc;

use crate::error::{Error, Result};
use crate::hierarchy::Hierarchy;
use crate::transform::{stack, Transform};
use ndarray::ArrayD;
use num_traits::One;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A score paired with the address it belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(C)]
pub struct ScoreIndex<I> {
    /// Higher is better.
    pub score: f64,
    /// Hierarchical address.
    pub index: I,
}

impl<I> ScoreIndex<I> {
    /// Pair a score with an address.
    pub fn new(score: f64, index: I) -> Self {
        Self { score, index }
    }
}

impl<I> From<(f64, I)> for ScoreIndex<I> {
    fn from((score, index): (f64, I)) -> Self {
        Self { score, index }
    }
}

/// Parameters for [`expand_top_n`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExpandConfig {
    /// Parents to keep.
    pub nkeep: usize,
    /// Score meaning "no sample"; compared with `==`.
    pub null_score: f64,
    /// Expand parents on the rayon pool (needs the `parallel` feature).
    pub parallel: bool,
}

impl Default for ExpandConfig {
    fn default() -> Self {
        Self {
            nkeep: 1,
            null_score: 0.0,
            parallel: true,
        }
    }
}

impl ExpandConfig {
    /// Keep the top `nkeep` parents.
    pub fn new(nkeep: usize) -> Self {
        Self {
            nkeep,
            ..Self::default()
        }
    }

    /// Set the number of parents to keep.
    pub fn with_nkeep(mut self, nkeep: usize) -> Self {
        self.nkeep = nkeep;
        self
    }

    /// Set the sentinel score.
    pub fn with_null_score(mut self, null_score: f64) -> Self {
        self.null_score = null_score;
        self
    }

    /// Enable or disable parallel expansion.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Children produced by one expansion, aligned by position.
#[derive(Debug, Clone, PartialEq)]
pub struct Expansion<I, V> {
    /// Child addresses at `resl + 1`.
    pub indices: Vec<I>,
    /// Values of those children.
    pub values: Vec<V>,
}

impl<I, V> Default for Expansion<I, V> {
    fn default() -> Self {
        Self {
            indices: Vec::new(),
            values: Vec::new(),
        }
    }
}

impl<I, V> Expansion<I, V> {
    /// Number of children.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// True if no child survived.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Split into `(indices, values)`.
    pub fn into_parts(self) -> (Vec<I>, Vec<V>) {
        (self.indices, self.values)
    }
}

impl<I, V: Transform> Expansion<I, V> {
    /// Values stacked into `[len, ..item_shape]`.
    pub fn values_array(&self) -> Result<ArrayD<V::Scalar>> {
        stack(&self.values)
    }
}

/// Expand the best `cfg.nkeep` of `samples` (scored at `resl`) into their
/// valid children at `resl + 1`.
///
/// # Errors
///
/// - [`Error::ResolutionOutOfRange`] if `resl + 1` exceeds the lattice's `max_resl`.
/// - [`Error::IndexOutOfBounds`] if a non-sentinel address is `>= size(resl)`.
///
/// Either way nothing is expanded.
pub fn expand_top_n<H: Hierarchy>(
    h: &H,
    resl: u32,
    samples: &[ScoreIndex<H::Index>],
    cfg: &ExpandConfig,
) -> Result<Expansion<H::Index, H::Value>> {
    let live = samples
        .iter()
        .filter(|s| s.score != cfg.null_score)
        .copied()
        .collect();
    expand_live(h, resl, live, samples.len(), cfg)
}

/// As [`expand_top_n`], with scores and addresses in separate slices.
///
/// # Errors
///
/// [`Error::DimensionMismatch`] if the slices differ in length, plus
/// everything [`expand_top_n`] reports.
pub fn expand_top_n_separate<H: Hierarchy>(
    h: &H,
    resl: u32,
    scores: &[f64],
    indices: &[H::Index],
    cfg: &ExpandConfig,
) -> Result<Expansion<H::Index, H::Value>> {
    if scores.len() != indices.len() {
        return Err(Error::DimensionMismatch {
            expected: scores.len(),
            found: indices.len(),
        });
    }
    let live = scores
        .iter()
        .zip(indices)
        .filter(|&(&s, _)| s != cfg.null_score)
        .map(|(&s, &i)| ScoreIndex::new(s, i))
        .collect();
    expand_live(h, resl, live, scores.len(), cfg)
}

fn expand_live<H: Hierarchy>(
    h: &H,
    resl: u32,
    mut live: Vec<ScoreIndex<H::Index>>,
    ninput: usize,
    cfg: &ExpandConfig,
) -> Result<Expansion<H::Index, H::Value>> {
    h.check_resl(resl.saturating_add(1))?;
    for s in &live {
        h.check_index(resl, s.index)?;
    }

    let parents = select::select_top(&mut live, cfg.nkeep);
    let out = if use_parallel(cfg, parents.len()) {
        expand_parallel(h, resl, parents)
    } else {
        expand_sequential(h, resl, parents)
    };

    tracing::debug!(
        resl,
        ninput,
        nlive = live.len(),
        nkeep = cfg.nkeep,
        nchildren = out.len(),
        "expanded top-n"
    );
    Ok(out)
}

#[cfg(feature = "parallel")]
fn use_parallel(cfg: &ExpandConfig, nparents: usize) -> bool {
    cfg.parallel && nparents > 1
}

#[cfg(not(feature = "parallel"))]
fn use_parallel(_cfg: &ExpandConfig, _nparents: usize) -> bool {
    false
}

fn expand_sequential<H: Hierarchy>(
    h: &H,
    resl: u32,
    parents: &[ScoreIndex<H::Index>],
) -> Expansion<H::Index, H::Value> {
    let cap = parents.len().saturating_mul(h.fanout() as usize);
    let mut out = Expansion {
        indices: Vec::with_capacity(cap),
        values: Vec::with_capacity(cap),
    };
    for p in parents {
        push_children(h, resl, p.index, &mut out);
    }
    out
}

#[cfg(feature = "parallel")]
fn expand_parallel<H: Hierarchy>(
    h: &H,
    resl: u32,
    parents: &[ScoreIndex<H::Index>],
) -> Expansion<H::Index, H::Value> {
    // Ordered collect keeps parent-major output identical to the sequential path.
    let per_parent: Vec<Expansion<H::Index, H::Value>> = parents
        .par_iter()
        .map(|p| {
            let mut out = Expansion::default();
            push_children(h, resl, p.index, &mut out);
            out
        })
        .collect();
    let total = per_parent.iter().map(Expansion::len).sum();
    let mut out = Expansion {
        indices: Vec::with_capacity(total),
        values: Vec::with_capacity(total),
    };
    for part in per_parent {
        out.indices.extend(part.indices);
        out.values.extend(part.values);
    }
    out
}

#[cfg(not(feature = "parallel"))]
fn expand_parallel<H: Hierarchy>(
    h: &H,
    resl: u32,
    parents: &[ScoreIndex<H::Index>],
) -> Expansion<H::Index, H::Value> {
    expand_sequential(h, resl, parents)
}

fn push_children<H: Hierarchy>(
    h: &H,
    resl: u32,
    parent: H::Index,
    out: &mut Expansion<H::Index, H::Value>,
) {
    let (begin, end) = (h.child_of_begin(parent), h.child_of_end(parent));
    let mut child = begin;
    while child < end {
        if let Some(v) = h.get_value(resl + 1, child) {
            out.indices.push(child);
            out.values.push(v);
        }
        child = child + H::Index::one();
    }
}
