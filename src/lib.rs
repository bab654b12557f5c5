//! # zlattice
//!
//! Multi-resolution lattices over rigid motions, addressed by Z-order integers, and the
//! top-N beam expander that drives coarse-to-fine search over them.
//!
//! **Default build** includes the rayon-backed parallel expansion (`parallel`). Persistable
//! configuration types are opt-in via `serde`.
//!
//! ```rust
//! use zlattice::{expand_top_n, CartHier, ExpandConfig, Hierarchy, ScoreIndex};
//!
//! let h = CartHier::<2, f64>::new([0.0; 2], [1.0; 2], [2, 2]).unwrap();
//! let scored = [ScoreIndex::new(5.0, 0u64), ScoreIndex::new(9.0, 3)];
//! let out = expand_top_n(&h, 0, &scored, &ExpandConfig::new(1)).unwrap();
//! assert_eq!(out.indices, vec![12, 13, 14, 15]);
//! assert_eq!(h.parent_of(out.indices[0]), 3);
//! ```

pub mod catalog;
/// Error types used across `zlattice`.
pub mod error;
pub mod expand;
pub mod hierarchy;
pub mod search;
pub mod transform;
pub mod zorder;

#[cfg(test)]
mod expand_tests;

pub use crate::catalog::{AnyHier, LatticeName, LatticeParams, XformArray};
pub use crate::expand::{expand_top_n, expand_top_n_separate, ExpandConfig, Expansion, ScoreIndex};
pub use crate::hierarchy::{
    BatchOps, CartHier, HealthCheck, Hierarchy, Homogeneous, RotCart1Hier, RotHier, StubHier,
};
pub use crate::search::{hier_search, Evaluator, SearchConfig, SearchResult};
pub use crate::transform::{Precision, Real, Rotation, Transform, Vector, Xform};
pub use crate::zorder::{Address, Coeffs};

pub use error::{Error, Result};
