//! Multi-resolution lattices addressed by Z-order indices.
//!
//! # The Core Idea
//!
//! A lattice covers a space of rigid motions (points, rotations, screw motions)
//! with `ncell` coarse cells, then refines every cell by halving it along each
//! of its `FULL_DIM` axes per resolution. One integer names one sample at one
//! resolution:
//!
//! ```text
//! resl 0:   [ cell 0 ]                  [ cell 1 ]
//!             /  |  \  \                  /  |  \  \
//! resl 1:   c0  c1  c2  c3              c4  c5  c6  c7      (FULL_DIM = 2)
//!          / | \
//! resl 2:  ...        parent = i >> FULL_DIM
//!                     children = [i << FULL_DIM, (i + 1) << FULL_DIM)
//! ```
//!
//! Because children of one parent are a contiguous range, a coarse-to-fine
//! search only ever needs integer arithmetic to move between levels.
//!
//! # Module Overview
//!
//! - [`Hierarchy`]: the addressing contract; everything else is written against it
//! - [`CartHier`]: uniform Cartesian grid in `D` dimensions
//! - [`RotHier`]: rotations about one axis; [`Homogeneous`] lifts it to 4x4
//! - [`RotCart1Hier`]: screw motions (slide and spin about one axis)
//! - [`StubHier`]: echo lattice with a configurable invalid pattern, for tests
//! - [`BatchOps`]: element-wise forms of the contract over slices
//! - [`HealthCheck`]: probes an implementation for contract violations
//!
//! # Choosing a Lattice
//!
//! | Sampled space | Lattice | Value |
//! |---------------|---------|-------|
//! | Box in R^D | [`CartHier`] | [`Vector`](crate::transform::Vector) |
//! | Angle about an axis | [`RotHier`] | [`Rotation`](crate::transform::Rotation) |
//! | Angle as 4x4 | [`Homogeneous<RotHier>`](Homogeneous) | [`Xform`](crate::transform::Xform) |
//! | Helical motion | [`RotCart1Hier`] | [`Xform`](crate::transform::Xform) |

pub mod batch;
mod cart;
mod rot;
mod rot_cart;
mod stub;
mod traits;
pub mod validate;

pub use batch::BatchOps;
pub use cart::{CartHier, CartHierConfig};
pub use rot::{Homogeneous, RotHier, RotHierConfig};
pub use rot_cart::{RotCart1Hier, RotCart1HierConfig};
pub use stub::StubHier;
pub use traits::Hierarchy;
pub use validate::{HealthCheck, HealthReport, Severity, ValidationIssue, ValidationReport};
