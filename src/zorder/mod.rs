//! Z-order (Morton) hierarchical addresses.
//!
//! # Address Layout
//!
//! A hierarchical address packs one sample of a `D`-dimensional lattice at
//! resolution `R` into a single unsigned word:
//!
//! ```text
//!  W-1                        D*R                                0
//! ┌────────────────────────────┬─────────┬─────┬─────────┬─────────┐
//! │        coarse cell id      │ level 1 │ ... │ level R-1│ level R │
//! └────────────────────────────┴─────────┴─────┴─────────┴─────────┘
//!                               each level: D interleaved axis bits
//! ```
//!
//! Bit `j` of axis `i` sits at bit `j * D + i`, so the `D` lowest bits pick the
//! child inside the parent, and `index >> D` is the parent one level up.
//! The cell id is resolution independent: refining a sample never changes it.
//!
//! The width invariant `D * R + bits(ncell) <= W` is checked when a lattice is
//! built; the codecs here only check `D * R <= W`.
//!
//! - [`dilate`]: bit spreading for one axis ([`Address`] implements it for `u32`/`u64`)
//! - [`codec`]: full address <-> [`Coeffs`] conversion, single and batched

pub mod codec;
pub mod dilate;

pub use codec::{decode, decode_coefficients, encode, encode_coefficients, Coeffs};
pub use dilate::{dilate, undilate, Address};
