//! Named lattice instantiations for callers that pick a lattice at runtime.
//!
//! Every supported `(kind, dimension, precision)` combination has a stable name
//! (`CartHier3D_f8`, `RotHier_f4`, `RotCart1Hier_f8`, ...). [`AnyHier`] wraps
//! one built lattice behind `u64` addresses and dense `ndarray` outputs, so a
//! caller holding only a name and a [`LatticeParams`] can drive the whole
//! batch surface and the beam expander.

use core::fmt;
use core::str::FromStr;

use ndarray::{Array2, ArrayD, ArrayView2};

use crate::error::{Error, Result};
use crate::expand::{expand_top_n, expand_top_n_separate, ExpandConfig, ScoreIndex};
use crate::hierarchy::{
    BatchOps, CartHier, CartHierConfig, Hierarchy, RotCart1Hier, RotCart1HierConfig, RotHier,
    RotHierConfig,
};
use crate::transform::{stack, Precision, Real};
use crate::zorder::{decode_coefficients, encode_coefficients};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Lattice family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LatticeKind {
    /// [`CartHier`] with the given number of axes (1 to 6).
    Cart(u8),
    /// [`RotHier`].
    Rot,
    /// [`RotCart1Hier`].
    RotCart1,
}

/// A catalog entry: family plus float precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LatticeName {
    /// Lattice family.
    pub kind: LatticeKind,
    /// Value precision.
    pub precision: Precision,
}

impl LatticeName {
    /// Create a name, checking the Cartesian dimension.
    pub fn new(kind: LatticeKind, precision: Precision) -> Result<Self> {
        if let LatticeKind::Cart(dim) = kind {
            if !(1..=6).contains(&dim) {
                return Err(Error::UnknownLattice(format!("CartHier{dim}D")));
            }
        }
        Ok(Self { kind, precision })
    }
}

impl fmt::Display for LatticeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            LatticeKind::Cart(dim) => write!(f, "CartHier{}D_{}", dim, self.precision.tag()),
            LatticeKind::Rot => write!(f, "RotHier_{}", self.precision.tag()),
            LatticeKind::RotCart1 => write!(f, "RotCart1Hier_{}", self.precision.tag()),
        }
    }
}

impl FromStr for LatticeName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let unknown = || Error::UnknownLattice(s.to_string());
        let (family, tag) = s.rsplit_once('_').ok_or_else(unknown)?;
        let precision = match tag {
            "f4" => Precision::F4,
            "f8" => Precision::F8,
            _ => return Err(unknown()),
        };
        let kind = match family {
            "RotHier" => LatticeKind::Rot,
            "RotCart1Hier" => LatticeKind::RotCart1,
            _ => {
                let dim = family
                    .strip_prefix("CartHier")
                    .and_then(|rest| rest.strip_suffix('D'))
                    .and_then(|d| d.parse::<u8>().ok())
                    .ok_or_else(unknown)?;
                LatticeKind::Cart(dim)
            }
        };
        Self::new(kind, precision).map_err(|_| unknown())
    }
}

/// Every name the catalog can build.
pub fn supported_names() -> Vec<LatticeName> {
    let mut out = Vec::new();
    for precision in [Precision::F4, Precision::F8] {
        for dim in 1..=6 {
            out.push(LatticeName {
                kind: LatticeKind::Cart(dim),
                precision,
            });
        }
        out.push(LatticeName {
            kind: LatticeKind::Rot,
            precision,
        });
        out.push(LatticeName {
            kind: LatticeKind::RotCart1,
            precision,
        });
    }
    out
}

/// Construction parameters for any catalog lattice.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LatticeParams {
    /// Parameters of a Cartesian grid.
    Cart(CartHierConfig),
    /// Parameters of a single-axis rotation lattice.
    Rot(RotHierConfig),
    /// Parameters of a screw-motion lattice.
    RotCart1(RotCart1HierConfig),
}

/// Dense values from an [`AnyHier`], in the lattice's precision.
#[derive(Debug, Clone, PartialEq)]
pub enum XformArray {
    /// `f32` values.
    F4(ArrayD<f32>),
    /// `f64` values.
    F8(ArrayD<f64>),
}

impl XformArray {
    /// Array shape, `[n, ..item_shape]`.
    pub fn shape(&self) -> &[usize] {
        match self {
            XformArray::F4(a) => a.shape(),
            XformArray::F8(a) => a.shape(),
        }
    }

    /// Widen to `f64`.
    pub fn to_f64(&self) -> ArrayD<f64> {
        match self {
            XformArray::F4(a) => a.mapv(Real::as_f64),
            XformArray::F8(a) => a.clone(),
        }
    }
}

impl From<ArrayD<f32>> for XformArray {
    fn from(a: ArrayD<f32>) -> Self {
        XformArray::F4(a)
    }
}

impl From<ArrayD<f64>> for XformArray {
    fn from(a: ArrayD<f64>) -> Self {
        XformArray::F8(a)
    }
}

/// One of the catalog's concrete lattices, addressed with `u64`.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyHier {
    /// `CartHier1D_f4`
    Cart1F4(CartHier<1, f32>),
    /// `CartHier2D_f4`
    Cart2F4(CartHier<2, f32>),
    /// `CartHier3D_f4`
    Cart3F4(CartHier<3, f32>),
    /// `CartHier4D_f4`
    Cart4F4(CartHier<4, f32>),
    /// `CartHier5D_f4`
    Cart5F4(CartHier<5, f32>),
    /// `CartHier6D_f4`
    Cart6F4(CartHier<6, f32>),
    /// `CartHier1D_f8`
    Cart1F8(CartHier<1, f64>),
    /// `CartHier2D_f8`
    Cart2F8(CartHier<2, f64>),
    /// `CartHier3D_f8`
    Cart3F8(CartHier<3, f64>),
    /// `CartHier4D_f8`
    Cart4F8(CartHier<4, f64>),
    /// `CartHier5D_f8`
    Cart5F8(CartHier<5, f64>),
    /// `CartHier6D_f8`
    Cart6F8(CartHier<6, f64>),
    /// `RotHier_f4`
    RotF4(RotHier<f32>),
    /// `RotHier_f8`
    RotF8(RotHier<f64>),
    /// `RotCart1Hier_f4`
    RotCart1F4(RotCart1Hier<f32>),
    /// `RotCart1Hier_f8`
    RotCart1F8(RotCart1Hier<f64>),
}

/// Run `$body` with `$h` bound to the concrete lattice inside `$any`.
macro_rules! dispatch {
    ($any:expr, $h:ident => $body:expr) => {
        match $any {
            AnyHier::Cart1F4($h) => $body,
            AnyHier::Cart2F4($h) => $body,
            AnyHier::Cart3F4($h) => $body,
            AnyHier::Cart4F4($h) => $body,
            AnyHier::Cart5F4($h) => $body,
            AnyHier::Cart6F4($h) => $body,
            AnyHier::Cart1F8($h) => $body,
            AnyHier::Cart2F8($h) => $body,
            AnyHier::Cart3F8($h) => $body,
            AnyHier::Cart4F8($h) => $body,
            AnyHier::Cart5F8($h) => $body,
            AnyHier::Cart6F8($h) => $body,
            AnyHier::RotF4($h) => $body,
            AnyHier::RotF8($h) => $body,
            AnyHier::RotCart1F4($h) => $body,
            AnyHier::RotCart1F8($h) => $body,
        }
    };
}

fn full_dim_of<H: Hierarchy>(_: &H) -> u32 {
    H::FULL_DIM
}

fn wrong_params(name: LatticeName) -> Error {
    Error::InvalidParameter {
        name: "params",
        message: format!("parameters do not describe a {name}"),
    }
}

impl AnyHier {
    /// Build the lattice `name` from `params`.
    pub fn build(name: LatticeName, params: &LatticeParams) -> Result<Self> {
        use Precision::{F4, F8};
        let h = match (name.kind, name.precision, params) {
            (LatticeKind::Cart(dim), precision, LatticeParams::Cart(cfg)) => {
                build_cart(dim, precision, cfg)?
            }
            (LatticeKind::Rot, F4, LatticeParams::Rot(cfg)) => AnyHier::RotF4(cfg.build()?),
            (LatticeKind::Rot, F8, LatticeParams::Rot(cfg)) => AnyHier::RotF8(cfg.build()?),
            (LatticeKind::RotCart1, F4, LatticeParams::RotCart1(cfg)) => {
                AnyHier::RotCart1F4(cfg.build()?)
            }
            (LatticeKind::RotCart1, F8, LatticeParams::RotCart1(cfg)) => {
                AnyHier::RotCart1F8(cfg.build()?)
            }
            _ => return Err(wrong_params(name)),
        };
        tracing::debug!(%name, ncell = h.ncell(), max_resl = h.max_resl(), "built lattice");
        Ok(h)
    }

    /// Parse `name` and build it.
    pub fn from_name(name: &str, params: &LatticeParams) -> Result<Self> {
        Self::build(name.parse()?, params)
    }

    /// Catalog name of this lattice.
    pub fn name(&self) -> LatticeName {
        let (kind, precision) = match self {
            AnyHier::Cart1F4(_) => (LatticeKind::Cart(1), Precision::F4),
            AnyHier::Cart2F4(_) => (LatticeKind::Cart(2), Precision::F4),
            AnyHier::Cart3F4(_) => (LatticeKind::Cart(3), Precision::F4),
            AnyHier::Cart4F4(_) => (LatticeKind::Cart(4), Precision::F4),
            AnyHier::Cart5F4(_) => (LatticeKind::Cart(5), Precision::F4),
            AnyHier::Cart6F4(_) => (LatticeKind::Cart(6), Precision::F4),
            AnyHier::Cart1F8(_) => (LatticeKind::Cart(1), Precision::F8),
            AnyHier::Cart2F8(_) => (LatticeKind::Cart(2), Precision::F8),
            AnyHier::Cart3F8(_) => (LatticeKind::Cart(3), Precision::F8),
            AnyHier::Cart4F8(_) => (LatticeKind::Cart(4), Precision::F8),
            AnyHier::Cart5F8(_) => (LatticeKind::Cart(5), Precision::F8),
            AnyHier::Cart6F8(_) => (LatticeKind::Cart(6), Precision::F8),
            AnyHier::RotF4(_) => (LatticeKind::Rot, Precision::F4),
            AnyHier::RotF8(_) => (LatticeKind::Rot, Precision::F8),
            AnyHier::RotCart1F4(_) => (LatticeKind::RotCart1, Precision::F4),
            AnyHier::RotCart1F8(_) => (LatticeKind::RotCart1, Precision::F8),
        };
        LatticeName { kind, precision }
    }

    /// Interleaved axes per level.
    pub fn full_dim(&self) -> u32 {
        dispatch!(self, h => full_dim_of(h))
    }

    /// Coarse cell count.
    pub fn ncell(&self) -> u64 {
        dispatch!(self, h => h.ncell())
    }

    /// Deepest resolution.
    pub fn max_resl(&self) -> u32 {
        dispatch!(self, h => h.max_resl())
    }

    /// Number of addresses at `resl`.
    pub fn size(&self, resl: u32) -> Result<u64> {
        dispatch!(self, h => {
            h.check_resl(resl)?;
            Ok(h.size(resl))
        })
    }

    /// Validity mask and stacked values of the valid addresses.
    pub fn get_xforms(&self, resl: u32, indices: &[u64]) -> Result<(Vec<bool>, XformArray)> {
        dispatch!(self, h => {
            let (mask, values) = h.get_xforms_array(resl, indices)?;
            Ok((mask, values.into()))
        })
    }

    /// Coarse cell of each address.
    pub fn cell_index_of(&self, resl: u32, indices: &[u64]) -> Result<Vec<u64>> {
        dispatch!(self, h => {
            h.check_resl(resl)?;
            Ok(h.cell_indices_of(resl, indices))
        })
    }

    /// In-cell offset of each address.
    pub fn hier_index_of(&self, resl: u32, indices: &[u64]) -> Result<Vec<u64>> {
        dispatch!(self, h => {
            h.check_resl(resl)?;
            Ok(h.hier_indices_of(resl, indices))
        })
    }

    /// Parent of each address.
    pub fn parent_of(&self, indices: &[u64]) -> Vec<u64> {
        dispatch!(self, h => h.parents_of(indices))
    }

    /// First child of each address.
    pub fn child_of_begin(&self, indices: &[u64]) -> Vec<u64> {
        dispatch!(self, h => h.children_begin_of(indices))
    }

    /// One past the last child of each address.
    pub fn child_of_end(&self, indices: &[u64]) -> Vec<u64> {
        dispatch!(self, h => h.children_end_of(indices))
    }

    /// Beam expansion over `(score, address)` pairs; returns child addresses
    /// and their stacked values.
    pub fn expand_top_n(
        &self,
        resl: u32,
        samples: &[ScoreIndex<u64>],
        cfg: &ExpandConfig,
    ) -> Result<(Vec<u64>, XformArray)> {
        dispatch!(self, h => {
            let (idx, values) = expand_top_n(h, resl, samples, cfg)?.into_parts();
            Ok((idx, stack(&values)?.into()))
        })
    }

    /// As [`AnyHier::expand_top_n`], with scores and addresses in separate slices.
    pub fn expand_top_n_separate(
        &self,
        resl: u32,
        scores: &[f64],
        indices: &[u64],
        cfg: &ExpandConfig,
    ) -> Result<(Vec<u64>, XformArray)> {
        dispatch!(self, h => {
            let (idx, values) = expand_top_n_separate(h, resl, scores, indices, cfg)?.into_parts();
            Ok((idx, stack(&values)?.into()))
        })
    }
}

fn build_cart(dim: u8, precision: Precision, cfg: &CartHierConfig) -> Result<AnyHier> {
    use Precision::{F4, F8};
    Ok(match (dim, precision) {
        (1, F4) => AnyHier::Cart1F4(cfg.build()?),
        (2, F4) => AnyHier::Cart2F4(cfg.build()?),
        (3, F4) => AnyHier::Cart3F4(cfg.build()?),
        (4, F4) => AnyHier::Cart4F4(cfg.build()?),
        (5, F4) => AnyHier::Cart5F4(cfg.build()?),
        (6, F4) => AnyHier::Cart6F4(cfg.build()?),
        (1, F8) => AnyHier::Cart1F8(cfg.build()?),
        (2, F8) => AnyHier::Cart2F8(cfg.build()?),
        (3, F8) => AnyHier::Cart3F8(cfg.build()?),
        (4, F8) => AnyHier::Cart4F8(cfg.build()?),
        (5, F8) => AnyHier::Cart5F8(cfg.build()?),
        (6, F8) => AnyHier::Cart6F8(cfg.build()?),
        _ => return Err(Error::UnknownLattice(format!("CartHier{dim}D_{}", precision.tag()))),
    })
}

/// [`decode_coefficients`] on `u64` addresses with the dimension chosen at runtime.
pub fn decode_coefficients_dyn(dim: usize, indices: &[u64], resl: u32) -> Result<Array2<u64>> {
    match dim {
        1 => decode_coefficients::<u64, 1>(indices, resl),
        2 => decode_coefficients::<u64, 2>(indices, resl),
        3 => decode_coefficients::<u64, 3>(indices, resl),
        4 => decode_coefficients::<u64, 4>(indices, resl),
        5 => decode_coefficients::<u64, 5>(indices, resl),
        6 => decode_coefficients::<u64, 6>(indices, resl),
        _ => Err(unsupported_dim(dim)),
    }
}

/// [`encode_coefficients`] on `u64` addresses with the dimension chosen at runtime.
pub fn encode_coefficients_dyn(
    dim: usize,
    coeffs: ArrayView2<'_, u64>,
    resl: u32,
) -> Result<Vec<u64>> {
    match dim {
        1 => encode_coefficients::<u64, 1>(coeffs, resl),
        2 => encode_coefficients::<u64, 2>(coeffs, resl),
        3 => encode_coefficients::<u64, 3>(coeffs, resl),
        4 => encode_coefficients::<u64, 4>(coeffs, resl),
        5 => encode_coefficients::<u64, 5>(coeffs, resl),
        6 => encode_coefficients::<u64, 6>(coeffs, resl),
        _ => Err(unsupported_dim(dim)),
    }
}

fn unsupported_dim(dim: usize) -> Error {
    Error::InvalidParameter {
        name: "dim",
        message: format!("coefficient codec supports 1..=6 axes, got {dim}"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cart_params(dim: usize) -> LatticeParams {
        LatticeParams::Cart(CartHierConfig::new(vec![0.0; dim], vec![1.0; dim], vec![2; dim]))
    }

    #[test]
    fn test_name_roundtrip() {
        let names = supported_names();
        assert_eq!(names.len(), 16);
        for name in names {
            let s = name.to_string();
            assert_eq!(s.parse::<LatticeName>().unwrap(), name, "{s}");
        }
        assert_eq!(
            "CartHier3D_f8".parse::<LatticeName>().unwrap(),
            LatticeName {
                kind: LatticeKind::Cart(3),
                precision: Precision::F8
            }
        );
    }

    #[test]
    fn test_unknown_names() {
        for bad in ["CartHier7D_f8", "CartHier0D_f4", "RotHier_f2", "OriHier_f8", "RotHier", ""] {
            assert!(
                matches!(bad.parse::<LatticeName>(), Err(Error::UnknownLattice(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_build_every_cart() {
        for dim in 1..=6u8 {
            for precision in [Precision::F4, Precision::F8] {
                let name = LatticeName::new(LatticeKind::Cart(dim), precision).unwrap();
                let h = AnyHier::build(name, &cart_params(dim as usize)).unwrap();
                assert_eq!(h.name(), name);
                assert_eq!(h.full_dim(), dim as u32);
                assert_eq!(h.ncell(), 1 << dim);
                let (mask, values) = h.get_xforms(1, &[0, h.size(1).unwrap()]).unwrap();
                assert_eq!(mask, vec![true, false]);
                assert_eq!(values.shape(), &[1, dim as usize]);
            }
        }
    }

    #[test]
    fn test_wrong_params_rejected() {
        let rot = LatticeParams::Rot(RotHierConfig::new(0.0, 90.0, 3));
        assert!(AnyHier::from_name("CartHier2D_f8", &rot).is_err());
        assert!(AnyHier::from_name("CartHier2D_f8", &cart_params(3)).is_err());
        assert!(AnyHier::from_name("RotHier_f4", &rot).is_ok());
    }

    #[test]
    fn test_rot_shapes() {
        let rot = AnyHier::from_name("RotHier_f8", &LatticeParams::Rot(RotHierConfig::new(0.0, 90.0, 3)))
            .unwrap();
        let (_, values) = rot.get_xforms(0, &[0, 1, 2]).unwrap();
        assert_eq!(values.shape(), &[3, 3, 3]);

        let screw = AnyHier::from_name(
            "RotCart1Hier_f4",
            &LatticeParams::RotCart1(RotCart1HierConfig::new(0.0, 1.0, 2, 0.0, 90.0, 2)),
        )
        .unwrap();
        let (idx, values) = screw
            .expand_top_n_separate(0, &[1.0, 0.0, 3.0, 2.0], &[0, 1, 2, 3], &ExpandConfig::new(2))
            .unwrap();
        assert_eq!(idx.len(), 8);
        assert_eq!(values.shape(), &[8, 4, 4]);
        assert!(matches!(values, XformArray::F4(_)));
        let mut parents = screw.parent_of(&idx);
        parents.sort_unstable();
        assert_eq!(parents, vec![2, 2, 2, 2, 3, 3, 3, 3]);
    }

    #[test]
    fn test_paired_expansion_matches_separate() {
        let h = AnyHier::from_name("CartHier2D_f8", &cart_params(2)).unwrap();
        let scores = [4.0, 1.0, 0.0, 9.0];
        let indices = [0u64, 1, 2, 3];
        let samples: Vec<_> = scores.iter().zip(&indices).map(|(&s, &i)| ScoreIndex::new(s, i)).collect();
        let cfg = ExpandConfig::new(2).with_parallel(false);
        let (paired_idx, paired_values) = h.expand_top_n(0, &samples, &cfg).unwrap();
        let (idx, values) = h.expand_top_n_separate(0, &scores, &indices, &cfg).unwrap();
        assert_eq!(paired_idx, idx);
        assert_eq!(paired_values.shape(), &[8, 2]);
        assert_eq!(paired_values.to_f64(), values.to_f64());
        let mut parents = h.parent_of(&paired_idx);
        parents.sort_unstable();
        parents.dedup();
        assert_eq!(parents, vec![0, 3]);
    }

    #[test]
    fn test_resolution_guarded_on_dynamic_surface() {
        let h = AnyHier::from_name("CartHier3D_f8", &cart_params(3)).unwrap();
        let max_resl = h.max_resl();
        assert_eq!(max_resl, 20);
        assert_eq!(h.size(max_resl).unwrap(), 8 << 60);
        for resl in [max_resl + 1, 2_000_000_000, u32::MAX] {
            assert!(matches!(h.size(resl), Err(Error::ResolutionOutOfRange { .. })));
            assert!(h.cell_index_of(resl, &[1]).is_err());
            assert!(h.hier_index_of(resl, &[1]).is_err());
        }
        assert_eq!(h.cell_index_of(1, &[9, 17]).unwrap(), vec![1, 2]);
        assert_eq!(h.hier_index_of(1, &[9, 17]).unwrap(), vec![1, 1]);
    }

    #[test]
    fn test_dyn_codecs() {
        let idx: Vec<u64> = (0..64).map(|i| i * 131).collect();
        for dim in 1..=6 {
            let coeffs = decode_coefficients_dyn(dim, &idx, 3).unwrap();
            assert_eq!(coeffs.ncols(), dim + 1);
            assert_eq!(encode_coefficients_dyn(dim, coeffs.view(), 3).unwrap(), idx);
        }
        assert!(decode_coefficients_dyn(7, &idx, 3).is_err());
        assert!(encode_coefficients_dyn(0, Array2::zeros((0, 1)).view(), 3).is_err());
    }
}
