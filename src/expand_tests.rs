#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::catalog::{supported_names, AnyHier, LatticeParams};
    use crate::expand::{expand_top_n, expand_top_n_separate, ExpandConfig, ScoreIndex};
    use crate::hierarchy::{
        BatchOps, CartHier, CartHierConfig, HealthCheck, Hierarchy, Homogeneous, RotCart1Hier,
        RotCart1HierConfig, RotHier, RotHierConfig, StubHier,
    };
    use crate::search::{hier_search, SearchConfig};
    use crate::transform::Vector;
    use crate::zorder::{decode, encode, Coeffs};
    use crate::{Error, Result};
    use proptest::prelude::*;
    use rand::prelude::*;
    use rand::Rng;

    fn parents_of<H: Hierarchy>(h: &H, children: &[H::Index]) -> Vec<H::Index> {
        let mut p: Vec<_> = children.iter().map(|&c| h.parent_of(c)).collect();
        p.sort_unstable();
        p.dedup();
        p
    }

    #[test]
    fn test_top_two_of_four() -> Result<()> {
        // {(5, i1), (9, i2), (1, i3), (7, i4)} with N = 2 keeps i2 and i4.
        let h = StubHier::<3>::new(5)?;
        let samples = [
            ScoreIndex::new(5.0, 1u64),
            ScoreIndex::new(9.0, 2),
            ScoreIndex::new(1.0, 3),
            ScoreIndex::new(7.0, 4),
        ];
        let out = expand_top_n(&h, 0, &samples, &ExpandConfig::new(2))?;
        assert_eq!(out.len(), 16);
        assert_eq!(parents_of(&h, &out.indices), vec![2, 4]);
        for (i, v) in out.indices.iter().zip(&out.values) {
            assert_eq!(v.0[0], *i as f64);
        }
        Ok(())
    }

    #[test]
    fn test_sentinel_scores_never_selected() -> Result<()> {
        // Scores {0, 3, 0, 8}: only 3.0 and 8.0 participate.
        let h = StubHier::<2>::new(4)?;
        let scores = [0.0, 3.0, 0.0, 8.0];
        let indices = [0u64, 1, 2, 3];
        let out = expand_top_n_separate(&h, 0, &scores, &indices, &ExpandConfig::new(4))?;
        assert_eq!(out.len(), 8);
        assert_eq!(parents_of(&h, &out.indices), vec![1, 3]);
        Ok(())
    }

    #[test]
    fn test_invalid_children_dropped() -> Result<()> {
        let h = StubHier::<3>::new(2)?.invalid_every(3);
        let samples = [ScoreIndex::new(2.0, 0u64), ScoreIndex::new(1.0, 1)];
        let out = expand_top_n(&h, 0, &samples, &ExpandConfig::new(2))?;
        let expected: Vec<u64> = (0..16).filter(|i| i % 3 != 2).collect();
        let mut got = out.indices.clone();
        got.sort_unstable();
        assert_eq!(got, expected);
        assert_eq!(out.values.len(), out.indices.len());
        assert!(out.indices.iter().all(|&i| h.get_value(1, i).is_some()));
        Ok(())
    }

    #[test]
    fn test_index_at_size_fails_whole_call() -> Result<()> {
        let h = StubHier::<2>::new(3)?;
        let size = h.size(1);
        let samples = [ScoreIndex::new(4.0, 0u64), ScoreIndex::new(1.0, size)];
        let err = expand_top_n(&h, 1, &samples, &ExpandConfig::new(1)).unwrap_err();
        assert_eq!(
            err,
            Error::IndexOutOfBounds {
                index: size,
                size,
                resl: 1
            }
        );
        // The largest valid address is fine.
        assert!(expand_top_n(&h, 1, &[ScoreIndex::new(1.0, size - 1)], &ExpandConfig::new(1)).is_ok());
        Ok(())
    }

    #[test]
    fn test_nkeep_larger_than_input() -> Result<()> {
        let h = CartHier::<3, f64>::new([0.0; 3], [1.0; 3], [2, 2, 2])?;
        let samples = [ScoreIndex::new(1.0, 5u64)];
        let out = expand_top_n(&h, 0, &samples, &ExpandConfig::new(100))?;
        assert_eq!(out.indices, (40..48).collect::<Vec<u64>>());
        let parent = h.get_value(0, 5).unwrap().0;
        for v in &out.values {
            for k in 0..3 {
                assert!((v.0[k] - parent[k]).abs() < 0.25 + 1e-12);
            }
        }
        Ok(())
    }

    #[test]
    fn test_parallel_matches_sequential() -> Result<()> {
        let h = CartHier::<3, f32>::new([-4.0; 3], [4.0; 3], [8, 8, 8])?;
        let mut rng = StdRng::seed_from_u64(7);
        let resl = 2;
        let scores: Vec<f64> = (0..2000).map(|_| rng.random_range(-1.0..1.0)).collect();
        let indices: Vec<u64> = (0..2000).map(|_| rng.random_range(0..h.size(resl))).collect();
        let base = ExpandConfig::new(300);
        let seq = expand_top_n_separate(&h, resl, &scores, &indices, &base.clone().with_parallel(false))?;
        let par = expand_top_n_separate(&h, resl, &scores, &indices, &base.with_parallel(true))?;
        assert_eq!(seq.indices, par.indices);
        assert_eq!(seq.values, par.values);
        Ok(())
    }

    #[test]
    fn test_parallel_preserves_parent_major_order() -> Result<()> {
        let h = StubHier::<2>::new(64)?;
        let samples: Vec<_> = (0..64u64).map(|i| ScoreIndex::new(i as f64 + 1.0, i)).collect();
        let out = expand_top_n(&h, 0, &samples, &ExpandConfig::new(64).with_parallel(true))?;
        // Each parent's four children are contiguous and ascending.
        for chunk in out.indices.chunks(4) {
            assert_eq!(chunk[0] % 4, 0);
            assert_eq!(chunk, &[chunk[0], chunk[0] + 1, chunk[0] + 2, chunk[0] + 3]);
        }
        Ok(())
    }

    #[test]
    fn test_expansion_leaves_lattice_usable() -> Result<()> {
        let h = RotHier::<f64>::new(0.0, 360.0, 12, [1.0, 1.0, 0.0])?;
        let samples: Vec<_> = (0..12u64).map(|i| ScoreIndex::new((i * 7 % 12) as f64 + 0.5, i)).collect();
        let first = expand_top_n(&h, 0, &samples, &ExpandConfig::new(3))?;
        let second = expand_top_n(&h, 0, &samples, &ExpandConfig::new(3))?;
        let mut a = first.indices;
        let mut b = second.indices;
        a.sort_unstable();
        b.sort_unstable();
        assert_eq!(a, b);
        Ok(())
    }

    #[test]
    fn test_homogeneous_rot_expands_to_xforms() -> Result<()> {
        let h = Homogeneous(RotHierConfig::new(-90.0, 90.0, 6).build::<f64, u64>()?);
        let out = expand_top_n(&h, 0, &[ScoreIndex::new(1.0, 2u64)], &ExpandConfig::new(1))?;
        assert_eq!(out.indices, vec![4, 5]);
        let arr = out.values_array()?;
        assert_eq!(arr.shape(), &[2, 4, 4]);
        Ok(())
    }

    #[test]
    fn test_health_check_on_reference_lattices() -> Result<()> {
        let cart = CartHierConfig::new(vec![0.0; 4], vec![2.0; 4], vec![3, 1, 2, 5]).build::<4, f64, u64>()?;
        let rot = RotHierConfig::new(0.0, 180.0, 7).build::<f32, u32>()?;
        let screw = RotCart1HierConfig::new(-1.0, 1.0, 3, 0.0, 60.0, 5).build::<f64, u64>()?;
        assert!(cart.sanity_check(), "{}", cart.health_check());
        assert!(rot.sanity_check(), "{}", rot.health_check());
        assert!(screw.sanity_check(), "{}", screw.health_check());
        assert!(Homogeneous(rot).sanity_check());
        Ok(())
    }

    #[test]
    fn test_catalog_names_build() -> Result<()> {
        for name in supported_names() {
            let params = match name.kind {
                crate::catalog::LatticeKind::Cart(d) => {
                    let d = d as usize;
                    LatticeParams::Cart(CartHierConfig::new(vec![0.0; d], vec![1.0; d], vec![2; d]))
                }
                crate::catalog::LatticeKind::Rot => {
                    LatticeParams::Rot(RotHierConfig::new(0.0, 90.0, 4))
                }
                crate::catalog::LatticeKind::RotCart1 => {
                    LatticeParams::RotCart1(RotCart1HierConfig::new(0.0, 1.0, 2, 0.0, 90.0, 2))
                }
            };
            let h = AnyHier::from_name(&name.to_string(), &params)?;
            assert_eq!(h.name(), name);
            let n = h.ncell();
            let scores: Vec<f64> = (0..n).map(|i| i as f64 + 1.0).collect();
            let indices: Vec<u64> = (0..n).collect();
            let (idx, values) = h.expand_top_n_separate(0, &scores, &indices, &ExpandConfig::new(1))?;
            assert_eq!(idx.len() as u64, 1 << h.full_dim());
            assert_eq!(values.shape()[0], idx.len());
            assert!(h.parent_of(&idx).iter().all(|&p| p == n - 1));
        }
        Ok(())
    }

    #[test]
    fn test_search_stage_counts() -> Result<()> {
        let h = RotCart1Hier::<f64>::new((0.0, 10.0, 5), (0.0, 360.0, 8), [0.0, 0.0, 1.0])?;
        let mut calls = Vec::new();
        let mut eval = |vals: &[crate::transform::Xform<f64>], resl: u32| -> Vec<f64> {
            calls.push((resl, vals.len()));
            vals.iter().map(|x| -(x.translation()[2] - 6.3).abs()).collect()
        };
        let cfg = SearchConfig::new().with_beam_size(10).with_nresl(5);
        let res = hier_search(&h, &mut eval, &cfg)?;
        assert_eq!(res.stats.len(), 5);
        assert_eq!(calls.len(), 5);
        assert_eq!(calls[0], (0, 40));
        for &(resl, n) in &calls[1..] {
            assert!(resl > 0);
            assert!(n <= 10 * 4);
        }
        let (_, best) = res.best().unwrap();
        let z = h.get_value(4, best).unwrap().translation()[2];
        assert!((z - 6.3).abs() < 2.0 * 0.0625);
        Ok(())
    }

    #[test]
    fn test_batch_surface_agrees_with_codec() -> Result<()> {
        let h = CartHier::<3, f64>::new([0.0; 3], [1.0; 3], [3, 3, 3])?;
        let resl = 3;
        let idx: Vec<u64> = (0..h.size(resl)).step_by(97).collect();
        let cells = h.cell_indices_of(resl, &idx);
        let offs = h.hier_indices_of(resl, &idx);
        for ((&i, &c), &o) in idx.iter().zip(&cells).zip(&offs) {
            let co = decode::<u64, 3>(i, resl);
            assert_eq!(co.cell, c);
            assert_eq!(encode(&Coeffs::new(0, co.coords), resl), o);
        }
        let (mask, values) = h.get_xforms(resl, &idx)?;
        assert!(mask.iter().all(|&m| m));
        assert_eq!(values.len(), idx.len());
        Ok(())
    }

    proptest! {
        #[test]
        fn expansion_only_yields_children_of_kept_parents(
            scores in proptest::collection::vec(prop_oneof![Just(0.0), -10.0f64..10.0], 1..60),
            nkeep in 0usize..20,
            k in 1u64..6,
        ) {
            let h = StubHier::<2>::new(60).unwrap().invalid_every(k);
            let indices: Vec<u64> = (0..scores.len() as u64).collect();
            let out = expand_top_n_separate(&h, 0, &scores, &indices, &ExpandConfig::new(nkeep)).unwrap();

            let live: Vec<(f64, u64)> = scores.iter().copied().zip(indices.iter().copied())
                .filter(|(s, _)| *s != 0.0).collect();
            let n = nkeep.min(live.len());
            prop_assert!(out.len() <= n * 4);

            let kept = parents_of(&h, &out.indices);
            prop_assert!(kept.len() <= n);
            // Every kept parent scores at least as well as every dropped live one.
            let worst_kept = kept.iter().map(|&p| scores[p as usize]).fold(f64::INFINITY, f64::min);
            let nbetter = live.iter().filter(|(s, _)| *s > worst_kept).count();
            prop_assert!(kept.is_empty() || nbetter < n);
            for (&i, v) in out.indices.iter().zip(&out.values) {
                prop_assert_eq!(*v, Vector([i as f64]));
                prop_assert!(i % k != k - 1);
            }
        }

        #[test]
        fn cart_children_lie_in_parent_cell(
            bs in proptest::array::uniform2(1u64..6),
            resl in 0u32..6,
            seed in any::<u64>(),
        ) {
            let h = CartHier::<2, f64>::new([0.0, -1.0], [3.0, 1.0], bs).unwrap();
            let mut rng = StdRng::seed_from_u64(seed);
            let parent = rng.random_range(0..h.size(resl));
            let p = h.get_value(resl, parent).unwrap().0;
            let half = [
                h.cell_width()[0] * 0.5f64.powi(resl as i32 + 1),
                h.cell_width()[1] * 0.5f64.powi(resl as i32 + 1),
            ];
            for child in h.child_of_begin(parent)..h.child_of_end(parent) {
                prop_assert_eq!(h.parent_of(child), parent);
                let c = h.get_value(resl + 1, child).unwrap().0;
                for ax in 0..2 {
                    prop_assert!((c[ax] - p[ax]).abs() < half[ax]);
                }
            }
        }
    }
}
