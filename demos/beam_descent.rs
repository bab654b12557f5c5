use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use zlattice::hierarchy::HealthCheck;
use zlattice::transform::Xform;
use zlattice::{hier_search, Hierarchy, RotCart1Hier, SearchConfig};

/// Mean squared distance between `pts` moved by `x` and `target`.
fn misfit(x: &Xform<f64>, pts: &[[f64; 3]], target: &[[f64; 3]]) -> f64 {
    let r = x.rotation();
    let t = x.translation();
    let mut acc = 0.0;
    for (p, q) in pts.iter().zip(target) {
        let m = r.apply(*p);
        acc += (0..3).map(|k| (m[k] + t[k] - q[k]).powi(2)).sum::<f64>();
    }
    acc / pts.len() as f64
}

fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    // A helical motion lattice: slide 0..20 along Z, spin a full turn about it.
    let h = RotCart1Hier::<f64>::new((0.0, 20.0, 10), (0.0, 360.0, 12), [0.0, 0.0, 1.0]).unwrap();
    assert!(h.sanity_check());

    // 1. Hide a target pose: 7.3 along Z, 131 degrees about it.
    let pts = [[1.0, 0.0, 0.0], [0.0, 2.0, 0.0], [-1.5, -0.5, 1.0], [0.3, 0.7, -2.0]];
    let truth = Xform::from_parts(
        &zlattice::Rotation::from_axis_angle([0.0, 0.0, 1.0], 131f64.to_radians()),
        [0.0, 0.0, 7.3],
    );
    let target: Vec<[f64; 3]> = pts
        .iter()
        .map(|p| {
            let m = truth.rotation().apply(*p);
            let t = truth.translation();
            [m[0] + t[0], m[1] + t[1], m[2] + t[2]]
        })
        .collect();

    // 2. Score every candidate by negative misfit and descend.
    let mut evaluate = |xs: &[Xform<f64>], _resl: u32| -> Vec<f64> {
        xs.iter().map(|x| -misfit(x, &pts, &target)).collect()
    };
    let cfg = SearchConfig::new().with_beam_size(32).with_nresl(10);
    let res = hier_search(&h, &mut evaluate, &cfg).unwrap();

    // 3. Report.
    for s in &res.stats {
        println!(
            "resl {:2}  scored {:5}  best {:>12.6}  {:?}",
            s.resl, s.nevaluated, s.best_score, s.elapsed
        );
    }
    let (score, best) = res.best().unwrap();
    let (shift, angle) = h.screw_of(res.resl(), best).unwrap();
    println!(
        "best index {best} at resl {}: shift {shift:.4}, angle {angle:.3} deg (misfit {:.2e})",
        res.resl(),
        -score
    );
    println!("cells: {}, samples at resl {}: {}", h.ncell(), res.resl(), h.size(res.resl()));
}
