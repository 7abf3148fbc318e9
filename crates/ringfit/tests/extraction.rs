use approx::assert_abs_diff_eq;
use ringfit::{
    best_of, combine, pack, rasterize, scale, Constant, Divergence, DivergenceKind,
    ExtractionContext, ExtractionSpec, Filter, FilterShape, GaussianRing, OptimizeResult,
    Optimizer, SkyImage,
};

const NPIX: usize = 64;
const RANGE: [f64; 2] = [-60.0, 60.0];

/// Compass search inside the box: probe `±step` along each axis, keep any
/// improvement, halve all steps after a sweep that improves nothing.
struct CompassSearch {
    max_sweeps: usize,
    initial_fraction: f64,
    min_fraction: f64,
}

impl Default for CompassSearch {
    fn default() -> Self {
        Self {
            max_sweeps: 4000,
            initial_fraction: 0.25,
            min_fraction: 1e-7,
        }
    }
}

impl Optimizer for CompassSearch {
    fn minimize(
        &self,
        objective: &dyn Fn(&[f64]) -> f64,
        lower: &[f64],
        upper: &[f64],
        initial: &[f64],
    ) -> OptimizeResult {
        let mut x = initial.to_vec();
        let mut fx = objective(&x);
        let mut fraction = self.initial_fraction;
        let mut sweeps = 0;

        while sweeps < self.max_sweeps && fraction >= self.min_fraction {
            sweeps += 1;
            let mut improved = false;
            for k in 0..x.len() {
                let step = fraction * (upper[k] - lower[k]);
                for dir in [1.0, -1.0] {
                    let mut trial = x.clone();
                    trial[k] = (x[k] + dir * step).clamp(lower[k], upper[k]);
                    let ft = objective(&trial);
                    if ft < fx {
                        x = trial;
                        fx = ft;
                        improved = true;
                        break;
                    }
                }
            }
            if !improved {
                fraction *= 0.5;
            }
        }

        OptimizeResult {
            params: x,
            value: fx,
            converged: fraction < self.min_fraction,
            iterations: sweeps,
        }
    }
}

fn truth() -> Filter {
    GaussianRing::new(20.0, 5.0, 0.0, 0.0).unwrap().into()
}

fn observed() -> SkyImage {
    rasterize(&truth(), NPIX, RANGE, RANGE).unwrap()
}

fn context(kind: DivergenceKind, initial: Vec<f64>) -> ExtractionContext {
    let div = Divergence::new(kind, &observed(), FilterShape::GaussianRing).unwrap();
    ExtractionContext::new(
        div,
        vec![10.0, 2.0, -8.0, -8.0],
        vec![30.0, 10.0, 8.0, 8.0],
        initial,
    )
    .unwrap()
}

#[test]
fn truth_is_the_optimum_for_both_divergences() {
    let p = pack(&truth());
    for kind in [DivergenceKind::Bhattacharyya, DivergenceKind::KullbackLeibler] {
        let ctx = context(kind, p.clone());
        let at_truth = ctx.objective(&p).unwrap();
        assert_abs_diff_eq!(at_truth, 0.0, epsilon = 1e-9);

        for k in 0..p.len() {
            for delta in [-1.0, 1.0] {
                let mut q = p.clone();
                q[k] += delta;
                let v = ctx.objective(&q).unwrap();
                assert!(v > at_truth + 1e-6, "{kind:?}: param {k} {delta:+} gives {v}");
            }
        }
    }
}

#[test]
fn bhattacharyya_coefficient_is_one_at_truth() {
    let div = Divergence::new(DivergenceKind::Bhattacharyya, &observed(), FilterShape::GaussianRing)
        .unwrap();
    assert_abs_diff_eq!(div.score(&truth()).unwrap(), 1.0, epsilon = 1e-9);
}

#[test]
fn compass_search_recovers_the_ring() {
    let ctx = context(DivergenceKind::KullbackLeibler, vec![17.0, 6.5, 2.0, -1.5]);
    let fit = ctx.run(&CompassSearch::default()).unwrap();
    let p = &fit.result.params;
    assert_abs_diff_eq!(p[0], 20.0, epsilon = 0.25);
    assert_abs_diff_eq!(p[1], 5.0, epsilon = 0.25);
    assert_abs_diff_eq!(p[2], 0.0, epsilon = 0.25);
    assert_abs_diff_eq!(p[3], 0.0, epsilon = 0.25);
    assert!(fit.result.value < 1e-3);
    assert_eq!(fit.filter.kind(), "GaussianRing");
}

#[test]
fn multistart_runs_share_one_context() {
    let ctx = context(DivergenceKind::Bhattacharyya, vec![20.0, 5.0, 0.0, 0.0]);
    let starts = [
        vec![14.0, 3.0, 4.0, 4.0],
        vec![26.0, 8.0, -4.0, 3.0],
        vec![19.0, 5.5, 1.0, -1.0],
    ];
    let optimizer = CompassSearch::default();
    let results: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = starts
            .iter()
            .map(|start| {
                let ctx = &ctx;
                let optimizer = &optimizer;
                s.spawn(move || {
                    optimizer.minimize(
                        &|p: &[f64]| ctx.penalized_objective(p),
                        ctx.lower(),
                        ctx.upper(),
                        start,
                    )
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    let best = best_of(results).unwrap();
    let ring = ctx.reconstruct(&best.params).unwrap();
    assert!(ctx.divergence().score(&ring).unwrap() > 0.999);
}

#[test]
fn ring_plus_floor_model_from_json() {
    let with_floor = combine(truth(), scale(Constant, 1e-4).unwrap());
    let image = rasterize(&with_floor, NPIX, RANGE, RANGE).unwrap();
    let spec: ExtractionSpec = serde_json::from_str(
        r#"{
            "divergence": "bhattacharyya",
            "shape": { "Sum": ["GaussianRing", { "Scale": "Constant" }] },
            "lower": [10.0, 2.0, -8.0, -8.0, 0.0],
            "upper": [30.0, 10.0, 8.0, 8.0, 0.01],
            "initial": [20.0, 5.0, 0.0, 0.0, 1e-4]
        }"#,
    )
    .unwrap();
    let ctx = spec.into_context(&image).unwrap();
    assert_abs_diff_eq!(ctx.objective(ctx.initial()).unwrap(), 0.0, epsilon = 1e-9);
    let without_floor = ctx.objective(&[20.0, 5.0, 0.0, 0.0, 0.0]).unwrap();
    assert!(without_floor > 1e-6);
}
