use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nalgebra::{Quaternion, Vector3};
use postnewtonian::series::{series_ratio, series_reversion};
use postnewtonian::{
    orbital_evolution, Approximant, EvolutionConfig, PNOrder, PNSystem, Rkf78, Tolerances,
};
use postnewtonian::{OdeSystem, PNOdeSystem};

fn precessing_system() -> PNSystem<f64> {
    PNSystem::new(
        0.6,
        0.4,
        Vector3::new(0.7, 0.1, 0.7),
        Vector3::new(-0.7, 0.1, 0.7),
        Quaternion::identity(),
        0.3,
        0.0,
        0.0,
        0.0,
        PNOrder::MAX,
    )
}

fn bench_series_ratio_order_8(c: &mut Criterion) {
    let a: Vec<f64> = (0..=8).map(|k| 1.0 + 0.1 * k as f64).collect();
    let b: Vec<f64> = (0..=8).map(|k| 1.0 / (1.0 + k as f64)).collect();

    c.bench_function("series_ratio_order_8", |bench| {
        bench.iter(|| series_ratio(black_box(&a), black_box(&b), 0.3))
    });
}

fn bench_series_reversion_16(c: &mut Criterion) {
    let a: Vec<f64> = (1..=16).map(|k| 1.0 / k as f64).collect();

    c.bench_function("series_reversion_16", |bench| {
        bench.iter(|| series_reversion(black_box(&a)))
    });
}

fn bench_rhs(c: &mut Criterion) {
    let state = precessing_system().to_vec();
    let mut dudt = vec![0.0; state.len()];

    for approximant in Approximant::ALL {
        let sys = PNOdeSystem {
            kind: precessing_system().kind(),
            order: PNOrder::MAX,
            approximant,
        };
        c.bench_function(&format!("rhs_{}", approximant), |bench| {
            bench.iter(|| sys.rhs(0.0, black_box(&state), &mut dudt))
        });
    }
}

fn bench_two_orbits(c: &mut Criterion) {
    let state = precessing_system().to_vec();
    let sys = PNOdeSystem {
        kind: precessing_system().kind(),
        order: PNOrder::MAX,
        approximant: Approximant::TaylorT1,
    };
    let period = 2.0 * std::f64::consts::PI / 0.3f64.powi(3);

    c.bench_function("precessing_2_orbits", |bench| {
        bench.iter(|| {
            let mut solver = Rkf78::new(Tolerances::new(1e-10, 1e-8, state.len()));
            solver
                .integrate(&sys, 0.0, black_box(&state), 2.0 * period, period / 16.0)
                .unwrap()
        })
    });
}

fn bench_short_inspiral(c: &mut Criterion) {
    let config = EvolutionConfig {
        omega_e: Some(0.3f64.powi(3)),
        quiet: true,
        ..EvolutionConfig::new(
            0.6,
            0.4,
            Vector3::new(0.0, 0.0, 0.3),
            Vector3::new(0.0, 0.0, 0.2),
            0.25f64.powi(3),
        )
    };

    let mut group = c.benchmark_group("inspiral");
    group.sample_size(10);
    group.bench_function("aligned_v_0.25_to_0.3", |bench| {
        bench.iter(|| orbital_evolution(black_box(&config)).unwrap())
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_series_ratio_order_8,
    bench_series_reversion_16,
    bench_rhs,
    bench_two_orbits,
    bench_short_inspiral
);
criterion_main!(benches);
