//! End-to-end orbital evolutions through the public API.

use approx::assert_relative_eq;
use nalgebra::Vector3;
use postnewtonian::physics::precession::up_down_instability;
use postnewtonian::physics::Derived;
use postnewtonian::{
    orbital_evolution, Approximant, EvolutionConfig, EvolutionError, PNOrder, PNSystem,
    SystemKind, Termination,
};

/// `Ω` at which `v` reaches `v` for unit total mass.
fn omega(v: f64) -> f64 {
    v.powi(3)
}

fn precessing() -> EvolutionConfig {
    EvolutionConfig {
        quiet: true,
        ..EvolutionConfig::new(
            0.6,
            0.4,
            Vector3::new(0.7, 0.1, 0.7),
            Vector3::new(-0.7, 0.1, 0.7),
            0.01,
        )
    }
}

fn last_v(config: &EvolutionConfig) -> (Termination, f64) {
    let traj = orbital_evolution(config).unwrap();
    let v = traj.column("v").unwrap();
    (traj.termination(), v[v.len() - 1])
}

#[test]
fn test_precessing_reaches_target_velocity() {
    let config = EvolutionConfig {
        omega_e: Some(omega(0.4)),
        ..precessing()
    };
    let traj = orbital_evolution(&config).unwrap();
    let v = traj.column("v").unwrap();
    let v_final = v[v.len() - 1];

    println!(
        "{} samples, t_final = {}, v_final = {}, stats {:?}",
        traj.len(),
        traj.times()[traj.len() - 1],
        v_final,
        traj.forward_solution().stats
    );
    assert_eq!(traj.termination(), Termination::TargetVelocity);
    assert_relative_eq!(v_final, 0.4, epsilon = 1e-8);
    assert_relative_eq!(v[0], 0.01f64.cbrt(), epsilon = 1e-15);

    // the spins precess, so in-plane components move
    let chi1x = traj.column("chi1x").unwrap();
    assert!((chi1x[chi1x.len() - 1] - 0.7).abs() > 1e-3);
}

#[test]
fn test_precessing_default_end_frequency_reaches_v_one() {
    let traj = orbital_evolution(&precessing()).unwrap();
    let v = traj.column("v").unwrap();
    println!(
        "default Ωₑ: stopped with {} at v = {} after {} samples",
        traj.termination(),
        v[v.len() - 1],
        traj.len()
    );
    // default Ωₑ is the v = 1 frequency of the total mass
    assert_eq!(traj.termination(), Termination::TargetVelocity);
    assert_relative_eq!(v[v.len() - 1], 1.0, epsilon = 1e-8);
    assert!(traj.samples().iter().flatten().all(|x| x.is_finite()));
    assert!(traj.warnings().is_empty(), "{:?}", traj.warnings());
}

#[test]
fn test_backward_evolution_keeps_initial_condition_at_origin() {
    let forward_only = orbital_evolution(&EvolutionConfig {
        omega_e: Some(omega(0.4)),
        ..precessing()
    })
    .unwrap();
    let both = orbital_evolution(&EvolutionConfig {
        omega_1: Some(0.005),
        omega_e: Some(omega(0.4)),
        ..precessing()
    })
    .unwrap();

    assert_eq!(both.backward_termination(), Some(Termination::TargetVelocity));
    assert_eq!(both.termination(), forward_only.termination());
    assert!(both.times()[0] < 0.0);
    assert!(
        both.times().windows(2).all(|w| w[1] > w[0]),
        "stitched times must strictly ascend"
    );
    assert_relative_eq!(both.value("v", 0).unwrap(), 0.005f64.cbrt(), epsilon = 1e-8);

    let origin = both
        .times()
        .iter()
        .position(|&t| t == 0.0)
        .expect("t = 0 sample");
    assert_eq!(both.times().iter().filter(|&&t| t == 0.0).count(), 1);
    assert_eq!(both.samples()[origin], forward_only.samples()[0]);
    assert_eq!(both.interpolate(0.0).unwrap(), forward_only.samples()[0]);

    let initial = PNSystem::new(
        0.6,
        0.4,
        Vector3::new(0.7, 0.1, 0.7),
        Vector3::new(-0.7, 0.1, 0.7),
        nalgebra::Quaternion::identity(),
        0.01f64.cbrt(),
        0.0,
        0.0,
        0.0,
        PNOrder::MAX,
    );
    assert_eq!(both.samples()[origin], initial.to_vec());

    // the forward half is unaffected by the backward solve
    assert_eq!(both.forward_solution().t, forward_only.forward_solution().t);
    assert_eq!(both.len(), forward_only.len() + both.backward_solution().unwrap().len() - 1);

    // dense output on each side comes from that side's solution
    let t_back = both.times()[1] * 0.5;
    assert_eq!(
        both.interpolate(t_back),
        both.backward_solution().unwrap().interpolate(t_back)
    );
}

#[test]
fn test_aligned_spins_never_precess() {
    let traj = orbital_evolution(&EvolutionConfig {
        omega_e: Some(omega(0.4)),
        quiet: true,
        ..EvolutionConfig::new(
            0.7,
            0.3,
            Vector3::new(0.0, 0.0, 0.6),
            Vector3::new(0.0, 0.0, 0.4),
            0.01,
        )
    })
    .unwrap();
    assert_eq!(traj.termination(), Termination::TargetVelocity);
    for name in ["chi1x", "chi1y", "chi2x", "chi2y", "Rx", "Ry"] {
        let column = traj.column(name).unwrap();
        assert!(
            column.iter().all(|&x| x == 0.0),
            "{} left zero: {:?}",
            name,
            column.iter().find(|&&x| x != 0.0)
        );
    }
    let phi = traj.column("Phi").unwrap();
    assert!(phi.windows(2).all(|w| w[1] > w[0]), "phase must advance");
}

#[test]
fn test_non_positive_mass_fails_before_integrating() {
    for m1 in [0.0, -0.6] {
        let result = orbital_evolution(&EvolutionConfig { m1, ..precessing() });
        assert_eq!(
            result.unwrap_err(),
            EvolutionError::NonPositiveMass { body: 1, mass: m1 }
        );
    }
}

#[test]
fn test_up_down_instability_warns_even_when_quiet() {
    let (m1, m2) = (0.5618, 0.4382);
    let chi1 = Vector3::new(0.0, 0.0, 0.724);
    let chi2 = Vector3::new(0.0, 0.0, -0.800);

    let state = PNSystem::new(
        m1,
        m2,
        chi1,
        chi2,
        nalgebra::Quaternion::identity(),
        0.2,
        0.0,
        0.0,
        0.0,
        PNOrder::MAX,
    );
    let (lower, upper) = up_down_instability(&Derived::new(&state));
    println!("unstable band: [{:e}, {:e}]", lower, upper);
    assert!(lower > 0.0 && lower < upper);
    assert_relative_eq!(upper, 1.0 / (m1 + m2), epsilon = 1e-12);

    let traj = orbital_evolution(&EvolutionConfig {
        omega_e: Some(omega(0.3)),
        quiet: true,
        ..EvolutionConfig::new(m1, m2, chi1, chi2, 0.01)
    })
    .unwrap();
    assert!(
        traj.warnings()
            .iter()
            .any(|w| w.contains("up-down instability")),
        "warnings: {:?}",
        traj.warnings()
    );

    let unchecked = orbital_evolution(&EvolutionConfig {
        omega_e: Some(omega(0.3)),
        quiet: true,
        check_up_down_instability: false,
        ..EvolutionConfig::new(m1, m2, chi1, chi2, 0.01)
    })
    .unwrap();
    assert!(unchecked.warnings().is_empty());
}

#[test]
fn test_every_approximant_reaches_target() {
    let reference = last_v(&EvolutionConfig {
        omega_e: Some(omega(0.35)),
        ..precessing()
    });
    for approximant in [Approximant::TaylorT4, Approximant::TaylorT5] {
        let (termination, v_final) = last_v(&EvolutionConfig {
            omega_e: Some(omega(0.35)),
            approximant,
            ..precessing()
        });
        println!("{}: {} at v = {}", approximant, termination, v_final);
        assert_eq!(termination, reference.0);
        assert_relative_eq!(v_final, reference.1, epsilon = 1e-8);
    }
}

#[test]
fn test_neutron_stars_keep_tidal_parameters() {
    let traj = orbital_evolution(&EvolutionConfig {
        lambda1: 300.0,
        lambda2: 500.0,
        omega_e: Some(omega(0.35)),
        quiet: true,
        ..EvolutionConfig::new(
            0.55,
            0.45,
            Vector3::new(0.0, 0.0, 0.05),
            Vector3::new(0.0, 0.0, 0.02),
            0.01,
        )
    })
    .unwrap();
    assert_eq!(traj.kind(), SystemKind::NSNS);
    assert_eq!(traj.samples()[0].len(), 16);
    assert_eq!(traj.termination(), Termination::TargetVelocity);
    assert!(traj.column("Lambda1").unwrap().iter().all(|&l| l == 300.0));
    assert!(traj.column("Lambda2").unwrap().iter().all(|&l| l == 500.0));
    // no horizon absorption for neutron stars
    assert!(traj.column("M1").unwrap().iter().all(|&m| m == 0.55));
}

#[test]
fn test_low_pn_order() {
    let newtonian = orbital_evolution(&EvolutionConfig {
        pn_order: PNOrder::NEWTONIAN,
        omega_e: Some(omega(0.3)),
        ..precessing()
    })
    .unwrap();
    assert_eq!(newtonian.order(), PNOrder::NEWTONIAN);
    assert_eq!(newtonian.termination(), Termination::TargetVelocity);

    // Newtonian chirp: t(v) = 5M/(256ν) (v_i⁻⁸ - v⁻⁸)
    let nu: f64 = 0.24;
    let v_i = 0.01f64.cbrt();
    let expected = 5.0 / (256.0 * nu) * (v_i.powi(-8) - 0.3f64.powi(-8));
    let t_final = newtonian.times()[newtonian.len() - 1];
    assert_relative_eq!(t_final, expected, max_relative = 1e-6);
}
