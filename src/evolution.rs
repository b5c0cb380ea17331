//! Orbital evolution driver.
//!
//! [`orbital_evolution`] validates a configuration, builds the initial
//! [`PNSystem`], integrates forwards from `t = 0` until a termination
//! criterion fires and, when an earlier frequency `Ω₁ < Ωᵢ` is requested,
//! integrates backwards from the same initial state as well. The two halves
//! are stitched into one [`Trajectory`] and optionally resampled.
//!
//! ```no_run
//! use nalgebra::Vector3;
//! use postnewtonian::evolution::{orbital_evolution, EvolutionConfig};
//!
//! let config = EvolutionConfig {
//!     omega_1: Some(0.005),
//!     ..EvolutionConfig::new(
//!         0.6,
//!         0.4,
//!         Vector3::new(0.7, 0.1, 0.7),
//!         Vector3::new(-0.7, 0.1, 0.7),
//!         0.01,
//!     )
//! };
//! let trajectory = orbital_evolution(&config)?;
//! println!("stopped because: {}", trajectory.termination());
//! # Ok::<(), postnewtonian::EvolutionError>(())
//! ```

use std::f64::consts::TAU;

use nalgebra::{Quaternion, Vector3};

use crate::approximant::{Approximant, PNOdeSystem};
use crate::error::EvolutionError;
use crate::physics::precession::up_down_instability_warning;
use crate::physics::Derived;
use crate::pn_order::PNOrder;
use crate::solution::OdeSolution;
use crate::solver::{OdeSystem, Rkf78, Tolerances};
use crate::state::{index, PNSystem};
use crate::termination::{classify, report, Direction, Termination, TerminationCriteria};
use crate::trajectory::Trajectory;

/// Safety factor on the leading-order time to merger when bounding the solve.
const TIME_SPAN_FACTOR: f64 = 4.0;

/// Initial step size as a fraction of the initial orbital period.
const INITIAL_STEPS_PER_ORBIT: f64 = 16.0;

/// Explicit output grid.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveAt {
    /// Every multiple of this step that lies in the integrated span
    Step(f64),
    /// These times, where they lie in the integrated span
    Times(Vec<f64>),
}

/// Everything [`orbital_evolution`] needs. Build with [`EvolutionConfig::new`]
/// and override fields with struct-update syntax.
#[derive(Debug, Clone, PartialEq)]
pub struct EvolutionConfig {
    /// Mass of body 1
    pub m1: f64,
    /// Mass of body 2
    pub m2: f64,
    /// Dimensionless spin of body 1
    pub chi1: Vector3<f64>,
    /// Dimensionless spin of body 2
    pub chi2: Vector3<f64>,
    /// Orbital angular frequency at `t = 0`
    pub omega_i: f64,
    /// Earliest frequency; below `omega_i` triggers a backward evolution
    pub omega_1: Option<f64>,
    /// Frequency at which forward evolution stops; `1/M` if unset
    pub omega_e: Option<f64>,
    /// Orientation rotor at `t = 0`
    pub r_i: Quaternion<f64>,
    /// Tidal deformability of body 1
    pub lambda1: f64,
    /// Tidal deformability of body 2
    pub lambda2: f64,
    /// PN truncation order
    pub pn_order: PNOrder,
    /// How `v̇` is built
    pub approximant: Approximant,
    /// Absolute tolerance of every component
    pub abstol: f64,
    /// Relative tolerance of every component
    pub reltol: f64,
    /// Explicit output grid
    pub saveat: Option<SaveAt>,
    /// Resample at this many points per orbit of phase
    pub samples_per_orbit: Option<usize>,
    /// Warn about the up-down instability before integrating
    pub check_up_down_instability: bool,
    /// Silence informational messages (warnings are always logged)
    pub quiet: bool,
    /// Replaces the default forward termination criteria
    pub forward_termination: Option<TerminationCriteria>,
    /// Replaces the default backward termination criteria
    pub backward_termination: Option<TerminationCriteria>,
}

impl EvolutionConfig {
    /// Configuration with every optional setting at its default: identity
    /// orientation, black holes, all known PN terms, TaylorT1, forward
    /// evolution only, samples at every integrator step.
    pub fn new(m1: f64, m2: f64, chi1: Vector3<f64>, chi2: Vector3<f64>, omega_i: f64) -> Self {
        Self {
            m1,
            m2,
            chi1,
            chi2,
            omega_i,
            omega_1: None,
            omega_e: None,
            r_i: Quaternion::identity(),
            lambda1: 0.0,
            lambda2: 0.0,
            pn_order: PNOrder::MAX,
            approximant: Approximant::TaylorT1,
            abstol: 1e-10,
            reltol: 1e-8,
            saveat: None,
            samples_per_orbit: None,
            check_up_down_instability: true,
            quiet: false,
            forward_termination: None,
            backward_termination: None,
        }
    }

    /// `M₁ + M₂`.
    pub fn total_mass(&self) -> f64 {
        self.m1 + self.m2
    }
}

/// PN velocity parameter `v = (MΩ)^(1/3)`.
pub fn v_from_frequency(total_mass: f64, omega: f64) -> f64 {
    (total_mass * omega).cbrt()
}

/// Leading-order (Newtonian, quadrupole) time to merger from `v`,
/// `5M / (256 ν v⁸)`.
///
/// Badly wrong close to merger; only used to bound the integration span.
pub fn estimated_time_to_merger(total_mass: f64, nu: f64, v: f64) -> f64 {
    5.0 * total_mass / (256.0 * nu * v.powi(8))
}

/// Validated frequencies.
#[derive(Debug, Clone, Copy)]
struct Frequencies {
    omega_1: f64,
    omega_e: f64,
}

fn validate(config: &EvolutionConfig) -> Result<Frequencies, EvolutionError> {
    for (body, mass) in [(1, config.m1), (2, config.m2)] {
        if !(mass > 0.0) || !mass.is_finite() {
            return Err(EvolutionError::NonPositiveMass { body, mass });
        }
    }
    for (body, chi) in [(1, &config.chi1), (2, &config.chi2)] {
        let magnitude_squared = chi.norm_squared();
        if !(magnitude_squared <= 1.0) {
            return Err(EvolutionError::UnphysicalSpin {
                body,
                magnitude_squared,
            });
        }
    }
    for (body, value) in [(1, config.lambda1), (2, config.lambda2)] {
        if !(value >= 0.0) {
            return Err(EvolutionError::NegativeTidalParameter { body, value });
        }
    }
    if config.lambda1 != 0.0 && config.lambda2 == 0.0 {
        return Err(EvolutionError::TidalOnFirstBodyOnly {
            lambda1: config.lambda1,
        });
    }

    let omega_i = config.omega_i;
    let omega_1 = config.omega_1.unwrap_or(omega_i);
    let omega_e = config.omega_e.unwrap_or(1.0 / config.total_mass());
    let ordering = |message: String| Err(EvolutionError::FrequencyOrdering { message });
    if !(omega_i > 0.0) || !omega_i.is_finite() {
        return ordering(format!("Ωᵢ = {} must be positive and finite", omega_i));
    }
    if !(omega_1 > 0.0) {
        return ordering(format!("Ω₁ = {} must be positive", omega_1));
    }
    if !(omega_1 <= omega_i) {
        return ordering(format!("Ω₁ = {} exceeds Ωᵢ = {}", omega_1, omega_i));
    }
    if !(omega_i <= omega_e) {
        return ordering(format!("Ωᵢ = {} exceeds Ωₑ = {}", omega_i, omega_e));
    }

    if config.samples_per_orbit.is_some() && config.saveat.is_some() {
        return Err(EvolutionError::ConflictingSampling);
    }
    let invalid = |message: String| Err(EvolutionError::InvalidSampling { message });
    match &config.saveat {
        Some(SaveAt::Step(dt)) if !(*dt > 0.0) || !dt.is_finite() => {
            return invalid(format!("saveat step {} must be positive and finite", dt));
        }
        Some(SaveAt::Times(times)) if times.iter().any(|t| !t.is_finite()) => {
            return invalid("saveat times must be finite".to_string());
        }
        _ => {}
    }
    if config.samples_per_orbit == Some(0) {
        return invalid("samples_per_orbit must be at least 1".to_string());
    }

    Ok(Frequencies { omega_1, omega_e })
}

/// Integrate the PN equations for the binary described by `config`.
///
/// Configuration problems and an initial condition at which the equations
/// are already singular are errors. Everything that stops the integration
/// afterwards is reported by [`Trajectory::termination`] and, if unexpected,
/// logged and recorded in [`Trajectory::warnings`].
pub fn orbital_evolution(config: &EvolutionConfig) -> Result<Trajectory, EvolutionError> {
    let Frequencies { omega_1, omega_e } = validate(config)?;
    let m = config.total_mass();
    let v_i = v_from_frequency(m, config.omega_i);
    let v_1 = v_from_frequency(m, omega_1);
    let v_e = v_from_frequency(m, omega_e);

    let initial = PNSystem::new(
        config.m1,
        config.m2,
        config.chi1,
        config.chi2,
        config.r_i,
        v_i,
        0.0,
        config.lambda1,
        config.lambda2,
        config.pn_order,
    );
    let kind = initial.kind();
    let system = PNOdeSystem {
        kind,
        order: config.pn_order,
        approximant: config.approximant,
    };
    let derived = Derived::new(&initial);

    let mut warnings = Vec::new();
    if config.check_up_down_instability {
        if let Some(message) = up_down_instability_warning(&derived, omega_1, omega_e) {
            log::warn!("{}", message);
            warnings.push(message);
        }
    }

    let u0 = initial.to_vec();
    let du0 = check_initial_condition(&system, &u0, v_i)?;

    let forward_criteria = config
        .forward_termination
        .clone()
        .unwrap_or_else(|| TerminationCriteria::forward(v_e));
    let t_forward = TIME_SPAN_FACTOR * estimated_time_to_merger(m, derived.nu, v_i);
    let h0 = TAU / config.omega_i / INITIAL_STEPS_PER_ORBIT;
    let forward = match forward_criteria.target_v {
        // the target condition starts at zero and would never change sign
        Some(target) if v_i >= target => {
            if !config.quiet {
                log::info!(
                    "Initial v = {} is already at the target v = {}; nothing to integrate forwards",
                    v_i,
                    target
                );
            }
            (
                OdeSolution::start(0.0, u0.clone(), du0),
                Termination::TargetVelocity,
            )
        }
        _ => {
            if !config.quiet {
                log::info!(
                    "Integrating {} {} system forwards from v = {} towards v = {} at {} order",
                    config.approximant,
                    kind,
                    v_i,
                    v_e,
                    config.pn_order
                );
            }
            integrate(
                config,
                &system,
                &u0,
                t_forward,
                h0,
                &forward_criteria,
                Direction::Forward,
                &mut warnings,
            )?
        }
    };

    let trajectory = if omega_1 < config.omega_i {
        let backward_criteria = config
            .backward_termination
            .clone()
            .unwrap_or_else(|| TerminationCriteria::backward(v_1));
        let t_forward_end = forward.0.last().map_or(0.0, |(t, _)| t);
        let t_backward = (TIME_SPAN_FACTOR * estimated_time_to_merger(m, derived.nu, v_1)
            - t_forward_end)
            .max(h0);
        if !config.quiet {
            log::info!("Integrating backwards from v = {} towards v = {}", v_i, v_1);
        }
        let backward = integrate(
            config,
            &system,
            &u0,
            -t_backward,
            -h0,
            &backward_criteria,
            Direction::Backward,
            &mut warnings,
        )?;
        Trajectory::stitch(kind, config.pn_order, backward, forward, warnings)
    } else {
        let (solution, termination) = forward;
        Trajectory::forward_only(kind, config.pn_order, solution, termination, warnings)
    };

    Ok(resample(trajectory, config))
}

/// A state or derivative that is already non-finite at `t = 0` cannot be cured
/// by shrinking steps. Returns the initial derivative.
fn check_initial_condition(
    system: &PNOdeSystem,
    u0: &[f64],
    v_i: f64,
) -> Result<Vec<f64>, EvolutionError> {
    if u0.iter().any(|u| !u.is_finite()) {
        return Err(EvolutionError::NonFiniteInitialCondition {
            what: "state",
            v: v_i,
        });
    }
    let mut du0 = vec![0.0; system.dim()];
    system.rhs(0.0, u0, &mut du0);
    if du0.iter().any(|u| !u.is_finite()) {
        return Err(EvolutionError::NonFiniteInitialCondition {
            what: "derivative",
            v: v_i,
        });
    }
    Ok(du0)
}

/// One direction of the evolution, from `t = 0` to at most `tf`.
#[allow(clippy::too_many_arguments)]
fn integrate(
    config: &EvolutionConfig,
    system: &PNOdeSystem,
    u0: &[f64],
    tf: f64,
    h0: f64,
    criteria: &TerminationCriteria,
    direction: Direction,
    warnings: &mut Vec<String>,
) -> Result<(OdeSolution, Termination), EvolutionError> {
    let dim = system.dim();
    let mut solver = Rkf78::new(Tolerances::new(config.abstol, config.reltol, dim));
    solver.set_step_limits(criteria.min_step, f64::INFINITY);

    let conditions = criteria.conditions(system.kind, direction);
    let mut checks = criteria.step_checks(direction, config.quiet);
    let solution = solver.solve(system, 0.0, u0, tf, h0, &conditions, &mut checks)?;
    warnings.extend(checks.into_warnings());

    let termination = classify(solution.reason, &conditions);
    if let Some((t, u)) = solution.last() {
        if let Some(message) = report(
            termination,
            solution.reason,
            direction,
            t,
            u[index::V],
            config.quiet,
        ) {
            warnings.push(message);
        }
    }
    log::debug!(
        "{} evolution: {} samples, {:?}",
        direction.name(),
        solution.len(),
        solution.stats
    );
    Ok((solution, termination))
}

fn resample(trajectory: Trajectory, config: &EvolutionConfig) -> Trajectory {
    if let Some(n) = config.samples_per_orbit {
        return match trajectory.resample_uniform_phase(n) {
            Some(resampled) => resampled,
            None => {
                log::warn!("too few samples to resample at uniform phase; keeping integrator steps");
                trajectory
            }
        };
    }
    match &config.saveat {
        Some(SaveAt::Step(dt)) => {
            let times = trajectory.times();
            let (first, last) = match (times.first(), times.last()) {
                (Some(&first), Some(&last)) => (first, last),
                _ => return trajectory,
            };
            let start = (first / dt).ceil() as i64;
            let end = (last / dt).floor() as i64;
            let grid: Vec<f64> = (start..=end).map(|k| k as f64 * dt).collect();
            trajectory.resample(&grid)
        }
        Some(SaveAt::Times(times)) => trajectory.resample(times),
        None => trajectory,
    }
}
