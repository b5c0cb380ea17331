//! # postnewtonian: compact-binary orbital evolution
//!
//! Post-Newtonian (PN) dynamics of inspiralling black-hole and neutron-star
//! binaries: truncated PN series, the TaylorT1/T4/T5 equations of motion for
//! masses, spins, orientation, velocity parameter and phase, and a driver
//! that integrates them forwards and backwards in time with an embedded
//! Runge-Kutta-Fehlberg 7(8) integrator.
//!
//! ## Features
//!
//! - Truncated power-series arithmetic: reciprocal, ratio and reversion
//!   (Lagrange inversion) at a declared PN order
//! - Half-integer PN order bookkeeping with an "every known term" sentinel
//! - BBH, BHNS and NSNS states with 14, 15 and 16 fields, addressable by name
//! - Binding energy, flux, tidal heating and precession generic over any
//!   `nalgebra::RealField` scalar, so dual numbers flow through unchanged
//! - **Root-found termination** on masses, spins and target frequency, plus
//!   post-step checks for step-size collapse, decreasing `v` and non-finite
//!   values
//! - Stitched forward/backward trajectories with dense output
//!
//! ## Basic Usage
//!
//! ```rust
//! use nalgebra::Vector3;
//! use postnewtonian::{orbital_evolution, EvolutionConfig, Termination};
//!
//! // Aligned spins, from v = 0.25 to v = 0.3
//! let config = EvolutionConfig {
//!     omega_e: Some(0.3f64.powi(3)),
//!     quiet: true,
//!     ..EvolutionConfig::new(
//!         0.6,
//!         0.4,
//!         Vector3::new(0.0, 0.0, 0.3),
//!         Vector3::new(0.0, 0.0, 0.2),
//!         0.25f64.powi(3),
//!     )
//! };
//! let trajectory = orbital_evolution(&config).unwrap();
//! assert_eq!(trajectory.termination(), Termination::TargetVelocity);
//!
//! let v = trajectory.column("v").unwrap();
//! assert!((v[v.len() - 1] - 0.3).abs() < 1e-8);
//! ```
//!
//! ## Series Arithmetic
//!
//! ```rust
//! use postnewtonian::series::{series_inverse, series_product};
//!
//! let a: [f64; 4] = [1.0, 0.5, -0.25, 0.125];
//! let b = series_inverse(&a);
//! assert!((series_product(&a, &b, 0.1) - 1.0).abs() < 1e-12);
//! ```
//!
//! ## The Integrator
//!
//! The RKF7(8) integrator works on any [`OdeSystem`] and is usable on its
//! own. Each solve stores every accepted step with its derivative for cubic
//! Hermite dense output, stops exactly on zero crossings of
//! [`ContinuousCallback`] conditions, and lets [`DiscreteCallback`]s end the
//! solve after any step. A right-hand side filled with NaN rejects the trial
//! step, which is how the PN equations signal that `v` left its domain.
//!
//! ## Units
//!
//! Geometric units `G = c = 1`; masses, times and frequencies are in units of
//! an arbitrary reference mass.
//!
//! ## References
//!
//! 1. Fehlberg, E. (1968). "Classical Fifth-, Sixth-, Seventh-, and
//!    Eighth-Order Runge-Kutta Formulas with Stepsize Control".
//!    NASA TR R-287.
//!
//! 2. Blanchet, L. (2014). "Gravitational Radiation from Post-Newtonian
//!    Sources and Inspiralling Compact Binaries". Living Rev. Relativ. 17, 2.
//!
//! 3. Boyle, M. et al. (2014). "Gravitational-wave modes from precessing
//!    black-hole binaries". arXiv:1409.4431.
//!
//! 4. Brent, R.P. (1973). "Algorithms for Minimization without
//!    Derivatives". Prentice-Hall.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod approximant;
pub mod coefficients;
pub mod error;
pub mod events;
pub mod evolution;
pub mod float;
pub mod interpolation;
pub mod physics;
pub mod pn_order;
pub mod series;
pub mod solution;
pub mod solver;
pub mod state;
pub mod termination;
pub mod trajectory;

pub use approximant::{Approximant, PNOdeSystem};
pub use error::{EvolutionError, IntegrationError, SeriesError, StateError};
pub use events::{
    AcceptedStep, BrentError, BrentSolver, ContinuousCallback, DiscreteCallback, EventDirection,
    NoCallbacks,
};
pub use evolution::{estimated_time_to_merger, orbital_evolution, EvolutionConfig, SaveAt};
pub use float::PnFloat;
pub use pn_order::{prepare_pn_order, PNOrder};
pub use series::expansion::{PNExpansion, PNTerm};
pub use solution::{OdeSolution, StopReason};
pub use solver::{OdeSystem, Rkf78, Stats, StepController, StepResult, Tolerances};
pub use state::{PNSystem, SystemKind};
pub use termination::{Termination, TerminationCriteria};
pub use trajectory::Trajectory;
