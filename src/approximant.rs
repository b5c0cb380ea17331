//! Right-hand sides of the orbital-evolution ODEs.
//!
//! The three Taylor approximants share everything except how the flux and the
//! energy derivative combine into `v̇`:
//!
//! - **TaylorT1** sums both series, then divides the numbers.
//! - **TaylorT4** re-expands the ratio flux/energy-derivative as one truncated
//!   series and sums that.
//! - **TaylorT5** re-expands the inverse ratio, sums it, then takes the
//!   reciprocal.

use std::fmt;
use std::str::FromStr;

use nalgebra::{Quaternion, Vector3};

use crate::error::{EvolutionError, SeriesError};
use crate::float::{lit, PnFloat};
use crate::physics::energy::binding_energy_deriv;
use crate::physics::flux::flux;
use crate::physics::precession::{omega_chi1, omega_chi2};
use crate::physics::tidal_heating::{tidal_heating, HeatingRates};
use crate::physics::Derived;
use crate::pn_order::PNOrder;
use crate::solver::OdeSystem;
use crate::state::{index, PNSystem, SystemKind};

/// How `v̇` is built from the flux and the binding energy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Approximant {
    /// Ratio of the summed series
    #[default]
    TaylorT1,
    /// Truncated re-expansion of the ratio
    TaylorT4,
    /// Reciprocal of the truncated re-expansion of the inverse ratio
    TaylorT5,
}

impl Approximant {
    /// Every implemented approximant.
    pub const ALL: [Approximant; 3] = [
        Approximant::TaylorT1,
        Approximant::TaylorT4,
        Approximant::TaylorT5,
    ];

    /// Conventional name.
    pub fn name(self) -> &'static str {
        match self {
            Approximant::TaylorT1 => "TaylorT1",
            Approximant::TaylorT4 => "TaylorT4",
            Approximant::TaylorT5 => "TaylorT5",
        }
    }

    /// `dv/dt` given the horizon absorption already computed for the state.
    pub fn v_dot<T: PnFloat>(
        self,
        d: &Derived<T>,
        heating: &(HeatingRates<T>, HeatingRates<T>),
    ) -> Result<T, SeriesError> {
        let (h1, h2) = heating;
        let f = flux(d);
        let e_prime = binding_energy_deriv(d);
        match self {
            Approximant::TaylorT1 => {
                Ok(-(f.value() + h1.mass_rate + h2.mass_rate) / e_prime.value())
            }
            Approximant::TaylorT4 | Approximant::TaylorT5 => {
                // Absorption shares the flux prefactor, so the numerators add
                // coefficient by coefficient.
                let numerator = f
                    .expansion
                    .checked_add(&h1.mass.expansion)?
                    .checked_add(&h2.mass.expansion)?;
                let scale = -f.prefactor / e_prime.prefactor;
                if self == Approximant::TaylorT4 {
                    Ok(scale * numerator.ratio_at(&e_prime.expansion, d.v)?)
                } else {
                    Ok(scale / e_prime.expansion.ratio_at(&numerator, d.v)?)
                }
            }
        }
    }

    /// Write `du/dt` for `sys` into `dudt`.
    ///
    /// If `v` is not positive every component is set to NaN, which the
    /// integrator treats as a rejected trial step.
    pub fn rhs<T: PnFloat>(self, sys: &PNSystem<T>, dudt: &mut [T]) {
        let nan = lit::<T>(f64::NAN);
        if !(sys.v() > T::zero()) {
            dudt.fill(nan);
            return;
        }
        let d = Derived::new(sys);
        let heating = tidal_heating(&d);
        let v_dot = self.v_dot(&d, &heating).unwrap_or(nan);
        let (h1, h2) = &heating;

        let chi1_dot = spin_derivative(&d.chi1, d.m1, h1, &omega_chi1(&d), &d.ell_hat);
        let chi2_dot = spin_derivative(&d.chi2, d.m2, h2, &omega_chi2(&d), &d.ell_hat);
        let r_dot = Quaternion::from_imag(d.frame_angular_velocity()) * sys.r() * lit::<T>(0.5);

        dudt[index::M1] = h1.mass_rate;
        dudt[index::M2] = h2.mass_rate;
        dudt[index::CHI1..index::CHI1 + 3].copy_from_slice(chi1_dot.as_slice());
        dudt[index::CHI2..index::CHI2 + 3].copy_from_slice(chi2_dot.as_slice());
        dudt[index::R] = r_dot.w;
        dudt[index::R + 1] = r_dot.i;
        dudt[index::R + 2] = r_dot.j;
        dudt[index::R + 3] = r_dot.k;
        dudt[index::V] = v_dot;
        dudt[index::PHI] = d.orbital_frequency();
        for slot in dudt[index::PHI + 1..sys.kind().len()].iter_mut() {
            *slot = T::zero();
        }
    }
}

/// `dχ⃗/dt`: magnitude change from absorption along χ̂ (ℓ̂ for a
/// non-spinning body) plus rotation about the precession vector.
fn spin_derivative<T: PnFloat>(
    chi: &Vector3<T>,
    mass: T,
    heating: &HeatingRates<T>,
    omega: &Vector3<T>,
    ell_hat: &Vector3<T>,
) -> Vector3<T> {
    let magnitude = chi.norm();
    let direction = if magnitude > T::zero() {
        chi / magnitude
    } else {
        *ell_hat
    };
    let rate = heating.spin_rate / (mass * mass) - lit::<T>(2.0) * magnitude * heating.mass_rate / mass;
    direction * rate + omega.cross(chi)
}

impl fmt::Display for Approximant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Approximant {
    type Err = EvolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Approximant::ALL
            .iter()
            .copied()
            .find(|a| a.name() == s)
            .ok_or_else(|| EvolutionError::UnsupportedApproximant {
                name: s.to_string(),
                supported: Approximant::ALL
                    .iter()
                    .map(|a| a.name())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

/// The PN equations as an [`OdeSystem`] over the packed `f64` state.
#[derive(Debug, Clone, Copy)]
pub struct PNOdeSystem {
    /// Variant, which fixes the state length
    pub kind: SystemKind,
    /// Declared PN order
    pub order: PNOrder,
    /// `v̇` formulation
    pub approximant: Approximant,
}

impl OdeSystem for PNOdeSystem {
    fn dim(&self) -> usize {
        self.kind.len()
    }

    fn rhs(&self, _t: f64, y: &[f64], dydt: &mut [f64]) {
        match PNSystem::from_slice(self.kind, y, self.order) {
            Ok(sys) => self.approximant.rhs(&sys, dydt),
            Err(_) => dydt.fill(f64::NAN),
        }
    }
}
