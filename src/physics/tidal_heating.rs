//! Horizon absorption: the rates at which each black hole's mass and spin
//! change because gravitational radiation falls through its horizon.
//!
//! Relative to the Newtonian flux the mass rate starts at `v^5` (2.5PN), so
//! the series is truncated with an offset of 5 and shifted into the flux's
//! index space. Bodies with a nonzero tidal parameter are neutron stars and
//! absorb nothing.

use super::flux::newtonian_flux;
use super::{Derived, PNQuantity};
use crate::float::{lit, PnFloat};
use crate::series::PNExpansion;
use nalgebra::Vector3;

/// Powers of `v` between the flux's leading term and this series'.
pub const HEATING_OFFSET: usize = 5;

/// Rates for one body.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatingRates<T> {
    /// `dM_A/dt` as a PN quantity in the flux's index space
    pub mass: PNQuantity<T>,
    /// `dM_A/dt`, summed
    pub mass_rate: T,
    /// `dS_A/dt = Ṁ_A / Ω`, summed
    pub spin_rate: T,
}

fn body_rates<T: PnFloat>(d: &Derived<T>, x: T, chi: &Vector3<T>, lambda: T) -> HeatingRates<T> {
    let c = lit::<T>;
    let coeffs: Vec<T> = if lambda == T::zero() {
        let chi_sq = chi.norm_squared();
        let chi_l = chi.dot(&d.ell_hat);
        let areal = T::one() + (T::one() - chi_sq).max(T::zero()).sqrt();
        let common = T::one() + c(3.0) * chi_sq;
        vec![
            c(-0.25) * x.powi(3) * common * chi_l,
            T::zero(),
            T::zero(),
            c(0.5) * x.powi(4) * areal * common,
        ]
    } else {
        Vec::new()
    };
    let mass = PNQuantity {
        prefactor: newtonian_flux(d),
        expansion: PNExpansion::from_pn_series(&coeffs, d.order, HEATING_OFFSET),
        v: d.v,
    };
    let mass_rate = mass.value();
    HeatingRates {
        spin_rate: mass_rate / d.orbital_frequency(),
        mass_rate,
        mass,
    }
}

/// Horizon absorption rates of body 1 and body 2.
pub fn tidal_heating<T: PnFloat>(d: &Derived<T>) -> (HeatingRates<T>, HeatingRates<T>) {
    (
        body_rates(d, d.x1, &d.chi1, d.lambda1),
        body_rates(d, d.x2, &d.chi2, d.lambda2),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::test_support::system;
    use crate::pn_order::{prepare_pn_order, PNOrder};
    use crate::state::PNSystem;
    use approx::assert_relative_eq;
    use nalgebra::Quaternion;

    #[test]
    fn test_no_absorption_below_2p5pn() {
        let d = Derived::new(&system(
            0.6,
            0.4,
            [0.0, 0.0, 0.9],
            [0.0; 3],
            0.3,
            prepare_pn_order(2.0).unwrap(),
        ));
        let (h1, h2) = tidal_heating(&d);
        assert_eq!(h1.mass_rate, 0.0);
        assert_eq!(h2.mass_rate, 0.0);
        assert_eq!(h1.mass.expansion.max_order(), 4);
    }

    #[test]
    fn test_nonspinning_absorption_is_positive() {
        let v = 0.3;
        let d = Derived::new(&system(0.5, 0.5, [0.0; 3], [0.0; 3], v, PNOrder::MAX));
        let (h1, h2) = tidal_heating(&d);
        // ½ X⁴ · 2 · v⁸ relative to the Newtonian flux
        let expected = 6.4 * 0.0625 * v.powi(10) * 0.0625 * v.powi(8);
        assert_relative_eq!(h1.mass_rate, expected, max_relative = 1e-14);
        assert_relative_eq!(h1.mass_rate, h2.mass_rate);
        assert_relative_eq!(h1.spin_rate, h1.mass_rate * 1.0 / v.powi(3), max_relative = 1e-14);
    }

    #[test]
    fn test_aligned_spin_extracts_energy() {
        let d = Derived::new(&system(
            0.6,
            0.4,
            [0.0, 0.0, 0.9],
            [0.0; 3],
            0.2,
            prepare_pn_order(3.5).unwrap(),
        ));
        let (h1, _) = tidal_heating(&d);
        assert!(h1.mass_rate < 0.0, "superradiant extraction: {}", h1.mass_rate);
        assert_eq!(h1.mass.expansion.len(), 8);
    }

    #[test]
    fn test_neutron_star_absorbs_nothing() {
        let sys = PNSystem::new(
            0.6,
            0.4,
            Vector3::new(0.0, 0.0, 0.5),
            Vector3::new(0.0, 0.0, 0.1),
            Quaternion::new(1.0, 0.0, 0.0, 0.0),
            0.3,
            0.0,
            0.0,
            300.0,
            PNOrder::MAX,
        );
        let (h1, h2) = tidal_heating(&Derived::new(&sys));
        assert!(h1.mass_rate != 0.0);
        assert_eq!(h2.mass_rate, 0.0);
        assert_eq!(h2.spin_rate, 0.0);
    }
}
