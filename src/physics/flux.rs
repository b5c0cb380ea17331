//! Gravitational-wave energy flux to infinity.
//!
//! `F = (32/5) ν² v^10 Σ f_k v^k` with non-spinning terms through 3.5PN
//! (including the 3PN logarithm), spin-orbit terms at 1.5, 2.5, 3 and 3.5PN,
//! spin-squared terms at 2PN and the leading (5PN) tidal term.

use std::f64::consts::PI;

use super::{kappa_pm, Derived, PNQuantity};
use crate::float::{lit, PnFloat, EULER_GAMMA};
use crate::series::PNExpansion;

const KNOWN_TERMS: usize = 11;

/// Newtonian flux factor `(32/5) ν² v^10`, shared with horizon absorption.
pub(crate) fn newtonian_flux<T: PnFloat>(d: &Derived<T>) -> T {
    lit::<T>(32.0 / 5.0) * d.nu * d.nu * d.v.powi(10)
}

fn coefficients<T: PnFloat>(d: &Derived<T>) -> [T; KNOWN_TERMS] {
    let c = lit::<T>;
    let nu = d.nu;
    let nu2 = nu * nu;
    let nu3 = nu2 * nu;
    let delta = d.delta;
    let sl = d.s_l;
    let sigl = d.sigma_l;
    let (kp, km) = kappa_pm::<T>();
    let pi = c(PI);
    let pi2 = c(PI * PI);
    let v = d.v;

    let f2 = c(-1247.0 / 336.0) - c(35.0 / 12.0) * nu;
    let f3 = c(4.0) * pi - c(4.0) * sl - c(1.25) * delta * sigl;
    let f4 = c(-44711.0 / 9072.0) + c(9271.0 / 504.0) * nu + c(65.0 / 18.0) * nu2
        + sl * sl * (c(2.0) * kp + c(4.0))
        + sl * sigl * (c(2.0) * delta * kp + c(4.0) * delta - c(2.0) * km)
        + sigl * sigl * (kp - delta * km + c(1.0 / 16.0) - nu * (c(4.0) * kp + c(8.0)));
    let f5 = (c(-8191.0 / 672.0) - c(583.0 / 24.0) * nu) * pi
        + (c(-4.5) + c(272.0 / 9.0) * nu) * sl
        + (c(-13.0 / 16.0) + c(43.0 / 4.0) * nu) * delta * sigl;
    let f6 = c(6643739519.0 / 69854400.0) + c(16.0 / 3.0) * pi2
        - c(1712.0 / 105.0 * EULER_GAMMA)
        - c(856.0 / 105.0) * (c(16.0) * v * v).ln()
        + (c(-134543.0 / 7776.0) + c(41.0 / 48.0) * pi2) * nu
        - c(94403.0 / 3024.0) * nu2
        - c(775.0 / 324.0) * nu3
        - c(16.0) * pi * sl
        - c(31.0 / 6.0) * pi * delta * sigl;
    let f7 = (c(-16285.0 / 504.0) + c(214745.0 / 1728.0) * nu + c(193385.0 / 3024.0) * nu2) * pi
        + (c(476645.0 / 6804.0) + c(6172.0 / 189.0) * nu - c(2810.0 / 27.0) * nu2) * sl
        + (c(9535.0 / 336.0) + c(1849.0 / 126.0) * nu - c(1501.0 / 36.0) * nu2) * delta * sigl;
    let f10 = (c(18.0) - c(12.0) * d.x2) * d.x2.powi(4) * d.lambda2
        + (c(18.0) - c(12.0) * d.x1) * d.x1.powi(4) * d.lambda1;

    [
        T::one(),
        T::zero(),
        f2,
        f3,
        f4,
        f5,
        f6,
        f7,
        T::zero(),
        T::zero(),
        f10,
    ]
}

/// Energy flux carried to infinity by gravitational waves.
pub fn flux<T: PnFloat>(d: &Derived<T>) -> PNQuantity<T> {
    PNQuantity {
        prefactor: newtonian_flux(d),
        expansion: PNExpansion::from_pn_series(&coefficients(d), d.order, 0),
        v: d.v,
    }
}
