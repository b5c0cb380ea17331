//! Binding energy `E(v)` and its derivative `dE/dv`.
//!
//! `E = -(νM v²/2) Σ e_k v^k` with non-spinning terms through 4PN, spin-orbit
//! terms at 1.5, 2.5 and 3.5PN, spin-squared terms at 2PN and the leading
//! (5PN) tidal term.

use std::f64::consts::PI;

use super::{kappa_pm, Derived, PNQuantity};
use crate::float::{lit, PnFloat, EULER_GAMMA};
use crate::series::PNExpansion;

/// Number of coefficients known, `e_0 ..= e_10`.
const KNOWN_TERMS: usize = 11;

/// `e_k` for `k = 0..=10`; `e_8` carries the `ln v` term evaluated at `v`.
fn coefficients<T: PnFloat>(d: &Derived<T>) -> [T; KNOWN_TERMS] {
    let c = lit::<T>;
    let nu = d.nu;
    let nu2 = nu * nu;
    let nu3 = nu2 * nu;
    let nu4 = nu3 * nu;
    let delta = d.delta;
    let sl = d.s_l;
    let sigl = d.sigma_l;
    let (kp, km) = kappa_pm::<T>();
    let pi2 = c(PI * PI);
    let v = d.v;

    let e2 = c(-0.75) - nu / c(12.0);
    let e3 = c(14.0 / 3.0) * sl + c(2.0) * delta * sigl;
    let e4 = c(-27.0 / 8.0) + c(19.0 / 8.0) * nu - nu2 / c(24.0)
        + sl * sl * (-kp - c(2.0))
        + sl * sigl * (-delta * kp - c(2.0) * delta + km)
        + sigl * sigl * ((delta * km - kp) / c(2.0) + nu * (kp + c(2.0)));
    let e5 = (c(11.0) - c(61.0 / 9.0) * nu) * sl + delta * (c(3.0) - c(10.0 / 3.0) * nu) * sigl;
    let e6 = c(-675.0 / 64.0) + (c(34445.0 / 576.0) - c(205.0 / 96.0) * pi2) * nu
        - c(155.0 / 96.0) * nu2
        - c(35.0 / 5184.0) * nu3;
    let e7 = (c(135.0 / 4.0) - c(367.0 / 4.0) * nu + c(29.0 / 12.0) * nu2) * sl
        + delta * (c(27.0 / 4.0) - c(39.0) * nu + c(5.0 / 4.0) * nu2) * sigl;
    let e8 = c(-3969.0 / 128.0)
        + (c(-123671.0 / 5760.0)
            + c(9037.0 / 1536.0) * pi2
            + c(896.0 / 15.0 * EULER_GAMMA)
            + c(448.0 / 15.0) * (c(16.0) * v * v).ln())
            * nu
        + (c(-498449.0 / 3456.0) + c(3157.0 / 576.0) * pi2) * nu2
        + c(301.0 / 1728.0) * nu3
        + c(77.0 / 31104.0) * nu4;
    let x1_4 = d.x1.powi(4);
    let x2_4 = d.x2.powi(4);
    let e10 = c(-9.0) * d.x1 * x2_4 * d.lambda2 - c(9.0) * d.x2 * x1_4 * d.lambda1;

    [
        T::one(),
        T::zero(),
        e2,
        e3,
        e4,
        e5,
        e6,
        e7,
        e8,
        T::zero(),
        e10,
    ]
}

/// Binding energy.
pub fn binding_energy<T: PnFloat>(d: &Derived<T>) -> PNQuantity<T> {
    PNQuantity {
        prefactor: -d.nu * d.m * d.v * d.v / lit(2.0),
        expansion: PNExpansion::from_pn_series(&coefficients(d), d.order, 0),
        v: d.v,
    }
}

/// `dE/dv`, differentiated term by term at fixed masses and spins.
///
/// With `E = -(μ/2) Σ e_k v^(k+2)`, the k-th coefficient becomes
/// `(k+2)/2 · e_k` under a prefactor `-μ v`; the 4PN logarithm adds
/// `448ν/15` to the 8th.
pub fn binding_energy_deriv<T: PnFloat>(d: &Derived<T>) -> PNQuantity<T> {
    let mut coeffs = coefficients(d);
    for (k, coefficient) in coeffs.iter_mut().enumerate() {
        *coefficient *= lit::<T>((k as f64 + 2.0) / 2.0);
    }
    coeffs[8] += lit::<T>(448.0 / 15.0) * d.nu;
    PNQuantity {
        prefactor: -d.nu * d.m * d.v,
        expansion: PNExpansion::from_pn_series(&coeffs, d.order, 0),
        v: d.v,
    }
}
