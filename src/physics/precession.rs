//! Precession of the spins and of the orbital plane, and the up-down
//! instability band.

use nalgebra::Vector3;

use super::{truncated_vector_sum, Derived};
use crate::float::{lit, PnFloat};

/// Powers of `v` between the orbital frequency and the spin precession rate.
const SPIN_OFFSET: usize = 2;

/// Powers of `v` between the orbital frequency and the frame precession rate.
const ORBITAL_OFFSET: usize = 3;

/// Fraction of a spin allowed in the orbital plane while still counting as
/// aligned for the up-down check.
const ALIGNED_TOLERANCE: f64 = 1e-2;

/// Spin-orbit, spin-spin and quadrupole-monopole precession of one spin.
///
/// `sign` is `+1` for body 1 and `-1` for body 2 (it flips δ); `own` and
/// `other` are the spin vectors of this body and its companion, and
/// `mass_ratio` is `M_other / M_own`.
fn spin_precession<T: PnFloat>(
    d: &Derived<T>,
    sign: T,
    own: &Vector3<T>,
    other: &Vector3<T>,
    mass_ratio: T,
) -> Vector3<T> {
    let c = lit::<T>;
    let nu = d.nu;
    let nu2 = nu * nu;
    let nu3 = nu2 * nu;
    let delta = sign * d.delta;
    let m_sq = d.m * d.m;
    let v = d.v;
    let v2 = v * v;
    let kappa = T::one();
    let own_n = own.dot(&d.n_hat) / m_sq;
    let other_n = other.dot(&d.n_hat) / m_sq;

    let so0 = c(0.75) + nu / c(2.0) - c(0.75) * delta;
    let so2 = c(9.0 / 16.0) + c(1.25) * nu - nu2 / c(24.0)
        + delta * (c(-9.0 / 16.0) + c(0.625) * nu);
    let so4 = c(27.0 / 32.0) + c(3.0 / 16.0) * nu - c(105.0 / 32.0) * nu2 - nu3 / c(48.0)
        + delta * (c(-27.0 / 32.0) + c(39.0 / 8.0) * nu - c(5.0 / 32.0) * nu2);
    let spin_spin = (-other / m_sq
        + d.n_hat * (c(3.0) * other_n)
        + d.n_hat * (c(3.0) * kappa * mass_ratio * own_n))
        * v;

    let terms = [
        d.ell_hat * so0,
        spin_spin,
        d.ell_hat * (so2 * v2),
        Vector3::zeros(),
        d.ell_hat * (so4 * v2 * v2),
    ];
    truncated_vector_sum(&terms, d.order, SPIN_OFFSET) * (v.powi(5) / d.m)
}

/// Precession angular velocity of χ⃗₁.
pub fn omega_chi1<T: PnFloat>(d: &Derived<T>) -> Vector3<T> {
    spin_precession(d, T::one(), &d.s1, &d.s2, d.m2 / d.m1)
}

/// Precession angular velocity of χ⃗₂.
pub fn omega_chi2<T: PnFloat>(d: &Derived<T>) -> Vector3<T> {
    spin_precession(d, -T::one(), &d.s2, &d.s1, d.m1 / d.m2)
}

/// Precession of the orbital plane, `ϖ n̂`.
pub fn omega_p<T: PnFloat>(d: &Derived<T>) -> Vector3<T> {
    let c = lit::<T>;
    let v = d.v;
    let leading = c(7.0) * d.s_n + c(3.0) * d.delta * d.sigma_n;
    let terms = [
        d.n_hat,
        Vector3::zeros(),
        d.n_hat * ((T::one() - d.nu / c(3.0)) * v * v),
    ];
    truncated_vector_sum(&terms, d.order, ORBITAL_OFFSET) * (leading * v.powi(6) / d.m)
}

/// The up-down instability band `(Ω₊, Ω₋)`.
///
/// `r± = M (√χ_h ± √(q χ_l))⁴ / (1 - q)²` with `q = M_light / M_heavy` and the
/// spin magnitudes of the heavy and light bodies; `Ω = r^(-3/2) M^(1/2)`,
/// capped at the `v = 1` frequency `1/M`. Equal masses have no band and give
/// `(0, 0)`.
pub fn up_down_instability<T: PnFloat>(d: &Derived<T>) -> (T, T) {
    let (heavy, light, q) = if d.m1 >= d.m2 {
        (d.chi1.norm(), d.chi2.norm(), d.m2 / d.m1)
    } else {
        (d.chi2.norm(), d.chi1.norm(), d.m1 / d.m2)
    };
    let one_minus_q = T::one() - q;
    if one_minus_q == T::zero() {
        return (T::zero(), T::zero());
    }
    let a = heavy.sqrt();
    let b = (q * light).sqrt();
    let omega_max = T::one() / d.m;
    let omega = |r: T| (r.powf(lit(-1.5)) / d.m).min(omega_max);
    let r_plus = (a + b).powi(4) / (one_minus_q * one_minus_q);
    let r_minus = (a - b).powi(4) / (one_minus_q * one_minus_q);
    (omega(r_plus), omega(r_minus))
}

fn in_plane_fraction(chi: &Vector3<f64>, ell: &Vector3<f64>) -> f64 {
    let norm = chi.norm();
    if norm == 0.0 {
        return 0.0;
    }
    (chi - ell * chi.dot(ell)).norm() / norm
}

/// A warning if the system sits near the up-down configuration (heavier spin
/// aligned, lighter spin anti-aligned, both nearly along ℓ̂) and the band
/// overlaps the frequency range `[omega_1, omega_e]` that will be integrated.
pub fn up_down_instability_warning(
    d: &Derived<f64>,
    omega_1: f64,
    omega_e: f64,
) -> Option<String> {
    let (heavy, light) = if d.m1 >= d.m2 {
        (&d.chi1, &d.chi2)
    } else {
        (&d.chi2, &d.chi1)
    };
    let aligned = heavy.dot(&d.ell_hat) > 0.0
        && light.dot(&d.ell_hat) < 0.0
        && in_plane_fraction(heavy, &d.ell_hat) < ALIGNED_TOLERANCE
        && in_plane_fraction(light, &d.ell_hat) < ALIGNED_TOLERANCE;
    if !aligned {
        return None;
    }
    let (lower, upper) = up_down_instability(d);
    if !(lower < omega_e && upper > omega_1) {
        return None;
    }
    let location = if omega_1 >= lower && omega_1 <= upper {
        "starts inside"
    } else {
        "crosses"
    };
    Some(format!(
        "up-down instability: the heavier spin is aligned and the lighter spin anti-aligned \
         with the orbital angular momentum, and the requested frequency range \
         [{:.6e}, {:.6e}] {} the unstable band [{:.6e}, {:.6e}]; expect precession to grow \
         from a nearly non-precessing start",
        omega_1, omega_e, location, lower, upper
    ))
}
