//! PN formulas for the binding energy, the gravitational-wave flux, horizon
//! absorption, and the precession frequencies.
//!
//! Every formula reads the handful of derived quantities it needs from an
//! explicit [`Derived`] context built once per state. Units are geometric
//! (`G = c = 1`); spin combinations carry a `/M²` so they are dimensionless.
//!
//! Quantities that enter the `v̇` equation are returned as a [`PNQuantity`]:
//! a prefactor times a [`PNExpansion`] whose k-th coefficient already contains
//! its `v^k`. Summing the expansion gives the TaylorT1 value; TaylorT4/T5
//! combine the unsummed expansions first.
//!
//! # References
//!
//! - Blanchet, L. (2014). "Gravitational Radiation from Post-Newtonian Sources
//!   and Inspiralling Compact Binaries". Living Rev. Relativ. 17, 2.
//! - Bohé, A., Marsat, S., Faye, G., Blanchet, L. (2013). Class. Quantum Grav.
//!   30, 075017 (spin-orbit terms).
//! - Alvi, K. (2001). Phys. Rev. D 64, 104020 (horizon absorption).
//! - Vines, J., Flanagan, É., Hinderer, T. (2011). Phys. Rev. D 83, 084051
//!   (tidal terms).
//! - Gerosa, D. et al. (2015). Phys. Rev. Lett. 115, 141102 (up-down
//!   instability).

pub mod energy;
pub mod flux;
pub mod precession;
pub mod tidal_heating;

use nalgebra::{Quaternion, Vector3};

use crate::float::{lit, PnFloat};
use crate::pn_order::{truncation_length, PNOrder};
use crate::series::PNExpansion;
use crate::state::PNSystem;

/// A PN quantity as `prefactor · Σ c_k v^k`.
#[derive(Debug, Clone, PartialEq)]
pub struct PNQuantity<T> {
    /// Leading (Newtonian-order) factor
    pub prefactor: T,
    /// Relative corrections, the k-th coefficient multiplying `v^k`
    pub expansion: PNExpansion<T>,
    /// Velocity parameter the quantity was built at
    pub v: T,
}

impl<T: PnFloat> PNQuantity<T> {
    /// Fully summed value.
    pub fn value(&self) -> T {
        self.prefactor * self.expansion.evaluate(self.v)
    }
}

/// Quantities derived from a [`PNSystem`] that the formulas share.
#[derive(Debug, Clone)]
pub struct Derived<T: PnFloat> {
    /// Declared PN order
    pub order: PNOrder,
    /// Mass of body 1
    pub m1: T,
    /// Mass of body 2
    pub m2: T,
    /// Total mass
    pub m: T,
    /// Symmetric mass ratio `M1 M2 / M²`
    pub nu: T,
    /// `(M1 - M2) / M`
    pub delta: T,
    /// `M1 / M`
    pub x1: T,
    /// `M2 / M`
    pub x2: T,
    /// Dimensionless spin of body 1
    pub chi1: Vector3<T>,
    /// Dimensionless spin of body 2
    pub chi2: Vector3<T>,
    /// Spin of body 1, `M1² χ⃗₁`
    pub s1: Vector3<T>,
    /// Spin of body 2, `M2² χ⃗₂`
    pub s2: Vector3<T>,
    /// Orbital separation direction
    pub n_hat: Vector3<T>,
    /// Orbital velocity direction
    pub lambda_hat: Vector3<T>,
    /// Orbital angular momentum direction
    pub ell_hat: Vector3<T>,
    /// `S⃗·ℓ̂ / M²`
    pub s_l: T,
    /// `Σ⃗·ℓ̂ / M²`
    pub sigma_l: T,
    /// `S⃗·n̂ / M²`
    pub s_n: T,
    /// `Σ⃗·n̂ / M²`
    pub sigma_n: T,
    /// PN velocity parameter
    pub v: T,
    /// Tidal deformability of body 1
    pub lambda1: T,
    /// Tidal deformability of body 2
    pub lambda2: T,
}

impl<T: PnFloat> Derived<T> {
    /// Evaluate every shared quantity for `sys`.
    pub fn new(sys: &PNSystem<T>) -> Self {
        let m1 = sys.m1();
        let m2 = sys.m2();
        let m = m1 + m2;
        let m_sq = m * m;
        let chi1 = sys.chi1();
        let chi2 = sys.chi2();
        let s1 = chi1 * (m1 * m1);
        let s2 = chi2 * (m2 * m2);
        let s = s1 + s2;
        let sigma = (s2 / m2 - s1 / m1) * m;
        let r = sys.r();
        let n_hat = rotate(&r, Vector3::x());
        let lambda_hat = rotate(&r, Vector3::y());
        let ell_hat = rotate(&r, Vector3::z());
        Self {
            order: sys.order(),
            m1,
            m2,
            m,
            nu: m1 * m2 / m_sq,
            delta: (m1 - m2) / m,
            x1: m1 / m,
            x2: m2 / m,
            chi1,
            chi2,
            s1,
            s2,
            s_l: s.dot(&ell_hat) / m_sq,
            sigma_l: sigma.dot(&ell_hat) / m_sq,
            s_n: s.dot(&n_hat) / m_sq,
            sigma_n: sigma.dot(&n_hat) / m_sq,
            n_hat,
            lambda_hat,
            ell_hat,
            v: sys.v(),
            lambda1: sys.lambda1(),
            lambda2: sys.lambda2(),
        }
    }

    /// Orbital angular frequency `v³/M`.
    pub fn orbital_frequency(&self) -> T {
        self.v * self.v * self.v / self.m
    }

    /// Total comoving-frame angular velocity: frame precession plus the
    /// orbital rotation about ℓ̂.
    pub fn frame_angular_velocity(&self) -> Vector3<T> {
        precession::omega_p(self) + self.ell_hat * self.orbital_frequency()
    }
}

/// `R a R̄` for a pure-vector `a`.
pub fn rotate<T: PnFloat>(r: &Quaternion<T>, a: Vector3<T>) -> Vector3<T> {
    (r * Quaternion::from_imag(a) * r.conjugate()).imag()
}

/// Black-hole spin-induced quadrupole constants: `κ₊ = κ₁ + κ₂`, `κ₋ = κ₁ - κ₂`.
pub(crate) fn kappa_pm<T: PnFloat>() -> (T, T) {
    (lit(2.0), T::zero())
}

/// Sum of the vector-valued terms that survive truncation.
pub(crate) fn truncated_vector_sum<T: PnFloat>(
    terms: &[Vector3<T>],
    order: PNOrder,
    offset: usize,
) -> Vector3<T> {
    let keep = truncation_length(order, terms.len(), offset);
    terms[..keep]
        .iter()
        .fold(Vector3::zeros(), |acc, term| acc + term)
}

/// State builders shared by the physics tests.
#[cfg(test)]
pub(crate) mod test_support {
    use nalgebra::{Quaternion, Vector3};

    use crate::pn_order::PNOrder;
    use crate::state::PNSystem;

    pub fn system(
        m1: f64,
        m2: f64,
        chi1: [f64; 3],
        chi2: [f64; 3],
        v: f64,
        order: PNOrder,
    ) -> PNSystem<f64> {
        PNSystem::new(
            m1,
            m2,
            Vector3::from(chi1),
            Vector3::from(chi2),
            Quaternion::new(1.0, 0.0, 0.0, 0.0),
            v,
            0.0,
            0.0,
            0.0,
            order,
        )
    }
}
