//! Truncated power-series arithmetic.
//!
//! Coefficient slices are ascending: `a[k]` multiplies `x^k`. A series of
//! length `n + 1` is known only modulo `x^(n+1)`, and every operation here
//! honours that truncation. Slices of different lengths are treated as if the
//! shorter one were padded with zeros.
//!
//! These are the building blocks for the TaylorT4/TaylorT5 velocity equations,
//! where the ratio of flux and energy series is itself re-expanded and
//! truncated rather than computed as a ratio of two separately summed values.

pub mod expansion;

pub use expansion::{PNExpansion, PNTerm};

use crate::float::{lit, PnFloat};

#[inline]
fn coeff<T: PnFloat>(a: &[T], k: usize) -> T {
    a.get(k).copied().unwrap_or_else(T::zero)
}

/// Evaluate `Σ a[k] x^k` by Horner's method.
pub fn horner<T: PnFloat>(a: &[T], x: T) -> T {
    a.iter().rev().fold(T::zero(), |acc, &c| acc * x + c)
}

/// Cauchy product of `a` and `b`, keeping the first `len` coefficients.
pub(crate) fn truncated_product<T: PnFloat>(a: &[T], b: &[T], len: usize) -> Vec<T> {
    let mut c = vec![T::zero(); len];
    for (i, &ai) in a.iter().enumerate().take(len) {
        for (j, &bj) in b.iter().enumerate().take(len - i) {
            c[i + j] += ai * bj;
        }
    }
    c
}

/// Reciprocal series.
///
/// Returns `b` with `b.len() == a.len()` such that `a·b = 1 + O(x^(n+1))`.
/// `a[0]` must be nonzero; a leading zero power has to be factored out by the
/// caller.
pub fn series_inverse<T: PnFloat>(a: &[T]) -> Vec<T> {
    let n = a.len();
    let mut b = vec![T::zero(); n];
    if n == 0 {
        return b;
    }
    let inv_a0 = T::one() / a[0];
    b[0] = inv_a0;
    for k in 1..n {
        let mut sum = T::zero();
        for j in 1..=k {
            sum += a[j] * b[k - j];
        }
        b[k] = -sum * inv_a0;
    }
    b
}

/// Value at `x` of the product `a·b` truncated at the longer of the two
/// lengths.
///
/// Equivalent to convolving and then evaluating with Horner's method, but the
/// convolution is never materialized: with `B_m(x) = Σ_{i≤m} b[i] x^i`, the
/// result is `a[0] B_n + x (a[1] B_{n-1} + x (a[2] B_{n-2} + ...))`.
pub fn series_product<T: PnFloat>(a: &[T], b: &[T], x: T) -> T {
    let len = a.len().max(b.len());
    if len == 0 {
        return T::zero();
    }
    let n = len - 1;
    let mut partial_b = vec![T::zero(); len];
    let mut x_power = T::one();
    let mut running = T::zero();
    for (m, slot) in partial_b.iter_mut().enumerate() {
        running += coeff(b, m) * x_power;
        *slot = running;
        x_power *= x;
    }
    let mut acc = T::zero();
    for j in (0..=n).rev() {
        acc = acc * x + coeff(a, j) * partial_b[n - j];
    }
    acc
}

/// Value at `x` of `A(x)/B(x)` re-expanded as a single series and truncated
/// at the shared order.
pub fn series_ratio<T: PnFloat>(a: &[T], b: &[T], x: T) -> T {
    let len = a.len().max(b.len());
    let padded: Vec<T> = (0..len).map(|k| coeff(b, k)).collect();
    series_product(a, &series_inverse(&padded), x)
}

/// Truncated ratio for expansions whose coefficients already contain their
/// powers of `v` (the `x = 1` form).
///
/// The reciprocal of `b` is built iteratively and the truncated product is
/// accumulated directly as `Σ_j a[j] Σ_{m ≤ n-j} b⁻¹[m]`.
pub fn series_ratio_expansion<T: PnFloat>(a: &[T], b: &[T]) -> T {
    let len = a.len().max(b.len());
    if len == 0 {
        return T::zero();
    }
    let inv_b0 = T::one() / coeff(b, 0);
    let mut b_inv = Vec::with_capacity(len);
    b_inv.push(inv_b0);
    for k in 1..len {
        let mut sum = T::zero();
        for j in 1..=k {
            sum += coeff(b, j) * b_inv[k - j];
        }
        b_inv.push(-sum * inv_b0);
    }
    let mut prefix = T::zero();
    let mut total = T::zero();
    for j in (0..len).rev() {
        prefix += b_inv[len - 1 - j];
        total += coeff(a, j) * prefix;
    }
    total
}

/// Compositional inverse by Lagrange inversion.
///
/// `a[i]` is the coefficient of `x^(i+1)` in `f(x) = a₁x + a₂x² + ...` (no
/// constant term, `a₁ ≠ 0`). Returns `g` in the same layout, with
/// `f(g(y)) = g(f(x)) = x mod x^(n+1)`.
///
/// `h(x) = x/f(x)` is the reciprocal of the shifted series `a₁ + a₂x + ...`,
/// and the k-th coefficient of `g` is `[x^(k-1)] h(x)^k / k`; powers of `h`
/// are built up one multiplication at a time.
pub fn series_reversion<T: PnFloat>(a: &[T]) -> Vec<T> {
    let n = a.len();
    let mut g = vec![T::zero(); n];
    if n == 0 {
        return g;
    }
    let h = series_inverse(a);
    let mut h_power = h.clone();
    g[0] = h_power[0];
    for k in 2..=n {
        h_power = truncated_product(&h_power, &h, n);
        g[k - 1] = h_power[k - 1] / lit::<T>(k as f64);
    }
    g
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_series<T: PnFloat>(rng: &mut StdRng, len: usize) -> Vec<T> {
        (0..len)
            .map(|k| {
                if k == 0 {
                    lit(rng.gen_range(1.0..2.0))
                } else {
                    lit(rng.gen_range(-0.5..0.5))
                }
            })
            .collect()
    }

    fn check_inverse<T: PnFloat>(eps: f64) {
        let mut rng = StdRng::seed_from_u64(17);
        for len in 1..=21 {
            let a: Vec<T> = random_series(&mut rng, len);
            let b = series_inverse(&a);
            for &x in &[0.0, 0.05, 0.1, 0.25] {
                let value = series_product(&a, &b, lit::<T>(x));
                let err = (value - T::one()).abs();
                assert!(
                    err <= lit(100.0 * eps),
                    "len {} x {}: a·a⁻¹ = {:?}",
                    len,
                    x,
                    value
                );
            }
        }
    }

    fn check_ratio_scaling<T: PnFloat>(eps: f64) {
        let mut rng = StdRng::seed_from_u64(23);
        for len in 1..=21 {
            let a: Vec<T> = random_series(&mut rng, len);
            let s: T = lit(rng.gen_range(0.5..3.0));
            let scaled: Vec<T> = a.iter().map(|&c| c * s).collect();
            for &x in &[0.05, 0.2] {
                let x = lit::<T>(x);
                let tol = lit::<T>(100.0 * eps);
                let one = series_ratio(&a, &a, x);
                assert!((one - T::one()).abs() <= tol, "len {}: {:?}", len, one);
                let inv_s = series_ratio(&a, &scaled, x);
                assert!(
                    ((inv_s - T::one() / s) * s).abs() <= tol,
                    "len {}: {:?} vs 1/{:?}",
                    len,
                    inv_s,
                    s
                );
                let s_back = series_ratio(&scaled, &a, x);
                assert!(((s_back - s) / s).abs() <= tol, "len {}: {:?}", len, s_back);
            }
        }
    }

    #[test]
    fn test_inverse_f64() {
        check_inverse::<f64>(f64::EPSILON);
    }

    #[test]
    fn test_inverse_f32() {
        check_inverse::<f32>(f64::from(f32::EPSILON));
    }

    #[test]
    fn test_ratio_scaling_f64() {
        check_ratio_scaling::<f64>(f64::EPSILON);
    }

    #[test]
    fn test_ratio_scaling_f32() {
        check_ratio_scaling::<f32>(f64::from(f32::EPSILON));
    }

    #[test]
    fn test_product_matches_convolution_then_horner() {
        let mut rng = StdRng::seed_from_u64(5);
        for len in 1..=12 {
            let a: Vec<f64> = random_series(&mut rng, len);
            let b: Vec<f64> = random_series(&mut rng, len);
            let c = truncated_product(&a, &b, len);
            for &x in &[0.0, 0.3, 0.9, -0.7] {
                let direct = series_product(&a, &b, x);
                let reference = horner(&c, x);
                assert!(
                    (direct - reference).abs() <= 1e-13 * (1.0 + reference.abs()),
                    "len {} x {}: {} vs {}",
                    len,
                    x,
                    direct,
                    reference
                );
            }
        }
    }

    #[test]
    fn test_product_pads_shorter_series() {
        let a: [f64; 3] = [1.0, 2.0, 3.0];
        let b = [2.0];
        // (1 + 2x + 3x²)·2 at x = 0.5
        assert!((series_product(&a, &b, 0.5) - 2.0 * (1.0 + 1.0 + 0.75)).abs() < 1e-15);
    }

    #[test]
    fn test_ratio_expansion_agrees_with_unit_x() {
        let mut rng = StdRng::seed_from_u64(11);
        for len in 1..=20 {
            let a: Vec<f64> = random_series(&mut rng, len);
            let b: Vec<f64> = random_series(&mut rng, len);
            let with_x = series_ratio(&a, &b, 1.0);
            let without_x = series_ratio_expansion(&a, &b);
            assert!(
                (with_x - without_x).abs() <= 1e-12 * (1.0 + with_x.abs()),
                "len {}: {} vs {}",
                len,
                with_x,
                without_x
            );
        }
    }

    #[test]
    fn test_ratio_of_known_series() {
        // 1/(1 - x) = 1 + x + x² + ... ; truncated at x² and evaluated at 0.1
        let value: f64 = series_ratio(&[1.0, 0.0, 0.0], &[1.0, -1.0, 0.0], 0.1);
        assert!((value - 1.11).abs() < 1e-15);
    }

    #[test]
    fn test_reversion_of_exp_minus_one() {
        // f = e^x - 1  ⇒  g = ln(1 + y) = y - y²/2 + y³/3 - ...
        let a: [f64; 5] = [1.0, 0.5, 1.0 / 6.0, 1.0 / 24.0, 1.0 / 120.0];
        let g = series_reversion(&a);
        let expected = [1.0, -0.5, 1.0 / 3.0, -0.25, 0.2];
        for (gk, ek) in g.iter().zip(expected.iter()) {
            assert!((gk - ek).abs() < 1e-14, "{:?}", g);
        }
    }

    #[test]
    fn test_reversion_round_trip() {
        let mut rng = StdRng::seed_from_u64(29);
        let eps = f64::EPSILON;
        for n in 2..=16 {
            let a: Vec<f64> = random_series(&mut rng, n);
            let g = series_reversion(&a);
            for &x in &[1e-3, 5e-3, 1e-2] {
                let f_of_x = x * horner(&a, x);
                let back = f_of_x * horner(&g, f_of_x);
                let bound = (10.0 * n as f64 * eps * x).max(100.0 * n as f64 * x.powi(n as i32 + 1));
                assert!(
                    (back - x).abs() <= bound,
                    "n {} x {}: g(f(x)) = {} (bound {})",
                    n,
                    x,
                    back,
                    bound
                );
            }
        }
    }

    #[test]
    fn test_empty_series() {
        assert!(series_inverse::<f64>(&[]).is_empty());
        assert_eq!(series_product::<f64>(&[], &[], 0.3), 0.0);
        assert!(series_reversion::<f64>(&[]).is_empty());
    }
}
