//! Monotone piecewise-cubic interpolation (Fritsch & Carlson, 1980).
//!
//! Used to invert the orbital phase `Φ(t)` when resampling a trajectory at
//! uniform phase: the interpolant of `t(Φ)` through increasing data never
//! overshoots, so resampled times stay ordered.

use crate::solution::hermite;

/// Monotone cubic Hermite spline through `(x_i, y_i)`.
#[derive(Debug, Clone, PartialEq)]
pub struct MonotoneCubic {
    x: Vec<f64>,
    y: Vec<f64>,
    slopes: Vec<f64>,
}

impl MonotoneCubic {
    /// Fit through the given points.
    ///
    /// Returns `None` unless there are at least two points, the lengths match,
    /// every value is finite and `x` is strictly increasing.
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Option<Self> {
        if x.len() < 2 || x.len() != y.len() {
            return None;
        }
        if x.iter().chain(&y).any(|v| !v.is_finite()) || x.windows(2).any(|w| w[1] <= w[0]) {
            return None;
        }
        let secants: Vec<f64> = x
            .windows(2)
            .zip(y.windows(2))
            .map(|(xw, yw)| (yw[1] - yw[0]) / (xw[1] - xw[0]))
            .collect();
        let slopes = fritsch_carlson_slopes(&secants);
        Some(Self { x, y, slopes })
    }

    /// Domain `[x_first, x_last]`.
    pub fn domain(&self) -> (f64, f64) {
        (self.x[0], self.x[self.x.len() - 1])
    }

    /// Value at `x`, or `None` outside the domain.
    pub fn eval(&self, x: f64) -> Option<f64> {
        let (lo, hi) = self.domain();
        if !(x >= lo && x <= hi) {
            return None;
        }
        let upper = self
            .x
            .partition_point(|&xi| xi < x)
            .clamp(1, self.x.len() - 1);
        let lower = upper - 1;
        let mut out = [0.0];
        hermite(
            x,
            (self.x[lower], &self.y[lower..=lower], &self.slopes[lower..=lower]),
            (self.x[upper], &self.y[upper..=upper], &self.slopes[upper..=upper]),
            &mut out,
        );
        Some(out[0])
    }
}

/// Node slopes from the interval secants `Δ_k`.
///
/// Interior slopes start as the mean of the neighbouring secants and are zero
/// at local extrema; then on each interval `α = m_k/Δ_k`, `β = m_{k+1}/Δ_k`
/// are scaled back onto the circle `α² + β² ≤ 9`.
fn fritsch_carlson_slopes(secants: &[f64]) -> Vec<f64> {
    let n = secants.len() + 1;
    let mut m = vec![0.0; n];
    m[0] = secants[0];
    m[n - 1] = secants[n - 2];
    for k in 1..n - 1 {
        m[k] = if secants[k - 1] * secants[k] <= 0.0 {
            0.0
        } else {
            0.5 * (secants[k - 1] + secants[k])
        };
    }
    for (k, &delta) in secants.iter().enumerate() {
        if delta == 0.0 {
            m[k] = 0.0;
            m[k + 1] = 0.0;
            continue;
        }
        let alpha = m[k] / delta;
        let beta = m[k + 1] / delta;
        let radius = alpha.hypot(beta);
        if radius > 3.0 {
            let tau = 3.0 / radius;
            m[k] = tau * alpha * delta;
            m[k + 1] = tau * beta * delta;
        }
    }
    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_passes_through_nodes() {
        let x = vec![0.0, 1.0, 2.5, 3.0, 7.0];
        let y = vec![0.0, 0.3, 2.0, 2.1, 9.0];
        let spline = MonotoneCubic::new(x.clone(), y.clone()).unwrap();
        for (xi, yi) in x.iter().zip(&y) {
            assert_relative_eq!(spline.eval(*xi).unwrap(), *yi, epsilon = 1e-14);
        }
    }

    #[test]
    fn test_reproduces_lines() {
        let x: Vec<f64> = (0..6).map(|i| (i * i) as f64).collect();
        let y: Vec<f64> = x.iter().map(|x| 2.0 * x - 1.0).collect();
        let spline = MonotoneCubic::new(x, y).unwrap();
        for i in 0..=250 {
            let x = i as f64 / 10.0;
            assert_relative_eq!(spline.eval(x).unwrap(), 2.0 * x - 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_monotone_data_stays_monotone() {
        // a step-like profile that makes an ordinary cubic spline overshoot
        let x = vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let y = vec![0.0, 0.0, 0.1, 5.0, 5.0, 5.1];
        let spline = MonotoneCubic::new(x, y).unwrap();
        let mut previous = f64::NEG_INFINITY;
        for i in 0..=500 {
            let x = i as f64 / 100.0;
            let value = spline.eval(x).unwrap();
            assert!(value >= previous - 1e-12, "overshoot at x = {}", x);
            assert!((-1e-12..=5.1 + 1e-12).contains(&value));
            previous = value;
        }
    }

    #[test]
    fn test_smooth_data_is_accurate() {
        let x: Vec<f64> = (0..=40).map(|i| 0.05 * i as f64).collect();
        let y: Vec<f64> = x.iter().map(|x| x.exp()).collect();
        let spline = MonotoneCubic::new(x, y).unwrap();
        for i in 0..=199 {
            let x = 0.01 * i as f64 + 0.003;
            assert_relative_eq!(spline.eval(x).unwrap(), x.exp(), max_relative = 1e-3);
        }
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(MonotoneCubic::new(vec![0.0], vec![1.0]).is_none());
        assert!(MonotoneCubic::new(vec![0.0, 1.0], vec![1.0]).is_none());
        assert!(MonotoneCubic::new(vec![0.0, 0.0], vec![1.0, 2.0]).is_none());
        assert!(MonotoneCubic::new(vec![1.0, 0.0], vec![1.0, 2.0]).is_none());
        assert!(MonotoneCubic::new(vec![0.0, 1.0], vec![f64::NAN, 2.0]).is_none());
    }

    #[test]
    fn test_outside_domain() {
        let spline = MonotoneCubic::new(vec![0.0, 1.0], vec![0.0, 1.0]).unwrap();
        assert_eq!(spline.eval(-0.1), None);
        assert_eq!(spline.eval(1.1), None);
        assert_eq!(spline.eval(f64::NAN), None);
        assert_eq!(spline.domain(), (0.0, 1.0));
    }
}
