//! Output of one integration: every accepted step with its derivative, so the
//! trajectory can be evaluated anywhere in between by cubic Hermite
//! interpolation.

use crate::solver::Stats;

/// Why an integration ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The requested final time was reached
    Completed,
    /// Continuous condition `i` crossed zero
    Condition(usize),
    /// A discrete callback returned this code
    Discrete(usize),
    /// A step was rejected at the minimum step size
    StepSizeCollapsed,
    /// The step budget ran out
    MaxSteps,
}

/// Samples of an integrated trajectory with dense output.
///
/// Times are strictly monotonic, ascending for forward and descending for
/// backward integrations.
#[derive(Debug, Clone)]
pub struct OdeSolution {
    /// Sample times
    pub t: Vec<f64>,
    /// States at the sample times
    pub u: Vec<Vec<f64>>,
    /// Derivatives at the sample times
    pub dudt: Vec<Vec<f64>>,
    /// How the integration ended
    pub reason: StopReason,
    /// Solver statistics
    pub stats: Stats,
}

impl OdeSolution {
    pub(crate) fn start(t0: f64, y0: Vec<f64>, f0: Vec<f64>) -> Self {
        Self {
            t: vec![t0],
            u: vec![y0],
            dudt: vec![f0],
            reason: StopReason::Completed,
            stats: Stats::default(),
        }
    }

    pub(crate) fn push(&mut self, t: f64, y: Vec<f64>, f: Vec<f64>) {
        self.t.push(t);
        self.u.push(y);
        self.dudt.push(f);
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.t.len()
    }

    /// True if nothing was stored.
    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    /// Final time and state.
    pub fn last(&self) -> Option<(f64, &[f64])> {
        Some((*self.t.last()?, self.u.last()?.as_slice()))
    }

    /// Whether `t` lies between the first and last sample.
    pub fn covers(&self, t: f64) -> bool {
        match (self.t.first(), self.t.last()) {
            (Some(&a), Some(&b)) => t >= a.min(b) && t <= a.max(b),
            _ => false,
        }
    }

    /// State at `t`, or `None` outside the integrated span.
    pub fn interpolate(&self, t: f64) -> Option<Vec<f64>> {
        let dim = self.u.first()?.len();
        let mut out = vec![0.0; dim];
        if self.interpolate_into(t, &mut out) {
            Some(out)
        } else {
            None
        }
    }

    /// Write the state at `t` into `out`; false outside the integrated span.
    pub fn interpolate_into(&self, t: f64, out: &mut [f64]) -> bool {
        if !self.covers(t) {
            return false;
        }
        if self.len() == 1 {
            out.copy_from_slice(&self.u[0]);
            return true;
        }
        let direction = (self.t[self.len() - 1] - self.t[0]).signum();
        let upper = self
            .t
            .partition_point(|&ti| (ti - t) * direction < 0.0)
            .clamp(1, self.len() - 1);
        let lower = upper - 1;
        hermite(
            t,
            (self.t[lower], &self.u[lower], &self.dudt[lower]),
            (self.t[upper], &self.u[upper], &self.dudt[upper]),
            out,
        );
        true
    }
}

/// Cubic Hermite interpolation between two samples `(t, y, dy/dt)`.
///
/// Fourth-order accurate in the step size; exact at both ends.
pub(crate) fn hermite(
    t: f64,
    (t_a, y_a, f_a): (f64, &[f64], &[f64]),
    (t_b, y_b, f_b): (f64, &[f64], &[f64]),
    out: &mut [f64],
) {
    let dt = t_b - t_a;
    let s = (t - t_a) / dt;
    let s2 = s * s;
    let s3 = s2 * s;
    let h00 = 1.0 - 3.0 * s2 + 2.0 * s3;
    let h10 = (s - 2.0 * s2 + s3) * dt;
    let h01 = 3.0 * s2 - 2.0 * s3;
    let h11 = (s3 - s2) * dt;
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = h00 * y_a[i] + h10 * f_a[i] + h01 * y_b[i] + h11 * f_b[i];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cubic_samples(times: &[f64]) -> OdeSolution {
        // y = t³ - t, reproduced exactly by a cubic Hermite segment
        let mut sol = OdeSolution::start(
            times[0],
            vec![times[0].powi(3) - times[0]],
            vec![3.0 * times[0].powi(2) - 1.0],
        );
        for &t in &times[1..] {
            sol.push(t, vec![t.powi(3) - t], vec![3.0 * t * t - 1.0]);
        }
        sol
    }

    #[test]
    fn test_cubic_reproduced_ascending() {
        let sol = cubic_samples(&[0.0, 0.5, 1.2, 2.0]);
        for &t in &[0.0, 0.1, 0.5, 0.77, 1.9, 2.0] {
            let y = sol.interpolate(t).unwrap()[0];
            assert!((y - (t * t * t - t)).abs() < 1e-14, "t = {}: {}", t, y);
        }
    }

    #[test]
    fn test_cubic_reproduced_descending() {
        let sol = cubic_samples(&[0.0, -0.4, -1.0, -2.5]);
        for &t in &[0.0, -0.2, -0.4, -1.7, -2.5] {
            let y = sol.interpolate(t).unwrap()[0];
            assert!((y - (t * t * t - t)).abs() < 1e-13, "t = {}: {}", t, y);
        }
    }

    #[test]
    fn test_outside_span() {
        let sol = cubic_samples(&[0.0, 1.0]);
        assert!(sol.interpolate(-0.1).is_none());
        assert!(sol.interpolate(1.1).is_none());
        assert!(sol.covers(1.0));
    }

    #[test]
    fn test_single_sample() {
        let sol = cubic_samples(&[3.0]);
        assert_eq!(sol.interpolate(3.0), Some(vec![24.0]));
        assert_eq!(sol.last(), Some((3.0, &[24.0][..])));
    }
}
