//! Callbacks that stop an integration.
//!
//! Two kinds are supported:
//!
//! - **Continuous** callbacks expose a vector of conditions `g_i(t, y)`. After
//!   every accepted step the integrator looks for sign changes, locates each
//!   crossing with Brent's method on shortened re-takes of that step, and
//!   stops at the earliest one.
//! - **Discrete** callbacks inspect each accepted step as a whole and may
//!   stop the integration there, with no root finding.

use thiserror::Error;

/// Vector of conditions whose zero crossings end the integration.
pub trait ContinuousCallback {
    /// Number of conditions.
    fn len(&self) -> usize;

    /// Whether there are no conditions at all.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evaluate every condition at `(t, y)` into `out`.
    fn eval(&self, t: f64, y: &[f64], out: &mut [f64]);

    /// Crossing direction that counts, shared by all conditions.
    fn direction(&self) -> EventDirection {
        EventDirection::Any
    }
}

/// An accepted step, as seen by a [`DiscreteCallback`].
#[derive(Debug, Clone, Copy)]
pub struct AcceptedStep<'a> {
    /// Time at the start of the step
    pub t_prev: f64,
    /// State at the start of the step
    pub y_prev: &'a [f64],
    /// Time at the end of the step
    pub t: f64,
    /// State at the end of the step
    pub y: &'a [f64],
    /// Magnitude of the step size proposed for the next step
    pub h_next: f64,
}

/// Post-step check returning a stop code.
pub trait DiscreteCallback {
    /// `Some(code)` stops the integration after this step.
    fn check(&mut self, step: &AcceptedStep<'_>) -> Option<usize>;
}

/// No conditions at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCallbacks;

impl ContinuousCallback for NoCallbacks {
    fn len(&self) -> usize {
        0
    }

    fn eval(&self, _t: f64, _y: &[f64], _out: &mut [f64]) {}
}

impl DiscreteCallback for NoCallbacks {
    fn check(&mut self, _step: &AcceptedStep<'_>) -> Option<usize> {
        None
    }
}

/// Direction of zero-crossing to detect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventDirection {
    /// `g` goes from negative to positive
    Rising,
    /// `g` goes from positive to negative
    Falling,
    /// Either way
    #[default]
    Any,
}

/// A located root.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Root {
    /// Abscissa of the root
    pub x: f64,
    /// Function value there
    pub fx: f64,
    /// Iterations used
    pub iterations: usize,
}

/// Errors from Brent's method
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BrentError {
    /// `f(a)` and `f(b)` have the same sign.
    #[error("root not bracketed: f({a}) = {fa}, f({b}) = {fb}")]
    NotBracketed {
        /// Left endpoint
        a: f64,
        /// Right endpoint
        b: f64,
        /// Value at `a`
        fa: f64,
        /// Value at `b`
        fb: f64,
    },
    /// The iteration budget ran out; the best estimate is kept.
    #[error("no convergence after {iterations} iterations; best estimate {best}")]
    MaxIterations {
        /// Best estimate so far
        best: Root,
        /// Iterations performed
        iterations: usize,
    },
}

/// Brent's bracketing root finder (bisection, secant and inverse quadratic
/// interpolation).
///
/// Brent, R.P. (1973). "Algorithms for Minimization without Derivatives".
#[derive(Debug, Clone, Copy)]
pub struct BrentSolver {
    /// Bracket width at which to stop
    pub tol: f64,
    /// Iteration budget
    pub max_iter: usize,
}

impl Default for BrentSolver {
    fn default() -> Self {
        Self {
            tol: 1e-12,
            max_iter: 50,
        }
    }
}

impl BrentSolver {
    /// Solver with the given tolerance and budget.
    pub fn new(tol: f64, max_iter: usize) -> Self {
        Self { tol, max_iter }
    }

    /// Root of `f` in `[a, b]`; `fa`/`fb` may be supplied to skip evaluations.
    pub fn find_root<F>(
        &self,
        mut f: F,
        a: f64,
        b: f64,
        fa: Option<f64>,
        fb: Option<f64>,
    ) -> Result<Root, BrentError>
    where
        F: FnMut(f64) -> f64,
    {
        let (mut a, mut b) = (a, b);
        let mut fa = fa.unwrap_or_else(|| f(a));
        let mut fb = fb.unwrap_or_else(|| f(b));
        if fa * fb > 0.0 {
            return Err(BrentError::NotBracketed { a, b, fa, fb });
        }
        if fa.abs() < fb.abs() {
            std::mem::swap(&mut a, &mut b);
            std::mem::swap(&mut fa, &mut fb);
        }

        let mut c = a;
        let mut fc = fa;
        let mut d = b - a;
        let mut bisected = true;

        for iter in 0..self.max_iter {
            // b is always the best estimate
            if fa.abs() < fb.abs() {
                std::mem::swap(&mut a, &mut b);
                std::mem::swap(&mut fa, &mut fb);
            }
            if fb == 0.0 || (b - a).abs() <= self.tol {
                return Ok(Root {
                    x: b,
                    fx: fb,
                    iterations: iter + 1,
                });
            }

            let candidate = if fa != fc && fb != fc && fa != fb {
                a * fb * fc / ((fa - fb) * (fa - fc))
                    + b * fa * fc / ((fb - fa) * (fb - fc))
                    + c * fa * fb / ((fc - fa) * (fc - fb))
            } else if fa != fb {
                b - fb * (b - a) / (fb - fa)
            } else {
                0.5 * (a + b)
            };

            let last = if bisected { (b - c).abs() } else { (c - d).abs() };
            let outside = (candidate - 0.25 * (3.0 * a + b)) * (candidate - b) > 0.0;
            let slow = (candidate - b).abs() >= 0.5 * last;
            let tiny = last < self.tol;
            let s = if outside || slow || tiny {
                bisected = true;
                0.5 * (a + b)
            } else {
                bisected = false;
                candidate
            };

            let fs = f(s);
            d = c;
            c = b;
            fc = fb;
            if fa * fs < 0.0 {
                b = s;
                fb = fs;
            } else {
                a = s;
                fa = fs;
            }
        }

        Err(BrentError::MaxIterations {
            best: Root {
                x: b,
                fx: fb,
                iterations: self.max_iter,
            },
            iterations: self.max_iter,
        })
    }
}

impl std::fmt::Display for Root {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (f = {})", self.x, self.fx)
    }
}

/// Whether `g_old → g_new` is a crossing in `direction`.
///
/// Landing exactly on zero counts; leaving zero does not, so a condition that
/// starts at zero is not re-detected. NaN never counts.
pub fn sign_change_detected(g_old: f64, g_new: f64, direction: EventDirection) -> bool {
    if g_old.is_nan() || g_new.is_nan() || g_old * g_new > 0.0 || g_old == 0.0 {
        return false;
    }
    if g_new == 0.0 {
        return true;
    }
    match direction {
        EventDirection::Rising => g_old < 0.0,
        EventDirection::Falling => g_old > 0.0,
        EventDirection::Any => true,
    }
}
