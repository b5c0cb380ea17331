//! Runge-Kutta-Fehlberg 7(8) integrator
//!
//! A 13-stage embedded RK7(8) pair with adaptive step control, dense output,
//! root-found continuous callbacks and post-step discrete callbacks. State
//! dimensions are set at run time by the [`OdeSystem`].
//!
//! Reference: NASA TR R-287, Erwin Fehlberg, 1968

use crate::coefficients::{A, B, C, ERROR_MINUS, ERROR_PLUS, ERROR_WEIGHT, STAGES};
use crate::error::IntegrationError;
use crate::events::{
    sign_change_detected, AcceptedStep, BrentError, BrentSolver, ContinuousCallback,
    DiscreteCallback, NoCallbacks,
};
use crate::solution::{OdeSolution, StopReason};

/// System of ordinary differential equations: dy/dt = f(t, y)
pub trait OdeSystem {
    /// Length of the state vector.
    fn dim(&self) -> usize;

    /// Evaluate the right-hand side.
    ///
    /// Filling `dydt` with NaN marks `(t, y)` as outside the domain; the
    /// integrator rejects the trial step and retries with a smaller one.
    fn rhs(&self, t: f64, y: &[f64], dydt: &mut [f64]);
}

/// Outcome of a single trial step
#[derive(Debug, Clone)]
pub struct StepResult {
    /// State after the step (8th order solution)
    pub y: Vec<f64>,
    /// Time after the step
    pub t: f64,
    /// Signed step size actually attempted
    pub h: f64,
    /// Normalized error estimate (≤ 1 is accepted; infinite if anything was
    /// not finite)
    pub error: f64,
    /// Magnitude suggested for the next step
    pub h_next: f64,
    /// Whether the step was accepted
    pub accepted: bool,
}

/// Integration statistics for diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    /// Total number of function evaluations
    pub fn_evals: u64,
    /// Number of accepted steps
    pub accepted_steps: u64,
    /// Number of rejected steps
    pub rejected_steps: u64,
}

/// Step-size controller using an I-controller
///
/// h_new = safety * h * error^(-1/8)
#[derive(Debug, Clone)]
pub struct StepController {
    /// Safety factor (0.8-0.9 typical)
    pub safety: f64,
    /// Maximum growth factor per step
    pub max_factor: f64,
    /// Minimum reduction factor per step
    pub min_factor: f64,
    exponent: f64,
}

impl Default for StepController {
    fn default() -> Self {
        Self {
            safety: 0.9,
            max_factor: 5.0,
            min_factor: 0.2,
            exponent: 1.0 / 8.0,
        }
    }
}

impl StepController {
    /// Step size adjustment factor for a normalized error
    pub fn compute_factor(&self, error: f64) -> f64 {
        if error == 0.0 {
            return self.max_factor;
        }
        if !error.is_finite() {
            return self.min_factor;
        }
        (self.safety * error.powf(-self.exponent)).clamp(self.min_factor, self.max_factor)
    }
}

/// Tolerances for error control
///
/// Error is computed as: |y8 - y7| / (atol + rtol * |y8|)
#[derive(Debug, Clone, PartialEq)]
pub struct Tolerances {
    /// Absolute tolerance per component
    pub atol: Vec<f64>,
    /// Relative tolerance per component
    pub rtol: Vec<f64>,
}

impl Tolerances {
    /// The same tolerances for all `dim` components
    pub fn new(atol: f64, rtol: f64, dim: usize) -> Self {
        Self {
            atol: vec![atol; dim],
            rtol: vec![rtol; dim],
        }
    }

    /// Per-component tolerances
    pub fn with_components(atol: Vec<f64>, rtol: Vec<f64>) -> Self {
        Self { atol, rtol }
    }
}

/// Runge-Kutta-Fehlberg 7(8) integrator
///
/// # Example
/// ```
/// use postnewtonian::{OdeSystem, Rkf78, Tolerances};
///
/// struct HarmonicOscillator;
///
/// impl OdeSystem for HarmonicOscillator {
///     fn dim(&self) -> usize {
///         2
///     }
///     fn rhs(&self, _t: f64, y: &[f64], dydt: &mut [f64]) {
///         dydt[0] = y[1];
///         dydt[1] = -y[0];
///     }
/// }
///
/// let mut solver = Rkf78::new(Tolerances::new(1e-12, 1e-12, 2));
/// let sol = solver
///     .integrate(&HarmonicOscillator, 0.0, &[1.0, 0.0], 1.0, 0.1)
///     .unwrap();
/// let (_, y) = sol.last().unwrap();
/// assert!((y[0] - 1.0f64.cos()).abs() < 1e-10);
/// ```
#[derive(Debug, Clone)]
pub struct Rkf78 {
    tol: Tolerances,
    controller: StepController,
    /// Minimum step size; a step rejected at this size ends the integration
    pub h_min: f64,
    /// Maximum step size
    pub h_max: f64,
    /// Maximum number of step attempts
    pub max_steps: u64,
    /// Root finder for continuous callbacks
    pub event_solver: BrentSolver,
    /// Integration statistics
    pub stats: Stats,
    k: Vec<Vec<f64>>,
    y_stage: Vec<f64>,
}

impl Rkf78 {
    /// Create a new RKF78 solver with specified tolerances
    pub fn new(tol: Tolerances) -> Self {
        Self {
            tol,
            controller: StepController::default(),
            h_min: 1e-14,
            h_max: f64::INFINITY,
            max_steps: 10_000_000,
            event_solver: BrentSolver::new(0.0, 60),
            stats: Stats::default(),
            k: Vec::new(),
            y_stage: Vec::new(),
        }
    }

    /// Set minimum and maximum step sizes
    pub fn set_step_limits(&mut self, h_min: f64, h_max: f64) {
        self.h_min = h_min;
        self.h_max = h_max;
    }

    /// Replace the step-size controller
    pub fn set_controller(&mut self, controller: StepController) {
        self.controller = controller;
    }

    /// Reset statistics
    pub fn reset_stats(&mut self) {
        self.stats = Stats::default();
    }

    fn ensure_workspace(&mut self, dim: usize) {
        if self.y_stage.len() != dim {
            self.k = vec![vec![0.0; dim]; STAGES];
            self.y_stage = vec![0.0; dim];
        }
    }

    /// Attempt one step of size `h` from `(t, y)` where `f0 = f(t, y)`.
    pub fn step<S: OdeSystem>(
        &mut self,
        sys: &S,
        t: f64,
        y: &[f64],
        f0: &[f64],
        h: f64,
    ) -> StepResult {
        self.ensure_workspace(y.len());
        let h = h.signum() * h.abs().clamp(self.h_min, self.h_max);

        self.compute_stages(sys, t, y, f0, h);
        let y8 = self.compute_solution(y, h);
        let error = self.compute_error(&y8, h);
        let accepted = error <= 1.0;
        let h_next = (h.abs() * self.controller.compute_factor(error)).clamp(self.h_min, self.h_max);

        if accepted {
            self.stats.accepted_steps += 1;
        } else {
            self.stats.rejected_steps += 1;
        }

        StepResult {
            y: y8,
            t: t + h,
            h,
            error,
            h_next,
            accepted,
        }
    }

    /// The 8th-order solution of a step of exactly `h`, with no error control.
    fn advance<S: OdeSystem>(&mut self, sys: &S, t: f64, y: &[f64], f0: &[f64], h: f64) -> Vec<f64> {
        self.compute_stages(sys, t, y, f0, h);
        self.compute_solution(y, h)
    }

    /// Integrate from `t0` to `tf` with no callbacks.
    pub fn integrate<S: OdeSystem>(
        &mut self,
        sys: &S,
        t0: f64,
        y0: &[f64],
        tf: f64,
        h0: f64,
    ) -> Result<OdeSolution, IntegrationError> {
        self.solve(sys, t0, y0, tf, h0, &NoCallbacks, &mut NoCallbacks)
    }

    /// Integrate from `t0` towards `tf`, storing every accepted step.
    ///
    /// The integration ends early when a continuous condition crosses zero
    /// (the final sample sits on the crossing), when a discrete callback asks
    /// to stop, when a step is rejected at `h_min`, or when `max_steps`
    /// attempts have been made. The reason is recorded on the solution.
    /// Only invalid inputs are errors.
    #[allow(clippy::too_many_arguments)]
    pub fn solve<S, Cc, Dc>(
        &mut self,
        sys: &S,
        t0: f64,
        y0: &[f64],
        tf: f64,
        h0: f64,
        continuous: &Cc,
        discrete: &mut Dc,
    ) -> Result<OdeSolution, IntegrationError>
    where
        S: OdeSystem,
        Cc: ContinuousCallback,
        Dc: DiscreteCallback,
    {
        let dim = sys.dim();
        self.validate_inputs(dim, t0, y0, tf, h0)?;
        self.ensure_workspace(dim);
        self.reset_stats();

        let mut f = vec![0.0; dim];
        sys.rhs(t0, y0, &mut f);
        self.stats.fn_evals += 1;
        let mut sol = OdeSolution::start(t0, y0.to_vec(), f.clone());
        if t0 == tf {
            sol.stats = self.stats.clone();
            return Ok(sol);
        }

        let direction = (tf - t0).signum();
        let mut t = t0;
        let mut y = y0.to_vec();
        let mut h = h0;
        let mut g_prev = vec![0.0; continuous.len()];
        let mut g_new = vec![0.0; continuous.len()];
        continuous.eval(t, &y, &mut g_prev);
        let mut attempts = 0u64;

        let reason = loop {
            if (tf - t) * direction <= self.h_min {
                break StopReason::Completed;
            }
            if attempts >= self.max_steps {
                break StopReason::MaxSteps;
            }
            attempts += 1;

            // Don't overshoot the endpoint
            if (t + h - tf) * direction > 0.0 {
                h = tf - t;
            }

            let mut result = self.step(sys, t, &y, &f, h);
            if result.h == tf - t {
                result.t = tf;
            }
            if !result.accepted {
                if result.h.abs() <= self.h_min {
                    break StopReason::StepSizeCollapsed;
                }
                h = result.h_next * direction;
                continue;
            }

            let mut f_new = vec![0.0; dim];
            sys.rhs(result.t, &result.y, &mut f_new);
            self.stats.fn_evals += 1;

            if !continuous.is_empty() {
                continuous.eval(result.t, &result.y, &mut g_new);
                if let Some((index, t_event)) =
                    self.locate_event(sys, continuous, t, &y, &f, result.t, &g_prev, &g_new)
                {
                    let y_event = if t_event == result.t {
                        result.y.clone()
                    } else {
                        self.advance(sys, t, &y, &f, t_event - t)
                    };
                    let mut f_event = vec![0.0; dim];
                    sys.rhs(t_event, &y_event, &mut f_event);
                    self.stats.fn_evals += 1;
                    sol.push(t_event, y_event, f_event);
                    break StopReason::Condition(index);
                }
                std::mem::swap(&mut g_prev, &mut g_new);
            }

            sol.push(result.t, result.y.clone(), f_new.clone());
            let stop = discrete.check(&AcceptedStep {
                t_prev: t,
                y_prev: &y,
                t: result.t,
                y: &result.y,
                h_next: result.h_next,
            });
            t = result.t;
            y = result.y;
            f = f_new;
            if let Some(code) = stop {
                break StopReason::Discrete(code);
            }
            h = result.h_next * direction;
        };

        sol.reason = reason;
        sol.stats = self.stats.clone();
        Ok(sol)
    }

    /// Earliest crossing among the conditions that changed sign over the step
    /// `t_a → t_b`, as `(index, time)`.
    ///
    /// Each crossing is found by Brent's method on `g_i(y(τ))`, where `y(τ)`
    /// re-takes the step with the shorter length `τ - t_a`, so the stopping
    /// state carries the full order of the method.
    #[allow(clippy::too_many_arguments)]
    fn locate_event<S, Cc>(
        &mut self,
        sys: &S,
        continuous: &Cc,
        t_a: f64,
        y_a: &[f64],
        f_a: &[f64],
        t_b: f64,
        g_a: &[f64],
        g_b: &[f64],
    ) -> Option<(usize, f64)>
    where
        S: OdeSystem,
        Cc: ContinuousCallback,
    {
        let direction = (t_b - t_a).signum();
        let mut earliest: Option<(usize, f64)> = None;
        let mut g = vec![0.0; continuous.len()];
        let solver = BrentSolver {
            tol: self
                .event_solver
                .tol
                .max(4.0 * f64::EPSILON * t_a.abs().max(t_b.abs())),
            ..self.event_solver
        };

        for i in 0..continuous.len() {
            if !sign_change_detected(g_a[i], g_b[i], continuous.direction()) {
                continue;
            }
            let t_root = if g_b[i] == 0.0 {
                t_b
            } else {
                let root = solver.find_root(
                    |tau| {
                        let y_tau = self.advance(sys, t_a, y_a, f_a, tau - t_a);
                        continuous.eval(tau, &y_tau, &mut g);
                        g[i]
                    },
                    t_a,
                    t_b,
                    Some(g_a[i]),
                    Some(g_b[i]),
                );
                match root {
                    Ok(root) => root.x,
                    Err(BrentError::MaxIterations { best, .. }) => best.x,
                    Err(BrentError::NotBracketed { .. }) => t_b,
                }
            };
            let is_earlier = earliest.map_or(true, |(_, t_best)| (t_root - t_best) * direction < 0.0);
            if is_earlier {
                earliest = Some((i, t_root));
            }
        }
        earliest
    }

    #[allow(clippy::needless_range_loop)]
    fn compute_stages<S: OdeSystem>(&mut self, sys: &S, t: f64, y: &[f64], f0: &[f64], h: f64) {
        self.k[0].copy_from_slice(f0);
        for i in 1..STAGES {
            for n in 0..y.len() {
                let mut sum = 0.0;
                for (j, &a) in A[i].iter().enumerate() {
                    sum += a * self.k[j][n];
                }
                self.y_stage[n] = y[n] + h * sum;
            }
            sys.rhs(t + C[i] * h, &self.y_stage, &mut self.k[i]);
        }
        self.stats.fn_evals += (STAGES - 1) as u64;
    }

    fn compute_solution(&self, y: &[f64], h: f64) -> Vec<f64> {
        y.iter()
            .enumerate()
            .map(|(n, &yn)| {
                let sum: f64 = B.iter().zip(&self.k).map(|(b, k)| b * k[n]).sum();
                yn + h * sum
            })
            .collect()
    }

    /// Infinity norm of the scaled error; infinite when anything is not finite.
    fn compute_error(&self, y8: &[f64], h: f64) -> f64 {
        let mut max_err: f64 = 0.0;
        for (n, &yn) in y8.iter().enumerate() {
            let plus: f64 = ERROR_PLUS.iter().map(|&i| self.k[i][n]).sum();
            let minus: f64 = ERROR_MINUS.iter().map(|&i| self.k[i][n]).sum();
            let err_n = h * ERROR_WEIGHT * (plus - minus);
            if !err_n.is_finite() || !yn.is_finite() {
                return f64::INFINITY;
            }
            let scale = self.tol.atol[n] + self.tol.rtol[n] * yn.abs();
            max_err = max_err.max(err_n.abs() / scale);
        }
        max_err
    }

    fn validate_inputs(
        &self,
        dim: usize,
        t0: f64,
        y0: &[f64],
        tf: f64,
        h0: f64,
    ) -> Result<(), IntegrationError> {
        let invalid = |message: String| Err(IntegrationError::InvalidInput { message });
        if y0.len() != dim {
            return invalid(format!("y0 has {} components, system has {}", y0.len(), dim));
        }
        if self.tol.atol.len() != dim || self.tol.rtol.len() != dim {
            return invalid(format!(
                "tolerances have {}/{} components, system has {}",
                self.tol.atol.len(),
                self.tol.rtol.len(),
                dim
            ));
        }
        if !t0.is_finite() || !tf.is_finite() || !h0.is_finite() {
            return invalid("t0, tf, and h0 must be finite".to_string());
        }
        if h0 == 0.0 {
            return invalid("h0 must be non-zero".to_string());
        }
        if tf != t0 && h0.signum() != (tf - t0).signum() {
            return invalid("h0 sign must match integration direction (tf - t0)".to_string());
        }
        if !(self.h_min > 0.0) || self.h_max < self.h_min {
            return invalid(format!(
                "step limits must satisfy 0 < h_min <= h_max, got [{}, {}]",
                self.h_min, self.h_max
            ));
        }
        if let Some(i) = y0.iter().position(|v| !v.is_finite()) {
            return invalid(format!("y0[{}] is not finite", i));
        }
        for (i, (&a, &r)) in self.tol.atol.iter().zip(&self.tol.rtol).enumerate() {
            if !a.is_finite() || a <= 0.0 {
                return invalid(format!("atol[{}] must be positive and finite", i));
            }
            if !r.is_finite() || r < 0.0 {
                return invalid(format!("rtol[{}] must be non-negative and finite", i));
            }
        }
        Ok(())
    }
}
