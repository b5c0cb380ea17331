//! Stopping criteria for orbital evolutions.
//!
//! Root-found conditions stop exactly on their zero crossing:
//!
//! | index | condition | crosses zero when |
//! |---|---|---|
//! | 0, 1 | `M₁`, `M₂` | a mass reaches zero |
//! | 2, 3 | `1 - |χ₁|²`, `1 - |χ₂|²` | a spin becomes extremal |
//! | 4 | `vₑ - v` (forward) or `v - v₁` (backward) | the target `v` is reached |
//!
//! All of them are positive inside the physical region and fall through
//! zero, so only falling crossings count.
//!
//! Post-step checks stop after the step on which they fire: a step size
//! pinned at the floor, a decreasing `v` during forward evolution, and any
//! non-finite time, state or step size.

use std::fmt;

use crate::events::{AcceptedStep, ContinuousCallback, DiscreteCallback, EventDirection};
use crate::solution::StopReason;
use crate::state::{index, SystemKind};

/// Above this `v` a decreasing `v` is a sign that the PN equations broke down;
/// below it, strongly precessing systems can legitimately slow down for a while.
pub const DECREASING_V_WARNING_THRESHOLD: f64 = 0.5;

const MASS_CONDITIONS: usize = 2;
const SPIN_CONDITIONS: usize = 2;

const STEP_COLLAPSED: usize = 0;
const DECREASING_V: usize = 1;
const NON_FINITE: usize = 2;

/// Smallest step size either direction is allowed to take, `√ε`.
pub fn minimum_step() -> f64 {
    f64::EPSILON.sqrt()
}

/// Time direction of an integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `t` increasing from the initial condition
    Forward,
    /// `t` decreasing from the initial condition
    Backward,
}

impl Direction {
    /// Lower-case name used in log messages.
    pub fn name(self) -> &'static str {
        match self {
            Direction::Forward => "forwards",
            Direction::Backward => "backwards",
        }
    }
}

/// Why an evolution stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The estimated time span ran out before any criterion fired
    TimeSpanExhausted,
    /// `v` reached its target
    TargetVelocity,
    /// A mass reached zero
    NonPositiveMass {
        /// 1 or 2
        body: u8,
    },
    /// A spin reached magnitude 1
    SuperExtremalSpin {
        /// 1 or 2
        body: u8,
    },
    /// The step size fell to the floor
    StepSizeCollapsed,
    /// `v` decreased during forward evolution
    DecreasingVelocity,
    /// A non-finite time, state or step size appeared
    NonFinite,
    /// The integrator's step budget ran out
    MaxSteps,
}

impl Termination {
    /// Whether this is a normal way to stop rather than a breakdown.
    pub fn is_expected(self) -> bool {
        matches!(self, Termination::TargetVelocity | Termination::TimeSpanExhausted)
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::TimeSpanExhausted => write!(f, "estimated time span exhausted"),
            Termination::TargetVelocity => write!(f, "target v reached"),
            Termination::NonPositiveMass { body } => write!(f, "M{} became non-positive", body),
            Termination::SuperExtremalSpin { body } => {
                write!(f, "chi{} became super-extremal", body)
            }
            Termination::StepSizeCollapsed => write!(f, "step size collapsed"),
            Termination::DecreasingVelocity => write!(f, "v decreased"),
            Termination::NonFinite => write!(f, "non-finite values"),
            Termination::MaxSteps => write!(f, "step budget exhausted"),
        }
    }
}

/// Which criteria apply to one direction of an evolution.
///
/// ```
/// use postnewtonian::termination::TerminationCriteria;
///
/// let criteria = TerminationCriteria {
///     check_decreasing_v: false,
///     ..TerminationCriteria::forward(0.4)
/// };
/// assert_eq!(criteria.target_v, Some(0.4));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TerminationCriteria {
    /// Stop when `v` reaches this value
    pub target_v: Option<f64>,
    /// Stop when a mass reaches zero or a spin reaches magnitude 1
    pub check_physical_bounds: bool,
    /// Stop once the proposed step size is at or below this
    pub min_step: f64,
    /// Stop when `v` decreases (forward evolution only)
    pub check_decreasing_v: bool,
    /// Stop on non-finite time, state or step size
    pub check_non_finite: bool,
}

impl TerminationCriteria {
    /// Default set for forward evolution towards `v_e`.
    pub fn forward(v_e: f64) -> Self {
        Self {
            target_v: Some(v_e),
            check_physical_bounds: true,
            min_step: minimum_step(),
            check_decreasing_v: true,
            check_non_finite: true,
        }
    }

    /// Default set for backward evolution down to `v_1`.
    pub fn backward(v_1: f64) -> Self {
        Self {
            target_v: Some(v_1),
            check_decreasing_v: false,
            ..Self::forward(v_1)
        }
    }

    /// The root-found conditions for integrating in `direction`.
    pub fn conditions(&self, kind: SystemKind, direction: Direction) -> Conditions {
        Conditions {
            kind,
            direction,
            physical_bounds: self.check_physical_bounds,
            target_v: self.target_v,
        }
    }

    /// The post-step checks for integrating in `direction`.
    pub fn step_checks(&self, direction: Direction, quiet: bool) -> StepChecks {
        StepChecks {
            direction,
            min_step: self.min_step,
            decreasing_v: self.check_decreasing_v && direction == Direction::Forward,
            non_finite: self.check_non_finite,
            quiet,
            warnings: Vec::new(),
        }
    }
}

/// Root-found conditions, positive while the evolution may continue.
#[derive(Debug, Clone, Copy)]
pub struct Conditions {
    kind: SystemKind,
    direction: Direction,
    physical_bounds: bool,
    target_v: Option<f64>,
}

impl Conditions {
    /// What it means for condition `i` to have crossed zero.
    pub fn termination(&self, i: usize) -> Termination {
        let bounds = if self.physical_bounds {
            MASS_CONDITIONS + SPIN_CONDITIONS
        } else {
            0
        };
        if i >= bounds {
            return Termination::TargetVelocity;
        }
        if i < MASS_CONDITIONS {
            Termination::NonPositiveMass { body: i as u8 + 1 }
        } else {
            Termination::SuperExtremalSpin {
                body: (i - MASS_CONDITIONS) as u8 + 1,
            }
        }
    }
}

impl ContinuousCallback for Conditions {
    fn len(&self) -> usize {
        let bounds = if self.physical_bounds {
            MASS_CONDITIONS + SPIN_CONDITIONS
        } else {
            0
        };
        bounds + usize::from(self.target_v.is_some())
    }

    fn eval(&self, _t: f64, y: &[f64], out: &mut [f64]) {
        debug_assert_eq!(y.len(), self.kind.len());
        let mut slot = 0;
        if self.physical_bounds {
            let spin_norm_squared =
                |start: usize| y[start..start + 3].iter().map(|c| c * c).sum::<f64>();
            out[0] = y[index::M1];
            out[1] = y[index::M2];
            out[2] = 1.0 - spin_norm_squared(index::CHI1);
            out[3] = 1.0 - spin_norm_squared(index::CHI2);
            slot = MASS_CONDITIONS + SPIN_CONDITIONS;
        }
        if let Some(target) = self.target_v {
            let v = y[index::V];
            out[slot] = match self.direction {
                Direction::Forward => target - v,
                Direction::Backward => v - target,
            };
        }
    }

    fn direction(&self) -> EventDirection {
        EventDirection::Falling
    }
}

/// Post-step checks; collects the warnings they emit.
#[derive(Debug, Clone)]
pub struct StepChecks {
    direction: Direction,
    min_step: f64,
    decreasing_v: bool,
    non_finite: bool,
    quiet: bool,
    warnings: Vec<String>,
}

impl StepChecks {
    /// Meaning of a stop code returned by [`DiscreteCallback::check`].
    pub fn termination(code: usize) -> Termination {
        match code {
            STEP_COLLAPSED => Termination::StepSizeCollapsed,
            DECREASING_V => Termination::DecreasingVelocity,
            _ => Termination::NonFinite,
        }
    }

    /// Warnings emitted so far.
    pub fn into_warnings(self) -> Vec<String> {
        self.warnings
    }

    fn warn(&mut self, message: String) {
        log::warn!("{}", message);
        self.warnings.push(message);
    }
}

impl DiscreteCallback for StepChecks {
    fn check(&mut self, step: &AcceptedStep<'_>) -> Option<usize> {
        let direction = self.direction.name();
        if self.non_finite
            && !(step.t.is_finite()
                && step.h_next.is_finite()
                && step.y.iter().all(|y| y.is_finite()))
        {
            self.warn(format!(
                "Terminating {} evolution because a non-finite number appeared at t = {}, \
                 with step size {}; this is most likely a breakdown of the PN equations",
                direction, step.t, step.h_next
            ));
            return Some(NON_FINITE);
        }

        let v = step.y[index::V];
        if step.h_next <= self.min_step {
            self.warn(format!(
                "Terminating {} evolution because the step size dropped to {:e} at t = {} \
                 (v = {}); the PN equations are probably breaking down",
                direction, step.h_next, step.t, v
            ));
            return Some(STEP_COLLAPSED);
        }

        let v_prev = step.y_prev[index::V];
        if self.decreasing_v && v < v_prev {
            let message = format!(
                "Terminating {} evolution because v is decreasing: v went from {} to {} \
                 at t = {}",
                direction, v_prev, v, step.t
            );
            if v > DECREASING_V_WARNING_THRESHOLD {
                self.warn(format!(
                    "{}; above v = {} this signals a breakdown of the PN equations",
                    message, DECREASING_V_WARNING_THRESHOLD
                ));
            } else if !self.quiet {
                log::info!("{}", message);
            }
            return Some(DECREASING_V);
        }
        None
    }
}

/// Map how the integrator stopped onto a [`Termination`].
pub fn classify(reason: StopReason, conditions: &Conditions) -> Termination {
    match reason {
        StopReason::Completed => Termination::TimeSpanExhausted,
        StopReason::Condition(i) => conditions.termination(i),
        StopReason::Discrete(code) => StepChecks::termination(code),
        StopReason::StepSizeCollapsed => Termination::StepSizeCollapsed,
        StopReason::MaxSteps => Termination::MaxSteps,
    }
}

/// Log the outcome of a root-found or integrator-level stop.
///
/// Post-step checks log their own messages when they fire, so they are
/// skipped here. Expected stops are informational and silenced by `quiet`;
/// everything else is a warning, returned so it can be recorded.
pub fn report(
    termination: Termination,
    reason: StopReason,
    direction: Direction,
    t: f64,
    v: f64,
    quiet: bool,
) -> Option<String> {
    if matches!(reason, StopReason::Discrete(_)) {
        return None;
    }
    let name = direction.name();
    if termination.is_expected() {
        if !quiet {
            log::info!(
                "Terminating {} evolution at t = {} with v = {}: {}",
                name,
                t,
                v,
                termination
            );
        }
        return None;
    }
    let message = match termination {
        Termination::NonPositiveMass { body } => format!(
            "Terminating {} evolution because M{} became non-positive at t = {} (v = {}); \
             this suggests a breakdown of the tidal-heating equations",
            name, body, t, v
        ),
        Termination::SuperExtremalSpin { body } => format!(
            "Terminating {} evolution because chi{} became super-extremal at t = {} (v = {}); \
             this suggests a breakdown of the tidal-heating equations",
            name, body, t, v
        ),
        other => format!(
            "Terminating {} evolution at t = {} (v = {}): {}",
            name, t, v, other
        ),
    };
    log::warn!("{}", message);
    Some(message)
}
