//! Error types for every layer of the crate.
//!
//! Configuration problems surface as errors immediately. Physical breakdown
//! during integration does not: it ends the solve and is reported through
//! [`Termination`](crate::termination::Termination) on the returned trajectory.

use thiserror::Error;

/// Misuse of truncated PN series.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SeriesError {
    /// Two expansions (or terms) declared different maximum orders.
    #[error("cannot combine PN series with maximum orders {left} and {right}")]
    MaxOrderMismatch {
        /// Maximum order of the left operand
        left: usize,
        /// Maximum order of the right operand
        right: usize,
    },
    /// A term with a negative power of `1/c` cannot live in a `PNExpansion`.
    #[error("cannot add a PN term with negative exponent {exponent} to a PN expansion")]
    NegativeExponent {
        /// The offending exponent
        exponent: i32,
    },
}

/// Problems building or addressing a [`PNSystem`](crate::state::PNSystem).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StateError {
    /// A packed state vector had the wrong number of components.
    #[error("{kind} state vector needs {expected} components, found {found}")]
    WrongLength {
        /// Name of the system variant
        kind: &'static str,
        /// Components the variant holds
        expected: usize,
        /// Components supplied
        found: usize,
    },
    /// A field name that the variant does not define.
    #[error("unknown field `{name}` for {kind}; valid names are: {valid}")]
    UnknownField {
        /// Requested name
        name: String,
        /// Name of the system variant
        kind: &'static str,
        /// Comma-separated list of valid names
        valid: String,
    },
    /// A sample index past the end of a trajectory.
    #[error("sample index {index} is out of range for a trajectory of {len} samples")]
    SampleOutOfRange {
        /// Requested index
        index: usize,
        /// Number of samples
        len: usize,
    },
    /// A PN order that is negative or not a number.
    #[error("PN order must be a non-negative number, got {value}")]
    InvalidPnOrder {
        /// The offending value
        value: f64,
    },
}

/// Errors from the RKF7(8) integrator that prevent a solve from starting.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum IntegrationError {
    /// Invalid input parameters
    #[error("invalid integrator input: {message}")]
    InvalidInput {
        /// Description of the invalid input
        message: String,
    },
}

/// Errors from [`orbital_evolution`](crate::evolution::orbital_evolution).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvolutionError {
    /// A mass was zero or negative.
    #[error("mass M{body} = {mass} must be strictly positive")]
    NonPositiveMass {
        /// 1 or 2
        body: u8,
        /// The supplied mass
        mass: f64,
    },
    /// A dimensionless spin with magnitude above 1.
    #[error("unphysical spin: |chi{body}|^2 = {magnitude_squared} exceeds 1")]
    UnphysicalSpin {
        /// 1 or 2
        body: u8,
        /// The supplied squared magnitude
        magnitude_squared: f64,
    },
    /// Only body 1 carries tidal deformability.
    #[error(
        "Lambda1 = {lambda1} is nonzero while Lambda2 is zero; swap the bodies so the \
         neutron star is body 2, or give both bodies a tidal parameter"
    )]
    TidalOnFirstBodyOnly {
        /// The supplied Λ₁
        lambda1: f64,
    },
    /// A negative tidal deformability.
    #[error("Lambda{body} = {value} must be non-negative")]
    NegativeTidalParameter {
        /// 1 or 2
        body: u8,
        /// The supplied value
        value: f64,
    },
    /// The frequencies are not ordered `0 < Ω₁ ≤ Ωᵢ ≤ Ωₑ`.
    #[error("frequency ordering violated: {message}")]
    FrequencyOrdering {
        /// Which inequality failed, with the values
        message: String,
    },
    /// `samples_per_orbit` was combined with an explicit sampling grid.
    #[error("`samples_per_orbit` cannot be combined with an explicit `saveat` grid")]
    ConflictingSampling,
    /// A sampling request that cannot produce samples.
    #[error("invalid sampling request: {message}")]
    InvalidSampling {
        /// What was wrong, with the value
        message: String,
    },
    /// An approximant name that is not implemented.
    #[error("unsupported approximant `{name}`; supported approximants are: {supported}")]
    UnsupportedApproximant {
        /// The requested name
        name: String,
        /// Comma-separated list of supported names
        supported: String,
    },
    /// The PN equations are already singular at the user's initial condition.
    #[error(
        "non-finite {what} at the initial condition (v = {v}); the chosen PN order and \
         approximant break down before integration can start"
    )]
    NonFiniteInitialCondition {
        /// "state" or "derivative"
        what: &'static str,
        /// Initial PN velocity parameter
        v: f64,
    },
    /// State construction or addressing failed.
    #[error(transparent)]
    State(#[from] StateError),
    /// The integrator rejected its inputs.
    #[error(transparent)]
    Integration(#[from] IntegrationError),
}
