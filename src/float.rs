//! Numeric bound shared by the series arithmetic, the state record and the
//! physics formulas.

use nalgebra::RealField;

/// Scalar type the PN machinery is generic over.
///
/// Anything implementing `nalgebra::RealField` qualifies: `f32`, `f64`, and
/// dual-number types used for forward-mode sensitivities.
pub trait PnFloat: RealField + Copy {}

impl<T: RealField + Copy> PnFloat for T {}

/// Convert an `f64` literal into the working type.
///
/// Every rational or irrational constant in a formula goes through here so
/// that it is never left at a different default precision.
#[inline]
pub fn lit<T: PnFloat>(x: f64) -> T {
    nalgebra::convert(x)
}

/// Euler–Mascheroni constant.
pub const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;
