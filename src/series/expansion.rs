//! `PNExpansion` and `PNTerm`: polynomials in `1/c` with a declared maximum
//! order.
//!
//! The k-th coefficient multiplies `(1/c)^k`; with `c = 1` and the powers of
//! `v` folded into the coefficients, summing the coefficients evaluates the
//! series. Combining two series with different maximum orders is always an
//! error.

use std::ops::Mul;

use crate::error::SeriesError;
use crate::float::PnFloat;
use crate::pn_order::{order_index, truncation_length, PNOrder};
use crate::series::{horner, series_ratio, series_ratio_expansion, truncated_product};

/// A truncated series in `1/c`.
#[derive(Debug, Clone, PartialEq)]
pub struct PNExpansion<T> {
    coeffs: Vec<T>,
    max_order: usize,
}

impl<T: PnFloat> PNExpansion<T> {
    /// Build from ascending coefficients; anything past `max_order` is dropped.
    pub fn new(mut coeffs: Vec<T>, max_order: usize) -> Self {
        coeffs.truncate(max_order.saturating_add(1));
        Self { coeffs, max_order }
    }

    /// Build from the known terms of a PN series at the declared `order`.
    ///
    /// `coeffs[k]` is the term `∝ v^k` relative to the series' own leading
    /// power. When that leading power sits `offset` powers of `v` above the
    /// equation it is added into, the series loses `offset` terms to
    /// truncation and is shifted up by `offset`, so the result is indexed like
    /// the host equation.
    pub fn from_pn_series(coeffs: &[T], order: PNOrder, offset: usize) -> Self {
        let keep = truncation_length(order, coeffs.len(), offset);
        let mut shifted = Vec::with_capacity(offset + keep);
        if keep > 0 {
            shifted.resize(offset, T::zero());
            shifted.extend_from_slice(&coeffs[..keep]);
        }
        Self::new(shifted, order_index(order) - 1)
    }

    /// Ascending coefficients actually stored.
    pub fn coefficients(&self) -> &[T] {
        &self.coeffs
    }

    /// Declared maximum power of `1/c`.
    pub fn max_order(&self) -> usize {
        self.max_order
    }

    /// Number of stored coefficients.
    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    /// True when no coefficient survived truncation.
    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// Value of the series at `c = 1`.
    pub fn sum(&self) -> T {
        self.evaluate(T::one())
    }

    /// Horner evaluation of the retained terms with `x` standing for `1/c`.
    pub fn evaluate(&self, x: T) -> T {
        horner(&self.coeffs, x)
    }

    fn check_order(&self, other: usize) -> Result<(), SeriesError> {
        if self.max_order == other {
            Ok(())
        } else {
            Err(SeriesError::MaxOrderMismatch {
                left: self.max_order,
                right: other,
            })
        }
    }

    /// Coefficient-wise sum.
    pub fn checked_add(&self, other: &Self) -> Result<Self, SeriesError> {
        self.check_order(other.max_order)?;
        let len = self.len().max(other.len());
        let coeffs = (0..len)
            .map(|k| {
                let a = self.coeffs.get(k).copied().unwrap_or_else(T::zero);
                let b = other.coeffs.get(k).copied().unwrap_or_else(T::zero);
                a + b
            })
            .collect();
        Ok(Self::new(coeffs, self.max_order))
    }

    /// Product truncated at the shared maximum order.
    pub fn checked_mul(&self, other: &Self) -> Result<Self, SeriesError> {
        self.check_order(other.max_order)?;
        if self.is_empty() || other.is_empty() {
            return Ok(Self::new(Vec::new(), self.max_order));
        }
        let len = (self.len() + other.len() - 1).min(self.max_order.saturating_add(1));
        Ok(Self::new(
            truncated_product(&self.coeffs, &other.coeffs, len),
            self.max_order,
        ))
    }

    /// Add a single term.
    pub fn checked_add_term(&self, term: PNTerm<T>) -> Result<Self, SeriesError> {
        self.checked_add(&term.into_expansion()?)
    }

    /// Value of `self / denominator`, re-expanded and truncated at the shared
    /// maximum order.
    pub fn ratio(&self, denominator: &Self) -> Result<T, SeriesError> {
        self.check_order(denominator.max_order)?;
        Ok(series_ratio_expansion(&self.coeffs, &denominator.coeffs))
    }

    /// Value at `x` of `self / denominator`, re-expanded and truncated at the
    /// shared maximum order.
    pub fn ratio_at(&self, denominator: &Self, x: T) -> Result<T, SeriesError> {
        self.check_order(denominator.max_order)?;
        Ok(series_ratio(&self.coeffs, &denominator.coeffs, x))
    }
}

impl<T: PnFloat> Mul<T> for PNExpansion<T> {
    type Output = PNExpansion<T>;

    fn mul(mut self, rhs: T) -> Self::Output {
        for c in &mut self.coeffs {
            *c *= rhs;
        }
        self
    }
}

/// One coefficient times `(1/c)^exponent`.
///
/// Terms are cheap to write and combine; they collapse into a
/// [`PNExpansion`] once added together. The exponent may be negative while
/// terms are being multiplied, but a term can only join an expansion once its
/// exponent is non-negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PNTerm<T> {
    /// Power of `1/c`
    pub exponent: i32,
    /// Coefficient
    pub coefficient: T,
    /// Maximum order of any expansion this term joins
    pub max_order: usize,
}

impl<T: PnFloat> PNTerm<T> {
    /// Create a term.
    pub fn new(exponent: i32, coefficient: T, max_order: usize) -> Self {
        Self {
            exponent,
            coefficient,
            max_order,
        }
    }

    /// Promote to a one-term expansion.
    pub fn into_expansion(self) -> Result<PNExpansion<T>, SeriesError> {
        if self.exponent < 0 {
            return Err(SeriesError::NegativeExponent {
                exponent: self.exponent,
            });
        }
        let k = self.exponent as usize;
        let mut coeffs = Vec::new();
        if k <= self.max_order {
            coeffs.resize(k, T::zero());
            coeffs.push(self.coefficient);
        }
        Ok(PNExpansion::new(coeffs, self.max_order))
    }

    /// Sum of two terms.
    pub fn checked_add(self, other: PNTerm<T>) -> Result<PNExpansion<T>, SeriesError> {
        if self.max_order != other.max_order {
            return Err(SeriesError::MaxOrderMismatch {
                left: self.max_order,
                right: other.max_order,
            });
        }
        self.into_expansion()?
            .checked_add(&other.into_expansion()?)
    }

    /// Sum of a term and a plain number (an exponent-zero term).
    pub fn checked_add_scalar(self, x: T) -> Result<PNExpansion<T>, SeriesError> {
        self.checked_add(PNTerm::new(0, x, self.max_order))
    }

    /// Product of two terms; exponents add.
    pub fn checked_mul(self, other: PNTerm<T>) -> Result<PNTerm<T>, SeriesError> {
        if self.max_order != other.max_order {
            return Err(SeriesError::MaxOrderMismatch {
                left: self.max_order,
                right: other.max_order,
            });
        }
        Ok(PNTerm::new(
            self.exponent + other.exponent,
            self.coefficient * other.coefficient,
            self.max_order,
        ))
    }
}

impl<T: PnFloat> Mul<T> for PNTerm<T> {
    type Output = PNTerm<T>;

    fn mul(self, rhs: T) -> Self::Output {
        PNTerm::new(self.exponent, self.coefficient * rhs, self.max_order)
    }
}
