//! Butcher tableau of the Fehlberg 7(8) pair.
//!
//! Fehlberg, E. (1968). "Classical Fifth-, Sixth-, Seventh-, and
//! Eighth-Order Runge-Kutta Formulas with Stepsize Control".
//! NASA TR R-287, Table X.
//!
//! The stage matrix is stored as ragged rows: row `i` holds exactly the `i`
//! coefficients `a_{i,0} .. a_{i,i-1}`, so the stage loop never touches the
//! structurally zero upper triangle.

/// Number of stages
pub const STAGES: usize = 13;

/// Order of the propagated solution
pub const ORDER: u8 = 8;

/// Order of the embedded solution used for the error estimate
pub const EMBEDDED_ORDER: u8 = 7;

/// Stage abscissae `c_i`.
pub const C: [f64; STAGES] = [
    0.0,
    2.0 / 27.0,
    1.0 / 9.0,
    1.0 / 6.0,
    5.0 / 12.0,
    0.5,
    5.0 / 6.0,
    1.0 / 6.0,
    2.0 / 3.0,
    1.0 / 3.0,
    1.0,
    0.0,
    1.0,
];

/// Stage matrix, ragged lower triangle.
pub const A: [&[f64]; STAGES] = [
    &[],
    &[2.0 / 27.0],
    &[1.0 / 36.0, 1.0 / 12.0],
    &[1.0 / 24.0, 0.0, 1.0 / 8.0],
    &[5.0 / 12.0, 0.0, -25.0 / 16.0, 25.0 / 16.0],
    &[1.0 / 20.0, 0.0, 0.0, 1.0 / 4.0, 1.0 / 5.0],
    &[-25.0 / 108.0, 0.0, 0.0, 125.0 / 108.0, -65.0 / 27.0, 125.0 / 54.0],
    &[31.0 / 300.0, 0.0, 0.0, 0.0, 61.0 / 225.0, -2.0 / 9.0, 13.0 / 900.0],
    &[2.0, 0.0, 0.0, -53.0 / 6.0, 704.0 / 45.0, -107.0 / 9.0, 67.0 / 90.0, 3.0],
    &[
        -91.0 / 108.0,
        0.0,
        0.0,
        23.0 / 108.0,
        -976.0 / 135.0,
        311.0 / 54.0,
        -19.0 / 60.0,
        17.0 / 6.0,
        -1.0 / 12.0,
    ],
    &[
        2383.0 / 4100.0,
        0.0,
        0.0,
        -341.0 / 164.0,
        4496.0 / 1025.0,
        -301.0 / 82.0,
        2133.0 / 4100.0,
        45.0 / 82.0,
        45.0 / 164.0,
        18.0 / 41.0,
    ],
    &[
        3.0 / 205.0,
        0.0,
        0.0,
        0.0,
        0.0,
        -6.0 / 41.0,
        -3.0 / 205.0,
        -3.0 / 41.0,
        3.0 / 41.0,
        6.0 / 41.0,
        0.0,
    ],
    &[
        -1777.0 / 4100.0,
        0.0,
        0.0,
        -341.0 / 164.0,
        4496.0 / 1025.0,
        -289.0 / 82.0,
        2193.0 / 4100.0,
        51.0 / 82.0,
        33.0 / 164.0,
        12.0 / 41.0,
        0.0,
        1.0,
    ],
];

/// Weights of the 8th-order solution; only stages 0 and 5..=10 contribute.
pub const B: [f64; STAGES] = [
    41.0 / 840.0,
    0.0,
    0.0,
    0.0,
    0.0,
    34.0 / 105.0,
    9.0 / 35.0,
    9.0 / 35.0,
    9.0 / 280.0,
    9.0 / 280.0,
    41.0 / 840.0,
    0.0,
    0.0,
];

/// The 7th-order solution differs from the 8th only in stages 0, 10, 11 and
/// 12, so the local error estimate collapses to
/// `h · 41/840 · (k₀ + k₁₀ - k₁₁ - k₁₂)`.
pub const ERROR_WEIGHT: f64 = 41.0 / 840.0;

/// Stages entering the error estimate with a `+` sign.
pub const ERROR_PLUS: [usize; 2] = [0, 10];

/// Stages entering the error estimate with a `-` sign.
pub const ERROR_MINUS: [usize; 2] = [11, 12];

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-14;

    #[test]
    fn test_rows_are_lower_triangular() {
        for (i, row) in A.iter().enumerate() {
            assert_eq!(row.len(), i, "row {} has {} entries", i, row.len());
        }
    }

    #[test]
    fn test_row_sums_match_abscissae() {
        for (i, row) in A.iter().enumerate() {
            let sum: f64 = row.iter().sum();
            assert!(
                (sum - C[i]).abs() < TOL,
                "row {} sums to {}, c = {}",
                i,
                sum,
                C[i]
            );
        }
    }

    #[test]
    fn test_quadrature_conditions_through_eighth_order() {
        // Σ b_i c_i^(q-1) = 1/q for q = 1..=8
        for q in 1..=ORDER as i32 {
            let sum: f64 = B.iter().zip(C.iter()).map(|(b, c)| b * c.powi(q - 1)).sum();
            assert!(
                (sum - 1.0 / q as f64).abs() < TOL,
                "q = {}: Σ b c^(q-1) = {}",
                q,
                sum
            );
        }
    }

    #[test]
    fn test_embedded_weights_sum_to_one() {
        // b̂ = b with stages 0 and 10 moved onto 11 and 12
        let mut b_hat = B;
        for (&plus, &minus) in ERROR_PLUS.iter().zip(ERROR_MINUS.iter()) {
            b_hat[minus] += ERROR_WEIGHT;
            b_hat[plus] -= ERROR_WEIGHT;
        }
        let sum: f64 = b_hat.iter().sum();
        assert!((sum - 1.0).abs() < TOL, "embedded weights sum to {}", sum);
        assert_eq!(EMBEDDED_ORDER + 1, ORDER);
    }
}
