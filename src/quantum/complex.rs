// src/quantum/complex.rs
//! Complex-number helpers
//!
//! Amplitudes are `num_complex::Complex64`, which already provides the field
//! operations, polar form, `exp`, `ln`, `powc` and the trigonometric
//! functions. This module adds approximate equality and the matrix/vector
//! products the simulator needs.

use ndarray::Array2;
use num_complex::Complex64;

use crate::error::{QuantumError, Result};

/// Tolerance for approximate complex equality
pub const EPSILON: f64 = 1e-10;

/// Common complex numbers
pub mod constants {
    use num_complex::Complex64;

    pub const ZERO: Complex64 = Complex64::new(0.0, 0.0);
    pub const ONE: Complex64 = Complex64::new(1.0, 0.0);
    /// The imaginary unit i
    pub const I: Complex64 = Complex64::new(0.0, 1.0);
}

/// Convenience methods on amplitudes
pub trait ComplexExt {
    /// Component-wise comparison within [`EPSILON`]
    fn approx_eq(&self, other: &Self) -> bool;

    /// |z|
    fn magnitude(&self) -> f64;

    /// arg(z) in (-π, π]
    fn phase(&self) -> f64;
}

impl ComplexExt for Complex64 {
    fn approx_eq(&self, other: &Self) -> bool {
        (self.re - other.re).abs() < EPSILON && (self.im - other.im).abs() < EPSILON
    }

    fn magnitude(&self) -> f64 {
        self.norm()
    }

    fn phase(&self) -> f64 {
        self.arg()
    }
}

/// Kronecker product of two complex matrices
///
/// The result has shape `(rows_a * rows_b, cols_a * cols_b)` with
/// `result[i * rows_b + k, j * cols_b + l] = a[i, j] * b[k, l]`.
pub fn tensor_product(a: &Array2<Complex64>, b: &Array2<Complex64>) -> Array2<Complex64> {
    let (a_rows, a_cols) = a.dim();
    let (b_rows, b_cols) = b.dim();

    let mut result = Array2::zeros((a_rows * b_rows, a_cols * b_cols));

    for i in 0..a_rows {
        for j in 0..a_cols {
            for k in 0..b_rows {
                for l in 0..b_cols {
                    result[[i * b_rows + k, j * b_cols + l]] = a[[i, j]] * b[[k, l]];
                }
            }
        }
    }

    result
}

/// ⟨a|b⟩ = Σ conj(a_i) · b_i
pub fn inner_product(a: &[Complex64], b: &[Complex64]) -> Result<Complex64> {
    if a.len() != b.len() {
        return Err(QuantumError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    Ok(a.iter().zip(b).map(|(x, y)| x.conj() * y).sum())
}

/// Whether `U†U` is the identity within `tolerance`
pub fn is_unitary(matrix: &Array2<Complex64>, tolerance: f64) -> bool {
    let (rows, cols) = matrix.dim();
    if rows != cols {
        return false;
    }

    for i in 0..cols {
        for j in 0..cols {
            let mut entry = constants::ZERO;
            for k in 0..rows {
                entry += matrix[[k, i]].conj() * matrix[[k, j]];
            }
            let expected = if i == j { constants::ONE } else { constants::ZERO };
            if (entry - expected).norm() > tolerance {
                return false;
            }
        }
    }

    true
}

/// Conjugate transpose
pub fn adjoint(matrix: &Array2<Complex64>) -> Array2<Complex64> {
    matrix.t().mapv(|z| z.conj())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::f64::consts::PI;

    #[test]
    fn test_complex_arithmetic_and_polar_form() {
        let a = Complex64::new(1.0, 2.0);
        let b = Complex64::new(3.0, -1.0);

        assert!((a * b).approx_eq(&Complex64::new(5.0, 5.0)));
        assert!(((a * b) / b).approx_eq(&a));
        assert!(a.conj().approx_eq(&Complex64::new(1.0, -2.0)));

        let z = Complex64::from_polar(2.0, PI / 2.0);
        assert!((z.magnitude() - 2.0).abs() < EPSILON);
        assert!((z.phase() - PI / 2.0).abs() < EPSILON);

        // Euler: e^{iπ} = -1
        let euler = (constants::I * PI).exp();
        assert!(euler.approx_eq(&Complex64::new(-1.0, 0.0)));
        assert!(euler.ln().approx_eq(&Complex64::new(0.0, PI)));
    }

    #[test]
    fn test_division_by_zero_is_not_finite() {
        let z = Complex64::new(1.0, 1.0) / constants::ZERO;
        assert!(!z.re.is_finite() || !z.im.is_finite());
    }

    #[test]
    fn test_tensor_product_shape_and_entries() {
        let a = array![[constants::ONE, constants::I]];
        let b = array![[constants::ONE], [Complex64::new(2.0, 0.0)]];

        let k = tensor_product(&a, &b);
        assert_eq!(k.dim(), (2, 2));
        assert!(k[[0, 0]].approx_eq(&constants::ONE));
        assert!(k[[1, 0]].approx_eq(&Complex64::new(2.0, 0.0)));
        assert!(k[[0, 1]].approx_eq(&constants::I));
        assert!(k[[1, 1]].approx_eq(&Complex64::new(0.0, 2.0)));
    }

    #[test]
    fn test_inner_product() {
        let a = [constants::I, constants::ZERO];
        let b = [constants::I, constants::ONE];
        assert!(inner_product(&a, &b).unwrap().approx_eq(&constants::ONE));
        assert!(inner_product(&a, &b[..1]).is_err());
    }

    #[test]
    fn test_unitarity_check() {
        let h = 1.0 / 2.0_f64.sqrt();
        let hadamard = array![
            [Complex64::new(h, 0.0), Complex64::new(h, 0.0)],
            [Complex64::new(h, 0.0), Complex64::new(-h, 0.0)]
        ];
        assert!(is_unitary(&hadamard, 1e-9));

        let not_unitary = array![[constants::ONE, constants::ONE], [constants::ZERO, constants::ONE]];
        assert!(!is_unitary(&not_unitary, 1e-9));
        assert!(adjoint(&not_unitary)[[1, 0]].approx_eq(&constants::ONE));
    }
}
