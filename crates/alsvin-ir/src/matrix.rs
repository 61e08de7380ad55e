//! Dense unitary matrix algebra.
//!
//! Gates carry square matrices of dimension `2^n` over `Complex64`. The
//! optimizer and the test suite compare circuits through these matrices, so
//! equality is always taken up to global phase and a fixed tolerance.

use num_complex::Complex64;

/// Tolerance for all matrix comparisons (unitarity, commutation, equivalence).
pub const TOLERANCE: f64 = 1e-10;

/// A dense square matrix in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct Unitary {
    dim: usize,
    data: Vec<Complex64>,
}

impl Unitary {
    /// Create a matrix from row-major elements.
    ///
    /// # Panics
    ///
    /// Panics if `data.len() != dim * dim`.
    pub fn from_rows(dim: usize, data: Vec<Complex64>) -> Self {
        assert_eq!(
            data.len(),
            dim * dim,
            "matrix data length {} does not match dimension {dim}",
            data.len()
        );
        Self { dim, data }
    }

    /// The identity matrix of the given dimension.
    pub fn identity(dim: usize) -> Self {
        let mut data = vec![Complex64::new(0.0, 0.0); dim * dim];
        for i in 0..dim {
            data[i * dim + i] = Complex64::new(1.0, 0.0);
        }
        Self { dim, data }
    }

    /// Matrix dimension (the matrix is `dim × dim`).
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Element at row `i`, column `j`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Complex64 {
        self.data[i * self.dim + j]
    }

    /// Set element at row `i`, column `j`.
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: Complex64) {
        self.data[i * self.dim + j] = value;
    }

    /// Matrix product `self · other`.
    ///
    /// # Panics
    ///
    /// Panics if dimensions differ.
    pub fn mul(&self, other: &Unitary) -> Unitary {
        assert_eq!(self.dim, other.dim, "dimension mismatch in matrix product");
        let n = self.dim;
        let mut out = vec![Complex64::new(0.0, 0.0); n * n];
        for i in 0..n {
            for k in 0..n {
                let a = self.data[i * n + k];
                if a == Complex64::new(0.0, 0.0) {
                    continue;
                }
                for j in 0..n {
                    out[i * n + j] += a * other.data[k * n + j];
                }
            }
        }
        Unitary { dim: n, data: out }
    }

    /// Conjugate transpose.
    pub fn dagger(&self) -> Unitary {
        let n = self.dim;
        let mut out = vec![Complex64::new(0.0, 0.0); n * n];
        for i in 0..n {
            for j in 0..n {
                out[j * n + i] = self.data[i * n + j].conj();
            }
        }
        Unitary { dim: n, data: out }
    }

    /// Kronecker product `self ⊗ other`.
    pub fn kron(&self, other: &Unitary) -> Unitary {
        let (a, b) = (self.dim, other.dim);
        let n = a * b;
        let mut out = vec![Complex64::new(0.0, 0.0); n * n];
        for i in 0..a {
            for j in 0..a {
                let x = self.data[i * a + j];
                if x == Complex64::new(0.0, 0.0) {
                    continue;
                }
                for k in 0..b {
                    for l in 0..b {
                        out[(i * b + k) * n + (j * b + l)] = x * other.data[k * b + l];
                    }
                }
            }
        }
        Unitary { dim: n, data: out }
    }

    /// Check `M · M† = I` within the tolerance.
    pub fn is_unitary(&self, tol: f64) -> bool {
        let product = self.mul(&self.dagger());
        let n = self.dim;
        for i in 0..n {
            for j in 0..n {
                let expected = if i == j { Complex64::new(1.0, 0.0) } else { Complex64::new(0.0, 0.0) };
                if (product.data[i * n + j] - expected).norm() > tol {
                    return false;
                }
            }
        }
        true
    }

    /// Check whether `self` and `other` commute: `AB = BA` within the tolerance.
    pub fn commutes_with(&self, other: &Unitary, tol: f64) -> bool {
        let ab = self.mul(other);
        let ba = other.mul(self);
        ab.data
            .iter()
            .zip(&ba.data)
            .all(|(x, y)| (x - y).norm() <= tol)
    }

    /// Check `self = e^{iφ} · other` for some phase φ, within the tolerance.
    pub fn approx_eq_up_to_global_phase(&self, other: &Unitary, tol: f64) -> bool {
        if self.dim != other.dim {
            return false;
        }

        // Find the largest-magnitude entry of `other` to anchor the phase.
        let mut anchor = 0;
        let mut best = 0.0;
        for (idx, v) in other.data.iter().enumerate() {
            if v.norm() > best {
                best = v.norm();
                anchor = idx;
            }
        }
        if best <= tol {
            // `other` is numerically zero; compare directly.
            return self.data.iter().all(|v| v.norm() <= tol);
        }

        let phase = self.data[anchor] / other.data[anchor];
        if (phase.norm() - 1.0).abs() > tol {
            return false;
        }

        self.data
            .iter()
            .zip(&other.data)
            .all(|(a, b)| (a - b * phase).norm() <= tol)
    }

    /// Embed a `k`-qubit matrix acting on `positions` into an `n`-qubit space.
    ///
    /// Basis-state indexing is big-endian: qubit 0 is the most significant
    /// bit of the index, so bitstrings read left-to-right as qubit 0, 1, ….
    pub fn embed(&self, positions: &[usize], num_qubits: usize) -> Unitary {
        let k = positions.len();
        debug_assert_eq!(self.dim, 1 << k, "gate matrix dimension mismatch");
        let n = 1usize << num_qubits;
        let mut out = vec![Complex64::new(0.0, 0.0); n * n];

        // Bit of qubit q inside a full-space index.
        let bit = |index: usize, q: usize| (index >> (num_qubits - 1 - q)) & 1;

        for row in 0..n {
            for col in 0..n {
                // Spectator qubits must be unchanged.
                let mut spectators_match = true;
                for q in 0..num_qubits {
                    if !positions.contains(&q) && bit(row, q) != bit(col, q) {
                        spectators_match = false;
                        break;
                    }
                }
                if !spectators_match {
                    continue;
                }

                // Assemble the sub-matrix indices from the operand bits,
                // in operand-tuple order (first operand = most significant).
                let mut sub_row = 0;
                let mut sub_col = 0;
                for &q in positions {
                    sub_row = (sub_row << 1) | bit(row, q);
                    sub_col = (sub_col << 1) | bit(col, q);
                }
                out[row * n + col] = self.data[sub_row * self.dim + sub_col];
            }
        }

        Unitary { dim: n, data: out }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::Gate;

    #[test]
    fn test_identity_unitary() {
        let id = Unitary::identity(4);
        assert!(id.is_unitary(TOLERANCE));
        assert_eq!(id.get(2, 2), Complex64::new(1.0, 0.0));
        assert_eq!(id.get(0, 3), Complex64::new(0.0, 0.0));
    }

    #[test]
    fn test_mul_dagger() {
        let h = Gate::H.matrix();
        let product = h.mul(&h.dagger());
        assert!(product.approx_eq_up_to_global_phase(&Unitary::identity(2), TOLERANCE));
    }

    #[test]
    fn test_kron_dimensions() {
        let h = Gate::H.matrix();
        let hh = h.kron(&h);
        assert_eq!(hh.dim(), 4);
        assert!(hh.is_unitary(TOLERANCE));
    }

    #[test]
    fn test_global_phase_equality() {
        let z = Gate::Z.matrix();
        // -Z is Z up to a global phase of -1.
        let neg_z = Unitary::from_rows(
            2,
            z.data.iter().map(|v| -v).collect(),
        );
        assert!(neg_z.approx_eq_up_to_global_phase(&z, TOLERANCE));
        // But X is not Z up to any phase.
        assert!(!Gate::X.matrix().approx_eq_up_to_global_phase(&z, TOLERANCE));
    }

    #[test]
    fn test_embed_single_qubit() {
        // X on qubit 1 of 2: |00> -> |01>, |01> -> |00> (big-endian indexing).
        let embedded = Gate::X.matrix().embed(&[1], 2);
        assert_eq!(embedded.get(0, 1), Complex64::new(1.0, 0.0));
        assert_eq!(embedded.get(1, 0), Complex64::new(1.0, 0.0));
        assert_eq!(embedded.get(2, 3), Complex64::new(1.0, 0.0));
        assert_eq!(embedded.get(3, 2), Complex64::new(1.0, 0.0));
        assert!(embedded.is_unitary(TOLERANCE));
    }

    #[test]
    fn test_embed_reversed_operands() {
        // CX with target listed first: gate on (1, 0) flips qubit 0 when
        // qubit 1 is set. |01> (index 1) -> |11> (index 3).
        let embedded = Gate::CX.matrix().embed(&[1, 0], 2);
        assert_eq!(embedded.get(3, 1), Complex64::new(1.0, 0.0));
        assert_eq!(embedded.get(1, 3), Complex64::new(1.0, 0.0));
        assert_eq!(embedded.get(0, 0), Complex64::new(1.0, 0.0));
    }
}
