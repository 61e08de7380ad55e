//! Statevector simulation engine.

use num_complex::Complex64;
use rand::Rng;

use alsvin_hal::Counts;
use alsvin_ir::{Circuit, Gate, Unitary};

/// A statevector over `2^n` amplitudes.
///
/// Amplitude index bit `q` carries qubit `q`; bitstrings presented to the
/// outside put qubit 0 first.
pub struct Statevector {
    amplitudes: Vec<Complex64>,
    num_qubits: usize,
}

impl Statevector {
    /// Create a statevector initialized to `|0...0⟩`.
    pub fn new(num_qubits: usize) -> Self {
        let size = 1 << num_qubits;
        let mut amplitudes = vec![Complex64::new(0.0, 0.0); size];
        amplitudes[0] = Complex64::new(1.0, 0.0);
        Self {
            amplitudes,
            num_qubits,
        }
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Apply a placed gate.
    pub fn apply(&mut self, gate: &Gate, qubits: &[usize]) {
        let matrix = gate.matrix();
        match qubits {
            [q] => self.apply_single(&matrix, *q),
            [a, b] => self.apply_pair(&matrix, *a, *b),
            [a, b, c] => self.apply_triple(&matrix, *a, *b, *c),
            _ => {}
        }
    }

    /// Run every gate of a circuit.
    pub fn run(&mut self, circuit: &Circuit) {
        for op in circuit.gates() {
            self.apply(&op.gate, &op.qubits);
        }
    }

    fn apply_single(&mut self, matrix: &Unitary, qubit: usize) {
        let mask = 1 << qubit;
        for i in 0..self.amplitudes.len() {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = matrix.get(0, 0) * a + matrix.get(0, 1) * b;
                self.amplitudes[j] = matrix.get(1, 0) * a + matrix.get(1, 1) * b;
            }
        }
    }

    /// Apply a 4×4 matrix; the first operand is the most significant bit
    /// of the matrix index, matching the gate-matrix convention.
    fn apply_pair(&mut self, matrix: &Unitary, qa: usize, qb: usize) {
        let mask_a = 1 << qa;
        let mask_b = 1 << qb;
        for i in 0..self.amplitudes.len() {
            if i & mask_a == 0 && i & mask_b == 0 {
                let indices = [i, i | mask_b, i | mask_a, i | mask_a | mask_b];
                let amps = indices.map(|idx| self.amplitudes[idx]);
                for (row, &idx) in indices.iter().enumerate() {
                    let mut acc = Complex64::new(0.0, 0.0);
                    for (col, &amp) in amps.iter().enumerate() {
                        acc += matrix.get(row, col) * amp;
                    }
                    self.amplitudes[idx] = acc;
                }
            }
        }
    }

    fn apply_triple(&mut self, matrix: &Unitary, qa: usize, qb: usize, qc: usize) {
        let masks = [1 << qa, 1 << qb, 1 << qc];
        let all = masks[0] | masks[1] | masks[2];
        for i in 0..self.amplitudes.len() {
            if i & all == 0 {
                // Sub-index in operand order: qa is the most significant.
                let indices: [usize; 8] = std::array::from_fn(|sub| {
                    let mut idx = i;
                    if sub & 0b100 != 0 {
                        idx |= masks[0];
                    }
                    if sub & 0b010 != 0 {
                        idx |= masks[1];
                    }
                    if sub & 0b001 != 0 {
                        idx |= masks[2];
                    }
                    idx
                });
                let amps = indices.map(|idx| self.amplitudes[idx]);
                for (row, &idx) in indices.iter().enumerate() {
                    let mut acc = Complex64::new(0.0, 0.0);
                    for (col, &amp) in amps.iter().enumerate() {
                        acc += matrix.get(row, col) * amp;
                    }
                    self.amplitudes[idx] = acc;
                }
            }
        }
    }

    /// Sample one measurement outcome (an amplitude index).
    pub fn sample(&self, rng: &mut impl Rng) -> usize {
        let r: f64 = rng.r#gen();
        let mut cumulative = 0.0;
        for (i, amp) in self.amplitudes.iter().enumerate() {
            cumulative += amp.norm_sqr();
            if r < cumulative {
                return i;
            }
        }
        self.amplitudes.len() - 1
    }

    /// Sample a counts histogram for a circuit's measurement mapping.
    ///
    /// Measured qubits land in their classical bit, qubit 0 leftmost; a
    /// circuit without measurements samples every qubit.
    pub fn sample_counts(&self, circuit: &Circuit, shots: u32, rng: &mut impl Rng) -> Counts {
        let mut counts = Counts::new();
        for _ in 0..shots {
            let outcome = self.sample(rng);
            counts.insert(self.format_outcome(circuit, outcome), 1);
        }
        counts
    }

    fn format_outcome(&self, circuit: &Circuit, outcome: usize) -> String {
        let bit = |qubit: usize| (outcome >> qubit) & 1;

        if circuit.measurements().is_empty() {
            return (0..self.num_qubits)
                .map(|q| if bit(q) == 1 { '1' } else { '0' })
                .collect();
        }

        let mut bits = vec!['0'; circuit.num_clbits()];
        for m in circuit.measurements() {
            bits[m.clbit] = if bit(m.qubit) == 1 { '1' } else { '0' };
        }
        bits.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn approx_eq(a: Complex64, b: Complex64) -> bool {
        (a - b).norm() < 1e-10
    }

    #[test]
    fn test_initial_state() {
        let sv = Statevector::new(2);
        assert!(approx_eq(sv.amplitudes[0], Complex64::new(1.0, 0.0)));
        assert!(approx_eq(sv.amplitudes[1], Complex64::new(0.0, 0.0)));
    }

    #[test]
    fn test_x_flips() {
        let mut sv = Statevector::new(1);
        sv.apply(&Gate::X, &[0]);
        assert!(approx_eq(sv.amplitudes[0], Complex64::new(0.0, 0.0)));
        assert!(approx_eq(sv.amplitudes[1], Complex64::new(1.0, 0.0)));
    }

    #[test]
    fn test_bell_amplitudes() {
        let mut sv = Statevector::new(2);
        sv.apply(&Gate::H, &[0]);
        sv.apply(&Gate::CX, &[0, 1]);

        let sqrt2_inv = Complex64::new(1.0 / 2.0_f64.sqrt(), 0.0);
        // |00> and |11> (index 0 and 3) each with amplitude 1/sqrt(2).
        assert!(approx_eq(sv.amplitudes[0], sqrt2_inv));
        assert!(approx_eq(sv.amplitudes[1], Complex64::new(0.0, 0.0)));
        assert!(approx_eq(sv.amplitudes[2], Complex64::new(0.0, 0.0)));
        assert!(approx_eq(sv.amplitudes[3], sqrt2_inv));
    }

    #[test]
    fn test_cx_control_order() {
        // X(1) then CX(1, 0): the set qubit 1 controls a flip of qubit 0.
        let mut sv = Statevector::new(2);
        sv.apply(&Gate::X, &[1]);
        sv.apply(&Gate::CX, &[1, 0]);

        // Expect |11> (index 3).
        assert!(approx_eq(sv.amplitudes[3], Complex64::new(1.0, 0.0)));
    }

    #[test]
    fn test_ccx() {
        let mut sv = Statevector::new(3);
        sv.apply(&Gate::X, &[0]);
        sv.apply(&Gate::X, &[1]);
        sv.apply(&Gate::CCX, &[0, 1, 2]);

        // All three qubits set: index 0b111.
        assert!(approx_eq(sv.amplitudes[7], Complex64::new(1.0, 0.0)));
    }

    #[test]
    fn test_sample_deterministic_state() {
        let mut sv = Statevector::new(1);
        sv.apply(&Gate::X, &[0]);

        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            assert_eq!(sv.sample(&mut rng), 1);
        }
    }

    #[test]
    fn test_sample_counts_bell() {
        let circuit = Circuit::bell().unwrap();
        let mut sv = Statevector::new(2);
        sv.run(&circuit);

        let mut rng = StdRng::seed_from_u64(9);
        let counts = sv.sample_counts(&circuit, 1000, &mut rng);

        assert_eq!(counts.total(), 1000);
        assert_eq!(counts.get("01") + counts.get("10"), 0);
        let zeros = counts.get("00") as f64 / 1000.0;
        assert!((zeros - 0.5).abs() < 0.1);
    }

    #[test]
    fn test_measurement_mapping() {
        // Measure qubit 1 into clbit 0 only.
        let mut circuit = Circuit::new("test", 2);
        circuit.x(1).unwrap().measure(1, 0).unwrap();

        let mut sv = Statevector::new(2);
        sv.run(&circuit);

        let mut rng = StdRng::seed_from_u64(1);
        let counts = sv.sample_counts(&circuit, 10, &mut rng);
        assert_eq!(counts.get("1"), 10);
    }
}
