//! Same-axis rotation merging.

use alsvin_ir::{Circuit, Gate, GateOp};

use crate::error::CompileResult;
use crate::pass::Pass;

use super::EPSILON;

/// Fuses consecutive same-axis rotations on the same qubit.
///
/// Two rotations are consecutive when no other gate touches that qubit
/// between them. The fused gate carries the summed angle and is dropped
/// when the sum is numerically zero.
pub struct MergeRotations;

impl MergeRotations {
    /// One sweep; returns the merged sequence, or `None` if nothing fused.
    fn merge_once(circuit: &Circuit) -> Option<Vec<GateOp>> {
        let gates = circuit.gates();
        let mut out: Vec<GateOp> = vec![];
        let mut merged_any = false;
        // Index into `out` of the last gate seen on each qubit.
        let mut last_on_qubit: Vec<Option<usize>> = vec![None; circuit.num_qubits()];

        for op in gates {
            if let (Some((axis, angle)), [qubit]) = (op.gate.rotation(), op.qubits.as_slice()) {
                if let Some(prev_idx) = last_on_qubit[*qubit] {
                    let prev = &out[prev_idx];
                    if let Some((prev_axis, prev_angle)) = prev.gate.rotation() {
                        if prev_axis == axis && prev.qubits == [*qubit] {
                            let sum = prev_angle + angle;
                            merged_any = true;
                            if sum.abs() < EPSILON {
                                out.remove(prev_idx);
                                // Rebuild the per-qubit index after removal.
                                for entry in &mut last_on_qubit {
                                    match entry {
                                        Some(i) if *i == prev_idx => *entry = None,
                                        Some(i) if *i > prev_idx => *i -= 1,
                                        _ => {}
                                    }
                                }
                            } else {
                                out[prev_idx].gate = Gate::from_rotation(axis, sum);
                            }
                            continue;
                        }
                    }
                }
            }

            out.push(op.clone());
            let idx = out.len() - 1;
            for &q in &op.qubits {
                last_on_qubit[q] = Some(idx);
            }
        }

        merged_any.then_some(out)
    }
}

impl Pass for MergeRotations {
    fn name(&self) -> &'static str {
        "MergeRotations"
    }

    fn run(&self, circuit: &mut Circuit) -> CompileResult<()> {
        // A fused pair can expose a further merge with the gate after it.
        const MAX_ITERATIONS: usize = 100;
        for _ in 0..MAX_ITERATIONS {
            match Self::merge_once(circuit) {
                Some(gates) => *circuit = circuit.with_gates(gates)?,
                None => break,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_merge_rx_pair() {
        let mut circuit = Circuit::new("test", 1);
        circuit.rx(PI / 4.0, 0).unwrap().rx(PI / 4.0, 0).unwrap();
        MergeRotations.run(&mut circuit).unwrap();

        assert_eq!(circuit.gate_count(), 1);
        assert_eq!(circuit.gates()[0].gate, Gate::Rx(PI / 2.0));
    }

    #[test]
    fn test_merge_chain() {
        let mut circuit = Circuit::new("test", 1);
        circuit
            .rz(0.5, 0)
            .unwrap()
            .rz(0.25, 0)
            .unwrap()
            .rz(0.25, 0)
            .unwrap();
        MergeRotations.run(&mut circuit).unwrap();

        assert_eq!(circuit.gate_count(), 1);
        let (_, angle) = circuit.gates()[0].gate.rotation().unwrap();
        assert!((angle - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cancelling_pair_dropped() {
        let mut circuit = Circuit::new("test", 2);
        circuit
            .rz(PI / 6.0, 0)
            .unwrap()
            .rz(-PI / 6.0, 0)
            .unwrap()
            .x(1)
            .unwrap();
        MergeRotations.run(&mut circuit).unwrap();

        assert_eq!(circuit.gate_count(), 1);
        assert_eq!(circuit.gates()[0].gate.name(), "x");
    }

    #[test]
    fn test_spec_rotation_merge_example() {
        // RX(π/4) RX(π/4) RY(π/3) RZ(π/6) RZ(-π/6) X(1)
        //   -> RX(π/2) RY(π/3) X(1)
        let mut circuit = Circuit::new("test", 2);
        circuit
            .rx(PI / 4.0, 0)
            .unwrap()
            .rx(PI / 4.0, 0)
            .unwrap()
            .ry(PI / 3.0, 0)
            .unwrap()
            .rz(PI / 6.0, 0)
            .unwrap()
            .rz(-PI / 6.0, 0)
            .unwrap()
            .x(1)
            .unwrap();

        MergeRotations.run(&mut circuit).unwrap();

        assert_eq!(circuit.gate_count(), 3);
        assert_eq!(circuit.gates()[0].gate, Gate::Rx(PI / 2.0));
        assert_eq!(circuit.gates()[1].gate, Gate::Ry(PI / 3.0));
        assert_eq!(circuit.gates()[2].gate, Gate::X);
    }

    #[test]
    fn test_different_axes_not_merged() {
        let mut circuit = Circuit::new("test", 1);
        circuit.rx(0.5, 0).unwrap().ry(0.5, 0).unwrap();
        MergeRotations.run(&mut circuit).unwrap();
        assert_eq!(circuit.gate_count(), 2);
    }

    #[test]
    fn test_intervening_gate_blocks_merge() {
        let mut circuit = Circuit::new("test", 2);
        circuit
            .rx(0.5, 0)
            .unwrap()
            .cx(0, 1)
            .unwrap()
            .rx(0.5, 0)
            .unwrap();
        MergeRotations.run(&mut circuit).unwrap();
        assert_eq!(circuit.gate_count(), 3);
    }
}
