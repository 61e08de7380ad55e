//! Adjacent inverse-pair cancellation.

use alsvin_ir::Circuit;

use crate::error::CompileResult;
use crate::pass::Pass;

/// Cancels adjacent inverse pairs.
///
/// For each gate, the scan skips forward past gates on disjoint qubits;
/// if the first gate on an overlapping qubit has the same name, the same
/// operand order, and parameters summing to zero componentwise, both are
/// dropped. The pass repeats until no pair is found, so cancellations
/// exposed by earlier removals (e.g. `X H H X`) are picked up too.
pub struct CancelInverses;

impl CancelInverses {
    /// One sweep over the sequence; returns the indices to drop.
    fn find_cancellable_pairs(circuit: &Circuit) -> Vec<(usize, usize)> {
        let gates = circuit.gates();
        let mut removed = vec![false; gates.len()];
        let mut pairs = vec![];

        for i in 0..gates.len() {
            if removed[i] {
                continue;
            }
            for j in (i + 1)..gates.len() {
                if removed[j] {
                    continue;
                }
                let disjoint = gates[i]
                    .qubits
                    .iter()
                    .all(|q| !gates[j].qubits.contains(q));
                if disjoint {
                    continue;
                }

                // First gate on an overlapping qubit decides the outcome.
                if gates[i].qubits == gates[j].qubits
                    && gates[i].gate.cancels_with(&gates[j].gate)
                {
                    removed[i] = true;
                    removed[j] = true;
                    pairs.push((i, j));
                }
                break;
            }
        }

        pairs
    }
}

impl Pass for CancelInverses {
    fn name(&self) -> &'static str {
        "CancelInverses"
    }

    fn run(&self, circuit: &mut Circuit) -> CompileResult<()> {
        // Bounded to avoid pathological cases.
        const MAX_ITERATIONS: usize = 100;
        for _ in 0..MAX_ITERATIONS {
            let pairs = Self::find_cancellable_pairs(circuit);
            if pairs.is_empty() {
                break;
            }
            let mut drop = vec![false; circuit.gate_count()];
            for (i, j) in pairs {
                drop[i] = true;
                drop[j] = true;
            }
            let kept: Vec<_> = circuit
                .gates()
                .iter()
                .enumerate()
                .filter(|(idx, _)| !drop[*idx])
                .map(|(_, op)| op.clone())
                .collect();
            *circuit = circuit.with_gates(kept)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_cancel_hh() {
        let mut circuit = Circuit::new("test", 1);
        circuit.h(0).unwrap().h(0).unwrap();
        CancelInverses.run(&mut circuit).unwrap();
        assert_eq!(circuit.gate_count(), 0);
    }

    #[test]
    fn test_cancel_cx_pair() {
        // H H CX CX X collapses to a lone X.
        let mut circuit = Circuit::new("test", 2);
        circuit
            .h(0)
            .unwrap()
            .h(0)
            .unwrap()
            .cx(0, 1)
            .unwrap()
            .cx(0, 1)
            .unwrap()
            .x(0)
            .unwrap();

        CancelInverses.run(&mut circuit).unwrap();

        assert_eq!(circuit.gate_count(), 1);
        assert_eq!(circuit.gates()[0].gate.name(), "x");
        assert_eq!(circuit.gates()[0].qubits, vec![0]);
    }

    #[test]
    fn test_cancel_skips_disjoint_qubits() {
        // H(0), X(1), H(0): the X on another qubit does not block the pair.
        let mut circuit = Circuit::new("test", 2);
        circuit.h(0).unwrap().x(1).unwrap().h(0).unwrap();
        CancelInverses.run(&mut circuit).unwrap();
        assert_eq!(circuit.gate_count(), 1);
        assert_eq!(circuit.gates()[0].gate.name(), "x");
    }

    #[test]
    fn test_intervening_gate_blocks() {
        let mut circuit = Circuit::new("test", 1);
        circuit.h(0).unwrap().x(0).unwrap().h(0).unwrap();
        CancelInverses.run(&mut circuit).unwrap();
        assert_eq!(circuit.gate_count(), 3);
    }

    #[test]
    fn test_nested_pairs_need_iteration() {
        // X H H X collapses fully across sweeps.
        let mut circuit = Circuit::new("test", 1);
        circuit.x(0).unwrap().h(0).unwrap().h(0).unwrap().x(0).unwrap();
        CancelInverses.run(&mut circuit).unwrap();
        assert_eq!(circuit.gate_count(), 0);
    }

    #[test]
    fn test_rotations_summing_to_zero() {
        let mut circuit = Circuit::new("test", 1);
        circuit.rz(PI / 6.0, 0).unwrap().rz(-PI / 6.0, 0).unwrap();
        CancelInverses.run(&mut circuit).unwrap();
        assert_eq!(circuit.gate_count(), 0);
    }

    #[test]
    fn test_reversed_operands_do_not_cancel() {
        let mut circuit = Circuit::new("test", 2);
        circuit.cx(0, 1).unwrap().cx(1, 0).unwrap();
        CancelInverses.run(&mut circuit).unwrap();
        assert_eq!(circuit.gate_count(), 2);
    }
}
