//! Commutation-based depth reduction.

use alsvin_ir::Circuit;

use crate::error::CompileResult;
use crate::pass::Pass;

/// Reorders gates into earliest-layer order.
///
/// Each gate is scheduled at the first layer in which none of its qubits
/// has been used; gates are then emitted layer by layer with the original
/// index breaking ties. Only gates on disjoint qubits swap relative order,
/// and those always commute, so semantics are untouched while depth can
/// only shrink.
pub struct CommuteReorder;

impl Pass for CommuteReorder {
    fn name(&self) -> &'static str {
        "CommuteReorder"
    }

    fn run(&self, circuit: &mut Circuit) -> CompileResult<()> {
        let order: Vec<usize> = circuit.layers().into_iter().flatten().collect();

        let already_sorted = order.windows(2).all(|w| w[0] < w[1]);
        if already_sorted {
            return Ok(());
        }

        let gates = circuit.gates();
        let reordered: Vec<_> = order.into_iter().map(|idx| gates[idx].clone()).collect();
        *circuit = circuit.with_gates(reordered)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alsvin_ir::TOLERANCE;

    #[test]
    fn test_reorder_pulls_gates_forward() {
        // CX(0,1), H(0), X(2): the X belongs in the first layer, so it is
        // emitted before the H while semantics stay identical.
        let mut circuit = Circuit::new("test", 3);
        circuit.cx(0, 1).unwrap().h(0).unwrap().x(2).unwrap();

        let before = circuit.unitary().unwrap();
        CommuteReorder.run(&mut circuit).unwrap();
        let after = circuit.unitary().unwrap();

        assert!(before.approx_eq_up_to_global_phase(&after, TOLERANCE));
        let names: Vec<_> = circuit.gates().iter().map(|op| op.gate.name()).collect();
        assert_eq!(names, vec!["cx", "x", "h"]);
    }

    #[test]
    fn test_stable_on_equal_depth() {
        let mut circuit = Circuit::new("test", 2);
        circuit.h(0).unwrap().h(1).unwrap();
        let before: Vec<_> = circuit.gates().to_vec();

        CommuteReorder.run(&mut circuit).unwrap();

        assert_eq!(circuit.gates(), before.as_slice());
    }

    #[test]
    fn test_dependent_order_preserved() {
        let mut circuit = Circuit::new("test", 2);
        circuit.h(0).unwrap().cx(0, 1).unwrap().x(1).unwrap();
        CommuteReorder.run(&mut circuit).unwrap();

        let names: Vec<_> = circuit.gates().iter().map(|op| op.gate.name()).collect();
        assert_eq!(names, vec!["h", "cx", "x"]);
    }
}
