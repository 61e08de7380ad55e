//! Identity-rotation removal.

use alsvin_ir::Circuit;

use crate::error::CompileResult;
use crate::pass::Pass;

use super::EPSILON;

/// Drops rotation gates whose angle is numerically zero.
///
/// `RX/RY/RZ(θ)` with `|θ| < 1e-10` is the identity up to tolerance, as is
/// the explicit `id` gate.
pub struct IdentityRemoval;

impl Pass for IdentityRemoval {
    fn name(&self) -> &'static str {
        "IdentityRemoval"
    }

    fn run(&self, circuit: &mut Circuit) -> CompileResult<()> {
        let kept: Vec<_> = circuit
            .gates()
            .iter()
            .filter(|op| {
                if op.gate.name() == "id" {
                    return false;
                }
                match op.gate.rotation() {
                    Some((_, angle)) => angle.abs() >= EPSILON,
                    None => true,
                }
            })
            .cloned()
            .collect();

        if kept.len() != circuit.gate_count() {
            *circuit = circuit.with_gates(kept)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_zero_rotations() {
        let mut circuit = Circuit::new("test", 2);
        circuit
            .rx(1e-12, 0)
            .unwrap()
            .h(0)
            .unwrap()
            .rz(0.0, 1)
            .unwrap()
            .ry(0.5, 1)
            .unwrap();

        IdentityRemoval.run(&mut circuit).unwrap();

        assert_eq!(circuit.gate_count(), 2);
        assert_eq!(circuit.gates()[0].gate.name(), "h");
        assert_eq!(circuit.gates()[1].gate.name(), "ry");
    }

    #[test]
    fn test_keeps_small_but_nonzero() {
        let mut circuit = Circuit::new("test", 1);
        circuit.rx(1e-9, 0).unwrap();
        IdentityRemoval.run(&mut circuit).unwrap();
        assert_eq!(circuit.gate_count(), 1);
    }

    #[test]
    fn test_removes_explicit_identity() {
        let mut circuit = Circuit::new("test", 1);
        circuit.push(alsvin_ir::Gate::I, [0]).unwrap();
        IdentityRemoval.run(&mut circuit).unwrap();
        assert_eq!(circuit.gate_count(), 0);
    }
}
