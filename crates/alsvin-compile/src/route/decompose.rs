//! Basis-gate decomposition.
//!
//! Rewrites gates outside a device's native gate set into it, using a fixed
//! rewrite table. Every rewrite bottoms out in `{rx, rz}` plus whichever of
//! `cx`/`cz` the target supports, so any basis containing those can express
//! the full gate set. Each substitution preserves the unitary up to global
//! phase.

use std::f64::consts::PI;

use alsvin_ir::{Circuit, Gate, GateOp};

use crate::error::{CompileError, CompileResult};

/// The set of gate names a device executes natively.
#[derive(Debug, Clone)]
pub struct BasisGates {
    gates: Vec<String>,
}

impl BasisGates {
    /// Create a basis from gate names.
    pub fn new(gates: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            gates: gates.into_iter().map(Into::into).collect(),
        }
    }

    /// Check if a gate is in the basis.
    pub fn contains(&self, gate: &str) -> bool {
        self.gates.iter().any(|g| g == gate)
    }

    /// Get the basis gate names.
    pub fn gates(&self) -> &[String] {
        &self.gates
    }

    /// A basis covering every standard gate.
    pub fn universal() -> Self {
        Self::new([
            "id", "x", "y", "z", "h", "s", "sdg", "t", "tdg", "sx", "sxdg", "rx", "ry", "rz",
            "p", "u", "cx", "cy", "cz", "ch", "swap", "crx", "cry", "crz", "cp", "rxx", "ryy",
            "rzz", "ccx", "cswap",
        ])
    }

    /// Superconducting-style basis: RZ + RX + CX.
    pub fn rx_rz_cx() -> Self {
        Self::new(["rx", "rz", "cx"])
    }

    /// CZ-coupled basis: RZ + RX + CZ.
    pub fn rx_rz_cz() -> Self {
        Self::new(["rx", "rz", "cz"])
    }
}

/// Rewrite every gate of the circuit into the target basis.
pub fn decompose_to_basis(circuit: &Circuit, basis: &BasisGates) -> CompileResult<Circuit> {
    let mut out: Vec<GateOp> = vec![];
    for op in circuit.gates() {
        rewrite(&op.gate, &op.qubits, basis, &mut out)?;
    }
    Ok(circuit.with_gates(out)?)
}

/// Append the basis rewrite of one placed gate to `out`.
///
/// Sequences are in circuit order: the first pushed gate applies first.
fn rewrite(
    gate: &Gate,
    qubits: &[usize],
    basis: &BasisGates,
    out: &mut Vec<GateOp>,
) -> CompileResult<()> {
    if basis.contains(gate.name()) {
        out.push(GateOp {
            gate: gate.clone(),
            qubits: qubits.to_vec(),
        });
        return Ok(());
    }

    let q0 = qubits[0];
    let emit = |gate: Gate, qubits: &[usize], out: &mut Vec<GateOp>| -> CompileResult<()> {
        rewrite(&gate, qubits, basis, out)
    };

    match gate {
        Gate::I => {}

        // Paulis and axis roots in terms of rotations (up to global phase).
        Gate::X => emit(Gate::Rx(PI), &[q0], out)?,
        Gate::Z => emit(Gate::Rz(PI), &[q0], out)?,
        Gate::Y => {
            // Y = RZ(π) · RX(π)
            emit(Gate::Rx(PI), &[q0], out)?;
            emit(Gate::Rz(PI), &[q0], out)?;
        }
        Gate::S => emit(Gate::Rz(PI / 2.0), &[q0], out)?,
        Gate::Sdg => emit(Gate::Rz(-PI / 2.0), &[q0], out)?,
        Gate::T => emit(Gate::Rz(PI / 4.0), &[q0], out)?,
        Gate::Tdg => emit(Gate::Rz(-PI / 4.0), &[q0], out)?,
        Gate::SX => emit(Gate::Rx(PI / 2.0), &[q0], out)?,
        Gate::SXdg => emit(Gate::Rx(-PI / 2.0), &[q0], out)?,
        Gate::P(theta) => emit(Gate::Rz(*theta), &[q0], out)?,

        // H = RZ(π/2) · RX(π/2) · RZ(π/2)
        Gate::H => {
            emit(Gate::Rz(PI / 2.0), &[q0], out)?;
            emit(Gate::Rx(PI / 2.0), &[q0], out)?;
            emit(Gate::Rz(PI / 2.0), &[q0], out)?;
        }

        // Ry(θ) = RZ(π/2) · RX(θ) · RZ(−π/2)
        Gate::Ry(theta) => {
            emit(Gate::Rz(-PI / 2.0), &[q0], out)?;
            emit(Gate::Rx(*theta), &[q0], out)?;
            emit(Gate::Rz(PI / 2.0), &[q0], out)?;
        }

        // U(θ, φ, λ) = RZ(φ) · RY(θ) · RZ(λ)
        Gate::U(theta, phi, lambda) => {
            emit(Gate::Rz(*lambda), &[q0], out)?;
            emit(Gate::Ry(*theta), &[q0], out)?;
            emit(Gate::Rz(*phi), &[q0], out)?;
        }

        Gate::Rx(_) | Gate::Rz(_) => {
            return Err(CompileError::GateNotInBasis(gate.name().to_string()));
        }

        // Two-qubit entanglers: whichever of CX/CZ is native carries the
        // other through H conjugation on the target.
        Gate::CX => {
            let q1 = qubits[1];
            if basis.contains("cz") {
                emit(Gate::H, &[q1], out)?;
                emit(Gate::CZ, &[q0, q1], out)?;
                emit(Gate::H, &[q1], out)?;
            } else {
                return Err(CompileError::GateNotInBasis("cx".to_string()));
            }
        }
        Gate::CZ => {
            let q1 = qubits[1];
            if basis.contains("cx") {
                emit(Gate::H, &[q1], out)?;
                emit(Gate::CX, &[q0, q1], out)?;
                emit(Gate::H, &[q1], out)?;
            } else {
                return Err(CompileError::GateNotInBasis("cz".to_string()));
            }
        }

        // CY = (I ⊗ S) · CX · (I ⊗ S†)
        Gate::CY => {
            let q1 = qubits[1];
            emit(Gate::Sdg, &[q1], out)?;
            emit(Gate::CX, &[q0, q1], out)?;
            emit(Gate::S, &[q1], out)?;
        }

        // CH via H = V X V† with V = Ry(−π/4)
        Gate::CH => {
            let q1 = qubits[1];
            emit(Gate::Ry(PI / 4.0), &[q1], out)?;
            emit(Gate::CX, &[q0, q1], out)?;
            emit(Gate::Ry(-PI / 4.0), &[q1], out)?;
        }

        // SWAP = CX(a,b) · CX(b,a) · CX(a,b)
        Gate::Swap => {
            let q1 = qubits[1];
            emit(Gate::CX, &[q0, q1], out)?;
            emit(Gate::CX, &[q1, q0], out)?;
            emit(Gate::CX, &[q0, q1], out)?;
        }

        // CRz(θ) = Rz(θ/2)(b) · CX · Rz(−θ/2)(b) · CX
        Gate::CRz(theta) => {
            let q1 = qubits[1];
            emit(Gate::Rz(theta / 2.0), &[q1], out)?;
            emit(Gate::CX, &[q0, q1], out)?;
            emit(Gate::Rz(-theta / 2.0), &[q1], out)?;
            emit(Gate::CX, &[q0, q1], out)?;
        }

        // CRx through Rx = H · Rz · H on the target.
        Gate::CRx(theta) => {
            let q1 = qubits[1];
            emit(Gate::H, &[q1], out)?;
            emit(Gate::CRz(*theta), &[q0, q1], out)?;
            emit(Gate::H, &[q1], out)?;
        }

        // CRy through Ry = Rx(−π/2) · Rz · Rx(π/2) on the target.
        Gate::CRy(theta) => {
            let q1 = qubits[1];
            emit(Gate::Rx(PI / 2.0), &[q1], out)?;
            emit(Gate::CRz(*theta), &[q0, q1], out)?;
            emit(Gate::Rx(-PI / 2.0), &[q1], out)?;
        }

        // CP(θ) = P(θ/2)(a) · CX · P(−θ/2)(b) · CX · P(θ/2)(b)
        Gate::CP(theta) => {
            let q1 = qubits[1];
            emit(Gate::P(theta / 2.0), &[q0], out)?;
            emit(Gate::CX, &[q0, q1], out)?;
            emit(Gate::P(-theta / 2.0), &[q1], out)?;
            emit(Gate::CX, &[q0, q1], out)?;
            emit(Gate::P(theta / 2.0), &[q1], out)?;
        }

        // RZZ(θ) = CX · Rz(θ)(b) · CX
        Gate::Rzz(theta) => {
            let q1 = qubits[1];
            emit(Gate::CX, &[q0, q1], out)?;
            emit(Gate::Rz(*theta), &[q1], out)?;
            emit(Gate::CX, &[q0, q1], out)?;
        }

        // RXX/RYY conjugate RZZ into the X/Y bases.
        Gate::Rxx(theta) => {
            let q1 = qubits[1];
            emit(Gate::H, &[q0], out)?;
            emit(Gate::H, &[q1], out)?;
            emit(Gate::Rzz(*theta), &[q0, q1], out)?;
            emit(Gate::H, &[q0], out)?;
            emit(Gate::H, &[q1], out)?;
        }
        Gate::Ryy(theta) => {
            let q1 = qubits[1];
            emit(Gate::Rx(PI / 2.0), &[q0], out)?;
            emit(Gate::Rx(PI / 2.0), &[q1], out)?;
            emit(Gate::Rzz(*theta), &[q0, q1], out)?;
            emit(Gate::Rx(-PI / 2.0), &[q0], out)?;
            emit(Gate::Rx(-PI / 2.0), &[q1], out)?;
        }

        // Standard 6-CX Toffoli decomposition.
        Gate::CCX => {
            let (a, b, c) = (qubits[0], qubits[1], qubits[2]);
            emit(Gate::H, &[c], out)?;
            emit(Gate::CX, &[b, c], out)?;
            emit(Gate::Tdg, &[c], out)?;
            emit(Gate::CX, &[a, c], out)?;
            emit(Gate::T, &[c], out)?;
            emit(Gate::CX, &[b, c], out)?;
            emit(Gate::Tdg, &[c], out)?;
            emit(Gate::CX, &[a, c], out)?;
            emit(Gate::T, &[b], out)?;
            emit(Gate::T, &[c], out)?;
            emit(Gate::H, &[c], out)?;
            emit(Gate::CX, &[a, b], out)?;
            emit(Gate::T, &[a], out)?;
            emit(Gate::Tdg, &[b], out)?;
            emit(Gate::CX, &[a, b], out)?;
        }

        // CSWAP = CX(c,b) · CCX(a,b,c) · CX(c,b)
        Gate::CSwap => {
            let (a, b, c) = (qubits[0], qubits[1], qubits[2]);
            emit(Gate::CX, &[c, b], out)?;
            emit(Gate::CCX, &[a, b, c], out)?;
            emit(Gate::CX, &[c, b], out)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alsvin_ir::TOLERANCE;

    fn assert_equivalent(original: &Circuit, decomposed: &Circuit) {
        let a = original.unitary().unwrap();
        let b = decomposed.unitary().unwrap();
        assert!(
            a.approx_eq_up_to_global_phase(&b, TOLERANCE),
            "decomposition changed circuit semantics"
        );
    }

    #[test]
    fn test_native_gates_preserved() {
        let mut circuit = Circuit::new("test", 2);
        circuit.rx(0.5, 0).unwrap().cx(0, 1).unwrap();
        let decomposed = decompose_to_basis(&circuit, &BasisGates::rx_rz_cx()).unwrap();
        assert_eq!(decomposed.gates(), circuit.gates());
    }

    #[test]
    fn test_y_and_z_rewrites() {
        let mut circuit = Circuit::new("test", 1);
        circuit.y(0).unwrap().z(0).unwrap();
        let decomposed = decompose_to_basis(&circuit, &BasisGates::rx_rz_cx()).unwrap();

        let names: Vec<_> = decomposed.gates().iter().map(|op| op.gate.name()).collect();
        assert_eq!(names, vec!["rx", "rz", "rz"]);
        assert_equivalent(&circuit, &decomposed);
    }

    #[test]
    fn test_swap_rewrite() {
        let mut circuit = Circuit::new("test", 2);
        circuit.swap(0, 1).unwrap();
        let decomposed = decompose_to_basis(&circuit, &BasisGates::rx_rz_cx()).unwrap();

        assert_eq!(decomposed.gate_count(), 3);
        assert_eq!(decomposed.gates()[0].qubits, vec![0, 1]);
        assert_eq!(decomposed.gates()[1].qubits, vec![1, 0]);
        assert_eq!(decomposed.gates()[2].qubits, vec![0, 1]);
        assert_equivalent(&circuit, &decomposed);
    }

    #[test]
    fn test_single_qubit_rewrites_equivalent() {
        for gate in [
            Gate::X,
            Gate::Y,
            Gate::Z,
            Gate::H,
            Gate::S,
            Gate::Sdg,
            Gate::T,
            Gate::SX,
            Gate::SXdg,
            Gate::Ry(0.7),
            Gate::P(1.3),
            Gate::U(0.4, -0.9, 2.2),
        ] {
            let mut circuit = Circuit::new("test", 1);
            circuit.push(gate.clone(), [0]).unwrap();
            let decomposed = decompose_to_basis(&circuit, &BasisGates::rx_rz_cx()).unwrap();
            for op in decomposed.gates() {
                assert!(matches!(op.gate, Gate::Rx(_) | Gate::Rz(_)));
            }
            assert_equivalent(&circuit, &decomposed);
        }
    }

    #[test]
    fn test_two_qubit_rewrites_equivalent() {
        for gate in [
            Gate::CY,
            Gate::CZ,
            Gate::CH,
            Gate::Swap,
            Gate::CRx(0.8),
            Gate::CRy(-1.1),
            Gate::CRz(0.6),
            Gate::CP(2.4),
            Gate::Rxx(0.5),
            Gate::Ryy(1.2),
            Gate::Rzz(-0.7),
        ] {
            let mut circuit = Circuit::new("test", 2);
            circuit.push(gate.clone(), [0, 1]).unwrap();
            let decomposed = decompose_to_basis(&circuit, &BasisGates::rx_rz_cx()).unwrap();
            assert_equivalent(&circuit, &decomposed);
        }
    }

    #[test]
    fn test_three_qubit_rewrites_equivalent() {
        for gate in [Gate::CCX, Gate::CSwap] {
            let mut circuit = Circuit::new("test", 3);
            circuit.push(gate.clone(), [0, 1, 2]).unwrap();
            let decomposed = decompose_to_basis(&circuit, &BasisGates::rx_rz_cx()).unwrap();
            assert_equivalent(&circuit, &decomposed);
        }
    }

    #[test]
    fn test_cx_to_cz_basis() {
        let mut circuit = Circuit::new("test", 2);
        circuit.cx(0, 1).unwrap();
        let decomposed = decompose_to_basis(&circuit, &BasisGates::rx_rz_cz()).unwrap();

        assert!(decomposed.gates().iter().any(|op| op.gate.name() == "cz"));
        assert_equivalent(&circuit, &decomposed);
    }

    #[test]
    fn test_missing_entangler_fails() {
        let mut circuit = Circuit::new("test", 2);
        circuit.cx(0, 1).unwrap();
        let result = decompose_to_basis(&circuit, &BasisGates::new(["rx", "rz"]));
        assert!(matches!(result, Err(CompileError::GateNotInBasis(_))));
    }
}
