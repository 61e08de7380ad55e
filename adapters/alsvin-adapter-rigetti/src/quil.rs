//! Quil program emission.
//!
//! Serializes circuits into Quil text: a `DECLARE` for the readout
//! register, one instruction per line, `MEASURE q ro[c]` at the end.
//! Parameters print with shortest round-trip float formatting.

use alsvin_hal::{HalError, HalResult};
use alsvin_ir::{Circuit, Gate};

/// Serialize a circuit into a Quil program.
pub fn to_quil(circuit: &Circuit) -> HalResult<String> {
    let mut program = String::new();

    let num_clbits = circuit.num_clbits();
    if num_clbits > 0 {
        program.push_str(&format!("DECLARE ro BIT[{num_clbits}]\n"));
    }

    for op in circuit.gates() {
        let q = &op.qubits;
        let line = match &op.gate {
            Gate::I => format!("I {}", q[0]),
            Gate::X => format!("X {}", q[0]),
            Gate::Y => format!("Y {}", q[0]),
            Gate::Z => format!("Z {}", q[0]),
            Gate::H => format!("H {}", q[0]),
            Gate::S => format!("S {}", q[0]),
            Gate::Sdg => format!("DAGGER S {}", q[0]),
            Gate::T => format!("T {}", q[0]),
            Gate::Tdg => format!("DAGGER T {}", q[0]),
            Gate::Rx(theta) => format!("RX({theta}) {}", q[0]),
            Gate::Ry(theta) => format!("RY({theta}) {}", q[0]),
            Gate::Rz(theta) => format!("RZ({theta}) {}", q[0]),
            Gate::P(theta) => format!("PHASE({theta}) {}", q[0]),
            Gate::CX => format!("CNOT {} {}", q[0], q[1]),
            Gate::CY => format!("CONTROLLED Y {} {}", q[0], q[1]),
            Gate::CZ => format!("CZ {} {}", q[0], q[1]),
            Gate::Swap => format!("SWAP {} {}", q[0], q[1]),
            Gate::CP(theta) => format!("CPHASE({theta}) {} {}", q[0], q[1]),
            Gate::CCX => format!("CCNOT {} {} {}", q[0], q[1], q[2]),
            Gate::CSwap => format!("CSWAP {} {} {}", q[0], q[1], q[2]),
            other => {
                return Err(HalError::InvalidCircuit(format!(
                    "gate {} has no Quil representation; decompose first",
                    other.name()
                )));
            }
        };
        program.push_str(&line);
        program.push('\n');
    }

    for m in circuit.measurements() {
        program.push_str(&format!("MEASURE {} ro[{}]\n", m.qubit, m.clbit));
    }

    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_bell_program() {
        let circuit = Circuit::bell().unwrap();
        let quil = to_quil(&circuit).unwrap();

        let expected = "DECLARE ro BIT[2]\nH 0\nCNOT 0 1\nMEASURE 0 ro[0]\nMEASURE 1 ro[1]\n";
        assert_eq!(quil, expected);
    }

    #[test]
    fn test_rotation_parameters() {
        let mut circuit = Circuit::new("test", 1);
        circuit.rx(PI / 2.0, 0).unwrap();
        let quil = to_quil(&circuit).unwrap();
        assert!(quil.contains("RX(1.5707963267948966) 0"));
    }

    #[test]
    fn test_no_measurements_no_declare() {
        let mut circuit = Circuit::new("test", 1);
        circuit.h(0).unwrap();
        let quil = to_quil(&circuit).unwrap();
        assert!(!quil.contains("DECLARE"));
    }

    #[test]
    fn test_dagger_modifier() {
        let mut circuit = Circuit::new("test", 1);
        circuit.sdg(0).unwrap();
        let quil = to_quil(&circuit).unwrap();
        assert!(quil.contains("DAGGER S 0"));
    }

    #[test]
    fn test_unsupported_gate_rejected() {
        let mut circuit = Circuit::new("test", 2);
        circuit.push(Gate::Rxx(0.5), [0, 1]).unwrap();
        assert!(matches!(
            to_quil(&circuit),
            Err(HalError::InvalidCircuit(_))
        ));
    }
}
