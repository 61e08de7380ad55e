//! QASM 2.0 emitter for serializing circuits.

use alsvin_ir::Circuit;

/// Emit a circuit as `OPENQASM 2.0` source.
///
/// The output declares one quantum register `q` and, when the circuit
/// measures anything, one classical register `c`. Parameters are printed
/// with Rust's shortest round-trip float formatting, so parsing the output
/// reproduces them exactly.
pub fn emit(circuit: &Circuit) -> String {
    let mut out = String::new();
    out.push_str("OPENQASM 2.0;\n");
    out.push_str("include \"qelib1.inc\";\n");

    if circuit.num_qubits() > 0 {
        out.push_str(&format!("qreg q[{}];\n", circuit.num_qubits()));
    }
    let num_clbits = circuit.num_clbits();
    if num_clbits > 0 {
        out.push_str(&format!("creg c[{num_clbits}];\n"));
    }

    for op in circuit.gates() {
        let operands = op
            .qubits
            .iter()
            .map(|q| format!("q[{q}]"))
            .collect::<Vec<_>>()
            .join(",");
        let params = op.gate.params();
        if params.is_empty() {
            out.push_str(&format!("{} {operands};\n", op.gate.name()));
        } else {
            let params = params
                .iter()
                .map(|p| format!("{p}"))
                .collect::<Vec<_>>()
                .join(",");
            out.push_str(&format!("{}({params}) {operands};\n", op.gate.name()));
        }
    }

    for m in circuit.measurements() {
        out.push_str(&format!("measure q[{}] -> c[{}];\n", m.qubit, m.clbit));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use alsvin_ir::Gate;
    use std::f64::consts::PI;

    #[test]
    fn test_emit_bell() {
        let circuit = Circuit::bell().unwrap();
        let qasm = emit(&circuit);

        assert!(qasm.starts_with("OPENQASM 2.0;\ninclude \"qelib1.inc\";\n"));
        assert!(qasm.contains("qreg q[2];"));
        assert!(qasm.contains("creg c[2];"));
        assert!(qasm.contains("h q[0];"));
        assert!(qasm.contains("cx q[0],q[1];"));
        assert!(qasm.contains("measure q[0] -> c[0];"));
    }

    #[test]
    fn test_emit_parameterized() {
        let mut circuit = Circuit::new("test", 1);
        circuit.rx(PI / 4.0, 0).unwrap();
        let qasm = emit(&circuit);
        assert!(qasm.contains("rx(0.7853981633974483) q[0];"));
    }

    #[test]
    fn test_roundtrip_preserves_gates() {
        let mut circuit = Circuit::new("test", 3);
        circuit
            .h(0)
            .unwrap()
            .rx(PI / 4.0, 1)
            .unwrap()
            .cx(0, 2)
            .unwrap()
            .u(0.3, -1.7, 2.9, 1)
            .unwrap()
            .ccx(0, 1, 2)
            .unwrap()
            .measure(2, 0)
            .unwrap();

        let parsed = parse(&emit(&circuit)).unwrap();

        assert_eq!(parsed.num_qubits(), circuit.num_qubits());
        assert_eq!(parsed.gate_count(), circuit.gate_count());
        for (a, b) in circuit.gates().iter().zip(parsed.gates()) {
            assert_eq!(a.gate.name(), b.gate.name());
            assert_eq!(a.qubits, b.qubits);
            for (pa, pb) in a.gate.params().iter().zip(b.gate.params()) {
                assert!((pa - pb).abs() < 1e-10);
            }
        }
        assert_eq!(parsed.measurements(), circuit.measurements());
    }

    #[test]
    fn test_roundtrip_negative_params() {
        let mut circuit = Circuit::new("test", 1);
        circuit.rz(-2.5, 0).unwrap().p(-PI, 0).unwrap();
        let parsed = parse(&emit(&circuit)).unwrap();
        assert_eq!(parsed.gates()[0].gate, Gate::Rz(-2.5));
        assert_eq!(parsed.gates()[1].gate, Gate::P(-PI));
    }

    #[test]
    fn test_emit_empty_circuit() {
        let circuit = Circuit::new("empty", 0);
        let qasm = emit(&circuit);
        assert!(qasm.starts_with("OPENQASM 2.0;"));
        assert!(!qasm.contains("qreg"));
    }
}
