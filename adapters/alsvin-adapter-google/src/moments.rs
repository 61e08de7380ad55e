//! Moment-based circuit serialization.
//!
//! The wire format groups simultaneous operations into moments, the same
//! layer rule the circuit model uses for depth: a gate lands in the first
//! moment where none of its qubits is busy.

use serde::{Deserialize, Serialize};

use alsvin_hal::{HalError, HalResult};
use alsvin_ir::Circuit;

/// One operation inside a moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireOp {
    pub gate: String,
    pub qubits: Vec<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<f64>,
}

/// A set of operations executing simultaneously.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMoment {
    pub operations: Vec<WireOp>,
}

/// The moment program plus its measurement map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireProgram {
    pub qubits: usize,
    pub moments: Vec<WireMoment>,
    /// `(qubit, classical bit)` pairs measured at the end.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub measurements: Vec<(usize, usize)>,
}

/// Serialize a circuit into moments.
pub fn to_moments(circuit: &Circuit) -> HalResult<WireProgram> {
    if circuit.gates().iter().any(|op| op.qubits.len() > 2) {
        return Err(HalError::InvalidCircuit(
            "three-qubit gates have no moment representation; decompose first".into(),
        ));
    }

    let gates = circuit.gates();
    let moments = circuit
        .layers()
        .into_iter()
        .map(|layer| WireMoment {
            operations: layer
                .into_iter()
                .map(|idx| {
                    let op = &gates[idx];
                    WireOp {
                        gate: op.gate.name().to_string(),
                        qubits: op.qubits.clone(),
                        params: op.gate.params(),
                    }
                })
                .collect(),
        })
        .collect();

    Ok(WireProgram {
        qubits: circuit.num_qubits(),
        moments,
        measurements: circuit
            .measurements()
            .iter()
            .map(|m| (m.qubit, m.clbit))
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bell_moments() {
        let circuit = Circuit::bell().unwrap();
        let program = to_moments(&circuit).unwrap();

        assert_eq!(program.qubits, 2);
        assert_eq!(program.moments.len(), 2);
        assert_eq!(program.moments[0].operations[0].gate, "h");
        assert_eq!(program.moments[1].operations[0].gate, "cx");
        assert_eq!(program.measurements, vec![(0, 0), (1, 1)]);
    }

    #[test]
    fn test_parallel_gates_share_moment() {
        let mut circuit = Circuit::new("test", 3);
        circuit.h(0).unwrap().h(1).unwrap().x(2).unwrap().cx(0, 1).unwrap();

        let program = to_moments(&circuit).unwrap();
        assert_eq!(program.moments.len(), 2);
        assert_eq!(program.moments[0].operations.len(), 3);
        assert_eq!(program.moments[1].operations.len(), 1);
    }

    #[test]
    fn test_params_serialized() {
        let mut circuit = Circuit::new("test", 1);
        circuit.rz(0.75, 0).unwrap();
        let program = to_moments(&circuit).unwrap();
        assert_eq!(program.moments[0].operations[0].params, vec![0.75]);
    }

    #[test]
    fn test_three_qubit_rejected() {
        let mut circuit = Circuit::new("test", 3);
        circuit.ccx(0, 1, 2).unwrap();
        assert!(matches!(
            to_moments(&circuit),
            Err(HalError::InvalidCircuit(_))
        ));
    }

    #[test]
    fn test_json_shape() {
        let mut circuit = Circuit::new("test", 2);
        circuit.h(0).unwrap();
        let json = serde_json::to_value(to_moments(&circuit).unwrap()).unwrap();
        assert_eq!(json["moments"][0]["operations"][0]["gate"], "h");
        assert_eq!(json["moments"][0]["operations"][0]["qubits"][0], 0);
        // Empty params are omitted from the wire form.
        assert!(
            json["moments"][0]["operations"][0]
                .get("params")
                .is_none()
        );
    }
}
