//! IonQ gate-list wire format.
//!
//! Circuits travel as a flat JSON gate list. IonQ names differ from the
//! internal ones (`cnot`, `si`, `v`), rotations carry a `rotation` field,
//! and controlled gates split `control`/`target`.

use serde::{Deserialize, Serialize};

use alsvin_hal::{HalError, HalResult};
use alsvin_ir::{Circuit, Gate};

/// One gate in the wire program.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WireGate {
    pub gate: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub targets: Option<Vec<usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controls: Option<Vec<usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
}

impl WireGate {
    fn plain(gate: &str, target: usize) -> Self {
        Self {
            gate: gate.to_string(),
            target: Some(target),
            targets: None,
            control: None,
            controls: None,
            rotation: None,
        }
    }

    fn rotated(gate: &str, target: usize, rotation: f64) -> Self {
        Self {
            rotation: Some(rotation),
            ..Self::plain(gate, target)
        }
    }

    fn controlled(gate: &str, control: usize, target: usize) -> Self {
        Self {
            control: Some(control),
            ..Self::plain(gate, target)
        }
    }
}

/// The circuit body of a job submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireCircuit {
    pub format: String,
    pub qubits: usize,
    pub circuit: Vec<WireGate>,
}

/// Serialize a circuit into the gate-list format.
///
/// Only gates the trap executes (or that the service decomposes itself)
/// are representable; anything else must be decomposed beforehand.
pub fn to_wire(circuit: &Circuit) -> HalResult<WireCircuit> {
    let mut gates = vec![];
    for op in circuit.gates() {
        let q = &op.qubits;
        let wire = match &op.gate {
            Gate::I => continue,
            Gate::X => WireGate::plain("x", q[0]),
            Gate::Y => WireGate::plain("y", q[0]),
            Gate::Z => WireGate::plain("z", q[0]),
            Gate::H => WireGate::plain("h", q[0]),
            Gate::S => WireGate::plain("s", q[0]),
            Gate::Sdg => WireGate::plain("si", q[0]),
            Gate::T => WireGate::plain("t", q[0]),
            Gate::Tdg => WireGate::plain("ti", q[0]),
            Gate::SX => WireGate::plain("v", q[0]),
            Gate::SXdg => WireGate::plain("vi", q[0]),
            Gate::Rx(theta) => WireGate::rotated("rx", q[0], *theta),
            Gate::Ry(theta) => WireGate::rotated("ry", q[0], *theta),
            Gate::Rz(theta) => WireGate::rotated("rz", q[0], *theta),
            Gate::P(theta) => WireGate::rotated("rz", q[0], *theta),
            Gate::CX => WireGate::controlled("cnot", q[0], q[1]),
            Gate::Swap => WireGate {
                gate: "swap".to_string(),
                target: None,
                targets: Some(vec![q[0], q[1]]),
                control: None,
                controls: None,
                rotation: None,
            },
            Gate::Rxx(theta) => WireGate {
                gate: "xx".to_string(),
                target: None,
                targets: Some(vec![q[0], q[1]]),
                control: None,
                controls: None,
                rotation: Some(*theta),
            },
            Gate::Ryy(theta) => WireGate {
                gate: "yy".to_string(),
                target: None,
                targets: Some(vec![q[0], q[1]]),
                control: None,
                controls: None,
                rotation: Some(*theta),
            },
            Gate::Rzz(theta) => WireGate {
                gate: "zz".to_string(),
                target: None,
                targets: Some(vec![q[0], q[1]]),
                control: None,
                controls: None,
                rotation: Some(*theta),
            },
            Gate::CCX => WireGate {
                gate: "cnot".to_string(),
                target: Some(q[2]),
                targets: None,
                control: None,
                controls: Some(vec![q[0], q[1]]),
                rotation: None,
            },
            other => {
                return Err(HalError::InvalidCircuit(format!(
                    "gate {} has no gate-list representation; decompose first",
                    other.name()
                )));
            }
        };
        gates.push(wire);
    }

    Ok(WireCircuit {
        format: "ionq.circuit.v0".to_string(),
        qubits: circuit.num_qubits(),
        circuit: gates,
    })
}
