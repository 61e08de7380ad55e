//! High-level circuit builder API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::gate::Gate;
use crate::matrix::Unitary;

/// A gate placed on a tuple of qubits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateOp {
    /// The gate.
    pub gate: Gate,
    /// Target qubits, in gate-operand order (control before target).
    pub qubits: Vec<usize>,
}

/// A measurement of one qubit into one classical bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measurement {
    /// The measured qubit.
    pub qubit: usize,
    /// The classical bit receiving the outcome.
    pub clbit: usize,
}

/// Descriptive metadata attached to a circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitMetadata {
    /// Name of the circuit.
    pub name: String,
    /// Author, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Free-form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Tags for cataloguing.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
    /// Last-modification timestamp, bumped on every mutation.
    pub modified: DateTime<Utc>,
}

impl CircuitMetadata {
    fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            author: None,
            description: None,
            tags: vec![],
            created: now,
            modified: now,
        }
    }
}

/// Maximum width for materializing a full circuit unitary.
const MAX_UNITARY_QUBITS: usize = 10;

/// A quantum circuit: a fixed number of qubits, an ordered gate sequence,
/// and a list of measurements.
///
/// The gate sequence is append-only through the public API; the functional
/// operations (`slice`, `reverse`, `compose`, `power`) return new circuits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    num_qubits: usize,
    gates: Vec<GateOp>,
    measurements: Vec<Measurement>,
    metadata: CircuitMetadata,
}

impl Circuit {
    /// Create an empty circuit with the given number of qubits.
    pub fn new(name: impl Into<String>, num_qubits: usize) -> Self {
        Self {
            num_qubits,
            gates: vec![],
            measurements: vec![],
            metadata: CircuitMetadata::new(name),
        }
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Append a gate on the given qubits, validating arity and indices.
    pub fn push(&mut self, gate: Gate, qubits: impl Into<Vec<usize>>) -> IrResult<&mut Self> {
        let qubits = qubits.into();

        let expected = gate.num_qubits();
        if qubits.len() != expected {
            return Err(IrError::QubitCountMismatch {
                gate: gate.name().to_string(),
                expected,
                got: qubits.len(),
            });
        }
        for &q in &qubits {
            if q >= self.num_qubits {
                return Err(IrError::QubitOutOfRange {
                    qubit: q,
                    num_qubits: self.num_qubits,
                    gate: gate.name().to_string(),
                });
            }
        }
        for (idx, &q) in qubits.iter().enumerate() {
            if qubits[..idx].contains(&q) {
                return Err(IrError::DuplicateQubit {
                    qubit: q,
                    gate: gate.name().to_string(),
                });
            }
        }

        self.gates.push(GateOp { gate, qubits });
        self.metadata.modified = Utc::now();
        Ok(self)
    }

    /// Measure a qubit into a classical bit.
    pub fn measure(&mut self, qubit: usize, clbit: usize) -> IrResult<&mut Self> {
        if qubit >= self.num_qubits {
            return Err(IrError::MeasureOutOfRange {
                qubit,
                num_qubits: self.num_qubits,
            });
        }
        self.measurements.push(Measurement { qubit, clbit });
        self.metadata.modified = Utc::now();
        Ok(self)
    }

    /// Measure every qubit into the classical bit of the same index.
    pub fn measure_all(&mut self) -> IrResult<&mut Self> {
        for q in 0..self.num_qubits {
            self.measure(q, q)?;
        }
        Ok(self)
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: usize) -> IrResult<&mut Self> {
        self.push(Gate::H, [qubit])
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: usize) -> IrResult<&mut Self> {
        self.push(Gate::X, [qubit])
    }

    /// Apply Pauli-Y gate.
    pub fn y(&mut self, qubit: usize) -> IrResult<&mut Self> {
        self.push(Gate::Y, [qubit])
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, qubit: usize) -> IrResult<&mut Self> {
        self.push(Gate::Z, [qubit])
    }

    /// Apply S gate.
    pub fn s(&mut self, qubit: usize) -> IrResult<&mut Self> {
        self.push(Gate::S, [qubit])
    }

    /// Apply S-dagger gate.
    pub fn sdg(&mut self, qubit: usize) -> IrResult<&mut Self> {
        self.push(Gate::Sdg, [qubit])
    }

    /// Apply T gate.
    pub fn t(&mut self, qubit: usize) -> IrResult<&mut Self> {
        self.push(Gate::T, [qubit])
    }

    /// Apply T-dagger gate.
    pub fn tdg(&mut self, qubit: usize) -> IrResult<&mut Self> {
        self.push(Gate::Tdg, [qubit])
    }

    /// Apply Rx rotation gate.
    pub fn rx(&mut self, theta: f64, qubit: usize) -> IrResult<&mut Self> {
        self.push(Gate::Rx(theta), [qubit])
    }

    /// Apply Ry rotation gate.
    pub fn ry(&mut self, theta: f64, qubit: usize) -> IrResult<&mut Self> {
        self.push(Gate::Ry(theta), [qubit])
    }

    /// Apply Rz rotation gate.
    pub fn rz(&mut self, theta: f64, qubit: usize) -> IrResult<&mut Self> {
        self.push(Gate::Rz(theta), [qubit])
    }

    /// Apply phase gate.
    pub fn p(&mut self, theta: f64, qubit: usize) -> IrResult<&mut Self> {
        self.push(Gate::P(theta), [qubit])
    }

    /// Apply universal U gate.
    pub fn u(&mut self, theta: f64, phi: f64, lambda: f64, qubit: usize) -> IrResult<&mut Self> {
        self.push(Gate::U(theta, phi, lambda), [qubit])
    }

    // =========================================================================
    // Two- and three-qubit gates
    // =========================================================================

    /// Apply CNOT (CX) gate.
    pub fn cx(&mut self, control: usize, target: usize) -> IrResult<&mut Self> {
        self.push(Gate::CX, [control, target])
    }

    /// Apply CZ gate.
    pub fn cz(&mut self, control: usize, target: usize) -> IrResult<&mut Self> {
        self.push(Gate::CZ, [control, target])
    }

    /// Apply SWAP gate.
    pub fn swap(&mut self, q1: usize, q2: usize) -> IrResult<&mut Self> {
        self.push(Gate::Swap, [q1, q2])
    }

    /// Apply controlled-phase gate.
    pub fn cp(&mut self, theta: f64, control: usize, target: usize) -> IrResult<&mut Self> {
        self.push(Gate::CP(theta), [control, target])
    }

    /// Apply Toffoli (CCX) gate.
    pub fn ccx(&mut self, c1: usize, c2: usize, target: usize) -> IrResult<&mut Self> {
        self.push(Gate::CCX, [c1, c2, target])
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Circuit name.
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Circuit metadata.
    pub fn metadata(&self) -> &CircuitMetadata {
        &self.metadata
    }

    /// Mutable circuit metadata.
    pub fn metadata_mut(&mut self) -> &mut CircuitMetadata {
        &mut self.metadata
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// The gate sequence, in program order.
    pub fn gates(&self) -> &[GateOp] {
        &self.gates
    }

    /// The measurements, in program order.
    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    /// Number of gates.
    pub fn gate_count(&self) -> usize {
        self.gates.len()
    }

    /// Number of gates acting on two or more qubits.
    pub fn multi_qubit_gate_count(&self) -> usize {
        self.gates.iter().filter(|op| op.qubits.len() >= 2).count()
    }

    /// Number of classical bits: the largest written index plus one.
    pub fn num_clbits(&self) -> usize {
        self.measurements
            .iter()
            .map(|m| m.clbit + 1)
            .max()
            .unwrap_or(0)
    }

    /// Names of the distinct gates used, lowercase.
    pub fn gate_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.gates.iter().map(|op| op.gate.name()).collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Circuit depth: gates on disjoint qubits share a layer.
    pub fn depth(&self) -> usize {
        let mut qubit_layer = vec![0usize; self.num_qubits];
        let mut depth = 0;
        for op in &self.gates {
            let layer = 1 + op
                .qubits
                .iter()
                .map(|&q| qubit_layer[q])
                .max()
                .unwrap_or(0);
            for &q in &op.qubits {
                qubit_layer[q] = layer;
            }
            depth = depth.max(layer);
        }
        depth
    }

    /// Gate indices grouped by layer, in layer order.
    ///
    /// Layer assignment follows the same rule as [`depth`](Self::depth);
    /// within a layer, indices keep program order.
    pub fn layers(&self) -> Vec<Vec<usize>> {
        let mut qubit_layer = vec![0usize; self.num_qubits];
        let mut layers: Vec<Vec<usize>> = vec![];
        for (idx, op) in self.gates.iter().enumerate() {
            let layer = 1 + op
                .qubits
                .iter()
                .map(|&q| qubit_layer[q])
                .max()
                .unwrap_or(0);
            for &q in &op.qubits {
                qubit_layer[q] = layer;
            }
            if layers.len() < layer {
                layers.resize_with(layer, Vec::new);
            }
            layers[layer - 1].push(idx);
        }
        layers
    }

    // =========================================================================
    // Functional operations
    // =========================================================================

    /// A new circuit containing the gates in `start..end`, without
    /// measurements.
    pub fn slice(&self, start: usize, end: usize) -> IrResult<Circuit> {
        if start > end || end > self.gates.len() {
            return Err(IrError::SliceOutOfBounds {
                start,
                end,
                len: self.gates.len(),
            });
        }
        let mut out = Circuit::new(format!("{}_slice", self.name()), self.num_qubits);
        out.gates = self.gates[start..end].to_vec();
        Ok(out)
    }

    /// The inverse circuit: each gate inverted, in reverse order.
    /// Measurements are preserved as-is.
    pub fn reverse(&self) -> Circuit {
        let mut out = Circuit::new(format!("{}_rev", self.name()), self.num_qubits);
        out.gates = self
            .gates
            .iter()
            .rev()
            .map(|op| GateOp {
                gate: op.gate.inverse(),
                qubits: op.qubits.clone(),
            })
            .collect();
        out.measurements = self.measurements.clone();
        out
    }

    /// A deep copy; mutating the copy does not affect the original.
    pub fn copy(&self) -> Circuit {
        self.clone()
    }

    /// Append another circuit's gates and measurements.
    ///
    /// Both circuits must have the same qubit count.
    pub fn compose(&self, other: &Circuit) -> IrResult<Circuit> {
        if self.num_qubits != other.num_qubits {
            return Err(IrError::SizeMismatch {
                left: self.num_qubits,
                right: other.num_qubits,
            });
        }
        let mut out = self.clone();
        out.gates.extend(other.gates.iter().cloned());
        out.measurements.extend(other.measurements.iter().copied());
        out.metadata.modified = Utc::now();
        Ok(out)
    }

    /// A circuit with the same qubits, measurements, and metadata but a
    /// different gate sequence. Every op is re-validated.
    pub fn with_gates(&self, gates: Vec<GateOp>) -> IrResult<Circuit> {
        let mut out = self.clone();
        out.gates.clear();
        for op in gates {
            out.push(op.gate, op.qubits)?;
        }
        Ok(out)
    }

    /// The gate sequence repeated `k` times; `power(0)` is empty.
    /// Measurements are not repeated.
    pub fn power(&self, k: usize) -> Circuit {
        let mut out = Circuit::new(format!("{}^{k}", self.name()), self.num_qubits);
        for _ in 0..k {
            out.gates.extend(self.gates.iter().cloned());
        }
        out
    }

    /// The full unitary of the gate sequence (measurements ignored).
    ///
    /// Only available for circuits of at most 10 qubits; wider circuits
    /// fail rather than allocate a 4^n matrix.
    pub fn unitary(&self) -> IrResult<Unitary> {
        if self.num_qubits > MAX_UNITARY_QUBITS {
            return Err(IrError::UnitaryTooLarge {
                num_qubits: self.num_qubits,
                limit: MAX_UNITARY_QUBITS,
            });
        }
        let mut u = Unitary::identity(1 << self.num_qubits);
        for op in &self.gates {
            let g = op.gate.matrix().embed(&op.qubits, self.num_qubits);
            u = g.mul(&u);
        }
        Ok(u)
    }

    // =========================================================================
    // Pre-built circuits
    // =========================================================================

    /// Create a Bell state circuit with measurements.
    pub fn bell() -> IrResult<Self> {
        let mut circuit = Self::new("bell", 2);
        circuit.h(0)?.cx(0, 1)?.measure(0, 0)?.measure(1, 1)?;
        Ok(circuit)
    }

    /// Create a GHZ state circuit with measurements.
    pub fn ghz(n: usize) -> IrResult<Self> {
        let mut circuit = Self::new("ghz", n);
        if n == 0 {
            return Ok(circuit);
        }
        circuit.h(0)?;
        for i in 0..n - 1 {
            circuit.cx(i, i + 1)?;
        }
        circuit.measure_all()?;
        Ok(circuit)
    }
}
