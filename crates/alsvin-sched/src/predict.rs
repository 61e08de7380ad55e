//! Execution-time prediction.

use std::sync::Arc;

use alsvin_hal::Device;
use alsvin_ir::Circuit;
use serde::{Deserialize, Serialize};

use crate::metrics::MetricsCollector;

/// Coarse circuit classes used to bucket historical execution times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitClass {
    /// Two-qubit-gate ratio above 0.3.
    EntanglingHeavy,
    /// Depth above 50.
    DeepCircuit,
    /// More than 100 gates.
    LargeCircuit,
    /// Everything else.
    Standard,
}

impl CircuitClass {
    /// Classify a circuit; the first matching class wins.
    pub fn classify(circuit: &Circuit) -> Self {
        let gates = circuit.gate_count();
        if gates > 0 {
            let two_qubit_ratio = circuit.multi_qubit_gate_count() as f64 / gates as f64;
            if two_qubit_ratio > 0.3 {
                return CircuitClass::EntanglingHeavy;
            }
        }
        if circuit.depth() > 50 {
            return CircuitClass::DeepCircuit;
        }
        if gates > 100 {
            return CircuitClass::LargeCircuit;
        }
        CircuitClass::Standard
    }
}

/// Predicts execution time from history, falling back to a heuristic.
pub struct PerformancePredictor {
    metrics: Arc<dyn MetricsCollector>,
}

impl PerformancePredictor {
    /// Create a predictor over a metrics collector.
    pub fn new(metrics: Arc<dyn MetricsCollector>) -> Self {
        Self { metrics }
    }

    /// Estimated execution time in milliseconds for a circuit on a device.
    ///
    /// With history for `(device, class)`, the historical mean is scaled by
    /// a complexity factor `1 + ln(gates+1)/10 + ln(depth+1)/10`. Without
    /// history, a size-driven heuristic applies.
    pub async fn predict_ms(&self, circuit: &Circuit, device: &Device) -> f64 {
        let class = CircuitClass::classify(circuit);
        let gates = circuit.gate_count() as f64;
        let depth = circuit.depth() as f64;

        if let Some(historical) = self
            .metrics
            .average_execution_ms(&device.id, class)
            .await
        {
            let complexity = 1.0 + (gates + 1.0).ln() / 10.0 + (depth + 1.0).ln() / 10.0;
            return historical * complexity;
        }

        let qubit_ratio = if device.num_qubits() > 0 {
            circuit.num_qubits() as f64 / device.num_qubits() as f64
        } else {
            1.0
        };
        1000.0 + gates * 10.0 + depth * 50.0 + qubit_ratio.powi(2) * 500.0
    }
}
