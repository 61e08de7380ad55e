//! Device descriptors.

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use alsvin_ir::Topology;

/// Default gate error assumed when no calibration data is known.
pub const DEFAULT_GATE_ERROR: f64 = 0.01;

/// Physical implementation of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceType {
    Simulator,
    Superconducting,
    IonTrap,
    Photonic,
    NeutralAtom,
    Topological,
}

/// Operational status of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Online,
    Maintenance,
    Offline,
    Calibrating,
    Error,
}

impl DeviceStatus {
    /// Weight of this status in the health score.
    pub fn weight(self) -> f64 {
        match self {
            DeviceStatus::Online => 1.0,
            DeviceStatus::Calibrating => 0.7,
            DeviceStatus::Maintenance => 0.3,
            DeviceStatus::Offline | DeviceStatus::Error => 0.0,
        }
    }

    /// Whether jobs may be scheduled onto a device in this status.
    pub fn is_schedulable(self) -> bool {
        !matches!(self, DeviceStatus::Offline | DeviceStatus::Error)
    }
}

/// Calibration snapshot reported by the provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    /// When the device was last calibrated.
    pub timestamp: Option<DateTime<Utc>>,
    /// Gate error rates keyed by `gate@qubits` (e.g. `cx@0-1`).
    #[serde(default)]
    pub gate_errors: FxHashMap<String, f64>,
    /// Per-qubit readout error rates.
    #[serde(default)]
    pub readout_errors: Vec<f64>,
    /// Per-qubit T1 relaxation times, microseconds.
    #[serde(default)]
    pub t1_us: Vec<f64>,
    /// Per-qubit T2 coherence times, microseconds.
    #[serde(default)]
    pub t2_us: Vec<f64>,
    /// Per-qubit T2* dephasing times, microseconds.
    #[serde(default)]
    pub t2_star_us: Vec<f64>,
    /// Pairwise crosstalk matrix.
    #[serde(default)]
    pub crosstalk: Vec<Vec<f64>>,
    /// Gate durations keyed by gate name, nanoseconds.
    #[serde(default)]
    pub gate_durations_ns: FxHashMap<String, f64>,
}

/// Queue state reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueInfo {
    /// Jobs currently waiting.
    pub pending_jobs: u32,
    /// Average wait per job, milliseconds.
    pub average_wait_ms: u64,
    /// Vendor-side queue priority class.
    pub priority: u32,
}

/// Pricing model of a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    /// Cost per shot.
    pub cost_per_shot: f64,
    /// Cost per second of execution time.
    pub cost_per_second: f64,
    /// Minimum charge per job.
    pub minimum_cost: f64,
    /// ISO currency code.
    pub currency: String,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            cost_per_shot: 0.0,
            cost_per_second: 0.0,
            minimum_cost: 0.0,
            currency: "USD".to_string(),
        }
    }
}

/// Descriptor of one device in a provider's catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    /// Unique device id.
    pub id: String,
    /// Owning provider id.
    pub provider_id: String,
    /// Human-readable name.
    pub name: String,
    /// Hardware or software version string.
    pub version: String,
    /// Physical implementation.
    pub device_type: DeviceType,
    /// Operational status.
    pub status: DeviceStatus,
    /// Coupling graph.
    pub topology: Topology,
    /// Gate names the device executes natively.
    pub basis_gates: Vec<String>,
    /// Maximum shots per job.
    pub max_shots: u32,
    /// Maximum circuits per submission.
    pub max_experiments: u32,
    /// Whether the device can also run as a simulator.
    pub simulation_capable: bool,
    /// Latest calibration snapshot.
    #[serde(default)]
    pub calibration: Calibration,
    /// Queue state.
    #[serde(default)]
    pub queue: QueueInfo,
    /// Pricing.
    #[serde(default)]
    pub cost: CostModel,
    /// Jobs the scheduler may have in flight on this device before it
    /// pushes back.
    pub max_concurrent_jobs: u32,
}

impl Device {
    /// Descriptor for an ideal simulator.
    pub fn simulator(id: impl Into<String>, provider_id: impl Into<String>, num_qubits: usize) -> Self {
        Self {
            id: id.into(),
            provider_id: provider_id.into(),
            name: "Statevector simulator".to_string(),
            version: "1.0".to_string(),
            device_type: DeviceType::Simulator,
            status: DeviceStatus::Online,
            topology: Topology::full(num_qubits),
            basis_gates: crate::universal_basis(),
            max_shots: 1_000_000,
            max_experiments: 1,
            simulation_capable: true,
            calibration: Calibration::default(),
            queue: QueueInfo::default(),
            cost: CostModel::default(),
            max_concurrent_jobs: 8,
        }
    }

    /// Number of physical qubits.
    pub fn num_qubits(&self) -> usize {
        self.topology.num_qubits()
    }

    /// Whether every named gate is in the device basis.
    pub fn supports_gates<'a>(&self, gates: impl IntoIterator<Item = &'a str>) -> bool {
        gates
            .into_iter()
            .all(|gate| self.basis_gates.iter().any(|g| g == gate))
    }

    /// Composite health score in `[0, 1]`.
    ///
    /// `status_weight × (1 − min(queue/100, 0.5)) × (1 − min(age/24h, 0.3))`.
    /// A device without a calibration timestamp takes the full staleness
    /// penalty.
    pub fn health_score(&self, now: DateTime<Utc>) -> f64 {
        let status_weight = self.status.weight();

        let queue_penalty = (f64::from(self.queue.pending_jobs) / 100.0).min(0.5);

        let staleness_penalty = match self.calibration.timestamp {
            Some(timestamp) => {
                let age_hours =
                    (now - timestamp).num_milliseconds().max(0) as f64 / 3_600_000.0;
                (age_hours / 24.0).min(0.3)
            }
            None => 0.3,
        };

        status_weight * (1.0 - queue_penalty) * (1.0 - staleness_penalty)
    }

    /// Mean of all known gate errors, defaulting when no data exists.
    pub fn avg_gate_error(&self) -> f64 {
        let errors = &self.calibration.gate_errors;
        if errors.is_empty() {
            return DEFAULT_GATE_ERROR;
        }
        errors.values().sum::<f64>() / errors.len() as f64
    }

    /// Mean per-qubit readout error, zero when unknown.
    pub fn avg_readout_error(&self) -> f64 {
        let errors = &self.calibration.readout_errors;
        if errors.is_empty() {
            return 0.0;
        }
        errors.iter().sum::<f64>() / errors.len() as f64
    }
}
