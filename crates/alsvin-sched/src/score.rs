//! Multi-criteria device scoring.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use alsvin_hal::CatalogEntry;

use crate::cost::{cost_score, estimate_cost};
use crate::job::Job;

/// Default confidence attached to decisions until prediction accuracy is
/// tracked.
const DEFAULT_CONFIDENCE: f64 = 0.8;

/// Weights of the four scoring criteria; they must sum to one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub performance: f64,
    pub cost: f64,
    pub reliability: f64,
    pub availability: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            performance: 0.3,
            cost: 0.2,
            reliability: 0.2,
            availability: 0.3,
        }
    }
}

impl ScoreWeights {
    /// Whether the weights sum to one within a small tolerance.
    pub fn is_normalized(&self) -> bool {
        let sum = self.performance + self.cost + self.reliability + self.availability;
        (sum - 1.0).abs() < 1e-9
    }
}

/// The component and composite scores of one candidate device.
#[derive(Debug, Clone)]
pub struct DeviceScore {
    pub device_id: String,
    pub provider_id: String,
    pub performance: f64,
    pub cost: f64,
    pub reliability: f64,
    pub availability: f64,
    /// Weighted composite in `[0, 1]`.
    pub priority: f64,
    pub estimated_queue_ms: u64,
    pub estimated_execution_ms: f64,
    pub total_cost: f64,
    pub currency: String,
}

/// The decision returned to the caller of `submit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingDecision {
    pub device_id: String,
    pub provider_id: String,
    pub estimated_start: DateTime<Utc>,
    pub estimated_completion: DateTime<Utc>,
    /// The weighted score in `[0, 1]`.
    pub priority: f64,
    pub cost: f64,
    pub currency: String,
    pub confidence: f64,
}

impl SchedulingDecision {
    /// Build a decision from a device score at decision time.
    pub fn from_score(score: &DeviceScore, now: DateTime<Utc>) -> Self {
        let estimated_start = now + Duration::milliseconds(score.estimated_queue_ms as i64);
        let estimated_completion =
            estimated_start + Duration::milliseconds(score.estimated_execution_ms as i64);
        Self {
            device_id: score.device_id.clone(),
            provider_id: score.provider_id.clone(),
            estimated_start,
            estimated_completion,
            priority: score.priority,
            cost: score.total_cost,
            currency: score.currency.clone(),
            confidence: DEFAULT_CONFIDENCE,
        }
    }
}

/// Whether a device can run a job at all.
///
/// Requires enough qubits, every circuit gate in the device basis, a
/// schedulable status, and provider membership when the user restricts
/// providers.
pub fn is_eligible(job: &Job, entry: &CatalogEntry) -> bool {
    let device = &entry.device;
    if device.num_qubits() < job.circuit.num_qubits() {
        return false;
    }
    if !device.supports_gates(job.circuit.gate_names()) {
        return false;
    }
    if !device.status.is_schedulable() {
        return false;
    }
    if let Some(preferred) = &job.user.preferred_providers {
        if !preferred.iter().any(|id| id == &entry.provider_id) {
            return false;
        }
    }
    true
}

/// Score one eligible device for a job.
///
/// `queue_len` is the scheduler-side queue length for the device,
/// `execution_ms` the predictor's estimate, `average_job_time_ms` the
/// configured per-job queue drain time.
pub fn score_device(
    job: &Job,
    entry: &CatalogEntry,
    queue_len: usize,
    execution_ms: f64,
    average_job_time_ms: u64,
    now: DateTime<Utc>,
) -> DeviceScore {
    let device = &entry.device;
    let health = device.health_score(now);

    let estimated_queue_ms = queue_len as u64 * average_job_time_ms;

    let qubit_fit = (job.circuit.num_qubits() as f64 / device.num_qubits().max(1) as f64).min(1.0);
    let performance = health * (0.5 + 0.5 * qubit_fit) * (1.0 - device.avg_gate_error());

    let total_cost = estimate_cost(job.shots, execution_ms / 1000.0, &device.cost);
    let cost = cost_score(total_cost, job.user.max_cost_per_job);

    let reliability = health * (1.0 - device.avg_readout_error());

    let availability = (1.0 - estimated_queue_ms as f64 / 3_600_000.0).max(0.0);

    let weights = &job.user.weights;
    let priority = weights.performance * performance
        + weights.cost * cost
        + weights.reliability * reliability
        + weights.availability * availability;

    DeviceScore {
        device_id: device.id.clone(),
        provider_id: entry.provider_id.clone(),
        performance,
        cost,
        reliability,
        availability,
        priority,
        estimated_queue_ms,
        estimated_execution_ms: execution_ms,
        total_cost,
        currency: device.cost.currency.clone(),
    }
}

/// Apply the user's hard constraints to ranked scores: the best survivor
/// wins; with no survivors the top-ranked score is kept.
pub fn select<'a>(ranked: &'a [DeviceScore], job: &Job) -> Option<&'a DeviceScore> {
    let survives = |score: &DeviceScore| {
        if let Some(max_cost) = job.user.max_cost {
            if score.total_cost > max_cost {
                return false;
            }
        }
        if let Some(max_wait_ms) = job.user.max_wait_ms {
            if score.estimated_queue_ms > max_wait_ms {
                return false;
            }
        }
        true
    };

    ranked.iter().find(|score| survives(score)).or(ranked.first())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::UserProfile;
    use alsvin_hal::{Device, DeviceStatus};
    use alsvin_ir::Circuit;

    fn entry(id: &str, qubits: usize) -> CatalogEntry {
        let mut device = Device::simulator(id, "local", qubits);
        device.calibration.timestamp = Some(Utc::now());
        CatalogEntry {
            device,
            provider_id: "local".to_string(),
            provider_name: "Local".to_string(),
        }
    }

    fn bell_job() -> Job {
        Job::new(Circuit::bell().unwrap(), UserProfile::new("alice"), 1000)
    }

    #[test]
    fn test_default_weights_normalized() {
        assert!(ScoreWeights::default().is_normalized());
    }

    #[test]
    fn test_eligibility_qubits() {
        let job = bell_job();
        assert!(is_eligible(&job, &entry("big", 5)));
        assert!(!is_eligible(&job, &entry("tiny", 1)));
    }

    #[test]
    fn test_eligibility_basis_gates() {
        let job = bell_job();
        let mut limited = entry("limited", 5);
        limited.device.basis_gates = vec!["rx".into(), "rz".into(), "cz".into()];
        // Bell uses h and cx, neither of which is in the basis.
        assert!(!is_eligible(&job, &limited));
    }

    #[test]
    fn test_eligibility_status() {
        let job = bell_job();

        let mut offline = entry("offline", 5);
        offline.device.status = DeviceStatus::Offline;
        assert!(!is_eligible(&job, &offline));

        let mut errored = entry("error", 5);
        errored.device.status = DeviceStatus::Error;
        assert!(!is_eligible(&job, &errored));

        // Calibrating devices stay eligible.
        let mut calibrating = entry("cal", 5);
        calibrating.device.status = DeviceStatus::Calibrating;
        assert!(is_eligible(&job, &calibrating));
    }

    #[test]
    fn test_eligibility_preferred_providers() {
        let mut job = bell_job();
        job.user.preferred_providers = Some(vec!["other".to_string()]);
        assert!(!is_eligible(&job, &entry("sim", 5)));

        job.user.preferred_providers = Some(vec!["local".to_string()]);
        assert!(is_eligible(&job, &entry("sim", 5)));
    }

    #[test]
    fn test_score_components_in_range() {
        let job = bell_job();
        let score = score_device(&job, &entry("sim", 10), 2, 1500.0, 60_000, Utc::now());

        for value in [
            score.performance,
            score.cost,
            score.reliability,
            score.availability,
            score.priority,
        ] {
            assert!((0.0..=1.0).contains(&value), "score {value} out of range");
        }
        assert_eq!(score.estimated_queue_ms, 120_000);
    }

    #[test]
    fn test_empty_queue_scores_full_availability() {
        let job = bell_job();
        let score = score_device(&job, &entry("sim", 10), 0, 1500.0, 60_000, Utc::now());
        assert!((score.availability - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_long_queue_floors_availability() {
        let job = bell_job();
        // 100 queued jobs at 60 s each is far past the one-hour window.
        let score = score_device(&job, &entry("sim", 10), 100, 1500.0, 60_000, Utc::now());
        assert_eq!(score.availability, 0.0);
    }

    #[test]
    fn test_calibrating_reduces_score() {
        let job = bell_job();
        let online = score_device(&job, &entry("sim", 10), 0, 1500.0, 60_000, Utc::now());

        let mut calibrating = entry("cal", 10);
        calibrating.device.status = DeviceStatus::Calibrating;
        let reduced = score_device(&job, &calibrating, 0, 1500.0, 60_000, Utc::now());

        assert!(reduced.priority < online.priority);
    }

    #[test]
    fn test_hard_constraints_filter() {
        let mut job = bell_job();
        job.user.max_wait_ms = Some(30_000);

        let fast = DeviceScore {
            device_id: "fast".into(),
            provider_id: "p".into(),
            performance: 0.5,
            cost: 0.5,
            reliability: 0.5,
            availability: 0.5,
            priority: 0.4,
            estimated_queue_ms: 10_000,
            estimated_execution_ms: 100.0,
            total_cost: 1.0,
            currency: "USD".into(),
        };
        let busy = DeviceScore {
            device_id: "busy".into(),
            priority: 0.9,
            estimated_queue_ms: 600_000,
            ..fast.clone()
        };

        // Ranked by priority, busy first; the wait cap filters it out.
        let ranked = vec![busy, fast];
        let chosen = select(&ranked, &job).unwrap();
        assert_eq!(chosen.device_id, "fast");
    }

    #[test]
    fn test_no_survivor_falls_back_to_top() {
        let mut job = bell_job();
        job.user.max_cost = Some(0.001);

        let expensive = DeviceScore {
            device_id: "only".into(),
            provider_id: "p".into(),
            performance: 0.5,
            cost: 0.0,
            reliability: 0.5,
            availability: 0.5,
            priority: 0.4,
            estimated_queue_ms: 0,
            estimated_execution_ms: 100.0,
            total_cost: 5.0,
            currency: "USD".into(),
        };

        let ranked = vec![expensive];
        let chosen = select(&ranked, &job).unwrap();
        assert_eq!(chosen.device_id, "only");
    }

    #[test]
    fn test_decision_times_ordered() {
        let job = bell_job();
        let score = score_device(&job, &entry("sim", 10), 1, 1500.0, 60_000, Utc::now());
        let decision = SchedulingDecision::from_score(&score, Utc::now());
        assert!(decision.estimated_start < decision.estimated_completion);
        assert!((decision.confidence - 0.8).abs() < 1e-12);
    }
}
