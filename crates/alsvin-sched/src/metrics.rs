//! Scheduling and execution metrics.
//!
//! The collector records every scheduling decision and completed execution;
//! the performance predictor consults it for historical averages.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::job::JobId;
use crate::predict::CircuitClass;

/// A scheduling decision record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub job_id: JobId,
    pub device_id: String,
    pub priority_score: f64,
    pub timestamp: DateTime<Utc>,
}

/// A completed-execution record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub job_id: JobId,
    pub device_id: String,
    pub class: CircuitClass,
    pub execution_ms: u64,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
}

/// Collector for scheduling decisions and executions.
#[async_trait]
pub trait MetricsCollector: Send + Sync {
    /// Record a scheduling decision.
    async fn record_decision(&self, record: DecisionRecord);

    /// Record a completed execution.
    async fn record_execution(&self, record: ExecutionRecord);

    /// Historical mean execution time for a device and circuit class, from
    /// successful runs only.
    async fn average_execution_ms(&self, device_id: &str, class: CircuitClass) -> Option<f64>;
}

/// In-memory metrics collector.
#[derive(Default)]
pub struct InMemoryMetrics {
    decisions: RwLock<Vec<DecisionRecord>>,
    executions: RwLock<Vec<ExecutionRecord>>,
}

impl InMemoryMetrics {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded decisions.
    pub async fn decision_count(&self) -> usize {
        self.decisions.read().await.len()
    }

    /// Success ratio per device over recorded executions.
    pub async fn success_rates(&self) -> FxHashMap<String, f64> {
        let executions = self.executions.read().await;
        let mut totals: FxHashMap<String, (u64, u64)> = FxHashMap::default();
        for record in executions.iter() {
            let entry = totals.entry(record.device_id.clone()).or_insert((0, 0));
            entry.1 += 1;
            if record.success {
                entry.0 += 1;
            }
        }
        totals
            .into_iter()
            .map(|(device, (ok, all))| (device, ok as f64 / all as f64))
            .collect()
    }
}

#[async_trait]
impl MetricsCollector for InMemoryMetrics {
    async fn record_decision(&self, record: DecisionRecord) {
        self.decisions.write().await.push(record);
    }

    async fn record_execution(&self, record: ExecutionRecord) {
        self.executions.write().await.push(record);
    }

    async fn average_execution_ms(&self, device_id: &str, class: CircuitClass) -> Option<f64> {
        let executions = self.executions.read().await;
        let samples: Vec<u64> = executions
            .iter()
            .filter(|record| {
                record.success && record.device_id == device_id && record.class == class
            })
            .map(|record| record.execution_ms)
            .collect();
        if samples.is_empty() {
            return None;
        }
        Some(samples.iter().sum::<u64>() as f64 / samples.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn execution(device: &str, class: CircuitClass, ms: u64, success: bool) -> ExecutionRecord {
        ExecutionRecord {
            job_id: JobId::new(),
            device_id: device.to_string(),
            class,
            execution_ms: ms,
            success,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_average_filters_by_device_and_class() {
        let metrics = InMemoryMetrics::new();
        metrics
            .record_execution(execution("a", CircuitClass::Standard, 100, true))
            .await;
        metrics
            .record_execution(execution("a", CircuitClass::Standard, 300, true))
            .await;
        metrics
            .record_execution(execution("a", CircuitClass::DeepCircuit, 900, true))
            .await;
        metrics
            .record_execution(execution("b", CircuitClass::Standard, 5000, true))
            .await;

        let avg = metrics
            .average_execution_ms("a", CircuitClass::Standard)
            .await
            .unwrap();
        assert!((avg - 200.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_average_ignores_failures() {
        let metrics = InMemoryMetrics::new();
        metrics
            .record_execution(execution("a", CircuitClass::Standard, 100, true))
            .await;
        metrics
            .record_execution(execution("a", CircuitClass::Standard, 99_999, false))
            .await;

        let avg = metrics
            .average_execution_ms("a", CircuitClass::Standard)
            .await
            .unwrap();
        assert!((avg - 100.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_no_history() {
        let metrics = InMemoryMetrics::new();
        assert!(
            metrics
                .average_execution_ms("a", CircuitClass::Standard)
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_success_rates() {
        let metrics = InMemoryMetrics::new();
        metrics
            .record_execution(execution("a", CircuitClass::Standard, 10, true))
            .await;
        metrics
            .record_execution(execution("a", CircuitClass::Standard, 10, false))
            .await;

        let rates = metrics.success_rates().await;
        assert!((rates["a"] - 0.5).abs() < 1e-12);
    }
}
