//! Typed event channels.
//!
//! One broadcast channel per event kind; consumers subscribe at
//! construction time and receive every event published afterwards.

use tokio::sync::broadcast;

use crate::job::{JobId, JobStatus};

/// A job was scored and placed on a device queue.
#[derive(Debug, Clone)]
pub struct JobScheduled {
    pub job_id: JobId,
    pub device_id: String,
    pub priority: f64,
}

/// A job reached a terminal state.
#[derive(Debug, Clone)]
pub struct JobCompleted {
    pub job_id: JobId,
    pub device_id: Option<String>,
    pub status: JobStatus,
}

/// A provider's availability flipped.
#[derive(Debug, Clone)]
pub struct ProviderStatusChanged {
    pub provider_id: String,
    pub available: bool,
}

/// Channel capacity per event kind; slow consumers drop the oldest events.
const CHANNEL_CAPACITY: usize = 64;

/// The scheduler's event channels.
#[derive(Debug, Clone)]
pub struct EventBus {
    job_scheduled: broadcast::Sender<JobScheduled>,
    job_completed: broadcast::Sender<JobCompleted>,
    provider_status: broadcast::Sender<ProviderStatusChanged>,
}

impl EventBus {
    /// Create a new event bus.
    pub fn new() -> Self {
        Self {
            job_scheduled: broadcast::channel(CHANNEL_CAPACITY).0,
            job_completed: broadcast::channel(CHANNEL_CAPACITY).0,
            provider_status: broadcast::channel(CHANNEL_CAPACITY).0,
        }
    }

    /// Subscribe to scheduling events.
    pub fn subscribe_job_scheduled(&self) -> broadcast::Receiver<JobScheduled> {
        self.job_scheduled.subscribe()
    }

    /// Subscribe to completion events.
    pub fn subscribe_job_completed(&self) -> broadcast::Receiver<JobCompleted> {
        self.job_completed.subscribe()
    }

    /// Subscribe to provider availability events.
    pub fn subscribe_provider_status(&self) -> broadcast::Receiver<ProviderStatusChanged> {
        self.provider_status.subscribe()
    }

    /// Publish a scheduling event; no-op without subscribers.
    pub fn publish_job_scheduled(&self, event: JobScheduled) {
        let _ = self.job_scheduled.send(event);
    }

    /// Publish a completion event; no-op without subscribers.
    pub fn publish_job_completed(&self, event: JobCompleted) {
        let _ = self.job_completed.send(event);
    }

    /// Publish a provider availability event; no-op without subscribers.
    pub fn publish_provider_status(&self, event: ProviderStatusChanged) {
        let _ = self.provider_status.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
