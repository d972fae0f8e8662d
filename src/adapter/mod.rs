use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Power state of a VM or cloud instance, already normalized by the
/// management layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerState {
    Off,
    On,
    Unknown,
    /// The resource has no management system association; there is nothing
    /// left to check.
    NoEms,
}

/// Normalized verdict for a provisioning job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobVerdict {
    Ok,
    Running,
    Bad,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatus {
    /// Provider-specific status string (e.g. "create_failed").
    pub raw: String,
    pub normalized: JobVerdict,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackStatus {
    pub raw: String,
    pub reason: Option<String>,
}

impl StackStatus {
    /// A failed create, or a completed rollback. A rollback is nominally a
    /// successful operation but still means the provision failed.
    pub fn deployment_failed(&self) -> bool {
        let status = self.raw.to_lowercase();
        status.ends_with("failed") || status.ends_with("rollback_complete")
    }

    pub fn deployment_complete(&self) -> bool {
        self.raw.eq_ignore_ascii_case("create_complete")
    }

    /// Terminal status of a stack after the provider view has been refreshed.
    pub fn refreshed(&self) -> bool {
        self.raw.eq_ignore_ascii_case("success")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversionStatus {
    Active,
    Succeeded,
    Failed,
}

/// One snapshot of a disk conversion operation: the overall operation status
/// plus the refreshed percent-complete of each disk, in stored disk order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionUpdate {
    pub status: ConversionStatus,
    pub disk_percents: Vec<f64>,
}

/// The narrow boundary through which polling steps observe external system
/// state. The core never reaches into a live object graph; every read is one
/// call returning a value type, every query is a discrete synchronous result.
#[async_trait]
pub trait ExternalQueryAdapter: Send + Sync {
    async fn query_power_state(&self, resource_id: &str) -> Result<PowerState>;

    async fn query_job_status(&self, job_id: &str) -> Result<JobStatus>;

    /// `None` means the stack no longer has an external reference on the
    /// provider (it was removed underneath us).
    async fn query_stack_status(&self, stack_id: &str) -> Result<Option<StackStatus>>;

    /// Fire-and-forget refresh of the management system's view of a resource.
    /// Idempotent from the caller's perspective.
    async fn refresh(&self, resource_id: &str) -> Result<()>;

    async fn trigger_async_stack_refresh(
        &self,
        manager_id: &str,
        stack_external_ref: &str,
    ) -> Result<()>;

    /// Raw output text of a job, fetched while reporting a failure.
    async fn fetch_job_output(&self, job_id: &str) -> Result<String>;

    /// Write a (possibly truncated) failure reason onto the owning
    /// provision request.
    async fn update_request_message(&self, request_id: &str, message: &str) -> Result<()>;

    /// Refresh the state of a disk conversion operation. This call may fail
    /// transiently; those failures are governed by the retry budget.
    async fn query_conversion_state(&self, task_id: &str) -> Result<ConversionUpdate>;
}
