use async_trait::async_trait;
use log::{error, warn};
use serde::{Deserialize, Serialize};

use crate::adapter::{ExternalQueryAdapter, JobVerdict};
use crate::context::WorkflowContext;
use crate::signal::{Outcome, StepError};
use crate::steps::PollStep;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobHandle {
    pub job_id: String,
    /// Workflow jobs have no raw output of their own, so none is fetched
    /// when they fail.
    pub workflow: bool,
}

/// Provision check for an automation job: poll the job until the provider
/// reports a terminal status, refreshing the management system's view of the
/// job on completion (ok or bad).
pub struct JobProvisionCheck {
    job: JobHandle,
}

impl JobProvisionCheck {
    pub fn new(job: JobHandle) -> Self {
        Self { job }
    }
}

#[async_trait]
impl PollStep for JobProvisionCheck {
    fn name(&self) -> &str {
        "check_provisioned"
    }

    async fn poll(
        &self,
        adapter: &dyn ExternalQueryAdapter,
        _ctx: &mut WorkflowContext,
    ) -> Result<Outcome, StepError> {
        let status = adapter.query_job_status(&self.job.job_id).await?;

        match status.normalized {
            JobVerdict::Running => Ok(Outcome::Retry),
            JobVerdict::Ok => {
                adapter.refresh(&self.job.job_id).await?;
                Ok(Outcome::ok())
            }
            JobVerdict::Bad => {
                adapter.refresh(&self.job.job_id).await?;
                if !self.job.workflow {
                    match adapter.fetch_job_output(&self.job.job_id).await {
                        Ok(output) => {
                            error!("Job {} failed ({}):\n{}", self.job.job_id, status.raw, output)
                        }
                        Err(e) => warn!(
                            "Could not fetch output of failed job {}: {}",
                            self.job.job_id, e
                        ),
                    }
                }
                Ok(Outcome::error(status.raw))
            }
        }
    }
}
