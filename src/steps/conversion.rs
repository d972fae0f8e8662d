use async_trait::async_trait;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::adapter::{ConversionStatus, ExternalQueryAdapter};
use crate::context::WorkflowContext;
use crate::progress::{ConversionReport, MSG_FAILED, MSG_SUCCEEDED};
use crate::retry::RetryBudget;
use crate::signal::{Outcome, StepError};
use crate::steps::PollStep;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionHandle {
    pub task_id: String,
}

/// Tracks a running disk conversion: refreshes per-disk progress each poll,
/// aggregates it into the context's progress slot and retries until the
/// operation finishes. Transient failures of the state query are suppressed
/// while the retry budget lasts; after that the original error is re-raised.
pub struct DiskConversionCheck {
    task: ConversionHandle,
    budget: RetryBudget,
}

impl DiskConversionCheck {
    pub fn new(task: ConversionHandle) -> Self {
        Self {
            task,
            budget: RetryBudget::default(),
        }
    }

    pub fn with_budget(task: ConversionHandle, budget: RetryBudget) -> Self {
        Self { task, budget }
    }
}

#[async_trait]
impl PollStep for DiskConversionCheck {
    fn name(&self) -> &str {
        "check_transformed"
    }

    async fn poll(
        &self,
        adapter: &dyn ExternalQueryAdapter,
        ctx: &mut WorkflowContext,
    ) -> Result<Outcome, StepError> {
        let update = match adapter.query_conversion_state(&self.task.task_id).await {
            Ok(update) => update,
            Err(e) => {
                if self.budget.exhausted(&ctx.retry_state) {
                    return Err(StepError::Query(e));
                }
                warn!(
                    "Conversion state query for task {} failed (attempt {}): {}",
                    self.task.task_id, ctx.retry_state.attempt_count, e
                );
                return Ok(Outcome::Retry);
            }
        };

        match update.status {
            ConversionStatus::Failed => Err(StepError::OperationFailed(MSG_FAILED.to_string())),
            ConversionStatus::Succeeded => {
                ctx.set_progress(MSG_SUCCEEDED, Some(100.0));
                Ok(Outcome::ok())
            }
            ConversionStatus::Active => {
                ctx.update_unit_percents(&update.disk_percents);
                let report = ConversionReport::from_units(ctx.progress_units());
                ctx.set_progress(report.message.clone(), Some(report.overall_percent));
                Ok(report.outcome)
            }
        }
    }
}
