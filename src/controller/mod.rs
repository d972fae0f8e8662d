use std::sync::Arc;

use log::info;
use tracing::instrument;

use crate::adapter::ExternalQueryAdapter;
use crate::context::WorkflowContext;
use crate::signal::{Outcome, StepError};
use crate::steps::PollStep;

/// Per-invocation driver sitting between the host engine and the polling
/// steps. The host re-invokes `run_step` after its poll interval for as long
/// as the step keeps signalling retry; the controller owns the driving-loop
/// side of the contract (attempt counting, fatal-error translation).
#[derive(Clone)]
pub struct StepController {
    adapter: Arc<dyn ExternalQueryAdapter>,
}

impl StepController {
    pub fn new(adapter: Arc<dyn ExternalQueryAdapter>) -> Self {
        Self { adapter }
    }

    /// Reset the retry counter when a new logical step begins.
    pub fn begin_step(&self, ctx: &mut WorkflowContext) {
        ctx.retry_state.reset();
    }

    /// Run one poll of the given step. On retry the attempt counter is
    /// bumped for the next invocation; on a fatal error its message is
    /// written into the progress slot before the error propagates, so the
    /// failure stays visible even though the step sequence aborts.
    #[instrument(skip(self, step, ctx), fields(step = step.name(), instance = %ctx.instance_id))]
    pub async fn run_step(
        &self,
        step: &dyn PollStep,
        ctx: &mut WorkflowContext,
    ) -> Result<Outcome, StepError> {
        match step.poll(self.adapter.as_ref(), ctx).await {
            Ok(outcome) => {
                if outcome.is_retry() {
                    ctx.retry_state.bump();
                }
                info!("Step '{}' signalled '{}'", step.name(), outcome.as_signal());
                Ok(outcome)
            }
            Err(e) => {
                ctx.set_progress(e.to_string(), None);
                log::error!("Step '{}' failed: {}", step.name(), e);
                Err(e)
            }
        }
    }
}
