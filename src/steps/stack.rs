use async_trait::async_trait;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::adapter::{ExternalQueryAdapter, StackStatus};
use crate::context::WorkflowContext;
use crate::signal::{Outcome, StepError};
use crate::steps::PollStep;

/// Longest failure reason the owning request can store.
const MAX_REQUEST_MESSAGE: usize = 255;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackHandle {
    pub stack_id: String,
    pub manager_id: String,
    /// External reference of the stack on the provider, if it has one.
    pub external_ref: Option<String>,
    /// Owning provision request; failure reasons are propagated onto it.
    pub request_id: String,
}

/// Provision check for an orchestration stack. Runs in two phases keyed off
/// the `provider_last_refresh` state var:
///
/// 1. Poll the stack status until terminal. Failure (including a completed
///    rollback) signals `error` and propagates the reason onto the owning
///    request; success stores the deploy result, kicks off an async provider
///    refresh and keeps retrying.
/// 2. Once the refresh was requested, wait for the refreshed stack to reach
///    a terminal status (or to disappear from the provider), then emit the
///    stored deploy result.
pub struct StackProvisionCheck {
    service: Option<StackHandle>,
}

impl StackProvisionCheck {
    pub fn new(service: Option<StackHandle>) -> Self {
        Self { service }
    }

    async fn check_deployed(
        &self,
        adapter: &dyn ExternalQueryAdapter,
        ctx: &mut WorkflowContext,
        service: &StackHandle,
    ) -> Result<Outcome, StepError> {
        let status = match adapter.query_stack_status(&service.stack_id).await? {
            Some(status) => status,
            // No stack yet; deployment has not produced one.
            None => return Ok(Outcome::Retry),
        };

        if status.deployment_failed() {
            let reason = status
                .reason
                .clone()
                .unwrap_or_else(|| status.raw.clone());
            ctx.set_deploy_result("error", Some(&reason));
            let stored = truncate_for_request(&reason);
            if let Err(e) = adapter
                .update_request_message(&service.request_id, &stored)
                .await
            {
                warn!(
                    "Could not record failure on request {}: {}",
                    service.request_id, e
                );
            }
            return Ok(Outcome::error(reason));
        }

        if status.deployment_complete() {
            ctx.set_deploy_result("ok", status.reason.as_deref());
            match &service.external_ref {
                Some(external_ref) => {
                    adapter
                        .trigger_async_stack_refresh(&service.manager_id, external_ref)
                        .await?;
                    info!(
                        "Stack {} deployed, refreshing provider {}",
                        external_ref, service.manager_id
                    );
                }
                None => warn!(
                    "Stack {} has no external reference, skipping provider refresh",
                    service.stack_id
                ),
            }
            ctx.mark_provider_refresh_requested();
            return Ok(Outcome::Retry);
        }

        Ok(Outcome::Retry)
    }

    async fn check_refreshed(
        &self,
        adapter: &dyn ExternalQueryAdapter,
        ctx: &mut WorkflowContext,
        service: &StackHandle,
    ) -> Result<Outcome, StepError> {
        match adapter.query_stack_status(&service.stack_id).await? {
            // The stack was removed from the provider during refresh; there
            // is nothing left to wait for.
            None => Ok(stored_outcome(ctx)),
            Some(status) if status.refreshed() => Ok(stored_outcome(ctx)),
            Some(_) => Ok(Outcome::Retry),
        }
    }
}

/// Re-emit the deploy result stored before the refresh was requested.
fn stored_outcome(ctx: &WorkflowContext) -> Outcome {
    match ctx.deploy_result().as_deref() {
        Some("error") => Outcome::error(ctx.deploy_reason().unwrap_or_default()),
        Some(result) => Outcome::ok_with(result),
        None => Outcome::ok(),
    }
}

/// Truncate a failure reason to what the request's message column can hold:
/// messages longer than 255 characters keep their first 252 characters and
/// end in a literal `...`.
pub fn truncate_for_request(message: &str) -> String {
    if message.chars().count() <= MAX_REQUEST_MESSAGE {
        return message.to_string();
    }
    let mut truncated: String = message.chars().take(MAX_REQUEST_MESSAGE - 3).collect();
    truncated.push_str("...");
    truncated
}

#[async_trait]
impl PollStep for StackProvisionCheck {
    fn name(&self) -> &str {
        "check_provisioned"
    }

    async fn poll(
        &self,
        adapter: &dyn ExternalQueryAdapter,
        ctx: &mut WorkflowContext,
    ) -> Result<Outcome, StepError> {
        let service = self
            .service
            .as_ref()
            .ok_or_else(|| StepError::InvalidSource("Service is nil".to_string()))?;

        if ctx.provider_refresh_requested() {
            self.check_refreshed(adapter, ctx, service).await
        } else {
            self.check_deployed(adapter, ctx, service).await
        }
    }
}
