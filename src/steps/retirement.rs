use async_trait::async_trait;
use log::info;
use serde::{Deserialize, Serialize};

use crate::adapter::{ExternalQueryAdapter, PowerState};
use crate::context::WorkflowContext;
use crate::signal::{Outcome, StepError};
use crate::steps::PollStep;

/// Identity of the VM or instance a retirement workflow is about to retire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VmHandle {
    pub vm_id: String,
    pub name: String,
    /// Templates cannot be retired; handing one in is a configuration error.
    pub template: bool,
    pub has_ems: bool,
}

/// Pre-retirement check: wait until the VM is no longer powered on before the
/// retirement state machine proceeds. Retries are unbounded here; the host
/// bounds the step by wall-clock time, not attempt count.
pub struct PreRetirementCheck {
    vm: VmHandle,
}

impl PreRetirementCheck {
    pub fn new(vm: VmHandle) -> Self {
        Self { vm }
    }
}

#[async_trait]
impl PollStep for PreRetirementCheck {
    fn name(&self) -> &str {
        "check_pre_retirement"
    }

    async fn poll(
        &self,
        adapter: &dyn ExternalQueryAdapter,
        _ctx: &mut WorkflowContext,
    ) -> Result<Outcome, StepError> {
        if self.vm.template {
            return Err(StepError::InvalidSource(format!(
                "VM '{}' is a template and cannot be retired",
                self.vm.name
            )));
        }

        // Without a management system there is nothing left to check.
        if !self.vm.has_ems {
            info!("VM '{}' has no EMS, skipping power check", self.vm.name);
            return Ok(Outcome::ok());
        }

        let power_state = adapter.query_power_state(&self.vm.vm_id).await?;
        info!("VM '{}' power state: {:?}", self.vm.name, power_state);

        match power_state {
            PowerState::On => Ok(Outcome::Retry),
            PowerState::Off | PowerState::Unknown | PowerState::NoEms => Ok(Outcome::ok()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{bail, Result};
    use crate::adapter::{ConversionUpdate, JobStatus, StackStatus};

    struct PowerStateAdapter {
        state: PowerState,
    }

    #[async_trait]
    impl ExternalQueryAdapter for PowerStateAdapter {
        async fn query_power_state(&self, _resource_id: &str) -> Result<PowerState> {
            Ok(self.state)
        }
        async fn query_job_status(&self, _job_id: &str) -> Result<JobStatus> {
            bail!("not under test")
        }
        async fn query_stack_status(&self, _stack_id: &str) -> Result<Option<StackStatus>> {
            bail!("not under test")
        }
        async fn refresh(&self, _resource_id: &str) -> Result<()> {
            bail!("not under test")
        }
        async fn trigger_async_stack_refresh(
            &self,
            _manager_id: &str,
            _stack_external_ref: &str,
        ) -> Result<()> {
            bail!("not under test")
        }
        async fn fetch_job_output(&self, _job_id: &str) -> Result<String> {
            bail!("not under test")
        }
        async fn update_request_message(&self, _request_id: &str, _message: &str) -> Result<()> {
            bail!("not under test")
        }
        async fn query_conversion_state(&self, _task_id: &str) -> Result<ConversionUpdate> {
            bail!("not under test")
        }
    }

    fn vm() -> VmHandle {
        VmHandle {
            vm_id: "42".to_string(),
            name: "test-vm".to_string(),
            template: false,
            has_ems: true,
        }
    }

    async fn poll_with(state: PowerState, vm: VmHandle) -> Result<Outcome, StepError> {
        let adapter = PowerStateAdapter { state };
        let mut ctx = WorkflowContext::new();
        PreRetirementCheck::new(vm).poll(&adapter, &mut ctx).await
    }

    #[tokio::test]
    async fn test_powered_off_vm_is_ok() {
        let outcome = poll_with(PowerState::Off, vm()).await.unwrap();
        assert_eq!(outcome, Outcome::ok());
    }

    #[tokio::test]
    async fn test_powered_on_vm_retries() {
        let outcome = poll_with(PowerState::On, vm()).await.unwrap();
        assert_eq!(outcome, Outcome::Retry);
    }

    #[tokio::test]
    async fn test_unknown_power_state_is_ok() {
        let outcome = poll_with(PowerState::Unknown, vm()).await.unwrap();
        assert_eq!(outcome, Outcome::ok());
    }

    #[tokio::test]
    async fn test_no_ems_power_state_is_ok() {
        let outcome = poll_with(PowerState::NoEms, vm()).await.unwrap();
        assert_eq!(outcome, Outcome::ok());
    }

    #[tokio::test]
    async fn test_vm_without_ems_is_ok_without_querying() {
        let mut no_ems = vm();
        no_ems.has_ems = false;
        // The adapter would fail if queried; the step must not reach it.
        let adapter = PowerStateAdapter {
            state: PowerState::On,
        };
        let mut ctx = WorkflowContext::new();
        let step = PreRetirementCheck::new(no_ems);
        let outcome = step.poll(&adapter, &mut ctx).await.unwrap();
        assert_eq!(outcome, Outcome::ok());
    }

    #[tokio::test]
    async fn test_template_is_a_fatal_configuration_error() {
        let mut template = vm();
        template.template = true;
        let err = poll_with(PowerState::Off, template).await.unwrap_err();
        assert!(matches!(err, StepError::InvalidSource(_)));
        assert!(err.to_string().contains("template"));
    }
}
