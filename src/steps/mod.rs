pub mod conversion;
pub mod job;
pub mod retirement;
pub mod stack;

use async_trait::async_trait;

use crate::adapter::ExternalQueryAdapter;
use crate::context::WorkflowContext;
use crate::signal::{Outcome, StepError};

pub use conversion::{ConversionHandle, DiskConversionCheck};
pub use job::{JobHandle, JobProvisionCheck};
pub use retirement::{PreRetirementCheck, VmHandle};
pub use stack::{StackHandle, StackProvisionCheck};

/// One polling step inside a host-driven state machine. Each call evaluates
/// exactly one freshly queried external condition and signals the result;
/// waiting is expressed solely by returning `Outcome::Retry` and letting the
/// host re-invoke later. Steps hold no hidden counters: identical query
/// results and an identical context yield an identical outcome.
#[async_trait]
pub trait PollStep: Send + Sync {
    fn name(&self) -> &str;

    async fn poll(
        &self,
        adapter: &dyn ExternalQueryAdapter,
        ctx: &mut WorkflowContext,
    ) -> Result<Outcome, StepError>;
}
