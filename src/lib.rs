pub mod adapter;
pub mod config;
pub mod context;
pub mod controller;
pub mod progress;
pub mod retry;
pub mod signal;
pub mod steps;
pub mod telemetry;

pub use adapter::ExternalQueryAdapter;
pub use context::WorkflowContext;
pub use controller::StepController;
pub use signal::{Outcome, StepError};
