use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The tri-state signal a polling step hands back to the host state machine
/// on every invocation. `Retry` is the only way to express "not ready yet";
/// the core never blocks or sleeps while waiting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    /// The condition is satisfied. Some steps carry a named result value
    /// forward (e.g. a stored deploy result).
    Ok { result: Option<String> },
    /// Not ready yet; the host re-invokes the step after its poll interval.
    Retry,
    /// The operation reported a terminal failure.
    Error { reason: String },
}

impl Outcome {
    pub fn ok() -> Self {
        Outcome::Ok { result: None }
    }

    pub fn ok_with(result: impl Into<String>) -> Self {
        Outcome::Ok {
            result: Some(result.into()),
        }
    }

    pub fn error(reason: impl Into<String>) -> Self {
        Outcome::Error {
            reason: reason.into(),
        }
    }

    pub fn is_retry(&self) -> bool {
        matches!(self, Outcome::Retry)
    }

    /// The wire form the host engine stores ("ok" / "retry" / "error").
    pub fn as_signal(&self) -> &'static str {
        match self {
            Outcome::Ok { .. } => "ok",
            Outcome::Retry => "retry",
            Outcome::Error { .. } => "error",
        }
    }
}

/// Fatal failures propagated past the outcome channel. The host state machine
/// distinguishes these from `Outcome::Error`: a fatal error aborts the step
/// sequence instead of driving a transition, so each step keeps whichever
/// channel it used historically.
#[derive(Debug, Error)]
pub enum StepError {
    /// The object handed to the step can never satisfy this check
    /// (e.g. retiring a template, a nil service). Never retried.
    #[error("{0}")]
    InvalidSource(String),

    /// The external operation reported a terminal failure on a step that
    /// escalates rather than signalling `Outcome::Error`.
    #[error("{0}")]
    OperationFailed(String),

    /// The status query itself failed and the retry budget is spent.
    #[error("{0}")]
    Query(#[from] anyhow::Error),
}
