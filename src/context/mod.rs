use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use uuid::Uuid;

use crate::progress::{validate_weights, ProgressUnit};
use crate::retry::RetryState;

/// A unique identifier for one workflow instance, used for log correlation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkflowInstanceId(pub Uuid);

impl WorkflowInstanceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WorkflowInstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for WorkflowInstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The durable progress slot associated with a workflow instance. Overwritten
/// on every write; this is the only user-visible progress indicator while an
/// operation runs. `percent` is omitted on failure paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub message: String,
    pub percent: Option<f64>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

const DEPLOY_RESULT: &str = "deploy_result";
const DEPLOY_REASON: &str = "deploy_reason";
const PROVIDER_LAST_REFRESH: &str = "provider_last_refresh";

/// Explicit workflow context threaded through every call, replacing any
/// ambient "current automation object" lookup. Carries the retry counter,
/// the progress unit list, the progress slot and named state variables, all
/// owned exclusively by the single workflow instance driving the step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowContext {
    pub instance_id: WorkflowInstanceId,
    pub retry_state: RetryState,
    progress_units: Vec<ProgressUnit>,
    progress: Option<ProgressRecord>,
    state_vars: HashMap<String, JsonValue>,
}

impl WorkflowContext {
    pub fn new() -> Self {
        Self {
            instance_id: WorkflowInstanceId::new(),
            retry_state: RetryState::default(),
            progress_units: Vec::new(),
            progress: None,
            state_vars: HashMap::new(),
        }
    }

    /// Install the unit list at step-sequence start. Weights must sum to 100.
    pub fn set_progress_units(&mut self, units: Vec<ProgressUnit>) -> Result<()> {
        validate_weights(&units)?;
        self.progress_units = units;
        Ok(())
    }

    pub fn progress_units(&self) -> &[ProgressUnit] {
        &self.progress_units
    }

    /// Refresh `percent_complete` of each unit from an external status
    /// snapshot, in stored order. Units are never added or removed here.
    pub fn update_unit_percents(&mut self, percents: &[f64]) {
        for (unit, percent) in self.progress_units.iter_mut().zip(percents) {
            unit.percent_complete = percent.clamp(0.0, 100.0);
        }
    }

    pub fn set_progress(&mut self, message: impl Into<String>, percent: Option<f64>) {
        self.progress = Some(ProgressRecord {
            message: message.into(),
            percent,
            updated_at: chrono::Utc::now(),
        });
    }

    pub fn progress(&self) -> Option<&ProgressRecord> {
        self.progress.as_ref()
    }

    pub fn set_state_var(&mut self, key: &str, value: JsonValue) {
        self.state_vars.insert(key.to_string(), value);
    }

    pub fn state_var(&self, key: &str) -> Option<&JsonValue> {
        self.state_vars.get(key)
    }

    pub fn state_var_exists(&self, key: &str) -> bool {
        self.state_vars.contains_key(key)
    }

    // -- typed helpers for the stack two-phase flow --

    pub fn set_deploy_result(&mut self, result: &str, reason: Option<&str>) {
        self.set_state_var(DEPLOY_RESULT, JsonValue::String(result.to_string()));
        match reason {
            Some(reason) => {
                self.set_state_var(DEPLOY_REASON, JsonValue::String(reason.to_string()))
            }
            None => self.set_state_var(DEPLOY_REASON, JsonValue::Null),
        }
    }

    pub fn deploy_result(&self) -> Option<String> {
        self.state_var(DEPLOY_RESULT)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }

    pub fn deploy_reason(&self) -> Option<String> {
        self.state_var(DEPLOY_REASON)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }

    pub fn mark_provider_refresh_requested(&mut self) {
        self.set_state_var(PROVIDER_LAST_REFRESH, JsonValue::Bool(true));
    }

    pub fn provider_refresh_requested(&self) -> bool {
        self.state_var_exists(PROVIDER_LAST_REFRESH)
    }
}

impl Default for WorkflowContext {
    fn default() -> Self {
        Self::new()
    }
}
