// Job Identifiers & Results

use serde::{Deserialize, Serialize};

/// Job ID as assigned by the backend
pub type JobId = String;

/// Stored or pushed output of a job (JSON, shape owned by the backend)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobResult(serde_json::Value);

impl JobResult {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn into_value(self) -> serde_json::Value {
        self.0
    }
}

/// Name of the pub/sub channel carrying a job's result
pub fn result_channel_name(job_id: &str) -> String {
    format!("job-{}", job_id)
}

/// Event name the result is published under
pub const RESULT_EVENT: &str = "result";
