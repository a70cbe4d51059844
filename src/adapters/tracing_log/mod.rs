// Tracing event adapter - Stage events as structured tracing records

use crate::domain::model::*;
use crate::ports::*;
use async_trait::async_trait;
use tracing::{error, info};

/// Forwards stage events to the global tracing subscriber
pub struct TracingEventSink;

impl TracingEventSink {
    /// Create new tracing event sink
    pub fn new() -> Self {
        Self
    }
}

impl Default for TracingEventSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventSink for TracingEventSink {
    async fn emit(&self, event: &StageEvent) {
        let detail = event.detail.as_deref().unwrap_or("");
        match event.status {
            StageStatus::Started => {
                info!(job_id = %event.job_id, stage = %event.stage, detail, "Stage started");
            }
            StageStatus::Completed => {
                info!(job_id = %event.job_id, stage = %event.stage, detail, "Stage completed");
            }
            StageStatus::Skipped => {
                info!(job_id = %event.job_id, stage = %event.stage, detail, "Stage skipped, artifact already present");
            }
            StageStatus::Failed => {
                let cause = event.error.as_deref().unwrap_or("unknown error");
                error!(job_id = %event.job_id, stage = %event.stage, detail, error = cause, "Stage failed");
            }
        }
    }
}
