// In-memory event sink - Keeps stage events for inspection

use crate::domain::model::*;
use crate::ports::*;
use async_trait::async_trait;
use std::sync::Mutex;

/// Event sink that records every event it receives
#[derive(Default)]
pub struct MemoryEventSink {
    events: Mutex<Vec<StageEvent>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events
    pub fn events(&self) -> Vec<StageEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// `(stage, status)` pairs in arrival order
    pub fn transitions(&self) -> Vec<(Stage, StageStatus)> {
        self.events()
            .into_iter()
            .map(|event| (event.stage, event.status))
            .collect()
    }
}

#[async_trait]
impl EventSink for MemoryEventSink {
    async fn emit(&self, event: &StageEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
