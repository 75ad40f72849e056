use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ConsoleEvent {
    pub run_id: u64,
    pub timestamp: DateTime<Utc>,
    pub event_type: ConsoleEventType,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsoleEventType {
    RunStarted,
    Chunk,
    RunCompleted,
    RunFailed,
    RunCancelled,
}

impl ConsoleEventType {
    pub fn as_sse_event(&self) -> &'static str {
        match self {
            ConsoleEventType::RunStarted => "run_started",
            ConsoleEventType::Chunk => "chunk",
            ConsoleEventType::RunCompleted => "run_completed",
            ConsoleEventType::RunFailed => "run_failed",
            ConsoleEventType::RunCancelled => "run_cancelled",
        }
    }
}

impl ConsoleEvent {
    pub fn new(run_id: u64, event_type: ConsoleEventType, message: impl Into<String>) -> Self {
        Self {
            run_id,
            timestamp: Utc::now(),
            event_type,
            message: message.into(),
        }
    }
}
