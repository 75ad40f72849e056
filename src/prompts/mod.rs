pub mod memory_repository;
pub mod repository;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A prompt/input pair kept for replay. Never mutated once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedPrompt {
    pub id: String,
    pub prompt: String,
    pub input: String,
    pub created_at: DateTime<Utc>,
}
