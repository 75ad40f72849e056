use anyhow::Result;
use async_trait::async_trait;

use super::SavedPrompt;

/// Append-only store of saved prompts. No update or delete.
#[async_trait]
pub trait PromptRepository: Send + Sync {
    async fn list_prompts(&self) -> Vec<SavedPrompt>;
    async fn get_prompt(&self, id: &str) -> Option<SavedPrompt>;
    async fn append_prompt(&self, prompt: &str, input: &str) -> Result<SavedPrompt>;
}
