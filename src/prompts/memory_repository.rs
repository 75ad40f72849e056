use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::SavedPrompt;
use super::repository::PromptRepository;

/// Process-lifetime prompt list. Entries keep save order.
pub struct MemoryPromptRepository {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    prompts: Vec<SavedPrompt>,
    last_id: i64,
}

impl MemoryPromptRepository {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }
}

impl Default for MemoryPromptRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    /// Millisecond timestamp, bumped past the previous id when saves share a millisecond.
    fn next_id(&mut self, now_millis: i64) -> String {
        let id = now_millis.max(self.last_id + 1);
        self.last_id = id;
        id.to_string()
    }
}

#[async_trait]
impl PromptRepository for MemoryPromptRepository {
    async fn list_prompts(&self) -> Vec<SavedPrompt> {
        self.inner.read().await.prompts.clone()
    }

    async fn get_prompt(&self, id: &str) -> Option<SavedPrompt> {
        self.inner
            .read()
            .await
            .prompts
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    async fn append_prompt(&self, prompt: &str, input: &str) -> Result<SavedPrompt> {
        let now = Utc::now();
        let mut inner = self.inner.write().await;
        let saved = SavedPrompt {
            id: inner.next_id(now.timestamp_millis()),
            prompt: prompt.to_string(),
            input: input.to_string(),
            created_at: now,
        };
        inner.prompts.push(saved.clone());
        tracing::debug!(id = %saved.id, count = inner.prompts.len(), "Saved prompt");
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[tokio::test]
    async fn append_keeps_order_and_unique_ids() {
        let repo = MemoryPromptRepository::new();
        for i in 0..50 {
            repo.append_prompt(&format!("p{i}"), "x").await.unwrap();
        }
        let prompts = repo.list_prompts().await;
        assert_eq!(prompts.len(), 50);
        assert_eq!(prompts[0].prompt, "p0");
        assert_eq!(prompts[49].prompt, "p49");
        let ids: HashSet<_> = prompts.iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids.len(), 50);
    }

    #[tokio::test]
    async fn get_prompt_by_id() {
        let repo = MemoryPromptRepository::new();
        let saved = repo.append_prompt("Tell me about {input}", "cats").await.unwrap();
        assert_eq!(repo.get_prompt(&saved.id).await, Some(saved));
        assert!(repo.get_prompt("missing").await.is_none());
    }

    #[test]
    fn ids_are_monotonic_within_a_millisecond() {
        let mut inner = Inner::default();
        assert_eq!(inner.next_id(1_000), "1000");
        assert_eq!(inner.next_id(1_000), "1001");
        assert_eq!(inner.next_id(999), "1002");
        assert_eq!(inner.next_id(5_000), "5000");
    }
}
