pub mod events;
pub mod filters;
pub mod form;
pub mod format;

use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use crate::engine::PromptEngine;
use crate::prompts::SavedPrompt;
use crate::prompts::repository::PromptRepository;
use crate::render::{self, Rendered};
use crate::runner::{PromptRunner, StartedRun};

use events::ConsoleEvent;
use filters::ContentFilter;
use form::{FormState, SAVE_EMPTY_PROMPT};
use format::ReturnFormat;

#[derive(thiserror::Error, Debug)]
pub enum ConsoleError {
    #[error("{0}")]
    Validation(&'static str),

    #[error("saved prompt not found: {0}")]
    PromptNotFound(String),

    #[error("prompt store error: {0}")]
    Store(#[from] anyhow::Error),
}

/// Partial edit of the form fields; absent values are left as they are.
#[derive(Debug, Default, Deserialize)]
pub struct FormUpdate {
    pub prompt: Option<String>,
    pub input: Option<String>,
    pub return_format: Option<ReturnFormat>,
}

/// The prompt console: form state, saved-prompt registry and runner behind one handle.
pub struct Console {
    form: Arc<RwLock<FormState>>,
    prompts: Arc<dyn PromptRepository>,
    runner: Arc<PromptRunner>,
    events_tx: broadcast::Sender<ConsoleEvent>,
}

impl Console {
    pub fn new(engine: Arc<dyn PromptEngine>, prompts: Arc<dyn PromptRepository>) -> Self {
        let form = Arc::new(RwLock::new(FormState::default()));
        let (events_tx, _) = broadcast::channel::<ConsoleEvent>(256);
        let runner = Arc::new(PromptRunner::new(engine, form.clone(), events_tx.clone()));
        Self {
            form,
            prompts,
            runner,
            events_tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConsoleEvent> {
        self.events_tx.subscribe()
    }

    pub async fn snapshot(&self) -> FormState {
        self.form.read().await.clone()
    }

    pub async fn update_form(&self, update: FormUpdate) -> FormState {
        let mut form = self.form.write().await;
        if let Some(prompt) = update.prompt {
            form.prompt = prompt;
        }
        if let Some(input) = update.input {
            form.input = input;
        }
        if let Some(return_format) = update.return_format {
            form.return_format = return_format;
        }
        form.clone()
    }

    pub async fn toggle_filter(&self, filter: ContentFilter) -> Vec<ContentFilter> {
        let mut form = self.form.write().await;
        let selected = form.toggle_filter(filter);
        tracing::debug!(filter = %filter, selected, "Toggled content filter");
        form.content_filters.clone()
    }

    /// Run the given prompt and input.
    pub async fn run(&self, prompt: &str, input: &str) -> StartedRun {
        self.runner.start(prompt, input).await
    }

    /// Run whatever is currently typed into the form.
    pub async fn run_current(&self) -> StartedRun {
        let (prompt, input) = self.current_fields().await;
        self.run(&prompt, &input).await
    }

    pub async fn cancel_run(&self) -> bool {
        self.runner.cancel().await
    }

    /// Append a saved prompt and clear the form fields. Blank prompts are rejected
    /// and the validation message lands in the form's error field.
    pub async fn save(&self, prompt: &str, input: &str) -> Result<SavedPrompt, ConsoleError> {
        if prompt.trim().is_empty() {
            self.form.write().await.set_validation_error(SAVE_EMPTY_PROMPT);
            return Err(ConsoleError::Validation(SAVE_EMPTY_PROMPT));
        }

        let saved = self.prompts.append_prompt(prompt, input).await?;
        self.form.write().await.clear_fields();
        tracing::info!(id = %saved.id, "Prompt saved");
        Ok(saved)
    }

    pub async fn save_current(&self) -> Result<SavedPrompt, ConsoleError> {
        let (prompt, input) = self.current_fields().await;
        self.save(&prompt, &input).await
    }

    pub async fn saved_prompts(&self) -> Vec<SavedPrompt> {
        self.prompts.list_prompts().await
    }

    /// Run a saved entry again. The entry itself is untouched.
    pub async fn rerun(&self, id: &str) -> Result<StartedRun, ConsoleError> {
        let saved = self
            .prompts
            .get_prompt(id)
            .await
            .ok_or_else(|| ConsoleError::PromptNotFound(id.to_string()))?;
        Ok(self.run(&saved.prompt, &saved.input).await)
    }

    pub async fn rendered_result(&self) -> Rendered {
        let form = self.form.read().await;
        render::render(&form.result, form.return_format)
    }

    async fn current_fields(&self) -> (String, String) {
        let form = self.form.read().await;
        (form.prompt.clone(), form.input.clone())
    }
}
