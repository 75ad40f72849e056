pub mod jigsaw;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::console::filters::ContentFilter;
use crate::console::format::ReturnFormat;

/// Template variable the input value is bound to.
pub const INPUT_KEY: &str = "input";

/// Errors from executing a prompt against the remote engine.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("stream interrupted: {0}")]
    Stream(String),
}

pub type ChunkStream = BoxStream<'static, Result<String, EngineError>>;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PromptInput {
    pub key: String,
    pub optional: bool,
}

/// Body of a direct prompt execution.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RunPromptRequest {
    pub prompt: String,
    pub return_prompt: String,
    pub stream: bool,
    pub use_internet: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<PromptInput>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub input_values: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub prompt_guard: Vec<ContentFilter>,
}

impl RunPromptRequest {
    /// Streamed, internet-augmented request in the given format.
    pub fn streamed(
        prompt: &str,
        input: &str,
        format: ReturnFormat,
        filters: &[ContentFilter],
    ) -> Self {
        let mut inputs = Vec::new();
        let mut input_values = BTreeMap::new();
        if !input.trim().is_empty() {
            inputs.push(PromptInput {
                key: INPUT_KEY.to_string(),
                optional: true,
            });
            input_values.insert(INPUT_KEY.to_string(), input.to_string());
        }

        Self {
            prompt: prompt.to_string(),
            return_prompt: format.directive(),
            stream: true,
            use_internet: true,
            inputs,
            input_values,
            prompt_guard: filters.to_vec(),
        }
    }
}

/// The hosted prompt engine: either a stream of text fragments or a failure.
#[async_trait]
pub trait PromptEngine: Send + Sync {
    async fn run_prompt_direct(&self, request: RunPromptRequest) -> Result<ChunkStream, EngineError>;
}
