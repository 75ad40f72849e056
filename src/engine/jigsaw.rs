use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, StatusCode};

use super::{ChunkStream, EngineError, PromptEngine, RunPromptRequest};

const RUN_PATH: &str = "/v1/prompt_engine/run";

/// JigsawStack prompt engine over HTTP. The streamed body is plain UTF-8 text.
pub struct HttpPromptEngine {
    client: Client,
    api_key: String,
    base_url: String,
}

impl HttpPromptEngine {
    pub fn new(client: Client, api_key: String, base_url: String) -> Self {
        Self {
            client,
            api_key,
            base_url,
        }
    }
}

#[async_trait]
impl PromptEngine for HttpPromptEngine {
    async fn run_prompt_direct(&self, request: RunPromptRequest) -> Result<ChunkStream, EngineError> {
        let url = format!("{}{RUN_PATH}", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "prompt engine rejected request");
            return Err(EngineError::Api {
                status: status.as_u16(),
                message: api_error_message(status, &body),
            });
        }

        let mut bytes = resp.bytes_stream();
        let stream = async_stream::stream! {
            let mut decoder = Utf8Decoder::default();
            while let Some(item) = bytes.next().await {
                match item {
                    Ok(chunk) => {
                        if let Some(text) = decoder.push(&chunk) {
                            yield Ok(text);
                        }
                    }
                    Err(e) => {
                        yield Err(EngineError::Stream(e.to_string()));
                        return;
                    }
                }
            }
            if let Some(text) = decoder.finish() {
                yield Ok(text);
            }
        };

        Ok(Box::pin(stream))
    }
}

/// Pull a human-readable message out of an error body.
fn api_error_message(status: StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .filter(|m| !m.trim().is_empty());

    match from_json {
        Some(message) => message,
        None if body.trim().is_empty() => format!("prompt engine returned {status}"),
        None => format!("prompt engine returned {status}: {}", body.trim()),
    }
}

/// Reassembles multi-byte characters split across network chunks.
#[derive(Default)]
struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    fn push(&mut self, bytes: &[u8]) -> Option<String> {
        self.pending.extend_from_slice(bytes);
        let ready = match std::str::from_utf8(&self.pending) {
            Ok(_) => self.pending.len(),
            // Incomplete sequence at the end: hold it back for the next chunk.
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(_) => self.pending.len(),
        };
        let rest = self.pending.split_off(ready);
        let done = std::mem::replace(&mut self.pending, rest);
        let text = String::from_utf8_lossy(&done).into_owned();
        (!text.is_empty()).then_some(text)
    }

    fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        Some(text)
    }
}
