use std::sync::Arc;

use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::{AbortHandle, JoinHandle};
use tokio_stream::StreamExt;

use crate::console::events::{ConsoleEvent, ConsoleEventType};
use crate::console::form::FormState;
use crate::engine::{EngineError, PromptEngine, RunPromptRequest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed { chunks: usize },
    Failed { message: String },
    /// A newer run started (or the run was cancelled) before this one finished.
    Superseded,
}

pub struct StartedRun {
    pub run_id: u64,
    pub handle: JoinHandle<RunOutcome>,
}

struct ActiveRun {
    run_id: u64,
    abort: AbortHandle,
}

/// Executes prompts against the engine and streams chunks into the form.
///
/// One run is active at a time: starting a run aborts the previous stream, and
/// the form ignores anything still tagged with an older run id.
pub struct PromptRunner {
    engine: Arc<dyn PromptEngine>,
    form: Arc<RwLock<FormState>>,
    events_tx: broadcast::Sender<ConsoleEvent>,
    active: Mutex<Option<ActiveRun>>,
}

impl PromptRunner {
    pub fn new(
        engine: Arc<dyn PromptEngine>,
        form: Arc<RwLock<FormState>>,
        events_tx: broadcast::Sender<ConsoleEvent>,
    ) -> Self {
        Self {
            engine,
            form,
            events_tx,
            active: Mutex::new(None),
        }
    }

    /// Start a run with the currently selected format and filters.
    pub async fn start(self: &Arc<Self>, prompt: &str, input: &str) -> StartedRun {
        let mut active = self.active.lock().await;
        if let Some(prev) = active.take() {
            prev.abort.abort();
            if !prev.abort.is_finished() {
                tracing::info!(run_id = prev.run_id, "Superseding in-flight run");
                self.emit(
                    prev.run_id,
                    ConsoleEventType::RunCancelled,
                    "superseded by a newer run",
                );
            }
        }

        let (run_id, request) = {
            let mut form = self.form.write().await;
            let run_id = form.begin_run();
            let request = RunPromptRequest::streamed(
                prompt,
                input,
                form.return_format,
                &form.content_filters,
            );
            (run_id, request)
        };

        tracing::info!(
            run_id,
            format = %request.return_prompt,
            guards = request.prompt_guard.len(),
            "Starting prompt run"
        );
        self.emit(run_id, ConsoleEventType::RunStarted, prompt);

        let runner = Arc::clone(self);
        let handle = tokio::spawn(async move { runner.drive(run_id, request).await });
        *active = Some(ActiveRun {
            run_id,
            abort: handle.abort_handle(),
        });

        StartedRun { run_id, handle }
    }

    /// Stop the active run, if any. Chunks already streamed stay in the result.
    pub async fn cancel(&self) -> bool {
        let mut active = self.active.lock().await;
        let Some(run) = active.take() else {
            return false;
        };
        run.abort.abort();

        let stopped = self.form.write().await.finish_run(run.run_id);
        if stopped {
            tracing::info!(run_id = run.run_id, "Cancelled prompt run");
            self.emit(run.run_id, ConsoleEventType::RunCancelled, "cancelled");
        }
        stopped
    }

    async fn drive(&self, run_id: u64, request: RunPromptRequest) -> RunOutcome {
        let outcome = self.consume(run_id, request).await;

        match &outcome {
            RunOutcome::Completed { chunks } => {
                tracing::info!(run_id, chunks, "Prompt run completed");
                self.emit(run_id, ConsoleEventType::RunCompleted, "");
            }
            RunOutcome::Failed { message } => {
                tracing::error!(run_id, error = %message, "Prompt run failed");
                self.emit(run_id, ConsoleEventType::RunFailed, message.as_str());
            }
            RunOutcome::Superseded => {
                tracing::debug!(run_id, "Dropped output of superseded run");
            }
        }

        let mut active = self.active.lock().await;
        if active.as_ref().is_some_and(|a| a.run_id == run_id) {
            *active = None;
        }
        outcome
    }

    async fn consume(&self, run_id: u64, request: RunPromptRequest) -> RunOutcome {
        let mut stream = match self.engine.run_prompt_direct(request).await {
            Ok(stream) => stream,
            Err(e) => return self.fail(run_id, e).await,
        };

        let mut chunks = 0;
        while let Some(item) = stream.next().await {
            match item {
                Ok(chunk) => {
                    if !self.form.write().await.append_chunk(run_id, &chunk) {
                        return RunOutcome::Superseded;
                    }
                    chunks += 1;
                    self.emit(run_id, ConsoleEventType::Chunk, chunk);
                }
                Err(e) => return self.fail(run_id, e).await,
            }
        }

        if self.form.write().await.finish_run(run_id) {
            RunOutcome::Completed { chunks }
        } else {
            RunOutcome::Superseded
        }
    }

    async fn fail(&self, run_id: u64, error: EngineError) -> RunOutcome {
        let mut form = self.form.write().await;
        if !form.fail_run(run_id, &error.to_string()) {
            return RunOutcome::Superseded;
        }
        RunOutcome::Failed {
            message: form.error.clone().unwrap_or_default(),
        }
    }

    fn emit(&self, run_id: u64, event_type: ConsoleEventType, message: impl Into<String>) {
        // No subscribers is fine.
        let _ = self
            .events_tx
            .send(ConsoleEvent::new(run_id, event_type, message));
    }
}
