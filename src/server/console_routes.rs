use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use futures::stream::Stream;
use hyper::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use std::convert::Infallible;

use super::AppState;
use crate::console::filters::{ContentFilter, UnknownFilter};
use crate::console::format::ReturnFormat;
use crate::console::{ConsoleError, FormUpdate};

type ApiError = (StatusCode, Json<Value>);

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/state", get(get_state))
        .route("/form", put(update_form))
        .route("/filters/{tag}/toggle", post(toggle_filter))
        .route("/run", post(run_prompt))
        .route("/run/cancel", post(cancel_run))
        .route("/result", get(get_result))
        .route("/prompts", get(list_prompts).post(save_prompt))
        .route("/prompts/{id}/run", post(rerun_prompt))
        .route("/events", get(stream_events))
}

fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "error": message.into() })))
}

impl From<ConsoleError> for ApiError {
    fn from(err: ConsoleError) -> Self {
        let status = match &err {
            ConsoleError::Validation(_) => StatusCode::BAD_REQUEST,
            ConsoleError::PromptNotFound(_) => StatusCode::NOT_FOUND,
            ConsoleError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        error_response(status, err.to_string())
    }
}

async fn get_state(State(state): State<AppState>) -> Json<Value> {
    let form = state.console.snapshot().await;
    let saved = state.console.saved_prompts().await;
    let formats: Vec<Value> = ReturnFormat::ALL
        .iter()
        .map(|f| json!({ "value": f, "label": f.label() }))
        .collect();

    Json(json!({
        "form": form,
        "saved_prompts": saved,
        "return_formats": formats,
        "content_filters": ContentFilter::ALL,
    }))
}

async fn update_form(State(state): State<AppState>, Json(body): Json<FormUpdate>) -> Json<Value> {
    let form = state.console.update_form(body).await;
    Json(json!({ "form": form }))
}

async fn toggle_filter(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let filter: ContentFilter = tag
        .parse()
        .map_err(|e: UnknownFilter| error_response(StatusCode::BAD_REQUEST, e.to_string()))?;
    let selected = state.console.toggle_filter(filter).await;
    Ok(Json(json!({ "content_filters": selected })))
}

#[derive(Debug, Default, Deserialize)]
struct RunRequest {
    prompt: Option<String>,
    input: Option<String>,
}

#[tracing::instrument(skip_all)]
async fn run_prompt(
    State(state): State<AppState>,
    Json(body): Json<RunRequest>,
) -> (StatusCode, Json<Value>) {
    let started = match (body.prompt, body.input) {
        (None, None) => state.console.run_current().await,
        (prompt, input) => {
            let form = state.console.snapshot().await;
            let prompt = prompt.unwrap_or(form.prompt);
            let input = input.unwrap_or(form.input);
            state.console.run(&prompt, &input).await
        }
    };
    (
        StatusCode::ACCEPTED,
        Json(json!({ "status": "started", "run_id": started.run_id })),
    )
}

async fn cancel_run(State(state): State<AppState>) -> Json<Value> {
    let cancelled = state.console.cancel_run().await;
    Json(json!({ "cancelled": cancelled }))
}

async fn get_result(State(state): State<AppState>) -> Json<Value> {
    let form = state.console.snapshot().await;
    let rendered = state.console.rendered_result().await;
    Json(json!({
        "run_id": form.run_id,
        "loading": form.loading,
        "error": form.error,
        "format": rendered.format,
        "raw": form.result,
        "html": rendered.html,
    }))
}

async fn list_prompts(State(state): State<AppState>) -> Json<Value> {
    let prompts = state.console.saved_prompts().await;
    Json(json!({ "prompts": prompts }))
}

#[derive(Debug, Default, Deserialize)]
struct SaveRequest {
    prompt: Option<String>,
    input: Option<String>,
}

async fn save_prompt(
    State(state): State<AppState>,
    Json(body): Json<SaveRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let saved = match (body.prompt, body.input) {
        (None, None) => state.console.save_current().await?,
        (prompt, input) => {
            state
                .console
                .save(
                    prompt.as_deref().unwrap_or_default(),
                    input.as_deref().unwrap_or_default(),
                )
                .await?
        }
    };
    Ok((StatusCode::CREATED, Json(json!({ "prompt": saved }))))
}

#[tracing::instrument(skip_all)]
async fn rerun_prompt(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let started = state.console.rerun(&id).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "status": "started", "run_id": started.run_id })),
    ))
}

async fn stream_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.console.subscribe();
    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let sse_event_name = event.event_type.as_sse_event();
                    let data = serde_json::to_string(&event).unwrap_or_default();
                    yield Ok(Event::default().event(sse_event_name).data(data));
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "console SSE subscriber lagged");
                    continue;
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                    break;
                }
            }
        }
    };
    Sse::new(stream).keep_alive(KeepAlive::new().interval(std::time::Duration::from_secs(15)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::Console;
    use crate::prompts::memory_repository::MemoryPromptRepository;
    use crate::runner::tests::{ok_chunks, MockEngine, Script};
    use std::sync::Arc;

    fn state_with(scripts: Vec<Script>) -> AppState {
        let engine = Arc::new(MockEngine::new(scripts));
        AppState {
            console: Arc::new(Console::new(engine, Arc::new(MemoryPromptRepository::new()))),
        }
    }

    #[tokio::test]
    async fn save_blank_prompt_is_bad_request() {
        let state = state_with(vec![]);
        let err = save_prompt(
            State(state.clone()),
            Json(SaveRequest {
                prompt: Some("  ".into()),
                input: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert_eq!(err.1 .0["error"], "Please enter a prompt before saving");
        assert!(state.console.saved_prompts().await.is_empty());
    }

    #[tokio::test]
    async fn save_then_rerun_by_id() {
        let state = state_with(vec![ok_chunks(&["hello"])]);
        let (status, Json(body)) = save_prompt(
            State(state.clone()),
            Json(SaveRequest {
                prompt: Some("Greet {input}".into()),
                input: Some("Ada".into()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        let id = body["prompt"]["id"].as_str().unwrap().to_string();

        let (status, Json(body)) = rerun_prompt(State(state.clone()), Path(id)).await.unwrap();
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["run_id"], 1);
    }

    #[tokio::test]
    async fn rerun_missing_prompt_is_not_found() {
        let state = state_with(vec![]);
        let err = rerun_prompt(State(state), Path("nope".into())).await.unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_filter_is_bad_request() {
        let state = state_with(vec![]);
        let err = toggle_filter(State(state), Path("violence".into())).await.unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn toggle_filter_returns_selection() {
        let state = state_with(vec![]);
        let Json(body) = toggle_filter(State(state.clone()), Path("privacy".into()))
            .await
            .unwrap();
        assert_eq!(body["content_filters"], json!(["privacy"]));
        let Json(body) = toggle_filter(State(state), Path("privacy".into()))
            .await
            .unwrap();
        assert_eq!(body["content_filters"], json!([]));
    }

    #[tokio::test]
    async fn state_lists_fixed_options() {
        let state = state_with(vec![]);
        let Json(body) = get_state(State(state)).await;
        assert_eq!(body["return_formats"].as_array().unwrap().len(), 4);
        assert_eq!(body["return_formats"][0]["value"], "markdown");
        assert_eq!(body["content_filters"].as_array().unwrap().len(), 8);
        assert_eq!(body["form"]["loading"], false);
    }

    #[tokio::test]
    async fn run_defaults_to_form_fields() {
        let state = state_with(vec![ok_chunks(&["{\"a\":1}"])]);
        update_form(
            State(state.clone()),
            Json(FormUpdate {
                prompt: Some("Give me JSON".into()),
                input: None,
                return_format: Some(ReturnFormat::Json),
            }),
        )
        .await;

        let (status, _) = run_prompt(State(state.clone()), Json(RunRequest::default())).await;
        assert_eq!(status, StatusCode::ACCEPTED);

        // Let the spawned run drain the scripted stream.
        let mut events = state.console.subscribe();
        if state.console.snapshot().await.loading {
            while let Ok(event) = events.recv().await {
                if event.event_type == crate::console::events::ConsoleEventType::RunCompleted {
                    break;
                }
            }
        }

        let Json(body) = get_result(State(state)).await;
        assert_eq!(body["raw"], "{\"a\":1}");
        assert_eq!(body["format"], "json");
        assert_eq!(body["loading"], false);
    }
}
