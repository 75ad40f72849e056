use serde::Serialize;

use super::filters::{self, ContentFilter};
use super::format::ReturnFormat;

pub const SAVE_EMPTY_PROMPT: &str = "Please enter a prompt before saving";
pub const RUN_FAILED_FALLBACK: &str = "An error occurred while processing the prompt";

/// Everything the page shows. Stream callbacks carry the run id they belong to
/// and are dropped once a newer run has started.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FormState {
    pub prompt: String,
    pub input: String,
    pub return_format: ReturnFormat,
    pub content_filters: Vec<ContentFilter>,
    pub loading: bool,
    pub error: Option<String>,
    pub result: String,
    pub run_id: u64,
}

impl FormState {
    pub fn toggle_filter(&mut self, filter: ContentFilter) -> bool {
        filters::toggle(&mut self.content_filters, filter)
    }

    pub fn is_selected(&self, filter: ContentFilter) -> bool {
        self.content_filters.contains(&filter)
    }

    /// Start a new run: bumps the run id, sets loading and clears error and result.
    pub fn begin_run(&mut self) -> u64 {
        self.run_id += 1;
        self.loading = true;
        self.error = None;
        self.result.clear();
        self.run_id
    }

    pub fn is_current(&self, run_id: u64) -> bool {
        self.run_id == run_id
    }

    pub fn append_chunk(&mut self, run_id: u64, chunk: &str) -> bool {
        if !self.is_current(run_id) {
            return false;
        }
        self.result.push_str(chunk);
        true
    }

    /// Record a failure. Whatever had already streamed in stays in `result`.
    pub fn fail_run(&mut self, run_id: u64, message: &str) -> bool {
        if !self.is_current(run_id) {
            return false;
        }
        let message = message.trim();
        self.error = Some(if message.is_empty() {
            RUN_FAILED_FALLBACK.to_string()
        } else {
            message.to_string()
        });
        self.loading = false;
        true
    }

    pub fn finish_run(&mut self, run_id: u64) -> bool {
        if !self.is_current(run_id) {
            return false;
        }
        self.loading = false;
        true
    }

    pub fn set_validation_error(&mut self, message: &str) {
        self.error = Some(message.to_string());
    }

    pub fn clear_fields(&mut self) {
        self.prompt.clear();
        self.input.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_run_resets_error_and_result() {
        let mut form = FormState {
            error: Some("old".into()),
            result: "stale".into(),
            ..Default::default()
        };
        let run_id = form.begin_run();
        assert_eq!(run_id, 1);
        assert!(form.loading);
        assert!(form.error.is_none());
        assert!(form.result.is_empty());
    }

    #[test]
    fn chunks_from_superseded_run_are_dropped() {
        let mut form = FormState::default();
        let first = form.begin_run();
        assert!(form.append_chunk(first, "a"));
        let second = form.begin_run();
        assert!(!form.append_chunk(first, "late"));
        assert!(form.append_chunk(second, "b"));
        assert_eq!(form.result, "b");
        assert!(!form.finish_run(first));
        assert!(form.loading);
    }

    #[test]
    fn fail_keeps_partial_result() {
        let mut form = FormState::default();
        let run_id = form.begin_run();
        form.append_chunk(run_id, "partial");
        form.fail_run(run_id, "boom");
        assert_eq!(form.result, "partial");
        assert_eq!(form.error.as_deref(), Some("boom"));
        assert!(!form.loading);
    }

    #[test]
    fn blank_failure_message_uses_fallback() {
        let mut form = FormState::default();
        let run_id = form.begin_run();
        form.fail_run(run_id, "  ");
        assert_eq!(form.error.as_deref(), Some(RUN_FAILED_FALLBACK));
    }

    #[test]
    fn toggle_filter_updates_selection() {
        let mut form = FormState::default();
        form.toggle_filter(ContentFilter::Privacy);
        assert!(form.is_selected(ContentFilter::Privacy));
        form.toggle_filter(ContentFilter::Privacy);
        assert!(!form.is_selected(ContentFilter::Privacy));
    }
}
